//! Per-lot transaction cost model.
//!
//! Each lot pays slippage on entry and exit and a flat round-trip charge:
//!
//! ```text
//! gross          = points * lot_size
//! after_slippage = (points - 2 * slippage_per_side) * lot_size
//! net            = after_slippage - charges_per_lot_roundtrip
//! ```

use serde::{Deserialize, Serialize};

use pivotlab_core::TradeResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Points lost on each fill.
    pub slippage_per_side: f64,
    /// Brokerage, taxes and fees per lot, entry and exit combined.
    pub charges_per_lot_roundtrip: f64,
    /// Contract multiplier (units per lot).
    pub lot_size: u32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            slippage_per_side: 0.5,
            charges_per_lot_roundtrip: 60.0,
            lot_size: 75,
        }
    }
}

/// Currency PnL of one lot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LotPnl {
    pub gross: f64,
    pub after_slippage: f64,
    pub net: f64,
}

/// Currency PnL of a two-lot trade.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradePnl {
    pub lot1: LotPnl,
    pub lot2: LotPnl,
    pub gross_total: f64,
    pub net_total: f64,
    /// `net_total` split evenly across the two lots.
    pub net_effective_per_lot: f64,
}

impl CostModel {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.slippage_per_side.is_finite() && self.slippage_per_side >= 0.0) {
            return Err(format!(
                "costs.slippage_per_side must be >= 0, got {}",
                self.slippage_per_side
            ));
        }
        if !(self.charges_per_lot_roundtrip.is_finite() && self.charges_per_lot_roundtrip >= 0.0)
        {
            return Err(format!(
                "costs.charges_per_lot_roundtrip must be >= 0, got {}",
                self.charges_per_lot_roundtrip
            ));
        }
        if self.lot_size == 0 {
            return Err("costs.lot_size must be >= 1".into());
        }
        Ok(())
    }

    pub fn lot_pnl(&self, points: f64) -> LotPnl {
        let size = f64::from(self.lot_size);
        let after_slippage = (points - 2.0 * self.slippage_per_side) * size;
        LotPnl {
            gross: points * size,
            after_slippage,
            net: after_slippage - self.charges_per_lot_roundtrip,
        }
    }

    /// Costs for both lots, or `None` for a trade that never entered.
    pub fn trade_pnl(&self, result: &TradeResult) -> Option<TradePnl> {
        let lot1 = self.lot_pnl(result.lot1.pnl_points?);
        let lot2 = self.lot_pnl(result.lot2.pnl_points?);
        let net_total = lot1.net + lot2.net;
        Some(TradePnl {
            lot1,
            lot2,
            gross_total: lot1.gross + lot2.gross,
            net_total,
            net_effective_per_lot: net_total / 2.0,
        })
    }

    /// Net currency PnL of a single-lot trade.
    pub fn single_lot_net(&self, points: Option<f64>) -> Option<f64> {
        points.map(|p| self.lot_pnl(p).net)
    }
}

//! Serializable backtest configuration.
//!
//! Loaded from TOML. Every section has defaults, so an empty file is a valid
//! configuration reproducing the engine's built-in behavior:
//!
//! ```toml
//! [session]
//! timezone = "Asia/Kolkata"
//!
//! [signal]
//! target_points = 40.0
//! signal_start = "09:30"
//! entry_cutoff = "14:45"
//!
//! [filters]
//! entry_cutoff = "14:00"
//! short_levels = ["S1"]
//!
//! [costs]
//! slippage_per_side = 0.5
//! charges_per_lot_roundtrip = 60.0
//! lot_size = 75
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pivotlab_core::{
    IndicatorConfig, PivotLevel, ScaleOutConfig, SessionClock, SessionError, Side, SignalConfig,
};

use crate::costs::CostModel;
use crate::variants::TradeFilter;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid time '{value}' for {field} (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration of a backtest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BacktestConfig {
    pub session: SessionSection,
    pub indicators: IndicatorSection,
    pub signal: SignalSection,
    pub scaleout: ScaleOutSection,
    pub filters: FilterSection,
    pub costs: CostModel,
    pub data: DataSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSection {
    /// IANA timezone that defines trading dates and session times.
    pub timezone: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorSection {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub ema_min_periods: usize,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        let d = IndicatorConfig::default();
        Self {
            ema_fast: d.ema_fast,
            ema_slow: d.ema_slow,
            ema_min_periods: d.ema_min_periods,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalSection {
    pub target_points: f64,
    /// "HH:MM", inclusive.
    pub signal_start: String,
    /// "HH:MM", inclusive.
    pub entry_cutoff: String,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            target_points: 40.0,
            signal_start: "09:30".into(),
            entry_cutoff: "14:45".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaleOutSection {
    pub target1_points: f64,
}

impl Default for ScaleOutSection {
    fn default() -> Self {
        Self {
            target1_points: 40.0,
        }
    }
}

/// Post-filters applied to signals after detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterSection {
    /// Optional "HH:MM" entry cutoff, narrower than the signal engine's.
    pub entry_cutoff: Option<String>,
    pub long_levels: Vec<PivotLevel>,
    pub short_levels: Vec<PivotLevel>,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            entry_cutoff: None,
            long_levels: PivotLevel::LONG_LEVELS.to_vec(),
            short_levels: PivotLevel::SHORT_LEVELS.to_vec(),
        }
    }
}

/// What to do with a trading day whose candles fail validation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvalidDayPolicy {
    /// Fail the run.
    #[default]
    Abort,
    /// Drop every candle of the offending trading date and continue.
    ExcludeDay,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSection {
    pub invalid_day_policy: InvalidDayPolicy,
}

/// Parse "HH:MM" (or "HH:MM:SS").
pub fn parse_hhmm(field: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ConfigError::InvalidTime {
            field,
            value: value.to_string(),
        })
}

impl BacktestConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock()?;
        let signal = self.signal_config()?;
        if signal.signal_start > signal.entry_cutoff {
            return Err(ConfigError::Invalid(format!(
                "signal_start {} is after entry_cutoff {}",
                signal.signal_start, signal.entry_cutoff
            )));
        }
        if !(signal.target_points.is_finite() && signal.target_points > 0.0) {
            return Err(ConfigError::Invalid(
                "signal.target_points must be positive".into(),
            ));
        }
        if !(self.scaleout.target1_points.is_finite() && self.scaleout.target1_points > 0.0) {
            return Err(ConfigError::Invalid(
                "scaleout.target1_points must be positive".into(),
            ));
        }
        if self.indicators.ema_fast == 0 || self.indicators.ema_slow == 0 {
            return Err(ConfigError::Invalid("EMA periods must be >= 1".into()));
        }
        self.trade_filter()?;
        self.costs.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    pub fn clock(&self) -> Result<SessionClock, ConfigError> {
        Ok(SessionClock::from_name(&self.session.timezone)?)
    }

    pub fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            ema_fast: self.indicators.ema_fast,
            ema_slow: self.indicators.ema_slow,
            ema_min_periods: self.indicators.ema_min_periods,
        }
    }

    pub fn signal_config(&self) -> Result<SignalConfig, ConfigError> {
        Ok(SignalConfig {
            target_points: self.signal.target_points,
            signal_start: parse_hhmm("signal.signal_start", &self.signal.signal_start)?,
            entry_cutoff: parse_hhmm("signal.entry_cutoff", &self.signal.entry_cutoff)?,
        })
    }

    pub fn scaleout_config(&self) -> ScaleOutConfig {
        ScaleOutConfig {
            target1_points: self.scaleout.target1_points,
        }
    }

    /// Post-filter built from `[filters]`.
    pub fn trade_filter(&self) -> Result<TradeFilter, ConfigError> {
        for (side, levels) in [
            (Side::Long, &self.filters.long_levels),
            (Side::Short, &self.filters.short_levels),
        ] {
            if let Some(bad) = levels.iter().find(|l| l.breakout_side() != Some(side)) {
                return Err(ConfigError::Invalid(format!(
                    "level {bad} is not a {side} breakout level"
                )));
            }
        }
        let entry_cutoff = self
            .filters
            .entry_cutoff
            .as_deref()
            .map(|s| parse_hhmm("filters.entry_cutoff", s))
            .transpose()?;
        Ok(TradeFilter {
            entry_cutoff,
            long_levels: self.filters.long_levels.clone(),
            short_levels: self.filters.short_levels.clone(),
        })
    }

    /// Same configuration with post-filters reset to allow every signal.
    pub fn without_filters(&self) -> Self {
        Self {
            filters: FilterSection::default(),
            ..self.clone()
        }
    }

    /// Computes a deterministic hash ID for this configuration.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

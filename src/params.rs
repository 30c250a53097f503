//! Parameter metadata for the engine configuration and detectors
//!
//! Hosts use this to render adjustable settings and to build configs from
//! loosely-typed key/value input (settings files, UI sliders).
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use smc_signals::prelude::*;
//!
//! for param in AnalysisConfig::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("swing_length", 3.0);
//! let config = AnalysisConfig::with_params(&params).unwrap();
//! assert_eq!(config.swing_length.get(), 3);
//! ```

use std::collections::HashMap;

use crate::{AnalysisConfig, Multiple, Period, Ratio, Result, SignalError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Fraction in 0.0..=1.0
    Ratio,
    /// Strictly positive multiplier
    Multiple,
    /// Positive integer bar count
    Period,
    /// Small positive integer count
    Count,
    /// Non-negative percentage
    Percent,
}

/// Metadata for a single parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name (e.g., "swing_length")
    pub name: &'static str,
    pub param_type: ParamType,
    pub default: f64,
    /// Accepted range (min, max), inclusive
    pub range: (f64, f64),
    pub description: &'static str,
}

impl ParamMeta {
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Ratio, default, range, description }
    }

    pub const fn multiple(
        name: &'static str,
        default: f64,
        range: (f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Multiple, default, range, description }
    }

    pub const fn period(
        name: &'static str,
        default: f64,
        range: (f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Period, default, range, description }
    }

    pub const fn count(
        name: &'static str,
        default: f64,
        range: (f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Count, default, range, description }
    }

    pub const fn percent(
        name: &'static str,
        default: f64,
        range: (f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Percent, default, range, description }
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max) = self.range;
        if value.is_nan() || value < min || value > max {
            return Err(SignalError::OutOfRange { field: self.name, value, min, max });
        }
        match self.param_type {
            ParamType::Period | ParamType::Count if value.fract() != 0.0 => {
                Err(SignalError::InvalidValue("Period and count parameters must be integers"))
            },
            _ => Ok(()),
        }
    }
}

// ============================================================
// PARAMETERIZED TRAIT
// ============================================================

/// Types that can be described by and built from [`ParamMeta`] entries
pub trait Parameterized: Sized {
    /// Returns metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Creates a value from a name -> value map.
    ///
    /// Missing parameters use their default values.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
    let value = params.get(key).copied().unwrap_or(default);
    Ratio::new(value)
}

/// Helper to get a Multiple from params with default fallback
pub fn get_multiple(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Multiple> {
    let value = params.get(key).copied().unwrap_or(default);
    Multiple::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
    let value = params.get(key).copied().unwrap_or(default as f64);
    if value.is_nan() || value < 0.0 || value.fract() != 0.0 {
        return Err(SignalError::InvalidValue("Period must be a positive integer"));
    }
    Period::new(value as usize)
}

// ============================================================
// ANALYSIS CONFIG
// ============================================================

static CONFIG_PARAMS: [ParamMeta; 5] = [
    ParamMeta::period("swing_length", 5.0, (1.0, 50.0), "Pivot half-window in bars"),
    ParamMeta::period(
        "lookback",
        50.0,
        (1.0, 1000.0),
        "Bars a host retains for display; not used in scoring",
    ),
    ParamMeta::count(
        "min_confluence",
        2.0,
        (1.0, 4.0),
        "Confluence factors required to fire a signal",
    ),
    ParamMeta::multiple("risk_reward", 2.0, (0.1, 20.0), "Target distance as a multiple of risk"),
    ParamMeta::percent(
        "stop_buffer_pct",
        0.1,
        (0.0, 10.0),
        "Stop offset beyond the reference level, in percent",
    ),
];

impl Parameterized for AnalysisConfig {
    fn param_meta() -> &'static [ParamMeta] {
        &CONFIG_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        for meta in Self::param_meta() {
            if let Some(&value) = params.get(meta.name) {
                meta.validate(value)?;
            }
        }

        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            swing_length: get_period(params, "swing_length", defaults.swing_length.get())?,
            lookback: get_period(params, "lookback", defaults.lookback.get())?,
            min_confluence: params
                .get("min_confluence")
                .map_or(defaults.min_confluence, |&v| v as u8),
            risk_reward: get_multiple(params, "risk_reward", defaults.risk_reward.get())?,
            stop_buffer_pct: params
                .get("stop_buffer_pct")
                .copied()
                .unwrap_or(defaults.stop_buffer_pct),
            mode: defaults.mode,
        };
        config.validate()?;
        Ok(config)
    }
}

// ============================================================
// TESTS
// ============================================================

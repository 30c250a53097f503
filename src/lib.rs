//! # smc-signals - supply/demand confluence engine
//!
//! Detects impulse blocks (order blocks), price imbalances (fair value gaps),
//! swing structure breaks and liquidity sweeps over a slice of OHLCV bars, then
//! scores the confluence per direction and derives a graded signal with an
//! optional trade plan.
//!
//! ## Quick Start
//!
//! ```rust
//! use smc_signals::prelude::*;
//!
//! let bars = vec![
//!     Bar::new(1, 8.5, 9.0, 8.0, 8.8, 100.0),
//!     Bar::new(2, 8.6, 11.7, 8.4, 11.5, 100.0),
//!     Bar::new(3, 11.5, 12.5, 11.5, 12.2, 100.0),
//! ];
//!
//! let engine = EngineBuilder::new()
//!     .swing_length(2)
//!     .min_confluence(2)
//!     .build()
//!     .unwrap();
//!
//! let result = engine.analyze(&bars).unwrap();
//! assert_eq!(result.imbalances.len(), 1);
//! assert_eq!(result.signal, Signal::Neutral);
//! ```

pub mod confluence;
pub mod detectors;
pub mod params;
pub mod series;

use tracing::{debug, trace};

pub use confluence::{ConfluenceMode, ConfluenceState, DirectionalConfluence, Signal, TradePlan};

pub mod prelude {
    pub use crate::{
        // Scoring
        confluence::*,
        // Detectors
        detectors::*,
        // Parameters
        params::{get_multiple, get_period, get_ratio, ParamMeta, ParamType, Parameterized},
        // Parallel
        analyze_parallel,
        // Host-side bar buffer
        series::{BarSeries, SeriesUpdate},
        // Types
        AnalysisConfig,
        AnalysisResult,
        Bar,
        Direction,
        // Engine
        EngineBuilder,
        Multiple,
        OHLCVExt,
        Period,
        Ratio,
        Result,
        SignalEngine,
        // Errors
        SignalError,
        SymbolAnalysis,
        SymbolError,
        Zone,
        // Core traits
        ZoneDetector,
        ZoneKind,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors raised while validating configuration or input bars
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Timestamp goes backwards at index {index}: {current} < {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("Bar timestamp {got} is older than the last bar ({last})")]
    OutOfOrder { last: i64, got: i64 },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(SignalError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(SignalError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Strictly positive, finite multiplier (risk-reward, body/range multiples)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Multiple(f64);

impl Multiple {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(SignalError::InvalidValue(
                "Multiple cannot be NaN or infinite",
            ));
        }
        if value <= 0.0 {
            return Err(SignalError::InvalidValue("Multiple must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Multiple {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Multiple {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Multiple::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(SignalError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
    fn timestamp(&self) -> i64;
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let values = [self.open(), self.high(), self.low(), self.close(), self.volume()];
        if values.iter().any(|v| v.is_nan()) {
            return Err(SignalError::InvalidBar {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if values.iter().any(|v| v.is_infinite()) {
            return Err(SignalError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(SignalError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        if self.high() < self.open().max(self.close()) {
            return Err(SignalError::InvalidBar {
                index: 0,
                reason: "high below body",
            });
        }
        if self.low() > self.open().min(self.close()) {
            return Err(SignalError::InvalidBar {
                index: 0,
                reason: "low above body",
            });
        }
        if self.volume() < 0.0 {
            return Err(SignalError::InvalidBar {
                index: 0,
                reason: "negative volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Plain OHLCV sample for hosts without their own bar type
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

// ============================================================
// ZONES - detector output
// ============================================================

/// Direction of a zone or structure event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Which detector produced a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ZoneKind {
    /// 3-bar price gap (fair value gap)
    Imbalance,
    /// Origin candle of a strong move (order block)
    ImpulseBlock,
}

/// A price band `[bottom, top]` anchored to the bar it originated from
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub direction: Direction,
    pub bottom: f64,
    pub top: f64,
    /// Index of the originating bar in the analyzed slice
    pub index: usize,
    pub timestamp: i64,
    /// Always true when emitted; consumers may track mitigation themselves
    pub valid: bool,
}

impl Zone {
    pub fn new(
        kind: ZoneKind,
        direction: Direction,
        bottom: f64,
        top: f64,
        index: usize,
        timestamp: i64,
    ) -> Self {
        Self {
            kind,
            direction,
            bottom,
            top,
            index,
            timestamp,
            valid: true,
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Bar traded into the zone and closed on its side of the far edge.
    ///
    /// Bullish: `low <= top && close >= bottom`.
    /// Bearish: `high >= bottom && close <= top`.
    #[inline]
    pub fn is_occupied_by<T: OHLCV>(&self, bar: &T) -> bool {
        match self.direction {
            Direction::Bullish => bar.low() <= self.top && bar.close() >= self.bottom,
            Direction::Bearish => bar.high() >= self.bottom && bar.close() <= self.top,
        }
    }

    /// Edge a protective stop sits behind: bottom for demand, top for supply
    #[inline]
    pub fn far_edge(&self) -> f64 {
        match self.direction {
            Direction::Bullish => self.bottom,
            Direction::Bearish => self.top,
        }
    }
}

// ============================================================
// ZONE DETECTOR TRAIT
// ============================================================

/// Bar-window zone detector. `detect` looks at the window ending at `index`.
pub trait ZoneDetector: Send + Sync {
    fn kind(&self) -> ZoneKind;
    fn min_bars(&self) -> usize;
    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<Zone>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    /// Run the detector over every index, in ascending order.
    fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<Zone> {
        let start = self.min_bars().saturating_sub(1);
        (start..bars.len())
            .filter_map(|index| self.detect(bars, index))
            .collect()
    }
}

// ============================================================
// CONFIG
// ============================================================

/// Engine configuration. Hosts own it; the engine only reads it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pivot half-window
    pub swing_length: Period,
    /// Retained-window hint for collaborators; not consulted by scoring
    pub lookback: Period,
    /// Booleans required to fire a signal (1..=4)
    pub min_confluence: u8,
    pub risk_reward: Multiple,
    /// Stop placed this many percent beyond the reference price
    pub stop_buffer_pct: f64,
    pub mode: ConfluenceMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            swing_length: Period::new_const(5),
            lookback: Period::new_const(50),
            min_confluence: 2,
            risk_reward: Multiple::new_const(2.0),
            stop_buffer_pct: 0.1,
            mode: ConfluenceMode::Extended,
        }
    }
}

impl AnalysisConfig {
    pub const MAX_CONFLUENCE: u8 = 4;

    pub fn validate(&self) -> Result<()> {
        Period::new(self.swing_length.get())?;
        Period::new(self.lookback.get())?;
        Multiple::new(self.risk_reward.get())?;
        if !(1..=Self::MAX_CONFLUENCE).contains(&self.min_confluence) {
            return Err(SignalError::OutOfRange {
                field: "min_confluence",
                value: self.min_confluence as f64,
                min: 1.0,
                max: Self::MAX_CONFLUENCE as f64,
            });
        }
        if !self.stop_buffer_pct.is_finite() || !(0.0..100.0).contains(&self.stop_buffer_pct) {
            return Err(SignalError::OutOfRange {
                field: "stop_buffer_pct",
                value: self.stop_buffer_pct,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(())
    }
}

// ============================================================
// ANALYSIS RESULT
// ============================================================

/// Everything one analysis call derives from a bar slice
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisResult {
    pub bull_score: u8,
    pub bear_score: u8,
    /// Per-factor detail, present in extended mode only
    pub confluence: Option<ConfluenceState>,
    pub imbalances: Vec<Zone>,
    pub impulse_blocks: Vec<Zone>,
    pub structure: Vec<StructureEvent>,
    pub signal: Signal,
    pub plan: TradePlan,
}

impl AnalysisResult {
    pub fn score(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Bullish => self.bull_score,
            Direction::Bearish => self.bear_score,
        }
    }
}

// ============================================================
// SIGNAL ENGINE
// ============================================================

use detectors::*;

/// Stateless detection and scoring engine
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: AnalysisConfig,
    imbalance: ImbalanceDetector,
    impulse: ImpulseBlockDetector,
    validate_data: bool,
}

impl SignalEngine {
    /// Engine with default detectors and no config validation.
    /// Out-of-range values yield degenerate output, not errors.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            imbalance: ImbalanceDetector::default(),
            impulse: ImpulseBlockDetector::default(),
            validate_data: true,
        }
    }

    #[inline]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Validate the bars (unless disabled) and analyze them.
    pub fn analyze<T: OHLCV>(&self, bars: &[T]) -> Result<AnalysisResult> {
        if self.validate_data {
            validate_bars(bars)?;
        }
        Ok(self.analyze_unchecked(bars))
    }

    /// Analyze without validating the bars.
    pub fn analyze_unchecked<T: OHLCV>(&self, bars: &[T]) -> AnalysisResult {
        let Some(last) = bars.last() else {
            debug!("empty bar slice, neutral result");
            return AnalysisResult::default();
        };

        let imbalances = self.imbalance.scan(bars);
        let impulse_blocks = self.impulse.scan(bars);
        let pivots = PivotScanner::new(self.config.swing_length).scan(bars);
        trace!(
            imbalances = imbalances.len(),
            impulse_blocks = impulse_blocks.len(),
            pivot_highs = pivots.highs.len(),
            pivot_lows = pivots.lows.len(),
            "detectors complete"
        );

        let structure = detect_structure(&pivots);
        let sweeps = detect_sweeps(&pivots, last);

        let state = ConfluenceState::evaluate(last, &impulse_blocks, &imbalances, &structure, sweeps);
        let mode = self.config.mode;
        let bull_score = state.bullish.score(mode);
        let bear_score = state.bearish.score(mode);
        let signal = Signal::decide(bull_score, bear_score, self.config.min_confluence);

        let (confluence, plan) = match mode {
            ConfluenceMode::Extended => (
                Some(state),
                TradePlan::build(signal, last, &impulse_blocks, &self.config),
            ),
            ConfluenceMode::Basic => (None, TradePlan::NoTrade),
        };

        debug!(
            bars = bars.len(),
            bull_score,
            bear_score,
            ?signal,
            structure_events = structure.len(),
            trade = plan.is_trade(),
            "analysis complete"
        );

        AnalysisResult {
            bull_score,
            bear_score,
            confluence,
            imbalances,
            impulse_blocks,
            structure,
            signal,
            plan,
        }
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()?;
        self.imbalance.validate_config()?;
        self.impulse.validate_config()?;
        Ok(())
    }
}

/// Check every bar and the timestamp ordering of the slice.
pub fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            SignalError::InvalidBar { reason, .. } => SignalError::InvalidBar { index: i, reason },
            other => other,
        })?;
    }
    for (i, pair) in bars.windows(2).enumerate() {
        let (previous, current) = (pair[0].timestamp(), pair[1].timestamp());
        if current < previous {
            return Err(SignalError::NonMonotonicTimestamp {
                index: i + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating SignalEngine instances
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    config: AnalysisConfig,
    imbalance: ImbalanceDetector,
    impulse: ImpulseBlockDetector,
    validate_data: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::from_config(AnalysisConfig::default())
    }

    pub fn from_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            imbalance: ImbalanceDetector::default(),
            impulse: ImpulseBlockDetector::default(),
            validate_data: true,
        }
    }

    /// Pivot half-window length
    pub fn swing_length(mut self, length: usize) -> Self {
        self.config.swing_length = Period::new_const(length);
        self
    }

    pub fn lookback(mut self, bars: usize) -> Self {
        self.config.lookback = Period::new_const(bars);
        self
    }

    pub fn min_confluence(mut self, count: u8) -> Self {
        self.config.min_confluence = count;
        self
    }

    pub fn risk_reward(mut self, multiple: f64) -> Self {
        self.config.risk_reward = Multiple::new_const(multiple);
        self
    }

    pub fn stop_buffer_pct(mut self, pct: f64) -> Self {
        self.config.stop_buffer_pct = pct;
        self
    }

    pub fn mode(mut self, mode: ConfluenceMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Replace the imbalance detector (custom gap ratio)
    pub fn imbalance_detector(mut self, detector: ImbalanceDetector) -> Self {
        self.imbalance = detector;
        self
    }

    /// Replace the impulse-block detector (custom body multiple)
    pub fn impulse_detector(mut self, detector: ImpulseBlockDetector) -> Self {
        self.impulse = detector;
        self
    }

    /// Enable/disable bar validation in [`SignalEngine::analyze`]
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.validate_data = enable;
        self
    }

    /// Build the engine, validating config and detector parameters
    pub fn build(self) -> Result<SignalEngine> {
        let engine = SignalEngine {
            config: self.config,
            imbalance: self.imbalance,
            impulse: self.impulse,
            validate_data: self.validate_data,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Result of analyzing a single instrument
#[derive(Debug)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub result: AnalysisResult,
}

/// Error from analyzing a single instrument
#[derive(Debug)]
pub struct SymbolError {
    pub symbol: String,
    pub error: SignalError,
}

/// Analyze independent instruments in parallel
pub fn analyze_parallel<'a, T, I>(
    engine: &SignalEngine,
    instruments: I,
) -> (Vec<SymbolAnalysis>, Vec<SymbolError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .analyze(bars)
                .map(|result| SymbolAnalysis {
                    symbol: symbol.to_string(),
                    result,
                })
                .map_err(|error| SymbolError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

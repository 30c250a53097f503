//! Confluence scoring, signal decision and trade planning
//!
//! Each direction collects up to four independent booleans: price inside an
//! impulse block, price inside an imbalance, a break of structure, and a
//! liquidity sweep. The count is the score. `Basic` mode drops the sweep
//! factor and never builds a trade plan.

use tracing::debug;

use crate::{
    detectors::{any_occupied, first_occupied, StructureEvent, SweepFlags},
    AnalysisConfig, Direction, Zone, OHLCV,
};

/// Which confluence factors are scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConfluenceMode {
    /// Zone, imbalance and structure (0..=3). No trade plan.
    Basic,
    /// Adds the liquidity sweep factor (0..=4) and a trade plan.
    #[default]
    Extended,
}

/// Confluence factors for one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DirectionalConfluence {
    pub in_zone: bool,
    pub in_imbalance: bool,
    pub structure_break: bool,
    pub liquidity_sweep: bool,
}

impl DirectionalConfluence {
    pub fn score(&self, mode: ConfluenceMode) -> u8 {
        let sweep = match mode {
            ConfluenceMode::Basic => false,
            ConfluenceMode::Extended => self.liquidity_sweep,
        };
        [self.in_zone, self.in_imbalance, self.structure_break, sweep]
            .into_iter()
            .filter(|&factor| factor)
            .count() as u8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConfluenceState {
    pub bullish: DirectionalConfluence,
    pub bearish: DirectionalConfluence,
}

impl ConfluenceState {
    /// Evaluate every factor against the latest bar.
    pub fn evaluate<T: OHLCV>(
        last: &T,
        impulse_blocks: &[Zone],
        imbalances: &[Zone],
        structure: &[StructureEvent],
        sweeps: SweepFlags,
    ) -> Self {
        let side = |direction: Direction| DirectionalConfluence {
            in_zone: any_occupied(last, impulse_blocks, direction),
            in_imbalance: any_occupied(last, imbalances, direction),
            structure_break: structure.iter().any(|event| event.direction == direction),
            liquidity_sweep: sweeps.get(direction),
        };

        Self {
            bullish: side(Direction::Bullish),
            bearish: side(Direction::Bearish),
        }
    }

    pub fn get(&self, direction: Direction) -> &DirectionalConfluence {
        match direction {
            Direction::Bullish => &self.bullish,
            Direction::Bearish => &self.bearish,
        }
    }
}

/// Graded recommendation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Neutral,
}

impl Signal {
    /// Bullish is checked first: when both scores reach `min_confluence`
    /// the result is always `Buy`.
    pub fn decide(bull_score: u8, bear_score: u8, min_confluence: u8) -> Self {
        if bull_score >= min_confluence {
            Signal::Buy
        } else if bear_score >= min_confluence {
            Signal::Sell
        } else {
            Signal::Neutral
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Signal::Buy => Some(Direction::Bullish),
            Signal::Sell => Some(Direction::Bearish),
            Signal::Neutral => None,
        }
    }
}

/// Concrete levels for a fired signal
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TradePlan {
    #[default]
    NoTrade,
    Trade {
        direction: Direction,
        entry: f64,
        stop: f64,
        target: f64,
        risk_reward: f64,
        /// Percent move from entry to target, positive when profitable
        est_return_pct: f64,
    },
}

impl TradePlan {
    /// Plan levels for `signal` off the latest bar.
    ///
    /// Entry is the last close. The stop sits `stop_buffer_pct` beyond the far
    /// edge of the first impulse block the bar occupies, or beyond the bar's
    /// own low/high when it occupies none. Target is entry plus risk times
    /// `risk_reward`.
    ///
    /// Yields `NoTrade` when the levels are unusable: non-positive entry,
    /// zero or non-finite risk, or a stop on the wrong side of entry.
    pub fn build<T: OHLCV>(
        signal: Signal,
        last: &T,
        impulse_blocks: &[Zone],
        config: &AnalysisConfig,
    ) -> Self {
        let Some(direction) = signal.direction() else {
            return TradePlan::NoTrade;
        };

        let buffer = config.stop_buffer_pct / 100.0;
        let zone_edge = first_occupied(last, impulse_blocks, direction).map(Zone::far_edge);
        let entry = last.close();
        let rr = config.risk_reward.get();

        let (stop, target) = match direction {
            Direction::Bullish => {
                let stop = zone_edge.unwrap_or_else(|| last.low()) * (1.0 - buffer);
                let risk = entry - stop;
                (stop, entry + risk * rr)
            },
            Direction::Bearish => {
                let stop = zone_edge.unwrap_or_else(|| last.high()) * (1.0 + buffer);
                let risk = stop - entry;
                (stop, entry - risk * rr)
            },
        };

        let est_return_pct = match direction {
            Direction::Bullish => (target - entry) / entry * 100.0,
            Direction::Bearish => (entry - target) / entry * 100.0,
        };

        // A stop on the wrong side of entry gives negative risk and therefore
        // a non-positive return, so one check covers every degenerate case.
        if !(entry > 0.0 && est_return_pct > 0.0 && est_return_pct.is_finite()) {
            debug!(?signal, entry, stop, target, "degenerate trade levels, no plan");
            return TradePlan::NoTrade;
        }

        TradePlan::Trade {
            direction,
            entry,
            stop,
            target,
            risk_reward: rr,
            est_return_pct,
        }
    }

    #[inline]
    pub fn is_trade(&self) -> bool {
        matches!(self, TradePlan::Trade { .. })
    }
}

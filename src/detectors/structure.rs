//! Break-of-structure and liquidity-sweep analysis
//!
//! Both look only at the most recent pivots. Nothing is carried between
//! calls, so a break is reported for as long as the two latest pivots of a
//! kind keep the breaking relation.

use super::pivots::{Pivot, Pivots};
use crate::{Direction, OHLCV};

/// Kind of structure event
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StructureKind {
    BreakOfStructure,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructureEvent {
    pub kind: StructureKind,
    pub direction: Direction,
    /// Value of the breaking pivot
    pub price: f64,
    pub index: usize,
    pub timestamp: i64,
}

impl StructureEvent {
    fn break_at(pivot: &Pivot, direction: Direction) -> Self {
        Self {
            kind: StructureKind::BreakOfStructure,
            direction,
            price: pivot.value,
            index: pivot.index,
            timestamp: pivot.timestamp,
        }
    }
}

/// Compare the two latest pivots of each kind.
///
/// Higher high -> bullish break at the newer high. Lower low -> bearish break
/// at the newer low. At most one event per direction, bullish first.
pub fn detect_structure(pivots: &Pivots) -> Vec<StructureEvent> {
    let mut events = Vec::with_capacity(2);

    if let [.., prior, latest] = pivots.highs.as_slice() {
        if latest.value > prior.value {
            events.push(StructureEvent::break_at(latest, Direction::Bullish));
        }
    }

    if let [.., prior, latest] = pivots.lows.as_slice() {
        if latest.value < prior.value {
            events.push(StructureEvent::break_at(latest, Direction::Bearish));
        }
    }

    events
}

/// Wick-through-and-reclaim of the latest pivot, judged on one bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SweepFlags {
    pub bullish: bool,
    pub bearish: bool,
}

impl SweepFlags {
    #[inline]
    pub fn get(self, direction: Direction) -> bool {
        match direction {
            Direction::Bullish => self.bullish,
            Direction::Bearish => self.bearish,
        }
    }
}

/// Bullish: `last.low` undercuts the latest swing low and `last.close` ends
/// back above it. Bearish: `last.high` pierces the latest swing high and
/// `last.close` ends back below it.
pub fn detect_sweeps<T: OHLCV>(pivots: &Pivots, last: &T) -> SweepFlags {
    let bullish = pivots
        .latest_low()
        .is_some_and(|low| last.low() < low.value && last.close() > low.value);
    let bearish = pivots
        .latest_high()
        .is_some_and(|high| last.high() > high.value && last.close() < high.value);

    SweepFlags { bullish, bearish }
}

//! Swing high/low scanner over a symmetric window

use crate::{Period, OHLCV};

/// A local extremum
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pivot {
    pub value: f64,
    pub index: usize,
    pub timestamp: i64,
}

/// Swing highs and lows, each in ascending index order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pivots {
    pub highs: Vec<Pivot>,
    pub lows: Vec<Pivot>,
}

impl Pivots {
    #[inline]
    pub fn latest_high(&self) -> Option<&Pivot> {
        self.highs.last()
    }

    #[inline]
    pub fn latest_low(&self) -> Option<&Pivot> {
        self.lows.last()
    }

    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }
}

/// Bar `i` is a swing high when its high is strictly above the highs of the
/// `L` bars on each side; swing lows mirror this on lows. Equal neighbours
/// disqualify, so a flat top registers at neither bar.
///
/// The last `L` bars can never be pivots until more bars arrive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotScanner {
    pub swing_length: Period,
}

impl PivotScanner {
    pub fn new(swing_length: Period) -> Self {
        Self { swing_length }
    }

    /// Bars required before the first pivot can exist (`2L + 1`).
    #[inline]
    pub fn min_bars(&self) -> usize {
        self.swing_length.get().saturating_mul(2).saturating_add(1)
    }

    pub fn scan<T: OHLCV>(&self, bars: &[T]) -> Pivots {
        let mut pivots = Pivots::default();
        let half = self.swing_length.get();
        if bars.len() < self.min_bars() {
            return pivots;
        }

        for index in half..bars.len() - half {
            let bar = &bars[index];

            if neighbours(bars, index, half).all(|other| bar.high() > other.high()) {
                pivots.highs.push(Pivot {
                    value: bar.high(),
                    index,
                    timestamp: bar.timestamp(),
                });
            }

            if neighbours(bars, index, half).all(|other| bar.low() < other.low()) {
                pivots.lows.push(Pivot {
                    value: bar.low(),
                    index,
                    timestamp: bar.timestamp(),
                });
            }
        }

        pivots
    }
}

fn neighbours<'a, T: 'a>(
    bars: &'a [T],
    index: usize,
    half: usize,
) -> impl Iterator<Item = &'a T> + 'a {
    (1..=half).flat_map(move |offset| [&bars[index - offset], &bars[index + offset]])
}

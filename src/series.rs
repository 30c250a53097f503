//! Host-side bar buffer with append-or-replace-last semantics
//!
//! A live feed updates the in-progress bar many times before it closes. The
//! buffer keeps one element per timestamp: a bar with the same timestamp as
//! the newest element replaces it wholesale, a newer bar is appended, and an
//! older bar is rejected. The engine itself never mutates input; hosts pass
//! [`BarSeries::as_slice`] to it after every update.

use std::collections::VecDeque;

use crate::{OHLCVExt, Period, Result, SignalError, OHLCV};

/// Default number of bars retained
pub const DEFAULT_CAPACITY: usize = 200;

/// What an [`BarSeries::upsert`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesUpdate {
    Appended,
    ReplacedLast,
}

/// Bounded, timestamp-ordered bar buffer
#[derive(Debug, Clone)]
pub struct BarSeries<T> {
    bars: VecDeque<T>,
    capacity: Period,
}

impl<T: OHLCV> Default for BarSeries<T> {
    fn default() -> Self {
        Self::new(Period::new_const(DEFAULT_CAPACITY))
    }
}

impl<T: OHLCV> BarSeries<T> {
    /// Empty series retaining at most `capacity` bars. Storage grows on
    /// demand; only up to [`DEFAULT_CAPACITY`] slots are reserved up front.
    pub fn new(capacity: Period) -> Self {
        Self {
            bars: VecDeque::with_capacity(capacity.get().min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Build from historical bars, keeping the most recent `capacity`.
    pub fn from_bars(capacity: Period, bars: impl IntoIterator<Item = T>) -> Result<Self> {
        let mut series = Self::new(capacity);
        for bar in bars {
            series.upsert(bar)?;
        }
        Ok(series)
    }

    /// Append a newer bar or replace the newest one with the same timestamp.
    pub fn upsert(&mut self, bar: T) -> Result<SeriesUpdate> {
        bar.validate().map_err(|e| match e {
            SignalError::InvalidBar { reason, .. } => SignalError::InvalidBar {
                index: self.bars.len(),
                reason,
            },
            other => other,
        })?;

        match self.bars.back_mut() {
            Some(last) if bar.timestamp() == last.timestamp() => {
                *last = bar;
                Ok(SeriesUpdate::ReplacedLast)
            },
            Some(last) if bar.timestamp() < last.timestamp() => Err(SignalError::OutOfOrder {
                last: last.timestamp(),
                got: bar.timestamp(),
            }),
            _ => {
                if self.bars.len() >= self.capacity.get() {
                    self.bars.pop_front();
                }
                self.bars.push_back(bar);
                Ok(SeriesUpdate::Appended)
            },
        }
    }

    /// Bars oldest first, as one slice for [`crate::SignalEngine::analyze`].
    ///
    /// Rotates the ring buffer into contiguous storage when eviction has
    /// wrapped it.
    #[inline]
    pub fn as_slice(&mut self) -> &[T] {
        self.bars.make_contiguous()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.bars.iter()
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.bars.back()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

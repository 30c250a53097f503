//! Three-bar price imbalance (fair value gap) detector
//!
//! A gap between the wick of bar `i-2` and the wick of bar `i`, left behind by
//! a middle candle moving in the gap's direction.

use std::collections::HashMap;

use super::helpers::IMBALANCE_GAP_RATIO;
use crate::{
    params::{get_ratio, ParamMeta, Parameterized},
    Direction, OHLCVExt, Ratio, Result, Zone, ZoneDetector, ZoneKind, OHLCV,
};

/// Bullish when `bars[i-2].high < bars[i].low`, bearish when
/// `bars[i-2].low > bars[i].high`. The gap must be wider than
/// `min_gap_ratio` of the middle bar's range.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImbalanceDetector {
    pub min_gap_ratio: Ratio,
}

impl Default for ImbalanceDetector {
    fn default() -> Self {
        Self {
            min_gap_ratio: Ratio::new_const(IMBALANCE_GAP_RATIO),
        }
    }
}

impl ZoneDetector for ImbalanceDetector {
    fn kind(&self) -> ZoneKind {
        ZoneKind::Imbalance
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<Zone> {
        if index < 2 {
            return None;
        }
        let first = bars.get(index - 2)?;
        let middle = bars.get(index - 1)?;
        let last = bars.get(index)?;

        let min_gap = self.min_gap_ratio.get() * middle.range();

        // Middle candle color makes the two branches exclusive
        if first.high() < last.low()
            && middle.is_bullish()
            && last.low() - first.high() > min_gap
        {
            return Some(Zone::new(
                self.kind(),
                Direction::Bullish,
                first.high(),
                last.low(),
                index - 1,
                middle.timestamp(),
            ));
        }

        if first.low() > last.high()
            && middle.is_bearish()
            && first.low() - last.high() > min_gap
        {
            return Some(Zone::new(
                self.kind(),
                Direction::Bearish,
                last.high(),
                first.low(),
                index - 1,
                middle.timestamp(),
            ));
        }

        None
    }

    fn validate_config(&self) -> Result<()> {
        Ratio::new(self.min_gap_ratio.get())?;
        Ok(())
    }
}

static IMBALANCE_PARAMS: [ParamMeta; 1] = [ParamMeta::ratio(
    "min_gap_ratio",
    IMBALANCE_GAP_RATIO,
    (0.0, 1.0),
    "Minimum gap as a fraction of the middle bar's range",
)];

impl Parameterized for ImbalanceDetector {
    fn param_meta() -> &'static [ParamMeta] {
        &IMBALANCE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_gap_ratio: get_ratio(params, "min_gap_ratio", IMBALANCE_GAP_RATIO)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;

    fn bar(t: i64, o: f64, h: f64, l: f64, c: f64) -> Bar {
        Bar::new(t, o, h, l, c, 1000.0)
    }

    #[test]
    fn test_bullish_imbalance() {
        let bars = vec![
            bar(0, 8.5, 9.0, 8.0, 8.8),
            bar(1, 8.6, 11.7, 8.4, 11.5),
            bar(2, 11.5, 12.5, 11.5, 12.2),
        ];

        let zones = ImbalanceDetector::with_defaults().scan(&bars);
        assert_eq!(zones.len(), 1);
        let zone = zones[0];
        assert_eq!(zone.direction, Direction::Bullish);
        assert_eq!(zone.kind, ZoneKind::Imbalance);
        assert_eq!(zone.top, 11.5);
        assert_eq!(zone.bottom, 9.0);
        assert_eq!(zone.index, 1);
        assert_eq!(zone.timestamp, 1);
        assert!(zone.valid);
    }

    #[test]
    fn test_bearish_imbalance() {
        let bars = vec![
            bar(10, 12.2, 12.5, 11.5, 11.8),
            bar(20, 11.4, 11.6, 8.3, 8.5),
            bar(30, 8.5, 9.0, 8.0, 8.2),
        ];

        let zones = ImbalanceDetector::with_defaults().scan(&bars);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].direction, Direction::Bearish);
        assert_eq!(zones[0].top, 11.5);
        assert_eq!(zones[0].bottom, 9.0);
        assert_eq!(zones[0].timestamp, 20);
    }

    #[test]
    fn test_gap_too_small_relative_to_middle_range() {
        // Gap 0.5 vs 0.3 * 4.0 = 1.2
        let bars = vec![
            bar(0, 9.5, 10.0, 9.0, 9.8),
            bar(1, 9.0, 13.0, 9.0, 12.5),
            bar(2, 11.0, 11.5, 10.5, 11.2),
        ];
        assert!(ImbalanceDetector::with_defaults().scan(&bars).is_empty());
    }

    #[test]
    fn test_middle_candle_must_agree() {
        // Gap up but the middle candle closed down
        let bars = vec![
            bar(0, 8.5, 9.0, 8.0, 8.8),
            bar(1, 11.5, 11.7, 8.4, 8.6),
            bar(2, 11.5, 12.5, 11.5, 12.2),
        ];
        assert!(ImbalanceDetector::with_defaults().scan(&bars).is_empty());
    }

    #[test]
    fn test_short_input() {
        let bars = vec![bar(0, 8.5, 9.0, 8.0, 8.8), bar(1, 8.6, 11.7, 8.4, 11.5)];
        let detector = ImbalanceDetector::with_defaults();
        assert!(detector.scan(&bars).is_empty());
        assert!(detector.detect(&bars, 1).is_none());
        assert!(detector.detect(&bars, 5).is_none());
    }

    #[test]
    fn test_custom_ratio_from_params() {
        let mut params = HashMap::new();
        params.insert("min_gap_ratio", 0.9);
        let strict = ImbalanceDetector::with_params(&params).unwrap();

        // Gap 2.5 vs 0.9 * 3.3 = 2.97
        let bars = vec![
            bar(0, 8.5, 9.0, 8.0, 8.8),
            bar(1, 8.6, 11.7, 8.4, 11.5),
            bar(2, 11.5, 12.5, 11.5, 12.2),
        ];
        assert!(strict.scan(&bars).is_empty());

        params.insert("min_gap_ratio", 1.5);
        assert!(ImbalanceDetector::with_params(&params).is_err());
    }
}

//! Two-bar impulse block (order block) detector
//!
//! The last opposite-colored candle before a move whose body dwarfs that
//! candle's whole range marks where the move originated.

use std::collections::HashMap;

use super::helpers::IMPULSE_BODY_MULTIPLE;
use crate::{
    params::{get_multiple, ParamMeta, Parameterized},
    Direction, Multiple, OHLCVExt, Result, Zone, ZoneDetector, ZoneKind, OHLCV,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImpulseBlockDetector {
    /// Impulse body must exceed the origin bar's range by this multiple
    pub min_body_multiple: Multiple,
}

impl Default for ImpulseBlockDetector {
    fn default() -> Self {
        Self {
            min_body_multiple: Multiple::new_const(IMPULSE_BODY_MULTIPLE),
        }
    }
}

impl ZoneDetector for ImpulseBlockDetector {
    fn kind(&self) -> ZoneKind {
        ZoneKind::ImpulseBlock
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<Zone> {
        if index < 1 {
            return None;
        }
        let origin = bars.get(index - 1)?;
        let impulse = bars.get(index)?;

        if impulse.body() <= self.min_body_multiple.get() * origin.range() {
            return None;
        }

        let direction = if impulse.is_bullish() && origin.is_bearish() {
            Direction::Bullish
        } else if impulse.is_bearish() && origin.is_bullish() {
            Direction::Bearish
        } else {
            return None;
        };

        Some(Zone::new(
            self.kind(),
            direction,
            origin.low(),
            origin.high(),
            index - 1,
            origin.timestamp(),
        ))
    }

    fn validate_config(&self) -> Result<()> {
        Multiple::new(self.min_body_multiple.get())?;
        Ok(())
    }
}

static IMPULSE_PARAMS: [ParamMeta; 1] = [ParamMeta::multiple(
    "min_body_multiple",
    IMPULSE_BODY_MULTIPLE,
    (0.5, 5.0),
    "Impulse body size relative to the origin bar's full range",
)];

impl Parameterized for ImpulseBlockDetector {
    fn param_meta() -> &'static [ParamMeta] {
        &IMPULSE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_body_multiple: get_multiple(params, "min_body_multiple", IMPULSE_BODY_MULTIPLE)?,
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
    fn test_bullish_block() {
        // Down candle (range 1.0) followed by a 2.0 body up candle
        let bars = vec![bar(0, 10.5, 10.8, 9.8, 10.0), bar(1, 10.0, 12.2, 9.9, 12.0)];

        let zones = ImpulseBlockDetector::with_defaults().scan(&bars);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].direction, Direction::Bullish);
        assert_eq!(zones[0].kind, ZoneKind::ImpulseBlock);
        assert_eq!(zones[0].top, 10.8);
        assert_eq!(zones[0].bottom, 9.8);
        assert_eq!(zones[0].index, 0);
    }

    #[test]
    fn test_bearish_block() {
        let bars = vec![bar(0, 10.0, 10.8, 9.8, 10.5), bar(1, 10.5, 10.6, 8.2, 8.4)];

        let zones = ImpulseBlockDetector::with_defaults().scan(&bars);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].direction, Direction::Bearish);
        assert_eq!(zones[0].top, 10.8);
        assert_eq!(zones[0].bottom, 9.8);
    }

    #[test]
    fn test_body_must_exceed_multiple() {
        // Body 1.1 vs 1.2 * 1.0
        let bars = vec![bar(0, 10.5, 10.8, 9.8, 10.0), bar(1, 10.0, 11.2, 9.9, 11.1)];
        assert!(ImpulseBlockDetector::with_defaults().scan(&bars).is_empty());
    }

    #[test]
    fn test_same_color_is_not_a_block() {
        let bars = vec![bar(0, 10.0, 10.8, 9.8, 10.5), bar(1, 10.5, 13.0, 10.4, 12.9)];
        assert!(ImpulseBlockDetector::with_defaults().scan(&bars).is_empty());
    }

    #[test]
    fn test_overlapping_blocks_are_kept() {
        let bars = vec![
            bar(0, 10.5, 10.8, 9.8, 10.0),
            bar(1, 10.0, 12.2, 9.9, 12.0),
            bar(2, 12.0, 12.1, 8.9, 9.0),
        ];
        let zones = ImpulseBlockDetector::with_defaults().scan(&bars);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].index, 0);
        assert_eq!(zones[1].index, 1);
        assert_eq!(zones[1].direction, Direction::Bearish);
    }

    #[test]
    fn test_single_bar() {
        let bars = vec![bar(0, 10.5, 10.8, 9.8, 10.0)];
        assert!(ImpulseBlockDetector::with_defaults().scan(&bars).is_empty());
    }
}

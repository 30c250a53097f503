//! Shared thresholds and zone lookups used by the detectors and the scorer.

use crate::{Direction, Zone, OHLCV};

// ============================================================
// THRESHOLDS
// ============================================================

/// Imbalance gap must exceed this fraction of the middle bar's range
pub const IMBALANCE_GAP_RATIO: f64 = 0.3;
/// Impulse body must exceed the prior bar's range by this multiple
pub const IMPULSE_BODY_MULTIPLE: f64 = 1.2;

// ============================================================
// ZONE LOOKUPS
// ============================================================

/// First zone of `direction` (in detection order) the bar is trading inside.
#[inline]
pub fn first_occupied<'a, T: OHLCV>(
    bar: &T,
    zones: &'a [Zone],
    direction: Direction,
) -> Option<&'a Zone> {
    zones
        .iter()
        .find(|zone| zone.direction == direction && zone.is_occupied_by(bar))
}

#[inline]
pub fn any_occupied<T: OHLCV>(bar: &T, zones: &[Zone], direction: Direction) -> bool {
    first_occupied(bar, zones, direction).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bar, ZoneKind};

    #[test]
    fn test_first_occupied_respects_direction_and_order() {
        let zones = vec![
            Zone::new(ZoneKind::ImpulseBlock, Direction::Bearish, 10.0, 12.0, 0, 0),
            Zone::new(ZoneKind::ImpulseBlock, Direction::Bullish, 9.0, 11.0, 1, 1),
            Zone::new(ZoneKind::ImpulseBlock, Direction::Bullish, 10.5, 13.0, 2, 2),
        ];
        let bar = Bar::new(5, 11.0, 11.5, 10.8, 11.2, 1.0);

        let hit = first_occupied(&bar, &zones, Direction::Bullish).unwrap();
        assert_eq!(hit.index, 1);
        assert!(any_occupied(&bar, &zones, Direction::Bearish));
    }

    #[test]
    fn test_no_zones() {
        let bar = Bar::new(0, 1.0, 2.0, 0.5, 1.5, 1.0);
        assert!(first_occupied(&bar, &[], Direction::Bullish).is_none());
    }
}

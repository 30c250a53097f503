//! Property tests over randomly generated, well-formed bar sequences.

use proptest::prelude::*;
use smc_signals::prelude::*;

/// Random walk with gaps between bars so every detector gets exercised.
fn bars_strategy(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(
        (-3.0f64..3.0, 0.0f64..2.0, 0.0f64..2.0, -1.5f64..1.5),
        0..max_len,
    )
    .prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (change, up, down, gap))| {
                let open = price;
                let close = (price + change).max(1.0);
                let high = open.max(close) + up;
                let low = (open.min(close) - down).max(0.5);
                price = (close + gap).max(1.0);
                Bar::new(i as i64, open, high, low, close, 100.0)
            })
            .collect()
    })
}

fn engine_strategy() -> impl Strategy<Value = SignalEngine> {
    (1usize..5, 1u8..=4, 0.1f64..5.0, 0.0f64..2.0, any::<bool>()).prop_map(
        |(swing, min_confluence, rr, buffer, basic)| {
            let mode = if basic {
                ConfluenceMode::Basic
            } else {
                ConfluenceMode::Extended
            };
            EngineBuilder::new()
                .swing_length(swing)
                .min_confluence(min_confluence)
                .risk_reward(rr)
                .stop_buffer_pct(buffer)
                .mode(mode)
                .build()
                .unwrap()
        },
    )
}

proptest! {
    #[test]
    fn zones_have_ordered_bounds(bars in bars_strategy(80)) {
        let result = EngineBuilder::new().build().unwrap().analyze(&bars).unwrap();
        for zone in result.imbalances.iter().chain(&result.impulse_blocks) {
            prop_assert!(zone.top >= zone.bottom, "{:?}", zone);
            prop_assert!(zone.valid);
            prop_assert!(zone.index < bars.len());
        }
    }

    #[test]
    fn zones_are_in_index_order(bars in bars_strategy(80)) {
        let result = EngineBuilder::new().build().unwrap().analyze(&bars).unwrap();
        prop_assert!(result.imbalances.windows(2).all(|w| w[0].index < w[1].index));
        prop_assert!(result.impulse_blocks.windows(2).all(|w| w[0].index < w[1].index));
    }

    #[test]
    fn short_inputs_produce_no_detections(bars in bars_strategy(12), swing in 1usize..6) {
        if bars.len() < 3 {
            prop_assert!(ImbalanceDetector::default().scan(&bars).is_empty());
        }
        if bars.len() < 2 {
            prop_assert!(ImpulseBlockDetector::default().scan(&bars).is_empty());
        }
        if bars.len() < 2 * swing + 1 {
            let scanner = PivotScanner::new(Period::new(swing).unwrap());
            prop_assert!(scanner.scan(&bars).is_empty());
        }
    }

    #[test]
    fn flat_top_never_pivots(
        mut bars in bars_strategy(40),
        at in any::<prop::sample::Index>(),
        swing in 1usize..4,
    ) {
        prop_assume!(bars.len() >= 2);
        let peak = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max) + 1.0;
        let k = at.index(bars.len() - 1);
        bars[k].high = peak;
        bars[k + 1].high = peak;

        let pivots = PivotScanner::new(Period::new(swing).unwrap()).scan(&bars);
        prop_assert!(pivots.highs.iter().all(|p| p.index != k && p.index != k + 1));
    }

    #[test]
    fn analysis_is_deterministic(bars in bars_strategy(120), engine in engine_strategy()) {
        let first = engine.analyze(&bars).unwrap();
        let second = engine.analyze(&bars).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn signal_follows_scores(bars in bars_strategy(120), engine in engine_strategy()) {
        let result = engine.analyze(&bars).unwrap();
        let min = engine.config().min_confluence;
        let max = match engine.config().mode {
            ConfluenceMode::Basic => 3,
            ConfluenceMode::Extended => 4,
        };
        prop_assert!(result.bull_score <= max && result.bear_score <= max);

        let expected = if result.bull_score >= min {
            Signal::Buy
        } else if result.bear_score >= min {
            Signal::Sell
        } else {
            Signal::Neutral
        };
        prop_assert_eq!(result.signal, expected);
        prop_assert!(result.structure.len() <= 2);
    }

    #[test]
    fn trade_levels_are_on_the_right_side(bars in bars_strategy(120), engine in engine_strategy()) {
        let result = engine.analyze(&bars).unwrap();
        if let TradePlan::Trade { direction, entry, stop, target, est_return_pct, .. } = result.plan {
            match result.signal {
                Signal::Buy => {
                    prop_assert_eq!(direction, Direction::Bullish);
                    prop_assert!(target > entry && entry > stop);
                },
                Signal::Sell => {
                    prop_assert_eq!(direction, Direction::Bearish);
                    prop_assert!(target < entry && entry < stop);
                },
                Signal::Neutral => prop_assert!(false, "plan without a signal"),
            }
            prop_assert!(est_return_pct > 0.0);
            prop_assert_eq!(entry, bars[bars.len() - 1].close);
        }
    }
}

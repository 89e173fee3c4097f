//! Property tests for arithmetic and indicator invariants.

mod common;

use common::*;
use proptest::collection::vec;
use proptest::prelude::*;
use tsengine::domain::bar::{Bar, Ohlcv};
use tsengine::domain::context::RunContext;
use tsengine::domain::indicator::atr::{average_true_range, true_range};
use tsengine::domain::indicator::bollinger::bollinger_bands;
use tsengine::domain::indicator::drawdown::drawdown;
use tsengine::domain::indicator::var::value_at_risk;

fn paired_values() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..40).prop_flat_map(|n| (vec(-1e3f64..1e3, n), vec(-1e3f64..1e3, n)))
}

fn prices() -> impl Strategy<Value = Vec<f64>> {
    vec(1.0f64..500.0, 2..40)
}

/// (low, range, close position within the range)
fn hlc() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    vec((1.0f64..200.0, 0.0f64..20.0, 0.0f64..=1.0), 1..40)
}

fn asset_bars(rows: &[(f64, f64, f64)]) -> Vec<Bar<Ohlcv>> {
    dates(rows.len())
        .into_iter()
        .zip(rows)
        .map(|(d, &(low, range, pos))| {
            let high = low + range;
            let close = low + range * pos;
            Bar::new(
                d,
                Ohlcv {
                    open: close,
                    high,
                    low,
                    close,
                    volume: 0.0,
                },
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn add_then_sub_is_identity((a, b) in paired_values()) {
        let ctx = RunContext::new();
        let sa = float_series(&ctx, "a", &a);
        let sb = float_series(&ctx, "b", &b);

        let round_trip = sa.add(&ctx, &sb).unwrap().sub(&ctx, &sb).unwrap();
        for (got, want) in round_trip.values().unwrap().iter().zip(&a) {
            prop_assert!((got - want).abs() <= 1e-9 * want.abs().max(1.0));
        }
    }

    #[test]
    fn add_is_commutative((a, b) in paired_values()) {
        let ctx = RunContext::new();
        let sa = float_series(&ctx, "a", &a);
        let sb = float_series(&ctx, "b", &b);

        let ab = sa.add(&ctx, &sb).unwrap();
        let ba = sb.add(&ctx, &sa).unwrap();
        prop_assert_ne!(ab.name(), ba.name());
        prop_assert_eq!(ab.values().unwrap(), ba.values().unwrap());
    }

    #[test]
    fn bollinger_bands_are_ordered(
        values in prices(),
        n in 2usize..12,
        mult in 0.0f64..4.0,
    ) {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &values);
        let bands = bollinger_bands(&ctx, &s, n, mult).unwrap();
        let upper = bands.upper.values().unwrap();
        let middle = bands.middle.values().unwrap();
        let lower = bands.lower.values().unwrap();

        for i in 0..values.len() {
            if upper[i].is_nan() || lower[i].is_nan() {
                continue;
            }
            prop_assert!(upper[i] >= middle[i], "upper < middle at {}", i);
            prop_assert!(middle[i] >= lower[i], "middle < lower at {}", i);
        }
    }

    #[test]
    fn rising_series_has_no_drawdown(
        start in 1.0f64..100.0,
        steps in vec(0.0f64..5.0, 1..40),
        period in 1usize..15,
    ) {
        let values: Vec<f64> = steps
            .iter()
            .scan(start, |price, step| {
                *price += step;
                Some(*price)
            })
            .collect();
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &values);
        let dd = drawdown(&ctx, &s, period).unwrap().values().unwrap();
        prop_assert!(dd.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn true_range_and_atr_are_non_negative(rows in hlc(), n in 1usize..15) {
        let ctx = RunContext::new();
        let asset = asset_series(&ctx, "A", asset_bars(&rows));

        let tr = true_range(&ctx, &asset).unwrap().values().unwrap();
        let atr = average_true_range(&ctx, &asset, n).unwrap().values().unwrap();
        prop_assert!(tr.iter().all(|v| *v >= 0.0));
        prop_assert!(atr.iter().all(|v| *v >= 0.0));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn var_grows_with_percentile_and_stays_bounded(
        values in vec(10.0f64..200.0, 2..20),
        days in 2usize..6,
    ) {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &values);
        let low = value_at_risk(&ctx, &s, days, 0.90).unwrap().values().unwrap();
        let high = value_at_risk(&ctx, &s, days, 0.99).unwrap().values().unwrap();

        for (l, h) in low.iter().zip(&high) {
            prop_assert!(h >= l);
            prop_assert!((1e-99..=1.0).contains(l));
            prop_assert!((1e-99..=1.0).contains(h));
        }
    }
}

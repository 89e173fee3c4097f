//! Bollinger Bands.
//!
//! - Middle: SMA(n)
//! - Upper: Middle + multiplier × STDDEV(n)
//! - Lower: Middle - multiplier × STDDEV(n)
//!
//! STDDEV is the Bessel-corrected sample deviation from [`super::stddev`].
//! The three bands are cached together as one object. Each band is a named
//! handle over the data of the SMA/arithmetic series it is built from, so a
//! plain `sma(x, n)` elsewhere in the run shares the middle band's work.

use super::average::sma;
use super::stddev::standard_deviation;
use super::check_period;
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::series::{canonical_name, FloatSeries};

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: FloatSeries,
    pub middle: FloatSeries,
    pub lower: FloatSeries,
}

pub fn bollinger_bands(
    ctx: &RunContext,
    series: &FloatSeries,
    n: usize,
    stddev_mult: f64,
) -> Result<BollingerBands, SeriesError> {
    check_period("bollinger", n)?;
    if !stddev_mult.is_finite() || stddev_mult < 0.0 {
        return Err(SeriesError::invalid_parameter(
            "bollinger",
            format!("stddev multiplier must be finite and non-negative, got {stddev_mult}"),
        ));
    }

    let name = canonical_name("bollinger", &[&series.name(), &n, &stddev_mult]);
    ctx.fetch_object(&name, || {
        let middle = sma(ctx, series, n)?;
        let width = standard_deviation(ctx, series, n)?.mul(ctx, stddev_mult)?;
        let upper = middle.add(ctx, &width)?;
        let lower = middle.sub(ctx, &width)?;

        Ok(BollingerBands {
            upper: ctx.alias(&format!("{name}.upper"), &upper)?,
            middle: ctx.alias(&format!("{name}.middle"), &middle)?,
            lower: ctx.alias(&format!("{name}.lower"), &lower)?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::float_series;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bands_around_sma() {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &[10.0, 20.0, 30.0]);
        let bands = bollinger_bands(&ctx, &s, 3, 2.0).unwrap();

        let middle = bands.middle.values().unwrap();
        let upper = bands.upper.values().unwrap();
        let lower = bands.lower.values().unwrap();

        // window [30,20,10]: mean 20, sample stddev 10
        assert_abs_diff_eq!(middle[2], 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(upper[2], 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lower[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn bands_are_symmetric_and_ordered() {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &[5.0, 7.0, 6.0, 9.0, 4.0]);
        let bands = bollinger_bands(&ctx, &s, 3, 1.5).unwrap();
        let middle = bands.middle.values().unwrap();
        let upper = bands.upper.values().unwrap();
        let lower = bands.lower.values().unwrap();

        for i in 0..middle.len() {
            assert!(upper[i] >= middle[i] && middle[i] >= lower[i]);
            assert_abs_diff_eq!(upper[i] - middle[i], middle[i] - lower[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn constant_input_collapses_bands() {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &[100.0; 4]);
        let bands = bollinger_bands(&ctx, &s, 3, 2.0).unwrap();
        assert_eq!(bands.upper.values().unwrap(), vec![100.0; 4]);
        assert_eq!(bands.lower.values().unwrap(), vec![100.0; 4]);
    }

    #[test]
    fn bands_are_cached_as_one_object() {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &[1.0, 2.0, 3.0]);
        let a = bollinger_bands(&ctx, &s, 3, 2.0).unwrap();
        let b = bollinger_bands(&ctx, &s, 3, 2.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.upper.name(), "bollinger(x,3,2).upper");
    }

    #[test]
    fn middle_band_shares_sma_computation() {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &[1.0, 2.0, 3.0]);
        let bands = bollinger_bands(&ctx, &s, 3, 2.0).unwrap();
        let plain = sma(&ctx, &s, 3).unwrap();

        assert!(bands.middle.shares_data_with(&plain));
        assert_ne!(bands.middle, plain);
    }

    #[test]
    fn rejects_negative_multiplier() {
        let ctx = RunContext::new();
        let s = float_series(&ctx, "x", &[1.0, 2.0]);
        assert!(bollinger_bands(&ctx, &s, 2, -1.0).is_err());
        assert!(bollinger_bands(&ctx, &s, 2, f64::NAN).is_err());
    }
}

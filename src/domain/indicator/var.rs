//! Historical value-at-risk by iterated self-convolution.
//!
//! For each bar the distribution of cumulative log returns is grown from
//! {0} by `steps` rounds of Cartesian sums against the `days` most recent
//! daily log returns (clamped at the start of history), where
//! `steps = ceil(ln(resolution) / ln(days))` keeps the sample count near
//! `resolution`. The distribution is rescaled by sqrt(1 / steps), the value at
//! rank round(count × (1 - percentile)) of the ascending order is taken, and
//! converted to a fractional loss 1 - exp(quantile), clamped to
//! [1e-99, 1]. No randomness is involved: identical inputs give identical
//! output.

use super::transform::log_return;
use crate::domain::bar::Bar;
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::series::{canonical_name, FloatSeries};

pub const DEFAULT_VAR_DAYS: usize = 21;
pub const DEFAULT_VAR_PERCENTILE: f64 = 0.95;

const VAR_FLOOR: f64 = 1e-99;
const VAR_CEILING: f64 = 1.0;

pub fn value_at_risk(
    ctx: &RunContext,
    series: &FloatSeries,
    days: usize,
    percentile: f64,
) -> Result<FloatSeries, SeriesError> {
    if days < 2 {
        return Err(SeriesError::invalid_parameter(
            "var",
            format!("days must be at least 2, got {days}"),
        ));
    }
    if !(0.0..=1.0).contains(&percentile) {
        return Err(SeriesError::invalid_parameter(
            "var",
            format!("percentile must be within [0, 1], got {percentile}"),
        ));
    }
    let resolution = ctx.config().var_resolution;
    if resolution < 2 {
        return Err(SeriesError::invalid_parameter(
            "var",
            format!("resolution must be at least 2, got {resolution}"),
        ));
    }

    let returns = log_return(ctx, series)?;
    let name = canonical_name("var", &[&series.name(), &days, &percentile]);
    let steps = upsampling_steps(resolution, days);

    ctx.fetch(&name, move || {
        let bars = returns.upstream_data()?;
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        let mut scratch = Vec::new();
        Ok(bars
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let var = var_at(&values, i, days, steps, percentile, &mut scratch);
                Bar::new(b.date, var)
            })
            .collect())
    })
}

/// Convolution rounds needed for `days^steps` to reach `resolution`.
pub fn upsampling_steps(resolution: usize, days: usize) -> usize {
    ((resolution as f64).ln() / (days as f64).ln()).ceil().max(1.0) as usize
}

fn var_at(
    returns: &[f64],
    idx: usize,
    days: usize,
    steps: usize,
    percentile: f64,
    scratch: &mut Vec<f64>,
) -> f64 {
    let mut distribution = vec![0.0];
    for _ in 0..steps {
        scratch.clear();
        scratch.reserve(distribution.len() * days);
        for &d in &distribution {
            scratch.extend((0..days).map(|t| d + returns[idx.saturating_sub(t)]));
        }
        std::mem::swap(&mut distribution, scratch);
    }

    let scale = (1.0 / steps as f64).sqrt();
    let count = distribution.len();
    let rank = ((count as f64 * (1.0 - percentile)).round() as usize).min(count - 1);
    let (_, quantile, _) = distribution.select_nth_unstable_by(rank, f64::total_cmp);

    let var = 1.0 - (scale * *quantile).exp();
    var.max(VAR_FLOOR).min(VAR_CEILING)
}

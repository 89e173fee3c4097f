//! True range and average true range.

use super::average::sma;
use super::{check_period, derive};
use crate::domain::bar::Bar;
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::series::{canonical_name, AssetSeries, FloatSeries};

/// max(prev close, high) - min(prev close, low); the first bar uses its own close.
pub fn true_range(ctx: &RunContext, asset: &AssetSeries) -> Result<FloatSeries, SeriesError> {
    let name = canonical_name("tr", &[&asset.name()]);
    derive(ctx, name, asset, |bars| {
        bars.iter()
            .enumerate()
            .map(|(i, b)| {
                let prev_close = bars[i.saturating_sub(1)].value.close;
                Bar::new(b.date, b.value.true_range(prev_close))
            })
            .collect()
    })
}

/// Simple moving average of the true range.
pub fn average_true_range(
    ctx: &RunContext,
    asset: &AssetSeries,
    n: usize,
) -> Result<FloatSeries, SeriesError> {
    check_period("atr", n)?;
    let tr = true_range(ctx, asset)?;
    sma(ctx, &tr, n)
}

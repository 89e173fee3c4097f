//! Date-aligned access to series values.
//!
//! Resolution policy for a requested date `d`:
//! - a bar dated exactly `d` resolves to its value;
//! - otherwise the most recent bar dated before `d` is carried forward;
//! - a date before the first bar has no prior value. [`lookup`] clamps it to
//!   the first bar; [`try_lookup`] reports it as `None`.
//!
//! An empty series never resolves.

use crate::domain::bar::Bar;
use crate::domain::error::SeriesError;
use crate::domain::series::{SeriesValue, TimeSeries};
use chrono::NaiveDate;

/// Index of the last bar dated on or before `date`.
pub fn position<T>(bars: &[Bar<T>], date: NaiveDate) -> Option<usize> {
    bars.partition_point(|b| b.date <= date).checked_sub(1)
}

/// Value at `date` with carry-forward, clamped to the first bar.
pub fn value_at<T: Clone>(bars: &[Bar<T>], date: NaiveDate) -> Option<T> {
    let idx = position(bars, date).unwrap_or(0);
    bars.get(idx).map(|b| b.value.clone())
}

pub fn lookup<T: SeriesValue>(series: &TimeSeries<T>, date: NaiveDate) -> Result<T, SeriesError> {
    let bars = series.data()?;
    value_at(&bars, date).ok_or_else(|| SeriesError::EmptySeries {
        name: series.name().to_string(),
    })
}

pub fn try_lookup<T: SeriesValue>(
    series: &TimeSeries<T>,
    date: NaiveDate,
) -> Result<Option<T>, SeriesError> {
    let bars = series.data()?;
    Ok(position(&bars, date).map(|i| bars[i].value.clone()))
}

/// Sequential carry-forward reader for dates visited in ascending order.
///
/// Equivalent to calling [`value_at`] per date, in linear total time.
pub struct AlignedCursor<'a, T> {
    bars: &'a [Bar<T>],
    next: usize,
}

impl<'a, T: Clone> AlignedCursor<'a, T> {
    pub fn new(bars: &'a [Bar<T>]) -> Self {
        Self { bars, next: 0 }
    }

    pub fn value_at(&mut self, date: NaiveDate) -> Option<T> {
        while self.next < self.bars.len() && self.bars[self.next].date <= date {
            self.next += 1;
        }
        let idx = self.next.saturating_sub(1);
        self.bars.get(idx).map(|b| b.value.clone())
    }
}

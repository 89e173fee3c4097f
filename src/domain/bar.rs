//! Bar model: one dated sample of a series.

use chrono::NaiveDate;

/// An immutable (date, value) sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar<T> {
    pub date: NaiveDate,
    pub value: T,
}

impl<T> Bar<T> {
    pub fn new(date: NaiveDate, value: T) -> Self {
        Self { date, value }
    }
}

/// OHLCV payload carried by asset series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohlcv {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Ohlcv {
    /// max(prev_close, high) - min(prev_close, low)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let high = prev_close.max(self.high);
        let low = prev_close.min(self.low);
        high - low
    }
}

/// Returns the first date that does not strictly follow its predecessor.
pub fn first_unordered<T>(bars: &[Bar<T>]) -> Option<NaiveDate> {
    bars.windows(2)
        .find(|w| w[1].date <= w[0].date)
        .map(|w| w[1].date)
}

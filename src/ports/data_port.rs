//! Raw market data port trait.
//!
//! Implementations supply OHLCV bars for a symbol, sorted by date. The engine
//! registers them as source series; it never writes data back.

use crate::domain::bar::{Bar, Ohlcv};
use crate::domain::error::EngineError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars dated within `[start, end]`; a missing bound is unbounded.
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar<Ohlcv>>, EngineError>;

    fn list_symbols(&self) -> Result<Vec<String>, EngineError>;
}

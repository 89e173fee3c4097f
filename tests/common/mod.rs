#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use tsengine::domain::bar::{Bar, Ohlcv};
use tsengine::domain::context::RunContext;
use tsengine::domain::error::EngineError;
use tsengine::domain::series::{AssetSeries, FloatSeries};
use tsengine::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar<Ohlcv>>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar<Ohlcv>>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar<Ohlcv>>, EngineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngineError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start.is_none_or(|s| b.date >= s))
                    .filter(|b| end.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, EngineError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily dates starting 2024-01-01.
pub fn dates(count: usize) -> Vec<NaiveDate> {
    let start = date(2024, 1, 1);
    (0..count)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<Bar<Ohlcv>> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let price = start_price + i as f64;
            Bar::new(
                start + chrono::Duration::days(i as i64),
                Ohlcv {
                    open: price,
                    high: price + 1.0,
                    low: price - 1.0,
                    close: price,
                    volume: 1000.0,
                },
            )
        })
        .collect()
}

pub fn float_series(ctx: &RunContext, name: &str, values: &[f64]) -> FloatSeries {
    let bars = dates(values.len())
        .into_iter()
        .zip(values)
        .map(|(d, v)| Bar::new(d, *v))
        .collect();
    ctx.register_float(name, bars).unwrap()
}

/// Float series on explicit dates.
pub fn dated_series(ctx: &RunContext, name: &str, points: &[(NaiveDate, f64)]) -> FloatSeries {
    let bars = points.iter().map(|(d, v)| Bar::new(*d, *v)).collect();
    ctx.register_float(name, bars).unwrap()
}

pub fn asset_series(ctx: &RunContext, name: &str, bars: Vec<Bar<Ohlcv>>) -> AssetSeries {
    ctx.register_asset(name, bars).unwrap()
}

//! Technical and risk indicators.
//!
//! Every indicator is a function of a [`RunContext`] and one or more input
//! series. It derives a canonical name from its inputs and parameters and
//! asks the context for that name, so identical requests share one series.
//!
//! All windows of length `n` ending at bar `i` read `value[max(0, i - t)]`
//! for `t` in `0..n`: early bars see the first value repeated rather than a
//! shorter window or a missing result.
//!
//! [`IndicatorSpec`] is the typed identity of the indicators selectable from
//! the command line.

pub mod atr;
pub mod average;
pub mod bollinger;
pub mod drawdown;
pub mod stddev;
pub mod transform;
pub mod var;

use crate::domain::bar::Bar;
use crate::domain::context::RunContext;
use crate::domain::error::{EngineError, SeriesError};
use crate::domain::series::{AssetSeries, FloatSeries, SeriesValue, TimeSeries};
use std::fmt;
use std::str::FromStr;

/// Largest period accepted when parsing an [`IndicatorSpec`].
pub const MAX_PERIOD: usize = 10_000;

/// Trailing window of `n` values ending at `idx`, clamped at index 0.
pub(crate) fn trailing(values: &[f64], idx: usize, n: usize) -> impl Iterator<Item = f64> + '_ {
    (0..n).map(move |t| values[idx.saturating_sub(t)])
}

pub(crate) fn check_period(operation: &str, n: usize) -> Result<(), SeriesError> {
    if n == 0 {
        return Err(SeriesError::invalid_parameter(
            operation,
            "period must be at least 1",
        ));
    }
    Ok(())
}

/// Float series `name` computed from the bars of `input`.
pub(crate) fn derive<T, F>(
    ctx: &RunContext,
    name: String,
    input: &TimeSeries<T>,
    compute: F,
) -> Result<FloatSeries, SeriesError>
where
    T: SeriesValue,
    F: FnOnce(&[Bar<T>]) -> Vec<Bar<f64>> + Send + 'static,
{
    let input = input.clone();
    ctx.fetch(&name, move || {
        let bars = input.upstream_data()?;
        Ok(compute(&bars))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSpec {
    Sma(usize),
    Ema(usize),
    Stddev(usize),
    Volatility(usize),
    TrueRange,
    Atr(usize),
    Drawdown(usize),
    Ulcer(usize),
    Bollinger { period: usize, stddev_mult: f64 },
    ValueAtRisk { days: usize, percentile: f64 },
}

impl IndicatorSpec {
    /// Builds the indicator on the close (or bars) of `asset`.
    ///
    /// Returns one labelled series per output column.
    pub fn evaluate(
        &self,
        ctx: &RunContext,
        asset: &AssetSeries,
    ) -> Result<Vec<(String, FloatSeries)>, SeriesError> {
        let close = transform::close(ctx, asset)?;
        let label = self.to_string();
        let single = |series: FloatSeries| -> Result<Vec<(String, FloatSeries)>, SeriesError> {
            Ok(vec![(label.clone(), series)])
        };

        match *self {
            IndicatorSpec::Sma(n) => single(average::sma(ctx, &close, n)?),
            IndicatorSpec::Ema(n) => single(average::ema(ctx, &close, n)?),
            IndicatorSpec::Stddev(n) => single(stddev::standard_deviation(ctx, &close, n)?),
            IndicatorSpec::Volatility(n) => single(stddev::volatility(ctx, &close, n)?),
            IndicatorSpec::TrueRange => single(atr::true_range(ctx, asset)?),
            IndicatorSpec::Atr(n) => single(atr::average_true_range(ctx, asset, n)?),
            IndicatorSpec::Drawdown(n) => single(drawdown::drawdown(ctx, &close, n)?),
            IndicatorSpec::Ulcer(n) => single(drawdown::ulcer_index(ctx, &close, n)?),
            IndicatorSpec::Bollinger {
                period,
                stddev_mult,
            } => {
                let bands = bollinger::bollinger_bands(ctx, &close, period, stddev_mult)?;
                Ok(vec![
                    (format!("{label}.upper"), bands.upper),
                    (format!("{label}.middle"), bands.middle),
                    (format!("{label}.lower"), bands.lower),
                ])
            }
            IndicatorSpec::ValueAtRisk { days, percentile } => {
                single(var::value_at_risk(ctx, &close, days, percentile)?)
            }
        }
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSpec::Sma(n) => write!(f, "SMA({})", n),
            IndicatorSpec::Ema(n) => write!(f, "EMA({})", n),
            IndicatorSpec::Stddev(n) => write!(f, "STDDEV({})", n),
            IndicatorSpec::Volatility(n) => write!(f, "VOLATILITY({})", n),
            IndicatorSpec::TrueRange => write!(f, "TR"),
            IndicatorSpec::Atr(n) => write!(f, "ATR({})", n),
            IndicatorSpec::Drawdown(n) => write!(f, "DRAWDOWN({})", n),
            IndicatorSpec::Ulcer(n) => write!(f, "ULCER({})", n),
            IndicatorSpec::Bollinger {
                period,
                stddev_mult,
            } => write!(f, "BOLLINGER({},{})", period, stddev_mult),
            IndicatorSpec::ValueAtRisk { days, percentile } => {
                write!(f, "VAR({},{})", days, percentile)
            }
        }
    }
}

/// Parses `name[:arg[:arg]]`, e.g. `sma:20`, `bollinger:20:2`, `var`.
/// Omitted arguments take the documented defaults.
impl FromStr for IndicatorSpec {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| EngineError::IndicatorSpec {
            spec: s.to_string(),
            reason,
        };

        let mut parts = s.trim().split(':');
        let kind = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        let period = |idx: usize, default: usize| -> Result<usize, EngineError> {
            match args.get(idx) {
                None => Ok(default),
                Some(raw) => {
                    let n = raw
                        .trim()
                        .parse::<usize>()
                        .map_err(|e| invalid(format!("argument {}: {}", idx + 1, e)))?;
                    if n == 0 || n > MAX_PERIOD {
                        return Err(invalid(format!(
                            "argument {}: period must be between 1 and {MAX_PERIOD}",
                            idx + 1
                        )));
                    }
                    Ok(n)
                }
            }
        };
        let real = |idx: usize, default: f64| -> Result<f64, EngineError> {
            match args.get(idx) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| invalid(format!("argument {}: {}", idx + 1, e))),
            }
        };

        let max_args = match kind.as_str() {
            "tr" => 0,
            "bollinger" | "var" => 2,
            _ => 1,
        };
        if args.len() > max_args {
            return Err(invalid(format!("expected at most {max_args} arguments")));
        }

        let spec = match kind.as_str() {
            "sma" => IndicatorSpec::Sma(period(0, 20)?),
            "ema" => IndicatorSpec::Ema(period(0, 20)?),
            "stddev" => IndicatorSpec::Stddev(period(0, stddev::DEFAULT_STDDEV_PERIOD)?),
            "volatility" => IndicatorSpec::Volatility(period(0, stddev::DEFAULT_STDDEV_PERIOD)?),
            "tr" => IndicatorSpec::TrueRange,
            "atr" => IndicatorSpec::Atr(period(0, 14)?),
            "drawdown" => IndicatorSpec::Drawdown(period(0, 20)?),
            "ulcer" => IndicatorSpec::Ulcer(period(0, 14)?),
            "bollinger" => IndicatorSpec::Bollinger {
                period: period(0, bollinger::DEFAULT_BOLLINGER_PERIOD)?,
                stddev_mult: real(1, bollinger::DEFAULT_BOLLINGER_MULTIPLIER)?,
            },
            "var" => IndicatorSpec::ValueAtRisk {
                days: period(0, var::DEFAULT_VAR_DAYS)?,
                percentile: real(1, var::DEFAULT_VAR_PERCENTILE)?,
            },
            other => return Err(invalid(format!("unknown indicator {other:?}"))),
        };
        Ok(spec)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::bar::{Bar, Ohlcv};
    use crate::domain::context::RunContext;
    use crate::domain::series::{AssetSeries, FloatSeries};
    use chrono::{Duration, NaiveDate};

    /// Day `d` counted from 2024-01-01 (day 1).
    pub fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i64::from(d) - 1)
    }

    pub fn float_series(ctx: &RunContext, name: &str, values: &[f64]) -> FloatSeries {
        let bars = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Bar::new(date(i as u32 + 1), v))
            .collect();
        ctx.register_float(name, bars).unwrap()
    }

    /// Bars from (high, low, close) triples.
    pub fn asset_series(ctx: &RunContext, name: &str, hlc: &[(f64, f64, f64)]) -> AssetSeries {
        let bars = hlc
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| {
                Bar::new(
                    date(i as u32 + 1),
                    Ohlcv {
                        open: close,
                        high,
                        low,
                        close,
                        volume: 1000.0,
                    },
                )
            })
            .collect();
        ctx.register_asset(name, bars).unwrap()
    }
}

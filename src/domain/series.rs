//! Lazily computed, named time series.
//!
//! A [`TimeSeries`] is a cheap handle: a canonical name plus a shared
//! [`Deferred`] cell holding the bars. Cloning a handle never copies bars,
//! and reading [`TimeSeries::data`] blocks until the computation behind the
//! cell has finished (running it on the calling thread if nobody has yet).

use crate::domain::bar::{Bar, Ohlcv};
use crate::domain::cache::Deferred;
use crate::domain::error::SeriesError;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

/// Bound shared by every bar payload a series can carry.
pub trait SeriesValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> SeriesValue for T {}

pub type FloatSeries = TimeSeries<f64>;
pub type AssetSeries = TimeSeries<Ohlcv>;

pub struct TimeSeries<T: SeriesValue> {
    name: Arc<str>,
    data: Arc<Deferred<T>>,
}

impl<T: SeriesValue> TimeSeries<T> {
    pub(crate) fn from_parts(name: &str, data: Arc<Deferred<T>>) -> Self {
        Self {
            name: Arc::from(name),
            data,
        }
    }

    /// Canonical name of the computation that produces this series.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Materialized bars, computing them first if needed.
    pub fn data(&self) -> Result<Arc<Vec<Bar<T>>>, SeriesError> {
        self.data.get()
    }

    /// Same as [`data`](Self::data), but failures are reported as an
    /// upstream failure of this series. Used by downstream computations.
    pub(crate) fn upstream_data(&self) -> Result<Arc<Vec<Bar<T>>>, SeriesError> {
        self.data().map_err(|e| match e {
            SeriesError::Upstream { .. } => e,
            other => SeriesError::Upstream {
                name: self.name.to_string(),
                reason: other.to_string(),
            },
        })
    }

    pub fn is_materialized(&self) -> bool {
        self.data.is_ready()
    }

    /// True when both handles share one underlying computation.
    pub fn shares_data_with(&self, other: &TimeSeries<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn deferred(&self) -> &Arc<Deferred<T>> {
        &self.data
    }

    pub fn dates(&self) -> Result<Vec<NaiveDate>, SeriesError> {
        Ok(self.data()?.iter().map(|b| b.date).collect())
    }

    pub fn values(&self) -> Result<Vec<T>, SeriesError> {
        Ok(self.data()?.iter().map(|b| b.value.clone()).collect())
    }

    pub fn len(&self) -> Result<usize, SeriesError> {
        Ok(self.data()?.len())
    }
}

impl<T: SeriesValue> Clone for TimeSeries<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: SeriesValue> PartialEq for TimeSeries<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.shares_data_with(other)
    }
}

impl<T: SeriesValue> fmt::Debug for TimeSeries<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSeries")
            .field("name", &self.name)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

impl<T: SeriesValue> fmt::Display for TimeSeries<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Formats `op(arg,arg,...)`. Argument names of upstream series nest, so
/// distinct expressions never share a name.
pub fn canonical_name(op: &str, args: &[&dyn fmt::Display]) -> String {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    format!("{}({})", op, args.join(","))
}

/// Names of externally supplied series must not be confusable with derived
/// names or scalar arguments.
pub fn validate_source_name(name: &str) -> Result<(), SeriesError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains(['(', ')', ',']) {
        Some("name must not contain '(', ')' or ','")
    } else if name.parse::<f64>().is_ok() {
        Some("name must not be numeric")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SeriesError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

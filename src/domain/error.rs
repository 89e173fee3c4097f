//! Domain error types.

use chrono::NaiveDate;

/// Failure of a single series computation.
///
/// Cloneable because one failed computation is handed to every requester of
/// its canonical name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("invalid parameter for {operation}: {reason}")]
    InvalidParameter { operation: String, reason: String },

    #[error("invalid series name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("bars for {name} are not strictly increasing at {date}")]
    UnorderedDates { name: String, date: NaiveDate },

    #[error("series {name} has no bars")]
    EmptySeries { name: String },

    #[error("cache entry {name} was created with a different value type")]
    TypeMismatch { name: String },

    #[error("upstream series {name} failed: {reason}")]
    Upstream { name: String, reason: String },

    #[error("computation of {name} did not complete")]
    Abandoned { name: String },
}

impl SeriesError {
    pub fn invalid_parameter(operation: &str, reason: impl Into<String>) -> Self {
        SeriesError::InvalidParameter {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for tsengine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("invalid indicator spec {spec:?}: {reason}")]
    IndicatorSpec { spec: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. }
            | EngineError::IndicatorSpec { .. } => 2,
            EngineError::Data { .. } | EngineError::NoData { .. } => 3,
            EngineError::Series(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_error_display() {
        let err = SeriesError::invalid_parameter("sma", "period must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid parameter for sma: period must be at least 1"
        );
    }

    #[test]
    fn series_error_converts_into_engine_error() {
        let err: EngineError = SeriesError::EmptySeries { name: "SPY".into() }.into();
        assert!(matches!(err, EngineError::Series(SeriesError::EmptySeries { .. })));
        assert_eq!(err.to_string(), "series SPY has no bars");
    }

    #[test]
    fn upstream_error_names_the_failed_series() {
        let err = SeriesError::Upstream {
            name: "sma(SPY.close,0)".into(),
            reason: "period must be at least 1".into(),
        };
        assert!(err.to_string().contains("sma(SPY.close,0)"));
    }
}

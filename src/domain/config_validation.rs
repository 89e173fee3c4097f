//! Configuration validation.
//!
//! Builds typed run and data settings from a [`ConfigPort`], rejecting
//! malformed or out-of-range values before any series is computed.

use crate::domain::context::{RunConfig, DEFAULT_VAR_RESOLUTION};
use crate::domain::error::EngineError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Where bars are loaded from and which dates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataConfig {
    pub path: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, EngineError> {
    let threads = parse_count(config, "run", "threads", 0)?;
    let var_resolution = parse_count(config, "run", "var_resolution", DEFAULT_VAR_RESOLUTION)?;
    if var_resolution < 2 {
        return Err(invalid("run", "var_resolution", "var_resolution must be at least 2"));
    }

    Ok(RunConfig {
        threads,
        var_resolution,
    })
}

pub fn build_data_config(config: &dyn ConfigPort) -> Result<DataConfig, EngineError> {
    let path = config
        .get_string("data", "path")
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start >= end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }

    Ok(DataConfig {
        path,
        start_date,
        end_date,
    })
}

fn parse_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, EngineError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            invalid(
                section,
                key,
                &format!("{} must be a non-negative integer, got {:?}", key, raw),
            )
        }),
    }
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, EngineError> {
    config.get_date("data", key).map_err(|raw| {
        invalid(
            "data",
            key,
            &format!("invalid {} {:?}, expected YYYY-MM-DD", key, raw),
        )
    })
}

fn invalid(section: &str, key: &str, reason: &str) -> EngineError {
    EngineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

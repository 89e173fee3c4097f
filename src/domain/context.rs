//! Run context: the cache, date grid and worker pool of one algorithm run.
//!
//! Every series produced during a run is owned by the run's context and
//! shared through its cache. Dropping the context drops the cache.

use crate::domain::bar::{first_unordered, Bar, Ohlcv};
use crate::domain::cache::{CacheStats, SeriesCache};
use crate::domain::error::{EngineError, SeriesError};
use crate::domain::series::{validate_source_name, AssetSeries, FloatSeries, SeriesValue, TimeSeries};
use chrono::NaiveDate;
use rayon::prelude::*;

pub const DEFAULT_VAR_RESOLUTION: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Worker threads for parallel materialization; 0 uses the global pool.
    pub threads: usize,
    /// Target distribution size for value-at-risk estimation.
    pub var_resolution: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            var_resolution: DEFAULT_VAR_RESOLUTION,
        }
    }
}

pub struct RunContext {
    config: RunConfig,
    grid: Vec<NaiveDate>,
    cache: SeriesCache,
    pool: Option<rayon::ThreadPool>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            grid: Vec::new(),
            cache: SeriesCache::new(),
            pool: None,
        }
    }

    pub fn with_config(config: RunConfig) -> Result<Self, EngineError> {
        let pool = if config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("tsengine-worker-{i}"))
                .build()
                .map_err(|e| EngineError::ConfigInvalid {
                    section: "run".into(),
                    key: "threads".into(),
                    reason: e.to_string(),
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            config,
            grid: Vec::new(),
            cache: SeriesCache::new(),
            pool,
        })
    }

    /// Sets the canonical date grid; dates are sorted and deduplicated.
    ///
    /// Resampled series are named without their grid, so the grid can only
    /// be set while the cache is still empty.
    pub fn with_grid(mut self, mut grid: Vec<NaiveDate>) -> Result<Self, SeriesError> {
        let stats = self.cache.stats();
        if stats.data_entries + stats.object_entries > 0 {
            return Err(SeriesError::invalid_parameter(
                "grid",
                "grid must be set before any series is cached",
            ));
        }
        grid.sort_unstable();
        grid.dedup();
        self.grid = grid;
        Ok(self)
    }

    pub fn grid(&self) -> &[NaiveDate] {
        &self.grid
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    /// Series named `name`, computed by `producer` at most once per run.
    ///
    /// The producer is not run here: it runs when the series' data is first
    /// requested, on the requesting thread.
    pub fn fetch<T, F>(&self, name: &str, producer: F) -> Result<TimeSeries<T>, SeriesError>
    where
        T: SeriesValue,
        F: FnOnce() -> Result<Vec<Bar<T>>, SeriesError> + Send + 'static,
    {
        self.cache.object(name, || {
            let data = self.cache.data(name, producer)?;
            Ok(TimeSeries::from_parts(name, data))
        })
    }

    /// A second handle named `name` over the data of `series`.
    pub fn alias<T: SeriesValue>(
        &self,
        name: &str,
        series: &TimeSeries<T>,
    ) -> Result<TimeSeries<T>, SeriesError> {
        self.cache.object(name, || {
            Ok(TimeSeries::from_parts(name, std::sync::Arc::clone(series.deferred())))
        })
    }

    /// Arbitrary typed object cached under `name` (e.g. band bundles).
    pub fn fetch_object<W, F>(&self, name: &str, producer: F) -> Result<W, SeriesError>
    where
        W: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<W, SeriesError>,
    {
        self.cache.object(name, producer)
    }

    /// Publishes externally loaded OHLCV bars as a cached series.
    pub fn register_asset(
        &self,
        name: &str,
        bars: Vec<Bar<Ohlcv>>,
    ) -> Result<AssetSeries, SeriesError> {
        self.register(name, bars)
    }

    /// Publishes externally supplied scalar bars as a cached series.
    pub fn register_float(&self, name: &str, bars: Vec<Bar<f64>>) -> Result<FloatSeries, SeriesError> {
        self.register(name, bars)
    }

    fn register<T: SeriesValue>(
        &self,
        name: &str,
        bars: Vec<Bar<T>>,
    ) -> Result<TimeSeries<T>, SeriesError> {
        validate_source_name(name)?;
        if let Some(date) = first_unordered(&bars) {
            return Err(SeriesError::UnorderedDates {
                name: name.to_string(),
                date,
            });
        }

        tracing::debug!(series = %name, bars = bars.len(), "registering source series");
        let mut constructed = false;
        let series = self.cache.object(name, || {
            constructed = true;
            let data = self.cache.ready_data(name, bars)?;
            Ok(TimeSeries::from_parts(name, data))
        })?;
        if !constructed {
            return Err(SeriesError::InvalidName {
                name: name.to_string(),
                reason: "already registered".to_string(),
            });
        }
        Ok(series)
    }

    /// Computes all `series` in parallel on the run's worker pool.
    ///
    /// Shared dependencies are computed once; a worker that needs a series
    /// another worker is computing waits for it. Fails if any of them fails;
    /// with several failures, which one is returned is unspecified.
    pub fn materialize<T: SeriesValue>(&self, series: &[TimeSeries<T>]) -> Result<(), SeriesError> {
        let work = || {
            series
                .par_iter()
                .map(|s| s.data().map(|_| ()))
                .collect::<Result<Vec<()>, SeriesError>>()
        };

        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }?;
        Ok(())
    }
}

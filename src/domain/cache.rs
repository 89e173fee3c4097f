//! Run-scoped memoization cache.
//!
//! Two maps keyed by canonical name:
//!
//! - the data cache holds one [`Deferred`] per computation: the bars, or the
//!   failure, produced by running its producer exactly once;
//! - the object cache holds the typed handles returned to callers
//!   ([`TimeSeries`](crate::domain::series::TimeSeries), band bundles, ...).
//!
//! Handles are thin wrappers around a data entry, so an object entry can be
//! rebuilt from an existing data entry without recomputing anything, and two
//! handles with different names may point at the same data entry.
//!
//! Both maps are read-locked for lookups and write-locked only for
//! insert-if-absent. Producers never run while a map lock is held.

use crate::domain::bar::Bar;
use crate::domain::error::SeriesError;
use crate::domain::series::SeriesValue;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub type Computed<T> = Result<Arc<Vec<Bar<T>>>, SeriesError>;

type Producer<T> = Box<dyn FnOnce() -> Result<Vec<Bar<T>>, SeriesError> + Send>;

type AnyEntry = Arc<dyn Any + Send + Sync>;

/// A single-flight lazy computation of a bar sequence.
///
/// The first caller of [`get`](Deferred::get) runs the producer on its own
/// thread; concurrent callers park until it finishes and then observe the
/// same result. Failures are stored like successes and never re-run.
pub struct Deferred<T> {
    name: String,
    producer: Mutex<Option<Producer<T>>>,
    cell: OnceCell<Computed<T>>,
}

impl<T: SeriesValue> Deferred<T> {
    pub(crate) fn new<F>(name: &str, producer: F) -> Self
    where
        F: FnOnce() -> Result<Vec<Bar<T>>, SeriesError> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            producer: Mutex::new(Some(Box::new(producer))),
            cell: OnceCell::new(),
        }
    }

    /// An already materialized entry.
    pub(crate) fn ready(name: &str, bars: Vec<Bar<T>>) -> Self {
        Self {
            name: name.to_string(),
            producer: Mutex::new(None),
            cell: OnceCell::with_value(Ok(Arc::new(bars))),
        }
    }

    pub fn get(&self) -> Computed<T> {
        self.cell.get_or_init(|| self.run()).clone()
    }

    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    fn run(&self) -> Computed<T> {
        // Only reachable once per cell unless a previous producer panicked.
        let Some(producer) = self.producer.lock().take() else {
            return Err(SeriesError::Abandoned {
                name: self.name.clone(),
            });
        };

        let started = Instant::now();
        tracing::debug!(series = %self.name, "computing");
        match producer() {
            Ok(bars) => {
                tracing::debug!(
                    series = %self.name,
                    bars = bars.len(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "computed"
                );
                Ok(Arc::new(bars))
            }
            Err(e) => {
                tracing::warn!(series = %self.name, error = %e, "computation failed");
                Err(e)
            }
        }
    }
}

/// Counters describing cache effectiveness for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub data_entries: usize,
    pub object_entries: usize,
}

#[derive(Default)]
pub struct SeriesCache {
    data: RwLock<HashMap<String, AnyEntry>>,
    objects: RwLock<HashMap<String, AnyEntry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data entry for `key`, created from `producer` if absent.
    ///
    /// The producer is stored, not run; it runs on first [`Deferred::get`].
    pub fn data<T, F>(&self, key: &str, producer: F) -> Result<Arc<Deferred<T>>, SeriesError>
    where
        T: SeriesValue,
        F: FnOnce() -> Result<Vec<Bar<T>>, SeriesError> + Send + 'static,
    {
        insert_if_absent(&self.data, key, || Deferred::new(key, producer))
    }

    /// Data entry for `key`, seeded with bars that are already known.
    pub fn ready_data<T: SeriesValue>(
        &self,
        key: &str,
        bars: Vec<Bar<T>>,
    ) -> Result<Arc<Deferred<T>>, SeriesError> {
        insert_if_absent(&self.data, key, || Deferred::ready(key, bars))
    }

    /// Object entry for `name`, constructed by `producer` on first request.
    ///
    /// Concurrent first requests wait for one construction. A failed
    /// construction is returned to its caller and not stored.
    pub fn object<W, F>(&self, name: &str, producer: F) -> Result<W, SeriesError>
    where
        W: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<W, SeriesError>,
    {
        let cell: Arc<OnceCell<W>> = insert_if_absent(&self.objects, name, OnceCell::new)?;

        let mut constructed = false;
        let object = cell.get_or_try_init(|| {
            constructed = true;
            producer()
        })?;

        if constructed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(series = %name, "cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(series = %name, "cache hit");
        }
        Ok(object.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.read().contains_key(name)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            data_entries: self.data.read().len(),
            object_entries: self.objects.read().len(),
        }
    }
}

fn insert_if_absent<E, F>(
    map: &RwLock<HashMap<String, AnyEntry>>,
    key: &str,
    make: F,
) -> Result<Arc<E>, SeriesError>
where
    E: Any + Send + Sync,
    F: FnOnce() -> E,
{
    if let Some(existing) = map.read().get(key) {
        return downcast(Arc::clone(existing), key);
    }

    let mut guard = map.write();
    match guard.entry(key.to_string()) {
        Entry::Occupied(occupied) => downcast(Arc::clone(occupied.get()), key),
        Entry::Vacant(vacant) => {
            let entry = Arc::new(make());
            vacant.insert(Arc::clone(&entry) as AnyEntry);
            Ok(entry)
        }
    }
}

fn downcast<E: Any + Send + Sync>(entry: AnyEntry, key: &str) -> Result<Arc<E>, SeriesError> {
    entry.downcast::<E>().map_err(|_| SeriesError::TypeMismatch {
        name: key.to_string(),
    })
}

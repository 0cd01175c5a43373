//! Schema loading: cache lookup, in-flight de-duplication, staleness.
//!
//! Invariants:
//! - `fetch_count` grows by exactly one per fetch started; hits and requests
//!   that join an in-flight fetch do not count.
//! - At most one fetch per params key is in flight. Concurrent loads of that
//!   key await the same result.
//! - Each `load` records its params as the latest request. A fetch finishing
//!   after a different key was requested is discarded, not cached, and its
//!   waiters get [`LoadError::Superseded`].
//! - A failed fetch leaves the cache as it was.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::error::{LoadError, LoadResult};
use crate::schema::{FormSchema, ShapeParams};

pub mod cache;

pub use cache::{CachedSchema, SchemaCache};

/// Default bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves a schema from wherever schemas live.
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch(&self, params: &ShapeParams) -> LoadResult<FormSchema>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub fetch_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl LoaderConfig {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

type Flight = Arc<OnceCell<LoadResult<Arc<FormSchema>>>>;

#[derive(Default)]
struct LoaderState {
    cache: SchemaCache,
    in_flight: HashMap<ShapeParams, Flight>,
    latest: Option<ShapeParams>,
}

/// Caching schema loader, shared by a session and anything else that needs
/// the current schema.
pub struct SchemaLoader {
    fetcher: Arc<dyn SchemaFetcher>,
    config: LoaderConfig,
    state: Mutex<LoaderState>,
    fetches: AtomicU64,
}

impl std::fmt::Debug for SchemaLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaLoader")
            .field("config", &self.config)
            .field("fetch_count", &self.fetch_count())
            .finish_non_exhaustive()
    }
}

impl SchemaLoader {
    pub fn new(fetcher: Arc<dyn SchemaFetcher>) -> Self {
        Self::with_config(fetcher, LoaderConfig::default())
    }

    pub fn with_config(fetcher: Arc<dyn SchemaFetcher>, config: LoaderConfig) -> Self {
        Self {
            fetcher,
            config,
            state: Mutex::new(LoaderState::default()),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Return the schema for `params`, fetching only on a cache miss.
    pub async fn load(&self, params: ShapeParams) -> LoadResult<Arc<FormSchema>> {
        let flight = {
            let mut state = self.state.lock().await;
            state.latest = Some(params);

            if let Some(schema) = state.cache.get(&params) {
                debug!(%params, "schema cache hit");
                return Ok(schema);
            }

            match state.in_flight.get(&params) {
                Some(flight) => {
                    debug!(%params, "joining in-flight schema fetch");
                    Arc::clone(flight)
                }
                None => {
                    let flight: Flight = Arc::new(OnceCell::new());
                    state.in_flight.insert(params, Arc::clone(&flight));
                    flight
                }
            }
        };

        let result = flight
            .get_or_init(|| self.fetch_uncached(params))
            .await
            .clone();

        let mut state = self.state.lock().await;
        if state
            .in_flight
            .get(&params)
            .is_some_and(|f| Arc::ptr_eq(f, &flight))
        {
            state.in_flight.remove(&params);
        }

        let schema = result?;
        if state.latest != Some(params) {
            warn!(
                %params,
                latest = ?state.latest,
                "discarding schema response for superseded request"
            );
            return Err(LoadError::Superseded { params });
        }

        if state.cache.requires_fetch(&params) {
            state.cache.put(params, Arc::clone(&schema));
        }
        Ok(schema)
    }

    /// Schema cached under `params`, without fetching.
    pub async fn cached(&self, params: &ShapeParams) -> Option<Arc<FormSchema>> {
        self.state.lock().await.cache.get(params)
    }

    /// Params of the most recent `load` call.
    pub async fn latest_request(&self) -> Option<ShapeParams> {
        self.state.lock().await.latest
    }

    /// Drop every cached schema; the next load of any shape fetches.
    pub async fn invalidate(&self) {
        debug!("schema cache invalidated");
        self.state.lock().await.cache.invalidate();
    }

    async fn fetch_uncached(&self, params: ShapeParams) -> LoadResult<Arc<FormSchema>> {
        let count = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(%params, fetch_count = count, "fetching schema");

        let timeout = self.config.fetch_timeout;
        let fetched = tokio::time::timeout(timeout, self.fetcher.fetch(&params))
            .await
            .map_err(|_| LoadError::Timeout { after: timeout })?;

        let schema = match fetched {
            Ok(schema) => schema,
            Err(e) => {
                warn!(%params, error = %e, "schema fetch failed");
                return Err(e);
            }
        };
        schema.check()?;

        debug!(
            %params,
            sections = schema.section_count(),
            fields = schema.field_count(),
            "schema fetched"
        );
        Ok(Arc::new(schema.with_shape(params)))
    }
}

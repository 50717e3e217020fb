use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{self, HttpClient};
use crate::error::CatalogError;
use crate::models::Catalog;

type CatalogFetch = Shared<BoxFuture<'static, Result<Arc<Catalog>, CatalogError>>>;

enum CacheState {
    Empty,
    /// A fetch is in flight; late callers await the same future.
    Loading(CatalogFetch),
    Ready(Arc<Catalog>),
}

/// Lazily fetched template catalog, shared by every command.
pub struct CatalogCache {
    http: Arc<dyn HttpClient>,
    catalog_url: String,
    state: Mutex<CacheState>,
}

impl CatalogCache {
    pub fn new(http: Arc<dyn HttpClient>, catalog_url: impl Into<String>) -> Self {
        Self {
            http,
            catalog_url: catalog_url.into(),
            state: Mutex::new(CacheState::Empty),
        }
    }

    /// Returns the cached catalog, fetching it first if nothing is cached.
    /// Concurrent callers on a cold cache share one fetch.
    pub async fn available_memes(&self) -> Result<Arc<Catalog>, CatalogError> {
        let fetch = {
            let mut state = self.state.lock();
            let fetch = match &*state {
                CacheState::Ready(catalog) => return Ok(Arc::clone(catalog)),
                CacheState::Loading(fetch) => fetch.clone(),
                CacheState::Empty => self.start_fetch(),
            };
            if matches!(*state, CacheState::Empty) {
                *state = CacheState::Loading(fetch.clone());
            }
            fetch
        };

        let result = fetch.clone().await;

        let mut state = self.state.lock();
        if let CacheState::Loading(current) = &*state
            && current.ptr_eq(&fetch)
        {
            *state = match &result {
                Ok(catalog) => CacheState::Ready(Arc::clone(catalog)),
                Err(_) => CacheState::Empty,
            };
        }
        result
    }

    /// Fetches a fresh catalog and swaps it in. Readers keep the previous
    /// catalog until the swap; a failed refresh leaves it untouched.
    pub async fn refresh(&self) -> Result<Arc<Catalog>, CatalogError> {
        let catalog = Arc::new(api::fetch_catalog(self.http.as_ref(), &self.catalog_url).await?);
        *self.state.lock() = CacheState::Ready(Arc::clone(&catalog));
        info!(templates = catalog.len(), "Template catalog refreshed");
        Ok(catalog)
    }

    /// The catalog if one is loaded, without fetching.
    pub fn cached(&self) -> Option<Arc<Catalog>> {
        match &*self.state.lock() {
            CacheState::Ready(catalog) => Some(Arc::clone(catalog)),
            CacheState::Empty | CacheState::Loading(_) => None,
        }
    }

    /// Spawns a task that refreshes the catalog every `period`.
    pub fn spawn_periodic_refresh(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = cache.refresh().await {
                    warn!("Periodic catalog refresh failed: {e}");
                }
            }
        })
    }

    fn start_fetch(&self) -> CatalogFetch {
        let http = Arc::clone(&self.http);
        let url = self.catalog_url.clone();
        async move {
            info!(%url, "Fetching template catalog");
            match api::fetch_catalog(http.as_ref(), &url).await {
                Ok(catalog) => {
                    info!(templates = catalog.len(), "Template catalog loaded");
                    Ok(Arc::new(catalog))
                }
                Err(e) => {
                    warn!("Template catalog fetch failed: {e}");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}

//! Application state shared across request handlers.
//!
//! The store handle is a synchronous [`Database`] behind a mutex; handlers
//! hold the lock only across store calls, never across an await point.

use std::sync::{Arc, Mutex, MutexGuard};

use marquee_store::Database;
use marquee_tmdb::MetadataProvider;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::RateLimiter;

/// Shared handle to the SQLite store.
pub type Db = Arc<Mutex<Database>>;

/// Central application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub provider: Arc<dyn MetadataProvider>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

/// Acquire the store lock, mapping poisoning to an internal error instead
/// of panicking in a handler.
pub fn lock_db(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>, ServerError> {
    db.lock()
        .map_err(|e| ServerError::Internal(format!("store lock poisoned: {e}")))
}

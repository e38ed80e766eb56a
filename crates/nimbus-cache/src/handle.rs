//! Lazy, once-only cache handle.
//!
//! The first caller of [`CacheHandle::get`] asks the factory to connect and
//! open the configured region. Concurrent first callers wait for that single
//! attempt. A failed attempt is not remembered: the next call starts over.

use crate::region::{CacheFactory, CacheRegion};
use nimbus_core::{CacheError, CacheResult};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;

/// Lifecycle of a [`CacheHandle`].
///
/// `Uninitialized -> Initializing -> Ready`. A failed or cancelled attempt
/// goes back to `Uninitialized`. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Uninitialized,
    Initializing,
    Ready,
}

impl HandleState {
    fn from_u8(value: u8) -> Self {
        match value {
            INITIALIZING => Self::Initializing,
            READY => Self::Ready,
            _ => Self::Uninitialized,
        }
    }
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Resets the state unless the attempt completed.
struct AttemptGuard<'a> {
    state: &'a AtomicU8,
    completed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.state.store(UNINITIALIZED, Ordering::Release);
        }
    }
}

/// Owns the single open region of a provider.
pub struct CacheHandle {
    factory: Arc<dyn CacheFactory>,
    region: String,
    cell: OnceCell<Arc<dyn CacheRegion>>,
    state: AtomicU8,
}

impl CacheHandle {
    /// Create an unopened handle for `region`.
    pub fn new(factory: Arc<dyn CacheFactory>, region: impl Into<String>) -> Self {
        Self {
            factory,
            region: region.into(),
            cell: OnceCell::new(),
            state: AtomicU8::new(UNINITIALIZED),
        }
    }

    /// Returns the open region, connecting on first use.
    ///
    /// # Errors
    ///
    /// `CacheUnavailable` if the factory cannot produce the region. Nothing is
    /// memoized in that case.
    pub async fn get(&self) -> CacheResult<&Arc<dyn CacheRegion>> {
        if let Some(region) = self.cell.get() {
            return Ok(region);
        }

        self.cell.get_or_try_init(|| self.open()).await
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn open(&self) -> CacheResult<Arc<dyn CacheRegion>> {
        self.state.store(INITIALIZING, Ordering::Release);
        let mut guard = AttemptGuard {
            state: &self.state,
            completed: false,
        };

        info!("Opening cache region");

        match self.factory.get_cache(&self.region).await {
            Ok(region) => {
                guard.completed = true;
                self.state.store(READY, Ordering::Release);
                info!("Cache region ready");
                Ok(region)
            }
            Err(err) => {
                warn!(error = %err, "Failed to open cache region");
                Err(match err {
                    CacheError::CacheUnavailable(_) => err,
                    other => CacheError::unavailable(format!(
                        "Failed to open cache region '{}': {}",
                        self.region, other
                    )),
                })
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HandleState {
        HandleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Name of the region this handle opens.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether the region has been opened.
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}

impl fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("region", &self.region)
            .field("state", &self.state())
            .finish()
    }
}

//! Strictly positive time-to-live.

use nimbus_core::{CacheError, CacheResult};
use std::fmt;
use std::time::Duration;

/// Time after which an added entry becomes unreadable.
///
/// A `Ttl` is never zero and never longer than [`Ttl::MAX`]. Anything that
/// converts into one with [`TryInto`] can be passed where a TTL is expected:
/// `std::time::Duration` (zero is rejected) and `chrono::Duration` (zero and
/// negative are rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(Duration);

impl Ttl {
    /// Longest accepted TTL: 100 years.
    ///
    /// Redis rejects a `PX` whose absolute expiry overflows a signed 64-bit
    /// millisecond timestamp.
    pub const MAX: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

    /// Creates a TTL, rejecting zero and anything above [`Ttl::MAX`].
    pub fn new(duration: Duration) -> CacheResult<Self> {
        if duration.is_zero() {
            return Err(CacheError::invalid_argument("TTL must be positive"));
        }
        if duration > Self::MAX {
            return Err(CacheError::invalid_argument(format!(
                "TTL must not exceed {:?}, got {:?}",
                Self::MAX,
                duration
            )));
        }
        Ok(Self(duration))
    }

    /// Creates a TTL of whole seconds.
    pub fn from_secs(secs: u64) -> CacheResult<Self> {
        Self::new(Duration::from_secs(secs))
    }

    /// Returns the TTL as a Duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Milliseconds, rounded up so sub-millisecond TTLs stay positive.
    #[must_use]
    pub fn as_millis_ceil(self) -> u64 {
        let millis = self.0.as_millis() + u128::from(self.0.subsec_nanos() % 1_000_000 != 0);
        u64::try_from(millis).unwrap_or(u64::MAX)
    }
}

impl TryFrom<Duration> for Ttl {
    type Error = CacheError;

    fn try_from(duration: Duration) -> Result<Self, Self::Error> {
        Self::new(duration)
    }
}

impl TryFrom<chrono::Duration> for Ttl {
    type Error = CacheError;

    fn try_from(duration: chrono::Duration) -> Result<Self, Self::Error> {
        let std = duration.to_std().map_err(|_| {
            CacheError::invalid_argument(format!("TTL must be positive, got {}", duration))
        })?;
        Self::new(std)
    }
}

impl From<Ttl> for Duration {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

//! # Nimbus Core
//!
//! Core types and error definitions shared by the Nimbus cache crates.
//! Everything that talks to a cache backend returns [`CacheResult`], and
//! every failure is one of the [`CacheError`] variants.

pub mod error;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use result::*;
pub use telemetry::{init_tracing, LogFormat, LoggingConfig};

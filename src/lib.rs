//! # Error Model
//!
//! A small, closed error taxonomy with context wrapping, chain inspection,
//! sentinel identity checks and accumulation of independent failures.
//!
//! ## Pieces
//!
//! 1. **Variants** - `ValidationError`, `DatabaseError`, `ApiError`,
//!    `WrappedError`, `PlainError`, all behind one shared [`Error`] handle
//! 2. **Wrapping** - [`wrap`] and [`ResultExt`] add context around a cause
//! 3. **Chain walking** - [`Error::is`] (identity) and [`Error::find`] (variant)
//! 4. **Accumulation** - [`ErrorAccumulator`] for checks that should all run
//! 5. **Sentinels** - [`sentinel`] holds process-wide values for `is` checks
//!
//! ## Example
//!
//! ```
//! use error_model::{sentinel, wrap, ApiError, Error};
//!
//! let err = wrap("loading user 7", Error::database("SELECT", "users", sentinel::NOT_FOUND.clone()));
//! assert!(err.is(&sentinel::NOT_FOUND));
//! assert!(err.message().ends_with("not found"));
//!
//! let remote = wrap("syncing", ApiError::new(503, "unavailable").into());
//! assert_eq!(remote.find::<ApiError>().map(ApiError::code), Some(503));
//! ```
//!
//! ## Running the tour
//!
//! ```bash
//! cargo run --bin error_tour
//! RUST_LOG=debug cargo run --bin error_tour -- settings.toml
//! ```

pub mod accumulator;
pub mod business;
pub mod chain;
pub mod config;
pub mod error;
pub mod sentinel;
pub mod wrap;

pub use accumulator::ErrorAccumulator;
pub use chain::{Chain, Variant, WalkLimits};
pub use config::{ConfigError, Settings, ValidationRules};
pub use error::{
    ApiError, DatabaseError, DetailValue, Error, ErrorKind, PlainError, Result, ValidationError,
    WrappedError,
};
pub use wrap::{wrap, ResultExt};

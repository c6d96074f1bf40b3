//! Adding context to a failure without losing it.

use crate::error::{Error, WrappedError};

/// Build a `WrappedError` that owns `cause`.
///
/// The message reads `"{context}: {cause}"`, so the innermost text survives
/// any number of layers.
pub fn wrap(context: impl Into<String>, cause: Error) -> Error {
    WrappedError::new(context, cause).into()
}

impl Error {
    /// Method form of [`wrap`], for chaining.
    pub fn wrap(self, context: impl Into<String>) -> Error {
        wrap(context, self)
    }
}

/// Extension trait for adding context to any `Result` whose error converts
/// into [`Error`].
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, Error>;

    /// Like `context`, but the closure only runs on the error path.
    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, Error> {
        self.map_err(|e| wrap(context, e.into()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(f(), e.into()))
    }
}

//! Error conversion helpers for storage operations
//!
//! Provides extension traits for cleaner error handling with context.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// storage.save(&snapshot)
    ///     .with_context(|| format!("persist snapshot to {}", storage.describe()))?;
    /// ```
    fn with_context<F>(self, context: F) -> ApplicationResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_context<F>(self, context: F) -> ApplicationResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: context(),
            source: Box::new(e),
        })
    }
}

#![forbid(unsafe_code)]

//! Optional logging layer applied around core calls. The core crates never log.

use std::fmt;

use contacts_session::{SaveError, TableError};
use contacts_storage::StorageError;
use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

/// Errors the logging layer knows how to grade.
pub trait LoggedError: fmt::Display {
    fn is_fatal(&self) -> bool;
}

impl LoggedError for StorageError {
    fn is_fatal(&self) -> bool {
        StorageError::is_fatal(self)
    }
}

impl LoggedError for SaveError {
    fn is_fatal(&self) -> bool {
        SaveError::is_fatal(self)
    }
}

impl LoggedError for TableError {
    fn is_fatal(&self) -> bool {
        false
    }
}

/// Runs `call` and records its outcome: `debug` on success, `warn` on a returned
/// error, `error` on a fatal storage fault. The result passes through unchanged.
pub fn logged<T, E: LoggedError>(
    operation: &'static str,
    call: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let result = call();
    match &result {
        Ok(_) => tracing::debug!(operation = operation, "contacts operation ok"),
        Err(err) if err.is_fatal() => {
            tracing::error!(operation = operation, error = %err, "contacts storage fault")
        }
        Err(err) => tracing::warn!(operation = operation, error = %err, "contacts operation rejected"),
    }
    result
}

/// Installs the stderr subscriber. Falls back to the default directive when `directive`
/// does not parse; a second call is ignored.
pub fn init_tracing(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

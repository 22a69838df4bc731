//! Error types for the push core

use thiserror::Error;

use crate::connection::ClientKey;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can escape the push core.
///
/// Delivery failures never appear here: they are absorbed inside the
/// delivery engine and resolve to removal of the failed connection.
#[derive(Error, Debug)]
pub enum Error {
    /// The welcome event could not be queued while accepting a connection.
    /// Nothing remains registered for the key.
    #[error("failed to accept connection from {0}")]
    Accept(ClientKey),
}

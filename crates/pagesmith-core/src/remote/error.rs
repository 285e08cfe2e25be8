//! Error taxonomy for remote Git-hosting operations.

use thiserror::Error;

/// Errors produced by a [`RemoteClient`](crate::remote::RemoteClient)
/// implementation.
///
/// Only errors that prevented a usable response are surfaced here; HTTP
/// statuses that a caller classifies itself (repository checks, ref
/// creation) travel back as plain status codes on the `Ok` path.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The API answered with a status the operation cannot use.
    #[error("remote API returned status {code}")]
    Status { code: u16 },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The caller aborted the in-flight request. Every consumer treats
    /// this as a benign no-op and never logs it as an error.
    #[error("request cancelled by caller")]
    Cancelled,

    /// The response payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { code } => Some(*code),
            _ => None,
        }
    }

    /// `true` when the error is a caller-triggered request abort.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RemoteError::Cancelled)
    }
}

/// Convenience result alias.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

//! Unified error type.

use std::fmt;

/// The error type returned by onion's fallible operations.
///
/// Application-level outcomes (404, redirects, bad requests) are expressed as
/// HTTP [`Response`](crate::Response) values, not as `Error`s. This type only
/// surfaces infrastructure failures: binding the listener or reading its
/// local address.
#[derive(Debug)]
pub enum Error {
    /// The listener could not be bound to the configured address.
    Bind { addr: String, source: std::io::Error },
    /// Any other I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "bind {addr}: {source}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

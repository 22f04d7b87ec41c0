use std::io;

use crate::config::ConfigError;
use crate::crypto::{CryptoError, NonceError};

/// Unified error covering I/O, crypto, nonce, configuration and worker failures.
/// - `From<T>` impls enable `?` across the adapters.
/// - Messages aim to be stable and contextual for logs.
#[derive(Debug)]
pub enum Error {
    /// I/O error from a source or sink.
    Io(io::Error),

    /// Engine error (key/nonce validation, state machine, capacity, authentication).
    Crypto(CryptoError),

    /// Nonce derivation or sequencing policy failure.
    Nonce(NonceError),

    /// Invalid configuration.
    Config(ConfigError),

    /// Worker pool failure (channel closed, worker panicked).
    Pipeline(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Crypto(e) => write!(f, "crypto error: {}", e),
            Error::Nonce(e) => write!(f, "nonce error: {}", e),
            Error::Config(e) => write!(f, "config error: {}", e),
            Error::Pipeline(msg) => write!(f, "pipeline error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Crypto(e) => Some(e),
            Error::Nonce(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Pipeline(_) => None,
        }
    }
}

impl Error {
    /// The engine error behind this one, if any.
    pub fn as_crypto(&self) -> Option<&CryptoError> {
        match self {
            Error::Crypto(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        self.as_crypto().is_some_and(CryptoError::is_authentication)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Self {
        Error::Crypto(e)
    }
}

impl From<NonceError> for Error {
    fn from(e: NonceError) -> Self {
        Error::Nonce(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

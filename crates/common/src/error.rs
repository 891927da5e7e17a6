//! Common error types for hostcheck components.

use std::fmt;

/// A specialized Result type for hostcheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for hostcheck operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Probe error: {0}")]
    Probe(String),
}

impl Error {
    /// Create a new probe error.
    pub fn probe(msg: impl fmt::Display) -> Self {
        Error::Probe(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_constructor_formats_message() {
        let err = Error::probe("client build failed");
        assert!(matches!(err, Error::Probe(_)));
        assert_eq!(err.to_string(), "Probe error: client build failed");
    }
}

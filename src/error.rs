//! Process-level errors for the relay binary and its configuration

use thiserror::Error;

/// Errors that can stop the relay process.
///
/// Nothing here is ever produced by message handling: rejected chat input is
/// dropped silently inside the hub.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install shutdown handler: {0}")]
    Shutdown(#[from] ctrlc::Error),
}

/// Result type for relay setup operations
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = RelayError::Config("CHAT_RELAY_PORT must be a port number".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: CHAT_RELAY_PORT must be a port number"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err: RelayError = io.into();
        assert!(matches!(err, RelayError::Io(_)));
        assert!(err.to_string().contains("address in use"));
    }
}

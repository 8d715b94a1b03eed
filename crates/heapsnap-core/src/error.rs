use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid pointer size: {0} (expected 4 or 8)")]
    InvalidPointerSize(u32),

    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Malformed array at address {address:#x}: {message}")]
    MalformedArray { address: u64, message: String },

    #[error("Invalid capture: {0}")]
    InvalidCapture(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Snapshot build cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    pub(crate) fn read_failed(address: u64, message: impl Into<String>) -> Self {
        Error::MemoryReadFailed {
            address,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_memory_read_failed_message() {
        let err = Error::read_failed(0x1000, "no section");
        assert_eq!(
            err.to_string(),
            "Failed to read memory at address 0x1000: no section"
        );
    }
}

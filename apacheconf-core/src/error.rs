//! Error types for apacheconf

use thiserror::Error;

/// Result type for apacheconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apacheconf
#[derive(Error, Debug)]
pub enum Error {
    /// A node was built without the linkage it needs
    #[error("Invalid construction: {0}")]
    InvalidConstruction(String),

    /// An explicit insertion position past the end of the children
    #[error("Position {position} is out of range for {len} children")]
    IndexOutOfRange { position: usize, len: usize },

    /// The node handed to `delete_child` is not a direct child
    #[error("Node not found among the direct children of this block")]
    NotFound,

    /// Mutation of a node that has no name (the document root)
    #[error("Cannot modify a node without a name")]
    EmptyName,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::IndexOutOfRange { position: 4, len: 2 };
        assert_eq!(err.to_string(), "Position 4 is out of range for 2 children");
        assert_eq!(Error::EmptyName.to_string(), "Cannot modify a node without a name");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

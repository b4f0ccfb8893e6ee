//! Storage error types

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A record already exists under this id
    ///
    /// Ids are 128 random bits, so this only happens on a collision or a
    /// replayed insert. The relay retries with a fresh id.
    #[error("record already exists: {id}")]
    Conflict {
        /// Colliding id (hex)
        id: String,
    },

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, lock poisoning)
    #[error("I/O error: {0}")]
    Io(String),
}

impl StorageError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_is_transient() {
        assert!(StorageError::Io("disk full".to_string()).is_transient());
        assert!(!StorageError::Serialization("bad cbor".to_string()).is_transient());
        assert!(!StorageError::Conflict { id: "00".to_string() }.is_transient());
    }

    #[test]
    fn error_display() {
        let err = StorageError::Conflict { id: "ab".repeat(16) };
        assert_eq!(err.to_string(), format!("record already exists: {}", "ab".repeat(16)));
    }
}

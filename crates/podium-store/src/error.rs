//! Error types for the storage layer.

/// Errors a [`Storage`](crate::Storage) backend can report.
///
/// These never escape the token and metadata stores. They are logged
/// and swallowed there.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),

    /// The backend cannot be used at all right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

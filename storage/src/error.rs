use thiserror::Error;

/// Errors that can occur when picking folders or writing documents.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The user cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The requested file name cannot be used.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// The document or its output stream could not be created.
    #[error("could not create document: {0}")]
    CreateFailed(String),

    /// An error occurred in the underlying platform implementation.
    #[error("Platform error: {0}")]
    Platform(String),

    /// An IO error occurred while writing the payload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation is not supported on this platform.
    #[error("Not supported: {0}")]
    NotSupported(String),
}

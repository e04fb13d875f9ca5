//! Error types for the storefront library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the storefront library.
#[derive(Error, Debug)]
pub enum Error {
    /// Blob store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A blob could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing required field or otherwise rejected input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Entity lookup failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation needs a logged-in user
    #[error("Not logged in")]
    Unauthorized,

    /// Operation needs the administrator
    #[error("Administrator access required")]
    Forbidden,

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        Error::Validation(format!("{field} is required"))
    }
}

/// Blob store errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// Backend rejected or failed the operation
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Credential and account errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// The built-in administrator cannot be edited through the app
    #[error("The built-in administrator account cannot be modified")]
    ProtectedAccount,
}

/// Image upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No image provided")]
    NoImage,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

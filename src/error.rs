//! Error types for credential lifecycle operations.

use thiserror::Error;

/// Result type alias using [`LocauthError`].
pub type Result<T> = std::result::Result<T, LocauthError>;

/// Errors that can occur while acquiring, caching or using credentials.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum LocauthError {
    /// Persisted provider configuration or credential cache is missing or incomplete.
    #[error("no credentials found")]
    NoCredentialsFound,

    /// Credentials were requested before any were resolved.
    #[error("credentials unavailable: none have been resolved yet")]
    CredentialsUnavailable,

    /// The identity pool did not yield an identity.
    #[error("identity resolution failed: {0}")]
    IdentityResolutionFailed(String),

    /// The identity exchange failed or returned incomplete data.
    ///
    /// The underlying cause is deliberately not carried.
    #[error("credentials generation failed")]
    CredentialGenerationFailed,

    /// Operation does not apply to the active credential mode.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The credential cache has no backing store.
    #[error("credential cache not initialized")]
    NotInitialized,

    /// Region name is not in the region table.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Identity pool identifier failed validation.
    #[error("invalid identity pool id: {0}")]
    InvalidIdentityPoolId(String),

    /// Secure store operation failed with context.
    #[error("{store}: {operation} {key}: {source}")]
    StoreOperation {
        /// Store name
        store: String,
        /// Operation name (put, get, remove, clear)
        operation: String,
        /// Key involved, empty for whole-store operations
        key: String,
        /// Underlying error
        #[source]
        source: Box<LocauthError>,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LocauthError {
    /// Creates a store operation error with context.
    ///
    /// # Example
    ///
    /// ```
    /// use locauth::LocauthError;
    ///
    /// let wrapped = LocauthError::store_op(
    ///     "file",
    ///     "put",
    ///     "accessKeyId",
    ///     LocauthError::NotInitialized,
    /// );
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "file: put accessKeyId: credential cache not initialized"
    /// );
    /// ```
    pub fn store_op(
        store: impl Into<String>,
        operation: impl Into<String>,
        key: impl Into<String>,
        err: LocauthError,
    ) -> Self {
        Self::StoreOperation {
            store: store.into(),
            operation: operation.into(),
            key: key.into(),
            source: Box::new(err),
        }
    }
}

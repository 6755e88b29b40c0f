use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to decode stored document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("track {0} not found")]
    TrackNotFound(String),

    #[error("album {0} not found")]
    AlbumNotFound(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("username '{0}' already exists")]
    UsernameTaken(String),

    #[error("invalid document id '{0}'")]
    InvalidId(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StorageError {
    /// Lookup misses that drive branch selection in callers rather than
    /// failing the whole operation.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TrackNotFound(_) | Self::AlbumNotFound(_) | Self::UserNotFound(_)
        )
    }
}

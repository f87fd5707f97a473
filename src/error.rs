//! Error type shared by the store, identity service and repositories.

use thiserror::Error;

use crate::db::Collection;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Event {0} is full")]
    EventFull(String),

    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: Collection, id: String },

    #[error("Precondition failed for {collection}/{id}: {field} changed")]
    PreconditionFailed {
        collection: Collection,
        id: String,
        field: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    AccountExists(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Corrupt document {collection}/{id}: {source}")]
    Corrupt {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a failure, the only distinction callers act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unavailable,
    PermissionDenied,
    NotFound,
    Invalid,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::PermissionDenied(_) | Error::NotSignedIn | Error::InvalidCredentials => {
                ErrorKind::PermissionDenied
            }
            Error::Invalid(_)
            | Error::EventFull(_)
            | Error::AlreadyExists { .. }
            | Error::PreconditionFailed { .. }
            | Error::Conflict(_)
            | Error::AccountExists(_) => ErrorKind::Invalid,
            Error::Corrupt { .. } | Error::Database(_) | Error::Io(_) => ErrorKind::Unavailable,
        }
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Unavailable => "Something went wrong. Please try again.".to_string(),
            ErrorKind::NotFound => "That item no longer exists.".to_string(),
            ErrorKind::PermissionDenied | ErrorKind::Invalid => self.to_string(),
        }
    }

    pub(crate) fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Error::NotFound {
            collection,
            id: id.into(),
        }
    }
}

//! Identity store errors

use thiserror::Error;

use super::AccountId;
use crate::substrate::SubstrateError;

/// Failure of an identity store operation.
///
/// The messages are for logs; callers that show text to users should match
/// on [`IdentityError::kind`] and word it themselves.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Signup, or an email change, collided with another account
    #[error("Email already registered")]
    DuplicateEmail,

    /// No account matches the email/password pair. Deliberately does not say
    /// which half was wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A session-only operation was called while logged out
    #[error("No active session")]
    NoActiveSession,

    /// The session refers to an account the directory no longer contains
    #[error("Session account {id} is not in the directory")]
    OrphanedSession { id: AccountId },

    /// The substrate refused a read or write
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] SubstrateError),

    /// The stored directory value is not a valid account list
    #[error("Stored account directory is corrupted: {0}")]
    CorruptedDirectory(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The directory already holds the largest representable id
    #[error("No account id left above {max}")]
    IdsExhausted { max: AccountId },
}

/// Message-agnostic discriminant of [`IdentityError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DuplicateEmail,
    InvalidCredentials,
    NoActiveSession,
    OrphanedSession,
    PersistenceFailure,
    CorruptedPersistedState,
    Serialization,
    IdsExhausted,
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::DuplicateEmail => ErrorKind::DuplicateEmail,
            IdentityError::InvalidCredentials => ErrorKind::InvalidCredentials,
            IdentityError::NoActiveSession => ErrorKind::NoActiveSession,
            IdentityError::OrphanedSession { .. } => ErrorKind::OrphanedSession,
            IdentityError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            IdentityError::CorruptedDirectory(_) => ErrorKind::CorruptedPersistedState,
            IdentityError::Serialization(_) => ErrorKind::Serialization,
            IdentityError::IdsExhausted { .. } => ErrorKind::IdsExhausted,
        }
    }

    /// Whether re-prompting the user can fix this
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DuplicateEmail | ErrorKind::InvalidCredentials
        )
    }
}

/// Result type for identity store operations
pub type IdentityResult<T> = Result<T, IdentityError>;

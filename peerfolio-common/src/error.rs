//! Common error types for PeerFolio
//!
//! Business-rule outcomes (authorization, validation, duplicate and
//! self-review, immutable subject, missing records, store conflicts) are
//! recoverable and carry a user-facing message. Everything else is a fault
//! the caller logs and reports generically.

use thiserror::Error;

/// Common result type for PeerFolio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to users for faults that are not their fault.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Common error types across PeerFolio crates
#[derive(Error, Debug)]
pub enum Error {
    /// No session, wrong role, or not the owner of the record
    #[error("{0}")]
    Unauthorized(String),

    /// Input shape, length or range violation
    #[error("{0}")]
    ValidationFailed(String),

    /// The author already reviewed this person
    #[error("You have already reviewed this person. You can edit your existing review instead.")]
    DuplicateReview {
        /// Existing review, so callers can redirect to the edit flow
        existing_review_id: String,
    },

    /// Author targeted their own LinkedIn profile
    #[error("You cannot write a review about yourself.")]
    SelfReview,

    /// Edit tried to move a review to a different person
    #[error("The LinkedIn profile of an existing review cannot be changed.")]
    ImmutableSubject,

    /// Requested record not found
    #[error("{0}")]
    NotFound(String),

    /// Unique constraint violation surfaced by the store
    #[error("Conflict: {0}")]
    StoreConflict(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for business-rule outcomes whose message may be shown verbatim.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized(_)
                | Error::ValidationFailed(_)
                | Error::DuplicateReview { .. }
                | Error::SelfReview
                | Error::ImmutableSubject
                | Error::NotFound(_)
                | Error::StoreConflict(_)
        )
    }

    /// Message safe to show to an end user.
    pub fn user_message(&self) -> String {
        if self.is_recoverable() {
            self.to_string()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }

    /// Map a unique-constraint violation to `StoreConflict`, leave other errors alone.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        if is_unique_violation(&err) {
            Error::StoreConflict(format!("{} already exists", what))
        } else {
            Error::Database(err)
        }
    }
}

/// True if the sqlx error is a UNIQUE (or PRIMARY KEY) constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

use crate::models::SessionStatus;

/// Failures surfaced by the file store.
///
/// Absence is never an error: lookups return `Option`/empty `Vec`. The
/// variants here are either caller-recoverable rule violations (duplicate
/// email, double review, reverted status) or genuine store faults
/// (`SequenceMissing`, `Io`, `Serde`).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The per-kind id counter is missing from the universe. This means the
    /// backing document is malformed; it is not a user-facing condition.
    #[error("sequence counter {0} not found")]
    SequenceMissing(String),

    #[error("This email already exists")]
    DuplicateEmail(String),

    #[error("Mentor with id: {0} not found")]
    MentorNotFound(u64),

    #[error("Session {0} already reviewed")]
    AlreadyReviewed(u64),

    #[error("session status cannot change from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

//! Error types shared across the store and service layers.

use thiserror::Error;

/// Errors surfaced to the transport layer.
///
/// All variants propagate verbatim; there is no local recovery or retry.
/// Absence in the simple lookups is represented as an empty/absent result,
/// not an error — only the user-scoped ranged query and the class statistics
/// query treat "nothing found" as [`Error::NotFound`].
#[derive(Debug, Error)]
pub enum Error {
    /// A required scoping parameter (tenant, organization, user) was blank.
    #[error("missing required parameter: {0}")]
    IllegalArgument(&'static str),
    /// The caller supplied a malformed value, e.g. an unparsable date bound.
    #[error("{0}")]
    BadRequest(String),
    /// The query matched zero records where that is a caller-visible error.
    #[error("{0}")]
    NotFound(String),
    /// The underlying store failed (unreachable, constraint violation).
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
    /// A stored event payload could not be serialized or deserialized.
    #[error("invalid event payload for event {event_id}: {message}")]
    Payload { event_id: String, message: String },
}

impl Error {
    /// Checks that a scoping parameter is non-blank.
    pub fn require(value: &str, name: &'static str) -> Result<(), Self> {
        if value.trim().is_empty() {
            return Err(Self::IllegalArgument(name));
        }
        Ok(())
    }
}

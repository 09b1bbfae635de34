use crate::StoreError;

/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors the rule repository and offset allocator can surface.
///
/// Absence is never an error: lookups return `Option` and a missing offset
/// reads as zero. Pagination past the last page yields an empty page rather
/// than a range fault.
///
/// Only [`Error::Backend`] is worth retrying, and only by the caller; see
/// [`Error::is_transient`]. The repository itself never retries.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A rule with this key already exists.
    ///
    /// Retrying without changing the key repeats the failure. The stored
    /// record is left untouched.
    #[error("sequence rule key [{key}] already exists")]
    DuplicateKey { key: String },

    /// The rule (or an allocation argument) failed validation before any
    /// backend call was made.
    #[error("invalid sequence rule: {reason}")]
    InvalidRule { reason: String },

    /// The configured backend names are empty or would collide.
    #[error("invalid keyspace: {reason}")]
    InvalidKeyspace { reason: String },

    /// An allocation was requested for a key that has no rule.
    #[error("sequence rule [{key}] not found")]
    RuleNotFound { key: String },

    /// An allocation was requested for a rule whose status is disabled.
    #[error("sequence rule [{key}] is disabled")]
    RuleDisabled { key: String },

    /// Advancing the offset for `key` would overflow `u64`.
    #[error("offset for [{key}] would overflow")]
    OffsetOverflow { key: String },

    /// A stored rule record could not be encoded or decoded.
    #[error("corrupt rule record for [{key}]: {source}")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backing store failed.
    #[error(transparent)]
    Backend(#[from] StoreError),
}

impl Error {
    /// Returns `true` if the caller may reasonably retry the same call.
    ///
    /// Backend unavailability is transient; every other variant will fail the
    /// same way again until the input or stored state changes.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(StoreError::Unavailable { .. }))
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            reason: reason.into(),
        }
    }
}

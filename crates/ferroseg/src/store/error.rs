/// Failures reported by a [`CounterStore`] backend.
///
/// [`CounterStore`]: crate::CounterStore
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The backend could not be reached or refused the operation. Transient
    /// from the caller's point of view.
    #[error("backend unavailable: {context}")]
    Unavailable { context: String },

    /// An increment would push the counter past `u64::MAX`. The counter is
    /// left unchanged.
    #[error("counter [{key}] would overflow")]
    Overflow { key: String },
}

impl StoreError {
    pub fn unavailable(context: impl Into<String>) -> Self {
        Self::Unavailable {
            context: context.into(),
        }
    }
}

use thiserror::Error;

/// Errors surfaced by the engine. Degenerate values that can be corrected
/// locally (missing anchor, non-positive period duration) never end up here;
/// they are defaulted or clamped where they are read.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("month index {0} is out of range (expected 0-11)")]
    InvalidMonth(u32),

    #[error("invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("flow intensity {0} is out of range (expected 1-5)")]
    InvalidFlowIntensity(u8),

    #[error("mood {0} is out of range (expected 1-5)")]
    InvalidMood(u8),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("stored value under '{key}' is malformed: {source}")]
    CorruptRecord {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    /// True for errors caused by caller-supplied input rather than by the
    /// persisted state or the store itself.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidMonth(_)
                | Self::InvalidDate { .. }
                | Self::InvalidFlowIntensity(_)
                | Self::InvalidMood(_)
                | Self::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

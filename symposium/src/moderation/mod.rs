//! Content-safety pre-check for candidate topics.
//!
//! The [`ModerationGate`] runs before any generation. Its outcome is a
//! [`Verdict`]; rejected topics come with [`alternative_suggestions`] or
//! [`themed_suggestions`] and the [`rejection_guidelines`] text.

mod gate;
mod prompt;
mod suggestions;
mod verdict;

pub use gate::{ModerationGate, DEFAULT_MAX_TOPIC_LENGTH};
pub use prompt::moderation_prompt;
pub use suggestions::{
    alternative_suggestions, rejection_guidelines, themed_suggestions, DEFAULT_SUGGESTIONS,
};
pub use verdict::{Classification, RejectionKind, Verdict};

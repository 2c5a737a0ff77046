//! Moderation outcomes.

use serde::Serialize;

/// Why a topic was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Exceeded the maximum topic length; decided locally.
    TooLong,
    /// Refused by the classifier.
    Moderation,
}

/// Result of evaluating a candidate topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    /// The topic may proceed to the pipeline.
    Approved,
    /// The topic must not proceed.
    Rejected {
        /// Explanation suitable for the user.
        reason: String,
        /// Where the rejection came from.
        kind: RejectionKind,
    },
}

impl Verdict {
    /// Returns true if the topic may proceed.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Returns the rejection reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Approved => None,
            Self::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// Interpretation of a raw classifier reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Reply started with `APPROPRIATE`.
    Appropriate,
    /// Reply was `INAPPROPRIATE: <reason>`.
    Inappropriate(String),
    /// Anything else; treated as approved.
    Unclear(String),
}

impl Classification {
    /// Fallback reason when the classifier rejects without one.
    pub const UNSPECIFIED_REASON: &'static str = "no reason given";

    /// Parses a raw reply, ignoring surrounding whitespace.
    #[must_use]
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim();
        if reply.starts_with("APPROPRIATE") {
            return Self::Appropriate;
        }
        match reply.strip_prefix("INAPPROPRIATE:") {
            Some(reason) => {
                let reason = reason.trim();
                if reason.is_empty() {
                    Self::Inappropriate(Self::UNSPECIFIED_REASON.to_string())
                } else {
                    Self::Inappropriate(reason.to_string())
                }
            }
            None => Self::Unclear(reply.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_appropriate() {
        assert_eq!(Classification::parse("APPROPRIATE"), Classification::Appropriate);
        assert_eq!(
            Classification::parse("  APPROPRIATE - a classic question\n"),
            Classification::Appropriate
        );
    }

    #[test]
    fn test_parse_inappropriate_with_reason() {
        assert_eq!(
            Classification::parse("INAPPROPRIATE: graphic violence"),
            Classification::Inappropriate("graphic violence".to_string())
        );
        assert_eq!(
            Classification::parse("INAPPROPRIATE:"),
            Classification::Inappropriate("no reason given".to_string())
        );
    }

    #[test]
    fn test_parse_anything_else_is_unclear() {
        assert_eq!(
            Classification::parse("I'm not sure"),
            Classification::Unclear("I'm not sure".to_string())
        );
        // Missing colon is not a rejection.
        assert!(matches!(
            Classification::parse("INAPPROPRIATE"),
            Classification::Unclear(_)
        ));
    }

    #[test]
    fn test_verdict_accessors() {
        let rejected = Verdict::Rejected {
            reason: "hate speech".to_string(),
            kind: RejectionKind::Moderation,
        };
        assert!(!rejected.is_approved());
        assert_eq!(rejected.reason(), Some("hate speech"));
        assert!(Verdict::Approved.is_approved());
        assert_eq!(
            serde_json::to_value(&rejected).unwrap()["outcome"],
            "rejected"
        );
    }
}

//! Classifier prompt.

/// Builds the classification prompt for `topic`.
///
/// The classifier is asked to answer with `APPROPRIATE` or
/// `INAPPROPRIATE: <reason>`.
#[must_use]
pub fn moderation_prompt(topic: &str) -> String {
    format!(
        r#"You are a content moderator for a philosophical dialogue platform. Evaluate if this topic is appropriate for respectful philosophical discussion.

Topic: "{topic}"

Criteria for rejection:
- Explicitly sexual or pornographic content
- Graphic violence or gore
- Hate speech or discrimination
- Illegal activities (except as legitimate policy questions like "should X be legal?")
- Trolling or bad faith topics

Criteria for acceptance:
- Legitimate philosophical questions about ethics, even if controversial
- Policy questions about legalization/regulation
- Questions about morality, even if touching on difficult subjects
- Sincere inquiry into human nature and society

Respond with ONLY:
- "APPROPRIATE" if the topic is suitable for philosophical dialogue
- "INAPPROPRIATE: [brief reason]" if it should be rejected

Response:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_quotes_topic_and_answer_format() {
        let prompt = moderation_prompt("Should drugs be legalized?");

        assert!(prompt.contains("Topic: \"Should drugs be legalized?\""));
        assert!(prompt.contains("\"APPROPRIATE\""));
        assert!(prompt.contains("\"INAPPROPRIATE: [brief reason]\""));
        assert!(prompt.ends_with("Response:"));
    }
}

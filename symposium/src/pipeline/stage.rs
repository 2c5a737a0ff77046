//! Stage identifiers, request templates and rendered requests.

use super::bag::ContextBag;
use crate::errors::ConfigError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

static STAGE_ORDER: [StageId; 4] = StageId::ALL;

/// Directive substituted for `{topic}` when the caller left the topic blank.
pub const OPEN_TOPIC_DIRECTIVE: &str =
    "(no topic given: choose a classic, open philosophical question yourself)";

/// One of the four fixed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Restates or proposes the topic.
    TopicStage,
    /// First Socratic line of inquiry.
    FirstInquiry,
    /// An alternative line of inquiry.
    AltInquiry,
    /// Evaluation of both inquiries.
    Judgment,
}

impl StageId {
    /// All stages in execution order.
    pub const ALL: [Self; 4] = [
        Self::TopicStage,
        Self::FirstInquiry,
        Self::AltInquiry,
        Self::Judgment,
    ];

    /// Returns the stable identifier used as the context key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopicStage => "topic_stage",
            Self::FirstInquiry => "first_inquiry",
            Self::AltInquiry => "alt_inquiry",
            Self::Judgment => "judgment",
        }
    }

    /// Returns the zero-based position in execution order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::TopicStage => 0,
            Self::FirstInquiry => 1,
            Self::AltInquiry => 2,
            Self::Judgment => 3,
        }
    }

    /// Returns the stage that runs after this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Returns the stages whose outputs this stage may read.
    #[must_use]
    pub fn predecessors(self) -> &'static [Self] {
        &STAGE_ORDER[..self.index()]
    }

    /// Parses a stage identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == s)
    }

    /// Returns the operation name used for timing logs.
    #[must_use]
    pub fn operation_name(self) -> String {
        format!("stage_{}", self.as_str())
    }

    /// Returns the heading shown above this stage's output.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::TopicStage => "Topic",
            Self::FirstInquiry => "First Line of Inquiry",
            Self::AltInquiry => "Alternative Line of Inquiry",
            Self::Judgment => "Dialectic Evaluation",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request templates for the four stages.
///
/// Placeholders are `{topic}`, `{current_year}` and `{<stage_id>}` for any
/// stage that runs earlier than the template's own stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTemplates {
    /// Template for [`StageId::TopicStage`].
    pub topic_stage: String,
    /// Template for [`StageId::FirstInquiry`].
    pub first_inquiry: String,
    /// Template for [`StageId::AltInquiry`].
    pub alt_inquiry: String,
    /// Template for [`StageId::Judgment`].
    pub judgment: String,
}

impl Default for StageTemplates {
    fn default() -> Self {
        Self {
            topic_stage: "The year is {current_year}. Topic: {topic}\n\
                 State the philosophical question to be examined in one or two \
                 sentences. If no topic is given, propose one."
                .to_string(),
            first_inquiry: "Question under examination:\n{topic_stage}\n\n\
                 Conduct a Socratic line of inquiry into this question. Ask \
                 probing questions, expose hidden assumptions and follow the \
                 answers where they lead."
                .to_string(),
            alt_inquiry: "Question under examination:\n{topic_stage}\n\n\
                 An earlier line of inquiry went as follows:\n{first_inquiry}\n\n\
                 Conduct a different Socratic line of inquiry that starts from \
                 other premises and reaches the question from another angle."
                .to_string(),
            judgment: "Question under examination:\n{topic_stage}\n\n\
                 First line of inquiry:\n{first_inquiry}\n\n\
                 Alternative line of inquiry:\n{alt_inquiry}\n\n\
                 Evaluate both inquiries for rigor, clarity and depth of \
                 questioning. Name the stronger one and explain why."
                .to_string(),
        }
    }
}

impl StageTemplates {
    /// Returns the template for `stage`.
    #[must_use]
    pub fn get(&self, stage: StageId) -> &str {
        match stage {
            StageId::TopicStage => &self.topic_stage,
            StageId::FirstInquiry => &self.first_inquiry,
            StageId::AltInquiry => &self.alt_inquiry,
            StageId::Judgment => &self.judgment,
        }
    }

    /// Replaces the template for `stage`.
    #[must_use]
    pub fn with_template(mut self, stage: StageId, template: impl Into<String>) -> Self {
        let template = template.into();
        match stage {
            StageId::TopicStage => self.topic_stage = template,
            StageId::FirstInquiry => self.first_inquiry = template,
            StageId::AltInquiry => self.alt_inquiry = template,
            StageId::Judgment => self.judgment = template,
        }
        self
    }

    /// Checks that every template only references inputs it may read.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTemplate` for an empty template, an
    /// unknown placeholder, or a reference to the stage itself or a later one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for stage in StageId::ALL {
            let template = self.get(stage);
            if template.trim().is_empty() {
                return Err(ConfigError::InvalidTemplate {
                    stage,
                    message: "template is empty".to_string(),
                });
            }

            for caps in PLACEHOLDER.captures_iter(template) {
                let name = &caps[1];
                if name == "topic" || name == "current_year" {
                    continue;
                }
                match StageId::parse(name) {
                    Some(other) if other < stage => {}
                    Some(other) => {
                        return Err(ConfigError::InvalidTemplate {
                            stage,
                            message: format!(
                                "references '{other}', which has not run yet"
                            ),
                        });
                    }
                    None => {
                        return Err(ConfigError::InvalidTemplate {
                            stage,
                            message: format!("unknown placeholder '{{{name}}}'"),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Renders the request text for `stage`.
    ///
    /// Unknown placeholders are left as written; [`validate`](Self::validate)
    /// is expected to have run first.
    #[must_use]
    pub fn render(&self, stage: StageId, topic: &str, current_year: i32, bag: &ContextBag) -> String {
        let topic = if topic.trim().is_empty() {
            OPEN_TOPIC_DIRECTIVE
        } else {
            topic
        };

        PLACEHOLDER
            .replace_all(self.get(stage), |caps: &Captures<'_>| {
                let name = &caps[1];
                match name {
                    "topic" => topic.to_string(),
                    "current_year" => current_year.to_string(),
                    _ => StageId::parse(name)
                        .filter(|other| *other < stage)
                        .and_then(|other| bag.get(other))
                        .map_or_else(|| caps[0].to_string(), str::to_string),
                }
            })
            .into_owned()
    }
}

/// A fully rendered request for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRequest {
    /// The stage being executed.
    pub stage: StageId,
    /// The accepted topic, possibly empty.
    pub topic: String,
    /// Year stamped on the run.
    pub current_year: i32,
    /// Rendered template text.
    pub prompt: String,
    /// Outputs of every earlier stage, in stage order.
    pub context: Vec<(StageId, String)>,
}

impl StageRequest {
    /// Builds the request for `stage` from the accumulated bag.
    #[must_use]
    pub fn build(
        templates: &StageTemplates,
        stage: StageId,
        topic: &str,
        current_year: i32,
        bag: &ContextBag,
    ) -> Self {
        Self {
            stage,
            topic: topic.to_string(),
            current_year,
            prompt: templates.render(stage, topic, current_year, bag),
            context: bag.to_entries(),
        }
    }

    /// Returns the stage ids present in the forwarded context.
    #[must_use]
    pub fn context_keys(&self) -> Vec<StageId> {
        self.context.iter().map(|(stage, _)| *stage).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stage_order() {
        assert_eq!(StageId::ALL[0], StageId::TopicStage);
        assert_eq!(StageId::Judgment.index(), 3);
        assert_eq!(StageId::FirstInquiry.next(), Some(StageId::AltInquiry));
        assert_eq!(StageId::Judgment.next(), None);
        assert_eq!(
            StageId::AltInquiry.predecessors(),
            &[StageId::TopicStage, StageId::FirstInquiry]
        );
        assert!(StageId::TopicStage.predecessors().is_empty());
    }

    #[test]
    fn test_stage_names_round_trip() {
        for stage in StageId::ALL {
            assert_eq!(StageId::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(StageId::parse("closing"), None);
        assert_eq!(StageId::AltInquiry.to_string(), "alt_inquiry");
        assert_eq!(
            serde_json::to_string(&StageId::TopicStage).unwrap(),
            "\"topic_stage\""
        );
    }

    #[test]
    fn test_default_templates_are_valid() {
        assert!(StageTemplates::default().validate().is_ok());
    }

    #[test]
    fn test_template_referencing_later_stage_is_rejected() {
        let templates = StageTemplates::default()
            .with_template(StageId::FirstInquiry, "Answer {alt_inquiry} about {topic}");

        let err = templates.validate().unwrap_err();
        match err {
            ConfigError::InvalidTemplate { stage, message } => {
                assert_eq!(stage, StageId::FirstInquiry);
                assert!(message.contains("alt_inquiry"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_referencing_itself_is_rejected() {
        let templates =
            StageTemplates::default().with_template(StageId::Judgment, "Judge {judgment}");
        assert!(templates.validate().is_err());
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let templates =
            StageTemplates::default().with_template(StageId::TopicStage, "Talk about {weather}");
        assert!(templates.validate().is_err());
    }

    #[test]
    fn test_render_substitutes_topic_year_and_outputs() {
        let templates = StageTemplates::default()
            .with_template(StageId::FirstInquiry, "{current_year}|{topic}|{topic_stage}");
        let mut bag = ContextBag::new();
        bag.record(StageId::TopicStage, "T".to_string()).unwrap();

        let rendered = templates.render(StageId::FirstInquiry, "What is justice?", 2026, &bag);

        assert_eq!(rendered, "2026|What is justice?|T");
    }

    #[test]
    fn test_render_blank_topic_uses_open_directive() {
        let templates =
            StageTemplates::default().with_template(StageId::TopicStage, "Topic: {topic}");

        let rendered = templates.render(StageId::TopicStage, "   ", 2026, &ContextBag::new());

        assert_eq!(rendered, format!("Topic: {OPEN_TOPIC_DIRECTIVE}"));
    }

    #[test]
    fn test_request_carries_prior_context_only() {
        let mut bag = ContextBag::new();
        bag.record(StageId::TopicStage, "T".to_string()).unwrap();
        bag.record(StageId::FirstInquiry, "P1".to_string()).unwrap();

        let request = StageRequest::build(
            &StageTemplates::default(),
            StageId::AltInquiry,
            "What is justice?",
            2026,
            &bag,
        );

        assert_eq!(
            request.context_keys(),
            vec![StageId::TopicStage, StageId::FirstInquiry]
        );
        assert!(request.prompt.contains("P1"));
    }
}

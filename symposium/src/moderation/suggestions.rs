//! Alternative topics offered after a rejection.

/// Vetted general-purpose topics.
pub const DEFAULT_SUGGESTIONS: [&str; 8] = [
    "What is justice?",
    "What is the good life?",
    "Is morality relative or universal?",
    "What is consciousness?",
    "Do we have free will?",
    "Can AI have rights?",
    "What is truth?",
    "Is beauty objective?",
];

struct Theme {
    keywords: &'static [&'static str],
    topics: [&'static str; 8],
}

// Checked in order; the first theme with a matching keyword wins.
const THEMES: [Theme; 7] = [
    Theme {
        keywords: &[
            "ai",
            "robot",
            "technology",
            "computer",
            "digital",
            "internet",
            "social media",
        ],
        topics: [
            "Can AI have rights?",
            "Should we fear artificial intelligence?",
            "What is consciousness?",
            "Can machines be creative?",
            "What makes us human in a digital age?",
            "Is privacy a fundamental right?",
            "How should we regulate technology?",
            "What is the nature of intelligence?",
        ],
    },
    Theme {
        keywords: &[
            "moral", "ethics", "right", "wrong", "should", "ought", "good", "bad", "virtue",
        ],
        topics: [
            "Is morality relative or universal?",
            "What is the good life?",
            "Can morality exist without religion?",
            "What is justice?",
            "Are there universal human rights?",
            "Is utilitarianism the best ethical framework?",
            "What role should empathy play in ethics?",
            "Can an action be both right and wrong?",
        ],
    },
    Theme {
        keywords: &[
            "government",
            "politics",
            "society",
            "democracy",
            "freedom",
            "liberty",
            "law",
            "rights",
        ],
        topics: [
            "What is justice?",
            "What is the ideal form of government?",
            "Are there limits to freedom of speech?",
            "What is the social contract?",
            "Should voting be mandatory?",
            "What role should government play in our lives?",
            "Are universal human rights possible?",
            "Can democracy survive the digital age?",
        ],
    },
    Theme {
        keywords: &[
            "mind",
            "consciousness",
            "brain",
            "thought",
            "awareness",
            "perception",
            "mental",
            "cognitive",
        ],
        topics: [
            "What is consciousness?",
            "Do we have free will?",
            "Is the mind separate from the brain?",
            "What is the nature of reality?",
            "Can we trust our perceptions?",
            "What is the self?",
            "Are our thoughts truly our own?",
            "What is subjective experience?",
        ],
    },
    Theme {
        keywords: &[
            "meaning",
            "purpose",
            "life",
            "death",
            "existence",
            "existential",
            "absurd",
            "suffer",
        ],
        topics: [
            "What is the good life?",
            "What makes life meaningful?",
            "Is there inherent meaning in the universe?",
            "How should we face mortality?",
            "Can we create our own purpose?",
            "What is happiness?",
            "Is suffering necessary for meaning?",
            "What is the examined life?",
        ],
    },
    Theme {
        keywords: &[
            "truth",
            "knowledge",
            "belief",
            "fact",
            "science",
            "evidence",
            "prove",
            "certain",
        ],
        topics: [
            "What is truth?",
            "Can we know anything with certainty?",
            "What is the relationship between science and philosophy?",
            "Is objective truth possible?",
            "What is knowledge?",
            "Can faith and reason coexist?",
            "What are the limits of human knowledge?",
            "How do we distinguish truth from opinion?",
        ],
    },
    Theme {
        keywords: &["art", "beauty", "aesthetic", "music", "creative", "culture"],
        topics: [
            "Is beauty objective?",
            "What is art?",
            "Can machines be creative?",
            "What is the purpose of art?",
            "Is there a universal aesthetic?",
            "What makes something beautiful?",
            "Can art be immoral?",
            "What is the value of aesthetic experience?",
        ],
    },
];

/// Returns the fixed list of vetted alternative topics.
#[must_use]
pub fn alternative_suggestions() -> Vec<String> {
    DEFAULT_SUGGESTIONS.iter().map(ToString::to_string).collect()
}

/// Returns alternatives themed on a rejected topic.
///
/// Keywords are matched as case-insensitive substrings. Falls back to
/// [`alternative_suggestions`] when the topic is blank or matches no theme.
#[must_use]
pub fn themed_suggestions(rejected_topic: &str) -> Vec<String> {
    let lowered = rejected_topic.trim().to_lowercase();
    if lowered.is_empty() {
        return alternative_suggestions();
    }

    THEMES
        .iter()
        .find(|theme| theme.keywords.iter().any(|kw| lowered.contains(*kw)))
        .map_or_else(alternative_suggestions, |theme| {
            theme.topics.iter().map(ToString::to_string).collect()
        })
}

/// Returns markdown guidelines describing acceptable topics.
#[must_use]
pub fn rejection_guidelines() -> &'static str {
    "**Our Guidelines for Philosophical Discourse**

We welcome questions that:
- Explore ethics, morality, and values through reasoned inquiry
- Question fundamental assumptions about society, knowledge, or existence
- Examine difficult topics with intellectual rigor and good faith
- Seek understanding through the Socratic method

We filter out topics that:
- Contain explicit sexual or violent content
- Include hate speech or discriminatory language
- Promote illegal activities (policy questions about legalization are welcome)
- Appear designed to provoke rather than explore

**The Difference**: \"Should drugs be legalized?\" explores policy and ethics ✓
vs. explicit content about drug use ✗

If your topic was rejected, try rephrasing it as a philosophical question that \
explores underlying principles, values, or reasoning rather than specific content."
}

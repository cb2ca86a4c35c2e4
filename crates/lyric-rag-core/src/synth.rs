//! Answer synthesis from ranked documents.
//!
//! [`Synthesizer`] is the seam between retrieval and answer generation.
//! [`TemplateSynthesizer`] is the built-in implementation: it classifies
//! the question's intent and fills a canned template with the top
//! document's title, a topic phrase taken from its content, and citation
//! markers. The app crate provides a model-backed implementation.
//!
//! Theme labels for the theme template come from [`THEME_VOCABULARY`].
//! Without a seed they are chosen deterministically (labels found in the
//! document first, then vocabulary order). With a seed they are shuffled
//! by a `StdRng` seeded per call, so output is still reproducible.

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::Document;

/// Answer returned when retrieval found nothing.
pub const NO_RESULTS_MESSAGE: &str = "I couldn't find any relevant information in the catalog to answer that. Try asking about a specific track or album title.";

/// Topic phrase used when no sentence of the top document qualifies.
pub const GENERIC_TOPIC: &str = "themes that run throughout the catalog";

/// Fixed label set for the theme template.
pub const THEME_VOCABULARY: &[&str] = &[
    "resilience",
    "truth",
    "identity",
    "struggle",
    "transformation",
    "spirituality",
    "defiance",
    "awakening",
];

const THEMES_PER_ANSWER: usize = 3;
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_TOPIC_CHARS: usize = 100;

/// Produces answer text for a query from ranked documents.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Short identifier shown in logs (`"template"`, `"openai"`).
    fn name(&self) -> &str;

    /// Build an answer. `documents` are in rank order; citation marker
    /// `[n]` refers to `documents[n - 1]`.
    async fn synthesize(&self, query: &str, documents: &[Document]) -> Result<String>;
}

/// Coarse question intent used to pick a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// "what ... about"
    Descriptive,
    /// "meaning" / "explain"
    Meaning,
    /// "theme" / "topic"
    Themes,
    General,
}

/// Classify `query` by case-insensitive cue words, in priority order.
pub fn classify_intent(query: &str) -> QueryIntent {
    let q = query.to_lowercase();
    if q.contains("what") && q.contains("about") {
        QueryIntent::Descriptive
    } else if q.contains("meaning") || q.contains("explain") {
        QueryIntent::Meaning
    } else if q.contains("theme") || q.contains("topic") {
        QueryIntent::Themes
    } else {
        QueryIntent::General
    }
}

/// First sentence (or lyric line) longer than 20 characters, cut to 100
/// characters with an ellipsis. Falls back to [`GENERIC_TOPIC`].
pub fn topic_phrase(content: &str) -> String {
    let sentence = content
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|s| s.chars().count() > MIN_SENTENCE_CHARS);

    match sentence {
        Some(s) if s.chars().count() > MAX_TOPIC_CHARS => {
            let cut: String = s.chars().take(MAX_TOPIC_CHARS).collect();
            format!("{}...", cut.trim_end())
        }
        Some(s) => s.to_string(),
        None => GENERIC_TOPIC.to_string(),
    }
}

/// Template-based synthesizer; the default when no model is configured.
#[derive(Debug, Clone, Default)]
pub struct TemplateSynthesizer {
    theme_seed: Option<u64>,
}

impl TemplateSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shuffle theme labels with a reproducible seed.
    pub fn with_theme_seed(seed: u64) -> Self {
        Self {
            theme_seed: Some(seed),
        }
    }

    fn theme_labels(&self, content: &str) -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = THEME_VOCABULARY.to_vec();
        match self.theme_seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                labels.shuffle(&mut rng);
            }
            None => {
                let lower = content.to_lowercase();
                // Stable sort: labels present in the text first.
                labels.sort_by_key(|label| !lower.contains(label));
            }
        }
        labels.truncate(THEMES_PER_ANSWER);
        labels
    }

    /// Render the answer synchronously. Never fails.
    pub fn render(&self, query: &str, documents: &[Document]) -> String {
        let Some(top) = documents.first() else {
            return NO_RESULTS_MESSAGE.to_string();
        };
        let second = documents.get(1);
        let topic = topic_phrase(&top.content);

        match classify_intent(query) {
            QueryIntent::Descriptive => {
                let mut answer = format!(
                    "\"{}\" is about {} [1].",
                    top.title,
                    lowercase_first(&topic)
                );
                if let Some(next) = second {
                    answer.push_str(&format!(
                        " Related material appears in \"{}\" [2].",
                        next.title
                    ));
                }
                answer
            }
            QueryIntent::Meaning => {
                let mut answer = format!(
                    "The meaning behind \"{}\" comes through in the line: \"{}\" [1].",
                    top.title, topic
                );
                if let Some(next) = second {
                    answer.push_str(&format!(
                        " For more context, see \"{}\" [2].",
                        next.title
                    ));
                }
                answer
            }
            QueryIntent::Themes => {
                let labels = self.theme_labels(&top.content);
                format!(
                    "\"{}\" touches on themes of {} [1]. It opens with: \"{}\"",
                    top.title,
                    join_labels(&labels),
                    topic
                )
            }
            QueryIntent::General => {
                let mut answer = format!("From \"{}\" [1]: {}", top.title, topic);
                if let Some(next) = second {
                    answer.push_str(&format!(" See also \"{}\" [2].", next.title));
                }
                answer
            }
        }
    }
}

#[async_trait]
impl Synthesizer for TemplateSynthesizer {
    fn name(&self) -> &str {
        "template"
    }

    async fn synthesize(&self, query: &str, documents: &[Document]) -> Result<String> {
        Ok(self.render(query, documents))
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `a`, `a and b`, `a, b and c`.
fn join_labels(labels: &[&str]) -> String {
    match labels {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: i64, title: &str, content: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            content: content.to_string(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_classify_intent_priority() {
        assert_eq!(classify_intent("What is Swordfish about?"), QueryIntent::Descriptive);
        assert_eq!(classify_intent("explain the meaning of Ashes"), QueryIntent::Meaning);
        assert_eq!(classify_intent("What themes show up?"), QueryIntent::Themes);
        assert_eq!(classify_intent("Swordfish lyrics"), QueryIntent::General);
        // Both cues present: descriptive wins.
        assert_eq!(
            classify_intent("what is the topic about"),
            QueryIntent::Descriptive
        );
    }

    #[test]
    fn test_topic_phrase_first_long_sentence() {
        let content = "[Verse 1]\nShort line\nWarning shots fired, no retreat, no surrender\nmore";
        assert_eq!(
            topic_phrase(content),
            "Warning shots fired, no retreat, no surrender"
        );
    }

    #[test]
    fn test_topic_phrase_truncates() {
        let long = "a".repeat(150);
        let phrase = topic_phrase(&long);
        assert_eq!(phrase.chars().count(), MAX_TOPIC_CHARS + 3);
        assert!(phrase.ends_with("..."));
    }

    #[test]
    fn test_topic_phrase_generic_fallback() {
        assert_eq!(topic_phrase("Short. Tiny! Ok?"), GENERIC_TOPIC);
    }

    #[test]
    fn test_no_documents_message() {
        let synth = TemplateSynthesizer::new();
        let answer = synth.render("asdkjasdlkj", &[]);
        assert_eq!(answer, NO_RESULTS_MESSAGE);
        assert!(!answer.contains("[1]"));
    }

    #[test]
    fn test_descriptive_cites_two_documents() {
        let synth = TemplateSynthesizer::new();
        let docs = vec![
            doc(1, "Warning Shots", "A song about resilience and standing firm"),
            doc(2, "Full Disclosure", "Truth told plainly with nothing held back"),
        ];
        let answer = synth.render("What is Warning Shots about?", &docs);
        assert!(answer.contains("\"Warning Shots\""));
        assert!(answer.contains("[1]"));
        assert!(answer.contains("\"Full Disclosure\" [2]"));
    }

    #[test]
    fn test_single_document_has_no_second_marker() {
        let synth = TemplateSynthesizer::new();
        let docs = vec![doc(1, "Ashes", "Rising from the ashes of what came before")];
        let answer = synth.render("explain Ashes", &docs);
        assert!(answer.contains("[1]"));
        assert!(!answer.contains("[2]"));
    }

    #[test]
    fn test_theme_labels_deterministic_without_seed() {
        let synth = TemplateSynthesizer::new();
        let docs = vec![doc(1, "Lifted", "A story of struggle and awakening in the dark")];
        let first = synth.render("what themes are in Lifted", &docs);
        let second = synth.render("what themes are in Lifted", &docs);
        assert_eq!(first, second);
        assert!(first.contains("struggle, awakening and resilience"));
    }

    #[test]
    fn test_seeded_theme_labels_reproducible() {
        let a = TemplateSynthesizer::with_theme_seed(7);
        let b = TemplateSynthesizer::with_theme_seed(7);
        let docs = vec![doc(1, "Haunted", "Echoes in the hallway, voices in the walls")];
        assert_eq!(a.render("topic?", &docs), b.render("topic?", &docs));
        let labels = a.theme_labels("");
        assert_eq!(labels.len(), THEMES_PER_ANSWER);
        assert!(labels.iter().all(|l| THEME_VOCABULARY.contains(l)));
    }

    #[test]
    fn test_join_labels() {
        assert_eq!(join_labels(&["a"]), "a");
        assert_eq!(join_labels(&["a", "b"]), "a and b");
        assert_eq!(join_labels(&["a", "b", "c"]), "a, b and c");
    }

    #[tokio::test]
    async fn test_trait_delegates_to_render() {
        let synth = TemplateSynthesizer::new();
        let answer = synth.synthesize("anything", &[]).await.unwrap();
        assert_eq!(answer, NO_RESULTS_MESSAGE);
        assert_eq!(synth.name(), "template");
    }
}

//! Query keyword extraction.
//!
//! Turns a free-form chat question into a [`KeywordSet`] for the matcher.
//! Extraction is heuristic and never fails; in the worst case the raw
//! query is returned as the only keyword.
//!
//! # Extraction Order
//!
//! 1. Question patterns from [`QUESTION_PATTERNS`], tried in order. The
//!    first pattern whose capture survives cleanup wins.
//! 2. A quoted substring (`"..."`, `'...'`, `“...”`) overrides any
//!    pattern capture and is used verbatim.
//! 3. Otherwise the longest run of capitalized words.
//! 4. Otherwise the raw query, with `is_natural_language = false`.
//!
//! Pattern and capitalization candidates have one leading article and
//! one trailing noise word (`song`, `track`, ...) removed. When anything
//! was extracted, each candidate word longer than two characters is
//! appended as a supplementary keyword for the matcher's fallback pass.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::KeywordSet;

/// A named question shape. Capture group 1 holds the subject.
#[derive(Debug, Clone, Copy)]
pub struct QueryPattern {
    pub name: &'static str,
    pub pattern: &'static str,
}

/// Question shapes in priority order. Request phrasings ("tell me
/// about", "show me", "find") come before the `X lyrics` shape so the
/// verb is never captured as part of the subject.
pub const QUESTION_PATTERNS: &[QueryPattern] = &[
    QueryPattern {
        name: "what_is_about",
        pattern: r"(?i)\bwhat\s+(?:is|are)\s+(.+?)\s+about\b",
    },
    QueryPattern {
        name: "whats_about",
        pattern: r"(?i)\bwhat(?:'|’)?s\s+(.+?)\s+(?:all\s+about|about|means?|saying)\b",
    },
    QueryPattern {
        name: "tell_me_about",
        pattern: r"(?i)\b(?:tell\s+me\s+about|show\s+me|find(?:\s+me)?)\s+(.+?)[\s?.!]*$",
    },
    QueryPattern {
        name: "explain",
        pattern: r"(?i)\b(?:explain|describe|show)\s+(.+?)[\s?.!]*$",
    },
    QueryPattern {
        name: "subject_lyrics",
        pattern: r"(?i)^\s*(?:(?:get|show)\s+(?:me\s+)?)?(.+?)\s+(?:lyrics|words|text)\b",
    },
    QueryPattern {
        name: "lyrics_of",
        pattern: r"(?i)\blyrics\s+(?:of|for|to)\s+(.+?)[\s?.!]*$",
    },
    QueryPattern {
        name: "get_lyrics",
        pattern: r"(?i)\b(?:get|show)\s+(?:me\s+)?(.+?)\s+lyrics\b",
    },
    QueryPattern {
        name: "do_you_have",
        pattern: r"(?i)\b(?:do\s+you\s+have|can\s+you\s+show(?:\s+me)?)\s+(.+?)[\s?.!]*$",
    },
    QueryPattern {
        name: "what_does_mean",
        pattern: r"(?i)\bwhat\s+(?:does|do)\s+(.+?)\s+mean\b",
    },
    QueryPattern {
        name: "meaning_of",
        pattern: r"(?i)\bmeaning\s+(?:of|behind)\s+(.+?)[\s?.!]*$",
    },
];

const NOISE_WORDS: &[&str] = &["song", "track", "album", "music", "tune"];

static COMPILED_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    QUESTION_PATTERNS
        .iter()
        .map(|p| {
            let re = Regex::new(p.pattern).expect("built-in question pattern must compile");
            (p.name, re)
        })
        .collect()
});

// Single quotes must not touch a word character on the outside so that
// apostrophes ("what's", "don't") are not read as quote marks.
static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]+)"|“([^”]+)”|(?:^|[^\w])'([^']+)'(?:[^\w]|$)"#)
        .expect("quote pattern must compile")
});

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\p{Lu}[\w'’-]*(?:\s+\p{Lu}[\w'’-]*)*").expect("capitalized pattern must compile")
});

static LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:the|a|an)\s+").expect("article pattern must compile"));

/// Extract search keywords from a raw query.
pub fn extract(query: &str) -> KeywordSet {
    let mut candidate = match_question_pattern(query);

    // Explicit quoting wins over any pattern capture.
    if let Some(quoted) = find_quoted(query) {
        candidate = Some(quoted);
    }

    if candidate.is_none() {
        candidate = longest_capitalized_run(query).and_then(|run| clean_candidate(&run));
    }

    match candidate {
        Some(primary) => {
            let mut keywords = vec![primary.clone()];
            keywords.extend(
                primary
                    .split_whitespace()
                    .filter(|w| w.chars().count() > 2)
                    .map(str::to_string),
            );
            tracing::debug!(query, ?keywords, "extracted natural-language keywords");
            KeywordSet {
                keywords,
                is_natural_language: true,
            }
        }
        None => KeywordSet {
            keywords: vec![query.to_string()],
            is_natural_language: false,
        },
    }
}

/// Return the cleaned capture of the first matching question pattern.
fn match_question_pattern(query: &str) -> Option<String> {
    COMPILED_PATTERNS.iter().find_map(|(name, re)| {
        let captured = re.captures(query)?.get(1)?.as_str();
        let cleaned = clean_candidate(captured)?;
        tracing::trace!(pattern = *name, keyword = %cleaned, "question pattern matched");
        Some(cleaned)
    })
}

fn find_quoted(query: &str) -> Option<String> {
    let caps = QUOTED.captures(query)?;
    let inner = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    let trimmed = inner.as_str().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Longest (by characters) maximal run of capitalized words. Ties go to
/// the earliest run.
fn longest_capitalized_run(query: &str) -> Option<String> {
    let mut best: Option<&str> = None;
    for m in CAPITALIZED_RUN.find_iter(query) {
        let run = m.as_str();
        let longer = best.map_or(true, |b| run.chars().count() > b.chars().count());
        if longer {
            best = Some(run);
        }
    }
    best.map(str::to_string)
}

/// Strip one leading article and one trailing noise word, then trim.
/// Returns `None` when nothing is left.
fn clean_candidate(raw: &str) -> Option<String> {
    let trimmed = trim_punctuation(raw);
    let without_article = LEADING_ARTICLE.replace(trimmed, "");
    let mut cleaned = without_article.trim();

    if let Some((head, last)) = cleaned.rsplit_once(char::is_whitespace) {
        if NOISE_WORDS.iter().any(|n| n.eq_ignore_ascii_case(last)) {
            cleaned = head.trim_end();
        }
    }

    let cleaned = trim_punctuation(cleaned);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn trim_punctuation(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '?' | '!' | '.' | ','))
}

//! Citation formatting for ranked documents.
//!
//! The matcher has no scoring function, so citation scores only encode
//! rank position: `0.85 - 0.05 * i` for the zero-based position `i`,
//! floored at `0.0`. Chat clients render this as a relevance badge.

use crate::models::{Citation, Document};

/// Score given to the top-ranked document.
pub const TOP_SCORE: f64 = 0.85;

/// Score decrement per rank position.
pub const SCORE_STEP: f64 = 0.05;

/// Display score for the document at zero-based rank `position`.
pub fn rank_score(position: usize) -> f64 {
    (TOP_SCORE - position as f64 * SCORE_STEP).max(0.0)
}

/// Map ranked documents to citations, preserving order.
pub fn format_citations(docs: &[Document]) -> Vec<Citation> {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| Citation {
            id: doc.id,
            title: doc.title.clone(),
            score: rank_score(i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: i64, title: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            content: "x".to_string(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_citation_scores_085() {
        let citations = format_citations(&[doc(7, "Warning Shots")]);
        assert_eq!(
            citations,
            vec![Citation {
                id: 7,
                title: "Warning Shots".to_string(),
                score: 0.85
            }]
        );
    }

    #[test]
    fn test_scores_match_client_arithmetic() {
        let docs: Vec<Document> = (0..6).map(|i| doc(i, "t")).collect();
        let citations = format_citations(&docs);
        for (i, c) in citations.iter().enumerate() {
            assert_eq!(c.score, 0.85 - i as f64 * 0.05);
        }
    }

    #[test]
    fn test_scores_strictly_decrease_then_floor() {
        let docs: Vec<Document> = (0..25).map(|i| doc(i, "t")).collect();
        let citations = format_citations(&docs);
        for pair in citations.windows(2) {
            assert!(pair[1].score <= pair[0].score);
            if pair[0].score > 0.0 {
                assert!(pair[1].score < pair[0].score);
            }
        }
        assert!(citations.iter().all(|c| c.score >= 0.0));
        assert_eq!(citations.last().unwrap().score, 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(format_citations(&[]).is_empty());
    }
}

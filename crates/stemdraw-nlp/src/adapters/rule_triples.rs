use crate::text::sentences;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use stemdraw_core::{ExtractedItem, Extractor, ExtractorResult, ToolId};

lazy_static! {
    /// Pattern table: each entry captures (subject, object) around a fixed
    /// predicate phrase. Ordered longest-phrase first so "connected in
    /// series to" wins over "connected to".
    static ref TRIPLE_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(r"(?i)(.+?)\s+(?:is\s+|are\s+|was\s+|were\s+)?connected\s+in\s+series\s+(?:to|with)\s+(.+)").unwrap(),
            "connected_in_series",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+(?:is\s+|are\s+|was\s+|were\s+)?connected\s+in\s+parallel\s+(?:to|with)\s+(.+)").unwrap(),
            "connected_in_parallel",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+connected\s+(?:to|with)\s+(.+)").unwrap(),
            "connected_to",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+(?:is|are)?\s*applied\s+(?:to|across)\s+(.+)").unwrap(),
            "applied_to",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+(?:sits|rests|lies|is placed|is put)\s+on\s+(.+)").unwrap(),
            "rests_on",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+(?:is|are)\s+filled\s+with\s+(.+)").unwrap(),
            "filled_with",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+(?:is|are)\s+attached\s+to\s+(.+)").unwrap(),
            "attached_to",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+consists?\s+of\s+(.+)").unwrap(),
            "consists_of",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+contains?\s+(.+)").unwrap(),
            "contains",
        ),
        (
            Regex::new(r"(?i)(.+?)\s+between\s+(.+?)\s+and\s+(.+)").unwrap(),
            "between",
        ),
    ];
}

/// Rule-based subject/predicate/object extraction over fixed phrase
/// patterns. Lowest merge priority: anything a smarter tool says about
/// the same node wins.
pub struct RuleTripleExtractor;

impl RuleTripleExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(&self, text: &str) -> Vec<ExtractedItem> {
        let mut items = Vec::new();
        for sentence in sentences(text) {
            for (pattern, predicate) in TRIPLE_PATTERNS.iter() {
                if let Some(caps) = pattern.captures(sentence) {
                    let subject = trim_phrase(caps.get(1).map_or("", |m| m.as_str()));
                    let object = trim_phrase(
                        caps.get(caps.len() - 1).map_or("", |m| m.as_str()),
                    );
                    if subject.is_empty() || object.is_empty() {
                        continue;
                    }
                    if *predicate == "between" {
                        // between yields two part_of-style triples
                        let first = trim_phrase(caps.get(2).map_or("", |m| m.as_str()));
                        if !first.is_empty() {
                            items.push(ExtractedItem::Triple {
                                subject: subject.clone(),
                                predicate: "between_first".to_string(),
                                object: first,
                            });
                        }
                        items.push(ExtractedItem::Triple {
                            subject,
                            predicate: "between_second".to_string(),
                            object,
                        });
                    } else {
                        items.push(ExtractedItem::Triple {
                            subject,
                            predicate: predicate.to_string(),
                            object,
                        });
                    }
                    break;
                }
            }
        }
        items
    }
}

impl Default for RuleTripleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip leading articles and trailing clause fragments from a captured
/// phrase, and bound its length: long clauses are not node labels.
fn trim_phrase(phrase: &str) -> String {
    let mut p = phrase.trim();
    for article in ["a ", "an ", "the ", "A ", "An ", "The "] {
        if let Some(rest) = p.strip_prefix(article) {
            p = rest;
            break;
        }
    }
    let p = p.split(',').next().unwrap_or(p).trim();
    let words: Vec<&str> = p.split_whitespace().collect();
    if words.len() > 6 {
        words[words.len() - 6..].join(" ")
    } else {
        p.to_string()
    }
}

#[async_trait]
impl Extractor for RuleTripleExtractor {
    fn tool(&self) -> ToolId {
        ToolId::RuleTriples
    }

    async fn extract(&self, text: &str) -> ExtractorResult {
        ExtractorResult::ok(self.tool(), self.extract_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_series_connection() {
        let extractor = RuleTripleExtractor::new();
        let result = extractor
            .extract("A 12V battery is connected in series to a resistor.")
            .await;
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::Triple { predicate, .. } if predicate == "connected_in_series"
        )));
    }

    #[tokio::test]
    async fn extracts_rests_on() {
        let extractor = RuleTripleExtractor::new();
        let result = extractor.extract("A 5 kg block sits on a 30° incline.").await;
        let triple = result
            .items
            .iter()
            .find_map(|i| match i {
                ExtractedItem::Triple {
                    subject,
                    predicate,
                    object,
                } if predicate == "rests_on" => Some((subject.clone(), object.clone())),
                _ => None,
            })
            .expect("rests_on triple");
        assert!(triple.0.contains("block"));
        assert!(triple.1.contains("incline"));
    }

    #[tokio::test]
    async fn empty_text_yields_no_items() {
        let extractor = RuleTripleExtractor::new();
        let result = extractor.extract("").await;
        assert!(result.items.is_empty());
    }
}

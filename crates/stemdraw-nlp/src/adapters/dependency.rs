use crate::text::{sentences, tokens};
use crate::vocab;
use async_trait::async_trait;
use stemdraw_core::{ExtractedItem, Extractor, ExtractorResult, ToolId};

const PREPOSITIONS: &[&str] = &["on", "of", "in", "between", "across", "through", "under", "over"];

const VERBS: &[&str] = &[
    "connected", "applied", "sits", "rests", "placed", "attached", "contains", "exerts", "acts",
    "flows", "moves", "hangs", "supports", "pushes", "pulls", "disconnected", "reconnected",
    "wired",
];

/// Lightweight dependency parse: noun-modifier, subject/object and
/// prepositional attachments over a small closed-class lexicon. A full
/// treebank parser sits behind the same adapter contract in deployments
/// that carry one.
pub struct DependencyParser;

impl DependencyParser {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(&self, text: &str) -> Vec<ExtractedItem> {
        let mut items = Vec::new();
        for sentence in sentences(text) {
            let toks = tokens(sentence);
            for window in toks.windows(2) {
                let (first, second) = (window[0], window[1]);
                let first_lower = first.to_lowercase();
                let second_lower = second.to_lowercase();

                // numeric modifier: "5 kg", "two capacitors"
                if first.chars().next().is_some_and(|c| c.is_ascii_digit())
                    && vocab::is_indicator(&second_lower)
                {
                    items.push(ExtractedItem::DepEdge {
                        head: second_lower.clone(),
                        dependent: first.to_string(),
                        relation: "nummod".to_string(),
                    });
                }

                // adjectival modifier over indicator heads: "inclined plane"
                if vocab::is_indicator(&second_lower)
                    && !vocab::is_indicator(&first_lower)
                    && first.chars().all(|c| c.is_alphabetic())
                    && !PREPOSITIONS.contains(&first_lower.as_str())
                    && !VERBS.contains(&first_lower.as_str())
                {
                    items.push(ExtractedItem::DepEdge {
                        head: second_lower.clone(),
                        dependent: first_lower.clone(),
                        relation: "amod".to_string(),
                    });
                }
            }

            // verb argument structure: nearest indicator noun on each side
            for (i, tok) in toks.iter().enumerate() {
                let tok_lower = tok.to_lowercase();
                if !VERBS.contains(&tok_lower.as_str()) {
                    continue;
                }
                let subject = toks[..i]
                    .iter()
                    .rev()
                    .find(|t| vocab::is_indicator(&t.to_lowercase()));
                let object = toks[i + 1..]
                    .iter()
                    .find(|t| vocab::is_indicator(&t.to_lowercase()));
                if let Some(s) = subject {
                    items.push(ExtractedItem::DepEdge {
                        head: tok_lower.clone(),
                        dependent: s.to_lowercase(),
                        relation: "nsubj".to_string(),
                    });
                }
                if let Some(o) = object {
                    items.push(ExtractedItem::DepEdge {
                        head: tok_lower.clone(),
                        dependent: o.to_lowercase(),
                        relation: "obj".to_string(),
                    });
                }
            }

            // prepositional attachment between indicator nouns
            for (i, tok) in toks.iter().enumerate() {
                let tok_lower = tok.to_lowercase();
                if !PREPOSITIONS.contains(&tok_lower.as_str()) {
                    continue;
                }
                let head = toks[..i]
                    .iter()
                    .rev()
                    .find(|t| vocab::is_indicator(&t.to_lowercase()));
                let complement = toks[i + 1..]
                    .iter()
                    .find(|t| vocab::is_indicator(&t.to_lowercase()));
                if let (Some(h), Some(c)) = (head, complement) {
                    if h.to_lowercase() != c.to_lowercase() {
                        items.push(ExtractedItem::DepEdge {
                            head: h.to_lowercase(),
                            dependent: c.to_lowercase(),
                            relation: format!("prep_{}", tok_lower),
                        });
                    }
                }
            }
        }
        items
    }
}

impl Default for DependencyParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for DependencyParser {
    fn tool(&self) -> ToolId {
        ToolId::Dependency
    }

    async fn extract(&self, text: &str) -> ExtractorResult {
        ExtractorResult::ok(self.tool(), self.extract_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unit_token_modifies_indicator_head() {
        let parser = DependencyParser::new();
        let result = parser.extract("A 5 kg block sits on the incline.").await;
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::DepEdge { head, relation, .. }
                if head == "block" && relation == "amod"
        )));
    }

    #[tokio::test]
    async fn verb_arguments_link_indicators() {
        let parser = DependencyParser::new();
        let result = parser
            .extract("The battery is connected to the resistor.")
            .await;
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::DepEdge { head, dependent, relation }
                if head == "connected" && dependent == "battery" && relation == "nsubj"
        )));
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::DepEdge { head, dependent, relation }
                if head == "connected" && dependent == "resistor" && relation == "obj"
        )));
    }

    #[tokio::test]
    async fn prepositional_attachment() {
        let parser = DependencyParser::new();
        let result = parser.extract("The block on the incline.").await;
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::DepEdge { head, dependent, relation }
                if head == "block" && dependent == "incline" && relation == "prep_on"
        )));
    }
}

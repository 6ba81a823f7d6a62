use crate::text::{sentences, tokens};
use crate::vocab;
use async_trait::async_trait;
use stemdraw_core::{ExtractedItem, Extractor, ExtractorResult, ToolId};

/// Predicate lexicon with the role the surface subject plays. Passive
/// forms ("is connected") keep the agent/patient assignment of the
/// underlying event.
const PREDICATES: &[(&str, &str)] = &[
    ("connected", "linked"),
    ("reconnected", "linked"),
    ("disconnected", "unlinked"),
    ("applied", "acts_on"),
    ("exerts", "acts_on"),
    ("acts", "acts_on"),
    ("pushes", "acts_on"),
    ("pulls", "acts_on"),
    ("sits", "supported_by"),
    ("rests", "supported_by"),
    ("placed", "supported_by"),
    ("hangs", "suspended_from"),
    ("contains", "contains"),
    ("filled", "contains"),
];

/// Shallow semantic-role labeling: one frame per predicate occurrence,
/// with the nearest indicator mentions as agent and patient. Highest
/// merge priority of the text extractors.
pub struct SemanticRoleParser;

impl SemanticRoleParser {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(&self, text: &str) -> Vec<ExtractedItem> {
        let mut items = Vec::new();
        for sentence in sentences(text) {
            let toks = tokens(sentence);
            for (i, tok) in toks.iter().enumerate() {
                let tok_lower = tok.to_lowercase();
                let Some((_, event)) = PREDICATES.iter().find(|(p, _)| *p == tok_lower) else {
                    continue;
                };

                let agent = toks[..i]
                    .iter()
                    .rev()
                    .find(|t| vocab::is_indicator(&t.to_lowercase()))
                    .map(|t| t.to_lowercase());
                let patient = toks[i + 1..]
                    .iter()
                    .find(|t| vocab::is_indicator(&t.to_lowercase()))
                    .map(|t| t.to_lowercase());

                let mut roles = Vec::new();
                if let Some(a) = agent {
                    roles.push(("agent".to_string(), a));
                }
                if let Some(p) = patient {
                    roles.push(("patient".to_string(), p));
                }
                if roles.is_empty() {
                    continue;
                }
                items.push(ExtractedItem::Frame {
                    predicate: event.to_string(),
                    roles,
                });
            }
        }
        items
    }
}

impl Default for SemanticRoleParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for SemanticRoleParser {
    fn tool(&self) -> ToolId {
        ToolId::Semantic
    }

    async fn extract(&self, text: &str) -> ExtractorResult {
        ExtractorResult::ok(self.tool(), self.extract_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn labels_support_frame() {
        let parser = SemanticRoleParser::new();
        let result = parser.extract("A 5 kg block sits on a 30° incline.").await;
        let frame = result
            .items
            .iter()
            .find_map(|i| match i {
                ExtractedItem::Frame { predicate, roles } if predicate == "supported_by" => {
                    Some(roles.clone())
                }
                _ => None,
            })
            .expect("support frame");
        assert!(frame.contains(&("agent".to_string(), "block".to_string())));
        assert!(frame.contains(&("patient".to_string(), "incline".to_string())));
    }

    #[tokio::test]
    async fn no_predicates_no_frames() {
        let parser = SemanticRoleParser::new();
        let result = parser.extract("Plate area A = 10.5 cm².").await;
        assert!(result.items.is_empty());
    }
}

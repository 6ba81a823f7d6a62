use crate::vocab;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use stemdraw_core::{ExtractedItem, Extractor, ExtractorResult, ToolId};

lazy_static! {
    /// `300 V`, `2.00 µF`, `7.12 mm`, `100Ω`, `30°`
    static ref QUANTITY: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)\s*(°[CF]?|[A-Za-zµΩ]+[²³]?)").unwrap();
    /// Subscripted symbols: `C1`, `R2`, `κ1`, `κ₃`, `d_o`
    static ref SYMBOL: Regex =
        Regex::new(r"\b([A-Zκµλθασω][0-9₀₁₂₃₄₅₆₇₈₉]+|[a-z]_[a-z0-9]+)\b").unwrap();
}

/// Scientific named-entity recognition: measurement quantities, component
/// terms from the physical-indicator dictionary, and subscripted symbols.
/// Stands in for a transformer NER model behind the same adapter contract;
/// `available` reports whether the term tables loaded.
pub struct ScientificNer {
    loaded: bool,
}

impl ScientificNer {
    pub fn new() -> Self {
        Self {
            loaded: !vocab::PHYSICAL_INDICATORS.is_empty(),
        }
    }

    fn extract_sync(&self, text: &str) -> Vec<ExtractedItem> {
        let mut items = Vec::new();

        for caps in QUANTITY.captures_iter(text) {
            let raw_value = &caps[1];
            let unit = caps[2].trim_end_matches(|c: char| c == '.' || c == ',');
            if !vocab::is_unit(unit) && !unit.starts_with('°') {
                continue;
            }
            if let Ok(value) = raw_value.parse::<f64>() {
                items.push(ExtractedItem::Entity {
                    text: format!("{} {}", raw_value, unit),
                    label: "QUANTITY".to_string(),
                    value: Some(value),
                    unit: Some(unit.to_string()),
                });
            }
        }

        let lower = text.to_lowercase();
        for (term, _) in vocab::PHYSICAL_INDICATORS {
            if lower.contains(term) {
                items.push(ExtractedItem::Entity {
                    text: term.to_string(),
                    label: "COMPONENT".to_string(),
                    value: None,
                    unit: None,
                });
            }
        }

        for caps in SYMBOL.captures_iter(text) {
            items.push(ExtractedItem::Entity {
                text: caps[1].to_string(),
                label: "SYMBOL".to_string(),
                value: None,
                unit: None,
            });
        }

        items
    }
}

impl Default for ScientificNer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for ScientificNer {
    fn tool(&self) -> ToolId {
        ToolId::ScientificNer
    }

    fn available(&self) -> bool {
        self.loaded
    }

    async fn extract(&self, text: &str) -> ExtractorResult {
        ExtractorResult::ok(self.tool(), self.extract_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_quantities_with_units() {
        let ner = ScientificNer::new();
        let result = ner
            .extract("A potential difference of 300 V across 2.00 µF.")
            .await;
        let quantities: Vec<_> = result
            .items
            .iter()
            .filter_map(|i| match i {
                ExtractedItem::Entity {
                    label, value, unit, ..
                } if label == "QUANTITY" => Some((value.unwrap(), unit.clone().unwrap())),
                _ => None,
            })
            .collect();
        assert!(quantities.contains(&(300.0, "V".to_string())));
        assert!(quantities.contains(&(2.0, "µF".to_string())));
    }

    #[tokio::test]
    async fn finds_component_terms() {
        let ner = ScientificNer::new();
        let result = ner.extract("two capacitors and a battery").await;
        let components: Vec<_> = result
            .items
            .iter()
            .filter_map(|i| match i {
                ExtractedItem::Entity { text, label, .. } if label == "COMPONENT" => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect();
        assert!(components.contains(&"capacitor"));
        assert!(components.contains(&"battery"));
    }

    #[tokio::test]
    async fn finds_subscripted_symbols() {
        let ner = ScientificNer::new();
        let result = ner.extract("capacitances C1 and C2, with κ1 = 21.0").await;
        let symbols: Vec<_> = result
            .items
            .iter()
            .filter_map(|i| match i {
                ExtractedItem::Entity { text, label, .. } if label == "SYMBOL" => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect();
        assert!(symbols.contains(&"C1"));
        assert!(symbols.contains(&"C2"));
        assert!(symbols.contains(&"κ1"));
    }

    #[tokio::test]
    async fn degrees_are_quantities() {
        let ner = ScientificNer::new();
        let result = ner.extract("a 30° incline").await;
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::Entity { label, value: Some(v), .. }
                if label == "QUANTITY" && *v == 30.0
        )));
    }
}

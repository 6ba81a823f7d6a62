use crate::text::sentences;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use stemdraw_core::{ExtractedItem, Extractor, ExtractorResult, ToolId};

lazy_static! {
    /// Candidate formulas: runs of element symbols with optional counts,
    /// at least two atoms or a multi-letter element ("H2O", "CO2", "NaCl").
    static ref FORMULA: Regex = Regex::new(r"\b([A-Z][a-z]?\d*){2,}\b").unwrap();
    static ref ELEMENT: Regex = Regex::new(r"([A-Z][a-z]?)(\d*)").unwrap();
    static ref REACTION: Regex = Regex::new(r"(.+?)\s*(?:->|→|=)\s*(.+)").unwrap();
}

const KNOWN_ELEMENTS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Fe", "Cu", "Zn", "Ag", "Au", "Hg", "Pb", "I", "Br", "Mn", "Ni", "Cr", "Sn",
];

/// Chemical formula and reaction-equation parsing.
pub struct ChemistryParser;

impl ChemistryParser {
    pub fn new() -> Self {
        Self
    }

    /// Element histogram for a formula string, with leading stoichiometric
    /// coefficient applied. Returns None when any token is not an element.
    pub fn parse_formula(formula: &str) -> Option<Vec<(String, u32)>> {
        let (coefficient, body) = split_coefficient(formula.trim());
        if body.is_empty() {
            return None;
        }
        let mut counts: Vec<(String, u32)> = Vec::new();
        let mut consumed = 0;
        for caps in ELEMENT.captures_iter(body) {
            let symbol = caps.get(1)?.as_str();
            if !KNOWN_ELEMENTS.contains(&symbol) {
                return None;
            }
            let count: u32 = caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map_or(Some(1), |s| s.parse().ok())?;
            consumed += caps.get(0)?.as_str().len();
            match counts.iter_mut().find(|(s, _)| s == symbol) {
                Some((_, c)) => *c += count * coefficient,
                None => counts.push((symbol.to_string(), count * coefficient)),
            }
        }
        if consumed != body.len() || counts.is_empty() {
            return None;
        }
        Some(counts)
    }

    fn extract_sync(&self, text: &str) -> Vec<ExtractedItem> {
        let mut items = Vec::new();

        for caps in FORMULA.captures_iter(text) {
            let raw = caps.get(0).map_or("", |m| m.as_str());
            if let Some(elements) = Self::parse_formula(raw) {
                // single-element singletons ("H", "O") carry no structure
                let atoms: u32 = elements.iter().map(|(_, c)| c).sum();
                if atoms >= 2 {
                    items.push(ExtractedItem::Formula {
                        raw: raw.to_string(),
                        elements,
                    });
                }
            }
        }

        for sentence in sentences(text) {
            if !sentence.contains("->") && !sentence.contains('→') {
                continue;
            }
            if let Some(caps) = REACTION.captures(sentence) {
                items.push(ExtractedItem::Equation {
                    raw: sentence.trim().to_string(),
                    lhs: caps[1].trim().to_string(),
                    rhs: caps[2].trim().to_string(),
                });
            }
        }

        items
    }
}

impl Default for ChemistryParser {
    fn default() -> Self {
        Self::new()
    }
}

fn split_coefficient(formula: &str) -> (u32, &str) {
    let digits: String = formula.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        (1, formula)
    } else {
        (digits.parse().unwrap_or(1), &formula[digits.len()..])
    }
}

#[async_trait]
impl Extractor for ChemistryParser {
    fn tool(&self) -> ToolId {
        ToolId::Chemistry
    }

    async fn extract(&self, text: &str) -> ExtractorResult {
        ExtractorResult::ok(self.tool(), self.extract_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_water() {
        let elements = ChemistryParser::parse_formula("H2O").unwrap();
        assert_eq!(elements, vec![("H".to_string(), 2), ("O".to_string(), 1)]);
    }

    #[test]
    fn applies_coefficient() {
        let elements = ChemistryParser::parse_formula("2H2O").unwrap();
        assert_eq!(elements, vec![("H".to_string(), 4), ("O".to_string(), 2)]);
    }

    #[test]
    fn rejects_non_elements() {
        assert!(ChemistryParser::parse_formula("Xy3").is_none());
    }

    #[tokio::test]
    async fn extracts_reaction_sides() {
        let parser = ChemistryParser::new();
        let result = parser.extract("2H2 + O2 -> 2H2O.").await;
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::Equation { lhs, rhs, .. }
                if lhs.contains("2H2") && rhs.contains("2H2O")
        )));
    }

    #[tokio::test]
    async fn ordinary_prose_produces_no_formulas() {
        let parser = ChemistryParser::new();
        let result = parser.extract("A block rests on an incline.").await;
        assert!(result.items.is_empty());
    }
}

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use stemdraw_core::{ExtractedItem, Extractor, ExtractorResult, ToolId};

lazy_static! {
    /// Assignments and equations: `C1 = 2.00 µF`, `2d = 7.12 mm`,
    /// `1/f = 1/do + 1/di`. One equation per match; chained text like
    /// `κ1 = 21.0, right top κ2 = 42.0` yields one item per symbol.
    static ref EQUATION: Regex = Regex::new(
        r"([A-Za-zκµλθ0-9_/\.]+(?:\s*[+\-*/]\s*[A-Za-zκµλθ0-9_/\.]+)*)\s*=\s*([A-Za-zκµλθ0-9_/\.]+(?:\s*[+\-*/]\s*[A-Za-zκµλθ0-9_/\.]+)*(?:\s*[µA-Za-zΩ°]+)?)"
    )
    .unwrap();
}

/// Math-expression parsing: equations and symbol assignments. The raw
/// right-hand side is preserved verbatim so downstream labels can show
/// `C1 = 2.00 µF` exactly as written.
pub struct MathExpressionParser;

impl MathExpressionParser {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(&self, text: &str) -> Vec<ExtractedItem> {
        let mut items = Vec::new();
        for caps in EQUATION.captures_iter(text) {
            let lhs = caps[1].trim().to_string();
            let rhs = caps[2].trim().to_string();
            if lhs.is_empty() || rhs.is_empty() || lhs == rhs {
                continue;
            }
            items.push(ExtractedItem::Equation {
                raw: format!("{} = {}", lhs, rhs),
                lhs,
                rhs,
            });
        }
        items
    }
}

impl Default for MathExpressionParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for MathExpressionParser {
    fn tool(&self) -> ToolId {
        ToolId::MathExpr
    }

    async fn extract(&self, text: &str) -> ExtractorResult {
        ExtractorResult::ok(self.tool(), self.extract_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_symbol_assignments() {
        let parser = MathExpressionParser::new();
        let result = parser
            .extract("capacitances C1 = 2.00 µF and C2 = 8.00 µF")
            .await;
        let equations: Vec<_> = result
            .items
            .iter()
            .filter_map(|i| match i {
                ExtractedItem::Equation { lhs, rhs, .. } => Some((lhs.as_str(), rhs.as_str())),
                _ => None,
            })
            .collect();
        assert!(equations.iter().any(|(l, r)| *l == "C1" && r.starts_with("2.00")));
        assert!(equations.iter().any(|(l, r)| *l == "C2" && r.starts_with("8.00")));
    }

    #[tokio::test]
    async fn extracts_lens_equation() {
        let parser = MathExpressionParser::new();
        let result = parser.extract("Use 1/f = 1/do + 1/di for the thin lens.").await;
        assert!(result.items.iter().any(|i| matches!(
            i,
            ExtractedItem::Equation { lhs, rhs, .. }
                if lhs == "1/f" && rhs.contains("1/do")
        )));
    }

    #[tokio::test]
    async fn kappa_assignments() {
        let parser = MathExpressionParser::new();
        let result = parser.extract("left half κ1 = 21.0, right top κ2 = 42.0").await;
        assert_eq!(
            result
                .items
                .iter()
                .filter(|i| matches!(i, ExtractedItem::Equation { .. }))
                .count(),
            2
        );
    }
}

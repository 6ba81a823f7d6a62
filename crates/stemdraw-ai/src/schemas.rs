use serde::{Deserialize, Serialize};

/// Response schema for the graph-enrichment call: nodes and edges the
/// model believes the extractors missed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    #[serde(default)]
    pub nodes: Vec<EnrichmentNode>,
    #[serde(default)]
    pub edges: Vec<EnrichmentEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentNode {
    pub id: String,
    pub label: String,
    /// "object", "concept", "quantity", "material", "agent" or "event".
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Response schema for the planning-assist call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningResponse {
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub constraints: Vec<PlannedConstraint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedConstraint {
    /// Constraint name from the spatial vocabulary ("distance",
    /// "aligned_horizontally", "above", ...).
    pub kind: String,
    pub ids: Vec<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Critical,
    Major,
    Minor,
    Suggestion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditIssue {
    pub category: String,
    pub severity: AuditSeverity,
    pub description: String,
    /// Model confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
}

/// Response schema for the post-render audit call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditResponse {
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Response schema for the semantic-validation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticValidationResponse {
    #[serde(default)]
    pub consistent: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

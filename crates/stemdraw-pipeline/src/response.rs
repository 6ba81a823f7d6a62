use serde::{Deserialize, Serialize};
use stemdraw_core::{Domain, LayoutTierId, RequestId, RequestTrace, Strategy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateMetadata {
    pub domain: Domain,
    pub complexity_score: f64,
    pub strategy: Option<Strategy>,
    pub layout_tier_used: Option<LayoutTierId>,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub refinement_iterations: u32,
    pub warnings: Vec<String>,
    pub request_id: RequestId,
    pub partial: bool,
}

impl GenerateMetadata {
    pub fn empty(request_id: RequestId) -> Self {
        Self {
            domain: Domain::Other,
            complexity_score: 0.0,
            strategy: None,
            layout_tier_used: None,
            graph_nodes: 0,
            graph_edges: 0,
            refinement_iterations: 0,
            warnings: Vec::new(),
            request_id,
            partial: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// What one pipeline run produces. `svg` and `error` are mutually
/// exclusive except on a partial budget-exceeded response, where the
/// best SVG produced before the deadline is returned alongside the
/// metadata flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResult {
    pub request_id: RequestId,
    pub svg: Option<String>,
    pub metadata: GenerateMetadata,
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<RequestTrace>,
}

impl GenerateResult {
    pub fn is_success(&self) -> bool {
        self.svg.is_some() && self.error.is_none()
    }
}

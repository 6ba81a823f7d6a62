use crate::constraint::Constraint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type RequestId = Uuid;

/// NLP tools that can contribute to the property graph. The declaration
/// order here is also the merge-priority order: later tools win node-kind
/// conflicts against earlier ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    RuleTriples,
    Dependency,
    ScientificNer,
    Embedder,
    Chemistry,
    #[serde(rename = "math")]
    MathExpr,
    Semantic,
}

impl ToolId {
    pub const ALL: [ToolId; 7] = [
        ToolId::RuleTriples,
        ToolId::Dependency,
        ToolId::ScientificNer,
        ToolId::Embedder,
        ToolId::Chemistry,
        ToolId::MathExpr,
        ToolId::Semantic,
    ];

    /// Fixed priority used to resolve node-kind conflicts during graph merge.
    pub fn merge_priority(self) -> u8 {
        match self {
            ToolId::RuleTriples => 0,
            ToolId::Dependency => 1,
            ToolId::ScientificNer => 2,
            ToolId::Embedder => 2,
            ToolId::Chemistry => 3,
            ToolId::MathExpr => 3,
            ToolId::Semantic => 4,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolId::RuleTriples => "rule_triples",
            ToolId::Dependency => "dependency",
            ToolId::ScientificNer => "scientific_ner",
            ToolId::Embedder => "embedder",
            ToolId::Chemistry => "chemistry",
            ToolId::MathExpr => "math",
            ToolId::Semantic => "semantic",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ToolId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rule_triples" => Ok(ToolId::RuleTriples),
            "dependency" => Ok(ToolId::Dependency),
            "scientific_ner" => Ok(ToolId::ScientificNer),
            "embedder" => Ok(ToolId::Embedder),
            "chemistry" => Ok(ToolId::Chemistry),
            "math" => Ok(ToolId::MathExpr),
            "semantic" => Ok(ToolId::Semantic),
            other => Err(format!("unknown NLP tool: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Electronics,
    Mechanics,
    Optics,
    Thermodynamics,
    Chemistry,
    Geometry,
    Biology,
    Other,
}

impl Domain {
    /// Relative difficulty weight feeding the complexity score.
    pub fn difficulty_weight(self) -> f64 {
        match self {
            Domain::Electronics => 0.8,
            Domain::Mechanics => 0.7,
            Domain::Optics => 0.6,
            Domain::Thermodynamics => 0.6,
            Domain::Chemistry => 0.8,
            Domain::Geometry => 0.4,
            Domain::Biology => 0.5,
            Domain::Other => 0.5,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Domain::Electronics => "electronics",
            Domain::Mechanics => "mechanics",
            Domain::Optics => "optics",
            Domain::Thermodynamics => "thermodynamics",
            Domain::Chemistry => "chemistry",
            Domain::Geometry => "geometry",
            Domain::Biology => "biology",
            Domain::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Object,
    Concept,
    Quantity,
    Material,
    Agent,
    Event,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Grammatical,
    Scientific,
    Semantic,
    PartOf,
    HasProperty,
    ValueOf,
    ActsOn,
    Other(String),
}

/// Primitive-typed attribute value. Embeddings and other complex payloads
/// are held outside attribute maps and never serialized through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Num(f64),
    Bool(bool),
    List(Vec<String>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            AttrValue::Num(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Num(n)
    }
}

// ============================================================================
// Extractor results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorStatus {
    Success,
    Failed,
    Skipped,
}

/// Tool-native payload items. Each adapter produces one or more of these
/// shapes; the graph merge layer decides how they become nodes and edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ExtractedItem {
    Triple {
        subject: String,
        predicate: String,
        object: String,
    },
    Entity {
        text: String,
        label: String,
        value: Option<f64>,
        unit: Option<String>,
    },
    DepEdge {
        head: String,
        dependent: String,
        relation: String,
    },
    Embedding {
        target: String,
        vector: Vec<f32>,
    },
    Formula {
        raw: String,
        elements: Vec<(String, u32)>,
    },
    Equation {
        raw: String,
        lhs: String,
        rhs: String,
    },
    Frame {
        predicate: String,
        roles: Vec<(String, String)>,
    },
}

/// Uniform wrapper every extractor adapter returns. Adapters never raise:
/// any internal error becomes `status: Failed` with empty items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorResult {
    pub tool: ToolId,
    pub status: ExtractorStatus,
    pub items: Vec<ExtractedItem>,
    pub metadata: BTreeMap<String, String>,
    pub errors: Vec<String>,
}

impl ExtractorResult {
    pub fn ok(tool: ToolId, items: Vec<ExtractedItem>) -> Self {
        Self {
            tool,
            status: ExtractorStatus::Success,
            items,
            metadata: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn failed(tool: ToolId, error: impl Into<String>) -> Self {
        Self {
            tool,
            status: ExtractorStatus::Failed,
            items: Vec::new(),
            metadata: BTreeMap::new(),
            errors: vec![error.into()],
        }
    }

    pub fn skipped(tool: ToolId, reason: impl Into<String>) -> Self {
        Self {
            tool,
            status: ExtractorStatus::Skipped,
            items: Vec::new(),
            metadata: BTreeMap::new(),
            errors: vec![reason.into()],
        }
    }
}

// ============================================================================
// Canonical problem spec
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecObject {
    pub id: String,
    pub object_type: String,
    pub properties: BTreeMap<String, AttrValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecRelationship {
    pub subject: String,
    pub relation: String,
    pub target: String,
    #[serde(default)]
    pub properties: BTreeMap<String, AttrValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalSpec {
    pub domain: Domain,
    pub problem_type: String,
    pub objects: Vec<SpecObject>,
    pub relationships: Vec<SpecRelationship>,
    pub constraints: Vec<Constraint>,
    pub complexity_score: f64,
    pub raw_text: Option<String>,
}

impl CanonicalSpec {
    pub fn object(&self, id: &str) -> Option<&SpecObject> {
        self.objects.iter().find(|o| o.id == id)
    }
}

// ============================================================================
// Diagram plan
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Heuristic,
    ConstraintBased,
    SymbolicPhysics,
    Hierarchical,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Heuristic => "heuristic",
            Strategy::ConstraintBased => "constraint_based",
            Strategy::SymbolicPhysics => "symbolic_physics",
            Strategy::Hierarchical => "hierarchical",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualRelationKind {
    ConnectsTo,
    ActsOn,
    AdjacentTo,
    Inside,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualRelation {
    pub kind: VisualRelationKind,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Rect,
    Circle,
    Line,
    Arrow,
    Polygon,
    Text,
    Battery,
    Resistor,
    Capacitor,
    Switch,
    Wire,
    Lens,
    Block,
    Incline,
    Spring,
    Atom,
    Bond,
    Other(String),
}

impl PrimitiveKind {
    /// Category key used by the primitive library.
    pub fn category(&self) -> String {
        match self {
            PrimitiveKind::Other(s) => s.clone(),
            other => format!("{:?}", other).to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntity {
    pub id: String,
    pub label: String,
    pub primitive: PrimitiveKind,
    /// Id of the canonical-spec object this entity came from, if any.
    pub source_object: Option<String>,
    /// True for entities the planner added that the text never names
    /// (e.g. a power source for a circuit with a voltage but no source).
    pub inferred: bool,
    pub properties: BTreeMap<String, AttrValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleHint {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub layer: Option<Layer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramPlan {
    pub entities: Vec<PlanEntity>,
    pub relations: Vec<VisualRelation>,
    pub global_constraints: Vec<Constraint>,
    pub style_hints: BTreeMap<String, StyleHint>,
    pub strategy: Strategy,
}

impl DiagramPlan {
    pub fn entity(&self, id: &str) -> Option<&PlanEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

// ============================================================================
// Scene
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::Center
    }
}

/// The single position shape used everywhere. Dimensions never live here;
/// they belong to `Dimensions`/`properties` on the object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default)]
    pub rotation: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            anchor: Anchor::Center,
            rotation: 0.0,
        }
    }

    /// Center point of an object with the given dimensions, whatever the
    /// anchor is.
    pub fn center(&self, dims: &Dimensions) -> (f64, f64) {
        let (w, h) = (dims.width(), dims.height());
        match self.anchor {
            Anchor::Center => (self.x, self.y),
            Anchor::TopLeft => (self.x + w / 2.0, self.y + h / 2.0),
            Anchor::TopRight => (self.x - w / 2.0, self.y + h / 2.0),
            Anchor::BottomLeft => (self.x + w / 2.0, self.y - h / 2.0),
            Anchor::BottomRight => (self.x - w / 2.0, self.y - h / 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimensions {
    Box { width: f64, height: f64 },
    Radius { radius: f64 },
}

impl Dimensions {
    pub fn rect(width: f64, height: f64) -> Self {
        Dimensions::Box { width, height }
    }

    pub fn circle(radius: f64) -> Self {
        Dimensions::Radius { radius }
    }

    pub fn width(&self) -> f64 {
        match self {
            Dimensions::Box { width, .. } => *width,
            Dimensions::Radius { radius } => radius * 2.0,
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            Dimensions::Box { height, .. } => *height,
            Dimensions::Radius { radius } => radius * 2.0,
        }
    }
}

/// Render layers, back to front. The renderer sorts by this ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Background,
    Shapes,
    Lines,
    Annotations,
    Labels,
    Foreground,
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Shapes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub opacity: f64,
    pub font_size: Option<f64>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: "none".to_string(),
            stroke: "#1f2937".to_string(),
            stroke_width: 2.0,
            opacity: 1.0,
            font_size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    pub primitive: PrimitiveKind,
    /// None until the layout solver runs; must be Some for every object
    /// that reaches the renderer.
    pub position: Option<Position>,
    pub dimensions: Dimensions,
    pub properties: BTreeMap<String, AttrValue>,
    pub style: Style,
    pub layer: Layer,
    /// For `Text` objects: the id of the object this label annotates.
    pub label_target: Option<String>,
}

impl SceneObject {
    pub fn new(id: impl Into<String>, primitive: PrimitiveKind, dimensions: Dimensions) -> Self {
        Self {
            id: id.into(),
            primitive,
            position: None,
            dimensions,
            properties: BTreeMap::new(),
            style: Style::default(),
            layer: Layer::default(),
            label_target: None,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn label_text(&self) -> Option<&str> {
        self.properties.get("text").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub canvas: Canvas,
    pub objects: Vec<SceneObject>,
    pub constraints: Vec<Constraint>,
}

impl Scene {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            objects: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Every constraint must reference objects that exist in the scene.
    pub fn check_references(&self) -> std::result::Result<(), String> {
        let ids: BTreeSet<&str> = self.objects.iter().map(|o| o.id.as_str()).collect();
        for constraint in &self.constraints {
            for id in constraint.object_ids() {
                if !ids.contains(id) {
                    return Err(format!(
                        "constraint {:?} references unknown object '{}'",
                        constraint.kind, id
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Overlap,
    OutOfBounds,
    ZOrder,
    OpenCircuit,
    ForceImbalance,
    EnergyDrift,
    LensEquation,
    Stoichiometry,
    Ontology,
    LabelCollision,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFixHint {
    RecenterInCanvas { id: String },
    SwapZOrder { above: String, below: String },
    RelabelDirection { id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
    pub object_ids: Vec<String>,
    pub fix_hint: Option<AutoFixHint>,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>, object_ids: Vec<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            object_ids,
            fix_hint: None,
        }
    }

    pub fn with_fix(mut self, hint: AutoFixHint) -> Self {
        self.fix_hint = Some(hint);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub score: f64,
    pub auto_fixes_applied: u32,
}

impl ValidationReport {
    pub fn clean() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            score: 100.0,
            auto_fixes_applied: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.score = self.score.min(other.score);
        self.auto_fixes_applied += other.auto_fixes_applied;
    }

    /// Score derived from issue counts: each error costs 15 points, each
    /// warning 3, floored at zero.
    pub fn rescore(&mut self) {
        let penalty = self.errors.len() as f64 * 15.0 + self.warnings.len() as f64 * 3.0;
        self.score = (100.0 - penalty).max(0.0);
    }
}

// ============================================================================
// Layout outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTierId {
    Smt,
    Symbolic,
    Heuristic,
}

impl fmt::Display for LayoutTierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LayoutTierId::Smt => "smt",
            LayoutTierId::Symbolic => "symbolic",
            LayoutTierId::Heuristic => "heuristic",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutOutcome {
    pub tier: LayoutTierId,
    pub reason: String,
    /// Constraints dropped to reach satisfiability (SMT tier only).
    pub dropped_constraints: usize,
    pub iterations: usize,
}

// ============================================================================
// Primitive library entries
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveEntry {
    /// Content hash of `(domain, category, key properties)`.
    pub primitive_id: String,
    pub name: String,
    pub domain: Domain,
    pub category: String,
    pub svg_fragment: String,
    pub tags: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub metadata: BTreeMap<String, String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_ordering_is_back_to_front() {
        assert!(Layer::Background < Layer::Shapes);
        assert!(Layer::Shapes < Layer::Lines);
        assert!(Layer::Labels < Layer::Foreground);
    }

    #[test]
    fn position_center_accounts_for_anchor() {
        let dims = Dimensions::rect(100.0, 40.0);
        let centered = Position::new(10.0, 20.0);
        assert_eq!(centered.center(&dims), (10.0, 20.0));

        let top_left = Position {
            x: 0.0,
            y: 0.0,
            anchor: Anchor::TopLeft,
            rotation: 0.0,
        };
        assert_eq!(top_left.center(&dims), (50.0, 20.0));
    }

    #[test]
    fn tool_priority_orders_semantic_last() {
        assert!(ToolId::RuleTriples.merge_priority() < ToolId::Dependency.merge_priority());
        assert!(ToolId::Dependency.merge_priority() < ToolId::ScientificNer.merge_priority());
        assert!(ToolId::ScientificNer.merge_priority() < ToolId::Chemistry.merge_priority());
        assert!(ToolId::Chemistry.merge_priority() < ToolId::Semantic.merge_priority());
    }

    #[test]
    fn report_rescore_floors_at_zero() {
        let mut report = ValidationReport::clean();
        for _ in 0..10 {
            report
                .errors
                .push(ValidationIssue::new(IssueKind::Overlap, "overlap", vec![]));
        }
        report.rescore();
        assert_eq!(report.score, 0.0);
    }
}

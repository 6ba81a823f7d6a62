use crate::error::Result;
use crate::types::{
    Canvas, CanonicalSpec, DiagramPlan, Domain, ExtractorResult, PrimitiveEntry, Scene,
    SceneObject, ToolId, ValidationIssue,
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Stored primitives keyed by category, handed to renderers for fragment
/// splicing.
pub type PrimitiveMap = HashMap<String, PrimitiveEntry>;

/// One NLP tool behind a uniform contract. `available` is consulted once
/// at pipeline construction and may load models; `extract` must never
/// return an error; failures become `ExtractorStatus::Failed` results.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn tool(&self) -> ToolId;

    fn available(&self) -> bool {
        true
    }

    async fn extract(&self, text: &str) -> ExtractorResult;
}

/// Text embedding backend. Absence degrades primitive search to
/// exact-match, so implementations report availability honestly.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    async fn available(&self) -> bool;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Per-domain translator from a diagram plan to an unpositioned scene.
/// Implementations never assign coordinates; geometry belongs to the
/// layout solver.
pub trait Interpreter: Send + Sync {
    fn domain(&self) -> Domain;

    fn interpret(&self, plan: &DiagramPlan, spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene>;
}

/// Scene → SVG. Implementations sort by layer, read dimensions from the
/// object (never from its position), and splice stored fragments when the
/// primitive map has a match.
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, domain: Domain) -> bool;

    fn render(&self, scene: &Scene, primitives: &PrimitiveMap) -> Result<String>;

    /// Standalone fragment for a single positioned object, used by the
    /// primitive-library ingest loop.
    fn render_fragment(&self, object: &SceneObject) -> Result<String>;
}

/// A domain-rule engine. Rules report issues, they never error.
pub trait DomainRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn applies(&self, domain: Domain) -> bool;

    fn check(&self, scene: &Scene, spec: &CanonicalSpec) -> Vec<ValidationIssue>;
}

/// Durable primitive-fragment store. Single-writer ingest, concurrent
/// reads; entries are immutable once committed.
#[async_trait]
pub trait PrimitiveStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn len(&self) -> usize;

    /// Idempotent insert. Returns false when the id was already present.
    async fn add_primitive(&self, entry: PrimitiveEntry) -> Result<bool>;

    async fn get_by_id(&self, primitive_id: &str) -> Result<Option<PrimitiveEntry>>;

    async fn semantic_search(
        &self,
        query: &str,
        k: usize,
        domain: Option<Domain>,
    ) -> Result<Vec<PrimitiveEntry>>;

    async fn bootstrap(&self, defaults: Vec<PrimitiveEntry>) -> Result<usize>;
}

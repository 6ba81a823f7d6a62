pub mod classifier;
pub mod enrich;
pub mod interpreters;
pub mod planner;

pub use classifier::{canonicalize, choose_strategy, classify, Classification};
pub use enrich::{enrich_graph, EnrichmentOutcome};
pub use interpreters::InterpreterRegistry;
pub use planner::DiagramPlanner;

use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Slugged forms of every physical-indicator term, for bare-mention
/// detection in the planner.
pub(crate) fn vocab_term_slugs() -> &'static BTreeSet<String> {
    static SLUGS: OnceLock<BTreeSet<String>> = OnceLock::new();
    SLUGS.get_or_init(|| {
        stemdraw_nlp::vocab::PHYSICAL_INDICATORS
            .iter()
            .map(|(term, _)| stemdraw_nlp::text::slug(term))
            .collect()
    })
}

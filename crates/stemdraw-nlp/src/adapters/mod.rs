pub mod chemistry;
pub mod dependency;
pub mod math_expr;
pub mod rule_triples;
pub mod scientific_ner;
pub mod semantic_roles;

pub use chemistry::ChemistryParser;
pub use dependency::DependencyParser;
pub use math_expr::MathExpressionParser;
pub use rule_triples::RuleTripleExtractor;
pub use scientific_ner::ScientificNer;
pub use semantic_roles::SemanticRoleParser;

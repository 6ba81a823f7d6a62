pub mod circuit;
pub mod molecule;
pub mod shapes;
pub mod svg;

use stemdraw_core::{Domain, Renderer};

pub use circuit::CircuitRenderer;
pub use molecule::MoleculeRenderer;
pub use svg::GenericRenderer;

/// Domain-dispatching renderer set. Specialized renderers claim their
/// domains; everything else renders generically.
pub struct RendererRegistry {
    specialized: Vec<Box<dyn Renderer>>,
    generic: GenericRenderer,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self {
            specialized: vec![Box::new(CircuitRenderer), Box::new(MoleculeRenderer)],
            generic: GenericRenderer,
        }
    }

    pub fn pick(&self, domain: Domain) -> &dyn Renderer {
        self.specialized
            .iter()
            .find(|r| r.supports(domain))
            .map(|r| r.as_ref())
            .unwrap_or(&self.generic)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.specialized.iter().map(|r| r.name()).collect();
        names.push(self.generic.name());
        names
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

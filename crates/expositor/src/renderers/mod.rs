//! Built-in renderers and manifest-defined ones.

mod diagram;
pub mod manifest;
pub mod prompts;
mod prose;
mod summary;
mod uml;

use std::sync::Arc;

pub use diagram::DiagramRenderer;
pub use manifest::{CommandRenderer, LoadError};
pub use prose::{Heading, ProseRenderer};
pub use summary::SimpleSummary;
pub use uml::{ClassGraph, UmlClassDiagram};

use crate::renderer::Renderer;

/// Every renderer that ships with the crate.
pub fn builtin() -> Vec<Arc<dyn Renderer>> {
    vec![
        Arc::new(SimpleSummary),
        Arc::new(prose::key_components()),
        Arc::new(prose::metaphor_analogy()),
        Arc::new(prose::edge_cases()),
        Arc::new(prose::flowchart_text()),
        Arc::new(prose::code_rap()),
        Arc::new(prose::functional_gap_analysis()),
        Arc::new(diagram::call_graph()),
        Arc::new(diagram::dependency_graph()),
        Arc::new(diagram::flowchart_graphical()),
        Arc::new(UmlClassDiagram::default()),
        Arc::new(diagram::sequence_diagram()),
        Arc::new(diagram::activity_diagram()),
        Arc::new(diagram::architecture_diagram()),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let renderers = builtin();
        let names: HashSet<&str> = renderers.iter().map(|r| r.name()).collect();

        assert_eq!(names.len(), renderers.len());
        assert_eq!(renderers.len(), 14);
    }
}

use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use expositor::{
    DispatchError, Dispatcher, Expositor, ExpositorError, Registry, Sandbox,
    capability::CapabilitySet,
    config::{AppConfig, OutputConfig},
    invoke::RenderInvoker,
    model::{GenerationOptions, LanguageModel, ModelError},
    renderers::ClassGraph,
    request::{ImageFormat, RenderRequest, RenderResult},
};

/// Replies with one canned answer and remembers the options it was called with.
struct Canned {
    answer: String,
    options: Mutex<Vec<GenerationOptions>>,
}

impl Canned {
    fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            options: Mutex::new(Vec::new()),
        })
    }
}

impl LanguageModel for Canned {
    fn name(&self) -> &str {
        "canned"
    }

    fn generate(&self, _prompt: &str, options: &GenerationOptions) -> Result<String, ModelError> {
        self.options.lock().unwrap().push(*options);
        Ok(self.answer.clone())
    }
}

const CLASS_ANSWER: &str = r#"Here is the structure you asked for:

```
CLASS: Parser
ATTRIBUTES:
-input: String
METHODS:
+parse(): Ast
---
CLASS: Ast
ATTRIBUTES:
(No attributes for this class)
METHODS:
+walk(): ()
---
RELATIONSHIP: Parser -> Ast [type=dependency, label="produces"]
RELATIONSHIP: Parser -> Lexer [type=composition]
```
"#;

#[test]
fn test_undeclared_endpoint_yields_no_edges() {
    let graph = ClassGraph::from_notation("CLASS: A\n---\nRELATIONSHIP: A -> Z [type=inheritance]")
        .unwrap();

    assert_eq!(graph.emission.nodes, 1);
    assert_eq!(graph.emission.edges, 0);
    assert_eq!(graph.emission.dropped.len(), 1);
    assert!(graph.emission.dot.contains("\"A_Node\""));
    assert!(!graph.emission.dot.contains("Z_Node"));
}

#[test]
fn test_class_diagram_end_to_end() {
    let dir = tempdir().unwrap();
    let model = Canned::new(CLASS_ANSWER);
    let registry = Registry::builtin(&CapabilitySet::all()).registry;
    let dispatcher = Dispatcher::new(
        registry,
        model.clone(),
        RenderInvoker::default(),
        Sandbox::new(dir.path()),
    );
    let request = RenderRequest::new("uml_class_diagram", "A parser.", "struct Parser;");

    let result = dispatcher.dispatch(&request).unwrap();

    match &result {
        RenderResult::Image { path, message } => {
            assert!(path.is_file());
            assert!(dispatcher.sandbox().contains(path));
            assert!(message.starts_with("Success: UML class diagram image saved to: "));
        }
        RenderResult::Text { content } => {
            // No usable Graphviz on this host: the DOT comes back instead.
            assert!(content.starts_with("Error [uml_class_diagram]: Graphviz rendering failed"));
            assert!(content.contains("Skipped composition relationship Parser -> Lexer"));
            assert!(content.contains("```dot\ndigraph UMLClassDiagram {"));
            assert!(content.contains("\"Parser_Node\" -> \"Ast_Node\" [arrowhead=open, style=dashed, label=\"produces\"];"));
            assert!(!content.contains("Lexer_Node"));
        }
    }

    let options = model.options.lock().unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].temperature(), 0.0);
}

#[test]
fn test_prose_answer_keeps_raw_output() {
    let model = Canned::new("Sorry, I can't produce a call graph for this.");
    let registry = Registry::builtin(&CapabilitySet::all()).registry;
    let dispatcher = Dispatcher::new(
        registry,
        model,
        RenderInvoker::default(),
        Sandbox::new("/app/out"),
    );

    let result = dispatcher.run(&RenderRequest::new("call_graph", "e", "s"));

    let text = result.as_text().unwrap();
    assert!(text.starts_with("Error [call_graph]: error[E001]"));
    assert!(text.contains("Raw LLM output:\n```\nSorry, I can't produce a call graph for this.\n```"));
}

fn expositor_in(root: &std::path::Path) -> Expositor {
    Expositor::new(
        AppConfig::default().with_output(OutputConfig::new(root, ImageFormat::Png)),
    )
}

#[test]
fn test_render_notation_refuses_paths_as_output_base() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("images");
    let expositor = expositor_in(&root);
    let outside = dir.path().join("outside").join("evil");

    for base in [outside.to_string_lossy().into_owned(), "../evil".to_string()] {
        let err = expositor
            .render_notation("CLASS: A\nMETHODS:\n+run()", &base)
            .unwrap_err();
        assert!(matches!(
            err,
            ExpositorError::Dispatch(DispatchError::InvalidOutputBase(_))
        ));
    }
    assert!(!dir.path().join("outside").exists());
    assert!(!dir.path().join("evil.png").exists());
}

#[test]
fn test_render_notation_stays_in_output_directory() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("images");
    let expositor = expositor_in(&root);

    let result = expositor
        .render_notation("CLASS: A\nMETHODS:\n+run()", "uml_class_diagram_output")
        .unwrap();

    match result {
        RenderResult::Image { path, .. } => {
            assert!(path.starts_with(&root));
            assert!(path.is_file());
        }
        RenderResult::Text { content } => {
            assert!(content.contains("digraph UMLClassDiagram"));
        }
    }
}

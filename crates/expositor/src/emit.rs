//! Class diagram to DOT conversion.
//!
//! Every class becomes one HTML-table node listing its attributes and
//! methods. Every relationship whose endpoints are both declared becomes one
//! edge styled by a fixed table keyed on [`RelationshipKind`]; the others are
//! dropped with a warning.

use std::fmt::Write as _;

use log::warn;

use expositor_core::class_model::{ClassDiagram, ClassModel, Relationship, RelationshipKind};

/// Graph label used when the diagram has no classes.
pub const EMPTY_LABEL: &str = "No class information parsed from LLM output.";

const LINE_BREAK: &str = "<BR ALIGN=\"LEFT\"/>";

/// Arrow and line style for one relationship kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeStyle {
    pub arrowhead: &'static str,
    pub line: &'static str,
    /// Label drawn regardless of the relationship's own label.
    pub fixed_label: Option<&'static str>,
}

/// The emitter's lookup table.
pub fn edge_style(kind: RelationshipKind) -> EdgeStyle {
    match kind {
        RelationshipKind::Inheritance => EdgeStyle {
            arrowhead: "empty",
            line: "solid",
            fixed_label: None,
        },
        RelationshipKind::Composition => EdgeStyle {
            arrowhead: "diamond",
            line: "solid",
            fixed_label: Some("owns"),
        },
        RelationshipKind::Aggregation => EdgeStyle {
            arrowhead: "odiamond",
            line: "solid",
            fixed_label: Some("has a"),
        },
        RelationshipKind::Association => EdgeStyle {
            arrowhead: "open",
            line: "solid",
            fixed_label: None,
        },
        RelationshipKind::Dependency => EdgeStyle {
            arrowhead: "open",
            line: "dashed",
            fixed_label: None,
        },
    }
}

/// The emitted graph and what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub dot: String,
    pub nodes: usize,
    pub edges: usize,
    /// Relationships left out because an endpoint is not a declared class.
    pub dropped: Vec<Relationship>,
}

/// Emit `diagram` as a DOT digraph.
pub fn emit(diagram: &ClassDiagram) -> Emission {
    let mut dot = String::from(
        "digraph UMLClassDiagram {\n  rankdir=TB;\n  graph [concentrate=true];\n  node [shape=none, margin=0, fontname=\"Helvetica\"];\n  edge [fontname=\"Helvetica\", fontsize=10];\n\n",
    );

    if diagram.is_empty() {
        let _ = writeln!(dot, "  label=\"{EMPTY_LABEL}\";\n  fontsize=16;");
        dot.push('}');
        return Emission {
            dot,
            nodes: 0,
            edges: 0,
            dropped: diagram.relationships().to_vec(),
        };
    }

    for class in diagram.classes() {
        let _ = writeln!(dot, "  {} [label={}];", node_id(class.name()), node_label(class));
    }
    dot.push('\n');

    let mut edges = 0;
    let mut dropped = Vec::new();
    for relationship in diagram.relationships() {
        if !diagram.is_resolved(relationship) {
            warn!(
                source = relationship.source(),
                target = relationship.target(),
                kind = relationship.kind().as_str();
                "Skipping relationship with an undeclared endpoint"
            );
            dropped.push(relationship.clone());
            continue;
        }
        let _ = writeln!(
            dot,
            "  {} -> {} [{}];",
            node_id(relationship.source()),
            node_id(relationship.target()),
            edge_attributes(relationship)
        );
        edges += 1;
    }
    dot.push('}');

    Emission {
        dot,
        nodes: diagram.class_count(),
        edges,
        dropped,
    }
}

fn node_id(class: &str) -> String {
    format!("\"{}_Node\"", class.replace('\\', "\\\\").replace('"', "\\\""))
}

fn node_label(class: &ClassModel) -> String {
    format!(
        "<\n    <TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"5\">\n      <TR><TD BGCOLOR=\"lightblue\" ALIGN=\"CENTER\"><B>{}</B></TD></TR>\n      <TR><TD ALIGN=\"LEFT\" VALIGN=\"TOP\">{}</TD></TR>\n      <TR><TD ALIGN=\"LEFT\" VALIGN=\"TOP\">{}</TD></TR>\n    </TABLE>>",
        escape_html(class.name()),
        member_cell(class.attributes(), "No attributes"),
        member_cell(class.methods(), "No methods"),
    )
}

fn member_cell(members: &[String], empty: &str) -> String {
    if members.is_empty() {
        return format!("<I>{empty}</I>");
    }
    let lines: Vec<String> = members.iter().map(|m| escape_html(m)).collect();
    // A trailing break left-aligns the last line as well.
    format!("{}{LINE_BREAK}", lines.join(LINE_BREAK))
}

fn edge_attributes(relationship: &Relationship) -> String {
    let style = edge_style(relationship.kind());
    let mut attrs = format!("arrowhead={}, style={}", style.arrowhead, style.line);
    if let Some(label) = style.fixed_label.or(relationship.label()) {
        let _ = write!(attrs, ", label=\"{}\"", escape_html(label));
    }
    attrs
}

/// Escape text for use inside HTML-like DOT labels and quoted strings.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

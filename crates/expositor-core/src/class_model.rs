//! In-memory class diagram model.
//!
//! A [`ClassDiagram`] is produced by one parse of the structured class
//! notation. Classes keep their insertion order so that emitted diagrams
//! have a stable layout. Relationships are kept exactly as parsed, even when
//! they reference classes that were never declared; such edges are filtered
//! out at emission time through [`ClassDiagram::resolved_relationships`].

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single class with its member declarations.
///
/// Members are plain strings (visibility, name and type as written).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassModel {
    name: String,
    attributes: Vec<String>,
    methods: Vec<String>,
}

impl ClassModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn push_attribute(&mut self, line: impl Into<String>) {
        self.attributes.push(line.into());
    }

    pub fn push_method(&mut self, line: impl Into<String>) {
        self.methods.push(line.into());
    }
}

/// The kind of a relationship between two classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Inheritance,
    Aggregation,
    Composition,
    Association,
    Dependency,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 5] = [
        RelationshipKind::Inheritance,
        RelationshipKind::Aggregation,
        RelationshipKind::Composition,
        RelationshipKind::Association,
        RelationshipKind::Dependency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Inheritance => "inheritance",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Composition => "composition",
            RelationshipKind::Association => "association",
            RelationshipKind::Dependency => "dependency",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown relationship kind `{0}`")]
pub struct UnknownRelationshipKind(pub String);

impl FromStr for RelationshipKind {
    type Err = UnknownRelationshipKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRelationshipKind(s.to_string()))
    }
}

/// A directed edge between two classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    source: String,
    target: String,
    kind: RelationshipKind,
    label: Option<String>,
}

impl Relationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationshipKind,
        label: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            label: label.filter(|l| !l.is_empty()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Classes keyed by name in insertion order, plus every parsed relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassDiagram {
    classes: IndexMap<String, ClassModel>,
    relationships: Vec<Relationship>,
}

impl ClassDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the class named `name`, creating an empty one if it is new.
    pub fn class_entry(&mut self, name: &str) -> &mut ClassModel {
        self.classes
            .entry(name.to_string())
            .or_insert_with(|| ClassModel::new(name))
    }

    pub fn class(&self, name: &str) -> Option<&ClassModel> {
        self.classes.get(name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut ClassModel> {
        self.classes.get_mut(name)
    }

    /// Iterate over classes in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.values()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn push_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    /// All relationships as parsed, including dangling ones.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Returns `true` if both endpoints of `relationship` are declared classes.
    pub fn is_resolved(&self, relationship: &Relationship) -> bool {
        self.contains(relationship.source()) && self.contains(relationship.target())
    }

    pub fn resolved_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(|r| self.is_resolved(r))
    }

    pub fn dangling_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(|r| !self.is_resolved(r))
    }

    /// Write the diagram back out in the structured class notation.
    ///
    /// Only resolved relationships are written, so the output describes the
    /// same diagram an emitter would draw.
    pub fn to_notation(&self) -> String {
        let mut out = String::new();

        for class in self.classes() {
            out.push_str(&format!("CLASS: {}\n", class.name()));
            out.push_str("ATTRIBUTES:\n");
            if class.attributes().is_empty() {
                out.push_str("(No attributes)\n");
            }
            for attribute in class.attributes() {
                out.push_str(attribute);
                out.push('\n');
            }
            out.push_str("METHODS:\n");
            if class.methods().is_empty() {
                out.push_str("(No methods)\n");
            }
            for method in class.methods() {
                out.push_str(method);
                out.push('\n');
            }
            out.push_str("---\n");
        }

        let mut resolved = self.resolved_relationships().peekable();
        if resolved.peek().is_none() {
            out.push_str("RELATIONSHIP: None\n");
        }
        for relationship in resolved {
            out.push_str(&format!(
                "RELATIONSHIP: {} -> {} [type={}",
                relationship.source(),
                relationship.target(),
                relationship.kind()
            ));
            if let Some(label) = relationship.label() {
                out.push_str(&format!(", label=\"{label}\""));
            }
            out.push_str("]\n");
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassDiagram {
        let mut diagram = ClassDiagram::new();
        diagram.class_entry("Order").push_attribute("-id: u64");
        diagram.class_entry("Order").push_method("+total(): f64");
        diagram.class_entry("Customer");
        diagram.push_relationship(Relationship::new(
            "Customer",
            "Order",
            RelationshipKind::Aggregation,
            None,
        ));
        diagram.push_relationship(Relationship::new(
            "Order",
            "Invoice",
            RelationshipKind::Dependency,
            Some("bills".to_string()),
        ));
        diagram
    }

    #[test]
    fn test_class_entry_preserves_order() {
        let diagram = sample();
        let names: Vec<_> = diagram.classes().map(ClassModel::name).collect();

        assert_eq!(names, ["Order", "Customer"]);
        assert_eq!(diagram.class("Order").unwrap().attributes(), ["-id: u64"]);
    }

    #[test]
    fn test_dangling_relationships() {
        let diagram = sample();

        assert_eq!(diagram.relationships().len(), 2);
        assert_eq!(diagram.resolved_relationships().count(), 1);
        let dangling: Vec<_> = diagram.dangling_relationships().collect();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target(), "Invoice");
    }

    #[test]
    fn test_relationship_kind_case_insensitive() {
        assert_eq!(
            "Composition".parse::<RelationshipKind>(),
            Ok(RelationshipKind::Composition)
        );
        assert_eq!(
            " DEPENDENCY ".parse::<RelationshipKind>(),
            Ok(RelationshipKind::Dependency)
        );
        assert!("realization".parse::<RelationshipKind>().is_err());
    }

    #[test]
    fn test_empty_label_is_none() {
        let rel = Relationship::new("A", "B", RelationshipKind::Association, Some(String::new()));
        assert!(rel.label().is_none());
    }

    #[test]
    fn test_to_notation() {
        let notation = sample().to_notation();

        assert!(notation.starts_with("CLASS: Order\nATTRIBUTES:\n-id: u64\nMETHODS:\n+total(): f64\n---\n"));
        assert!(notation.contains("CLASS: Customer\nATTRIBUTES:\n(No attributes)\nMETHODS:\n(No methods)\n---\n"));
        assert!(notation.ends_with("RELATIONSHIP: Customer -> Order [type=aggregation]\n"));
        assert!(!notation.contains("Invoice"));
    }

    #[test]
    fn test_to_notation_without_relationships() {
        let mut diagram = ClassDiagram::new();
        diagram.class_entry("Solo");

        assert!(diagram.to_notation().ends_with("RELATIONSHIP: None\n"));
    }
}

//! Integration tests for the structured class notation parser.

use expositor_core::class_model::{ClassDiagram, Relationship, RelationshipKind};
use expositor_parser::{class_notation::parse, error::ErrorCode};
use proptest::prelude::*;

#[test]
fn test_two_classes_one_association() {
    let text = "CLASS: A\nATTRIBUTES:\n+x: int\nMETHODS:\n+get(): int\n---\nCLASS: B\nMETHODS:\n(No methods for this class)\n---\nRELATIONSHIP: A -> B [type=association, label=\"uses\"]";

    let parsed = parse(text).unwrap();
    let diagram = &parsed.diagram;

    assert_eq!(diagram.class_count(), 2);
    let a = diagram.class("A").unwrap();
    assert_eq!(a.attributes(), ["+x: int"]);
    assert_eq!(a.methods(), ["+get(): int"]);
    let b = diagram.class("B").unwrap();
    assert!(b.methods().is_empty());

    assert_eq!(diagram.relationships().len(), 1);
    let rel = &diagram.relationships()[0];
    assert_eq!((rel.source(), rel.target()), ("A", "B"));
    assert_eq!(rel.kind(), RelationshipKind::Association);
    assert_eq!(rel.label(), Some("uses"));
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_relationship_to_undeclared_class_is_kept() {
    let parsed = parse("CLASS: A\n---\nRELATIONSHIP: A -> Z [type=inheritance]").unwrap();

    assert_eq!(parsed.diagram.relationships().len(), 1);
    assert_eq!(parsed.diagram.dangling_relationships().count(), 1);
}

#[test]
fn test_typical_model_answer() {
    let text = r#"Based on the analysis, here is the class structure:

**CLASS:** User
**ATTRIBUTES:**
- userId: int
+ username: String
**METHODS:**
+ getProfile(): Profile
---
**CLASS:** Profile
ATTRIBUTES:
+ email: String
METHODS:
(No methods for this class)
---
RELATIONSHIP: User -> Profile [type=association, label="has profile"]
RELATIONSHIP: None

I hope this helps!"#;

    let parsed = parse(text).unwrap();
    let names: Vec<_> = parsed.diagram.classes().map(|c| c.name()).collect();

    assert_eq!(names, ["User", "Profile"]);
    assert_eq!(
        parsed.diagram.class("User").unwrap().attributes(),
        ["- userId: int", "+ username: String"]
    );
    assert_eq!(parsed.diagram.resolved_relationships().count(), 1);
}

#[test]
fn test_prose_only_fails() {
    let err = parse("I could not find any classes in this code.").unwrap_err();

    assert!(err.has_code(ErrorCode::E100));
    assert!(err.to_string().starts_with("error[E100]"));
}

fn member() -> impl Strategy<Value = String> {
    ("[+#-]", "[a-z][a-zA-Z0-9]{0,6}", "[A-Z][a-z]{0,5}")
        .prop_map(|(vis, name, ty)| format!("{vis}{name}: {ty}"))
}

fn method() -> impl Strategy<Value = String> {
    ("[+#-]", "[a-z][a-zA-Z0-9]{0,6}", "[A-Z][a-z]{0,5}")
        .prop_map(|(vis, name, ty)| format!("{vis}{name}(): {ty}"))
}

fn kind() -> impl Strategy<Value = RelationshipKind> {
    prop::sample::select(RelationshipKind::ALL.to_vec())
}

fn class_diagram() -> impl Strategy<Value = ClassDiagram> {
    let classes = prop::collection::btree_map(
        "[A-Z][a-zA-Z0-9_]{0,8}",
        (
            prop::collection::vec(member(), 0..4),
            prop::collection::vec(method(), 0..4),
        ),
        1..6,
    );

    classes.prop_flat_map(|classes| {
        let count = classes.len();
        let relationships = prop::collection::vec(
            (0..count, 0..count, kind(), prop::option::of("[a-z][a-z ]{0,10}[a-z]")),
            0..6,
        );
        (Just(classes), relationships)
    })
    .prop_map(|(classes, relationships)| {
        let names: Vec<String> = classes.keys().cloned().collect();
        let mut diagram = ClassDiagram::new();
        for (name, (attributes, methods)) in classes {
            let class = diagram.class_entry(&name);
            for attribute in attributes {
                class.push_attribute(attribute);
            }
            for method in methods {
                class.push_method(method);
            }
        }
        for (source, target, kind, label) in relationships {
            diagram.push_relationship(Relationship::new(
                names[source].clone(),
                names[target].clone(),
                kind,
                label,
            ));
        }
        diagram
    })
}

proptest! {
    #[test]
    fn reparsing_notation_is_idempotent(diagram in class_diagram()) {
        let notation = diagram.to_notation();

        let parsed = parse(&notation).unwrap();

        prop_assert!(parsed.warnings.is_empty());
        prop_assert_eq!(&parsed.diagram, &diagram);
        prop_assert_eq!(parsed.diagram.to_notation(), notation);
    }
}

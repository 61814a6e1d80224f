//! Parser for the structured class notation.
//!
//! The notation is line oriented:
//!
//! ```text
//! CLASS: Order
//! ATTRIBUTES:
//! -id: u64
//! METHODS:
//! +total(): f64
//! ---
//! RELATIONSHIP: Customer -> Order [type=aggregation, label="places"]
//! ```
//!
//! Keywords are case-insensitive and may be wrapped in `**` or `__` emphasis.
//! Each line is classified on its own with small winnow parsers; a single
//! forward pass then feeds the classified lines through a two-variable state
//! machine (current class, current section). Separators and fence lines end
//! the active class block. Lines that fit nowhere are ignored so that
//! commentary around the notation does not break the parse.

use expositor_core::class_model::{ClassDiagram, Relationship, RelationshipKind};
use log::debug;
use winnow::{
    Parser as _,
    combinator::{alt, opt, preceded},
    error::{ContextError, ErrMode},
    token::take_while,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// Member lines starting with one of these (ignoring case) are placeholders.
const PLACEHOLDER_PREFIXES: [&str; 2] = ["(no ", "omitted"];

/// The result of a successful parse.
#[derive(Debug, Clone)]
pub struct ParsedClasses {
    pub diagram: ClassDiagram,
    /// Lines that were recognized as notation but could not be used.
    pub warnings: Vec<Diagnostic>,
}

/// A relationship line before its kind has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRelationship<'a> {
    source: &'a str,
    target: &'a str,
    kind: &'a str,
    label: Option<&'a str>,
}

/// One classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    ClassHeader(&'a str),
    AttributesHeader(Option<&'a str>),
    MethodsHeader(Option<&'a str>),
    Relationship(RawRelationship<'a>),
    NoRelationships,
    MalformedRelationship,
    Separator,
    Fence,
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Attributes,
    Methods,
}

/// Parse the class notation into a [`ClassDiagram`].
///
/// Fails with `E100` when no class header is found. Skipped relationship and
/// header lines are returned as warnings.
pub fn parse(text: &str) -> Result<ParsedClasses, ParseError> {
    let mut diagram = ClassDiagram::new();
    let mut diagnostics = DiagnosticCollector::new();
    let mut current: Option<String> = None;
    let mut section = Section::None;
    // Where the active class was declared, or where the last block was closed.
    let mut header: Option<Span> = None;
    let mut closed_at: Option<Span> = None;

    for (offset, raw_line) in lines_with_offsets(text) {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let span = Span::new(offset..offset + raw_line.len());

        match classify(line) {
            Line::ClassHeader(name) => {
                diagram.class_entry(name);
                current = Some(name.to_string());
                section = Section::None;
                header = Some(span);
            }
            Line::AttributesHeader(_) | Line::MethodsHeader(_) if current.is_none() => {
                let diag = Diagnostic::warning(format!("`{line}` appears outside a class block"))
                    .with_code(ErrorCode::E103)
                    .with_label(span, "no active class")
                    .with_help("section headers must follow a `CLASS:` line");
                diagnostics.emit(with_context(diag, closed_at, "previous class block ended here"));
            }
            Line::AttributesHeader(inline) => {
                section = Section::Attributes;
                push_member(&mut diagram, current.as_deref(), section, inline);
            }
            Line::MethodsHeader(inline) => {
                section = Section::Methods;
                push_member(&mut diagram, current.as_deref(), section, inline);
            }
            Line::Relationship(raw) => {
                section = Section::None;
                match raw.kind.parse::<RelationshipKind>() {
                    Ok(kind) => diagram.push_relationship(Relationship::new(
                        raw.source,
                        raw.target,
                        kind,
                        raw.label.map(str::to_string),
                    )),
                    Err(err) => {
                        let diag = Diagnostic::warning(err.to_string())
                            .with_code(ErrorCode::E101)
                            .with_label(span, "relationship skipped")
                            .with_help(
                                "use one of: inheritance, aggregation, composition, association, dependency",
                            );
                        diagnostics.emit(with_context(diag, header, "in this class block"));
                    }
                }
            }
            Line::NoRelationships => section = Section::None,
            Line::MalformedRelationship => {
                section = Section::None;
                let diag = Diagnostic::warning("malformed relationship line")
                    .with_code(ErrorCode::E102)
                    .with_label(span, "expected `Source -> Target [type=kind, label=\"text\"]`")
                    .with_help("the line was skipped");
                diagnostics.emit(with_context(diag, header, "in this class block"));
            }
            Line::Separator | Line::Fence => {
                if current.take().is_some() {
                    closed_at = Some(span);
                }
                header = None;
                section = Section::None;
            }
            Line::Text(member) => push_member(&mut diagram, current.as_deref(), section, Some(member)),
        }
    }

    if diagram.is_empty() {
        diagnostics.emit(
            Diagnostic::error("no class declarations found")
                .with_code(ErrorCode::E100)
                .with_label(Span::new(0..text.len()), "parsed text")
                .with_help("each class block must start with a `CLASS: Name` line"),
        );
    }

    let warnings = diagnostics.finish()?;

    debug!(
        classes = diagram.class_count(),
        relationships = diagram.relationships().len(),
        warnings = warnings.len();
        "Parsed class notation"
    );

    Ok(ParsedClasses { diagram, warnings })
}

/// Attach a secondary label pointing at the surrounding block, when known.
fn with_context(diag: Diagnostic, span: Option<Span>, message: &str) -> Diagnostic {
    match span {
        Some(span) => diag.with_secondary_label(span, message),
        None => diag,
    }
}

fn push_member(diagram: &mut ClassDiagram, class: Option<&str>, section: Section, line: Option<&str>) {
    let (Some(class), Some(line)) = (class, line.map(str::trim)) else {
        return;
    };
    if line.is_empty() || is_placeholder(line) {
        return;
    }
    let Some(model) = diagram.class_mut(class) else {
        return;
    };
    match section {
        Section::Attributes => model.push_attribute(line),
        Section::Methods => model.push_method(line),
        Section::None => {}
    }
}

fn is_placeholder(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower == "none" || PLACEHOLDER_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn classify(line: &str) -> Line<'_> {
    if line.starts_with("```") {
        return Line::Fence;
    }
    if line.starts_with("---") {
        return Line::Separator;
    }

    let mut input = line;
    if let Ok(name) = class_header(&mut input) {
        return Line::ClassHeader(name);
    }

    let mut input = line;
    if keyword(&mut input, "attributes").is_ok() {
        return Line::AttributesHeader(non_empty(input));
    }

    let mut input = line;
    if keyword(&mut input, "methods").is_ok() {
        return Line::MethodsHeader(non_empty(input));
    }

    let mut input = line;
    if keyword(&mut input, "relationship").is_ok() {
        let rest = input;
        return match relationship_body(&mut input) {
            Ok(raw) => Line::Relationship(raw),
            Err(_) if starts_with_none(rest) => Line::NoRelationships,
            Err(_) => Line::MalformedRelationship,
        };
    }

    Line::Text(line)
}

/// Returns `true` if the first line of `text` is a `CLASS:` or
/// `RELATIONSHIP:` header.
pub fn is_block_start(text: &str) -> bool {
    let line = text.lines().next().unwrap_or_default().trim();
    let mut input = line;
    if keyword(&mut input, "class").is_ok() {
        return true;
    }
    let mut input = line;
    keyword(&mut input, "relationship").is_ok()
}

fn non_empty(rest: &str) -> Option<&str> {
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

fn starts_with_none(rest: &str) -> bool {
    let rest = rest.trim_start_matches(['*', '_', ' ', '\t']);
    rest.get(..4).is_some_and(|w| w.eq_ignore_ascii_case("none"))
        && !rest[4..].starts_with(|c: char| c.is_alphanumeric() || c == '_')
}

/// Optional `**` or `__` emphasis marker.
fn emphasis(input: &mut &str) -> IResult<()> {
    opt(alt(("**", "__"))).void().parse_next(input)
}

fn blanks<'a>(input: &mut &'a str) -> IResult<&'a str> {
    take_while(0.., |c: char| c == ' ' || c == '\t').parse_next(input)
}

/// A case-insensitive word, as in `**CLASS:**`, `CLASS**:` or `class:`.
fn keyword(input: &mut &str, word: &str) -> IResult<()> {
    emphasis.parse_next(input)?;
    take_while(1.., |c: char| c.is_ascii_alphabetic())
        .verify(|w: &str| w.eq_ignore_ascii_case(word))
        .void()
        .parse_next(input)?;
    emphasis.parse_next(input)?;
    ':'.void().parse_next(input)?;
    emphasis.parse_next(input)?;
    blanks.void().parse_next(input)
}

/// A class or identifier name: a letter or underscore, then word characters or dots.
fn identifier<'a>(input: &mut &'a str) -> IResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '.')
        .verify(|name: &str| name.starts_with(|c: char| c.is_alphabetic() || c == '_'))
        .parse_next(input)
}

fn class_header<'a>(input: &mut &'a str) -> IResult<&'a str> {
    keyword(input, "class")?;
    emphasis.parse_next(input)?;
    identifier.parse_next(input)
}

/// `Source -> Target [type=kind, label="text"]`, after the keyword.
fn relationship_body<'a>(input: &mut &'a str) -> IResult<RawRelationship<'a>> {
    let source = identifier.parse_next(input)?;
    (blanks, "->", blanks).void().parse_next(input)?;
    let target = identifier.parse_next(input)?;
    (blanks, '[', blanks).void().parse_next(input)?;
    assignment_key(input, "type")?;
    let kind = take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)?;
    blanks.parse_next(input)?;
    let label = opt(preceded((',', blanks), label_assignment)).parse_next(input)?;
    (blanks, ']').void().parse_next(input)?;

    Ok(RawRelationship {
        source,
        target,
        kind,
        label,
    })
}

/// `key =` with the key matched case-insensitively.
fn assignment_key(input: &mut &str, key: &str) -> IResult<()> {
    take_while(1.., |c: char| c.is_ascii_alphabetic())
        .verify(|k: &str| k.eq_ignore_ascii_case(key))
        .void()
        .parse_next(input)?;
    (blanks, '=', blanks).void().parse_next(input)
}

fn label_assignment<'a>(input: &mut &'a str) -> IResult<&'a str> {
    assignment_key(input, "label")?;
    label_value(input)
}

/// A quoted label runs to the first `"]`; an unquoted one to the first `]`.
fn label_value<'a>(input: &mut &'a str) -> IResult<&'a str> {
    if let Some(quoted) = input.strip_prefix('"') {
        let end = quoted
            .find("\"]")
            .ok_or_else(|| ErrMode::Backtrack(ContextError::new()))?;
        *input = &quoted[end + 1..];
        return Ok(&quoted[..end]);
    }
    take_while(0.., |c: char| c != ']')
        .map(str::trim)
        .parse_next(input)
}

fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |segment| {
        let start = offset;
        offset += segment.len();
        (start, segment.trim_end_matches(['\n', '\r']))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_class_header_variants() {
        assert_eq!(classify("CLASS: Order"), Line::ClassHeader("Order"));
        assert_eq!(classify("**CLASS:** Order"), Line::ClassHeader("Order"));
        assert_eq!(classify("**Class**: Order"), Line::ClassHeader("Order"));
        assert_eq!(classify("class: pkg.Order extends Base"), Line::ClassHeader("pkg.Order"));
        assert_eq!(classify("CLASS: 9Lives"), Line::Text("CLASS: 9Lives"));
    }

    #[test]
    fn test_classify_section_headers() {
        assert_eq!(classify("ATTRIBUTES:"), Line::AttributesHeader(None));
        assert_eq!(classify("__methods:__"), Line::MethodsHeader(None));
        assert_eq!(
            classify("Attributes: +id: u64"),
            Line::AttributesHeader(Some("+id: u64"))
        );
    }

    #[test]
    fn test_classify_relationship() {
        assert_eq!(
            classify(r#"RELATIONSHIP: A -> B [type=association, label="uses"]"#),
            Line::Relationship(RawRelationship {
                source: "A",
                target: "B",
                kind: "association",
                label: Some("uses"),
            })
        );
        assert_eq!(
            classify("**Relationship:** A->B [TYPE = Inheritance]"),
            Line::Relationship(RawRelationship {
                source: "A",
                target: "B",
                kind: "Inheritance",
                label: None,
            })
        );
    }

    #[test]
    fn test_classify_relationship_label_with_bracket() {
        assert_eq!(
            classify(r#"RELATIONSHIP: A -> B [type=dependency, label="reads [cfg]"]"#),
            Line::Relationship(RawRelationship {
                source: "A",
                target: "B",
                kind: "dependency",
                label: Some("reads [cfg]"),
            })
        );
    }

    #[test]
    fn test_classify_relationship_none_and_malformed() {
        assert_eq!(classify("RELATIONSHIP: None"), Line::NoRelationships);
        assert_eq!(classify("**RELATIONSHIP:** none."), Line::NoRelationships);
        assert_eq!(classify("RELATIONSHIP: A -> [type=x]"), Line::MalformedRelationship);
        assert_eq!(classify("RELATIONSHIP: Nonexistent -> B"), Line::MalformedRelationship);
        assert!(matches!(
            classify("RELATIONSHIP: None -> B [type=dependency]"),
            Line::Relationship(RawRelationship { source: "None", .. })
        ));
    }

    #[test]
    fn test_classify_separator_and_fence() {
        assert_eq!(classify("---"), Line::Separator);
        assert_eq!(classify("-----"), Line::Separator);
        assert_eq!(classify("```text"), Line::Fence);
        assert_eq!(classify("+ name: String"), Line::Text("+ name: String"));
    }

    #[test]
    fn test_placeholder_lines_skipped() {
        let parsed = parse("CLASS: A\nATTRIBUTES:\n(No attributes for this class)\nMETHODS:\nomitted for brevity\n+run()")
            .unwrap();
        let class = parsed.diagram.class("A").unwrap();

        assert!(class.attributes().is_empty());
        assert_eq!(class.methods(), ["+run()"]);
    }

    #[test]
    fn test_members_without_section_are_ignored() {
        let parsed = parse("CLASS: A\n+orphan: i32\nATTRIBUTES:\n+kept: i32").unwrap();

        assert_eq!(parsed.diagram.class("A").unwrap().attributes(), ["+kept: i32"]);
    }

    #[test]
    fn test_separator_stops_member_attribution() {
        let parsed = parse("CLASS: A\nMETHODS:\n+a()\n---\n+stray()\nCLASS: B\nMETHODS:\n+b()").unwrap();

        assert_eq!(parsed.diagram.class("A").unwrap().methods(), ["+a()"]);
        assert_eq!(parsed.diagram.class("B").unwrap().methods(), ["+b()"]);
    }

    #[test]
    fn test_relationship_resets_section_but_not_class() {
        let parsed = parse(
            "CLASS: A\nMETHODS:\n+a()\nRELATIONSHIP: A -> A [type=dependency]\n+after()\nMETHODS:\n+b()",
        )
        .unwrap();

        assert_eq!(parsed.diagram.class("A").unwrap().methods(), ["+a()", "+b()"]);
        assert_eq!(parsed.diagram.relationships().len(), 1);
    }

    #[test]
    fn test_repeated_class_header_appends() {
        let parsed = parse("CLASS: A\nMETHODS:\n+a()\n---\nCLASS: A\nMETHODS:\n+b()").unwrap();

        assert_eq!(parsed.diagram.class_count(), 1);
        assert_eq!(parsed.diagram.class("A").unwrap().methods(), ["+a()", "+b()"]);
    }

    #[test]
    fn test_malformed_relationship_is_not_a_member() {
        let parsed = parse("CLASS: A\nMETHODS:\nRELATIONSHIP: A -> \n+a()").unwrap();

        assert!(parsed.diagram.class("A").unwrap().methods().is_empty());
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].code(), Some(ErrorCode::E102));
    }

    #[test]
    fn test_unknown_relationship_kind_warns() {
        let parsed = parse("CLASS: A\n---\nCLASS: B\n---\nRELATIONSHIP: A -> B [type=realization]").unwrap();

        assert!(parsed.diagram.relationships().is_empty());
        assert_eq!(parsed.warnings[0].code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_section_header_outside_class_warns() {
        let parsed = parse("ATTRIBUTES:\n+x: i32\nCLASS: A").unwrap();

        assert!(parsed.diagram.class("A").unwrap().attributes().is_empty());
        assert_eq!(parsed.warnings[0].code(), Some(ErrorCode::E103));
    }

    #[test]
    fn test_no_classes_is_error() {
        let err = parse("The code has no classes.\nRELATIONSHIP: None").unwrap_err();

        assert!(err.has_code(ErrorCode::E100));
    }

    #[test]
    fn test_fenced_input_with_commentary() {
        let text = "Here is the structure:\n```\nCLASS: A\nATTRIBUTES:\n+x: int\n```\nLet me know!";
        let parsed = parse(text).unwrap();

        assert_eq!(parsed.diagram.class("A").unwrap().attributes(), ["+x: int"]);
    }

    #[test]
    fn test_warning_span_points_at_line() {
        let text = "CLASS: A\nRELATIONSHIP: broken";
        let parsed = parse(text).unwrap();
        let span = parsed.warnings[0].labels()[0].span();

        assert_eq!(&text[span.range()], "RELATIONSHIP: broken");
    }

    #[test]
    fn test_skipped_relationship_points_at_class_header() {
        let text = "CLASS: A\nMETHODS:\n+run()\nRELATIONSHIP: broken";
        let parsed = parse(text).unwrap();
        let labels = parsed.warnings[0].labels();

        assert_eq!(labels.len(), 2);
        assert!(labels[0].is_primary());
        assert!(!labels[1].is_primary());
        assert_eq!(&text[labels[1].span().range()], "CLASS: A");
        assert_eq!(labels[1].message(), "in this class block");
    }

    #[test]
    fn test_section_header_after_block_points_at_separator() {
        let text = "CLASS: A\n---\nMETHODS:\n+run()";
        let parsed = parse(text).unwrap();
        let labels = parsed.warnings[0].labels();

        assert_eq!(parsed.warnings[0].code(), Some(ErrorCode::E103));
        assert_eq!(labels.len(), 2);
        assert_eq!(&text[labels[1].span().range()], "---");
    }

    #[test]
    fn test_warning_outside_any_block_has_single_label() {
        let parsed = parse("RELATIONSHIP: broken\nCLASS: A").unwrap();

        assert_eq!(parsed.warnings[0].labels().len(), 1);
    }
}

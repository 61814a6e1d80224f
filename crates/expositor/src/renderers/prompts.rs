//! Prompt construction for the built-in renderers and manifest templates.

use std::fmt;

use expositor_core::request::RenderRequest;

/// Where a renderer's prompt comes from.
#[derive(Clone)]
pub enum Prompt {
    /// A built-in prompt builder.
    Builtin(fn(&RenderRequest) -> String),
    /// A manifest template with `{explanation}`, `{source}` and
    /// `{requirements}` placeholders.
    Template(String),
}

impl Prompt {
    pub fn build(&self, request: &RenderRequest) -> String {
        match self {
            Prompt::Builtin(build) => build(request),
            Prompt::Template(template) => fill_template(template, request),
        }
    }

    /// Whether the prompt reads the auxiliary requirements text.
    pub fn uses_requirements(&self) -> bool {
        match self {
            Prompt::Builtin(_) => false,
            Prompt::Template(template) => template.contains("{requirements}"),
        }
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Builtin(_) => f.write_str("Prompt::Builtin"),
            Prompt::Template(template) => f.debug_tuple("Prompt::Template").field(template).finish(),
        }
    }
}

/// Substitute the request's fields into `template`.
///
/// Substitution is a single pass, so placeholder-like text inside the
/// explanation or source is left alone.
pub fn fill_template(template: &str, request: &RenderRequest) -> String {
    let requirements = request.requirements().map(|r| r.text.as_str()).unwrap_or("");
    let mut out = String::with_capacity(template.len() + request.explanation().len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let replacement = [
            ("{explanation}", request.explanation()),
            ("{source}", request.source()),
            ("{requirements}", requirements),
        ]
        .into_iter()
        .find(|(placeholder, _)| tail.starts_with(placeholder));

        match replacement {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// The prompt for the base explanation every renderer starts from.
pub fn base_explanation(source: &str) -> String {
    format!(
        "Analyze the source code below in detail. It may contain several files joined \
together. Cover:
1. The overall purpose and main functionality.
2. The key components (functions, classes, modules) and the role of each.
3. How the components interact and the general execution flow.
4. The inputs the code expects and the outputs it produces.

--- Source Code ---
{}
--- End of Source Code ---

Detailed Explanation:
",
        source.trim_end()
    )
}

fn analysis(request: &RenderRequest) -> String {
    format!(
        "--- Code Analysis ---\n{}\n--- End of Code Analysis ---",
        request.explanation().trim()
    )
}

fn source(request: &RenderRequest) -> String {
    format!(
        "--- Source Code ---\n{}\n--- End of Source Code ---",
        request.source().trim_end()
    )
}

pub(crate) fn key_components(request: &RenderRequest) -> String {
    format!(
        "Using only the code analysis below, list the key components of the code \
(important classes, functions, modules or data structures).

{}

Give each component one short sentence describing its role. Answer with a \
bulleted list and nothing else.

Key Components:
",
        analysis(request)
    )
}

pub(crate) fn metaphor_analogy(request: &RenderRequest) -> String {
    format!(
        "Using the code analysis below, explain what the code does through a single \
creative metaphor or real-world analogy. Map each key component to a part of the \
analogy so a newcomer can follow how the pieces fit together.

{}

Metaphor or Analogy:
",
        analysis(request)
    )
}

pub(crate) fn edge_cases(request: &RenderRequest) -> String {
    format!(
        "You are writing test plans. Using the code analysis and the source code below, \
list the edge cases an automated test suite should cover. Consider:
- empty, missing or null inputs
- very large values and very long inputs
- special characters and unusual encodings
- loops that run zero times and off-by-one boundaries
- unusual orderings or repeated calls
- resource exhaustion, concurrent access and failing dependencies

For every edge case, say which part of the code it targets and why it matters.

{}

{}

Edge Cases:
",
        analysis(request),
        source(request)
    )
}

pub(crate) fn flowchart_text(request: &RenderRequest) -> String {
    format!(
        "Using the code analysis and the source code below, describe the main execution \
flow step by step in a plain-text flowchart notation:
- `Start` and `End` mark the boundaries
- `Process: <action>`, `Input: <data>`, `Output: <data>`
- `Decision: <condition>?` followed by indented `Yes ->` and `No ->` branches
- `Loop: <condition>` ... `End Loop`
- `Call: <function>` for important calls, `Sub-process: <name>` for grouped steps
- connect consecutive steps with `->`

Example:
Start -> Input: file path -> Process: read file -> Decision: file empty?
  Yes -> Output: warning -> End
  No -> Loop: for each line -> Process: parse line -> End Loop -> Output: summary -> End

{}

{}

Flowchart:
",
        analysis(request),
        source(request)
    )
}

pub(crate) fn code_rap(request: &RenderRequest) -> String {
    format!(
        "Using the code analysis and the source code below, write a rap song that explains \
what the code does, its purpose and its main features. Keep it informative, rhythmic \
and aimed at developers, and mention the components and actions that matter most.

{}

{}

Answer with the lyrics only: no title, no commentary, no markdown.
",
        analysis(request),
        source(request)
    )
}

pub(crate) fn functional_gap_analysis(request: &RenderRequest) -> String {
    let (path, text) = request
        .requirements()
        .map(|r| (r.path.as_str(), r.text.as_str()))
        .unwrap_or(("", ""));
    format!(
        "You are a software quality analyst performing a functional gap analysis. Compare \
the source code and its explanation against the functional requirements below and report:

1. Missing requirements: listed requirements the code does not implement.
2. Incorrect or incomplete implementations: requirements the code addresses in a flawed, \
partial or divergent way. Cite the relevant code as precisely as possible.

If a section has no findings, say so explicitly. Format the report in Markdown.

--- Functional Requirements ({path}) ---
{}
--- End of Functional Requirements ---

{}

{}
",
        text.trim(),
        analysis(request),
        source(request)
    )
}

fn dot_prompt(request: &RenderRequest, graph: &str, task: &str, example: &str) -> String {
    format!(
        "Using the code analysis and the source code below, {task}

{}

{}

Answer with the DOT code only, starting with `digraph {graph} {{` and ending with `}}`. \
No explanation, no markdown fences.

Example:
{example}

DOT:
",
        analysis(request),
        source(request)
    )
}

pub(crate) fn call_graph(request: &RenderRequest) -> String {
    dot_prompt(
        request,
        "CallGraph",
        "describe the call graph in the Graphviz DOT language.
- One node per important function or method, labelled with its name (or Type.method).
- An edge `caller -> callee;` for every significant call. Skip trivial or standard-library calls.
- Highlight entry points, for example with `shape=doublecircle`.",
        r#"digraph CallGraph {
  rankdir=LR;
  node [shape=box, style="rounded,filled", fillcolor=lightblue];
  "main" [label="main()", shape=doublecircle, fillcolor=palegreen];
  "load" [label="load(path)"];
  "parse" [label="parse(text)"];
  "main" -> "load";
  "load" -> "parse";
}"#,
    )
}

pub(crate) fn dependency_graph(request: &RenderRequest) -> String {
    dot_prompt(
        request,
        "Dependencies",
        "describe the dependency graph in the Graphviz DOT language.
- One node per significant module, file, class or major function.
- An edge `A -> B;` when A imports, calls or otherwise depends on B.
- Keep only the dependencies that matter for understanding the code.",
        r#"digraph Dependencies {
  rankdir=LR;
  node [shape=box, style="rounded,filled", fillcolor=lightblue];
  "App" [label="Application"];
  "Store" [label="Storage Layer"];
  "Util" [label="Utilities"];
  "App" -> "Store";
  "App" -> "Util";
  "Store" -> "Util";
}"#,
    )
}

pub(crate) fn flowchart_graphical(request: &RenderRequest) -> String {
    dot_prompt(
        request,
        "G",
        "draw the main execution flow as a flowchart in the Graphviz DOT language.
- Use meaningful node ids such as `start`, `read_input`, `check_valid`, `end`.
- Decisions use `shape=diamond` and their outgoing edges carry `label=\"Yes\"` / `label=\"No\"`.
- Keep node labels short.",
        r#"digraph G {
  rankdir=TB;
  node [shape=box, style=rounded];
  start [label="Start", shape=ellipse];
  read_input [label="Read input"];
  check_valid [label="Valid?", shape=diamond];
  process [label="Process data"];
  report [label="Report error"];
  end [label="End", shape=ellipse];
  start -> read_input -> check_valid;
  check_valid -> process [label="Yes"];
  check_valid -> report [label="No"];
  process -> end;
  report -> end;
}"#,
    )
}

fn mermaid_prompt(request: &RenderRequest, task: &str, start: &str, guide: &str) -> String {
    format!(
        "Using the code analysis and the source code below, {task}

{}

{}

Answer with the Mermaid code only, starting with {start}. No explanation, no \
markdown fences.

Syntax reminders:
{guide}
",
        analysis(request),
        source(request)
    )
}

pub(crate) fn sequence_diagram(request: &RenderRequest) -> String {
    mermaid_prompt(
        request,
        "draw a Mermaid sequence diagram of the most important interaction between \
the main components. Show activations and use loop, alt or opt blocks where they \
are central to the flow.",
        "`sequenceDiagram`",
        "- participants: `participant Api` or `actor User`
- calls: `A->>B: request()`, replies: `B-->>A: result`
- `activate B` / `deactivate B`, notes: `Note right of B: text`
- blocks: `loop ...`, `alt ...` / `else ...`, `opt ...`, each closed with `end`",
    )
}

pub(crate) fn activity_diagram(request: &RenderRequest) -> String {
    mermaid_prompt(
        request,
        "draw a UML activity diagram of the main operation as a Mermaid flowchart. Show \
activities, decisions and parallel paths.",
        "`graph TD` or `graph LR`",
        "- start and end nodes: `S([Start])`, `E([End])`
- activities: `step1[\"Read the file\"]`
- decisions: `check{\"Is it valid?\"}` with `check -- Yes --> next`
- arrows: `A --> B`, labelled: `A -- \"label\" --> B`
- quote any text containing spaces or punctuation; avoid exotic syntax",
    )
}

pub(crate) fn architecture_diagram(request: &RenderRequest) -> String {
    mermaid_prompt(
        request,
        "draw a high-level architecture diagram as a Mermaid graph. Show the major \
components (services, modules, layers, stores, external APIs) and the main \
relationships or data flows between them.",
        "`graph TD` or `graph LR`",
        "- nodes: `api[\"API Gateway\"]`, `db[(\"Database\")]`
- arrows: `A --> B`, labelled: `A -- \"calls\" --> B`
- group related nodes with `subgraph \"Backend\"` ... `end`
- quote any label containing spaces or punctuation",
    )
}

pub(crate) fn uml_class_diagram(request: &RenderRequest) -> String {
    format!(
        "Using the code analysis and the source code below, describe the classes (or \
structs, or modules acting as classes) and their relationships in the exact format \
shown. Do not write anything else.

For each class:
CLASS: ClassName
ATTRIBUTES:
+publicAttribute: Type
-privateAttribute: Type
METHODS:
+publicMethod(param: Type): ReturnType
---

Write `(No attributes for this class)` or `(No methods for this class)` for an empty \
section. After all classes, list one relationship per line:
RELATIONSHIP: SourceClass -> TargetClass [type=<kind>, label=\"optional label\"]

where <kind> is one of inheritance, aggregation, composition, association or \
dependency. Only refer to classes declared above. If there are no relationships, write \
`RELATIONSHIP: None`.

Example:
CLASS: Shape
ATTRIBUTES:
#name: String
METHODS:
+area(): f64
---
CLASS: Circle
ATTRIBUTES:
-radius: f64
METHODS:
+area(): f64
---
RELATIONSHIP: Circle -> Shape [type=inheritance]

{}

{}
",
        analysis(request),
        source(request)
    )
}

//! Math formula detection and rendering hooks.
//!
//! Formulas are typed inline in outline items with TeX delimiters (`$$...$$`
//! for display math, `$...$` inline) or as AsciiMath between backticks.
//! Typesetting itself belongs to an external engine; this module finds the
//! formulas, converts AsciiMath through a pluggable [`AsciiMathConverter`],
//! and marks formulas up for a [`MathEngine`].

use std::sync::LazyLock;

use regex::Regex;

use crate::host::HostContract;
use crate::markdown::escape_html;
use crate::parse::{Document, Element};

static LATEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\$(\$)?(.+?)\$(\$)?").unwrap());
// a run of backticks is a code fence, not an empty formula
static ASCIIMATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Class added to a structural container whose content holds a formula.
pub const MATH_CLASS: &str = "has-latex";
/// Class of the block holding a node's typeset formulas.
pub const RENDERED_MATH_CLASS: &str = "rendered-latex";

/// AsciiMath spellings and their TeX commands. Longer spellings sharing a
/// prefix come first.
const ASCIIMATH_SYMBOLS: &[(&str, &str)] = &[
    ("<=>", "\\Leftrightarrow"),
    ("->", "\\to"),
    ("=>", "\\Rightarrow"),
    ("!=", "\\ne"),
    ("<=", "\\le"),
    (">=", "\\ge"),
    ("+-", "\\pm"),
    ("-:", "\\div"),
    ("**", "\\ast"),
    ("*", "\\cdot"),
    ("xx", "\\times"),
    ("oo", "\\infty"),
    ("sqrt", "\\sqrt"),
    ("sum", "\\sum"),
    ("prod", "\\prod"),
    ("int", "\\int"),
    ("lim", "\\lim"),
    ("sin", "\\sin"),
    ("cos", "\\cos"),
    ("tan", "\\tan"),
    ("log", "\\log"),
    ("ln", "\\ln"),
    ("exp", "\\exp"),
    ("in", "\\in"),
    ("alpha", "\\alpha"),
    ("beta", "\\beta"),
    ("gamma", "\\gamma"),
    ("Gamma", "\\Gamma"),
    ("delta", "\\delta"),
    ("Delta", "\\Delta"),
    ("epsilon", "\\epsilon"),
    ("zeta", "\\zeta"),
    ("theta", "\\theta"),
    ("Theta", "\\Theta"),
    ("eta", "\\eta"),
    ("lambda", "\\lambda"),
    ("Lambda", "\\Lambda"),
    ("mu", "\\mu"),
    ("nu", "\\nu"),
    ("xi", "\\xi"),
    ("pi", "\\pi"),
    ("Pi", "\\Pi"),
    ("rho", "\\rho"),
    ("sigma", "\\sigma"),
    ("Sigma", "\\Sigma"),
    ("tau", "\\tau"),
    ("phi", "\\phi"),
    ("Phi", "\\Phi"),
    ("chi", "\\chi"),
    ("psi", "\\psi"),
    ("Psi", "\\Psi"),
    ("omega", "\\omega"),
    ("Omega", "\\Omega"),
];

/// A pair of formula delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub left: String,
    pub right: String,
    /// Display (block) math rather than inline
    pub display: bool,
}

impl Delimiter {
    pub fn new(left: &str, right: &str, display: bool) -> Self {
        Self { left: left.to_string(), right: right.to_string(), display }
    }
}

/// `$$...$$` display math, then `$...$` inline math. Order matters: the
/// longer opener must be tried first.
pub fn default_delimiters() -> Vec<Delimiter> {
    vec![Delimiter::new("$$", "$$", true), Delimiter::new("$", "$", false)]
}

/// A run of text or one formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathSegment {
    Text(String),
    Math { tex: String, display: bool },
}

/// Whether `text` contains something delimited with `$` or `$$`.
pub fn has_latex(text: &str) -> bool {
    LATEX.is_match(text)
}

/// Whether `text` contains an AsciiMath span between backticks.
pub fn has_asciimath(text: &str) -> bool {
    ASCIIMATH.is_match(text)
}

/// Converts one AsciiMath expression to TeX.
pub trait AsciiMathConverter {
    fn to_tex(&self, asciimath: &str) -> String;
}

/// Table-driven AsciiMath to TeX conversion.
///
/// Covers the common subset: Greek letters, relations and operators,
/// big operators and functions, `sqrt`, `a/b` fractions and `^`/`_` with
/// parenthesised groups as arguments. Anything else passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiMathToTex;

impl AsciiMathConverter for AsciiMathToTex {
    fn to_tex(&self, asciimath: &str) -> String {
        let (tokens, _) = tokenize_asciimath(asciimath, 0, false);
        emit_tex(&tokens)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MathToken {
    Command(&'static str),
    Number(String),
    Char(char),
    Group(Vec<MathToken>),
}

/// Tokens from `pos` up to the end of input or, when `nested`, the closing
/// parenthesis. Returns the tokens and the offset after them.
fn tokenize_asciimath(input: &str, mut pos: usize, nested: bool) -> (Vec<MathToken>, usize) {
    let mut tokens = Vec::new();

    while let Some(c) = input[pos..].chars().next() {
        let rest = &input[pos..];
        if c.is_whitespace() {
            pos += c.len_utf8();
        } else if c == '(' {
            let (inner, end) = tokenize_asciimath(input, pos + 1, true);
            tokens.push(MathToken::Group(inner));
            pos = end;
        } else if c == ')' && nested {
            return (tokens, pos + 1);
        } else if let Some((ascii, tex)) = ASCIIMATH_SYMBOLS.iter().find(|(ascii, _)| rest.starts_with(ascii)) {
            tokens.push(MathToken::Command(*tex));
            pos += ascii.len();
        } else if c.is_ascii_digit() {
            let len = rest.find(|d: char| !(d.is_ascii_digit() || d == '.')).unwrap_or(rest.len());
            tokens.push(MathToken::Number(rest[..len].to_string()));
            pos += len;
        } else {
            tokens.push(MathToken::Char(c));
            pos += c.len_utf8();
        }
    }

    (tokens, pos)
}

fn emit_tex(tokens: &[MathToken]) -> String {
    let mut tex = String::new();
    let mut i = 0;

    while i < tokens.len() {
        let next = tokens.get(i + 1);
        if next == Some(&MathToken::Char('/')) && i + 2 < tokens.len() {
            let frac = format!("\\frac{{{}}}{{{}}}", tex_argument(&tokens[i]), tex_argument(&tokens[i + 2]));
            push_tex(&mut tex, &frac);
            i += 3;
            continue;
        }

        match (&tokens[i], next) {
            (MathToken::Command("\\sqrt"), Some(arg)) => {
                push_tex(&mut tex, &format!("\\sqrt{{{}}}", tex_argument(arg)));
                i += 2;
            }
            (MathToken::Char(op @ ('^' | '_')), Some(arg)) => {
                push_tex(&mut tex, &format!("{}{{{}}}", op, tex_argument(arg)));
                i += 2;
            }
            (token, _) => {
                push_tex(&mut tex, &tex_token(token));
                i += 1;
            }
        }
    }

    tex
}

/// A token as the argument of a command; groups lose their parentheses.
fn tex_argument(token: &MathToken) -> String {
    match token {
        MathToken::Group(inner) => emit_tex(inner),
        other => tex_token(other),
    }
}

fn tex_token(token: &MathToken) -> String {
    match token {
        MathToken::Command(command) => command.to_string(),
        MathToken::Number(number) => number.clone(),
        MathToken::Char(c) => c.to_string(),
        MathToken::Group(inner) => format!("({})", emit_tex(inner)),
    }
}

/// Append `piece`, separating a trailing command name from a following letter.
fn push_tex(tex: &mut String, piece: &str) {
    let ends_in_command = tex
        .rfind('\\')
        .is_some_and(|at| tex.len() > at + 1 && tex[at + 1..].chars().all(|c| c.is_ascii_alphabetic()));
    if ends_in_command && piece.starts_with(|c: char| c.is_ascii_alphabetic()) {
        tex.push(' ');
    }
    tex.push_str(piece);
}

/// Replace every backtick AsciiMath span with `$`-delimited TeX, leaving the
/// rest of `text` unchanged.
pub fn convert_asciimath(text: &str, converter: &dyn AsciiMathConverter) -> String {
    ASCIIMATH
        .replace_all(text, |caps: &regex::Captures<'_>| format!("${}$", converter.to_tex(&caps[1])))
        .into_owned()
}

/// Split `text` into plain runs and formulas.
///
/// At each position the delimiters are tried in order. An opener preceded by
/// a backslash is literal, and an opener without a matching closer leaves the
/// rest of the text as plain text.
pub fn split_math(text: &str, delimiters: &[Delimiter]) -> Vec<MathSegment> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some((start, delimiter)) = find_opening(rest, delimiters) {
        let body_start = start + delimiter.left.len();
        let Some(body_len) = find_closing(&rest[body_start..], &delimiter.right) else {
            break;
        };

        if start > 0 {
            segments.push(MathSegment::Text(rest[..start].to_string()));
        }
        segments.push(MathSegment::Math {
            tex: rest[body_start..body_start + body_len].to_string(),
            display: delimiter.display,
        });
        rest = &rest[body_start + body_len + delimiter.right.len()..];
    }

    if !rest.is_empty() {
        segments.push(MathSegment::Text(rest.to_string()));
    }
    segments
}

fn find_opening<'d>(text: &str, delimiters: &'d [Delimiter]) -> Option<(usize, &'d Delimiter)> {
    text.char_indices().find_map(|(index, _)| {
        if is_escaped(text, index) {
            return None;
        }
        delimiters
            .iter()
            .find(|d| !d.left.is_empty() && text[index..].starts_with(d.left.as_str()))
            .map(|d| (index, d))
    })
}

/// Offset of the first unescaped `right` that closes a non-empty body.
fn find_closing(text: &str, right: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = text[from..].find(right) {
        let index = from + offset;
        if index > 0 && !is_escaped(text, index) {
            return Some(index);
        }
        from = index + right.len().max(1);
        if from > text.len() {
            return None;
        }
    }
    None
}

fn is_escaped(text: &str, index: usize) -> bool {
    text[..index].ends_with('\\')
}

/// Typesets the formulas found in an HTML fragment.
pub trait MathEngine {
    fn render(&self, html: &str, delimiters: &[Delimiter]) -> String;
}

/// Wraps formulas in the markup client-side typesetters pick up:
/// `<span class="math math-inline">\(...\)</span>` and
/// `<div class="math math-display">\[...\]</div>`.
///
/// Only text between tags is scanned, like auto-render does with text nodes,
/// and nothing inside `<pre>` or `<code>` is touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupMathEngine;

impl MathEngine for MarkupMathEngine {
    fn render(&self, html: &str, delimiters: &[Delimiter]) -> String {
        let mut output = String::with_capacity(html.len());
        let mut verbatim_depth = 0usize;
        let mut last = 0;

        for tag in TAG.find_iter(html) {
            push_math_text(&mut output, &html[last..tag.start()], delimiters, verbatim_depth > 0);

            let lower = tag.as_str().to_ascii_lowercase();
            if lower.starts_with("<pre") || lower.starts_with("<code") {
                verbatim_depth += 1;
            } else if lower.starts_with("</pre") || lower.starts_with("</code") {
                verbatim_depth = verbatim_depth.saturating_sub(1);
            }
            output.push_str(tag.as_str());
            last = tag.end();
        }
        push_math_text(&mut output, &html[last..], delimiters, verbatim_depth > 0);

        output
    }
}

fn push_math_text(output: &mut String, text: &str, delimiters: &[Delimiter], verbatim: bool) {
    if verbatim {
        output.push_str(text);
        return;
    }

    for segment in split_math(text, delimiters) {
        match segment {
            MathSegment::Text(text) => output.push_str(&text),
            MathSegment::Math { tex, display: true } => {
                output.push_str(&format!("<div class=\"math math-display\">\\[{}\\]</div>", tex));
            }
            MathSegment::Math { tex, display: false } => {
                output.push_str(&format!("<span class=\"math math-inline\">\\({}\\)</span>", tex));
            }
        }
    }
}

/// A content node holding at least one formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathNode {
    /// Position among all content nodes of the page
    pub index: usize,
    /// Plain text of the node
    pub text: String,
    /// Whether the formulas are AsciiMath rather than TeX
    pub asciimath: bool,
    /// Second class of the node's container, copied onto the rendered block
    pub container_class: Option<String>,
}

/// Content nodes whose text contains TeX or AsciiMath formulas.
///
/// Nodes without a parent element are skipped; the host produces such
/// transient copies while editing.
pub fn math_nodes(doc: &Document, contract: &HostContract) -> Vec<MathNode> {
    let nodes = doc.elements_with_class(&contract.content_class).unwrap_or_default();

    nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.parent().is_some())
        .filter_map(|(index, node)| classify_math(index, node))
        .collect()
}

fn classify_math(index: usize, node: &Element<'_>) -> Option<MathNode> {
    let text = node.text();
    let latex = has_latex(&text);
    let asciimath = has_asciimath(&text);
    if !latex && !asciimath {
        return None;
    }
    let container_class = node.parent().and_then(|parent| parent.classes().into_iter().nth(1));
    Some(MathNode { index, text, asciimath: asciimath && !latex, container_class })
}

/// Render the formulas of one content node as a standalone block, the way the
/// formula script shows them below the raw text.
pub fn render_node_math(
    node: &MathNode, engine: &dyn MathEngine, converter: Option<&dyn AsciiMathConverter>,
) -> String {
    let source = match converter {
        Some(converter) if node.asciimath => convert_asciimath(&node.text, converter),
        _ => node.text.clone(),
    };
    let class = match &node.container_class {
        Some(extra) => format!("{} {}", RENDERED_MATH_CLASS, extra),
        None => RENDERED_MATH_CLASS.to_string(),
    };
    format!(
        "<div class=\"{}\">{}</div>",
        escape_html(&class),
        engine.render(&escape_html(&source), &default_delimiters())
    )
}

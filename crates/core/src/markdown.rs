//! Markdown to HTML rendering.
//!
//! [`CmarkEngine`] drives pulldown-cmark with the settings the preview needs:
//! single newlines become line breaks (outline items are one line each), raw
//! HTML from the host passes through, bare URLs become links, and fenced code
//! goes through a [`Highlighter`].

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Result;
use crate::highlight::{DefaultHighlighter, Highlighter};

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'`]+"#).unwrap());

/// Characters that end a sentence more often than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// Turns Markdown into HTML.
pub trait MarkdownEngine {
    fn render(&self, markdown: &str) -> Result<String>;
}

/// Options for [`CmarkEngine`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Render single newlines as `<br />`
    pub breaks: bool,
    /// Pass raw HTML through instead of escaping it
    pub html: bool,
    /// Turn bare URLs into links
    pub linkify: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self { breaks: true, html: true, linkify: true }
    }
}

/// The engine a [`crate::panel::PanelController`] uses unless told otherwise.
pub type DefaultEngine = CmarkEngine<DefaultHighlighter>;

/// pulldown-cmark based [`MarkdownEngine`].
#[derive(Debug, Clone, Default)]
pub struct CmarkEngine<H> {
    options: MarkdownOptions,
    highlighter: H,
}

impl<H: Highlighter> CmarkEngine<H> {
    pub fn new(options: MarkdownOptions, highlighter: H) -> Self {
        Self { options, highlighter }
    }

    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    fn code_block(&self, lang: Option<&str>, code: &str) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>\n", escape_html(code));
        };

        let highlighted = self.highlighter.highlight(code, lang);
        let body = if highlighted.is_empty() { escape_html(code) } else { highlighted };
        format!("<pre><code class=\"language-{}\">{}</code></pre>\n", escape_html(lang), body)
    }
}

impl<H: Highlighter> MarkdownEngine for CmarkEngine<H> {
    fn render(&self, markdown: &str) -> Result<String> {
        let mut parser_options = Options::empty();
        parser_options.insert(Options::ENABLE_TABLES);
        parser_options.insert(Options::ENABLE_STRIKETHROUGH);
        parser_options.insert(Options::ENABLE_TASKLISTS);

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;
        // inside a Markdown link, an image, or a raw <a> element
        let mut link_depth = 0usize;
        // source offset up to which a bare link has already been emitted
        let mut linked_until = 0usize;

        for (mut event, mut range) in Parser::new_ext(markdown, parser_options).into_offset_iter() {
            if range.start < linked_until {
                if range.end <= linked_until {
                    continue;
                }
                // keep the tail of a text event the link ran into
                let verbatim = matches!(&event, Event::Text(text) if markdown.get(range.clone()) == Some(text.as_ref()));
                if verbatim {
                    range = linked_until..range.end;
                    event = Event::Text(CowStr::Borrowed(&markdown[range.clone()]));
                }
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, buffer)) = code.take() {
                        events.push(Event::Html(CowStr::from(self.code_block(lang.as_deref(), &buffer))));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, buffer)) = code.as_mut() {
                        buffer.push_str(&text);
                    }
                }
                Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                    link_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::Link | TagEnd::Image) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Text(text) if self.options.linkify && link_depth == 0 => {
                    if let Some(end) = push_linkified(&mut events, markdown, text, range) {
                        linked_until = end;
                    }
                }
                Event::SoftBreak if self.options.breaks => events.push(Event::HardBreak),
                Event::Html(raw) | Event::InlineHtml(raw) if !self.options.html => events.push(Event::Text(raw)),
                Event::InlineHtml(raw) => {
                    if opens_anchor(&raw) {
                        link_depth += 1;
                    } else if closes_anchor(&raw) {
                        link_depth = link_depth.saturating_sub(1);
                    }
                    events.push(Event::InlineHtml(raw));
                }
                other => events.push(other),
            }
        }

        let mut output = String::new();
        html::push_html(&mut output, events.into_iter());
        Ok(output)
    }
}

/// Split a text event around bare URLs, wrapping each in a link.
///
/// pulldown-cmark splits text at delimiter characters such as `*` or `[`, so
/// when the event is a verbatim slice of `source` the URL is read from the
/// source and may run past the end of the event. Returns the source offset
/// where such a link ends; the caller drops what it covered.
fn push_linkified<'a>(
    events: &mut Vec<Event<'a>>, source: &'a str, text: CowStr<'a>, range: Range<usize>,
) -> Option<usize> {
    let verbatim = source.get(range.clone()) == Some(text.as_ref());
    let haystack = if verbatim { &source[range.start..] } else { text.as_ref() };

    let links: Vec<(usize, usize, String)> = BARE_URL
        .find_iter(haystack)
        .take_while(|m| m.start() < text.len())
        .filter_map(|m| {
            let candidate = trim_url(m.as_str());
            let href = if candidate.to_ascii_lowercase().starts_with("www.") {
                format!("http://{}", candidate)
            } else {
                candidate.to_string()
            };
            Url::parse(&href).ok()?;
            Some((m.start(), m.start() + candidate.len(), href))
        })
        .collect();

    if links.is_empty() {
        events.push(Event::Text(text));
        return None;
    }

    let mut last = 0;
    for (start, end, href) in links {
        if start > last {
            events.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::from(haystack[start..end].to_string())));
        events.push(Event::End(TagEnd::Link));
        last = end;
    }

    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
    (verbatim && range.start + last > range.end).then_some(range.start + last)
}

/// Drop sentence punctuation and unbalanced closing brackets from the end of
/// a URL match.
fn trim_url(candidate: &str) -> &str {
    let mut url = candidate;
    while let Some(last) = url.chars().last() {
        let strip = match last {
            ')' => url.matches('(').count() < url.matches(')').count(),
            ']' => url.matches('[').count() < url.matches(']').count(),
            '}' => url.matches('{').count() < url.matches('}').count(),
            c => TRAILING_PUNCTUATION.contains(&c),
        };
        if !strip {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

fn opens_anchor(raw: &str) -> bool {
    let lower = raw.trim_start().to_ascii_lowercase();
    lower.starts_with("<a ") || lower.starts_with("<a>")
}

fn closes_anchor(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("</a>")
}

/// Escape text for use in HTML bodies and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

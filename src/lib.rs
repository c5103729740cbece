//! A parser for a wiki markup dialect with context-sensitive block
//! structure.
//!
//! [`parse`] turns a page of markup into a single [`Node`] tree whose
//! terminals concatenate back to the source text byte for byte, so the
//! same tree serves editors (which need exact spans), exporters (which
//! walk it through [`visit`]), and link indexes (which read the resolved
//! link data off [`WikiLinkData`]). The free functions around it cover
//! the host chores that need the grammar but not a full parse: link
//! resolution and generation, page-name validation, and isolated todo
//! parsing.

use std::sync::LazyLock;

use crate::{
    codemap::FileMap,
    engine::{Parser, Reject},
    grammar::GRAMMAR,
};

mod actions;
mod autolink;
mod codemap;
mod config;
mod engine;
mod env;
mod grammar;
mod link;
mod node;
#[cfg(test)]
mod tests;
pub mod visit;

pub use crate::{
    autolink::AutoLinkInfo,
    codemap::{LineCol, Span},
    config::{AutoLinkMode, FormatDetails, LANGUAGE_NAME},
    env::CancelHandle,
    link::{Error as LinkError, LinkPath, ResolvedLink},
    node::{
        AppendixData, InsertionData, Kind, Node, NodeData, NodeFlags, NonTerminal, SyntheticTag,
        Terminal, UrlLinkData, WikiLinkData,
    },
    visit::{Visitor, text_content},
};

/// A failed parse.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    /// The grammar could not consume the whole input.
    #[error("markup error at {location}")]
    Failed {
        /// The byte offset of the first position the grammar could not
        /// get past.
        offset: usize,
        /// The same position as a line and column.
        location: LineCol,
    },
    /// The cancel handle was signalled mid-parse.
    #[error("parse cancelled")]
    Cancelled,
}

/// Parses a page of markup into its syntax tree.
///
/// The returned node is a [`Kind::Document`] non-terminal whose terminal
/// descendants concatenate back to `text` exactly. Empty input gives an
/// empty document, and [`FormatDetails::no_format`] gives a document
/// holding the whole page as one run of plain text. When
/// [`FormatDetails::auto_link`] asks for it, known page names in plain
/// text are rewritten into links before the tree is returned.
pub fn parse(
    text: &str,
    format: &FormatDetails,
    cancel: &CancelHandle,
) -> Result<Node, ParseFailure> {
    if text.is_empty() {
        return Ok(NonTerminal::new(Vec::new(), 0, Some(Kind::Document)).into());
    }

    if format.no_format {
        let all = Terminal::new(text, Span::new(0, text.len()), Some(Kind::PlainText));
        return Ok(NonTerminal::new(vec![all.into()], 0, Some(Kind::Document)).into());
    }

    let wiki = &*GRAMMAR;
    let mut parser = Parser::new(&wiki.grammar, text, format, cancel);
    let children = parser.run(wiki.text).map_err(|reject| fail(text, reject))?;
    let mut document = NonTerminal::new(children, 0, Some(Kind::Document));

    if format.auto_link == AutoLinkMode::Relax {
        if let Some(info) = &format.auto_link_info {
            autolink::rewrite_children(info, &mut document, cancel)
                .map_err(|reject| fail(text, reject))?;
        }
    }

    Ok(document.into())
}

/// Extracts the page name or link core out of one written link.
///
/// Accepts both the bracketed form and a bare core, and gives back the
/// core with surrounding whitespace removed. Anything that is not a
/// single link, or a link whose core is empty, gives `None`.
pub fn extract_word(text: &str) -> Option<String> {
    let wiki = &*GRAMMAR;
    let format = FormatDetails::default();
    let cancel = CancelHandle::new();
    let mut parser = Parser::new(&wiki.grammar, text, &format, &cancel);
    let children = parser.run(wiki.extractable).ok()?;

    let root: Node = NonTerminal::new(children, 0, None).into();
    let core = root.find_deep(Kind::LinkCore).next()?;
    let word = core.text().trim().to_owned();
    (!word.is_empty()).then_some(word)
}

/// Resolves a written link core against the absolute name of the page it
/// was written on.
///
/// Absolute cores resolve on their own. Relative cores need `base_page`;
/// without one they keep their written form, except for dots-only cores
/// like `..`, which name nothing on their own.
pub fn resolve_link(link_core: &str, base_page: Option<&str>) -> Result<String, LinkError> {
    let path = LinkPath::from_link_core(link_core)?;
    match base_page {
        Some(base) => path.resolve(Some(&LinkPath::from_page_name(base))),
        None => match &path {
            LinkPath::Absolute { .. } => path.resolve(None),
            LinkPath::Relative { upward, components } if *upward >= 1 && components.is_empty() => {
                Err(LinkError::MissingBase)
            }
            LinkPath::Relative { .. } => Ok(path.link_core()),
        },
    }
}

/// The shortest written core that reaches `target` from `base`, both
/// given as absolute page names.
///
/// With `downward_only`, only targets inside `base`'s subtree qualify
/// and anything else gives `Ok(None)`.
pub fn relative_link(
    target: &str,
    base: &str,
    downward_only: bool,
) -> Result<Option<String>, LinkError> {
    if target.is_empty() {
        return Err(LinkError::EmptyTarget);
    }
    let target = LinkPath::from_page_name(target);
    let base = LinkPath::from_page_name(base);
    Ok(target
        .relative_to(&base, downward_only)
        .map(|path| path.link_core()))
}

/// The bracketed written form of a link to `page` from `base`, relative
/// where possible.
///
/// Falls back to the absolute form when `force_absolute` is set or no
/// relative core reaches the target.
pub fn wiki_link_from_page(page: &str, base: &str, force_absolute: bool) -> String {
    if !force_absolute {
        if let Ok(Some(core)) = relative_link(page, base, false) {
            return format!("[[{core}]]");
        }
    }
    format!("[[//{page}]]")
}

/// One absolute bracketed link per page name, newline separated, for
/// pasting a selection of pages into markup.
pub fn absolute_links<'a>(pages: impl IntoIterator<Item = &'a str>) -> String {
    let links: Vec<String> = pages
        .into_iter()
        .map(|page| format!("[[//{page}]]"))
        .collect();
    links.join("\n")
}

/// Normalizes free text into a written link.
///
/// Every `[[` and `]]` is removed and a run of leading `+` signs is
/// dropped before trimming. The first letter is uppercased, and with
/// `bracketed` the result is wrapped in `[[` and `]]` again. Text that
/// strips down to nothing yields an empty string either way.
pub fn wiki_link_from_text(text: &str, bracketed: bool) -> String {
    let stripped = text.replace("[[", "").replace("]]", "");
    let core = stripped.trim_start_matches('+').trim();
    if core.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(core.len() + 4);
    if bracketed {
        out.push_str("[[");
    }
    let mut chars = core.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    if bracketed {
        out.push_str("]]");
    }
    out
}

/// The written form of a page attribute, ready to append to a page.
pub fn attribute_from_components(key: &str, value: &str) -> String {
    format!("[[{key}: {value}]]\n")
}

/// A `file:` URL for a local path, percent-encoding the characters that
/// markup or URL syntax would otherwise claim.
pub fn url_from_file_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    format!(
        "file:{}",
        percent_encoding::utf8_percent_encode(&path, &FILE_URL_SET)
    )
}

/// Escapes `text` so it survives verbatim inside markup: backslashes and
/// control characters become `\xNN` sequences.
pub fn escape(text: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || (c as u32) < 0x20 {
            let _ = write!(out, r"\x{:02x}", c as u32);
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverses [`escape`]. Unrecognized sequences are left alone.
pub fn unescape(text: &str) -> String {
    ESCAPED_CHAR
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let code = u8::from_str_radix(&caps[1], 16).unwrap_or(0);
            char::from(code).to_string()
        })
        .into_owned()
}

/// Whether `name` can be the absolute name of a page.
///
/// Numeric names are reserved for footnotes unless `format` treats
/// footnotes as ordinary links.
pub fn is_valid_page_name(name: &str, format: &FormatDetails) -> bool {
    if !format.footnotes_as_wikiwords && FOOTNOTE_RE.is_match(name) {
        return false;
    }
    PAGE_NAME_RE.is_match(name).unwrap_or(false)
}

/// Whether `core` could appear as the core of a written link, in any of
/// the absolute or relative forms.
pub fn is_valid_link_core(core: &str, format: &FormatDetails) -> bool {
    if !format.footnotes_as_wikiwords && FOOTNOTE_RE.is_match(core) {
        return false;
    }
    LINK_CORE_RE.is_match(core).unwrap_or(false)
}

/// Parses the value part of a todo entry on its own, as hosts do when
/// rewriting one entry out of a todo list.
///
/// `None` when the text is not a complete todo value or the parse was
/// cancelled.
pub fn parse_todo_value(text: &str, format: &FormatDetails, cancel: &CancelHandle) -> Option<Node> {
    let wiki = &*GRAMMAR;
    let mut parser = Parser::new(&wiki.grammar, text, format, cancel);
    let children = parser.run(wiki.todo_value).ok()?;
    children
        .into_iter()
        .find(|node| node.kind() == Some(Kind::Value))
}

/// Parses a whole `key: value` todo entry on its own.
///
/// `None` when the text is not a complete entry or the parse was
/// cancelled.
pub fn parse_todo_entry(text: &str, format: &FormatDetails, cancel: &CancelHandle) -> Option<Node> {
    let wiki = &*GRAMMAR;
    let mut parser = Parser::new(&wiki.grammar, text, format, cancel);
    let children = parser.run(wiki.todo_entry).ok()?;
    children
        .into_iter()
        .find(|node| node.kind() == Some(Kind::TodoEntry))
}

fn fail(source: &str, reject: Reject) -> ParseFailure {
    match reject {
        Reject::Local(offset) => ParseFailure::Failed {
            offset,
            location: FileMap::new(source).find_line_col(offset),
        },
        Reject::Cancelled => ParseFailure::Cancelled,
    }
}

static PAGE_NAME_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(&format!(r"\A(?:{})\z", grammar::page_name_pattern())).unwrap()
});

static LINK_CORE_RE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(&format!(r"\A(?:{})\z", grammar::link_core_pattern())).unwrap()
});

static FOOTNOTE_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(&format!(r"\A(?:{})\z", grammar::FOOTNOTE_PAT)).unwrap());

static ESCAPED_CHAR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\\x([0-9a-f]{2})").unwrap());

const FILE_URL_SET: percent_encoding::AsciiSet = percent_encoding::CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

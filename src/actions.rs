//! Semantic actions.
//!
//! The hook bodies wired up by [`crate::grammar`]. Start hooks guard
//! elements against disallowed context (self-nesting, preformatted
//! mode, unwanted footnotes), completion hooks annotate or rewrite the
//! freshly matched nodes: they attach parsed payloads, synthesize the
//! open and close tags for lists and tables, and resolve link paths
//! against the page the parse runs for.

use std::{mem, sync::LazyLock};

use regex::Regex;

use crate::{
    codemap::Span,
    engine::{Emit, Parser, Reject},
    env,
    link::LinkPath,
    node::{
        AppendixData, InsertionData, Kind, Node, NodeData, NodeFlags, NonTerminal, SyntheticTag,
        Terminal, UrlLinkData, WikiLinkData,
    },
};

// -------- Scanner skip hooks --------

/// Text the content scanner skipped over becomes a plain-text leaf.
pub(crate) fn skipped_to_plain_text(mut leaf: Terminal) -> Vec<Node> {
    if leaf.text.is_empty() {
        return Vec::new();
    }
    leaf.kind = Some(Kind::PlainText);
    vec![leaf.into()]
}

/// Text skipped inside a quoted attribute value is the value itself.
pub(crate) fn skipped_to_value(mut leaf: Terminal) -> Vec<Node> {
    if leaf.text.is_empty() {
        return Vec::new();
    }
    leaf.kind = Some(Kind::Value);
    vec![leaf.into()]
}

// -------- Start guards --------

fn already_open(p: &Parser<'_, '_>, pos: usize, kinds: &[Kind]) -> Result<(), Reject> {
    if p.env.is_open_outside_top(kinds) {
        return Err(Reject::Local(pos));
    }
    Ok(())
}

pub(crate) fn outside_italics(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    already_open(p, pos, &[Kind::Italics])
}

pub(crate) fn outside_bold(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    already_open(p, pos, &[Kind::Bold])
}

pub(crate) fn outside_list(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    already_open(p, pos, &[Kind::List])
}

pub(crate) fn outside_space_pre(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    already_open(p, pos, &[Kind::PreSpace])
}

pub(crate) fn outside_hidden(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    already_open(p, pos, &[Kind::NoExportLine])
}

/// Block markup may be indented but must own its line up to here.
pub(crate) fn require_blank_before(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    if !env::blank_before(p.env.source, pos) {
        return Err(Reject::Local(pos));
    }
    Ok(())
}

/// Line structure is inert inside preformatted blocks.
pub(crate) fn outside_pre_block(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    if p.env.in_pre_outside_top() {
        return Err(Reject::Local(pos));
    }
    Ok(())
}

/// When the format treats footnotes as page links, the footnote element
/// must lose against the wiki-word alternatives after it.
pub(crate) fn footnotes_enabled(p: &mut Parser<'_, '_>, pos: usize) -> Result<(), Reject> {
    if p.env.format.footnotes_as_wikiwords {
        return Err(Reject::Local(pos));
    }
    Ok(())
}

// -------- Validation --------

pub(crate) fn validate_non_empty(pos: usize, tokens: &NonTerminal) -> Result<(), Reject> {
    if tokens.span.is_empty() {
        return Err(Reject::Local(pos));
    }
    Ok(())
}

// -------- General completion hooks --------

/// Drops the produced node when the match was empty, so optional
/// whitespace leaves no trace in the tree.
pub(crate) fn hide_on_empty(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    if tokens.span.is_empty() {
        return Ok(Emit::Replace(Vec::new()));
    }
    Ok(Emit::Keep)
}

/// Flags the produced node as grammar plumbing whose own text must not
/// be rendered. On an anonymous carrier the flag lands on the first
/// produced node instead.
pub(crate) fn mark_helper_recursive(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let flags = NodeFlags::HELPER | NodeFlags::HELPER_RECURSIVE;
    if tokens.kind.is_some() {
        tokens.flags |= flags;
    } else if let Some(first) = tokens.children.first_mut() {
        *first.flags_mut() |= flags;
    }
    Ok(Emit::Keep)
}

// -------- Preformatted blocks --------

pub(crate) fn enter_pre(
    p: &mut Parser<'_, '_>,
    _: usize,
    _: &mut NonTerminal,
) -> Result<Emit, Reject> {
    p.env.set_in_pre_outside_top();
    Ok(Emit::Keep)
}

/// A line-leading space either continues the open space-led block,
/// is plain text inside an explicit pre element, or opens a new
/// space-led block whose leading space carries the synthetic open tag.
pub(crate) fn open_space_pre(
    p: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    if p.env.is_open_outside_top(&[Kind::PreSpace]) {
        return Ok(Emit::Keep);
    }
    if p.env.in_pre_outside_top() {
        return Err(Reject::Local(pos));
    }
    p.env.set_in_pre_outside_top();
    let Some(leaf) = tokens.children.first_mut().and_then(Node::as_terminal_mut) else {
        return Err(Reject::Local(pos));
    };
    leaf.kind = Some(Kind::HtmlEquivalent);
    leaf.data = Some(NodeData::Synthetic(SyntheticTag::start("pre")));
    Ok(Emit::Keep)
}

pub(crate) fn close_space_pre(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    tokens.kind = Some(Kind::HtmlEquivalent);
    tokens.data = Some(NodeData::Synthetic(SyntheticTag::end("pre")));
    Ok(Emit::Keep)
}

// -------- Lists --------

fn bullet_tag(c: char) -> &'static str {
    match c {
        '*' => "ul",
        '#' => "ol",
        ';' => "dt",
        ':' => "dd",
        _ => "dl",
    }
}

fn close_bullet(nodes: &mut Vec<Node>, pos: usize, c: char) {
    if matches!(c, '*' | '#') {
        nodes.push(Terminal::synthetic(pos, SyntheticTag::end("li")).into());
    }
    nodes.push(Terminal::synthetic(pos, SyntheticTag::end(bullet_tag(c))).into());
}

/// Diffs this line's marker run against the previous line's and emits
/// the matching close and open tags. Definition markers are normalized
/// with a `!` sentinel so each gets a surrounding definition list of
/// its own.
pub(crate) fn reconcile_bullets(
    p: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(marker) = tokens.children.first_mut() else {
        return Err(Reject::Local(pos));
    };
    *marker.flags_mut() |= NodeFlags::HELPER;
    let written = marker.text().into_owned();
    let norm = written.replace(':', "!:").replace(';', "!;");
    let last_bullet = norm.chars().last();

    // A continuation line outside any list has nothing to diff against.
    let Some(previous) = p.env.list_bullets_mut() else {
        return Err(Reject::Local(pos));
    };
    let prev = mem::replace(previous, norm.clone());

    // Keep the shared leading run; the rest of the old run closes, the
    // rest of the new run opens.
    let common = prev
        .chars()
        .zip(norm.chars())
        .take_while(|(old, new)| old == new)
        .count();
    let to_close: Vec<char> = prev.chars().skip(common).collect();
    let to_open: Vec<char> = norm.chars().skip(common).collect();

    let mut nodes = mem::take(&mut tokens.children);
    for &c in to_close.iter().rev() {
        close_bullet(&mut nodes, pos, c);
    }
    let mut opened = None;
    for &c in &to_open {
        let tag = bullet_tag(c);
        nodes.push(Terminal::synthetic(pos, SyntheticTag::start(tag)).into());
        opened = Some(tag);
        if matches!(c, '*' | '#') {
            nodes.push(Terminal::synthetic(pos, SyntheticTag::start("li")).into());
            opened = Some("li");
        }
    }

    // A sibling line at unchanged depth still starts a fresh item.
    match last_bullet {
        Some('*' | '#') if to_open.is_empty() => {
            nodes.push(Terminal::synthetic(pos, SyntheticTag::end("li")).into());
            nodes.push(Terminal::synthetic(pos, SyntheticTag::start("li")).into());
        }
        Some(':') if opened != Some("dd") => {
            nodes.push(Terminal::synthetic(pos, SyntheticTag::end("dd")).into());
            nodes.push(Terminal::synthetic(pos, SyntheticTag::start("dd")).into());
        }
        Some(';') if opened != Some("dt") => {
            nodes.push(Terminal::synthetic(pos, SyntheticTag::end("dt")).into());
            nodes.push(Terminal::synthetic(pos, SyntheticTag::start("dt")).into());
        }
        _ => {}
    }

    Ok(Emit::Replace(nodes))
}

/// Closes out everything the list still has open. Runs inside
/// terminator probes too, so it must not touch the recorded run.
pub(crate) fn close_open_bullets(
    p: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(open) = p.env.list_bullets_mut().map(|bullets| bullets.clone()) else {
        return Err(Reject::Local(pos));
    };
    if let Some(first) = tokens.children.first_mut() {
        *first.flags_mut() |= NodeFlags::HELPER;
    }
    let mut nodes = mem::take(&mut tokens.children);
    for c in open.chars().rev() {
        close_bullet(&mut nodes, pos, c);
    }
    Ok(Emit::Replace(nodes))
}

// -------- Headings --------

fn marker_len(tokens: &NonTerminal, kind: Kind) -> Option<usize> {
    let &index = tokens.attrs.get(&kind)?;
    Some(tokens.children[index].text().chars().count())
}

pub(crate) fn pack_heading(
    _: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let open = marker_len(tokens, Kind::HeadingOpen);
    let close = marker_len(tokens, Kind::HeadingClose);
    let (Some(open), Some(close)) = (open, close) else {
        return Err(Reject::Local(pos));
    };
    if !tokens.attrs.contains_key(&Kind::HeadingContent) {
        return Err(Reject::Local(pos));
    }
    tokens.data = Some(NodeData::Heading {
        level: open.min(close) as u8,
    });
    Ok(Emit::Keep)
}

// -------- Tables --------

/// Collects `key=value` pairs from the matched attribute elements onto
/// the list node, for the synthetic tag of the construct around it.
pub(crate) fn collect_html_attributes(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let mut pairs = Vec::new();
    for child in &tokens.children {
        if child.kind() != Some(Kind::HtmlAttribute) {
            continue;
        }
        let key = child.find(Kind::HtmlAttributeKey);
        let value = child.find(Kind::HtmlAttributeValue);
        if let (Some(key), Some(value)) = (key, value) {
            pairs.push((key.text().into_owned(), value.text().into_owned()));
        }
    }
    tokens.flags |= NodeFlags::HELPER;
    tokens.data = Some(NodeData::HtmlAttributes(pairs));
    Ok(Emit::Keep)
}

fn wrap_in_tag(tokens: &mut NonTerminal, tag: &'static str, attr_kind: Kind) {
    let attributes = tokens.attrs.get(&attr_kind).and_then(|&index| {
        match tokens.children[index].data() {
            Some(NodeData::HtmlAttributes(pairs)) => Some(pairs.clone()),
            _ => None,
        }
    });
    let start = match attributes {
        Some(attributes) => SyntheticTag::Start { tag, attributes },
        None => SyntheticTag::start(tag),
    };
    let span = tokens.span;
    let mut children = Vec::with_capacity(tokens.children.len() + 2);
    children.push(Terminal::synthetic(span.start, start).into());
    children.append(&mut tokens.children);
    children.push(Terminal::synthetic(span.end, SyntheticTag::end(tag)).into());
    tokens.replace_children(children);
}

pub(crate) fn wrap_table(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    wrap_in_tag(tokens, "table", Kind::TableAttributes);
    Ok(Emit::Keep)
}

pub(crate) fn wrap_table_row(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    wrap_in_tag(tokens, "tr", Kind::RowAttributes);
    Ok(Emit::Keep)
}

pub(crate) fn wrap_table_cell(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    wrap_in_tag(tokens, "td", Kind::CellAttributes);
    Ok(Emit::Keep)
}

pub(crate) fn wrap_table_header_cell(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    wrap_in_tag(tokens, "th", Kind::CellAttributes);
    Ok(Emit::Keep)
}

pub(crate) fn wrap_table_caption(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    wrap_in_tag(tokens, "caption", Kind::CaptionAttributes);
    Ok(Emit::Keep)
}

// -------- Hidden lines --------

pub(crate) fn rename_no_export(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    tokens.kind = Some(Kind::NoExport);
    Ok(Emit::Keep)
}

// -------- URLs, images, and appendices --------

fn find_text(tokens: &NonTerminal, kind: Kind) -> Option<String> {
    let &index = tokens.attrs.get(&kind)?;
    Some(tokens.children[index].text().into_owned())
}

pub(crate) fn collect_appendix(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let mut entries = Vec::new();
    for child in &tokens.children {
        if child.kind() != Some(Kind::AppendixEntry) {
            continue;
        }
        let Some(key) = child.find(Kind::Key) else {
            continue;
        };
        let mut key = key.text().into_owned();
        if key.ends_with(':') || key.ends_with('=') {
            key.pop();
        }
        let data = child
            .find(Kind::Data)
            .map(|node| node.text().into_owned())
            .unwrap_or_default();
        entries.push((key, data));
    }
    tokens.data = Some(NodeData::Appendix(AppendixData {
        entries,
        ..<_>::default()
    }));
    Ok(Emit::Keep)
}

/// Interprets the appendix keys every appendix-bearing element shares.
/// The short `s` class key is taken by image sizing, so only the long
/// form selects a CSS class here.
pub(crate) fn apply_appendix_globals(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(NodeData::Appendix(appendix)) = &mut tokens.data else {
        return Ok(Emit::Keep);
    };
    let mut css_class = None;
    let mut text_align = None;
    for (key, data) in &appendix.entries {
        match key.as_str() {
            "class" => css_class = Some(data.replace(',', " ")),
            "A" | "align" => {
                if APPENDIX_ALIGN_VALUES.contains(data.as_str()) {
                    text_align = Some(data.clone());
                }
            }
            _ => {}
        }
    }
    appendix.css_class = css_class;
    appendix.text_align = text_align;
    Ok(Emit::Keep)
}

/// Image keywords that fold into an `align` appendix entry.
static IMAGE_ALIGN_KEYWORDS: phf::Set<&str> = phf::phf_set! {
    "left", "center", "right", "top", "middle", "bottom",
};

/// Values the shared `align` appendix key accepts.
static APPENDIX_ALIGN_VALUES: phf::Set<&str> = phf::phf_set! {
    "l", "c", "r", "left", "center", "right",
};

fn appendix_data(tokens: &NonTerminal) -> AppendixData {
    tokens
        .attrs
        .get(&Kind::Appendix)
        .and_then(|&index| match tokens.children[index].data() {
            Some(NodeData::Appendix(appendix)) => Some(appendix.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn store_appendix(tokens: &mut NonTerminal, appendix: &AppendixData) {
    if let Some(&index) = tokens.attrs.get(&Kind::Appendix) {
        if let Some(node) = tokens.children[index].as_non_terminal_mut() {
            node.data = Some(NodeData::Appendix(appendix.clone()));
        }
    }
}

pub(crate) fn pack_url_link(
    _: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let bracketed = tokens.kind != Some(Kind::UrlBare);
    tokens.kind = Some(Kind::UrlLink);
    let Some(url) = find_text(tokens, Kind::UrlCore) else {
        return Err(Reject::Local(pos));
    };
    // The appendix marks the URL as a plain link, as opposed to the
    // image element's inline rendering.
    let mut appendix = appendix_data(tokens);
    appendix.entries.push(("l".into(), String::new()));
    store_appendix(tokens, &appendix);
    tokens.data = Some(NodeData::UrlLink(Box::new(UrlLinkData {
        url,
        bracketed,
        css_class: None,
        appendix,
    })));
    Ok(Emit::Keep)
}

pub(crate) fn pack_image(
    _: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    tokens.kind = Some(Kind::UrlLink);
    let Some(url) = find_text(tokens, Kind::UrlCore) else {
        return Err(Reject::Local(pos));
    };

    let mut entries = Vec::new();
    let mut css_classes = Vec::new();
    for option in &tokens.children {
        if option.kind() != Some(Kind::ImageOption) {
            continue;
        }
        if let Some(keyword) = option.find(Kind::ImageKeyword) {
            let keyword = keyword.text();
            if IMAGE_ALIGN_KEYWORDS.contains(keyword.as_ref()) {
                entries.push(("align".into(), keyword.into_owned()));
            } else if keyword == "upright" {
                entries.push(("upright".into(), "1".into()));
            }
        } else if let Some(size) = option.find(Kind::ImageSize) {
            entries.push(("r".into(), size.text().replace("px", "")));
        } else if option.find(Kind::Key).is_some_and(|key| key.text() == "class") {
            if let Some(value) = option.find(Kind::Value) {
                css_classes.push(value.text().into_owned());
            }
        }
    }
    entries.push(("i".into(), String::new()));

    let mut appendix = appendix_data(tokens);
    appendix.entries.extend(entries);
    store_appendix(tokens, &appendix);

    tokens.data = Some(NodeData::UrlLink(Box::new(UrlLinkData {
        url,
        bracketed: true,
        css_class: (!css_classes.is_empty()).then(|| css_classes.join(" ")),
        appendix,
    })));
    Ok(Emit::Keep)
}

// -------- Footnotes --------

pub(crate) fn pack_footnote(
    _: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(id) = find_text(tokens, Kind::FootnoteId) else {
        return Err(Reject::Local(pos));
    };
    tokens.data = Some(NodeData::Footnote(id));
    Ok(Emit::Keep)
}

// -------- Wiki links --------

static FRAGMENT_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\(.)").unwrap());

/// Caches the unescaped form of a search fragment on its leaf.
pub(crate) fn unescape_fragment(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(leaf) = tokens.children.last_mut().and_then(Node::as_terminal_mut) else {
        return Ok(Emit::Keep);
    };
    let unescaped = FRAGMENT_ESCAPE.replace_all(&leaf.text, "$1").into_owned();
    leaf.data = Some(NodeData::Unescaped(unescaped));
    Ok(Emit::Keep)
}

/// Splits the whitespace run at the end of a link core off into its own
/// unnamed leaf, so the core resolves without it but the written text
/// survives verbatim.
pub(crate) fn cut_right_whitespace(
    _: &mut Parser<'_, '_>,
    _: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let (cut, at) = {
        let Some(leaf) = tokens.children.last_mut().and_then(Node::as_terminal_mut) else {
            return Ok(Emit::Keep);
        };
        let kept = leaf.text.trim_end_matches([' ', '\t', '\n', '\r']).len();
        if kept == 0 || kept == leaf.text.len() {
            return Ok(Emit::Keep);
        }
        let cut = leaf.text.split_off(kept);
        let at = leaf.span.start + kept;
        leaf.span = Span::new(leaf.span.start, at);
        (cut, at)
    };
    let end = at + cut.len();
    tokens.push_child(Terminal::new(cut, Span::new(at, end), None).into());
    Ok(Emit::Keep)
}

/// Resolves what a written link core names. Absolute cores resolve on
/// their own; relative ones resolve against the page being parsed, or
/// pass through verbatim when no page was supplied. A core climbing
/// past the root of the tree has no referent at all.
fn resolve_written(path: &LinkPath, base: Option<&LinkPath>) -> Option<String> {
    if path.is_absolute() {
        return path.resolve(None).ok();
    }
    match base {
        Some(base) => path.resolve(Some(base)).ok(),
        None => match path {
            LinkPath::Relative {
                upward, components, ..
            } if *upward >= 1 && components.is_empty() => None,
            _ => Some(path.link_core()),
        },
    }
}

pub(crate) fn pack_wiki_link(
    p: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    // A link that is only a search fragment points at the page itself.
    let link = find_text(tokens, Kind::LinkCore).unwrap_or_else(|| ".".into());
    let Ok(path) = LinkPath::from_link_core(&link) else {
        return Err(Reject::Local(pos));
    };
    let base = p
        .env
        .format
        .base_page
        .as_deref()
        .map(LinkPath::from_page_name);
    let Some(page) = resolve_written(&path, base.as_ref()) else {
        return Err(Reject::Local(pos));
    };
    if p.env.format.link_blacklist.contains(&page) {
        return Err(Reject::Local(pos));
    }

    // A word glued to the closing brackets extends the display title:
    // the written one when present, the resolved page name otherwise.
    // The trail leaf stays where the source has it, as anonymous text,
    // so the combined title only exists in the payload.
    let mut title_text = None;
    if let Some(&trail_index) = tokens.attrs.get(&Kind::TitleTrail) {
        let trail = tokens.children[trail_index].text().into_owned();
        title_text = Some(match tokens.attrs.get(&Kind::LinkTitle) {
            None => format!("{page}{trail}"),
            Some(&title_index) => format!("{}{trail}", tokens.children[title_index].text()),
        });
        tokens.children[trail_index].set_kind(None);
        tokens.attrs.shift_remove(&Kind::TitleTrail);
    }

    let fragment = tokens.attrs.get(&Kind::SearchFragment).map(|&index| {
        let node = &tokens.children[index];
        match node.data() {
            Some(NodeData::Unescaped(text)) => text.clone(),
            _ => node.text().into_owned(),
        }
    });
    let anchor = find_text(tokens, Kind::AnchorRef);

    tokens.data = Some(NodeData::WikiLink(Box::new(WikiLinkData {
        link_path: Some(path),
        page,
        fragment,
        anchor,
        title_text,
    })));
    Ok(Emit::Keep)
}

// -------- Anchors --------

pub(crate) fn pack_anchor(
    _: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(name) = find_text(tokens, Kind::AnchorName) else {
        return Err(Reject::Local(pos));
    };
    tokens.data = Some(NodeData::Anchor(name));
    Ok(Emit::Keep)
}

// -------- Attributes and insertions --------

pub(crate) fn open_attr_quote(
    p: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(quote) = tokens.children.first() else {
        return Err(Reject::Local(pos));
    };
    let quote = quote.text().into_owned();
    p.env.set_attr_quote_outside_top(quote);
    Ok(Emit::Keep)
}

/// The closing run must repeat the opening run exactly; any other run
/// of quoting characters belongs to the value.
pub(crate) fn close_attr_quote(
    p: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let run = tokens.children.first().map(Node::text);
    if run.as_deref() != p.env.attr_quote() {
        return Err(Reject::Local(pos));
    }
    Ok(Emit::Keep)
}

pub(crate) fn pack_attribute(
    _: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(key) = find_text(tokens, Kind::Key) else {
        return Err(Reject::Local(pos));
    };
    let pairs = tokens
        .children
        .iter()
        .filter(|child| child.kind() == Some(Kind::Value))
        .map(|child| (key.clone(), child.text().into_owned()))
        .collect();
    tokens.data = Some(NodeData::Attribute { pairs });
    Ok(Emit::Keep)
}

pub(crate) fn pack_insertion(
    _: &mut Parser<'_, '_>,
    pos: usize,
    tokens: &mut NonTerminal,
) -> Result<Emit, Reject> {
    let Some(key) = find_text(tokens, Kind::Key) else {
        return Err(Reject::Local(pos));
    };
    let mut values = tokens
        .children
        .iter()
        .filter(|child| child.kind() == Some(Kind::Value))
        .map(|child| child.text().into_owned());
    let Some(value) = values.next() else {
        return Err(Reject::Local(pos));
    };
    let appendices = values.collect();
    tokens.data = Some(NodeData::Insertion(Box::new(InsertionData {
        key,
        value,
        appendices,
    })));
    Ok(Emit::Keep)
}

//! Relaxed automatic linking.
//!
//! After a parse, plain text can be rescanned for occurrences of known
//! page names written as ordinary prose. A match becomes a link node
//! carrying the page it was recognized as, with the written text as
//! its title, so renderers treat it like a written link.

use std::{cmp::Reverse, mem, ops::Range, sync::LazyLock};

use regex::Regex;

use crate::{
    codemap::Span,
    engine::Reject,
    env::CancelHandle,
    node::{Kind, Node, NodeData, NonTerminal, Terminal, WikiLinkData},
};

static WORD_PARTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\W]+").unwrap());

/// Compiled recognizers for the page names automatic linking should
/// find in plain text.
#[derive(Clone, Debug)]
pub struct AutoLinkInfo {
    matchers: Vec<(Regex, String)>,
}

impl AutoLinkInfo {
    /// Builds recognizers from page names. Each name matches
    /// case-insensitively, with any run of punctuation or whitespace
    /// standing in for the separators written in the name. Longer
    /// names take precedence over shorter ones.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut entries = Vec::new();
        for word in words {
            let parts = WORD_PARTS
                .split(word)
                .filter(|part| !part.is_empty())
                .map(regex::escape)
                .collect::<Vec<_>>();
            if parts.is_empty() {
                continue;
            }
            let pattern = format!(r"(?i)\b{}\b", parts.join(r"[\W]+"));
            let Ok(matcher) = Regex::new(&pattern) else {
                log::debug!("skipping unmatchable auto-link word {word:?}");
                continue;
            };
            entries.push((matcher, word.to_owned()));
        }
        entries.sort_by_key(|(_, word)| Reverse(word.chars().count()));
        Self { matchers: entries }
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    fn earliest_match(&self, text: &str) -> Option<(Range<usize>, &str)> {
        let mut best: Option<(Range<usize>, &str)> = None;
        for (matcher, page) in &self.matchers {
            let Some(found) = matcher.find(text) else {
                continue;
            };
            let better = best
                .as_ref()
                .map_or(true, |(range, _)| found.start() < range.start);
            if better {
                let at_start = found.start() == 0;
                best = Some((found.range(), page));
                if at_start {
                    break;
                }
            }
        }
        best
    }
}

/// Replaces recognized page names in every plain-text leaf below
/// `parent` with link nodes. The handle is polled once per leaf.
pub(crate) fn rewrite_children(
    info: &AutoLinkInfo,
    parent: &mut NonTerminal,
    cancel: &CancelHandle,
) -> Result<(), Reject> {
    let children = mem::take(&mut parent.children);
    let mut out = Vec::with_capacity(children.len());
    for mut node in children {
        match node {
            Node::Terminal(leaf) if leaf.kind == Some(Kind::PlainText) => {
                if cancel.is_cancelled() {
                    return Err(Reject::Cancelled);
                }
                link_leaf(info, leaf, &mut out);
            }
            _ => {
                if let Some(inner) = node.as_non_terminal_mut() {
                    rewrite_children(info, inner, cancel)?;
                }
                out.push(node);
            }
        }
    }
    parent.replace_children(out);
    Ok(())
}

fn plain_piece(text: &str, base: usize, range: Range<usize>) -> Node {
    Terminal::new(
        &text[range.clone()],
        Span::new(base + range.start, base + range.end),
        Some(Kind::PlainText),
    )
    .into()
}

fn link_piece(text: &str, base: usize, range: Range<usize>, page: &str) -> Node {
    let span = Span::new(base + range.start, base + range.end);
    let written = &text[range];
    let core = Terminal::new(written, span, Some(Kind::LinkCore));
    let mut link = NonTerminal::new(vec![core.into()], span.start, Some(Kind::WikiLink));
    link.data = Some(NodeData::WikiLink(Box::new(WikiLinkData {
        link_path: None,
        page: page.to_owned(),
        fragment: None,
        anchor: None,
        title_text: Some(written.to_owned()),
    })));
    link.into()
}

fn link_leaf(info: &AutoLinkInfo, leaf: Terminal, out: &mut Vec<Node>) {
    let base = leaf.span.start;
    let text = leaf.text.as_str();
    let mut pieces = Vec::new();
    let mut cursor = 0;
    let mut search = 0;
    while search < text.len() {
        let Some((range, page)) = info.earliest_match(&text[search..]) else {
            break;
        };
        let start = search + range.start;
        let end = search + range.end;
        if start == end {
            // A degenerate recognizer matched nothing; step past it.
            search = end + text[end..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        if cursor < start {
            pieces.push(plain_piece(text, base, cursor..start));
        }
        pieces.push(link_piece(text, base, start..end, page));
        cursor = end;
        search = end;
    }
    if pieces.is_empty() {
        out.push(leaf.into());
        return;
    }
    if cursor < text.len() {
        pieces.push(plain_piece(text, base, cursor..text.len()));
    }
    out.append(&mut pieces);
}

//! Helper trait for implementing syntax tree walkers.

use std::convert::Infallible;

use crate::{
    codemap::Span,
    node::{
        InsertionData, Kind, Node, NodeData, NodeFlags, NonTerminal, SyntheticTag, Terminal,
        UrlLinkData, WikiLinkData,
    },
};

fn named<'n>(node: &'n NonTerminal, kind: Kind) -> Option<&'n Node> {
    node.attrs.get(&kind).map(|&index| &node.children[index])
}

/// A trait for visiting the nodes of a parsed page.
///
/// The default methods walk the tree the way an exporter does: children
/// flagged as grammar plumbing are skipped, or replaced by their own
/// children when the flag says to keep descending, so implementors see
/// constructs and synthetic tags without the markup scaffolding between
/// them.
pub trait Visitor<'n, E> {
    /// Visits an anchor definition.
    #[inline]
    fn visit_anchor(&mut self, _node: &'n NonTerminal, _name: &'n str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a page attribute.
    #[inline]
    fn visit_attribute(
        &mut self,
        _node: &'n NonTerminal,
        _pairs: &'n [(String, String)],
    ) -> Result<(), E> {
        Ok(())
    }

    /// Visits the children of a non-terminal.
    #[inline]
    fn visit_children(&mut self, node: &'n NonTerminal) -> Result<(), E> {
        visit_children(self, node)
    }

    /// Visits a footnote.
    #[inline]
    fn visit_footnote(&mut self, _node: &'n NonTerminal, _id: &'n str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a heading.
    #[inline]
    fn visit_heading(&mut self, node: &'n NonTerminal, level: u8) -> Result<(), E> {
        visit_heading(self, node, level)
    }

    /// Visits an insertion.
    #[inline]
    fn visit_insertion(
        &mut self,
        _node: &'n NonTerminal,
        _data: &'n InsertionData,
    ) -> Result<(), E> {
        Ok(())
    }

    /// Visits a single node.
    #[inline]
    fn visit_node(&mut self, node: &'n Node) -> Result<(), E> {
        visit_node(self, node)
    }

    /// Visits a non-terminal no more specific hook applies to.
    #[inline]
    fn visit_other(&mut self, node: &'n NonTerminal) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a plain text leaf.
    #[inline]
    fn visit_plain_text(&mut self, _span: Span, _text: &'n str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a synthetic tag with no textual form in the source.
    #[inline]
    fn visit_synthetic_tag(&mut self, _span: Span, _tag: &'n SyntheticTag) -> Result<(), E> {
        Ok(())
    }

    /// Visits a terminal no more specific hook applies to.
    #[inline]
    fn visit_terminal(&mut self, _leaf: &'n Terminal) -> Result<(), E> {
        Ok(())
    }

    /// Visits a todo entry.
    #[inline]
    fn visit_todo(&mut self, node: &'n NonTerminal) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits an external link or image.
    #[inline]
    fn visit_url_link(&mut self, node: &'n NonTerminal, data: &'n UrlLinkData) -> Result<(), E> {
        visit_url_link(self, node, data)
    }

    /// Visits an internal link.
    #[inline]
    fn visit_wiki_link(&mut self, node: &'n NonTerminal, data: &'n WikiLinkData) -> Result<(), E> {
        visit_wiki_link(self, node, data)
    }
}

/// Default implementation of [`Visitor::visit_children`].
pub fn visit_children<'n, V, E>(visitor: &mut V, node: &'n NonTerminal) -> Result<(), E>
where
    V: Visitor<'n, E> + ?Sized,
{
    for child in &node.children {
        let flags = child.flags();
        if flags.contains(NodeFlags::HELPER) {
            if flags.contains(NodeFlags::HELPER_RECURSIVE) {
                if let Node::NonTerminal(inner) = child {
                    visitor.visit_children(inner)?;
                }
            }
            continue;
        }
        visitor.visit_node(child)?;
    }
    Ok(())
}

/// Default implementation of [`Visitor::visit_heading`]. Walks the
/// heading's content, not its markers.
#[inline]
pub fn visit_heading<'n, V, E>(visitor: &mut V, node: &'n NonTerminal, _level: u8) -> Result<(), E>
where
    V: Visitor<'n, E> + ?Sized,
{
    if let Some(Node::NonTerminal(content)) = named(node, Kind::HeadingContent) {
        visitor.visit_children(content)?;
    }
    Ok(())
}

/// Default implementation of [`Visitor::visit_url_link`]. Walks the
/// written title, if any.
#[inline]
pub fn visit_url_link<'n, V, E>(
    visitor: &mut V,
    node: &'n NonTerminal,
    _data: &'n UrlLinkData,
) -> Result<(), E>
where
    V: Visitor<'n, E> + ?Sized,
{
    if let Some(Node::NonTerminal(title)) = named(node, Kind::LinkTitle) {
        visitor.visit_children(title)?;
    }
    Ok(())
}

/// Default implementation of [`Visitor::visit_wiki_link`]. Walks the
/// written title, if any.
#[inline]
pub fn visit_wiki_link<'n, V, E>(
    visitor: &mut V,
    node: &'n NonTerminal,
    _data: &'n WikiLinkData,
) -> Result<(), E>
where
    V: Visitor<'n, E> + ?Sized,
{
    if let Some(Node::NonTerminal(title)) = named(node, Kind::LinkTitle) {
        visitor.visit_children(title)?;
    }
    Ok(())
}

/// Default implementation of [`Visitor::visit_node`].
pub fn visit_node<'n, V, E>(visitor: &mut V, node: &'n Node) -> Result<(), E>
where
    V: Visitor<'n, E> + ?Sized,
{
    match node {
        Node::Terminal(leaf) => {
            if let Some(NodeData::Synthetic(tag)) = &leaf.data {
                visitor.visit_synthetic_tag(leaf.span, tag)
            } else if leaf.kind == Some(Kind::PlainText) {
                visitor.visit_plain_text(leaf.span, &leaf.text)
            } else {
                visitor.visit_terminal(leaf)
            }
        }
        Node::NonTerminal(inner) => match &inner.data {
            Some(NodeData::Synthetic(tag)) => visitor.visit_synthetic_tag(inner.span, tag),
            Some(NodeData::Heading { level }) => visitor.visit_heading(inner, *level),
            Some(NodeData::WikiLink(data)) => visitor.visit_wiki_link(inner, data),
            Some(NodeData::UrlLink(data)) => visitor.visit_url_link(inner, data),
            Some(NodeData::Attribute { pairs }) => visitor.visit_attribute(inner, pairs),
            Some(NodeData::Insertion(data)) => visitor.visit_insertion(inner, data),
            Some(NodeData::Footnote(id)) => visitor.visit_footnote(inner, id),
            Some(NodeData::Anchor(name)) => visitor.visit_anchor(inner, name),
            _ if inner.kind == Some(Kind::TodoEntry) => visitor.visit_todo(inner),
            _ => visitor.visit_other(inner),
        },
    }
}

/// The text a reader of the rendered page would see below `node`:
/// plain text runs and link titles, without markup, markers, or
/// invisible elements like attributes and anchors.
pub fn text_content(node: &Node) -> String {
    #[derive(Default)]
    struct Collect {
        out: String,
    }

    impl<'n> Visitor<'n, Infallible> for Collect {
        fn visit_plain_text(&mut self, _span: Span, text: &'n str) -> Result<(), Infallible> {
            self.out.push_str(text);
            Ok(())
        }

        fn visit_footnote(
            &mut self,
            _node: &'n NonTerminal,
            id: &'n str,
        ) -> Result<(), Infallible> {
            self.out.push_str(id);
            Ok(())
        }

        fn visit_url_link(
            &mut self,
            node: &'n NonTerminal,
            data: &'n UrlLinkData,
        ) -> Result<(), Infallible> {
            if named(node, Kind::LinkTitle).is_some() {
                return visit_url_link(self, node, data);
            }
            self.out.push_str(&data.url);
            Ok(())
        }

        fn visit_wiki_link(
            &mut self,
            node: &'n NonTerminal,
            data: &'n WikiLinkData,
        ) -> Result<(), Infallible> {
            if let Some(title) = &data.title_text {
                self.out.push_str(title);
            } else if named(node, Kind::LinkTitle).is_some() {
                return visit_wiki_link(self, node, data);
            } else if let Some(core) = named(node, Kind::LinkCore) {
                self.out.push_str(&core.text());
            }
            Ok(())
        }

        // Line structure is carried by whitespace nodes whose leaves are
        // anonymous, so they need to be spelled out rather than walked.
        fn visit_other(&mut self, node: &'n NonTerminal) -> Result<(), Infallible> {
            match node.kind {
                Some(Kind::Whitespace | Kind::ParagraphBreak) => {
                    for child in &node.children {
                        child.write_text(&mut self.out);
                    }
                    Ok(())
                }
                Some(Kind::NoExport) => Ok(()),
                _ => visit_children(self, node),
            }
        }
    }

    let mut collector = Collect::default();
    match visit_node(&mut collector, node) {
        Ok(()) => collector.out,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str, start: usize) -> Node {
        Terminal::new(
            text,
            Span::new(start, start + text.len()),
            Some(Kind::PlainText),
        )
        .into()
    }

    #[test]
    fn test_helpers_are_skipped() {
        let mut marker = Terminal::new("* ", Span::new(0, 2), Some(Kind::ListMarker));
        marker.flags |= NodeFlags::HELPER;
        let mut list = NonTerminal::new(
            vec![
                marker.into(),
                Terminal::synthetic(2, SyntheticTag::start("ul")).into(),
                plain("item", 2),
                Terminal::synthetic(6, SyntheticTag::end("ul")).into(),
            ],
            0,
            Some(Kind::List),
        );
        list.flags |= NodeFlags::HELPER | NodeFlags::HELPER_RECURSIVE;
        let doc = NonTerminal::new(vec![list.into()], 0, Some(Kind::Document)).into();
        assert_eq!(text_content(&doc), "item");
    }

    #[test]
    fn test_synthetic_tags_are_dispatched() {
        struct Tags(Vec<String>);
        impl<'n> Visitor<'n, Infallible> for Tags {
            fn visit_synthetic_tag(
                &mut self,
                _span: Span,
                tag: &'n SyntheticTag,
            ) -> Result<(), Infallible> {
                self.0.push(tag.to_string());
                Ok(())
            }
        }

        let doc: Node = NonTerminal::new(
            vec![
                Terminal::synthetic(0, SyntheticTag::start("tr")).into(),
                plain("x", 0),
                Terminal::synthetic(1, SyntheticTag::end("tr")).into(),
            ],
            0,
            Some(Kind::Document),
        )
        .into();
        let mut tags = Tags(Vec::new());
        let Ok(()) = visit_node(&mut tags, &doc);
        assert_eq!(tags.0, ["<tr>", "</tr>"]);
    }
}

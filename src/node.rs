//! Syntax tree produced by the parser.

use crate::{codemap::Span, link::LinkPath};
use indexmap::IndexMap;
use std::{borrow::Cow, fmt};

/// The name of a syntax tree node.
///
/// Nodes which exist in the tree only to hold consumed delimiter text (the
/// quotes around bold text, the brackets around a link) are anonymous and
/// have no kind at all.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// The root node of a parsed page.
    Document,
    /// A run of text without markup.
    PlainText,
    /// The zero-length terminal at the end of input.
    InputEnd,

    /// Bold text.
    ///
    /// ```wikitext
    /// '''important'''
    /// ```
    Bold,
    /// Italic text.
    ///
    /// ```wikitext
    /// ''emphasised''
    /// ```
    Italics,
    /// An inline script block.
    ///
    /// ```wikitext
    /// <%version%>
    /// ```
    Script,
    /// The payload of a script block.
    ///
    /// ```wikitext
    /// <%version%>
    ///   ^^^^^^^
    /// ```
    Code,
    /// A horizontal rule on a line of its own.
    ///
    /// ```wikitext
    /// ----
    /// ```
    HorizontalRule,

    /// A heading. Carries [`NodeData::Heading`].
    ///
    /// ```wikitext
    /// == History ==
    /// ```
    Heading,
    /// The run of `=` characters which opens a heading.
    HeadingOpen,
    /// The text of a heading.
    HeadingContent,
    /// The run of `=` characters which closes a heading.
    HeadingClose,

    /// An empty-line paragraph separator.
    ParagraphBreak,
    /// A single line break inside flowing text.
    Whitespace,

    /// A run of consecutive list items.
    ///
    /// ```wikitext
    /// * first
    /// ** nested
    /// # numbered
    /// ```
    List,
    /// The bullet characters which start the first item of a list.
    ListMarker,
    /// The bullet characters of a later item in a list which is already
    /// open.
    ListContinuation,
    /// The zero-length terminal which closes a list.
    ListEnd,

    /// A preformatted block written as space-indented lines.
    PreSpace,
    /// A preformatted block delimited by `<pre>` tags.
    PreHtml,

    /// A verbatim HTML tag.
    HtmlTag,
    /// A character entity like `&amp;` or `&#160;`.
    HtmlEntity,
    /// A zero-length node describing markup that has no textual form in the
    /// source, like the `<ul>` implied by a bullet. Carries
    /// [`NodeData::Synthetic`].
    HtmlEquivalent,
    /// A complete `<body>…</body>` block of raw HTML.
    BodyHtml,
    /// The text between the body tags.
    BodyHtmlText,

    /// An unexported single-line region, before post-processing.
    NoExportLine,
    /// A region excluded from export.
    ///
    /// ```wikitext
    /// <hide>draft notes</hide>
    /// ```
    NoExport,

    /// A table.
    ///
    /// ```wikitext
    /// {|
    /// ! Heading
    /// |-
    /// | Cell
    /// |}
    /// ```
    Table,
    /// A table row.
    TableRow,
    /// A table cell, plain or heading.
    TableCell,
    /// The content of a table cell.
    TableCellContent,

    /// A single `name="value"` attribute of a table element.
    HtmlAttribute,
    /// The name of an HTML attribute.
    HtmlAttributeKey,
    /// The value of an HTML attribute.
    HtmlAttributeValue,
    /// The attribute list of a table. Carries [`NodeData::HtmlAttributes`].
    TableAttributes,
    /// The attribute list of a table caption.
    CaptionAttributes,
    /// The attribute list of a table row.
    RowAttributes,
    /// The attribute list of a table cell.
    CellAttributes,

    /// An internal link to another page. Carries [`NodeData::WikiLink`].
    ///
    /// ```wikitext
    /// [[SubPage/Details#fragment|displayed title]]
    /// ```
    WikiLink,
    /// The page path inside an internal link.
    LinkCore,
    /// A search fragment inside an internal link. Carries
    /// [`NodeData::Unescaped`].
    ///
    /// ```wikitext
    /// [[Page#what to find]]
    ///        ^^^^^^^^^^^^
    /// ```
    SearchFragment,
    /// An anchor reference inside an internal link.
    ///
    /// ```wikitext
    /// [[Page!anchor]]
    ///        ^^^^^^
    /// ```
    AnchorRef,
    /// The title part of a link.
    LinkTitle,
    /// Word characters which directly follow the closing bracket of an
    /// internal link and are displayed as part of its title.
    ///
    /// ```wikitext
    /// [[Letter]]s
    ///           ^
    /// ```
    TitleTrail,

    /// A footnote. Carries [`NodeData::Footnote`].
    ///
    /// ```wikitext
    /// [[42]]
    /// ```
    Footnote,
    /// The number of a footnote.
    FootnoteId,

    /// An external link written without brackets, before post-processing.
    UrlBare,
    /// An external link written in brackets, before post-processing.
    UrlBracketed,
    /// An external link or image. Carries [`NodeData::UrlLink`].
    ///
    /// ```wikitext
    /// https://example.org/page
    /// [https://example.org/page an example]
    /// [[https://example.org/logo.png|right|Logo]]
    /// ```
    UrlLink,
    /// The URL itself inside an external link.
    UrlCore,
    /// A settings appendix attached to a link. Carries [`NodeData::Appendix`].
    ///
    /// ```wikitext
    /// https://example.org>s=red;A=right
    ///                     ^^^^^^^^^^^^
    /// ```
    Appendix,
    /// A single `key=data` entry of an appendix.
    AppendixEntry,

    /// An image link written in double brackets, before post-processing.
    Image,
    /// One option of an image link.
    ///
    /// ```wikitext
    /// [[https://example.org/a.png|thumb|right|100px]]
    ///                             ^^^^^ ^^^^^ ^^^^^
    /// ```
    ImageOption,
    /// A bare keyword image option like `right` or `upright`.
    ImageKeyword,
    /// A pixel size image option like `100px` or `100pxx50px`.
    ImageSize,

    /// A page attribute. Carries [`NodeData::Attribute`].
    ///
    /// ```wikitext
    /// [[alias: OtherName]]
    /// ```
    Attribute,
    /// An insertion. Carries [`NodeData::Insertion`].
    ///
    /// ```wikitext
    /// [[:page: SomePage; children]]
    /// ```
    Insertion,
    /// The key of an attribute, insertion, todo entry, or appendix entry.
    Key,
    /// The value of an attribute, insertion, image option, or todo entry.
    Value,
    /// The data part of an appendix entry.
    Data,

    /// A todo entry.
    ///
    /// ```wikitext
    /// todo.ui: redesign the dialog
    /// ```
    TodoEntry,
    /// The `:` between the key and value of a todo entry.
    TodoDelimiter,

    /// An anchor definition on a line of its own.
    ///
    /// ```wikitext
    /// anchor: target
    /// ```
    AnchorDef,
    /// The name of a defined anchor. Carries [`NodeData::Anchor`] on the
    /// parent definition.
    AnchorName,

    /// The root node used when extracting a link from isolated text.
    ExtractedLink,
}

bitflags::bitflags! {
    /// Marks nodes which exist to support later processing stages rather
    /// than to represent visible document structure.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct NodeFlags: u8 {
        /// The node is structural support, not document content.
        const HELPER = 1 << 0;
        /// Every named descendant of the node is also structural support.
        const HELPER_RECURSIVE = 1 << 1;
    }
}

/// An HTML tag with no textual form in the source, attached to an
/// [`Kind::HtmlEquivalent`] node.
///
/// A bullet list like `* a` has no `<ul>` or `<li>` anywhere in its text, but
/// an HTML rendering needs both. The parser inserts zero-length nodes
/// carrying these tags so that emitters can write a well-formed tag stream
/// without re-deriving list structure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SyntheticTag {
    /// An opening tag, with raw (unescaped) attribute values.
    Start {
        /// The tag name.
        tag: &'static str,
        /// Attribute key-value pairs, stored unescaped.
        attributes: Vec<(String, String)>,
    },
    /// A closing tag.
    End {
        /// The tag name.
        tag: &'static str,
    },
}

impl SyntheticTag {
    /// Creates an opening tag without attributes.
    pub fn start(tag: &'static str) -> Self {
        Self::Start {
            tag,
            attributes: Vec::new(),
        }
    }

    /// Creates a closing tag.
    pub fn end(tag: &'static str) -> Self {
        Self::End { tag }
    }

    /// The tag name.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Start { tag, .. } | Self::End { tag } => tag,
        }
    }
}

impl fmt::Display for SyntheticTag {
    /// Writes the tag as HTML text, escaping attribute values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { tag, attributes } => {
                write!(f, "<{tag}")?;
                for (key, value) in attributes {
                    write!(
                        f,
                        " {key}=\"{}\"",
                        html_escape::encode_double_quoted_attribute(value)
                    )?;
                }
                write!(f, ">")
            }
            Self::End { tag } => write!(f, "</{tag}>"),
        }
    }
}

/// Derived information about an internal link, attached to a
/// [`Kind::WikiLink`] node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WikiLinkData {
    /// The link path as written, preserving whether the link was absolute
    /// or relative. Absent on links produced by the auto-link pass, which
    /// have no written form.
    pub link_path: Option<LinkPath>,
    /// The absolute name of the target page, resolved against the page the
    /// link appears on.
    pub page: String,
    /// The search fragment with escapes removed, if one was given.
    pub fragment: Option<String>,
    /// The anchor reference, if one was given.
    pub anchor: Option<String>,
    /// The full display title, when the tree does not hold it as one
    /// node: links made by the auto-link pass have no written form, and
    /// a trailing word extends the title here rather than in the tree. A
    /// plain written title stays a [`Kind::LinkTitle`] child instead.
    pub title_text: Option<String>,
}

/// Derived information about an external link or image, attached to a
/// [`Kind::UrlLink`] node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UrlLinkData {
    /// The URL as written.
    pub url: String,
    /// Whether the link was written in bracketed form.
    pub bracketed: bool,
    /// CSS classes implied by image options, separated by spaces.
    pub css_class: Option<String>,
    /// The effective appendix, combining any written appendix with entries
    /// implied by the link form.
    pub appendix: AppendixData,
}

/// The interpreted entries of a settings appendix.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AppendixData {
    /// All `key=data` entries in written order.
    pub entries: Vec<(String, String)>,
    /// CSS classes from a `class=` entry, separated by spaces.
    pub css_class: Option<String>,
    /// Horizontal alignment from an `align=` entry.
    pub text_align: Option<String>,
}

/// The interpreted parts of an insertion, attached to a [`Kind::Insertion`]
/// node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InsertionData {
    /// The insertion key.
    pub key: String,
    /// The primary value.
    pub value: String,
    /// Any further values after the first.
    pub appendices: Vec<String>,
}

/// Extra information computed for a node during parsing.
///
/// Everything here is derived from node text and parse context. It is stored
/// on the tree so consumers do not have to repeat the interpretation.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    /// Text with escape sequences removed.
    Unescaped(String),
    /// A tag with no textual form in the source.
    Synthetic(SyntheticTag),
    /// The level of a heading, from the shorter of its delimiter runs.
    Heading {
        /// The heading level, starting at 1.
        level: u8,
    },
    /// Derived information about an internal link.
    WikiLink(Box<WikiLinkData>),
    /// Derived information about an external link or image.
    UrlLink(Box<UrlLinkData>),
    /// The interpreted entries of a settings appendix.
    Appendix(AppendixData),
    /// The key-value pairs of a page attribute. A multi-value attribute
    /// like `[[key: a; b]]` produces one pair per value.
    Attribute {
        /// Key-value pairs in written order.
        pairs: Vec<(String, String)>,
    },
    /// The interpreted parts of an insertion.
    Insertion(Box<InsertionData>),
    /// The interpreted attribute list of a table element.
    HtmlAttributes(Vec<(String, String)>),
    /// The number of a footnote, as written.
    Footnote(String),
    /// The name defined by an anchor definition.
    Anchor(String),
}

/// A leaf node holding a run of source text.
///
/// The text usually equals the source slice covered by `span`, but not
/// always: post-processing steps trim trailing whitespace from link cores
/// and insert zero-length nodes with no text at all.
#[derive(Clone, Debug, PartialEq)]
pub struct Terminal {
    /// The source range the node covers.
    pub span: Span,
    /// The node name, or `None` for anonymous delimiter text.
    pub kind: Option<Kind>,
    /// The text of the node.
    pub text: String,
    /// Structural support marks.
    pub flags: NodeFlags,
    /// Extra derived information.
    pub data: Option<NodeData>,
}

impl Terminal {
    /// Creates a terminal covering `span` of the source.
    pub fn new(text: impl Into<String>, span: Span, kind: Option<Kind>) -> Self {
        Self {
            span,
            kind,
            text: text.into(),
            flags: NodeFlags::empty(),
            data: None,
        }
    }

    /// Creates a zero-length terminal at `pos` carrying a tag with no
    /// textual form.
    pub fn synthetic(pos: usize, tag: SyntheticTag) -> Self {
        Self {
            span: Span::new(pos, pos),
            kind: Some(Kind::HtmlEquivalent),
            text: String::new(),
            flags: NodeFlags::empty(),
            data: Some(NodeData::Synthetic(tag)),
        }
    }
}

/// An interior node holding child nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct NonTerminal {
    /// The source range the node covers.
    pub span: Span,
    /// The node name, or `None` for anonymous groups.
    pub kind: Option<Kind>,
    /// Child nodes in source order.
    pub children: Vec<Node>,
    /// Named captures: the index in `children` of the last direct child
    /// with each kind. A later sibling with the same kind overwrites an
    /// earlier one here, though both stay in `children`.
    pub attrs: IndexMap<Kind, usize>,
    /// Structural support marks.
    pub flags: NodeFlags,
    /// Extra derived information.
    pub data: Option<NodeData>,
}

impl NonTerminal {
    /// Creates an interior node whose span encloses `children`, or is empty
    /// at `start` if there are none.
    pub fn new(children: Vec<Node>, start: usize, kind: Option<Kind>) -> Self {
        let end = children
            .iter()
            .map(|child| child.span().end)
            .max()
            .unwrap_or(start)
            .max(start);
        let attrs = Self::index_of(&children);
        Self {
            span: Span::new(start, end),
            kind,
            children,
            attrs,
            flags: NodeFlags::empty(),
            data: None,
        }
    }

    /// Adds a child at the end, keeping the named captures current.
    pub(crate) fn push_child(&mut self, child: Node) {
        self.span = self.span.merge(child.span());
        if let Some(kind) = child.kind() {
            self.attrs.insert(kind, self.children.len());
        }
        self.children.push(child);
    }

    /// Replaces all children, keeping the named captures current.
    pub(crate) fn replace_children(&mut self, children: Vec<Node>) {
        self.attrs = Self::index_of(&children);
        self.children = children;
    }

    fn index_of(children: &[Node]) -> IndexMap<Kind, usize> {
        let mut attrs = IndexMap::new();
        for (index, child) in children.iter().enumerate() {
            if let Some(kind) = child.kind() {
                attrs.insert(kind, index);
            }
        }
        attrs
    }
}

/// A node of the syntax tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A leaf node holding text.
    Terminal(Terminal),
    /// An interior node holding children.
    NonTerminal(NonTerminal),
}

impl Node {
    /// The source range the node covers.
    #[inline]
    pub fn span(&self) -> Span {
        match self {
            Self::Terminal(t) => t.span,
            Self::NonTerminal(nt) => nt.span,
        }
    }

    /// The node name, or `None` for anonymous nodes.
    #[inline]
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Self::Terminal(t) => t.kind,
            Self::NonTerminal(nt) => nt.kind,
        }
    }

    /// Renames the node.
    #[inline]
    pub(crate) fn set_kind(&mut self, kind: Option<Kind>) {
        match self {
            Self::Terminal(t) => t.kind = kind,
            Self::NonTerminal(nt) => nt.kind = kind,
        }
    }

    /// Structural support marks.
    #[inline]
    pub fn flags(&self) -> NodeFlags {
        match self {
            Self::Terminal(t) => t.flags,
            Self::NonTerminal(nt) => nt.flags,
        }
    }

    #[inline]
    pub(crate) fn flags_mut(&mut self) -> &mut NodeFlags {
        match self {
            Self::Terminal(t) => &mut t.flags,
            Self::NonTerminal(nt) => &mut nt.flags,
        }
    }

    /// Extra derived information attached to the node.
    #[inline]
    pub fn data(&self) -> Option<&NodeData> {
        match self {
            Self::Terminal(t) => t.data.as_ref(),
            Self::NonTerminal(nt) => nt.data.as_ref(),
        }
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut Option<NodeData> {
        match self {
            Self::Terminal(t) => &mut t.data,
            Self::NonTerminal(nt) => &mut nt.data,
        }
    }

    /// Whether the node is a leaf.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// The node as a leaf, if it is one.
    #[inline]
    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::NonTerminal(_) => None,
        }
    }

    #[inline]
    pub(crate) fn as_terminal_mut(&mut self) -> Option<&mut Terminal> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::NonTerminal(_) => None,
        }
    }

    /// The node as an interior node, if it is one.
    #[inline]
    pub fn as_non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Self::Terminal(_) => None,
            Self::NonTerminal(nt) => Some(nt),
        }
    }

    #[inline]
    pub(crate) fn as_non_terminal_mut(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Self::Terminal(_) => None,
            Self::NonTerminal(nt) => Some(nt),
        }
    }

    /// The direct children of the node. Empty for leaves.
    #[inline]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Terminal(_) => &[],
            Self::NonTerminal(nt) => &nt.children,
        }
    }

    /// The named capture for the given kind: the last direct child with
    /// that kind.
    pub fn find(&self, kind: Kind) -> Option<&Node> {
        match self {
            Self::Terminal(_) => None,
            Self::NonTerminal(nt) => nt.attrs.get(&kind).map(|&index| &nt.children[index]),
        }
    }

    pub(crate) fn find_mut(&mut self, kind: Kind) -> Option<&mut Node> {
        match self {
            Self::Terminal(_) => None,
            Self::NonTerminal(nt) => nt
                .attrs
                .get(&kind)
                .map(|&index| &mut nt.children[index]),
        }
    }

    /// All direct children with the given kind, in order.
    pub fn find_all(&self, kind: Kind) -> impl Iterator<Item = &Node> {
        self.children()
            .iter()
            .filter(move |child| child.kind() == Some(kind))
    }

    /// All descendants with the given kind, in depth-first pre-order. A
    /// matching node is yielded and then searched itself.
    pub fn find_deep<'a>(&'a self, kind: Kind) -> FindDeep<'a> {
        FindDeep {
            stack: vec![self.children().iter()],
            kind,
        }
    }

    /// The concatenated text of every leaf in the subtree.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Terminal(t) => Cow::Borrowed(&t.text),
            Self::NonTerminal(_) => {
                let mut out = String::new();
                self.write_text(&mut out);
                Cow::Owned(out)
            }
        }
    }

    /// Appends the text of every leaf in the subtree to `out`.
    pub fn write_text(&self, out: &mut String) {
        match self {
            Self::Terminal(t) => out.push_str(&t.text),
            Self::NonTerminal(nt) => {
                for child in &nt.children {
                    child.write_text(out);
                }
            }
        }
    }

    /// Derived link information, if the node is an internal link.
    pub fn wiki_link(&self) -> Option<&WikiLinkData> {
        match self.data() {
            Some(NodeData::WikiLink(data)) => Some(data),
            _ => None,
        }
    }

    /// Derived link information, if the node is an external link or image.
    pub fn url_link(&self) -> Option<&UrlLinkData> {
        match self.data() {
            Some(NodeData::UrlLink(data)) => Some(data),
            _ => None,
        }
    }

    /// The display title of an internal link. A combined title stored on
    /// the link, which includes any link trail, takes precedence over the
    /// written `LinkTitle` child.
    pub fn link_title(&self) -> Option<Cow<'_, str>> {
        if let Some(text) = self.wiki_link().and_then(|data| data.title_text.as_deref()) {
            return Some(Cow::Borrowed(text));
        }
        self.find(Kind::LinkTitle).map(Node::text)
    }
}

impl From<Terminal> for Node {
    fn from(t: Terminal) -> Self {
        Self::Terminal(t)
    }
}

impl From<NonTerminal> for Node {
    fn from(nt: NonTerminal) -> Self {
        Self::NonTerminal(nt)
    }
}

/// Iterator for [`Node::find_deep`].
pub struct FindDeep<'a> {
    stack: Vec<core::slice::Iter<'a, Node>>,
    kind: Kind,
}

impl<'a> Iterator for FindDeep<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            let Some(node) = iter.next() else {
                self.stack.pop();
                continue;
            };
            let matched = node.kind() == Some(self.kind);
            if let Node::NonTerminal(nt) = node {
                self.stack.push(nt.children.iter());
            }
            if matched {
                return Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(text: &str, start: usize, kind: Option<Kind>) -> Node {
        Terminal::new(text, Span::new(start, start + text.len()), kind).into()
    }

    #[test]
    fn test_find_returns_last_capture() {
        let tree: Node = NonTerminal::new(
            vec![
                leaf("a", 0, Some(Kind::PlainText)),
                leaf("b", 1, Some(Kind::PlainText)),
            ],
            0,
            Some(Kind::Document),
        )
        .into();
        assert_eq!(tree.find(Kind::PlainText).unwrap().text(), "b");
        assert!(tree.find(Kind::Bold).is_none());
        assert_eq!(tree.find_all(Kind::PlainText).count(), 2);
    }

    #[test]
    fn test_push_child_updates_captures() {
        let mut tree = NonTerminal::new(
            vec![leaf("a", 0, Some(Kind::PlainText))],
            0,
            Some(Kind::LinkTitle),
        );
        tree.push_child(leaf("b", 1, Some(Kind::PlainText)));
        assert_eq!(tree.attrs[&Kind::PlainText], 1);
        assert_eq!(tree.span, Span::new(0, 2));
    }

    #[test]
    fn test_find_is_shallow() {
        let inner: Node = NonTerminal::new(
            vec![leaf("x", 3, Some(Kind::PlainText))],
            3,
            Some(Kind::Bold),
        )
        .into();
        let tree: Node = NonTerminal::new(vec![inner], 0, Some(Kind::Document)).into();
        assert!(tree.find(Kind::PlainText).is_none());
        let found: Vec<_> = tree.find_deep(Kind::PlainText).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), "x");
    }

    #[test]
    fn test_find_deep_yields_match_before_descending() {
        let inner: Node = NonTerminal::new(
            vec![leaf("x", 0, Some(Kind::Bold))],
            0,
            Some(Kind::Bold),
        )
        .into();
        let tree: Node = NonTerminal::new(vec![inner], 0, None).into();
        let found: Vec<_> = tree.find_deep(Kind::Bold).collect();
        assert_eq!(found.len(), 2);
        assert!(!found[0].is_terminal());
        assert!(found[1].is_terminal());
    }

    #[test]
    fn test_text_includes_anonymous_leaves() {
        let tree: Node = NonTerminal::new(
            vec![
                leaf("'''", 0, None),
                leaf("hi", 3, Some(Kind::PlainText)),
                leaf("'''", 5, None),
            ],
            0,
            Some(Kind::Bold),
        )
        .into();
        assert_eq!(tree.text(), "'''hi'''");
        assert_eq!(tree.span(), Span::new(0, 8));
    }

    #[test]
    fn test_empty_non_terminal_span() {
        let tree = NonTerminal::new(Vec::new(), 7, Some(Kind::Document));
        assert_eq!(tree.span, Span::new(7, 7));
    }

    #[test]
    fn test_synthetic_tag_display() {
        assert_eq!(SyntheticTag::start("ul").to_string(), "<ul>");
        assert_eq!(SyntheticTag::end("li").to_string(), "</li>");
        let tag = SyntheticTag::Start {
            tag: "td",
            attributes: vec![("colspan".into(), "2".into())],
        };
        assert_eq!(tag.to_string(), "<td colspan=\"2\">");
        let tag = SyntheticTag::Start {
            tag: "td",
            attributes: vec![("title".into(), "a\"b".into())],
        };
        assert_eq!(tag.to_string(), "<td title=\"a&quot;b\">");
    }

    #[test]
    fn test_synthetic_terminal_is_empty() {
        let node: Node = Terminal::synthetic(4, SyntheticTag::start("pre")).into();
        assert_eq!(node.span(), Span::new(4, 4));
        assert_eq!(node.text(), "");
        assert_eq!(node.kind(), Some(Kind::HtmlEquivalent));
    }

    #[test]
    fn test_link_title_prefers_stored_title() {
        let written: Node = NonTerminal::new(
            vec![leaf("dog", 2, Some(Kind::PlainText))],
            2,
            Some(Kind::LinkTitle),
        )
        .into();
        let mut link = NonTerminal::new(vec![written.clone()], 0, Some(Kind::WikiLink));
        link.data = Some(NodeData::WikiLink(Box::new(WikiLinkData {
            link_path: None,
            page: "Dog".into(),
            fragment: None,
            anchor: None,
            title_text: Some("dogs".into()),
        })));
        // The stored title carries the link trail that the written child lacks.
        assert_eq!(Node::from(link).link_title().unwrap(), "dogs");

        let mut link = NonTerminal::new(vec![written], 0, Some(Kind::WikiLink));
        link.data = Some(NodeData::WikiLink(Box::new(WikiLinkData {
            link_path: None,
            page: "Dog".into(),
            fragment: None,
            anchor: None,
            title_text: None,
        })));
        assert_eq!(Node::from(link).link_title().unwrap(), "dog");
    }
}

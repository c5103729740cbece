//! Whole-input parse tests and tests for the crate-level operations.
//! Construct-specific behavior lives in the submodules.

use std::convert::Infallible;

use super::*;

mod blocks;

#[track_caller]
fn parse_ok(text: &str) -> Node {
    parse_with(text, &FormatDetails::default())
}

#[track_caller]
fn parse_with(text: &str, format: &FormatDetails) -> Node {
    let _ = env_logger::try_init();
    let tree = parse(text, format, &CancelHandle::new()).unwrap();
    assert_eq!(tree.text(), text, "a parse must cover the whole source");
    tree
}

/// The single node of `kind` anywhere below `node`.
#[track_caller]
fn only_deep(node: &Node, kind: Kind) -> &Node {
    let mut found = node.find_deep(kind);
    let Some(first) = found.next() else {
        panic!("no {kind:?} node");
    };
    assert!(found.next().is_none(), "more than one {kind:?} node");
    first
}

/// Every synthetic tag below `node`, spelled like HTML.
fn tags(node: &Node) -> Vec<String> {
    struct Tags(Vec<String>);

    impl<'n> Visitor<'n, Infallible> for Tags {
        fn visit_synthetic_tag(
            &mut self,
            _span: Span,
            tag: &'n SyntheticTag,
        ) -> Result<(), Infallible> {
            use std::fmt::Write;
            self.0.push(match tag {
                SyntheticTag::Start { tag, attributes } => {
                    let mut out = format!("<{tag}");
                    for (key, value) in attributes {
                        let _ = write!(out, " {key}=\"{value}\"");
                    }
                    out.push('>');
                    out
                }
                SyntheticTag::End { tag } => format!("</{tag}>"),
            });
            Ok(())
        }
    }

    let mut collector = Tags(Vec::new());
    match visit::visit_node(&mut collector, node) {
        Ok(()) => collector.0,
        Err(never) => match never {},
    }
}

#[test]
fn test_empty_input() {
    let tree = parse_ok("");
    assert_eq!(tree.kind(), Some(Kind::Document));
    assert!(tree.as_non_terminal().unwrap().children.is_empty());
}

#[test]
fn test_no_format_input() {
    let format = FormatDetails {
        no_format: true,
        ..<_>::default()
    };
    let tree = parse_with("== not a heading ==\n", &format);
    let document = tree.as_non_terminal().unwrap();
    assert_eq!(document.children.len(), 1);
    assert_eq!(document.children[0].kind(), Some(Kind::PlainText));
}

#[test]
fn test_cancelled_parse() {
    let cancel = CancelHandle::new();
    cancel.cancel();
    let result = parse("some text", &FormatDetails::default(), &cancel);
    assert_eq!(result.unwrap_err(), ParseFailure::Cancelled);
}

#[test]
fn test_mixed_page_round_trips() {
    parse_ok(concat!(
        "== Log ==\n",
        "Intro with '''bold''' and ''italics''.\n",
        "\n",
        "* first\n",
        "** nested\n",
        "* second\n",
        "todo: water the plants\n",
        "{|\n|left||right\n|}\n",
        " preformatted\n",
        "Link to [[//top/other]] and http://example.com/x.\n",
        "[[alias: Front]]\n",
        "----\n",
    ));
}

#[test]
fn test_escape_round_trip() {
    let source = "back\\slash\nand\tcontrol\u{1}chars";
    let escaped = escape(source);
    assert_eq!(escaped, "back\\x5cslash\\x0aand\\x09control\\x01chars");
    assert_eq!(unescape(&escaped), source);
}

#[test]
fn test_unescape_leaves_unknown_sequences() {
    assert_eq!(unescape(r"\x5"), r"\x5");
    assert_eq!(unescape(r"\y10"), r"\y10");
}

#[test]
fn test_extract_word() {
    assert_eq!(extract_word("[[a/b]]").as_deref(), Some("a/b"));
    assert_eq!(extract_word("plain name").as_deref(), Some("plain name"));
    assert_eq!(extract_word("[[word ]]").as_deref(), Some("word"));
    assert_eq!(extract_word("[[a|Title]]").as_deref(), Some("a"));
    assert_eq!(extract_word("[[a]] trailing"), None);
    assert_eq!(extract_word(""), None);
}

#[test]
fn test_page_name_validity() {
    let format = FormatDetails::default();
    assert!(is_valid_page_name("Page", &format));
    assert!(is_valid_page_name("a/b c/d", &format));
    assert!(!is_valid_page_name("", &format));
    assert!(!is_valid_page_name("a//b", &format));
    assert!(!is_valid_page_name("up/../down", &format));
    assert!(!is_valid_page_name("pipe|char", &format));

    assert!(!is_valid_page_name("42", &format));
    let footnotes_off = FormatDetails {
        footnotes_as_wikiwords: true,
        ..<_>::default()
    };
    assert!(is_valid_page_name("42", &footnotes_off));
}

#[test]
fn test_link_core_validity() {
    let format = FormatDetails::default();
    for core in ["name", "a/b", "/child", "//top/sub", "..", "../..", "../sib"] {
        assert!(is_valid_link_core(core, &format), "{core:?}");
    }
    for core in ["", "a/", "///x", "a]b", "42"] {
        assert!(!is_valid_link_core(core, &format), "{core:?}");
    }
    let footnotes_off = FormatDetails {
        footnotes_as_wikiwords: true,
        ..<_>::default()
    };
    assert!(is_valid_link_core("42", &footnotes_off));
}

#[test]
fn test_resolve_link() {
    assert_eq!(resolve_link("//a/b", None).unwrap(), "a/b");
    assert_eq!(resolve_link("x", Some("a/b")).unwrap(), "a/x");
    assert_eq!(resolve_link("..", Some("a/b/c")).unwrap(), "a/b");
    assert_eq!(resolve_link("../nephew", Some("a/b")).unwrap(), "nephew");
    assert_eq!(resolve_link("sub/x", None).unwrap(), "sub/x");

    assert_eq!(resolve_link("..", None).unwrap_err(), LinkError::MissingBase);
    assert_eq!(resolve_link("//", None).unwrap_err(), LinkError::RootLink);
    assert_eq!(
        resolve_link("../..", Some("a/b")).unwrap_err(),
        LinkError::LinkToRoot
    );
    assert_eq!(
        resolve_link("../../x", Some("a/b")).unwrap_err(),
        LinkError::AboveRoot
    );
}

#[test]
fn test_relative_link() {
    assert_eq!(relative_link("a/b/c", "a/b/d", false).unwrap().as_deref(), Some("c"));
    assert_eq!(relative_link("a/b/c", "a/b", false).unwrap().as_deref(), Some("/c"));
    assert_eq!(relative_link("x/y", "a/b", false).unwrap().as_deref(), Some("../x/y"));
    assert_eq!(relative_link("a/b", "a/b", false).unwrap().as_deref(), Some("b"));

    assert_eq!(relative_link("a/b/c", "a/b", true).unwrap().as_deref(), Some("/c"));
    assert_eq!(relative_link("x/y", "a/b", true).unwrap(), None);

    assert_eq!(
        relative_link("", "a", false).unwrap_err(),
        LinkError::EmptyTarget
    );
}

#[test]
fn test_wiki_link_from_page() {
    assert_eq!(wiki_link_from_page("a/b/c", "a/b/d", false), "[[c]]");
    assert_eq!(wiki_link_from_page("a/b/c", "a/b/d", true), "[[//a/b/c]]");
    assert_eq!(wiki_link_from_page("x/y", "a/b", false), "[[../x/y]]");
}

#[test]
fn test_absolute_links() {
    assert_eq!(absolute_links(["a", "b/c"]), "[[//a]]\n[[//b/c]]");
    assert_eq!(absolute_links(["only"]), "[[//only]]");
}

#[test]
fn test_wiki_link_from_text() {
    assert_eq!(wiki_link_from_text("[[+some page]]", true), "[[Some page]]");
    assert_eq!(wiki_link_from_text("word", false), "Word");
    assert_eq!(wiki_link_from_text("[[x]]", false), "X");
    assert_eq!(wiki_link_from_text("++dog", true), "[[Dog]]");
    // Every bracket marker goes, not just an outer pair.
    assert_eq!(wiki_link_from_text("[[A]] [[b]]", true), "[[A b]]");
    // The marker strip runs before the trim.
    assert_eq!(wiki_link_from_text("  +dog", true), "[[+dog]]");
    assert_eq!(wiki_link_from_text("  [[]]  ", true), "");
}

#[test]
fn test_attribute_written_form() {
    assert_eq!(
        attribute_from_components("alias", "Front Page"),
        "[[alias: Front Page]]\n"
    );
}

#[test]
fn test_url_from_file_path() {
    assert_eq!(
        url_from_file_path(r"C:\Users\me\my file.txt"),
        "file:C:/Users/me/my%20file.txt"
    );
    assert_eq!(url_from_file_path("/tmp/a[1].png"), "file:/tmp/a%5B1%5D.png");
}

#[test]
fn test_parse_todo_entry_alone() {
    let format = FormatDetails::default();
    let cancel = CancelHandle::new();

    let entry = parse_todo_entry("todo.urgent: fix the gate", &format, &cancel).unwrap();
    assert_eq!(entry.kind(), Some(Kind::TodoEntry));
    assert_eq!(only_deep(&entry, Kind::Key).text(), "todo.urgent");
    assert_eq!(only_deep(&entry, Kind::Value).text(), " fix the gate");

    assert!(parse_todo_entry("not an entry", &format, &cancel).is_none());
    assert!(parse_todo_entry("todo: a\nb", &format, &cancel).is_none());
}

#[test]
fn test_parse_todo_value_alone() {
    let format = FormatDetails::default();
    let cancel = CancelHandle::new();

    let value = parse_todo_value("ring the bell", &format, &cancel).unwrap();
    assert_eq!(value.kind(), Some(Kind::Value));
    assert_eq!(value.text(), "ring the bell");

    assert!(parse_todo_value("", &format, &cancel).is_none());

    let cancelled = CancelHandle::new();
    cancelled.cancel();
    assert!(parse_todo_value("ring", &format, &cancelled).is_none());
}

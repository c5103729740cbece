//! Block structure as it comes out of a full parse: headings, lists,
//! tables, preformatted regions, and the other line-oriented elements.

use super::*;

#[test]
fn test_heading_level_and_content() {
    let tree = parse_ok("== Hi ==\n");
    let heading = only_deep(&tree, Kind::Heading);
    assert_eq!(heading.data(), Some(&NodeData::Heading { level: 2 }));
    assert_eq!(only_deep(heading, Kind::HeadingContent).text(), "Hi ");
}

#[test]
fn test_heading_level_uses_the_shorter_run() {
    let tree = parse_ok("=== Deep ==\n");
    let heading = only_deep(&tree, Kind::Heading);
    assert_eq!(heading.data(), Some(&NodeData::Heading { level: 2 }));
}

#[test]
fn test_heading_only_at_line_start() {
    let tree = parse_ok("x == y ==\n");
    assert!(tree.find_deep(Kind::Heading).next().is_none());
}

#[test]
fn test_nested_bullet_tag_stream() {
    let tree = parse_ok("* a\n** b\n* c\n");
    assert_eq!(
        tags(&tree),
        ["<ul>", "<li>", "<ul>", "<li>", "</li>", "</ul>", "</li>", "<li>", "</li>", "</ul>"]
    );
}

#[test]
fn test_numbered_list_siblings() {
    let tree = parse_ok("# one\n# two\n");
    assert_eq!(tags(&tree), ["<ol>", "<li>", "</li>", "<li>", "</li>", "</ol>"]);
}

#[test]
fn test_definition_list_pairs() {
    let tree = parse_ok("; term\n: meaning\n");
    assert_eq!(tags(&tree), ["<dl>", "<dt>", "</dt>", "<dd>", "</dd>", "</dl>"]);
}

#[test]
fn test_list_text_content() {
    let tree = parse_ok("* milk\n* eggs\n");
    assert_eq!(text_content(&tree), " milk\n eggs\n");
}

#[test]
fn test_list_tags_balanced_at_input_end() {
    let tree = parse_ok("* a");
    assert_eq!(tags(&tree), ["<ul>", "<li>", "</li>", "</ul>"]);
}

#[test]
fn test_table_cells_and_rows() {
    let tree = parse_ok("{|\n|a||b\n|-\n|c\n|}\n");
    assert_eq!(
        tags(&tree),
        [
            "<table>", "<tr>", "<td>", "</td>", "<td>", "</td>", "</tr>", "<tr>", "<td>",
            "</td>", "</tr>", "</table>",
        ]
    );
    assert_eq!(tree.find_deep(Kind::TableCell).count(), 3);
}

#[test]
fn test_table_attributes_reach_the_tags() {
    let tree = parse_ok("{| border=\"1\"\n|align=\"center\"|x\n|}\n");
    let stream = tags(&tree);
    assert_eq!(stream[0], "<table border=\"1\">");
    assert_eq!(stream[2], "<td align=\"center\">");
}

#[test]
fn test_table_caption_and_header() {
    let tree = parse_ok("{|\n|+Sales\n!Region\n|}\n");
    assert_eq!(
        tags(&tree),
        ["<table>", "<caption>", "</caption>", "<tr>", "<th>", "</th>", "</tr>", "</table>"]
    );
}

#[test]
fn test_space_pre_block() {
    let tree = parse_ok(" fn main() {}\n more\nafter\n");
    assert_eq!(tags(&tree), ["<pre>", "</pre>"]);
    assert!(tree.find_deep(Kind::PreSpace).next().is_some());
}

#[test]
fn test_html_pre_block() {
    let tree = parse_ok("<pre>a\nb</pre>\n");
    let pre = only_deep(&tree, Kind::PreHtml);
    assert!(pre.find_deep(Kind::Whitespace).next().is_none());
    assert_eq!(text_content(pre), "a\nb");
}

#[test]
fn test_horizontal_rule_owns_its_line() {
    let tree = parse_ok("before\n----\nafter\n");
    assert_eq!(only_deep(&tree, Kind::HorizontalRule).text(), "----");

    let tree = parse_ok("text ----\n");
    assert!(tree.find_deep(Kind::HorizontalRule).next().is_none());
}

#[test]
fn test_hidden_text_is_not_exported() {
    let tree = parse_ok("a <hide>secret</hide> b\n");
    assert_eq!(only_deep(&tree, Kind::NoExport).text(), "<hide>secret</hide>");
    assert_eq!(text_content(&tree), "a  b\n");
}

#[test]
fn test_body_html_is_verbatim() {
    let tree = parse_ok("<body class=\"x\">''raw''</body>\n");
    let body = only_deep(&tree, Kind::BodyHtml);
    assert!(body.find_deep(Kind::Italics).next().is_none());
    assert_eq!(only_deep(body, Kind::BodyHtmlText).text(), "''raw''");
}

#[test]
fn test_nowiki_span_disables_markup() {
    let tree = parse_ok("a<nowiki>''b''</nowiki>c\n");
    assert!(tree.find_deep(Kind::Italics).next().is_none());
    assert_eq!(text_content(&tree), "a''b''c\n");
}

#[test]
fn test_script_element() {
    let tree = parse_ok("x <%2 + 2%> y\n");
    assert_eq!(only_deep(&tree, Kind::Code).text(), "2 + 2");
}

#[test]
fn test_escaped_character_is_plain_text() {
    let tree = parse_ok("\\* not a list\n");
    assert!(tree.find_deep(Kind::List).next().is_none());
    assert!(tags(&tree).is_empty());
    assert_eq!(text_content(&tree), "* not a list\n");
}

#[test]
fn test_bold_and_italics() {
    let tree = parse_ok("'''bold''' and ''italic''\n");
    assert_eq!(only_deep(&tree, Kind::Bold).text(), "'''bold'''");
    assert_eq!(only_deep(&tree, Kind::Italics).text(), "''italic''");
    assert_eq!(text_content(&tree), "bold and italic\n");
}

#[test]
fn test_unterminated_italics_stay_plain() {
    let tree = parse_ok("''oops\n== H ==\n");
    assert!(tree.find_deep(Kind::Italics).next().is_none());
    assert!(tree.find_deep(Kind::Heading).next().is_some());
}

#[test]
fn test_page_attribute_pairs() {
    let tree = parse_ok("[[alias: Front Page]]\n");
    let attribute = only_deep(&tree, Kind::Attribute);
    assert_eq!(
        attribute.data(),
        Some(&NodeData::Attribute {
            pairs: vec![("alias".to_owned(), "Front Page".to_owned())],
        })
    );

    let tree = parse_ok("[[tag: a; b]]\n");
    let attribute = only_deep(&tree, Kind::Attribute);
    assert_eq!(
        attribute.data(),
        Some(&NodeData::Attribute {
            pairs: vec![
                ("tag".to_owned(), "a".to_owned()),
                ("tag".to_owned(), "b".to_owned()),
            ],
        })
    );
}

#[test]
fn test_quoted_attribute_value() {
    let tree = parse_ok("[[alias: \"My Home\"]]\n");
    let attribute = only_deep(&tree, Kind::Attribute);
    assert_eq!(
        attribute.data(),
        Some(&NodeData::Attribute {
            pairs: vec![("alias".to_owned(), "My Home".to_owned())],
        })
    );

    let tree = parse_ok("[[k: \"a']]\n");
    assert!(tree.find_deep(Kind::Attribute).next().is_none());
}

#[test]
fn test_insertion_values() {
    let tree = parse_ok("[[:eval: 42]]\n");
    let insertion = only_deep(&tree, Kind::Insertion);
    let Some(NodeData::Insertion(data)) = insertion.data() else {
        panic!("missing insertion data");
    };
    assert_eq!(data.key, "eval");
    assert_eq!(data.value, "42");
    assert!(data.appendices.is_empty());

    let tree = parse_ok("[[:page: a/b; c]]\n");
    let insertion = only_deep(&tree, Kind::Insertion);
    let Some(NodeData::Insertion(data)) = insertion.data() else {
        panic!("missing insertion data");
    };
    assert_eq!(data.value, "a/b");
    assert_eq!(data.appendices, ["c"]);
}

#[test]
fn test_empty_insertion_value() {
    let tree = parse_ok("[[:toc:]]\n");
    let insertion = only_deep(&tree, Kind::Insertion);
    let Some(NodeData::Insertion(data)) = insertion.data() else {
        panic!("missing insertion data");
    };
    assert_eq!(data.key, "toc");
    assert_eq!(data.value, "");
}

#[test]
fn test_todo_entries_in_a_page() {
    let tree = parse_ok("todo: call bob\nthen rest\n");
    let entry = only_deep(&tree, Kind::TodoEntry);
    assert_eq!(only_deep(entry, Kind::Key).text(), "todo");
    assert_eq!(only_deep(entry, Kind::Value).text(), " call bob");

    let tree = parse_ok("todo: a|done: b\n");
    assert_eq!(tree.find_deep(Kind::TodoEntry).count(), 2);
}

#[test]
fn test_paragraph_break() {
    let tree = parse_ok("one\n\ntwo\n");
    assert_eq!(only_deep(&tree, Kind::ParagraphBreak).text(), "\n\n");
    assert_eq!(tree.find_deep(Kind::Whitespace).count(), 1);
    assert_eq!(text_content(&tree), "one\n\ntwo\n");
}

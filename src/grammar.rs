//! The markup grammar.
//!
//! Assembles the combinator [`Grammar`] for the whole dialect: inline
//! attribution, headings, bulleted and definition lists, tables,
//! preformatted blocks, wiki links, URLs, images, task entries, page
//! attributes, and insertions, stitched together by plain-text fallback
//! scanners. The grammar is built once and shared by every parse; the
//! per-format switches (footnote handling, auto-linking) are applied by
//! hooks at parse time, so one compiled grammar serves every
//! configuration.
//!
//! Hook bodies live in [`crate::actions`]; this module only wires them
//! to the elements they belong to.

use std::sync::LazyLock;

use crate::{
    actions,
    engine::{Builder, ExprId, Grammar},
    node::Kind,
};

/// One component of a page path. A component must not be a bare parent
/// reference and cannot contain separators, brackets, or the markup
/// delimiter characters.
pub(crate) const PATH_PART_PAT: &str = r"(?!\.\.)[^\\/\[\]\|\x00-\x1f=:;#!]+";

/// A footnote identifier.
pub(crate) const FOOTNOTE_PAT: &str = "[0-9]+";

/// A URL in one of the recognized schemes. The trailing alternation
/// refuses to swallow punctuation that ends a sentence rather than the
/// URL itself.
const URL_PAT: &str = r#"(?:(?:https?|ftp|rel|wikirel)://|mailto:|Outlook:\S|wiki:/|file:/)(?:(?![.,;:!?)]+(?:["\s]|$))[^"\s|\]<>])*"#;

/// A page name: one or more path components.
pub(crate) fn page_name_pattern() -> String {
    format!("{PATH_PART_PAT}(?:/{PATH_PART_PAT})*")
}

/// A link core: either a run of parent references with an optional
/// downward tail, or a page name with up to two leading slashes.
pub(crate) fn link_core_pattern() -> String {
    format!(
        r"\.\.(?:/\.\.)*(?:/{part})*|/{{0,2}}{page}",
        part = PATH_PART_PAT,
        page = page_name_pattern(),
    )
}

/// The compiled grammar plus the entry points the library evaluates.
pub(crate) struct WikiGrammar {
    pub grammar: Grammar,
    /// A whole page: content up to the end of input.
    pub text: ExprId,
    /// The value part of a task entry alone, for re-parsing stored
    /// values.
    pub todo_value: ExprId,
    /// One complete task entry and nothing else.
    pub todo_entry: ExprId,
    /// A link core or bracketed link and nothing else.
    pub extractable: ExprId,
}

pub(crate) static GRAMMAR: LazyLock<WikiGrammar> = LazyLock::new(build);

fn build() -> WikiGrammar {
    let mut b = Builder::new();

    let string_end = b.capture(r"(?!.)", Kind::InputEnd);

    let whitespace = b.pattern(r"[ \t]*");
    b.on_match(whitespace, actions::hide_on_empty);
    let whitespace_or_nl = b.pattern(r"[ \t\n]*");
    b.on_match(whitespace_or_nl, actions::hide_on_empty);

    // Content scopes are mutually recursive with the elements they can
    // contain, so they start as forwards and are defined at the end,
    // once every element exists.
    let content = b.forward();
    let cell_content = b.forward();
    b.name(cell_content, Kind::TableCellContent);
    b.on_match(cell_content, actions::mark_helper_recursive);
    let heading_content = b.forward();
    b.name(heading_content, Kind::HeadingContent);
    let todo_content = b.forward();
    b.name(todo_content, Kind::Value);
    let title_content = b.forward();
    b.name(title_content, Kind::LinkTitle);
    let attribution_content = b.forward();

    // Inline formatting.

    let escaped_char = {
        let backslash = b.pattern(r"\\");
        let verbatim = b.capture(".", Kind::PlainText);
        b.seq(&[backslash, verbatim])
    };
    let nowiki_standalone = b.pattern("<nowiki ?/>");

    let italics_start = b.pattern("''");
    b.on_start(italics_start, actions::outside_italics);
    let italics_end = b.pattern("''");
    let italics = b.seq(&[italics_start, attribution_content, italics_end]);
    b.name(italics, Kind::Italics);

    let bold_start = b.pattern("'''");
    b.on_start(bold_start, actions::outside_bold);
    let bold_end = b.pattern("'''");
    let bold = b.seq(&[bold_start, attribution_content, bold_end]);
    b.name(bold, Kind::Bold);

    let script = {
        let open = b.pattern("<%");
        let body = b.capture(r".*?(?=%>)", Kind::Code);
        let close = b.pattern("%>");
        b.seq(&[open, body, close])
    };
    b.name(script, Kind::Script);

    let horizontal_rule = b.capture(r"----+[ \t]*$", Kind::HorizontalRule);
    b.on_start(horizontal_rule, actions::require_blank_before);

    // HTML passthrough.

    let html_tag = b.capture(r"</?[A-Za-z][A-Za-z0-9:]*(?:/| [^\n>]*)?>", Kind::HtmlTag);
    let html_entity = b.capture(
        r"&(?:[A-Za-z0-9]{2,10}|#[0-9]{1,10}|#x[0-9a-fA-F]{1,8});",
        Kind::HtmlEntity,
    );
    let html_comment = b.pattern(r"<!-- .*? -->");

    // Headings.

    let heading_open = b.capture("^={1,15}", Kind::HeadingOpen);
    let heading_close = b.capture("={1,15}", Kind::HeadingClose);
    let heading_end = {
        let nl = b.pattern(r"\n");
        b.seq(&[heading_close, whitespace, nl])
    };
    let heading = {
        let space = b.pattern(" ");
        let opt_space = b.opt(space);
        b.seq(&[heading_open, opt_space, heading_content, heading_end])
    };
    b.name(heading, Kind::Heading);
    b.on_match(heading, actions::pack_heading);

    // Task entries.

    let todo_key = b.capture(
        r"\b(?:todo|done|wait|action|track|issue|question|project)(?:\.[^:\s]+)?",
        Kind::Key,
    );
    let todo_delimiter = b.capture(":", Kind::TodoDelimiter);
    let todo_end = b.pattern(r"\n|\||(?!.)");
    let todo_entry = b.seq(&[todo_key, todo_delimiter, todo_content]);
    b.name(todo_entry, Kind::TodoEntry);
    let todo_terminated = {
        let pipe = b.pattern(r"\|");
        let opt_pipe = b.opt(pipe);
        b.seq(&[todo_entry, opt_pipe])
    };
    let todo_whole = b.seq(&[todo_entry, string_end]);

    // Preformatted blocks, in both spellings: an explicit pre element,
    // and lines led by a single space.

    let pre_html_start = b.capture(r"<pre(?: [^\n>]*)?>", Kind::HtmlTag);
    b.on_match(pre_html_start, actions::enter_pre);
    let pre_html_end = b.capture(r"</pre(?: [^\n>]*)?>", Kind::HtmlTag);
    let pre_html = b.seq(&[pre_html_start, content, pre_html_end]);
    b.name(pre_html, Kind::PreHtml);
    b.on_match(pre_html, actions::mark_helper_recursive);

    let pre_space_start = b.pattern("^ ");
    b.on_match(pre_space_start, actions::open_space_pre);
    let pre_space_end = {
        let off = b.pattern(r"^(?! )|(?!.)");
        let before_pre_html = b.ahead(pre_html_start);
        b.first(&[off, before_pre_html])
    };
    b.on_match(pre_space_end, actions::close_space_pre);
    let pre_space_lines = b.seq(&[pre_space_start, content, pre_space_end]);
    b.on_start(pre_space_lines, actions::outside_space_pre);
    let pre_space = b.first(&[pre_space_lines, pre_space_start]);
    b.name(pre_space, Kind::PreSpace);
    b.on_match(pre_space, actions::mark_helper_recursive);

    // Bulleted and definition lists. The markers drive a diff state
    // machine in the actions; the grammar only delimits the lines.

    let list_marker = b.capture(r"^[\*#;:]+", Kind::ListMarker);
    b.on_match(list_marker, actions::reconcile_bullets);
    let list_continuation = b.capture(r"^[\*#;:]+", Kind::ListContinuation);
    b.on_match(list_continuation, actions::reconcile_bullets);
    let list_end = b.capture(r"^(?![\*#:;])|(?!.)", Kind::ListEnd);
    b.on_match(list_end, actions::close_open_bullets);
    let list = b.seq(&[list_marker, content, list_end]);
    b.name(list, Kind::List);
    b.on_start(list, actions::outside_list);
    b.on_match(list, actions::mark_helper_recursive);

    // Line breaks. A line holding only blanks does not interrupt a
    // paragraph break.

    let fake_indent = b.pattern(r"^[ \t]+$");
    let opt_fake_indent = b.opt(fake_indent);
    let newline = {
        let nl = b.pattern(r"\n");
        b.seq(&[nl, opt_fake_indent])
    };
    let paragraph_break = {
        let more = b.plus(newline);
        b.seq(&[newline, more])
    };
    b.name(paragraph_break, Kind::ParagraphBreak);
    b.on_start(paragraph_break, actions::outside_pre_block);
    let newline_whitespace = {
        let nl = b.pattern(r"\n");
        b.seq(&[nl, opt_fake_indent])
    };
    b.name(newline_whitespace, Kind::Whitespace);
    b.on_start(newline_whitespace, actions::outside_pre_block);

    // Tables.

    let html_attribute = {
        let key = b.capture("[A-Za-z0-9]+", Kind::HtmlAttributeKey);
        let eq = b.pattern("=");
        let quote = b.pattern("\"");
        let quoted = b.capture(r#"[^"\n\t]*"#, Kind::HtmlAttributeValue);
        let quoted = b.seq(&[quote, quoted, quote]);
        let bare = b.capture(r#"[^"\n\t ]+"#, Kind::HtmlAttributeValue);
        let value = b.first(&[quoted, bare]);
        b.seq(&[whitespace, key, whitespace, eq, whitespace, value])
    };
    b.name(html_attribute, Kind::HtmlAttribute);
    let attribute_stop = {
        let pipe = b.pattern(r"\|");
        b.seq(&[whitespace, pipe])
    };

    let table_attrs = attribute_list(&mut b, html_attribute, Kind::TableAttributes);
    let caption_attrs = attribute_list(&mut b, html_attribute, Kind::CaptionAttributes);
    let row_attrs = attribute_list(&mut b, html_attribute, Kind::RowAttributes);
    let cell_attrs = attribute_list(&mut b, html_attribute, Kind::CellAttributes);

    let table_start = {
        let open = b.pattern(r"^[ \t]*\{\|");
        let attrs = b.opt(table_attrs);
        b.seq(&[open, whitespace, attrs, whitespace_or_nl])
    };
    let table_end = b.pattern(r"^[ \t]*\|\}[ \t]*(?:\n|$)");

    let table_caption = {
        let open = b.pattern(r"^[ \t]*\|\+");
        let attrs = b.seq(&[caption_attrs, attribute_stop]);
        let attrs = b.opt(attrs);
        b.seq(&[open, whitespace, attrs, whitespace_or_nl, cell_content])
    };
    b.on_match(table_caption, actions::wrap_table_caption);

    let table_cell = {
        let open = b.pattern(r"^[ \t]*\|(?![\}+\-])|\|\|");
        let attrs = b.seq(&[cell_attrs, attribute_stop]);
        let attrs = b.opt(attrs);
        b.seq(&[open, whitespace, attrs, whitespace_or_nl, cell_content])
    };
    b.name(table_cell, Kind::TableCell);
    b.on_match(table_cell, actions::mark_helper_recursive);
    b.on_match(table_cell, actions::wrap_table_cell);

    let table_header_cell = {
        let open = b.pattern(r"^[ \t]*!|!!");
        let attrs = b.seq(&[cell_attrs, attribute_stop]);
        let attrs = b.opt(attrs);
        b.seq(&[open, whitespace, attrs, whitespace_or_nl, cell_content])
    };
    b.on_match(table_header_cell, actions::mark_helper_recursive);
    b.on_match(table_header_cell, actions::wrap_table_header_cell);

    let row_lead = {
        let open = b.pattern(r"^[ \t]*\|-");
        let attrs = b.opt(row_attrs);
        b.seq(&[open, whitespace, attrs, whitespace_or_nl])
    };
    let cells = {
        let cell = b.first(&[table_cell, table_header_cell]);
        b.plus(cell)
    };
    let table_row = b.seq(&[row_lead, cells]);
    b.name(table_row, Kind::TableRow);
    b.on_match(table_row, actions::mark_helper_recursive);
    b.on_match(table_row, actions::wrap_table_row);
    let table_first_row = {
        let lead = b.opt(row_lead);
        b.seq(&[lead, cells])
    };
    b.name(table_first_row, Kind::TableRow);
    b.on_match(table_first_row, actions::mark_helper_recursive);
    b.on_match(table_first_row, actions::wrap_table_row);

    let table = {
        let caption = b.opt(table_caption);
        let rows = b.star(table_row);
        b.seq(&[table_start, caption, table_first_row, rows, table_end])
    };
    b.name(table, Kind::Table);
    b.on_match(table, actions::mark_helper_recursive);
    b.on_match(table, actions::wrap_table);

    // A cell or row lead anywhere ends the content of the enclosing
    // cell without closing the table itself.
    let table_element = b.pattern(r"^[ \t]*[\|!]|\|\|");

    // Verbatim spans and hidden lines.

    let nowiki_span = {
        let open = b.pattern("<nowiki>");
        let body = b.capture(r".*?(?=</nowiki>)", Kind::PlainText);
        let close = b.pattern("</nowiki>");
        b.seq(&[open, body, close])
    };

    let hidden_end = b.pattern("</hide>");
    let hidden_line = {
        let open = b.pattern("<hide>");
        b.seq(&[open, content, hidden_end])
    };
    b.name(hidden_line, Kind::NoExportLine);
    b.on_start(hidden_line, actions::outside_hidden);
    b.on_match(hidden_line, actions::rename_no_export);

    let body_html = {
        let open = b.capture(r"<body(?: [^\n>]*)?>", Kind::HtmlTag);
        let text = b.capture(r".*?(?=</body>)", Kind::BodyHtmlText);
        let close = b.capture("</body>", Kind::HtmlTag);
        b.seq(&[open, text, close])
    };
    b.name(body_html, Kind::BodyHtml);

    // Wiki links.

    let bracket_start = b.pattern(r"\[\[");
    let bracket_end = b.pattern(r"\]\]");

    let fragment = {
        let hash = b.pattern("#");
        let body = b.capture(r"(?:(?:\\.)|(?!\||\]\]).)+", Kind::SearchFragment);
        b.on_match(body, actions::unescape_fragment);
        b.seq(&[hash, body])
    };
    let anchor_ref = {
        let bang = b.pattern("!");
        let name = b.capture("[A-Za-z0-9_]+", Kind::AnchorRef);
        b.seq(&[bang, name])
    };
    let title = {
        let open = b.pattern(r"\|[ \t]*");
        b.seq(&[open, title_content])
    };
    let opt_title = b.opt(title);
    let title_trail = b.capture(r"\w+", Kind::TitleTrail);
    let opt_trail = b.opt(title_trail);

    let core_pattern = link_core_pattern();
    let link_core = b.capture(&core_pattern, Kind::LinkCore);
    let link_core_trimmed = b.capture(&core_pattern, Kind::LinkCore);
    b.on_match(link_core_trimmed, actions::cut_right_whitespace);

    let link_with_word = {
        let extra = b.first(&[fragment, anchor_ref]);
        let opt_extra = b.opt(extra);
        b.seq(&[
            bracket_start,
            link_core_trimmed,
            opt_extra,
            whitespace,
            opt_title,
            bracket_end,
            opt_trail,
        ])
    };
    let link_search_in_page = b.seq(&[
        bracket_start,
        fragment,
        whitespace,
        opt_title,
        bracket_end,
        opt_trail,
    ]);
    let wiki_word = b.first(&[link_with_word, link_search_in_page]);
    b.name(wiki_word, Kind::WikiLink);
    b.on_match(wiki_word, actions::pack_wiki_link);

    let anchor_def = {
        let open = b.pattern(r"^[ \t]*anchor:[ \t]*");
        let name = b.capture("[A-Za-z0-9_]+", Kind::AnchorName);
        let nl = b.pattern(r"\n");
        b.seq(&[open, name, nl])
    };
    b.name(anchor_def, Kind::AnchorDef);
    b.on_match(anchor_def, actions::pack_anchor);

    // URLs and images.

    let url_in_brackets = url_with_appendix(&mut b);
    let url_bare = url_with_appendix(&mut b);
    b.name(url_bare, Kind::UrlBare);
    b.on_match(url_bare, actions::pack_url_link);

    let url_bracket_end = b.pattern(r"\]");
    let url_titled = {
        let open = b.pattern(r"\[");
        let space = b.pattern(" ");
        let titled = b.seq(&[space, whitespace, title_content]);
        let opt_titled = b.opt(titled);
        b.seq(&[open, url_in_brackets, opt_titled, whitespace, url_bracket_end])
    };
    b.name(url_titled, Kind::UrlBracketed);
    b.on_match(url_titled, actions::pack_url_link);
    let url_ref = b.first(&[url_titled, url_bare]);

    let image_option = {
        let pipe = b.pattern(r"\|");
        let keyword = b.capture(
            "border|frameless|frame|upright|thumb|left|right|center|none|baseline\
            |sub|super|top|text-top|middle|bottom|text-bottom",
            Kind::ImageKeyword,
        );
        let size = b.capture(r"[0-9]+px(?:x[0-9]+px)?", Kind::ImageSize);
        let keyed = {
            let key = b.capture("thumb|link|alt|page|class", Kind::Key);
            let eq = b.pattern("=");
            let value = b.capture(r"[^\n\t\]|]*", Kind::Value);
            b.seq(&[key, eq, value])
        };
        let body = b.first(&[keyword, size, keyed]);
        let id = b.seq(&[pipe, body]);
        b.name(id, Kind::ImageOption);
        id
    };
    let image = {
        let options = b.star(image_option);
        b.seq(&[
            bracket_start,
            url_in_brackets,
            whitespace,
            options,
            opt_title,
            bracket_end,
        ])
    };
    b.name(image, Kind::Image);
    b.on_match(image, actions::pack_image);

    let footnote = {
        let id = b.capture(FOOTNOTE_PAT, Kind::FootnoteId);
        b.seq(&[bracket_start, id, bracket_end])
    };
    b.name(footnote, Kind::Footnote);
    b.on_start(footnote, actions::footnotes_enabled);
    b.on_match(footnote, actions::pack_footnote);

    // Page attributes and insertions. Values may be wrapped in a run of
    // quoting characters; the closing run must repeat the opening one.

    let quote_start = b.pattern(r#""+|'+|/+|\\+"#);
    b.on_match(quote_start, actions::open_attr_quote);
    let quote_end = b.pattern(r#""+|'+|/+|\\+"#);
    b.on_match(quote_end, actions::close_attr_quote);
    let quoted_value = b.scan(&[], quote_end, Some(actions::skipped_to_value));
    let attr_value = {
        let quoted = b.seq(&[quote_start, quoted_value, quote_end]);
        let bare = b.capture(r"(?:[ \t]*[\w\-_=:,.!?#%|/]+)*", Kind::Value);
        let either = b.first(&[quoted, bare]);
        b.seq(&[whitespace, either])
    };
    let attr_key = b.capture(r"[\w\-_.]+", Kind::Key);
    let key_value_sep = b.pattern("[ \t]*[=:]");
    let more_values = {
        let semi = b.pattern(";");
        let another = b.seq(&[semi, attr_value]);
        b.star(another)
    };

    let attribute = b.seq(&[
        bracket_start,
        whitespace,
        attr_key,
        key_value_sep,
        attr_value,
        more_values,
        whitespace,
        bracket_end,
    ]);
    b.name(attribute, Kind::Attribute);
    b.on_match(attribute, actions::pack_attribute);

    let insertion = {
        let colon = b.pattern(":");
        b.seq(&[
            bracket_start,
            colon,
            whitespace,
            attr_key,
            key_value_sep,
            attr_value,
            more_values,
            whitespace,
            bracket_end,
        ])
    };
    b.name(insertion, Kind::Insertion);
    b.on_match(insertion, actions::pack_insertion);

    // Terminators. Content stops at the closing pattern of the
    // innermost open construct; outside any construct, only the end of
    // input stops it.

    let end_token = b.terminator(
        &[
            (Kind::Bold, bold_end),
            (Kind::Italics, italics_end),
            (Kind::WikiLink, bracket_end),
            (Kind::UrlBracketed, url_bracket_end),
            (Kind::Image, bracket_end),
            (Kind::Table, table_end),
            (Kind::List, list_end),
            (Kind::PreHtml, pre_html_end),
            (Kind::PreSpace, pre_space_end),
            (Kind::Heading, heading_end),
            (Kind::TodoEntry, todo_end),
            (Kind::NoExportLine, hidden_end),
        ],
        string_end,
    );
    let end_in_table = b.first(&[end_token, table_element]);
    let end_in_line = {
        let nl = b.pattern(r"\n");
        b.first(&[end_token, nl])
    };
    let end_in_attribution = b.first(&[end_token, heading]);

    // Content scopes. Each one scans for the next construct from its
    // alternative list, turning skipped text into plain-text leaves,
    // and stops at its terminator.

    let cell_body = {
        let step = content_step(
            &mut b,
            &[
                bold,
                italics,
                hidden_line,
                nowiki_span,
                url_ref,
                image,
                insertion,
                escaped_char,
                nowiki_standalone,
                footnote,
                wiki_word,
                paragraph_break,
                newline_whitespace,
                body_html,
                html_tag,
                html_entity,
                html_comment,
                list,
                list_continuation,
            ],
            end_in_table,
        );
        b.star(step)
    };
    b.define(cell_content, cell_body);

    let title_body = {
        let step = content_step(
            &mut b,
            &[
                bold,
                italics,
                hidden_line,
                nowiki_span,
                url_ref,
                image,
                insertion,
                escaped_char,
                nowiki_standalone,
                footnote,
                body_html,
                html_tag,
                html_entity,
                html_comment,
            ],
            end_in_line,
        );
        b.star(step)
    };
    b.define(title_content, title_body);

    let heading_body = {
        let step = content_step(
            &mut b,
            &[
                bold,
                italics,
                hidden_line,
                nowiki_span,
                url_ref,
                image,
                insertion,
                escaped_char,
                nowiki_standalone,
                footnote,
                wiki_word,
                body_html,
                html_tag,
                html_entity,
                html_comment,
            ],
            end_in_line,
        );
        b.star(step)
    };
    b.define(heading_content, heading_body);

    let todo_body = {
        let step = content_step(
            &mut b,
            &[
                bold,
                italics,
                hidden_line,
                nowiki_span,
                url_ref,
                image,
                attribute,
                insertion,
                escaped_char,
                nowiki_standalone,
                footnote,
                wiki_word,
                body_html,
                html_tag,
                html_entity,
                html_comment,
            ],
            end_token,
        );
        b.plus(step)
    };
    b.define(todo_content, todo_body);

    let attribution_body = {
        let step = content_step(
            &mut b,
            &[
                bold,
                italics,
                hidden_line,
                nowiki_span,
                url_ref,
                image,
                attribute,
                insertion,
                escaped_char,
                nowiki_standalone,
                footnote,
                wiki_word,
                paragraph_break,
                newline_whitespace,
                todo_terminated,
                anchor_def,
                pre_space,
                pre_html,
                body_html,
                html_tag,
                html_entity,
                html_comment,
                table,
            ],
            end_in_attribution,
        );
        b.star(step)
    };
    b.define(attribution_content, attribution_body);

    let main_body = {
        let step = content_step(
            &mut b,
            &[
                bold,
                italics,
                hidden_line,
                nowiki_span,
                url_ref,
                image,
                attribute,
                insertion,
                escaped_char,
                nowiki_standalone,
                footnote,
                wiki_word,
                paragraph_break,
                newline_whitespace,
                heading,
                todo_terminated,
                anchor_def,
                pre_space,
                pre_html,
                body_html,
                html_tag,
                html_entity,
                html_comment,
                list,
                list_continuation,
                table,
                script,
                horizontal_rule,
            ],
            end_token,
        );
        b.star(step)
    };
    b.define(content, main_body);
    b.on_validate(content, actions::validate_non_empty);

    // Entry points.

    let text = b.seq(&[content, string_end]);
    let todo_value = b.seq(&[todo_content, string_end]);
    let extractable = {
        let any = b.first(&[link_core, wiki_word]);
        let id = b.seq(&[any, string_end]);
        b.name(id, Kind::ExtractedLink);
        id
    };

    WikiGrammar {
        grammar: b.finish(),
        text,
        todo_value,
        todo_entry: todo_whole,
        extractable,
    }
}

/// Seq step of one content scope: refuse the terminator, then scan
/// forward for the next construct, wrapping skipped text as plain text.
fn content_step(b: &mut Builder, alts: &[ExprId], end: ExprId) -> ExprId {
    let scan = b.scan(alts, end, Some(actions::skipped_to_plain_text));
    let guard = b.not_ahead(end);
    b.seq(&[guard, scan])
}

/// One HTML-style attribute list, packed under `kind` with the parsed
/// pairs attached.
fn attribute_list(b: &mut Builder, html_attribute: ExprId, kind: Kind) -> ExprId {
    let id = b.plus(html_attribute);
    b.name(id, kind);
    b.on_match(id, actions::collect_html_attributes);
    id
}

/// A URL core with an optional `>`-introduced appendix.
fn url_with_appendix(b: &mut Builder) -> ExprId {
    let core = b.capture(URL_PAT, Kind::UrlCore);
    let entry = {
        let key = b.capture(r"(?:(?![;\|\]=:])\S)+[=:]|(?![;\|\]=:])\S", Kind::Key);
        let data = b.capture(r"(?:(?![;\|\]])\S)*", Kind::Data);
        let id = b.seq(&[key, data]);
        b.name(id, Kind::AppendixEntry);
        id
    };
    let appendix = {
        let semi = b.pattern(";");
        let another = b.seq(&[semi, entry]);
        let more = b.star(another);
        let id = b.seq(&[entry, more]);
        b.name(id, Kind::Appendix);
        b.on_match(id, actions::collect_appendix);
        b.on_match(id, actions::apply_appendix_globals);
        id
    };
    let tail = {
        let gt = b.pattern(">");
        b.seq(&[gt, appendix])
    };
    let opt_tail = b.opt(tail);
    b.seq(&[core, opt_tail])
}

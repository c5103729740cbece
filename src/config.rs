//! Format options supplied by the host document layer.

use crate::autolink::AutoLinkInfo;
use std::collections::HashSet;

/// The name of the markup dialect this crate parses. Stored by hosts next
/// to cached parse trees so they can tell which options they were built
/// under.
pub const LANGUAGE_NAME: &str = "wikimark/1";

/// When the auto-link pass rewrites plain text into links.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoLinkMode {
    /// Plain text is left alone.
    #[default]
    Off,
    /// Known page names found in plain text become links, matching
    /// case-insensitively and across runs of non-word characters.
    Relax,
}

/// The options a page is parsed under.
///
/// Hosts keep one of these per document and pass it to every parse. All
/// fields are read-only to the parser.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FormatDetails {
    /// Whether camel-case words count as links. Kept for host
    /// compatibility; this dialect only links bracketed words, so the
    /// option does not change parsing.
    pub with_camel_case: bool,
    /// Whether a bracketed number like `[[42]]` is a link to a page of
    /// that name instead of a footnote.
    pub footnotes_as_wikiwords: bool,
    /// Parse the whole page as one run of plain text.
    pub no_format: bool,
    /// Whether the editor joins adjacent lines into paragraphs. Kept for
    /// host compatibility; does not change parsing.
    pub paragraph_mode: bool,
    /// When the auto-link pass runs.
    pub auto_link: AutoLinkMode,
    /// The absolute name of the page being parsed, the base for resolving
    /// relative links. Without it, relative links keep their written form
    /// and upward links stay plain text.
    pub base_page: Option<String>,
    /// Absolute page names that must not become links.
    pub link_blacklist: HashSet<String>,
    /// Compiled matchers for the auto-link pass, built once per word list
    /// by the host.
    #[serde(skip)]
    pub auto_link_info: Option<AutoLinkInfo>,
}

impl FormatDetails {
    /// Whether a tree parsed under `other` would be identical to one
    /// parsed under `self`, so hosts can reuse cached trees across
    /// equivalent option sets. Trees are cached per page, so the base
    /// page and blacklist are not part of the comparison.
    pub fn is_equiv_to(&self, other: &FormatDetails) -> bool {
        if self.no_format || other.no_format {
            return self.no_format == other.no_format;
        }
        self.with_camel_case == other.with_camel_case
            && self.auto_link == other.auto_link
            && self.paragraph_mode == other.paragraph_mode
            && self.footnotes_as_wikiwords == other.footnotes_as_wikiwords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalence_ignores_per_page_fields() {
        let mut a = FormatDetails::default();
        let mut b = FormatDetails {
            base_page: Some("Page".into()),
            link_blacklist: HashSet::from(["Other".into()]),
            ..<_>::default()
        };
        assert!(a.is_equiv_to(&b));

        b.auto_link = AutoLinkMode::Relax;
        assert!(!a.is_equiv_to(&b));
        a.auto_link = AutoLinkMode::Relax;
        b.with_camel_case = true;
        assert!(!a.is_equiv_to(&b));
        a.with_camel_case = true;
        b.footnotes_as_wikiwords = true;
        assert!(!a.is_equiv_to(&b));
        a.footnotes_as_wikiwords = true;
        assert!(a.is_equiv_to(&b));

        b.no_format = true;
        assert!(!a.is_equiv_to(&b));
        a.no_format = true;
        a.auto_link = AutoLinkMode::Off;
        assert!(a.is_equiv_to(&b));
    }

    #[test]
    fn test_serde_round_trip() {
        let details = FormatDetails {
            footnotes_as_wikiwords: true,
            auto_link: AutoLinkMode::Relax,
            base_page: Some("a/b".into()),
            ..<_>::default()
        };
        let json = serde_json::to_string(&details).unwrap();
        let back: FormatDetails = serde_json::from_str(&json).unwrap();
        assert!(back.footnotes_as_wikiwords);
        assert_eq!(back.auto_link, AutoLinkMode::Relax);
        assert_eq!(back.base_page.as_deref(), Some("a/b"));
        assert!(back.auto_link_info.is_none());
    }
}

//! Relative and absolute page path algebra.
//!
//! Pages form a tree, and links address other pages the way file systems
//! do: `//a/b` from the root, `/child` below the current page, `name` for a
//! sibling, and `..` runs to go further up.

use std::fmt;

/// A link path error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The link core was exactly `//`, which names the root. The root is
    /// not a page.
    #[error("'//' is not a valid link")]
    RootLink,
    /// The link core ended with a path separator.
    #[error("a link core cannot end with '/'")]
    TrailingSlash,
    /// The link core was empty.
    #[error("a link core cannot be empty")]
    EmptyLinkCore,
    /// A join arrived exactly at the root, which has no page name.
    #[error("a link cannot point at the wiki root")]
    LinkToRoot,
    /// A join went through more levels than exist above the root.
    #[error("cannot go upward from the wiki root")]
    AboveRoot,
    /// A path-creation helper was given an empty target page.
    #[error("a link target cannot be empty")]
    EmptyTarget,
    /// A relative path was resolved without a base page.
    #[error("a relative link needs a base page")]
    MissingBase,
}

/// A parsed link path.
///
/// The path records whether the link was written absolute or relative, so
/// that regenerating the written form round-trips.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LinkPath {
    /// A path from the wiki root.
    Absolute {
        /// Path components from the root downward. Never empty.
        components: Vec<String>,
    },
    /// A path relative to the page the link is written on.
    Relative {
        /// How many levels to go up first. `0` addresses pages below the
        /// base page itself; a plain sibling name has an upward count
        /// of 1.
        upward: usize,
        /// Path components to follow after going up.
        components: Vec<String>,
    },
}

impl LinkPath {
    /// Parses the written form of a link.
    pub fn from_link_core(link_core: &str) -> Result<Self, Error> {
        if link_core == "//" {
            return Err(Error::RootLink);
        }
        if link_core.ends_with('/') {
            return Err(Error::TrailingSlash);
        }
        if link_core.is_empty() {
            return Err(Error::EmptyLinkCore);
        }

        if let Some(rest) = link_core.strip_prefix("//") {
            return Ok(Self::Absolute {
                components: split(rest),
            });
        }

        if let Some(rest) = link_core.strip_prefix('/') {
            return Ok(Self::Relative {
                upward: 0,
                components: split(rest),
            });
        }

        // A link to the page it is written on
        if link_core == "." {
            return Ok(Self::Relative {
                upward: 0,
                components: Vec::new(),
            });
        }

        let components = split(link_core);
        for (index, component) in components.iter().enumerate() {
            if component != ".." {
                return Ok(Self::Relative {
                    upward: index + 1,
                    components: components[index..].to_vec(),
                });
            }
        }
        Ok(Self::Relative {
            upward: components.len(),
            components: Vec::new(),
        })
    }

    /// Creates an absolute path from a page name.
    pub fn from_page_name(page_name: &str) -> Self {
        Self::Absolute {
            components: split(page_name),
        }
    }

    /// Whether the written form of `link_core` is absolute.
    pub fn is_absolute_link_core(link_core: &str) -> bool {
        link_core.starts_with("//")
    }

    /// Whether the path starts at the root.
    #[inline]
    pub fn is_absolute(&self) -> bool {
        matches!(self, Self::Absolute { .. })
    }

    /// The path components, after any upward runs.
    #[inline]
    pub fn components(&self) -> &[String] {
        match self {
            Self::Absolute { components } | Self::Relative { components, .. } => components,
        }
    }

    /// The path extended by `other`.
    ///
    /// An absolute `other` replaces the path entirely. An upward count on
    /// `other` larger than the number of available components propagates
    /// outward on a relative path, and fails on an absolute one.
    pub fn join_to(&self, other: &LinkPath) -> Result<LinkPath, Error> {
        match other {
            Self::Absolute { components } => Ok(Self::Absolute {
                components: components.clone(),
            }),
            Self::Relative {
                upward: 0,
                components,
            } => {
                let mut joined = self.clone();
                match &mut joined {
                    Self::Absolute { components: own }
                    | Self::Relative {
                        components: own, ..
                    } => own.extend_from_slice(components),
                }
                Ok(joined)
            }
            Self::Relative { upward, components } => {
                let own = self.components();
                if *upward <= own.len() {
                    let mut kept = own[..own.len() - upward].to_vec();
                    kept.extend_from_slice(components);
                    match self {
                        Self::Absolute { .. } => {
                            if kept.is_empty() {
                                Err(Error::LinkToRoot)
                            } else {
                                Ok(Self::Absolute { components: kept })
                            }
                        }
                        Self::Relative {
                            upward: own_upward, ..
                        } => Ok(Self::Relative {
                            upward: *own_upward,
                            components: kept,
                        }),
                    }
                } else {
                    match self {
                        Self::Absolute { .. } => Err(Error::AboveRoot),
                        // The upward run walked over every own component,
                        // so the rest of it moves outward
                        Self::Relative {
                            upward: own_upward, ..
                        } => Ok(Self::Relative {
                            upward: own_upward + (upward - own.len()),
                            components: components.clone(),
                        }),
                    }
                }
            }
        }
    }

    /// Extends the path by `other` in place.
    pub fn join(&mut self, other: &LinkPath) -> Result<(), Error> {
        *self = self.join_to(other)?;
        Ok(())
    }

    /// The written form of the path.
    pub fn link_core(&self) -> String {
        match self {
            Self::Absolute { components } => {
                debug_assert!(!components.is_empty());
                format!("//{}", components.join("/"))
            }
            Self::Relative {
                upward: 0,
                components,
            } => {
                if components.is_empty() {
                    ".".to_owned()
                } else {
                    format!("/{}", components.join("/"))
                }
            }
            Self::Relative { upward, components } => {
                if components.is_empty() {
                    vec![".."; *upward].join("/")
                } else {
                    let mut out = vec![".."; upward - 1].join("/");
                    if !out.is_empty() {
                        out.push('/');
                    }
                    out + &components.join("/")
                }
            }
        }
    }

    /// The absolute name of the page the path points at.
    pub fn resolve(&self, base: Option<&LinkPath>) -> Result<String, Error> {
        if let Self::Absolute { components } = self {
            return Ok(components.join("/"));
        }
        let base = base.ok_or(Error::MissingBase)?;
        Ok(base.join_to(self)?.components().join("/"))
    }

    /// Resolves the path against an absolute `base`, also computing the
    /// pieces autocompletion needs.
    pub fn resolve_completion(&self, base: &LinkPath) -> ResolvedLink {
        if let Self::Absolute { components } = self {
            return ResolvedLink {
                prefix: Some("//".to_owned()),
                silence: 0,
                page: components.join("/"),
            };
        }
        debug_assert!(base.is_absolute());
        let base = base.components();
        let Self::Relative { upward, components } = self else {
            unreachable!();
        };

        if components.is_empty() {
            // Only dots; no word to complete on
            let kept = base.len().saturating_sub(*upward);
            return ResolvedLink {
                prefix: None,
                silence: 0,
                page: base[..kept].join("/"),
            };
        }

        let (prefix, kept) = match upward {
            0 => ("/".to_owned(), base.len()),
            1 => (String::new(), base.len().saturating_sub(1)),
            _ => {
                let mut prefix = vec![".."; upward - 1].join("/");
                prefix.push('/');
                (prefix, base.len().saturating_sub(*upward))
            }
        };
        let kept_name = base[..kept].join("/");
        let silence = if *upward == 0 {
            kept_name.chars().count() + 1
        } else {
            len_add_one(&kept_name)
        };
        let mut page = base[..kept].to_vec();
        page.extend_from_slice(components);
        ResolvedLink {
            prefix: Some(prefix),
            silence,
            page: page.join("/"),
        }
    }

    /// A path that reaches `self` from `base`, both absolute.
    ///
    /// With `downward_only`, the result never contains parent runs, and
    /// `None` is returned when no such path exists. Otherwise a path always
    /// exists.
    pub fn relative_to(&self, base: &LinkPath, downward_only: bool) -> Option<LinkPath> {
        debug_assert!(self.is_absolute() && base.is_absolute());
        let target = self.components();
        let base = base.components();

        if target == base {
            return Some(if let Some(last) = target.last() {
                LinkPath::Relative {
                    upward: 1,
                    components: vec![last.clone()],
                }
            } else {
                LinkPath::Relative {
                    upward: 0,
                    components: Vec::new(),
                }
            });
        }

        if downward_only {
            if base.len() >= target.len() || base != &target[..base.len()] {
                return None;
            }
            return Some(LinkPath::Relative {
                upward: 0,
                components: target[base.len()..].to_vec(),
            });
        }

        let common = target
            .iter()
            .zip(base)
            .take_while(|(t, b)| t == b)
            .count();
        Some(LinkPath::Relative {
            upward: base.len() - common,
            components: target[common..].to_vec(),
        })
    }
}

impl fmt::Display for LinkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.link_core())
    }
}

/// A resolved link plus the autocompletion recipe for it: suggestions are
/// found by page-name prefix search on `page`, then rewritten for display
/// by dropping the first `silence` characters and prepending `prefix`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedLink {
    /// The display prefix, or `None` when completion is not possible for
    /// this shape of path.
    pub prefix: Option<String>,
    /// How many characters to drop from a found page name.
    pub silence: usize,
    /// The absolute name of the page the path points at.
    pub page: String,
}

fn split(text: &str) -> Vec<String> {
    text.split('/').map(str::to_owned).collect()
}

fn len_add_one(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.chars().count() + 1
    }
}

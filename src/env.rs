//! Per-parse dynamic state.
//!
//! Every grammar element evaluation pushes a scope frame, so state written
//! by an element is visible to everything nested below it and gone once it
//! finishes. Reads walk from the innermost frame outward. A handful of
//! constructs write one frame further out instead, so that sibling matches
//! inside the same construct can see each other's state.

use crate::{config::FormatDetails, node::Kind};
use std::sync::atomic::{AtomicBool, Ordering};

/// A cooperative cancellation flag, shared between a parse and the caller
/// that may want to stop it.
#[derive(Debug, Default)]
pub struct CancelHandle(AtomicBool);

impl CancelHandle {
    /// Creates a handle in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals the parse to stop at its next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was signalled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One dynamic scope.
#[derive(Debug, Default)]
struct Frame {
    /// The construct that owns the frame, for named elements.
    name: Option<Kind>,
    /// Whether a preformatted block is open, when set here.
    in_pre: Option<bool>,
    /// The quote run which opened the attribute value being parsed, when
    /// set here.
    attr_quote: Option<String>,
    /// The previous normalized bullet run of the list owning this frame.
    bullets: Option<String>,
}

/// The mutable state of one parse.
pub(crate) struct Env<'a> {
    /// The source text.
    pub source: &'a str,
    /// The format options the parse runs under.
    pub format: &'a FormatDetails,
    cancel: &'a CancelHandle,
    frames: Vec<Frame>,
    /// The names of the currently open named constructs, outermost first.
    names: Vec<Kind>,
}

impl<'a> Env<'a> {
    pub fn new(source: &'a str, format: &'a FormatDetails, cancel: &'a CancelHandle) -> Self {
        Self {
            source,
            format,
            cancel,
            frames: Vec::new(),
            names: Vec::new(),
        }
    }

    /// Whether cancellation was signalled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Opens a scope for an element evaluation.
    pub fn push_frame(&mut self, name: Option<Kind>) {
        if let Some(name) = name {
            self.names.push(name);
        }
        self.frames.push(Frame {
            name,
            ..<_>::default()
        });
    }

    /// Closes the innermost scope.
    pub fn pop_frame(&mut self) {
        let frame = self.frames.pop();
        debug_assert!(frame.is_some());
        if frame.is_some_and(|frame| frame.name.is_some()) {
            self.names.pop();
        }
    }

    /// The currently open named constructs, outermost first.
    #[inline]
    pub fn open_names(&self) -> &[Kind] {
        &self.names
    }

    /// Whether any of `names` is open, not counting the innermost one.
    ///
    /// Self-nesting guards run just after their own construct was pushed,
    /// so the innermost entry is the construct asking.
    pub fn is_open_outside_top(&self, names: &[Kind]) -> bool {
        let outer = &self.names[..self.names.len().saturating_sub(1)];
        outer.iter().any(|open| names.contains(open))
    }

    /// Whether a preformatted block is open.
    pub fn in_pre(&self) -> bool {
        self.read_in_pre(self.frames.len())
    }

    /// Whether a preformatted block is open, as seen from the parent scope.
    pub fn in_pre_outside_top(&self) -> bool {
        self.read_in_pre(self.frames.len().saturating_sub(1))
    }

    fn read_in_pre(&self, top: usize) -> bool {
        self.frames[..top]
            .iter()
            .rev()
            .find_map(|frame| frame.in_pre)
            .unwrap_or(false)
    }

    /// Marks a preformatted block open in the parent scope, so the mark
    /// outlives the element that set it but not the construct around it.
    pub fn set_in_pre_outside_top(&mut self) {
        let index = self.frames.len().saturating_sub(2);
        if let Some(frame) = self.frames.get_mut(index) {
            frame.in_pre = Some(true);
        }
    }

    /// The quote run which opened the attribute value being parsed.
    pub fn attr_quote(&self) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.attr_quote.as_deref())
    }

    /// Records the quote run opening an attribute value, in the parent
    /// scope.
    pub fn set_attr_quote_outside_top(&mut self, quote: String) {
        let index = self.frames.len().saturating_sub(2);
        if let Some(frame) = self.frames.get_mut(index) {
            frame.attr_quote = Some(quote);
        }
    }

    /// The previous bullet run of the innermost open list, live for the
    /// whole list so sibling lines can diff against each other.
    pub fn list_bullets_mut(&mut self) -> Option<&mut String> {
        self.frames
            .iter_mut()
            .rev()
            .find(|frame| frame.name == Some(Kind::List))
            .map(|frame| frame.bullets.get_or_insert_with(String::new))
    }
}

/// Whether everything between `pos` and the start of its line is blank.
///
/// Block markup like tables and rules may be indented but must not share
/// the line with anything else.
pub(crate) fn blank_before(source: &str, pos: usize) -> bool {
    source[..pos]
        .bytes()
        .rev()
        .take_while(|&b| b != b'\n')
        .all(|b| b == b' ' || b == b'\t')
}

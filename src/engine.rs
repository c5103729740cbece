//! Backtracking combinator engine.
//!
//! A grammar is an arena of [`Expr`]s composed of a handful of primitives:
//! anchored regex terminals, sequences, ordered choices, repetitions,
//! lookaheads, and a text scanner which hunts forward for the next markup
//! construct. Expressions are referenced by [`ExprId`], so recursive
//! grammars need no interior pointers and the finished [`Grammar`] can be
//! shared freely between threads.
//!
//! Evaluation is ordinary recursive descent with backtracking. A failed
//! expression rejects with [`Reject::Local`], which the nearest enclosing
//! choice or repetition recovers from; only cancellation is allowed to
//! unwind the whole parse. Every evaluation pushes a scope frame on the
//! [`Env`], so semantic hooks can read and write dynamically scoped state
//! and the terminator primitive can ask which named constructs are
//! currently open.

use crate::{
    codemap::Span,
    config::FormatDetails,
    env::{CancelHandle, Env},
    node::{Kind, Node, NonTerminal, Terminal},
};

/// Index of an expression in a [`Grammar`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ExprId(u32);

/// Why an evaluation did not produce a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Reject {
    /// No match here. Recoverable by the nearest choice or repetition.
    /// Carries the furthest source offset reached, for error reports.
    Local(usize),
    /// The cancel handle was signalled. Never recovered from.
    Cancelled,
}

/// What a completion hook did with the matched tokens.
pub(crate) enum Emit {
    /// Keep the tokens, including any in-place edits the hook made.
    Keep,
    /// Discard the tokens and splice these nodes into the parent instead.
    Replace(Vec<Node>),
}

/// Runs before an expression is attempted. Rejecting here vetoes the
/// match without consuming anything.
pub(crate) type StartHook = fn(&mut Parser<'_, '_>, usize) -> Result<(), Reject>;

/// Runs after a match, even during lookahead probes.
pub(crate) type ValidateHook = fn(usize, &NonTerminal) -> Result<(), Reject>;

/// Runs after a match, only when the parse is building a tree for real.
pub(crate) type PostHook = fn(&mut Parser<'_, '_>, usize, &mut NonTerminal) -> Result<Emit, Reject>;

/// Turns the plain text a [`ExprKind::Scan`] skipped over into nodes.
pub(crate) type SkipHook = fn(Terminal) -> Vec<Node>;

pub(crate) enum ExprKind {
    /// A regex anchored at the current position.
    Match(fancy_regex::Regex),
    /// All in order, or fail at the first miss.
    Seq(Vec<ExprId>),
    /// The first alternative that matches wins, not the longest.
    First(Vec<ExprId>),
    Opt(ExprId),
    Star(ExprId),
    Plus(ExprId),
    /// Zero-width negative lookahead.
    NotAhead(ExprId),
    /// Zero-width positive lookahead.
    Ahead(ExprId),
    /// Advances character by character until `end` or one of `alts`
    /// matches, then hands the skipped text to `skip`. `end` is probed
    /// first at every position and is never consumed.
    Scan {
        alts: Vec<ExprId>,
        end: ExprId,
        skip: Option<SkipHook>,
    },
    /// Delegates to the closing pattern of the innermost open construct
    /// listed in `ends`, or to `fallback` when none is open.
    Terminator {
        ends: Vec<(Kind, ExprId)>,
        fallback: ExprId,
    },
    /// Forward reference, patched in by [`Builder::define`].
    Alias(ExprId),
}

impl ExprKind {
    /// Whether a name on this expression packs the produced nodes into
    /// one named parent. Terminals carry their name themselves, and an
    /// alias packs on its own terms in [`Parser::eval_impl`].
    fn packs_when_named(&self) -> bool {
        !matches!(self, Self::Match(_) | Self::Alias(_))
    }
}

pub(crate) struct Expr {
    kind: ExprKind,
    name: Option<Kind>,
    start: Vec<StartHook>,
    validate: Vec<ValidateHook>,
    post: Vec<PostHook>,
}

/// A finished, immutable grammar.
pub(crate) struct Grammar {
    exprs: Vec<Expr>,
}

impl Grammar {
    fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }
}

/// Assembles a [`Grammar`] one expression at a time.
pub(crate) struct Builder {
    exprs: Vec<Expr>,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    fn push(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr {
            kind,
            name: None,
            start: Vec::new(),
            validate: Vec::new(),
            post: Vec::new(),
        });
        id
    }

    /// Adds an anonymous terminal matching `pattern` at the current
    /// position. Patterns run in multi-line mode with `.` matching
    /// newlines, the same dialect the rest of the grammar is written in.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile; grammars are built from
    /// fixed strings, so this is always a defect in the grammar itself.
    pub(crate) fn pattern(&mut self, pattern: &str) -> ExprId {
        let re = match fancy_regex::Regex::new(&format!("(?ms)\\G(?:{pattern})")) {
            Ok(re) => re,
            Err(err) => panic!("grammar pattern {pattern:?} does not compile: {err}"),
        };
        self.push(ExprKind::Match(re))
    }

    /// Adds a terminal whose match becomes a named leaf node.
    pub(crate) fn capture(&mut self, pattern: &str, kind: Kind) -> ExprId {
        let id = self.pattern(pattern);
        self.name(id, kind);
        id
    }

    pub(crate) fn seq(&mut self, items: &[ExprId]) -> ExprId {
        self.push(ExprKind::Seq(items.to_vec()))
    }

    pub(crate) fn first(&mut self, alts: &[ExprId]) -> ExprId {
        self.push(ExprKind::First(alts.to_vec()))
    }

    pub(crate) fn opt(&mut self, item: ExprId) -> ExprId {
        self.push(ExprKind::Opt(item))
    }

    pub(crate) fn star(&mut self, item: ExprId) -> ExprId {
        self.push(ExprKind::Star(item))
    }

    pub(crate) fn plus(&mut self, item: ExprId) -> ExprId {
        self.push(ExprKind::Plus(item))
    }

    pub(crate) fn not_ahead(&mut self, item: ExprId) -> ExprId {
        self.push(ExprKind::NotAhead(item))
    }

    pub(crate) fn ahead(&mut self, item: ExprId) -> ExprId {
        self.push(ExprKind::Ahead(item))
    }

    pub(crate) fn scan(&mut self, alts: &[ExprId], end: ExprId, skip: Option<SkipHook>) -> ExprId {
        self.push(ExprKind::Scan {
            alts: alts.to_vec(),
            end,
            skip,
        })
    }

    pub(crate) fn terminator(&mut self, ends: &[(Kind, ExprId)], fallback: ExprId) -> ExprId {
        self.push(ExprKind::Terminator {
            ends: ends.to_vec(),
            fallback,
        })
    }

    /// Reserves an expression which can be referenced before it is
    /// defined, for recursive rules.
    pub(crate) fn forward(&mut self) -> ExprId {
        // Patched by define(); evaluating an undefined forward loops on
        // itself and is caught by the debug assertion there.
        let id = ExprId(self.exprs.len() as u32);
        self.push(ExprKind::Alias(id))
    }

    pub(crate) fn define(&mut self, forward: ExprId, item: ExprId) {
        debug_assert!(matches!(
            self.exprs[forward.0 as usize].kind,
            ExprKind::Alias(inner) if inner == forward
        ));
        self.exprs[forward.0 as usize].kind = ExprKind::Alias(item);
    }

    pub(crate) fn name(&mut self, id: ExprId, kind: Kind) {
        self.exprs[id.0 as usize].name = Some(kind);
    }

    pub(crate) fn on_start(&mut self, id: ExprId, hook: StartHook) {
        self.exprs[id.0 as usize].start.push(hook);
    }

    pub(crate) fn on_validate(&mut self, id: ExprId, hook: ValidateHook) {
        self.exprs[id.0 as usize].validate.push(hook);
    }

    pub(crate) fn on_match(&mut self, id: ExprId, hook: PostHook) {
        self.exprs[id.0 as usize].post.push(hook);
    }

    pub(crate) fn finish(self) -> Grammar {
        Grammar { exprs: self.exprs }
    }
}

/// One parse in progress: the source text, the scope stack, and the
/// grammar being evaluated.
pub(crate) struct Parser<'g, 's> {
    grammar: &'g Grammar,
    pub(crate) env: Env<'s>,
}

impl<'g, 's> Parser<'g, 's> {
    pub(crate) fn new(
        grammar: &'g Grammar,
        source: &'s str,
        format: &'s FormatDetails,
        cancel: &'s CancelHandle,
    ) -> Self {
        Self {
            grammar,
            env: Env::new(source, format, cancel),
        }
    }

    /// Evaluates `root` at the start of the source, producing the
    /// top-level node list.
    pub(crate) fn run(&mut self, root: ExprId) -> Result<Vec<Node>, Reject> {
        let (_, nodes) = self.eval(root, 0, true)?;
        Ok(nodes)
    }

    /// Evaluates one expression at `pos`. Returns the end position and
    /// the nodes produced. `act` selects whether completion hooks run;
    /// lookahead probes pass `false` so they stay (mostly) free of side
    /// effects.
    pub(crate) fn eval(
        &mut self,
        id: ExprId,
        pos: usize,
        act: bool,
    ) -> Result<(usize, Vec<Node>), Reject> {
        let grammar = self.grammar;
        let expr = grammar.expr(id);
        self.env.push_frame(expr.name);
        let result = self.eval_framed(expr, pos, act);
        self.env.pop_frame();
        result
    }

    fn eval_framed(
        &mut self,
        expr: &'g Expr,
        pos: usize,
        act: bool,
    ) -> Result<(usize, Vec<Node>), Reject> {
        for hook in &expr.start {
            hook(self, pos)?;
        }

        let (end, nodes) = self.eval_impl(expr, pos, act)?;

        // Nodes travel upward inside a group node. A name on the
        // expression makes the group part of the tree; otherwise it is an
        // anonymous carrier whose children will be spliced into the
        // parent. Hooks may rename a carrier to promote it.
        let name = expr.name.filter(|_| expr.kind.packs_when_named());
        let mut tokens = NonTerminal::new(nodes, pos, name);

        for hook in &expr.validate {
            hook(pos, &tokens)?;
        }

        let mut replacement = None;
        if act {
            for hook in &expr.post {
                match hook(self, pos, &mut tokens)? {
                    Emit::Keep => {}
                    Emit::Replace(nodes) => {
                        replacement = Some(nodes);
                        break;
                    }
                }
            }
        }

        if self.env.is_cancelled() {
            return Err(Reject::Cancelled);
        }

        let nodes = match replacement {
            Some(nodes) => nodes,
            None if tokens.kind.is_some() => vec![tokens.into()],
            None => tokens.children,
        };
        Ok((end, nodes))
    }

    fn eval_impl(
        &mut self,
        expr: &'g Expr,
        pos: usize,
        act: bool,
    ) -> Result<(usize, Vec<Node>), Reject> {
        let source = self.env.source;
        match &expr.kind {
            ExprKind::Match(re) => {
                let found = match re.find_from_pos(source, pos) {
                    Ok(found) => found,
                    Err(err) => {
                        log::debug!("pattern ran out of backtracking room at {pos}: {err}");
                        None
                    }
                };
                let Some(found) = found else {
                    return Err(Reject::Local(pos));
                };
                let end = found.end();
                let leaf = Terminal::new(&source[pos..end], Span::new(pos, end), expr.name);
                Ok((end, vec![leaf.into()]))
            }

            ExprKind::Seq(items) => {
                let mut at = pos;
                let mut nodes = Vec::new();
                for &item in items {
                    let (next, produced) = self.eval(item, at, act)?;
                    at = next;
                    nodes.extend(produced);
                }
                Ok((at, nodes))
            }

            ExprKind::First(alts) => {
                let mut furthest = pos;
                for &alt in alts {
                    match self.eval(alt, pos, act) {
                        Ok(hit) => return Ok(hit),
                        Err(Reject::Local(offset)) => furthest = furthest.max(offset),
                        Err(Reject::Cancelled) => return Err(Reject::Cancelled),
                    }
                }
                Err(Reject::Local(furthest))
            }

            ExprKind::Opt(item) => match self.eval(*item, pos, act) {
                Ok(hit) => Ok(hit),
                Err(Reject::Local(_)) => Ok((pos, Vec::new())),
                Err(Reject::Cancelled) => Err(Reject::Cancelled),
            },

            ExprKind::Star(item) => self.eval_repeat(*item, pos, act, Vec::new()),

            ExprKind::Plus(item) => {
                let (at, nodes) = self.eval(*item, pos, act)?;
                self.eval_repeat(*item, at, act, nodes)
            }

            ExprKind::NotAhead(item) => match self.eval(*item, pos, false) {
                Ok(_) => Err(Reject::Local(pos)),
                Err(Reject::Local(_)) => Ok((pos, Vec::new())),
                Err(Reject::Cancelled) => Err(Reject::Cancelled),
            },

            ExprKind::Ahead(item) => match self.eval(*item, pos, false) {
                Ok(_) => Ok((pos, Vec::new())),
                Err(err) => Err(err),
            },

            ExprKind::Scan { alts, end, skip } => self.eval_scan(alts, *end, *skip, pos, act),

            ExprKind::Terminator { ends, fallback } => {
                let selected = self
                    .env
                    .open_names()
                    .iter()
                    .rev()
                    .find_map(|open| {
                        ends.iter()
                            .find(|(kind, _)| kind == open)
                            .map(|&(_, end)| end)
                    })
                    .unwrap_or(*fallback);
                self.eval(selected, pos, act)
            }

            ExprKind::Alias(item) => {
                let (end, mut nodes) = self.eval(*item, pos, act)?;
                // A named alias of an anonymous group adopts the group's
                // nodes under its own name, but an empty match stays
                // invisible rather than leaving an empty named node.
                let inner = self.grammar.expr(*item);
                if expr.name.is_some()
                    && !nodes.is_empty()
                    && inner.name.is_none()
                    && inner.kind.packs_when_named()
                {
                    nodes = vec![NonTerminal::new(nodes, pos, expr.name).into()];
                }
                Ok((end, nodes))
            }
        }
    }

    fn eval_repeat(
        &mut self,
        item: ExprId,
        mut at: usize,
        act: bool,
        mut nodes: Vec<Node>,
    ) -> Result<(usize, Vec<Node>), Reject> {
        loop {
            match self.eval(item, at, act) {
                Ok((next, produced)) => {
                    at = next;
                    nodes.extend(produced);
                }
                Err(Reject::Local(_)) => return Ok((at, nodes)),
                Err(Reject::Cancelled) => return Err(Reject::Cancelled),
            }
        }
    }

    fn eval_scan(
        &mut self,
        alts: &[ExprId],
        end: ExprId,
        skip: Option<SkipHook>,
        pos: usize,
        act: bool,
    ) -> Result<(usize, Vec<Node>), Reject> {
        let source = self.env.source;
        let mut at = pos;
        let mut hit = None;
        let mut stopped = false;

        'scan: while at <= source.len() {
            match self.eval(end, at, act) {
                Ok(_) => {
                    stopped = true;
                    break;
                }
                Err(Reject::Local(_)) => {}
                Err(Reject::Cancelled) => return Err(Reject::Cancelled),
            }
            for &alt in alts {
                match self.eval(alt, at, act) {
                    Ok(found) => {
                        hit = Some(found);
                        break 'scan;
                    }
                    Err(Reject::Local(_)) => {}
                    Err(Reject::Cancelled) => return Err(Reject::Cancelled),
                }
            }
            at = match source[at..].chars().next() {
                Some(c) => at + c.len_utf8(),
                None => at + 1,
            };
        }

        if !stopped && hit.is_none() {
            return Err(Reject::Local(pos));
        }

        let skipped = Terminal::new(&source[pos..at], Span::new(pos, at), None);
        let mut nodes = match skip {
            Some(hook) => hook(skipped),
            None => Vec::new(),
        };
        match hit {
            Some((next, produced)) => {
                nodes.extend(produced);
                Ok((next, nodes))
            }
            None => Ok((at, nodes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;

    fn parse<'g>(
        grammar: &'g Grammar,
        root: ExprId,
        source: &str,
        format: &FormatDetails,
    ) -> Result<Vec<Node>, Reject> {
        let cancel = CancelHandle::new();
        let mut parser = Parser::new(grammar, source, format, &cancel);
        parser.run(root)
    }

    #[track_caller]
    fn parse_ok(grammar: &Grammar, root: ExprId, source: &str) -> Vec<Node> {
        parse(grammar, root, source, &FormatDetails::default()).unwrap()
    }

    #[test]
    fn test_terminal_carries_name_and_span() {
        let mut b = Builder::new();
        let word = b.capture(r"\w+", Kind::PlainText);
        let g = b.finish();
        let nodes = parse_ok(&g, word, "hello");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), Some(Kind::PlainText));
        assert_eq!(nodes[0].text(), "hello");
        assert_eq!(nodes[0].span(), Span::new(0, 5));
    }

    #[test]
    fn test_line_anchor_is_not_fooled_by_start_position() {
        let mut b = Builder::new();
        let skip = b.pattern(r"ab");
        let rule = b.pattern(r"^=");
        let root = b.seq(&[skip, rule]);
        let g = b.finish();
        // A line anchor mid-line must not match just because matching
        // resumes there.
        assert_eq!(
            parse(&g, root, "ab=c", &FormatDetails::default()),
            Err(Reject::Local(2))
        );

        let mut b = Builder::new();
        let skip = b.pattern(r"ab\n");
        let rule = b.pattern(r"^=");
        let root = b.seq(&[skip, rule]);
        let g = b.finish();
        assert!(parse(&g, root, "ab\n=c", &FormatDetails::default()).is_ok());
    }

    #[test]
    fn test_first_takes_first_alternative_not_longest() {
        let mut b = Builder::new();
        let short = b.capture("a", Kind::PlainText);
        let long = b.capture("aa", Kind::Code);
        let root = b.first(&[short, long]);
        let g = b.finish();
        let nodes = parse_ok(&g, root, "aa");
        assert_eq!(nodes[0].kind(), Some(Kind::PlainText));
        assert_eq!(nodes[0].text(), "a");
    }

    #[test]
    fn test_named_group_packs_and_anonymous_group_splices() {
        let mut b = Builder::new();
        let open = b.pattern("'''");
        let body = b.capture("[a-z]+", Kind::PlainText);
        let close = b.pattern("'''");
        let named = b.seq(&[open, body, close]);
        b.name(named, Kind::Bold);
        let anon = b.seq(&[open, body, close]);
        let g = b.finish();

        let nodes = parse_ok(&g, named, "'''hi'''");
        assert_eq!(nodes.len(), 1);
        let bold = &nodes[0];
        assert_eq!(bold.kind(), Some(Kind::Bold));
        assert_eq!(bold.children().len(), 3);
        assert_eq!(bold.span(), Span::new(0, 8));
        assert_eq!(bold.find(Kind::PlainText).unwrap().text(), "hi");

        let nodes = parse_ok(&g, anon, "'''hi'''");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind(), None);
    }

    #[test]
    fn test_star_stops_at_first_miss() {
        let mut b = Builder::new();
        let item = b.capture("a", Kind::PlainText);
        let root = b.star(item);
        let g = b.finish();
        assert_eq!(parse_ok(&g, root, "aaab").len(), 3);
        assert_eq!(parse_ok(&g, root, "b").len(), 0);
    }

    #[test]
    fn test_plus_requires_one() {
        let mut b = Builder::new();
        let item = b.capture("a", Kind::PlainText);
        let root = b.plus(item);
        let g = b.finish();
        assert_eq!(parse_ok(&g, root, "aa").len(), 2);
        assert!(parse(&g, root, "b", &FormatDetails::default()).is_err());
    }

    #[test]
    fn test_lookaheads_consume_nothing() {
        let mut b = Builder::new();
        let stop = b.pattern("b");
        let guard = b.not_ahead(stop);
        let any = b.capture(".", Kind::PlainText);
        let root = b.seq(&[guard, any]);
        let g = b.finish();
        let nodes = parse_ok(&g, root, "a");
        assert_eq!(nodes.len(), 1);
        assert!(parse(&g, root, "b", &FormatDetails::default()).is_err());

        let mut b = Builder::new();
        let next = b.pattern("ab");
        let peek = b.ahead(next);
        let one = b.capture("a", Kind::PlainText);
        let root = b.seq(&[peek, one]);
        let g = b.finish();
        let nodes = parse_ok(&g, root, "ab");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text(), "a");
    }

    fn rename_skipped(mut leaf: Terminal) -> Vec<Node> {
        if leaf.text.is_empty() {
            return Vec::new();
        }
        leaf.kind = Some(Kind::PlainText);
        vec![leaf.into()]
    }

    #[test]
    fn test_scan_wraps_skipped_text_and_leaves_end_unconsumed() {
        let mut b = Builder::new();
        let bold_open = b.pattern("'''");
        let bold_body = b.capture("[a-z]+", Kind::PlainText);
        let bold = b.seq(&[bold_open, bold_body, bold_open]);
        b.name(bold, Kind::Bold);
        let end = b.pattern("END");
        let root = b.scan(&[bold], end, Some(rename_skipped));
        let g = b.finish();

        // Stops before the end marker without consuming it.
        let nodes = parse_ok(&g, root, "xyENDz");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), Some(Kind::PlainText));
        assert_eq!(nodes[0].text(), "xy");
        assert_eq!(nodes[0].span(), Span::new(0, 2));

        // Skipped text precedes the matched construct.
        let nodes = parse_ok(&g, root, "ab'''cd'''");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text(), "ab");
        assert_eq!(nodes[1].kind(), Some(Kind::Bold));

        // No skipped text, no extra node.
        let nodes = parse_ok(&g, root, "'''cd'''");
        assert_eq!(nodes.len(), 1);

        // Neither end nor alternative anywhere.
        assert!(parse(&g, root, "plain", &FormatDetails::default()).is_err());
    }

    #[test]
    fn test_terminator_follows_innermost_open_construct() {
        let mut b = Builder::new();
        let bold_end = b.pattern("'''");
        let italics_end = b.pattern("''");
        let input_end = b.pattern(r"(?!.)");
        let terminator = b.terminator(
            &[(Kind::Bold, bold_end), (Kind::Italics, italics_end)],
            input_end,
        );
        let g = b.finish();

        let format = FormatDetails::default();
        let cancel = CancelHandle::new();
        let mut parser = Parser::new(&g, "''x", &format, &cancel);

        // No relevant construct open: only end of input matches.
        assert!(parser.eval(terminator, 0, true).is_err());

        parser.env.push_frame(Some(Kind::Bold));
        parser.env.push_frame(Some(Kind::Italics));
        let (end, _) = parser.eval(terminator, 0, true).unwrap();
        assert_eq!(end, 2);

        // The innermost name wins even when an outer one also has an
        // end pattern.
        let mut parser = Parser::new(&g, "'''x", &format, &cancel);
        parser.env.push_frame(Some(Kind::Italics));
        parser.env.push_frame(Some(Kind::Bold));
        let (end, _) = parser.eval(terminator, 0, true).unwrap();
        assert_eq!(end, 3);
    }

    fn reject_always(_: &mut Parser<'_, '_>, pos: usize, _: &mut NonTerminal) -> Result<Emit, Reject> {
        Err(Reject::Local(pos))
    }

    #[test]
    fn test_hook_rejection_falls_through_to_next_alternative() {
        let mut b = Builder::new();
        let poisoned = b.capture("a", Kind::Code);
        b.on_match(poisoned, reject_always);
        let fallback = b.capture("a", Kind::PlainText);
        let root = b.first(&[poisoned, fallback]);
        let g = b.finish();
        let nodes = parse_ok(&g, root, "a");
        assert_eq!(nodes[0].kind(), Some(Kind::PlainText));
    }

    fn replace_with_heading_level(
        _: &mut Parser<'_, '_>,
        pos: usize,
        tokens: &mut NonTerminal,
    ) -> Result<Emit, Reject> {
        let mut node = NonTerminal::new(Vec::new(), pos, Some(Kind::Heading));
        node.data = Some(NodeData::Heading {
            level: tokens.children.len() as u8,
        });
        Ok(Emit::Replace(vec![node.into()]))
    }

    #[test]
    fn test_hook_replacement_splices_into_parent() {
        let mut b = Builder::new();
        let eq = b.pattern("=");
        let run = b.plus(eq);
        b.on_match(run, replace_with_heading_level);
        let rest = b.capture("x", Kind::PlainText);
        let root = b.seq(&[run, rest]);
        b.name(root, Kind::Document);
        let g = b.finish();
        let nodes = parse_ok(&g, root, "==x");
        let document = &nodes[0];
        assert_eq!(document.children().len(), 2);
        assert_eq!(document.children()[0].kind(), Some(Kind::Heading));
        assert_eq!(
            document.children()[0].data(),
            Some(&NodeData::Heading { level: 2 })
        );
    }

    fn require_content(pos: usize, tokens: &NonTerminal) -> Result<(), Reject> {
        if tokens.children.is_empty() {
            return Err(Reject::Local(pos));
        }
        Ok(())
    }

    #[test]
    fn test_validation_applies_even_inside_probes() {
        let mut b = Builder::new();
        let item = b.capture("a", Kind::PlainText);
        let body = b.star(item);
        b.on_validate(body, require_content);
        let peek = b.ahead(body);
        let g = b.finish();
        assert!(parse(&g, peek, "aa", &FormatDetails::default()).is_ok());
        assert!(parse(&g, peek, "b", &FormatDetails::default()).is_err());
    }

    #[test]
    fn test_completion_hooks_do_not_run_inside_probes() {
        let mut b = Builder::new();
        let item = b.capture("a", Kind::Code);
        b.on_match(item, reject_always);
        let peek = b.ahead(item);
        let g = b.finish();
        // The probe sees a match because completion hooks are skipped
        // there, while a real evaluation runs the hook and rejects.
        assert!(parse(&g, peek, "a", &FormatDetails::default()).is_ok());
        assert!(parse(&g, item, "a", &FormatDetails::default()).is_err());
    }

    #[test]
    fn test_empty_named_alias_yields_nothing() {
        let mut b = Builder::new();
        let content = b.forward();
        b.name(content, Kind::HeadingContent);
        let item = b.capture("x", Kind::PlainText);
        let body = b.star(item);
        b.define(content, body);
        let tail = b.pattern("!");
        let root = b.seq(&[content, tail]);
        b.name(root, Kind::Document);
        let g = b.finish();

        let nodes = parse_ok(&g, root, "xx!");
        let document = &nodes[0];
        assert_eq!(document.children().len(), 2);
        let packed = &document.children()[0];
        assert_eq!(packed.kind(), Some(Kind::HeadingContent));
        assert_eq!(packed.children().len(), 2);

        let nodes = parse_ok(&g, root, "!");
        let document = &nodes[0];
        assert_eq!(document.children().len(), 1);
        assert_eq!(document.children()[0].kind(), None);
    }

    #[test]
    fn test_cancellation_is_not_recovered_by_choice() {
        let mut b = Builder::new();
        let a = b.capture("a", Kind::PlainText);
        let other = b.capture(".", Kind::Code);
        let root = b.first(&[a, other]);
        let g = b.finish();

        let format = FormatDetails::default();
        let cancel = CancelHandle::new();
        cancel.cancel();
        let mut parser = Parser::new(&g, "a", &format, &cancel);
        assert_eq!(parser.run(root), Err(Reject::Cancelled));
    }

    #[test]
    fn test_failure_reports_furthest_offset() {
        let mut b = Builder::new();
        let head = b.pattern("ab");
        let tail = b.pattern("cd");
        let root = b.seq(&[head, tail]);
        let g = b.finish();
        assert_eq!(
            parse(&g, root, "abXX", &FormatDetails::default()),
            Err(Reject::Local(2))
        );
    }
}

//! Live query session: debounced evaluation of user-typed locators and the
//! highlight/scroll side effects of each result.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::app::debounce::Debouncer;
use crate::app::decorations::{DecorationSet, FlashTimers};
use crate::app::evaluator;
use crate::domain::document::HostDocument;
use crate::domain::model::{Decoration, MatchSnapshot, MatchedNode, NodeKind};
use crate::infra::config::Config;

/// Visible state of the results region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    /// No query text.
    Empty,
    /// An evaluation is scheduled and waiting for input to pause.
    Evaluating,
    /// The host rejected the expression.
    Error(String),
    ZeroResults,
    /// Total number of matches, which may exceed what is displayed.
    Results(usize),
}

/// Tunables for a [`QuerySession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub debounce: Duration,
    pub flash: Duration,
    pub max_results: usize,
    pub text_preview_chars: usize,
    pub class_preview_chars: usize,
    pub panel_id: String,
}

impl QuerySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.query.debounce(),
            flash: config.query.flash(),
            max_results: config.query.max_results,
            text_preview_chars: config.query.text_preview_chars,
            class_preview_chars: config.query.class_preview_chars,
            panel_id: config.locator.panel_id.clone(),
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Owns the query text, its debounce timer, the current snapshot, and every
/// decoration derived from that snapshot.
///
/// Time never advances on its own: callers pass the current instant to each
/// handler and call [`QuerySession::tick`] from their event loop.
#[derive(Debug, Clone)]
pub struct QuerySession<N> {
    settings: QuerySettings,
    input: String,
    debounce: Debouncer,
    state: QueryState,
    snapshot: Option<MatchSnapshot<N>>,
    highlights: DecorationSet<N>,
    flashes: FlashTimers<N>,
    evaluations: usize,
}

impl<N: Copy + Eq> QuerySession<N> {
    pub fn new(settings: QuerySettings) -> Self {
        Self {
            debounce: Debouncer::new(settings.debounce),
            flashes: FlashTimers::new(settings.flash),
            settings,
            input: String::new(),
            state: QueryState::Empty,
            snapshot: None,
            highlights: DecorationSet::new(),
            evaluations: 0,
        }
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&MatchSnapshot<N>> {
        self.snapshot.as_ref()
    }

    /// Matches shown to the user, capped at `max_results`.
    pub fn displayed(&self) -> &[MatchedNode<N>] {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.displayed(self.settings.max_results))
            .unwrap_or(&[])
    }

    pub fn highlights(&self) -> &DecorationSet<N> {
        &self.highlights
    }

    pub fn pending_flashes(&self) -> usize {
        self.flashes.len()
    }

    /// Number of evaluations run so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Earliest instant at which [`QuerySession::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.flashes.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Handle a change of the query text.
    pub fn on_input<D>(&mut self, doc: &mut D, text: &str, now: Instant)
    where
        D: HostDocument<Node = N>,
    {
        self.debounce.cancel();
        self.input = text.to_owned();

        if text.trim().is_empty() {
            self.clear(doc);
            return;
        }

        self.debounce.schedule(now);
        self.state = QueryState::Evaluating;
    }

    /// Replace the query text and evaluate it without waiting for the debounce.
    pub fn set_input_and_evaluate<D>(&mut self, doc: &mut D, text: &str, now: Instant)
    where
        D: HostDocument<Node = N>,
    {
        self.input = text.to_owned();
        self.evaluate_now(doc, now);
    }

    /// Fire due continuations. Returns `true` when an evaluation ran.
    pub fn tick<D>(&mut self, doc: &mut D, now: Instant) -> bool
    where
        D: HostDocument<Node = N>,
    {
        self.flashes.fire_due(doc, now);
        if self.debounce.fire(now) {
            self.evaluate_now(doc, now);
            return true;
        }
        false
    }

    /// Evaluate the current text immediately.
    ///
    /// All decorations from the previous result are reverted before any new one
    /// is applied.
    pub fn evaluate_now<D>(&mut self, doc: &mut D, now: Instant)
    where
        D: HostDocument<Node = N>,
    {
        self.debounce.cancel();
        self.flashes.cancel_all(doc);
        self.highlights.revert_all(doc);

        let expression = self.input.trim().to_owned();
        if expression.is_empty() {
            self.snapshot = None;
            self.state = QueryState::Empty;
            return;
        }

        self.evaluations += 1;
        match evaluator::evaluate(&*doc, &expression) {
            Ok(snapshot) if snapshot.is_empty() => {
                self.state = QueryState::ZeroResults;
                self.snapshot = Some(snapshot);
            }
            Ok(snapshot) => {
                for item in snapshot.displayed(self.settings.max_results) {
                    if self.is_decoratable(&*doc, *item) {
                        self.highlights.apply(doc, item.node, Decoration::Matched);
                    }
                }
                let first = snapshot.displayed(self.settings.max_results).first().copied();
                if let Some(first) = first {
                    self.reveal(doc, first, now);
                }
                self.state = QueryState::Results(snapshot.count());
                self.snapshot = Some(snapshot);
            }
            Err(err) => {
                debug!(%expression, error = %err, "evaluation failed");
                self.state = QueryState::Error(err.message);
                self.snapshot = None;
            }
        }
    }

    /// Scroll to and flash the displayed match at `index`. Returns `false` when
    /// the index is out of range or the match cannot be decorated.
    pub fn select<D>(&mut self, doc: &mut D, index: usize, now: Instant) -> bool
    where
        D: HostDocument<Node = N>,
    {
        match self.displayed().get(index).copied() {
            Some(item) => self.reveal(doc, item, now),
            None => false,
        }
    }

    /// Drop the result and every decoration synchronously.
    pub fn clear<D>(&mut self, doc: &mut D)
    where
        D: HostDocument<Node = N>,
    {
        self.debounce.cancel();
        self.flashes.cancel_all(doc);
        self.highlights.revert_all(doc);
        self.snapshot = None;
        self.state = QueryState::Empty;
    }

    /// Stop all pending work and revert all decorations, keeping the input text.
    pub fn teardown<D>(&mut self, doc: &mut D)
    where
        D: HostDocument<Node = N>,
    {
        self.clear(doc);
        if !self.input.trim().is_empty() {
            debug!(input = %self.input, "query session torn down with text retained");
        }
    }

    fn reveal<D>(&mut self, doc: &mut D, item: MatchedNode<N>, now: Instant) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if !self.is_decoratable(&*doc, item) {
            return false;
        }
        doc.scroll_into_view(item.node);
        self.flashes.start(doc, item.node, now);
        true
    }

    fn is_decoratable<D>(&self, doc: &D, item: MatchedNode<N>) -> bool
    where
        D: HostDocument<Node = N>,
    {
        item.kind == NodeKind::Element && !doc.is_within_id(item.node, &self.settings.panel_id)
    }
}

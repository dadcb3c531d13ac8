//! Per-panel orchestration of the picker, the generator, and the query session.
//!
//! The panel shell forwards raw events here; the inspector decides which
//! component handles them and reports back whether a pointer event must be
//! stopped.

use std::time::Instant;

use tracing::{debug, error};

use crate::app::generator::LocatorGenerator;
use crate::app::picker::{PickOutcome, PickerController};
use crate::app::query::{QuerySession, QuerySettings};
use crate::domain::document::HostDocument;
use crate::domain::errors::LocatorError;
use crate::infra::config::Config;

/// Whether the host should stop a pointer event from reaching the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Prevent the default action and stop propagation.
    Suppress,
    PassThrough,
}

/// State for one panel lifetime.
#[derive(Debug, Clone)]
pub struct Inspector<N> {
    visible: bool,
    picker: PickerController<N>,
    query: QuerySession<N>,
    generator: LocatorGenerator,
}

impl<N: Copy + Eq + std::fmt::Debug> Inspector<N> {
    pub fn new(config: &Config) -> Self {
        Self {
            visible: false,
            picker: PickerController::new(config.locator.panel_id.clone()),
            query: QuerySession::new(QuerySettings::from_config(config)),
            generator: LocatorGenerator::from_config(config),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn picker(&self) -> &PickerController<N> {
        &self.picker
    }

    pub fn query(&self) -> &QuerySession<N> {
        &self.query
    }

    pub fn generator(&self) -> &LocatorGenerator {
        &self.generator
    }

    /// Open the panel. Retained query text is re-evaluated so its highlights return.
    pub fn show<D>(&mut self, doc: &mut D, now: Instant)
    where
        D: HostDocument<Node = N>,
    {
        if self.visible {
            return;
        }
        self.visible = true;
        if !self.query.input().trim().is_empty() {
            self.query.evaluate_now(doc, now);
        }
    }

    /// Close the panel, tearing down the picker and every pending continuation.
    pub fn hide<D>(&mut self, doc: &mut D)
    where
        D: HostDocument<Node = N>,
    {
        if !self.visible {
            return;
        }
        self.visible = false;
        self.picker.cancel(doc);
        self.query.teardown(doc);
    }

    /// Returns the new visibility.
    pub fn toggle<D>(&mut self, doc: &mut D, now: Instant) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if self.visible {
            self.hide(doc);
        } else {
            self.show(doc, now);
        }
        self.visible
    }

    /// Returns whether the picker is armed afterwards.
    pub fn toggle_picker<D>(&mut self, doc: &mut D) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if !self.visible {
            return false;
        }
        self.picker.toggle(doc)
    }

    /// Escape cancels an armed picker first and closes the panel otherwise.
    pub fn on_escape<D>(&mut self, doc: &mut D)
    where
        D: HostDocument<Node = N>,
    {
        if self.picker.is_active() {
            self.picker.cancel(doc);
        } else {
            self.hide(doc);
        }
    }

    pub fn on_pointer_enter<D>(&mut self, doc: &mut D, node: N)
    where
        D: HostDocument<Node = N>,
    {
        self.picker.on_pointer_enter(doc, node);
    }

    pub fn on_pointer_leave<D>(&mut self, doc: &mut D, node: N)
    where
        D: HostDocument<Node = N>,
    {
        self.picker.on_pointer_leave(doc, node);
    }

    /// Route a click through the picker. A picked locator replaces the query
    /// text and is evaluated at once; failures leave the query untouched.
    pub fn on_click<D>(&mut self, doc: &mut D, node: N, now: Instant) -> EventDisposition
    where
        D: HostDocument<Node = N>,
    {
        match self.picker.on_click(doc, node, &self.generator) {
            PickOutcome::PassThrough => EventDisposition::PassThrough,
            PickOutcome::Picked(Ok(locator)) => {
                self.query.set_input_and_evaluate(doc, locator.as_str(), now);
                EventDisposition::Suppress
            }
            PickOutcome::Picked(Err(LocatorError::NotSelectable)) => {
                debug!(?node, "clicked node is not selectable");
                EventDisposition::Suppress
            }
            PickOutcome::Picked(Err(err @ LocatorError::NoLocatorPossible)) => {
                error!(?node, error = %err, "locator generation exhausted every strategy");
                EventDisposition::Suppress
            }
        }
    }

    pub fn on_input<D>(&mut self, doc: &mut D, text: &str, now: Instant)
    where
        D: HostDocument<Node = N>,
    {
        if !self.visible {
            debug!("ignoring input while the panel is hidden");
            return;
        }
        self.query.on_input(doc, text, now);
    }

    /// Scroll to and flash a displayed result row.
    pub fn select_result<D>(&mut self, doc: &mut D, index: usize, now: Instant) -> bool
    where
        D: HostDocument<Node = N>,
    {
        self.query.select(doc, index, now)
    }

    /// Drive pending continuations. Returns `true` when an evaluation ran.
    pub fn tick<D>(&mut self, doc: &mut D, now: Instant) -> bool
    where
        D: HostDocument<Node = N>,
    {
        self.query.tick(doc, now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.query.next_deadline()
    }
}

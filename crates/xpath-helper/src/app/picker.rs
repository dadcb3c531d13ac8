//! Element picker: hover tracking and click interception while armed.

use tracing::debug;

use crate::app::generator::LocatorGenerator;
use crate::domain::document::HostDocument;
use crate::domain::errors::LocatorError;
use crate::domain::model::{Decoration, Locator};

/// What happened to a click delivered to the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The picker did not claim the click; the page should handle it normally.
    PassThrough,
    /// The click was consumed. Carries the generator's answer for the clicked node.
    Picked(Result<Locator, LocatorError>),
}

/// `Idle <-> Armed` state machine. While armed it tracks a single hovered node.
#[derive(Debug, Clone)]
pub struct PickerController<N> {
    active: bool,
    hovered: Option<N>,
    panel_id: String,
}

impl<N: Copy + Eq> PickerController<N> {
    pub fn new(panel_id: impl Into<String>) -> Self {
        Self {
            active: false,
            hovered: None,
            panel_id: panel_id.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Node under the pointer while armed. The tooltip is shown exactly when this is set.
    pub fn hovered(&self) -> Option<N> {
        self.hovered
    }

    /// Enter picking mode. Returns `false` if already armed.
    pub fn arm<D>(&mut self, doc: &mut D) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if self.active {
            return false;
        }
        self.active = true;
        doc.set_picking_mode(true);
        debug!("picker armed");
        true
    }

    /// Leave picking mode without picking. Returns `false` if already idle.
    pub fn cancel<D>(&mut self, doc: &mut D) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if !self.active {
            return false;
        }
        self.teardown(doc);
        debug!("picker cancelled");
        true
    }

    /// Arm when idle, cancel when armed. Returns the new armed state.
    pub fn toggle<D>(&mut self, doc: &mut D) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if self.active {
            self.cancel(doc);
        } else {
            self.arm(doc);
        }
        self.active
    }

    pub fn on_pointer_enter<D>(&mut self, doc: &mut D, node: N)
    where
        D: HostDocument<Node = N>,
    {
        if !self.active || doc.is_within_id(node, &self.panel_id) {
            return;
        }
        if self.hovered == Some(node) {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            doc.revert_decoration(previous, Decoration::Hover);
        }
        doc.apply_decoration(node, Decoration::Hover);
        self.hovered = Some(node);
    }

    pub fn on_pointer_leave<D>(&mut self, doc: &mut D, node: N)
    where
        D: HostDocument<Node = N>,
    {
        if !self.active || self.hovered != Some(node) {
            return;
        }
        doc.revert_decoration(node, Decoration::Hover);
        self.hovered = None;
    }

    /// Handle a click. While armed and outside the tool's own UI the click is
    /// consumed: the picker returns to idle first, then the generator runs on
    /// the clicked node.
    pub fn on_click<D>(
        &mut self,
        doc: &mut D,
        node: N,
        generator: &LocatorGenerator,
    ) -> PickOutcome
    where
        D: HostDocument<Node = N>,
    {
        if !self.active || doc.is_within_id(node, &self.panel_id) {
            return PickOutcome::PassThrough;
        }
        self.teardown(doc);
        let result = generator.generate(&*doc, node);
        debug!(?result, "picked node");
        PickOutcome::Picked(result)
    }

    fn teardown<D>(&mut self, doc: &mut D)
    where
        D: HostDocument<Node = N>,
    {
        if let Some(previous) = self.hovered.take() {
            doc.revert_decoration(previous, Decoration::Hover);
        }
        self.active = false;
        doc.set_picking_mode(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::dom::{XmlDocument, parse_html};

    const PAGE: &str = r#"<body><ul><li>a</li><li id="x">b</li></ul><div id="xpath-helper-panel"><button>pick</button></div></body>"#;

    #[test]
    fn hover_moves_between_nodes() {
        let package = parse_html(PAGE);
        let document = package.as_document();
        let mut doc = XmlDocument::new(&document);
        let items = doc.elements_by_tag("li");
        let mut picker = PickerController::new("xpath-helper-panel");

        picker.on_pointer_enter(&mut doc, items[0]);
        assert!(picker.hovered().is_none());

        assert!(picker.arm(&mut doc));
        assert!(!picker.arm(&mut doc));
        picker.on_pointer_enter(&mut doc, items[0]);
        picker.on_pointer_enter(&mut doc, items[1]);
        assert_eq!(picker.hovered(), Some(items[1]));
        assert_eq!(doc.decorated(Decoration::Hover), vec![items[1]]);

        picker.on_pointer_leave(&mut doc, items[0]);
        assert_eq!(picker.hovered(), Some(items[1]));
        picker.on_pointer_leave(&mut doc, items[1]);
        assert!(picker.hovered().is_none());
        assert!(doc.decorated(Decoration::Hover).is_empty());
    }

    #[test]
    fn panel_nodes_are_ignored() {
        let package = parse_html(PAGE);
        let document = package.as_document();
        let mut doc = XmlDocument::new(&document);
        let button = doc.elements_by_tag("button")[0];
        let mut picker = PickerController::new("xpath-helper-panel");
        let generator = LocatorGenerator::default();

        picker.arm(&mut doc);
        picker.on_pointer_enter(&mut doc, button);
        assert!(picker.hovered().is_none());
        assert_eq!(
            picker.on_click(&mut doc, button, &generator),
            PickOutcome::PassThrough
        );
        assert!(picker.is_active());
    }

    #[test]
    fn click_tears_down_then_generates() {
        let package = parse_html(PAGE);
        let document = package.as_document();
        let mut doc = XmlDocument::new(&document);
        let items = doc.elements_by_tag("li");
        let mut picker = PickerController::new("xpath-helper-panel");
        let generator = LocatorGenerator::default();

        picker.arm(&mut doc);
        assert!(doc.is_picking());
        picker.on_pointer_enter(&mut doc, items[1]);

        let outcome = picker.on_click(&mut doc, items[1], &generator);
        assert_eq!(
            outcome,
            PickOutcome::Picked(Ok(Locator::new(r#"//*[@id="x"]"#)))
        );
        assert!(!picker.is_active());
        assert!(!doc.is_picking());
        assert!(doc.decorated(Decoration::Hover).is_empty());

        assert_eq!(
            picker.on_click(&mut doc, items[0], &generator),
            PickOutcome::PassThrough
        );
    }

    #[test]
    fn cancel_reverts_hover() {
        let package = parse_html(PAGE);
        let document = package.as_document();
        let mut doc = XmlDocument::new(&document);
        let items = doc.elements_by_tag("li");
        let mut picker = PickerController::new("xpath-helper-panel");

        assert!(picker.toggle(&mut doc));
        picker.on_pointer_enter(&mut doc, items[0]);
        assert!(!picker.toggle(&mut doc));
        assert!(picker.hovered().is_none());
        assert!(doc.decorated(Decoration::Hover).is_empty());
        assert!(!picker.cancel(&mut doc));
    }
}

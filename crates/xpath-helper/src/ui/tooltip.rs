//! Label shown above the hovered node while the picker is armed.

use serde::Serialize;

use crate::app::generator::ReservedClasses;
use crate::app::picker::PickerController;
use crate::domain::document::HostDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Above,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipView {
    /// `tag#id.firstclass`, omitting the parts the node lacks.
    pub label: String,
    pub placement: Placement,
}

impl TooltipView {
    /// Tooltip for the picker's hovered node; `None` whenever nothing is hovered.
    pub fn for_picker<D>(
        doc: &D,
        picker: &PickerController<D::Node>,
        reserved: &ReservedClasses,
    ) -> Option<Self>
    where
        D: HostDocument,
    {
        let node = picker.hovered()?;
        Some(Self {
            label: label(doc, node, reserved),
            placement: Placement::Above,
        })
    }
}

fn label<D: HostDocument>(doc: &D, node: D::Node, reserved: &ReservedClasses) -> String {
    let mut label = doc.tag_name(node).unwrap_or_default().to_lowercase();
    if let Some(id) = doc.element_id(node) {
        label.push('#');
        label.push_str(&id);
    }
    if let Some(class) = reserved.filter(doc.class_tokens(node)).into_iter().next() {
        label.push('.');
        label.push_str(&class);
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::dom::{XmlDocument, parse_html};

    #[test]
    fn follows_hovered_node() {
        let package = parse_html(
            r#"<body><a id="home" class="xpath-helper-hover nav link">x</a><p>y</p></body>"#,
        );
        let document = package.as_document();
        let mut doc = XmlDocument::new(&document);
        let reserved = ReservedClasses::default();
        let mut picker = PickerController::new("xpath-helper-panel");
        let link = doc.elements_by_tag("a")[0];
        let paragraph = doc.elements_by_tag("p")[0];

        assert!(TooltipView::for_picker(&doc, &picker, &reserved).is_none());

        picker.arm(&mut doc);
        picker.on_pointer_enter(&mut doc, link);
        let tooltip = TooltipView::for_picker(&doc, &picker, &reserved).unwrap();
        assert_eq!(tooltip.label, "a#home.nav");
        assert_eq!(tooltip.placement, Placement::Above);

        picker.on_pointer_enter(&mut doc, paragraph);
        assert_eq!(
            TooltipView::for_picker(&doc, &picker, &reserved).unwrap().label,
            "p"
        );

        picker.on_pointer_leave(&mut doc, paragraph);
        assert!(TooltipView::for_picker(&doc, &picker, &reserved).is_none());
    }
}

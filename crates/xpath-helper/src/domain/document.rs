//! The seam between the locator engine and the live document it inspects.

use std::fmt::Debug;

use crate::domain::errors::EvaluationError;
use crate::domain::model::{Decoration, NodeKind};

/// A live, mutable document tree together with its native path-expression engine.
///
/// Node handles are weak, copyable references into the tree. The engine never
/// owns nodes; it only reads their data and toggles decorations on them.
pub trait HostDocument {
    type Node: Copy + Eq + Debug;

    /// Evaluate `expression` with the host's native engine, returning matches in
    /// document order.
    fn evaluate(&self, expression: &str) -> Result<Vec<Self::Node>, EvaluationError>;

    fn kind(&self, node: Self::Node) -> NodeKind;

    /// Local tag name; `None` for non-elements.
    fn tag_name(&self, node: Self::Node) -> Option<String>;

    /// Node test that selects this element by name in the native evaluator.
    ///
    /// Defaults to the bare tag name. Hosts with namespaced elements must return
    /// a test that still matches, such as `*[local-name()="li"]`.
    fn name_test(&self, node: Self::Node) -> Option<String> {
        self.tag_name(node)
    }

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Nearest element ancestor. Text nodes report their containing element.
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element children in document order.
    fn element_children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Whether the node is still attached to the document root.
    fn is_connected(&self, node: Self::Node) -> bool;

    /// The body element, if the document has one.
    fn body(&self) -> Option<Self::Node>;

    /// Concatenated descendant text.
    fn text_content(&self, node: Self::Node) -> String;

    /// Apply `decoration`. Applying a decoration twice is harmless.
    fn apply_decoration(&mut self, node: Self::Node, decoration: Decoration);

    /// Remove `decoration`. Must never fail; missing nodes or state are a no-op.
    fn revert_decoration(&mut self, node: Self::Node, decoration: Decoration);

    fn has_decoration(&self, node: Self::Node, decoration: Decoration) -> bool;

    /// Bring the node to the center of the viewport.
    fn scroll_into_view(&mut self, node: Self::Node);

    /// Install or remove capture-phase pointer interception and the picking cursor.
    fn set_picking_mode(&mut self, enabled: bool);

    /// Non-empty `id` attribute.
    fn element_id(&self, node: Self::Node) -> Option<String> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    /// Whitespace separated tokens of the `class` attribute.
    fn class_tokens(&self, node: Self::Node) -> Vec<String> {
        self.attribute(node, "class")
            .map(|class| class.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Whether `node` is, or sits inside, the element carrying `id`.
    fn is_within_id(&self, node: Self::Node, id: &str) -> bool {
        let mut current = match self.kind(node) {
            NodeKind::Element => Some(node),
            _ => self.parent_element(node),
        };
        while let Some(element) = current {
            if self.attribute(element, "id").as_deref() == Some(id) {
                return true;
            }
            current = self.parent_element(element);
        }
        false
    }
}

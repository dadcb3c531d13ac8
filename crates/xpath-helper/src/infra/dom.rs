//! Headless host document backed by `sxd-document`, evaluated with `sxd-xpath`.
//!
//! HTML input goes through `scraper`, which is lenient and always yields an
//! `html/head/body` skeleton, and is then copied into an sxd tree so the native
//! XPath 1.0 engine can run over it. Decorations are recorded as tokens in a
//! dedicated attribute so they never leak into `class` based locators.

use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html};
use sxd_document::Package;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element, ParentOfChild};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Value, evaluate_xpath};

use crate::domain::document::HostDocument;
use crate::domain::errors::EvaluationError;
use crate::domain::model::{Decoration, NodeKind};

/// Attribute holding the space separated decoration tokens of an element.
pub const DECORATION_ATTRIBUTE: &str = "data-xpath-helper";
/// Attribute set on body while the picker intercepts pointer events.
pub const PICKING_ATTRIBUTE: &str = "data-xpath-helper-picking";

/// Parse an HTML document into an sxd package.
pub fn parse_html(source: &str) -> Package {
    let html = Html::parse_document(source);
    let package = Package::new();
    {
        let document = package.as_document();
        let root = copy_element(&document, html.root_element());
        document.root().append_child(root);
    }
    package
}

/// Parse a well-formed XML (or XHTML) document.
pub fn parse_xml(source: &str) -> Result<Package> {
    sxd_document::parser::parse(source)
        .map_err(|err| anyhow!("failed to parse XML document: {err:?}"))
}

fn copy_element<'d>(document: &Document<'d>, source: ElementRef<'_>) -> Element<'d> {
    let value = source.value();
    let element = document.create_element(value.name());
    for (name, attr_value) in value.attrs() {
        element.set_attribute_value(name, attr_value);
    }

    for child in source.children() {
        match child.value() {
            scraper::Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    element.append_child(copy_element(document, child_ref));
                }
            }
            scraper::Node::Text(text) => {
                element.append_child(document.create_text(&**text));
            }
            _ => {}
        }
    }
    element
}

/// A live view over an sxd document.
///
/// Scrolling has no visual effect headlessly; requests are recorded instead so
/// callers can observe them.
pub struct XmlDocument<'d> {
    document: &'d Document<'d>,
    scrolled: Vec<Node<'d>>,
    picking: bool,
}

impl<'d> XmlDocument<'d> {
    pub fn new(document: &'d Document<'d>) -> Self {
        Self {
            document,
            scrolled: Vec::new(),
            picking: false,
        }
    }

    /// The document element (`html` for parsed HTML).
    pub fn document_element(&self) -> Option<Node<'d>> {
        self.document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(Node::Element(element)),
                _ => None,
            })
    }

    /// Every element of the document in document order.
    pub fn descendant_elements(&self) -> Vec<Node<'d>> {
        let mut out = Vec::new();
        let mut stack: Vec<Node<'d>> = self.document_element().into_iter().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children = self.element_children(node);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Elements whose tag name equals `tag`, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<Node<'d>> {
        self.descendant_elements()
            .into_iter()
            .filter(|node| self.tag_name(*node).as_deref() == Some(tag))
            .collect()
    }

    /// Create an element that is not attached to the tree.
    pub fn create_detached(&self, tag: &str) -> Node<'d> {
        Node::Element(self.document.create_element(tag))
    }

    /// Detach `node` from its parent, if it has one.
    pub fn detach(&self, node: Node<'d>) {
        if let Node::Element(element) = node {
            element.remove_from_parent();
        }
    }

    pub fn last_scrolled(&self) -> Option<Node<'d>> {
        self.scrolled.last().copied()
    }

    pub fn scroll_history(&self) -> &[Node<'d>] {
        &self.scrolled
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    /// Elements currently carrying `decoration`.
    pub fn decorated(&self, decoration: Decoration) -> Vec<Node<'d>> {
        self.descendant_elements()
            .into_iter()
            .filter(|node| self.has_decoration(*node, decoration))
            .collect()
    }

    fn decoration_tokens(element: Element<'d>) -> Vec<String> {
        element
            .attribute_value(DECORATION_ATTRIBUTE)
            .map(|value| value.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    fn write_decoration_tokens(element: Element<'d>, tokens: &[String]) {
        if tokens.is_empty() {
            element.remove_attribute(DECORATION_ATTRIBUTE);
        } else {
            element.set_attribute_value(DECORATION_ATTRIBUTE, &tokens.join(" "));
        }
    }
}

fn describe_value(value: &Value<'_>) -> &'static str {
    match value {
        Value::Boolean(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Nodeset(_) => "a node set",
    }
}

impl<'d> HostDocument for XmlDocument<'d> {
    type Node = Node<'d>;

    fn evaluate(&self, expression: &str) -> Result<Vec<Node<'d>>, EvaluationError> {
        match evaluate_xpath(self.document, expression) {
            Ok(Value::Nodeset(nodes)) => Ok(nodes.document_order()),
            Ok(other) => Err(EvaluationError::new(format!(
                "expression evaluates to {} instead of a node set",
                describe_value(&other)
            ))),
            Err(err) => Err(EvaluationError::new(err.to_string())),
        }
    }

    fn kind(&self, node: Node<'d>) -> NodeKind {
        match node {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: Node<'d>) -> Option<String> {
        match node {
            Node::Element(element) => Some(element.name().local_part().to_owned()),
            _ => None,
        }
    }

    /// XPath 1.0 name tests never match a namespaced element by its bare name.
    fn name_test(&self, node: Node<'d>) -> Option<String> {
        let Node::Element(element) = node else {
            return None;
        };
        let name = element.name();
        Some(match name.namespace_uri() {
            Some(_) => format!("*[local-name()=\"{}\"]", name.local_part()),
            None => name.local_part().to_owned(),
        })
    }

    fn attribute(&self, node: Node<'d>, name: &str) -> Option<String> {
        match node {
            Node::Element(element) => element.attribute_value(name).map(str::to_owned),
            _ => None,
        }
    }

    fn parent_element(&self, node: Node<'d>) -> Option<Node<'d>> {
        match node {
            Node::Element(element) => match element.parent() {
                Some(ParentOfChild::Element(parent)) => Some(Node::Element(parent)),
                _ => None,
            },
            Node::Text(text) => text.parent().map(Node::Element),
            Node::Attribute(attribute) => attribute.parent().map(Node::Element),
            _ => None,
        }
    }

    fn element_children(&self, node: Node<'d>) -> Vec<Node<'d>> {
        match node {
            Node::Element(element) => element
                .children()
                .into_iter()
                .filter_map(|child| match child {
                    ChildOfElement::Element(child) => Some(Node::Element(child)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn is_connected(&self, node: Node<'d>) -> bool {
        let mut current = match node {
            Node::Root(_) => return true,
            Node::Element(element) => element,
            other => match self.parent_element(other) {
                Some(Node::Element(element)) => element,
                _ => return false,
            },
        };
        loop {
            match current.parent() {
                Some(ParentOfChild::Root(_)) => return true,
                Some(ParentOfChild::Element(parent)) => current = parent,
                None => return false,
            }
        }
    }

    fn body(&self) -> Option<Node<'d>> {
        self.descendant_elements()
            .into_iter()
            .find(|node| self.tag_name(*node).as_deref() == Some("body"))
    }

    fn text_content(&self, node: Node<'d>) -> String {
        fn collect(element: Element<'_>, out: &mut String) {
            for child in element.children() {
                match child {
                    ChildOfElement::Element(child) => collect(child, out),
                    ChildOfElement::Text(text) => out.push_str(text.text()),
                    _ => {}
                }
            }
        }

        match node {
            Node::Element(element) => {
                let mut out = String::new();
                collect(element, &mut out);
                out
            }
            Node::Text(text) => text.text().to_owned(),
            Node::Attribute(attribute) => attribute.value().to_owned(),
            _ => String::new(),
        }
    }

    fn apply_decoration(&mut self, node: Node<'d>, decoration: Decoration) {
        let Node::Element(element) = node else {
            return;
        };
        let mut tokens = Self::decoration_tokens(element);
        if !tokens.iter().any(|token| token == decoration.token()) {
            tokens.push(decoration.token().to_owned());
            Self::write_decoration_tokens(element, &tokens);
        }
    }

    fn revert_decoration(&mut self, node: Node<'d>, decoration: Decoration) {
        let Node::Element(element) = node else {
            return;
        };
        let mut tokens = Self::decoration_tokens(element);
        let before = tokens.len();
        tokens.retain(|token| token != decoration.token());
        if tokens.len() != before {
            Self::write_decoration_tokens(element, &tokens);
        }
    }

    fn has_decoration(&self, node: Node<'d>, decoration: Decoration) -> bool {
        match node {
            Node::Element(element) => Self::decoration_tokens(element)
                .iter()
                .any(|token| token == decoration.token()),
            _ => false,
        }
    }

    fn scroll_into_view(&mut self, node: Node<'d>) {
        self.scrolled.push(node);
    }

    fn set_picking_mode(&mut self, enabled: bool) {
        self.picking = enabled;
        if let Some(Node::Element(body)) = self.body() {
            if enabled {
                body.set_attribute_value(PICKING_ATTRIBUTE, "crosshair");
            } else {
                body.remove_attribute(PICKING_ATTRIBUTE);
            }
        }
    }
}

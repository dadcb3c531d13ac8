//! Locator inference: turning a node into a verified, minimal path expression.
//!
//! Strategies run in a fixed order and the first verified candidate wins:
//!
//! 1. identity (`//*[@id="..."]`), accepted without verification
//! 2. the body element, mapped to [`ROOT_LOCATOR`] when that selects it
//! 3. unique class, in three increasingly specific forms
//! 4. the first meaningful attribute from [`ATTRIBUTE_PRIORITY`]
//! 5. positional path, short form first and absolute form as the backstop
//!
//! Every candidate from 2-5 must pass [`oracle::matches_exactly`] before it is
//! returned.

use std::fmt;

use tracing::{debug, error, warn};

use crate::app::oracle;
use crate::domain::document::HostDocument;
use crate::domain::errors::LocatorError;
use crate::domain::model::{Locator, NodeKind};
use crate::infra::config::{BUILTIN_RESERVED_PREFIX, Config};

/// Locator returned for the body element.
pub const ROOT_LOCATOR: &str = "//body";

/// Attributes tried by the attribute strategy, most meaningful first.
pub const ATTRIBUTE_PRIORITY: &[&str] = &[
    "name",
    "type",
    "value",
    "href",
    "src",
    "role",
    "data-testid",
    "aria-label",
    "placeholder",
];

/// Which strategy produced a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Identity,
    Body,
    UniqueClass,
    Attribute,
    Positional,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Identity => "identity",
            Strategy::Body => "body",
            Strategy::UniqueClass => "unique-class",
            Strategy::Attribute => "attribute",
            Strategy::Positional => "positional",
        };
        f.write_str(name)
    }
}

/// A generated locator together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inferred {
    pub locator: Locator,
    pub strategy: Strategy,
}

/// Class tokens owned by the tool. They never describe page semantics and must
/// not appear in generated locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedClasses {
    prefixes: Vec<String>,
}

impl Default for ReservedClasses {
    fn default() -> Self {
        Self::new([BUILTIN_RESERVED_PREFIX])
    }
}

impl ReservedClasses {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_reserved(&self, token: &str) -> bool {
        self.prefixes.iter().any(|prefix| token.starts_with(prefix.as_str()))
    }

    /// Drop reserved tokens, keeping the order of the rest.
    pub fn filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .filter(|token| !self.is_reserved(token))
            .collect()
    }
}

type CandidateFn<D> = fn(&LocatorGenerator, &D, <D as HostDocument>::Node) -> Vec<String>;

/// Produces locators that resolve back to exactly the node they were built from.
#[derive(Debug, Clone)]
pub struct LocatorGenerator {
    reserved: ReservedClasses,
    panel_id: String,
}

impl Default for LocatorGenerator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl LocatorGenerator {
    pub fn new(reserved: ReservedClasses, panel_id: impl Into<String>) -> Self {
        Self {
            reserved,
            panel_id: panel_id.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ReservedClasses::new(config.locator.reserved_class_prefixes.iter().cloned()),
            config.locator.panel_id.clone(),
        )
    }

    pub fn reserved(&self) -> &ReservedClasses {
        &self.reserved
    }

    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    /// Generate a locator for `node`.
    pub fn generate<D: HostDocument>(
        &self,
        doc: &D,
        node: D::Node,
    ) -> Result<Locator, LocatorError> {
        self.infer(doc, node).map(|inferred| inferred.locator)
    }

    /// Generate a locator for `node`, reporting which strategy produced it.
    pub fn infer<D: HostDocument>(&self, doc: &D, node: D::Node) -> Result<Inferred, LocatorError> {
        if doc.kind(node) != NodeKind::Element
            || !doc.is_connected(node)
            || doc.is_within_id(node, &self.panel_id)
        {
            debug!(?node, "node is not selectable");
            return Err(LocatorError::NotSelectable);
        }

        if let Some(id) = doc.element_id(node) {
            let locator = id_locator(&id);
            if !oracle::resolves_to(doc, &locator, node) {
                warn!(%locator, "id locator does not resolve to the node first; id is likely duplicated");
            }
            return Ok(accepted(Strategy::Identity, locator));
        }

        if doc.body() == Some(node) {
            if oracle::matches_exactly(doc, ROOT_LOCATOR, node) {
                return Ok(accepted(Strategy::Body, ROOT_LOCATOR.to_owned()));
            }
            debug!(locator = ROOT_LOCATOR, "root locator does not select body");
        }

        let verified: [(Strategy, CandidateFn<D>); 3] = [
            (Strategy::UniqueClass, Self::class_candidates::<D>),
            (Strategy::Attribute, Self::attribute_candidates::<D>),
            (Strategy::Positional, Self::positional_candidates::<D>),
        ];

        for (strategy, candidates) in verified {
            for candidate in candidates(self, doc, node) {
                if oracle::matches_exactly(doc, &candidate, node) {
                    return Ok(accepted(strategy, candidate));
                }
                debug!(%strategy, %candidate, "candidate rejected");
            }
        }

        error!(?node, "positional fallback failed verification");
        Err(LocatorError::NoLocatorPossible)
    }

    fn class_candidates<D: HostDocument>(&self, doc: &D, node: D::Node) -> Vec<String> {
        let Some(tag) = doc.name_test(node) else {
            return Vec::new();
        };
        let classes = self.reserved.filter(doc.class_tokens(node));
        let Some(first) = classes.first() else {
            return Vec::new();
        };

        let contains = format!("//{tag}[contains(@class, {})]", string_literal(first));
        let exact = format!("//{tag}[@class={}]", string_literal(&classes.join(" ")));
        let mut candidates = vec![contains.clone(), exact];
        if let Some((_, anchor_id)) = self.anchor(doc, node) {
            candidates.push(format!("{}{contains}", id_locator(&anchor_id)));
        }
        candidates
    }

    fn attribute_candidates<D: HostDocument>(&self, doc: &D, node: D::Node) -> Vec<String> {
        let Some(tag) = doc.name_test(node) else {
            return Vec::new();
        };
        ATTRIBUTE_PRIORITY
            .iter()
            .find_map(|name| {
                doc.attribute(node, name)
                    .filter(|value| !value.is_empty())
                    .map(|value| format!("//{tag}[@{name}={}]", string_literal(&value)))
            })
            .into_iter()
            .collect()
    }

    fn positional_candidates<D: HostDocument>(&self, doc: &D, node: D::Node) -> Vec<String> {
        let anchor = self.anchor(doc, node);
        let stop = anchor.as_ref().map(|(anchor, _)| *anchor).or_else(|| doc.body());

        let mut short = Vec::new();
        let mut current = Some(node);
        while let Some(element) = current {
            if Some(element) == stop {
                break;
            }
            short.push(position_segment(doc, element));
            current = doc.parent_element(element);
        }
        short.reverse();

        let mut absolute = Vec::new();
        let mut current = Some(node);
        while let Some(element) = current {
            absolute.push(position_segment(doc, element));
            current = doc.parent_element(element);
        }
        absolute.reverse();

        let absolute = format!("/{}", absolute.join("/"));
        if short.is_empty() {
            return vec![absolute];
        }
        let short = match anchor {
            Some((_, anchor_id)) => format!("{}/{}", id_locator(&anchor_id), short.join("/")),
            None => format!("//{}", short.join("/")),
        };
        vec![short, absolute]
    }

    /// Nearest ancestor below body that carries an id.
    fn anchor<D: HostDocument>(&self, doc: &D, node: D::Node) -> Option<(D::Node, String)> {
        let body = doc.body();
        let mut current = doc.parent_element(node);
        while let Some(element) = current {
            if Some(element) == body {
                return None;
            }
            if let Some(id) = doc.element_id(element) {
                return Some((element, id));
            }
            current = doc.parent_element(element);
        }
        None
    }
}

fn accepted(strategy: Strategy, locator: String) -> Inferred {
    debug!(%strategy, %locator, "locator accepted");
    Inferred {
        locator: Locator::new(locator),
        strategy,
    }
}

fn id_locator(id: &str) -> String {
    format!("//*[@id={}]", string_literal(id))
}

/// `tag` when the element is the only child with its tag, else `tag[n]` (1-based).
fn position_segment<D: HostDocument>(doc: &D, node: D::Node) -> String {
    let tag = doc.name_test(node).unwrap_or_else(|| "*".to_owned());
    let Some(parent) = doc.parent_element(node) else {
        return tag;
    };
    let same_tag: Vec<D::Node> = doc
        .element_children(parent)
        .into_iter()
        .filter(|sibling| doc.name_test(*sibling).as_deref() == Some(tag.as_str()))
        .collect();
    if same_tag.len() <= 1 {
        return tag;
    }
    match same_tag.iter().position(|sibling| *sibling == node) {
        Some(index) => format!("{tag}[{}]", index + 1),
        None => tag,
    }
}

/// Quote `value` as an XPath 1.0 string literal.
pub fn string_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let parts: Vec<String> = value.split('"').map(|part| format!("\"{part}\"")).collect();
    format!("concat({})", parts.join(", '\"', "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::dom::{XmlDocument, parse_html};

    fn infer_tag(html: &str, tag: &str, index: usize) -> Result<Inferred, LocatorError> {
        let package = parse_html(html);
        let document = package.as_document();
        let doc = XmlDocument::new(&document);
        let node = doc.elements_by_tag(tag)[index];
        LocatorGenerator::default().infer(&doc, node)
    }

    fn locator(html: &str, tag: &str, index: usize) -> String {
        infer_tag(html, tag, index).unwrap().locator.into_string()
    }

    #[test]
    fn identity_wins_over_unique_class() {
        let inferred = infer_tag(
            r#"<body><p id="lead" class="unique">a</p><p>b</p></body>"#,
            "p",
            0,
        )
        .unwrap();
        assert_eq!(inferred.strategy, Strategy::Identity);
        assert_eq!(inferred.locator.as_str(), r#"//*[@id="lead"]"#);
    }

    #[test]
    fn body_maps_to_root_locator() {
        let inferred = infer_tag("<body><p>a</p></body>", "body", 0).unwrap();
        assert_eq!(inferred.strategy, Strategy::Body);
        assert_eq!(inferred.locator.as_str(), ROOT_LOCATOR);
    }

    #[test]
    fn class_strategy_tries_contains_then_exact() {
        let html = r#"<body><span class="note">x</span><p class="solo">a</p><p class="note big">b</p><p class="note">c</p></body>"#;
        assert_eq!(locator(html, "p", 0), r#"//p[contains(@class, "solo")]"#);
        assert_eq!(locator(html, "p", 1), r#"//p[@class="note big"]"#);
        assert_eq!(locator(html, "p", 2), r#"//p[@class="note"]"#);
    }

    #[test]
    fn class_strategy_scopes_under_anchor() {
        let html = r#"<body><div id="left"><p class="item">1</p></div><div id="right"><p class="item">2</p></div></body>"#;
        assert_eq!(
            locator(html, "p", 1),
            r#"//*[@id="right"]//p[contains(@class, "item")]"#
        );
    }

    #[test]
    fn reserved_classes_are_ignored() {
        let html = r#"<body><p class="xpath-helper-highlight lead">a</p><p class="xpath-helper-highlight">b</p><p>c</p></body>"#;
        assert_eq!(locator(html, "p", 0), r#"//p[contains(@class, "lead")]"#);
        let only_reserved = infer_tag(html, "p", 1).unwrap();
        assert_eq!(only_reserved.strategy, Strategy::Positional);
        assert_eq!(only_reserved.locator.as_str(), "//p[2]");
    }

    #[test]
    fn attribute_strategy_uses_priority_order() {
        let html = r#"<body><input type="text" name="q"><input type="text" name="r"><a href="/docs" role="link">d</a></body>"#;
        let inferred = infer_tag(html, "input", 1).unwrap();
        assert_eq!(inferred.strategy, Strategy::Attribute);
        assert_eq!(inferred.locator.as_str(), r#"//input[@name="r"]"#);
        assert_eq!(locator(html, "a", 0), r#"//a[@href="/docs"]"#);
    }

    #[test]
    fn attribute_strategy_only_tries_first_present_attribute() {
        let html = r#"<body><input type="text" aria-label="one"><input type="text" aria-label="two"></body>"#;
        let inferred = infer_tag(html, "input", 1).unwrap();
        assert_eq!(inferred.strategy, Strategy::Positional);
        assert_eq!(inferred.locator.as_str(), "//input[2]");
    }

    #[test]
    fn positional_indexes_same_tag_siblings() {
        let html = "<body><ul><li>a</li><li>b</li><li>c</li></ul></body>";
        assert_eq!(locator(html, "li", 0), "//ul/li[1]");
        assert_eq!(locator(html, "li", 2), "//ul/li[3]");
        assert_eq!(locator(html, "ul", 0), "//ul");
    }

    #[test]
    fn positional_ignores_other_tags_when_indexing() {
        let html = "<body><div><span>x</span><p>a</p><span>y</span><p>b</p></div></body>";
        assert_eq!(locator(html, "p", 1), "//div/p[2]");
    }

    #[test]
    fn positional_prefers_anchor() {
        let html = r#"<body><section id="main"><div><b>a</b></div><div><b>b</b></div></section></body>"#;
        assert_eq!(locator(html, "b", 1), r#"//*[@id="main"]/div[2]/b"#);
    }

    #[test]
    fn positional_falls_back_to_absolute_path() {
        let html = "<body><div><p>x</p></div><section><div><p>y</p></div></section></body>";
        assert_eq!(locator(html, "p", 0), "/html/body/div/p");
        assert_eq!(locator(html, "p", 1), "//section/div/p");
    }

    #[test]
    fn elements_outside_body_get_paths() {
        let html = "<html><head><title>t</title></head><body></body></html>";
        assert_eq!(locator(html, "html", 0), "//html");
        assert_eq!(locator(html, "title", 0), "//html/head/title");
    }

    #[test]
    fn panel_and_detached_nodes_are_not_selectable() {
        let html = r#"<body><div id="xpath-helper-panel"><button>x</button></div></body>"#;
        assert_eq!(infer_tag(html, "button", 0), Err(LocatorError::NotSelectable));
        assert_eq!(infer_tag(html, "div", 0), Err(LocatorError::NotSelectable));

        let package = parse_html("<body></body>");
        let document = package.as_document();
        let doc = XmlDocument::new(&document);
        let detached = doc.create_detached("p");
        assert_eq!(
            LocatorGenerator::default().generate(&doc, detached),
            Err(LocatorError::NotSelectable)
        );
    }

    #[test]
    fn text_nodes_are_not_selectable() {
        let package = parse_html("<body><p>text</p></body>");
        let document = package.as_document();
        let doc = XmlDocument::new(&document);
        let text = doc.evaluate("//p/text()").unwrap()[0];
        assert_eq!(
            LocatorGenerator::default().generate(&doc, text),
            Err(LocatorError::NotSelectable)
        );
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal("say \"hi\""), "'say \"hi\"'");
        assert_eq!(
            string_literal("it's \"x\""),
            "concat(\"it's \", '\"', \"x\", '\"', \"\")"
        );

        let html = r#"<body><input name='a"b'><input name="c"></body>"#;
        assert_eq!(locator(html, "input", 0), r#"//input[@name='a"b']"#);
    }

    #[test]
    fn namespaced_documents_use_local_name_tests() {
        let package = crate::infra::dom::parse_xml(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><ul><li>a</li><li class="b">b</li></ul></body></html>"#,
        )
        .unwrap();
        let document = package.as_document();
        let doc = XmlDocument::new(&document);
        let generator = LocatorGenerator::default();
        let items = doc.elements_by_tag("li");

        let first = generator.infer(&doc, items[0]).unwrap();
        assert_eq!(first.strategy, Strategy::Positional);
        assert_eq!(
            first.locator.as_str(),
            r#"//*[local-name()="ul"]/*[local-name()="li"][1]"#
        );
        assert_eq!(
            generator.generate(&doc, items[1]).unwrap().as_str(),
            r#"//*[local-name()="li"][contains(@class, "b")]"#
        );

        let body = doc.body().unwrap();
        let inferred = generator.infer(&doc, body).unwrap();
        assert_eq!(inferred.strategy, Strategy::Positional);
        assert_eq!(
            inferred.locator.as_str(),
            r#"/*[local-name()="html"]/*[local-name()="body"]"#
        );
        assert_eq!(doc.evaluate(inferred.locator.as_str()).unwrap(), vec![body]);
    }

    #[test]
    fn reserved_prefixes_come_from_config() {
        let mut config = Config::default();
        config.locator.reserved_class_prefixes.push("tool-".into());
        let generator = LocatorGenerator::from_config(&config);
        assert!(generator.reserved().is_reserved("tool-hover"));
        assert!(generator.reserved().is_reserved("xpath-helper-flash"));
        assert!(!generator.reserved().is_reserved("toolbar"));
    }
}

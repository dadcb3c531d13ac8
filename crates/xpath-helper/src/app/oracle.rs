//! Uniqueness checks used to verify generated locators.
//!
//! Evaluation failures are answered with `false`; they never escape as errors.

use crate::app::evaluator;
use crate::domain::document::HostDocument;

/// The locator selects exactly one node and that node is `node`.
pub fn matches_exactly<D: HostDocument>(doc: &D, locator: &str, node: D::Node) -> bool {
    match evaluator::evaluate(doc, locator) {
        Ok(snapshot) => {
            snapshot.count() == 1 && snapshot.first().map(|item| item.node) == Some(node)
        }
        Err(_) => false,
    }
}

/// The first match in document order is `node`; further matches are tolerated.
pub fn resolves_to<D: HostDocument>(doc: &D, locator: &str, node: D::Node) -> bool {
    match evaluator::evaluate(doc, locator) {
        Ok(snapshot) => snapshot.first().map(|item| item.node) == Some(node),
        Err(_) => false,
    }
}

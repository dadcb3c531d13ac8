//! Turning locator text into match snapshots.

use tracing::debug;

use crate::domain::document::HostDocument;
use crate::domain::errors::EvaluationError;
use crate::domain::model::{MatchSnapshot, MatchedNode};

/// Evaluate `locator` against the current state of `doc`.
///
/// Grammar is left entirely to the host; any failure it reports comes back as an
/// [`EvaluationError`] carrying the host's message.
pub fn evaluate<D: HostDocument>(
    doc: &D,
    locator: &str,
) -> Result<MatchSnapshot<D::Node>, EvaluationError> {
    let nodes = doc.evaluate(locator)?;
    let items = nodes
        .into_iter()
        .map(|node| MatchedNode {
            node,
            kind: doc.kind(node),
        })
        .collect::<Vec<_>>();
    debug!(locator, count = items.len(), "evaluated locator");
    Ok(MatchSnapshot::new(items))
}

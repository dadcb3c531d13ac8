//! Serializable projection of a query session for the panel shell.

use serde::Serialize;

use crate::app::query::{QuerySession, QueryState};
use crate::domain::document::HostDocument;
use crate::domain::model::{MatchedNode, NodeKind};

/// Placeholder shown while the input is empty.
pub const EMPTY_NOTICE: &str = "Type XPath to search...";
/// Indicator for a query that matched nothing.
pub const NO_MATCHES_NOTICE: &str = "No elements match this XPath";

/// Coarse status of the results region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsStatus {
    Empty,
    Evaluating,
    Error,
    ZeroResults,
    Results,
}

/// One displayed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// Position in the snapshot, used to select the row.
    pub index: usize,
    /// 1-based number shown next to the row.
    pub number: usize,
    pub kind: NodeKind,
    /// `<tag id="..." class="...">`, or a placeholder for non-elements.
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Everything the panel needs to render the results region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsView {
    pub status: ResultsStatus,
    /// `(N items)`; absent while empty or waiting on the debounce.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_label: Option<String>,
    pub total: usize,
    pub rows: Vec<ResultRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultsView {
    pub fn project<D>(doc: &D, session: &QuerySession<D::Node>) -> Self
    where
        D: HostDocument,
    {
        let settings = session.settings();
        let mut view = Self {
            status: ResultsStatus::Empty,
            count_label: None,
            total: 0,
            rows: Vec::new(),
            notice: None,
            error: None,
        };

        match session.state() {
            QueryState::Empty => view.notice = Some(EMPTY_NOTICE.to_owned()),
            QueryState::Evaluating => view.status = ResultsStatus::Evaluating,
            QueryState::Error(message) => {
                view.status = ResultsStatus::Error;
                view.count_label = Some(count_label(0));
                view.error = Some(format!("Invalid XPath: {message}"));
            }
            QueryState::ZeroResults => {
                view.status = ResultsStatus::ZeroResults;
                view.count_label = Some(count_label(0));
                view.notice = Some(NO_MATCHES_NOTICE.to_owned());
            }
            QueryState::Results(total) => {
                let displayed = session.displayed();
                view.status = ResultsStatus::Results;
                view.total = *total;
                view.count_label = Some(count_label(*total));
                view.rows = displayed
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        row(
                            doc,
                            index,
                            *item,
                            settings.text_preview_chars,
                            settings.class_preview_chars,
                        )
                    })
                    .collect();
                if *total > displayed.len() {
                    view.notice = Some(format!(
                        "Showing first {} of {} total items",
                        displayed.len(),
                        total
                    ));
                }
            }
        }
        view
    }

    /// Pretty JSON handed across the shell boundary.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn count_label(count: usize) -> String {
    format!("({count} items)")
}

fn row<D: HostDocument>(
    doc: &D,
    index: usize,
    item: MatchedNode<D::Node>,
    text_chars: usize,
    class_chars: usize,
) -> ResultRow {
    let summary = match item.kind {
        NodeKind::Element => element_summary(doc, item.node, class_chars),
        NodeKind::Text => "[Text Node]".to_owned(),
        NodeKind::Other => "[Node]".to_owned(),
    };
    let text = match item.kind {
        NodeKind::Element | NodeKind::Text => {
            preview(&doc.text_content(item.node), text_chars)
        }
        NodeKind::Other => None,
    };
    ResultRow {
        index,
        number: index + 1,
        kind: item.kind,
        summary,
        text,
    }
}

fn element_summary<D: HostDocument>(doc: &D, node: D::Node, class_chars: usize) -> String {
    let tag = doc.tag_name(node).unwrap_or_default().to_lowercase();
    let mut summary = format!("<{tag}");
    if let Some(id) = doc.element_id(node) {
        summary.push_str(&format!(" id=\"{id}\""));
    }
    if let Some(class) = doc.attribute(node, "class") {
        let class: String = class.trim().chars().take(class_chars).collect();
        if !class.is_empty() {
            summary.push_str(&format!(" class=\"{class}\""));
        }
    }
    summary.push('>');
    summary
}

/// Trimmed text, cut to `limit` characters with a trailing ellipsis.
fn preview(text: &str, limit: usize) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() > limit {
        let mut cut: String = text.chars().take(limit).collect();
        cut.push_str("...");
        Some(cut)
    } else {
        Some(text.to_owned())
    }
}

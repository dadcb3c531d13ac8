//! Domain models for locators, match snapshots, and decorations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant attached to every matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Element,
    Text,
    Other,
}

/// Temporary visual states the engine may place on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoration {
    /// Picker hover outline.
    Hover,
    /// Steady decoration on every displayed match.
    Matched,
    /// Short-lived emphasis after scrolling a match into view.
    Flash,
}

impl Decoration {
    /// Stable token used by hosts that record decorations as markup.
    pub fn token(&self) -> &'static str {
        match self {
            Decoration::Hover => "hover",
            Decoration::Matched => "highlight",
            Decoration::Flash => "flash",
        }
    }
}

/// An immutable path expression in the host's query language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry of a [`MatchSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedNode<N> {
    pub node: N,
    pub kind: NodeKind,
}

/// Point-in-time, document-ordered result of evaluating a locator.
///
/// Snapshots are never updated in place; every evaluation produces a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSnapshot<N> {
    items: Vec<MatchedNode<N>>,
}

impl<N: Copy> MatchSnapshot<N> {
    pub fn new(items: Vec<MatchedNode<N>>) -> Self {
        Self { items }
    }

    /// Total number of matches.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_at(&self, index: usize) -> Option<MatchedNode<N>> {
        self.items.get(index).copied()
    }

    pub fn first(&self) -> Option<MatchedNode<N>> {
        self.item_at(0)
    }

    pub fn items(&self) -> &[MatchedNode<N>] {
        &self.items
    }

    /// Leading slice limited to `cap` entries.
    pub fn displayed(&self, cap: usize) -> &[MatchedNode<N>] {
        &self.items[..self.items.len().min(cap)]
    }
}

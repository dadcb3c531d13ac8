//! Bookkeeping for decorations the engine places on document nodes.
//!
//! Every decoration applied through these types is recorded as a marker, and every
//! marker can be reverted from any exit path. Reverting is best-effort and never fails.

use std::time::{Duration, Instant};

use crate::domain::document::HostDocument;
use crate::domain::model::Decoration;

/// Record of one decoration currently applied to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightMarker<N> {
    pub node: N,
    pub decoration: Decoration,
}

/// Markers for decorations the engine owns.
///
/// A node carries at most one marker per decoration kind.
#[derive(Debug, Clone)]
pub struct DecorationSet<N> {
    markers: Vec<HighlightMarker<N>>,
}

impl<N> Default for DecorationSet<N> {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
        }
    }
}

impl<N: Copy + Eq> DecorationSet<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[HighlightMarker<N>] {
        &self.markers
    }

    pub fn contains(&self, node: N, decoration: Decoration) -> bool {
        self.markers
            .iter()
            .any(|marker| marker.node == node && marker.decoration == decoration)
    }

    /// Decorate `node` and record a marker. Returns `false` if it was already marked.
    pub fn apply<D>(&mut self, doc: &mut D, node: N, decoration: Decoration) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if self.contains(node, decoration) {
            return false;
        }
        doc.apply_decoration(node, decoration);
        self.markers.push(HighlightMarker { node, decoration });
        true
    }

    /// Revert one marker. Unknown markers are a no-op.
    pub fn revert<D>(&mut self, doc: &mut D, node: N, decoration: Decoration) -> bool
    where
        D: HostDocument<Node = N>,
    {
        let before = self.markers.len();
        self.markers
            .retain(|marker| !(marker.node == node && marker.decoration == decoration));
        let removed = self.markers.len() != before;
        if removed {
            doc.revert_decoration(node, decoration);
        }
        removed
    }

    /// Revert every marker, leaving the set empty.
    pub fn revert_all<D>(&mut self, doc: &mut D)
    where
        D: HostDocument<Node = N>,
    {
        for marker in self.markers.drain(..) {
            doc.revert_decoration(marker.node, marker.decoration);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FlashTimer<N> {
    node: N,
    due: Instant,
}

/// Pending flash reverts, kept apart from the steady highlight markers.
///
/// Cancelling removes the decoration immediately, so a cancelled timer can never
/// reapply or revert anything later.
#[derive(Debug, Clone)]
pub struct FlashTimers<N> {
    duration: Duration,
    pending: Vec<FlashTimer<N>>,
}

impl<N: Copy + Eq> FlashTimers<N> {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            pending: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_flashing(&self, node: N) -> bool {
        self.pending.iter().any(|timer| timer.node == node)
    }

    /// Flash `node` until `now + duration`. Flashing a node again restarts its timer.
    pub fn start<D>(&mut self, doc: &mut D, node: N, now: Instant)
    where
        D: HostDocument<Node = N>,
    {
        let due = now + self.duration;
        if let Some(timer) = self.pending.iter_mut().find(|timer| timer.node == node) {
            timer.due = due;
            return;
        }
        doc.apply_decoration(node, Decoration::Flash);
        self.pending.push(FlashTimer { node, due });
    }

    /// Revert flashes whose time is up. Returns how many fired.
    pub fn fire_due<D>(&mut self, doc: &mut D, now: Instant) -> usize
    where
        D: HostDocument<Node = N>,
    {
        let mut fired = 0;
        self.pending.retain(|timer| {
            if timer.due <= now {
                doc.revert_decoration(timer.node, Decoration::Flash);
                fired += 1;
                false
            } else {
                true
            }
        });
        fired
    }

    /// Cancel every pending flash and restore pre-flash state now.
    pub fn cancel_all<D>(&mut self, doc: &mut D)
    where
        D: HostDocument<Node = N>,
    {
        for timer in self.pending.drain(..) {
            doc.revert_decoration(timer.node, Decoration::Flash);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|timer| timer.due).min()
    }
}

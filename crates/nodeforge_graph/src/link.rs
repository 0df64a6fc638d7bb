// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::pin::PinId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a link within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub i32);

impl LinkId {
    /// Sentinel for "no link"
    pub const INVALID: Self = Self(-1);

    /// Whether this ID refers to an allocated link
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// A directed edge from an output pin to an input pin.
///
/// Links are immutable; rewiring removes the old link and creates a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    id: LinkId,
    start: PinId,
    end: PinId,
    color: [u8; 3],
}

impl Link {
    pub(crate) fn new(id: LinkId, start: PinId, end: PinId, color: [u8; 3]) -> Self {
        Self {
            id,
            start,
            end,
            color,
        }
    }

    /// Link ID
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Output pin the link starts at
    pub fn start_pin(&self) -> PinId {
        self.start
    }

    /// Input pin the link ends at
    pub fn end_pin(&self) -> PinId {
        self.end
    }

    /// Display color, taken from the source pin's data type at creation
    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// Check if this link involves a specific pin
    pub fn involves_pin(&self, pin_id: PinId) -> bool {
        self.start == pin_id || self.end == pin_id
    }
}

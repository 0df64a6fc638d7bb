// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::graph::{Graph, GraphDomain};
use crate::pin::{Pin, PinDataType, PinId, PinValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// Unique identifier for a node within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i32);

impl NodeId {
    /// Sentinel for "no node"
    pub const INVALID: Self = Self(-1);

    /// Whether this ID refers to an allocated node
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Bitset of node traits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeFlags(u32);

impl NodeFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// Output/result node
    pub const IS_OUTPUT: Self = Self(1 << 0);
    /// Graph input/parameter node
    pub const IS_INPUT: Self = Self(1 << 1);
    /// Value never changes
    pub const IS_CONSTANT: Self = Self(1 << 2);
    /// Can render a preview
    pub const HAS_PREVIEW: Self = Self(1 << 3);
    /// Comment/reroute node
    pub const IS_COMMENT: Self = Self(1 << 4);
    /// Drawn in compact mode
    pub const IS_COMPACT: Self = Self(1 << 5);
    /// Cannot be deleted by the user
    pub const NO_DELETE: Self = Self(1 << 6);
    /// Cannot be duplicated by the user
    pub const NO_DUPLICATE: Self = Self(1 << 7);
    /// Currently collapsed
    pub const IS_COLLAPSED: Self = Self(1 << 8);

    /// Raw bit pattern
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `other`
    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Outcome of a node's self-validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeStatus {
    /// Not validated yet
    #[default]
    None,
    /// Passed validation
    Valid,
    /// Usable, but suspicious
    Warning,
    /// Broken
    Error,
}

/// Status produced by [`NodeBehavior::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeMessage {
    /// Severity
    pub level: NodeStatus,
    /// Human-readable explanation, empty when valid
    pub text: String,
}

impl NodeMessage {
    /// Passed validation
    pub fn valid() -> Self {
        Self {
            level: NodeStatus::Valid,
            text: String::new(),
        }
    }

    /// Warning with a message
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NodeStatus::Warning,
            text: text.into(),
        }
    }

    /// Error with a message
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NodeStatus::Error,
            text: text.into(),
        }
    }
}

/// Behavior shared by every instance of a concrete node type.
///
/// `init` declares the node's pins, allocating each pin ID from the graph.
/// `validate` re-derives the node's status from its current pin state; it is
/// diagnostic only.
pub trait NodeBehavior: fmt::Debug + Send + Sync {
    /// Declare input and output pins
    fn init(&self, node: &mut Node, graph: &mut Graph);

    /// Check the node's current pin state
    fn validate(&self, _node: &Node) -> NodeMessage {
        NodeMessage::valid()
    }

    /// Domain this node type belongs to
    fn domain(&self) -> GraphDomain {
        GraphDomain::None
    }
}

/// A node instance in the graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID, `NodeId::INVALID` until added to a graph
    pub id: NodeId,
    /// Registered type name, used to reconstruct the node on load
    pub type_name: String,
    /// Display name (can be customized)
    pub display_name: String,
    /// Menu category
    pub category: String,
    /// Tooltip text, falls back to the display name when empty
    pub tooltip: String,
    /// Input pins, in declaration order
    pub inputs: Vec<Pin>,
    /// Output pins, in declaration order
    pub outputs: Vec<Pin>,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Header color in the graph UI
    pub header_color: [u8; 3],
    /// Node traits
    pub flags: NodeFlags,
    /// Result of the last validation
    pub status: NodeStatus,
    /// Message of the last validation
    pub status_message: String,
    behavior: Option<Arc<dyn NodeBehavior>>,
}

impl Node {
    /// Default header color
    pub const DEFAULT_HEADER_COLOR: [u8; 3] = [60, 60, 60];

    /// Create a bare node with no pins and no behavior
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            id: NodeId::INVALID,
            display_name: type_name.clone(),
            type_name,
            category: String::new(),
            tooltip: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            position: [0.0, 0.0],
            header_color: Self::DEFAULT_HEADER_COLOR,
            flags: NodeFlags::NONE,
            status: NodeStatus::None,
            status_message: String::new(),
            behavior: None,
        }
    }

    /// Create a node driven by `behavior`. Pins are declared by calling
    /// [`NodeBehavior::init`] separately.
    pub fn with_behavior(type_name: impl Into<String>, behavior: Arc<dyn NodeBehavior>) -> Self {
        let mut node = Self::new(type_name);
        node.behavior = Some(behavior);
        node
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Behavior of this node's type, if any
    pub fn behavior(&self) -> Option<&Arc<dyn NodeBehavior>> {
        self.behavior.as_ref()
    }

    /// Domain of this node's type
    pub fn domain(&self) -> GraphDomain {
        self.behavior
            .as_ref()
            .map_or(GraphDomain::None, |behavior| behavior.domain())
    }

    /// Tooltip text
    pub fn tooltip(&self) -> &str {
        if self.tooltip.is_empty() {
            &self.display_name
        } else {
            &self.tooltip
        }
    }

    /// Whether every bit of `flag` is set
    pub fn has_flag(&self, flag: NodeFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Set or clear `flag`
    pub fn set_flag(&mut self, flag: NodeFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    /// Append an input pin
    pub fn add_input(
        &mut self,
        id: PinId,
        name: impl Into<String>,
        data_type: PinDataType,
        default_value: impl Into<PinValue>,
    ) -> &mut Pin {
        let mut pin = Pin::input(id, name, data_type, default_value);
        pin.owner = self.id;
        self.inputs.push(pin);
        let last = self.inputs.len() - 1;
        &mut self.inputs[last]
    }

    /// Append an output pin
    pub fn add_output(
        &mut self,
        id: PinId,
        name: impl Into<String>,
        data_type: PinDataType,
    ) -> &mut Pin {
        let mut pin = Pin::output(id, name, data_type);
        pin.owner = self.id;
        self.outputs.push(pin);
        let last = self.outputs.len() - 1;
        &mut self.outputs[last]
    }

    /// Get a pin by ID
    pub fn find_pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.pins().find(|p| p.id == pin_id)
    }

    /// Get a mutable pin by ID
    pub fn find_pin_mut(&mut self, pin_id: PinId) -> Option<&mut Pin> {
        self.inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .find(|p| p.id == pin_id)
    }

    /// Get an input pin by name
    pub fn input_by_name(&self, name: &str) -> Option<&Pin> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get all pins, inputs first
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Stamp `id` on the node and every pin it owns
    pub(crate) fn assign_id(&mut self, id: NodeId) {
        self.id = id;
        for pin in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            pin.owner = id;
        }
    }

    /// Re-derive `status` and `status_message`.
    ///
    /// Returns `false` when the node reports a warning or an error.
    pub fn validate(&mut self) -> bool {
        let message = self
            .behavior
            .as_ref()
            .map_or_else(NodeMessage::valid, |behavior| behavior.validate(self));

        self.status = message.level;
        self.status_message = message.text;
        !matches!(self.status, NodeStatus::Warning | NodeStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AlwaysWarns;

    impl NodeBehavior for AlwaysWarns {
        fn init(&self, node: &mut Node, graph: &mut Graph) {
            node.add_input(graph.allocate_pin_id(), "In", PinDataType::Float, 0.0);
        }

        fn validate(&self, _node: &Node) -> NodeMessage {
            NodeMessage::warning("always")
        }

        fn domain(&self) -> GraphDomain {
            GraphDomain::Audio
        }
    }

    #[test]
    fn test_flags() {
        let mut flags = NodeFlags::IS_CONSTANT | NodeFlags::IS_COMPACT;
        assert!(flags.contains(NodeFlags::IS_CONSTANT));
        assert!(!flags.contains(NodeFlags::IS_COMMENT));

        flags.set(NodeFlags::IS_COMPACT, false);
        assert_eq!(flags, NodeFlags::IS_CONSTANT);

        flags |= NodeFlags::NO_DELETE;
        assert_eq!(flags.bits(), (1 << 2) | (1 << 6));
    }

    #[test]
    fn test_pin_lookup() {
        let mut node = Node::new("Test");
        node.add_input(PinId(1), "A", PinDataType::Float, 0.0);
        node.add_input(PinId(2), "B", PinDataType::Float, 0.0);
        node.add_output(PinId(3), "Result", PinDataType::Float);

        assert_eq!(node.find_pin(PinId(3)).map(|p| p.name.as_str()), Some("Result"));
        assert_eq!(node.input_by_name("B").map(|p| p.id), Some(PinId(2)));
        assert!(node.find_pin(PinId(9)).is_none());
        assert_eq!(node.pins().count(), 3);
    }

    #[test]
    fn test_assign_id_stamps_pins() {
        let mut node = Node::new("Test");
        node.add_input(PinId(1), "A", PinDataType::Float, 0.0);
        node.add_output(PinId(2), "Out", PinDataType::Float);

        node.assign_id(NodeId(7));
        assert!(node.pins().all(|p| p.owner() == NodeId(7)));
    }

    #[test]
    fn test_validate_uses_behavior() {
        let mut graph = Graph::default();
        let behavior: Arc<dyn NodeBehavior> = Arc::new(AlwaysWarns);
        let mut node = Node::with_behavior("Test::Warn", behavior.clone());
        behavior.init(&mut node, &mut graph);

        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.domain(), GraphDomain::Audio);
        assert!(!node.validate());
        assert_eq!(node.status, NodeStatus::Warning);
        assert_eq!(node.status_message, "always");
    }

    #[test]
    fn test_bare_node_is_valid() {
        let mut node = Node::new("Bare");
        assert!(node.validate());
        assert_eq!(node.status, NodeStatus::Valid);
        assert_eq!(node.domain(), GraphDomain::None);
        assert_eq!(node.tooltip(), "Bare");

        node.tooltip = "A bare node".to_string();
        assert_eq!(node.tooltip(), "A bare node");

        node.set_flag(NodeFlags::IS_COLLAPSED, true);
        assert!(node.has_flag(NodeFlags::IS_COLLAPSED));
    }
}

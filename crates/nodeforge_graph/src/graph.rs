// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and links.

use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeStatus};
use crate::pin::{Pin, PinDataType, PinId};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// First value handed out by each ID counter
const FIRST_ID: i32 = 1;

/// Node catalog a graph belongs to. Descriptive only; not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphDomain {
    /// Domain-agnostic
    #[default]
    None,
    /// Shader/material graphs
    Shader,
    /// Animation state machines and blend trees
    Animation,
    /// Audio mixer chains
    Audio,
    /// Visual scripting
    Blueprint,
    /// AI behavior trees
    BehaviorTree,
    /// Particle systems
    Particle,
    /// Post-processing chains
    PostProcess,
}

impl GraphDomain {
    /// Every domain, in declaration order
    pub const ALL: [GraphDomain; 8] = [
        Self::None,
        Self::Shader,
        Self::Animation,
        Self::Audio,
        Self::Blueprint,
        Self::BehaviorTree,
        Self::Particle,
        Self::PostProcess,
    ];

    /// Stable name used in persisted documents
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Shader => "Shader",
            Self::Animation => "Animation",
            Self::Audio => "Audio",
            Self::Blueprint => "Blueprint",
            Self::BehaviorTree => "BehaviorTree",
            Self::Particle => "Particle",
            Self::PostProcess => "PostProcess",
        }
    }

    /// Look up a domain by its persisted name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.name() == name)
    }
}

impl fmt::Display for GraphDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable asset identifier of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphUuid(pub u64);

impl GraphUuid {
    /// Create a new random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128() as u64)
    }
}

impl Default for GraphUuid {
    fn default() -> Self {
        Self::new()
    }
}

/// A node graph
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    domain: GraphDomain,
    uuid: GraphUuid,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Links between pins
    links: IndexMap<LinkId, Link>,
    next_node_id: i32,
    next_pin_id: i32,
    next_link_id: i32,
    dirty: bool,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>, domain: GraphDomain) -> Self {
        Self {
            name: name.into(),
            domain,
            uuid: GraphUuid::new(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            next_node_id: FIRST_ID,
            next_pin_id: FIRST_ID,
            next_link_id: FIRST_ID,
            dirty: false,
        }
    }

    /// Graph name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the graph
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty = true;
    }

    /// Node catalog this graph belongs to
    pub fn domain(&self) -> GraphDomain {
        self.domain
    }

    /// Change the node catalog tag
    pub fn set_domain(&mut self, domain: GraphDomain) {
        self.domain = domain;
        self.dirty = true;
    }

    /// Asset identifier
    pub fn uuid(&self) -> GraphUuid {
        self.uuid
    }

    /// Replace the asset identifier
    pub fn set_uuid(&mut self, uuid: GraphUuid) {
        self.uuid = uuid;
    }

    // ------------------------------------------------------------------
    // ID allocation
    // ------------------------------------------------------------------

    /// Allocate a fresh node ID, or `NodeId::INVALID` once the counter is
    /// exhausted
    pub fn allocate_node_id(&mut self) -> NodeId {
        next_id(&mut self.next_node_id).map_or(NodeId::INVALID, NodeId)
    }

    /// Allocate a fresh pin ID, or `PinId::INVALID` once the counter is
    /// exhausted
    pub fn allocate_pin_id(&mut self) -> PinId {
        next_id(&mut self.next_pin_id).map_or(PinId::INVALID, PinId)
    }

    /// Allocate a fresh link ID, or `LinkId::INVALID` once the counter is
    /// exhausted
    pub fn allocate_link_id(&mut self) -> LinkId {
        next_id(&mut self.next_link_id).map_or(LinkId::INVALID, LinkId)
    }

    /// Set the next node ID to hand out
    pub fn set_next_node_id(&mut self, next: i32) {
        self.next_node_id = next;
    }

    /// Set the next pin ID to hand out
    pub fn set_next_pin_id(&mut self, next: i32) {
        self.next_pin_id = next;
    }

    /// Set the next link ID to hand out
    pub fn set_next_link_id(&mut self, next: i32) {
        self.next_link_id = next;
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Add a node to the graph.
    ///
    /// A node without an ID gets a fresh one. Every pin is stamped with the
    /// node's ID. Explicit node and pin IDs advance the counters past them.
    ///
    /// Returns `NodeId::INVALID` and leaves the graph unchanged when the node
    /// ID or one of its pin IDs is already taken, or when IDs are exhausted.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = if node.id.is_valid() {
            node.id
        } else {
            self.allocate_node_id()
        };
        if !id.is_valid() {
            tracing::warn!(type_name = %node.type_name, "node IDs exhausted");
            return NodeId::INVALID;
        }
        if self.nodes.contains_key(&id) {
            tracing::warn!(node = %id, "node ID already in use");
            return NodeId::INVALID;
        }
        if node.pins().any(|pin| !pin.id.is_valid()) {
            tracing::warn!(node = %id, "pin without a valid ID");
            return NodeId::INVALID;
        }
        if let Some(taken) = node.pins().find(|pin| self.find_pin(pin.id).is_some()) {
            tracing::warn!(node = %id, pin = %taken.id, "pin ID already in use");
            return NodeId::INVALID;
        }

        bump_past(&mut self.next_node_id, id.0);
        for pin in node.pins() {
            bump_past(&mut self.next_pin_id, pin.id.0);
        }
        node.assign_id(id);

        tracing::debug!(node = %id, type_name = %node.type_name, "node added");
        self.nodes.insert(id, node);
        self.dirty = true;
        id
    }

    /// Remove a node and every link touching it
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.get(&node_id)?;
        let incident: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| {
                node.find_pin(link.start_pin()).is_some() || node.find_pin(link.end_pin()).is_some()
            })
            .map(Link::id)
            .collect();

        for link_id in incident {
            self.remove_link(link_id);
        }

        tracing::debug!(node = %node_id, "node removed");
        self.dirty = true;
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID. Marks the graph dirty.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        let node = self.nodes.get_mut(&node_id)?;
        self.dirty = true;
        Some(node)
    }

    /// Get all nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs, in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Link two pins.
    ///
    /// The pins may be given in either order; the link always runs from the
    /// output pin to the input pin. An input pin carries at most one link, so
    /// any link already ending at the input is removed first. Cycles are not
    /// rejected here; see [`Graph::has_cycle`].
    pub fn add_link(&mut self, pin_a: PinId, pin_b: PinId) -> Result<LinkId, LinkError> {
        self.connect(pin_a, pin_b, None)
    }

    /// Link two pins, keeping `id` when it is free. Used by loaders.
    pub(crate) fn restore_link(
        &mut self,
        id: LinkId,
        start: PinId,
        end: PinId,
    ) -> Result<LinkId, LinkError> {
        self.connect(start, end, Some(id))
    }

    fn connect(
        &mut self,
        pin_a: PinId,
        pin_b: PinId,
        requested: Option<LinkId>,
    ) -> Result<LinkId, LinkError> {
        let a = self.find_pin(pin_a).ok_or(LinkError::PinNotFound(pin_a))?;
        let b = self.find_pin(pin_b).ok_or(LinkError::PinNotFound(pin_b))?;

        let (source, target) = if a.is_input() && b.is_output() {
            (b, a)
        } else {
            (a, b)
        };
        if !source.is_output() || !target.is_input() {
            return Err(LinkError::SameDirection);
        }
        source.check_connection(target)?;

        let (start, end) = (source.id, target.id);
        let color = source.data_type().color();

        let id = match requested {
            Some(id) if id.is_valid() && !self.links.contains_key(&id) => id,
            _ => self.allocate_link_id(),
        };
        if !id.is_valid() {
            return Err(LinkError::IdsExhausted);
        }
        bump_past(&mut self.next_link_id, id.0);

        let replaced: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| link.end_pin() == end)
            .map(Link::id)
            .collect();
        for link_id in replaced {
            tracing::debug!(link = %link_id, input = %end, "replacing link on input");
            self.remove_link(link_id);
        }
        self.links.insert(id, Link::new(id, start, end, color));
        for pin_id in [start, end] {
            if let Some(pin) = self.pin_mut(pin_id) {
                pin.is_connected = true;
            }
        }

        tracing::debug!(link = %id, %start, %end, "link added");
        self.dirty = true;
        Ok(id)
    }

    /// Remove a link and refresh the connection state of both endpoints
    pub fn remove_link(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.shift_remove(&link_id)?;
        self.refresh_connection(link.start_pin());
        self.refresh_connection(link.end_pin());
        self.dirty = true;
        Some(link)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links, in insertion order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Get links starting or ending at a pin
    pub fn links_for_pin(&self, pin_id: PinId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |link| link.involves_pin(pin_id))
    }

    /// Get links touching any pin of a node
    pub fn links_for_node(&self, node_id: NodeId) -> Vec<&Link> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };
        self.links
            .values()
            .filter(|link| node.pins().any(|pin| link.involves_pin(pin.id)))
            .collect()
    }

    /// Follow the link into an input pin upstream to its output pin
    pub fn connected_output_pin(&self, input_pin: PinId) -> Option<&Pin> {
        let link = self.links.values().find(|link| link.end_pin() == input_pin)?;
        self.find_pin(link.start_pin())
    }

    // ------------------------------------------------------------------
    // Pins
    // ------------------------------------------------------------------

    /// Find a pin anywhere in the graph
    pub fn find_pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.nodes.values().find_map(|node| node.find_pin(pin_id))
    }

    /// Find a mutable pin anywhere in the graph. Marks the graph dirty when
    /// found.
    pub fn find_pin_mut(&mut self, pin_id: PinId) -> Option<&mut Pin> {
        let pin = self
            .nodes
            .values_mut()
            .find_map(|node| node.find_pin_mut(pin_id))?;
        self.dirty = true;
        Some(pin)
    }

    /// Find the node owning a pin
    pub fn find_pin_owner(&self, pin_id: PinId) -> Option<&Node> {
        self.nodes.values().find(|node| node.find_pin(pin_id).is_some())
    }

    fn pin_mut(&mut self, pin_id: PinId) -> Option<&mut Pin> {
        self.nodes
            .values_mut()
            .find_map(|node| node.find_pin_mut(pin_id))
    }

    fn refresh_connection(&mut self, pin_id: PinId) {
        let connected = self.links.values().any(|link| link.involves_pin(pin_id));
        if let Some(pin) = self.pin_mut(pin_id) {
            pin.is_connected = connected;
        }
    }

    // ------------------------------------------------------------------
    // Ordering and validation
    // ------------------------------------------------------------------

    /// Get nodes ordered so every link's source node precedes its target.
    ///
    /// Uses Kahn's algorithm with a LIFO work list; the order among nodes that
    /// become ready together is unspecified. Nodes on or behind a cycle never
    /// become ready and are left out, so the result is shorter than
    /// [`Graph::node_count`] exactly when the graph has a cycle.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> =
            self.nodes.keys().map(|&id| (id, 0)).collect();
        let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let owners: HashMap<PinId, NodeId> = self
            .nodes
            .values()
            .flat_map(|node| node.pins().map(move |pin| (pin.id, node.id)))
            .collect();

        for link in self.links.values() {
            let (Some(&start), Some(&end)) =
                (owners.get(&link.start_pin()), owners.get(&link.end_pin()))
            else {
                continue;
            };
            successors.entry(start).or_default().push(end);
            *in_degree.entry(end).or_default() += 1;
        }

        let mut ready: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(current) = ready.pop() {
            order.push(current);
            let Some(next) = successors.get(&current) else {
                continue;
            };
            for neighbor in next {
                if let Some(degree) = in_degree.get_mut(neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(*neighbor);
                    }
                }
            }
        }

        tracing::trace!(ordered = order.len(), total = self.nodes.len(), "topological order");
        order
    }

    /// Whether the links form at least one cycle
    pub fn has_cycle(&self) -> bool {
        self.topological_order().len() < self.nodes.len()
    }

    /// Get the full evaluation order, failing on cycles
    pub fn evaluation_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let order = self.topological_order();
        if order.len() < self.nodes.len() {
            return Err(CycleError {
                unordered: self.nodes.len() - order.len(),
            });
        }
        Ok(order)
    }

    /// Validate every node and check the graph for cycles.
    ///
    /// Node validation only updates each node's status; it never stops the
    /// remaining nodes from being checked.
    pub fn validate(&mut self) -> ValidationReport {
        let mut flagged = Vec::new();
        for node in self.nodes.values_mut() {
            if !node.validate() {
                flagged.push((node.id, node.status));
            }
        }

        let has_cycle = self.has_cycle();
        if has_cycle {
            tracing::warn!(graph = %self.name, "graph contains a cycle");
        }
        ValidationReport { has_cycle, flagged }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Whether the graph changed since the last [`Graph::clear_dirty`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the graph as changed
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the changed flag (e.g. after saving)
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Remove all nodes and links and restart ID allocation
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.next_node_id = FIRST_ID;
        self.next_pin_id = FIRST_ID;
        self.next_link_id = FIRST_ID;
        self.dirty = true;
    }
}

/// Hand out `*counter` and advance it; `None` once it cannot advance
fn next_id(counter: &mut i32) -> Option<i32> {
    let id = *counter;
    *counter = id.checked_add(1)?;
    Some(id)
}

/// Move `counter` past an ID that was assigned explicitly
fn bump_past(counter: &mut i32, id: i32) {
    if id >= *counter {
        *counter = id.saturating_add(1);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled", GraphDomain::None)
    }
}

/// Result of [`Graph::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// The links form at least one cycle
    pub has_cycle: bool,
    /// Nodes that reported a warning or an error
    pub flagged: Vec<(NodeId, NodeStatus)>,
}

impl ValidationReport {
    /// No cycle and no flagged node
    pub fn is_valid(&self) -> bool {
        !self.has_cycle && self.flagged.is_empty()
    }
}

/// Error when creating a link
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// Pin not found
    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    /// Both pins are inputs or both are outputs
    #[error("Pins must be one output and one input")]
    SameDirection,

    /// Both pins belong to the same node
    #[error("Cannot link a node to itself: {0}")]
    SameNode(NodeId),

    /// Data types don't match
    #[error("Incompatible pin types: {0} and {1}")]
    IncompatibleTypes(PinDataType, PinDataType),

    /// No link ID is left to allocate
    #[error("Link IDs exhausted")]
    IdsExhausted,
}

/// Error when the graph contains a cycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle ({unordered} nodes could not be ordered)")]
pub struct CycleError {
    /// Number of nodes left out of the order
    pub unordered: usize,
}

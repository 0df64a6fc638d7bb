// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type registration and construction.
//!
//! A [`NodeFactory`] maps stable type names to constructors. Editors use it to
//! populate creation menus, and the serializer uses it to rebuild nodes from
//! their persisted type names. Registration is explicit: the composing
//! application calls registration functions such as
//! [`register_common_nodes`](crate::nodes::register_common_nodes) once at
//! startup.

use crate::graph::{Graph, GraphDomain};
use crate::node::{Node, NodeBehavior, NodeMessage};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Closure building a fully initialized node inside a graph
pub type NodeConstructor = Arc<dyn Fn(&mut Graph) -> Node + Send + Sync>;

/// Registered node type
#[derive(Clone)]
pub struct NodeRegistration {
    /// Stable type name, e.g. `Common::Add`
    pub type_name: String,
    /// Name shown in menus and node headers
    pub display_name: String,
    /// Menu category, e.g. `Math/Trigonometry`
    pub category: String,
    /// Domain the type belongs to
    pub domain: GraphDomain,
    /// Header color stamped on created nodes
    pub header_color: [u8; 3],
    /// Optional tooltip
    pub tooltip: Option<String>,
    constructor: NodeConstructor,
}

impl NodeRegistration {
    /// Create a registration from a constructor closure.
    ///
    /// The closure must allocate the node's ID and its pin IDs from the graph.
    pub fn new(
        type_name: impl Into<String>,
        display_name: impl Into<String>,
        category: impl Into<String>,
        domain: GraphDomain,
        constructor: impl Fn(&mut Graph) -> Node + Send + Sync + 'static,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            display_name: display_name.into(),
            category: category.into(),
            domain,
            header_color: Node::DEFAULT_HEADER_COLOR,
            tooltip: None,
            constructor: Arc::new(constructor),
        }
    }

    /// Set the header color
    pub fn with_header_color(mut self, color: [u8; 3]) -> Self {
        self.header_color = color;
        self
    }

    /// Set the tooltip
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Build a new node inside `graph`
    pub fn construct(&self, graph: &mut Graph) -> Node {
        (self.constructor)(graph)
    }
}

impl fmt::Debug for NodeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistration")
            .field("type_name", &self.type_name)
            .field("display_name", &self.display_name)
            .field("category", &self.category)
            .field("domain", &self.domain)
            .field("header_color", &self.header_color)
            .field("tooltip", &self.tooltip)
            .finish_non_exhaustive()
    }
}

/// Stand-in behavior for nodes whose type is not registered
#[derive(Debug, Clone)]
pub struct MissingNodeType {
    /// The unresolved type name
    pub type_name: String,
}

impl NodeBehavior for MissingNodeType {
    fn init(&self, _node: &mut Node, _graph: &mut Graph) {}

    fn validate(&self, _node: &Node) -> NodeMessage {
        NodeMessage::error(format!("Unknown node type: {}", self.type_name))
    }
}

/// Registry of available node types
#[derive(Default)]
pub struct NodeFactory {
    /// Registered node types by type name
    registry: IndexMap<String, NodeRegistration>,
    /// Type names per domain, in registration order
    domain_index: HashMap<GraphDomain, Vec<String>>,
}

impl NodeFactory {
    /// Create a new empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide factory
    pub fn global() -> &'static RwLock<NodeFactory> {
        static GLOBAL: OnceLock<RwLock<NodeFactory>> = OnceLock::new();
        GLOBAL.get_or_init(|| RwLock::new(NodeFactory::new()))
    }

    /// Drop every registration from the process-wide factory
    pub fn reset_global() {
        *Self::global().write() = NodeFactory::new();
    }

    /// Register a node type. A registration with the same type name is replaced.
    pub fn register(&mut self, registration: NodeRegistration) {
        let type_name = registration.type_name.clone();
        let domain = registration.domain;

        if let Some(previous) = self.registry.insert(type_name.clone(), registration) {
            if let Some(names) = self.domain_index.get_mut(&previous.domain) {
                names.retain(|name| *name != type_name);
            }
        }

        tracing::trace!(%type_name, %domain, "node type registered");
        self.domain_index.entry(domain).or_default().push(type_name);
    }

    /// Register a node type driven by `behavior`.
    ///
    /// Created nodes get a fresh node ID, the registration's metadata, and
    /// pins declared by [`NodeBehavior::init`].
    pub fn register_node<B: NodeBehavior + 'static>(
        &mut self,
        type_name: &str,
        display_name: &str,
        category: &str,
        domain: GraphDomain,
        header_color: [u8; 3],
        tooltip: Option<&str>,
        behavior: B,
    ) {
        let behavior: Arc<dyn NodeBehavior> = Arc::new(behavior);
        let name = type_name.to_string();
        let display = display_name.to_string();
        let menu_category = category.to_string();
        let tip = tooltip.unwrap_or_default().to_string();

        let constructor = move |graph: &mut Graph| {
            let mut node = Node::with_behavior(name.clone(), Arc::clone(&behavior));
            node.id = graph.allocate_node_id();
            node.display_name = display.clone();
            node.category = menu_category.clone();
            node.tooltip = tip.clone();
            node.header_color = header_color;
            behavior.init(&mut node, graph);
            node
        };

        let mut registration =
            NodeRegistration::new(type_name, display_name, category, domain, constructor)
                .with_header_color(header_color);
        if let Some(tooltip) = tooltip {
            registration = registration.with_tooltip(tooltip);
        }
        self.register(registration);
    }

    /// Create a node of a registered type inside `graph`.
    ///
    /// Returns `None` for unknown type names. The node is not added to the
    /// graph; call [`Graph::add_node`] to place it.
    pub fn create_node(&self, type_name: &str, graph: &mut Graph) -> Option<Node> {
        let registration = self.registry.get(type_name)?;
        Some(registration.construct(graph))
    }

    /// Create a pinless node flagged with an error, standing in for a type
    /// that is not registered
    pub fn create_placeholder(type_name: &str) -> Node {
        let behavior = MissingNodeType {
            type_name: type_name.to_string(),
        };
        let mut node = Node::with_behavior(type_name, Arc::new(behavior));
        node.display_name = format!("{type_name} (Unknown)");
        node.validate();
        node
    }

    /// Whether a type name is registered
    pub fn has_type(&self, type_name: &str) -> bool {
        self.registry.contains_key(type_name)
    }

    /// Get a registration by type name
    pub fn registration(&self, type_name: &str) -> Option<&NodeRegistration> {
        self.registry.get(type_name)
    }

    /// Get all registrations, in registration order
    pub fn registrations(&self) -> impl Iterator<Item = &NodeRegistration> {
        self.registry.values()
    }

    /// Get the number of registered types
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Get the registrations of a domain, in registration order
    pub fn nodes_for_domain(&self, domain: GraphDomain) -> Vec<&NodeRegistration> {
        self.domain_index
            .get(&domain)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| self.registry.get(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the sorted, distinct categories of a domain
    pub fn categories_for_domain(&self, domain: GraphDomain) -> Vec<String> {
        let mut categories: Vec<String> = self
            .nodes_for_domain(domain)
            .into_iter()
            .map(|registration| registration.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Get the registrations of a domain within one category
    pub fn nodes_in_category(&self, domain: GraphDomain, category: &str) -> Vec<&NodeRegistration> {
        self.nodes_for_domain(domain)
            .into_iter()
            .filter(|registration| registration.category == category)
            .collect()
    }
}

impl fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeFactory")
            .field("types", &self.registry.keys().collect::<Vec<_>>())
            .finish()
    }
}

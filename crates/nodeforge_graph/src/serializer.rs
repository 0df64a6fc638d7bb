// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph persistence.
//!
//! Graphs are stored as a `NodeGraph` document in YAML (the canonical
//! `.nodegraph` format) or RON. Loading is best-effort per node: unknown node
//! types become error-flagged placeholders and links that no longer fit are
//! dropped, but a malformed document fails as a whole and leaves the
//! destination graph untouched.

use crate::factory::NodeFactory;
use crate::graph::{Graph, GraphDomain, GraphUuid};
use crate::link::LinkId;
use crate::node::{Node, NodeId};
use crate::pin::{Pin, PinDataType, PinId, PinValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// On-disk encoding of a graph document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphFormat {
    /// YAML, the canonical `.nodegraph` format
    #[default]
    Yaml,
    /// Rusty Object Notation
    Ron,
}

impl GraphFormat {
    /// Infer the format from a file extension; anything but `.ron` is YAML
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Yaml,
        }
    }
}

/// Error when saving or loading a graph
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML encoding or decoding failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// RON encoding failed
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// RON decoding failed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// The document has no `NodeGraph` root
    #[error("Document has no NodeGraph root")]
    MissingRoot,

    /// Two nodes share an ID
    #[error("Duplicate node ID: {0}")]
    DuplicateNodeId(NodeId),

    /// Two pins share an ID
    #[error("Duplicate pin ID: {0}")]
    DuplicatePinId(PinId),

    /// A stored ID is the invalid sentinel or leaves no room for new IDs
    #[error("ID out of range: {0}")]
    IdOutOfRange(i32),
}

// ----------------------------------------------------------------------
// Document model
// ----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphFile {
    #[serde(rename = "NodeGraph", default)]
    graph: Option<GraphDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GraphDocument {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(rename = "ID", default)]
    id: u64,
    #[serde(default)]
    nodes: Vec<NodeDocument>,
    #[serde(default)]
    links: Vec<LinkDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeDocument {
    #[serde(rename = "ID")]
    id: i32,
    #[serde(rename = "Type")]
    type_name: String,
    #[serde(default)]
    display: String,
    #[serde(default)]
    position: [f32; 2],
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    inputs: Vec<InputDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    outputs: Vec<OutputDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InputDocument {
    #[serde(rename = "ID")]
    id: i32,
    name: String,
    #[serde(rename = "Type", default)]
    data_type: String,
    #[serde(default)]
    value: Option<RawValue>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OutputDocument {
    #[serde(rename = "ID")]
    id: i32,
    name: String,
    #[serde(rename = "Type", default)]
    data_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LinkDocument {
    #[serde(rename = "ID")]
    id: i32,
    start_pin: i32,
    end_pin: i32,
}

/// A persisted value before the pin's data type gives it meaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    List(Vec<f32>),
    Text(String),
}

impl RawValue {
    fn from_pin_value(value: &PinValue) -> Option<Self> {
        let raw = match value {
            PinValue::None => return None,
            PinValue::Bool(v) => Self::Bool(*v),
            PinValue::Int(v) => Self::Int(i64::from(*v)),
            PinValue::Float(v) => Self::Float(*v),
            PinValue::String(s) => Self::Text(s.clone()),
            other => Self::List(other.components().map(<[f32]>::to_vec).unwrap_or_default()),
        };
        Some(raw)
    }

    /// Interpret as a value for a pin of `data_type`; `None` when the shapes
    /// don't agree
    fn into_pin_value(self, data_type: PinDataType) -> Option<PinValue> {
        use PinDataType as T;

        if matches!(&self, Self::Text(s) if s == "null") {
            return Some(PinValue::None);
        }
        let value = match (self, data_type) {
            (Self::Bool(v), T::Bool | T::Any) => PinValue::Bool(v),
            (Self::Int(v), T::Int | T::Any) => PinValue::Int(i32::try_from(v).ok()?),
            (Self::Int(v), T::Float) => PinValue::Float(v as f32),
            (Self::Float(v), T::Float | T::Any) => PinValue::Float(v),
            (Self::Text(s), T::String | T::Any) => PinValue::String(s),
            (Self::List(v), T::Vec2) => PinValue::Vec2(v.try_into().ok()?),
            (Self::List(v), T::Vec3 | T::Color3) => PinValue::Vec3(v.try_into().ok()?),
            (Self::List(v), T::Vec4 | T::Color4) => PinValue::Vec4(v.try_into().ok()?),
            (Self::List(v), T::Mat3) => PinValue::Mat3(v.try_into().ok()?),
            (Self::List(v), T::Mat4) => PinValue::Mat4(v.try_into().ok()?),
            (Self::List(v), T::Any) => match v.len() {
                2 => PinValue::Vec2(v.try_into().ok()?),
                3 => PinValue::Vec3(v.try_into().ok()?),
                4 => PinValue::Vec4(v.try_into().ok()?),
                9 => PinValue::Mat3(v.try_into().ok()?),
                16 => PinValue::Mat4(v.try_into().ok()?),
                _ => return None,
            },
            _ => return None,
        };
        Some(value)
    }
}

// ----------------------------------------------------------------------
// Serializer
// ----------------------------------------------------------------------

/// Saves and loads graphs, rebuilding nodes through a [`NodeFactory`]
#[derive(Debug, Clone, Copy)]
pub struct GraphSerializer<'a> {
    factory: &'a NodeFactory,
    format: GraphFormat,
}

impl<'a> GraphSerializer<'a> {
    /// Create a YAML serializer
    pub fn new(factory: &'a NodeFactory) -> Self {
        Self {
            factory,
            format: GraphFormat::Yaml,
        }
    }

    /// Use `format` for the string entry points
    pub fn with_format(mut self, format: GraphFormat) -> Self {
        self.format = format;
        self
    }

    /// Format used by the string entry points
    pub fn format(&self) -> GraphFormat {
        self.format
    }

    /// Encode a graph
    pub fn save_to_string(&self, graph: &Graph) -> Result<String, SerializeError> {
        let file = GraphFile {
            graph: Some(Self::document(graph)),
        };
        let text = match self.format {
            GraphFormat::Yaml => serde_yaml::to_string(&file)?,
            GraphFormat::Ron => ron::ser::to_string_pretty(&file, ron::ser::PrettyConfig::default())?,
        };
        Ok(text)
    }

    /// Write a graph to disk, choosing the format from the extension
    pub fn save_to_file(&self, graph: &Graph, path: impl AsRef<Path>) -> Result<(), SerializeError> {
        let path = path.as_ref();
        let text = self.with_format(GraphFormat::from_path(path)).save_to_string(graph)?;
        std::fs::write(path, text)?;
        tracing::debug!(graph = %graph.name(), path = %path.display(), "graph saved");
        Ok(())
    }

    /// Decode a document into `graph`.
    ///
    /// On error `graph` is left exactly as it was.
    pub fn load_from_string(&self, graph: &mut Graph, text: &str) -> Result<(), SerializeError> {
        *graph = self.parse(text)?;
        Ok(())
    }

    /// Read a graph from disk, choosing the format from the extension.
    ///
    /// On error `graph` is left exactly as it was.
    pub fn load_from_file(&self, graph: &mut Graph, path: impl AsRef<Path>) -> Result<(), SerializeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        self.with_format(GraphFormat::from_path(path))
            .load_from_string(graph, &text)?;
        tracing::debug!(graph = %graph.name(), path = %path.display(), "graph loaded");
        Ok(())
    }

    /// Decode a document into a new graph
    pub fn parse(&self, text: &str) -> Result<Graph, SerializeError> {
        let file: GraphFile = match self.format {
            GraphFormat::Yaml => serde_yaml::from_str(text)?,
            GraphFormat::Ron => ron::from_str(text)?,
        };
        let document = file.graph.ok_or(SerializeError::MissingRoot)?;
        self.build(document)
    }

    fn document(graph: &Graph) -> GraphDocument {
        let nodes = graph
            .nodes()
            .map(|node| NodeDocument {
                id: node.id.0,
                type_name: node.type_name.clone(),
                display: node.display_name.clone(),
                position: node.position,
                inputs: node
                    .inputs
                    .iter()
                    .map(|pin| InputDocument {
                        id: pin.id.0,
                        name: pin.name.clone(),
                        data_type: pin.data_type().name().to_string(),
                        value: RawValue::from_pin_value(pin.default_value()),
                    })
                    .collect(),
                outputs: node
                    .outputs
                    .iter()
                    .map(|pin| OutputDocument {
                        id: pin.id.0,
                        name: pin.name.clone(),
                        data_type: pin.data_type().name().to_string(),
                    })
                    .collect(),
            })
            .collect();

        let links = graph
            .links()
            .map(|link| LinkDocument {
                id: link.id().0,
                start_pin: link.start_pin().0,
                end_pin: link.end_pin().0,
            })
            .collect();

        GraphDocument {
            name: graph.name().to_string(),
            domain: (graph.domain() != GraphDomain::None).then(|| graph.domain().name().to_string()),
            id: graph.uuid().0,
            nodes,
            links,
        }
    }

    fn build(&self, document: GraphDocument) -> Result<Graph, SerializeError> {
        let domain = match document.domain.as_deref() {
            None => GraphDomain::None,
            Some(name) => GraphDomain::from_name(name).unwrap_or_else(|| {
                tracing::warn!(domain = name, "unknown graph domain, using None");
                GraphDomain::None
            }),
        };
        let mut graph = Graph::new(document.name, domain);
        graph.set_uuid(GraphUuid(document.id));

        // Fresh pins of newer node layouts must never collide with stored IDs
        let max_node = document.nodes.iter().map(|n| n.id).max().unwrap_or(0);
        let max_pin = document
            .nodes
            .iter()
            .flat_map(|n| n.inputs.iter().map(|p| p.id).chain(n.outputs.iter().map(|p| p.id)))
            .max()
            .unwrap_or(0);
        let max_link = document.links.iter().map(|l| l.id).max().unwrap_or(0);
        graph.set_next_node_id(successor(max_node)?);
        graph.set_next_pin_id(successor(max_pin)?);
        graph.set_next_link_id(successor(max_link)?);

        let mut seen_pins = HashSet::new();
        for node_doc in document.nodes {
            let node_id = NodeId(node_doc.id);
            if graph.node(node_id).is_some() {
                return Err(SerializeError::DuplicateNodeId(node_id));
            }
            for pin_id in node_doc
                .inputs
                .iter()
                .map(|p| p.id)
                .chain(node_doc.outputs.iter().map(|p| p.id))
            {
                if !PinId(pin_id).is_valid() {
                    return Err(SerializeError::IdOutOfRange(pin_id));
                }
                if !seen_pins.insert(pin_id) {
                    return Err(SerializeError::DuplicatePinId(PinId(pin_id)));
                }
            }

            let mut node = match self.factory.create_node(&node_doc.type_name, &mut graph) {
                Some(node) => node,
                None => {
                    tracing::warn!(node = %node_id, type_name = %node_doc.type_name, "unknown node type, substituting placeholder");
                    Self::placeholder(&node_doc, &mut graph)
                }
            };
            node.id = node_id;
            if !node_doc.display.is_empty() {
                node.display_name = node_doc.display;
            }
            node.position = node_doc.position;

            restore_inputs(&mut node, node_doc.inputs);
            restore_outputs(&mut node, node_doc.outputs);
            if !graph.add_node(node).is_valid() {
                return Err(SerializeError::IdOutOfRange(node_id.0));
            }
        }

        for link_doc in document.links {
            let (start, end) = (PinId(link_doc.start_pin), PinId(link_doc.end_pin));
            if let Err(err) = graph.restore_link(LinkId(link_doc.id), start, end) {
                tracing::warn!(link = link_doc.id, %start, %end, "dropping link: {err}");
            }
        }

        let report = graph.validate();
        if report.has_cycle {
            tracing::warn!(graph = %graph.name(), "loaded graph contains a cycle");
        }
        graph.clear_dirty();
        Ok(graph)
    }

    /// Stand-in for an unregistered type, with the document's pin layout
    fn placeholder(node_doc: &NodeDocument, graph: &mut Graph) -> Node {
        let mut node = NodeFactory::create_placeholder(&node_doc.type_name);
        for input in &node_doc.inputs {
            let data_type = parse_data_type(&input.data_type);
            node.add_input(graph.allocate_pin_id(), input.name.as_str(), data_type, PinValue::None);
        }
        for output in &node_doc.outputs {
            let data_type = parse_data_type(&output.data_type);
            node.add_output(graph.allocate_pin_id(), output.name.as_str(), data_type);
        }
        node
    }
}

/// First counter value above every stored ID
fn successor(max: i32) -> Result<i32, SerializeError> {
    max.max(0)
        .checked_add(1)
        .ok_or(SerializeError::IdOutOfRange(max))
}

fn parse_data_type(name: &str) -> PinDataType {
    name.parse().unwrap_or_else(|err| {
        tracing::warn!("{err}, using None");
        PinDataType::None
    })
}

/// Find the first pin named `name` that has not been restored yet
fn claim<'p>(pins: &'p mut [Pin], claimed: &mut [bool], name: &str) -> Option<&'p mut Pin> {
    let index = pins
        .iter()
        .enumerate()
        .position(|(i, pin)| !claimed[i] && pin.name == name)?;
    claimed[index] = true;
    pins.get_mut(index)
}

fn restore_inputs(node: &mut Node, inputs: Vec<InputDocument>) {
    let mut claimed = vec![false; node.inputs.len()];
    for input in inputs {
        let Some(pin) = claim(&mut node.inputs, &mut claimed, &input.name) else {
            tracing::warn!(node = %node.id, pin = %input.name, "serialized input no longer exists");
            continue;
        };
        pin.id = PinId(input.id);

        let data_type = pin.data_type();
        let value = match input.value {
            None => PinValue::None,
            Some(raw) => raw.into_pin_value(data_type).unwrap_or_else(|| {
                tracing::warn!(pin = %input.name, %data_type, "stored value does not fit pin type");
                PinValue::None
            }),
        };
        if let Err(err) = pin.set_default_value(value) {
            tracing::warn!(pin = %input.name, "{err}");
        }
    }
}

fn restore_outputs(node: &mut Node, outputs: Vec<OutputDocument>) {
    let mut claimed = vec![false; node.outputs.len()];
    for output in outputs {
        match claim(&mut node.outputs, &mut claimed, &output.name) {
            Some(pin) => pin.id = PinId(output.id),
            None => {
                tracing::warn!(node = %node.id, pin = %output.name, "serialized output no longer exists");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeStatus;
    use crate::nodes::common::{register_common_nodes, VALUE_PIN};

    fn factory() -> NodeFactory {
        let mut factory = NodeFactory::new();
        register_common_nodes(&mut factory);
        factory
    }

    /// Constant float feeding `Add.B`
    fn sample(factory: &NodeFactory) -> Graph {
        let mut graph = Graph::new("Sample", GraphDomain::Shader);
        let constant = factory.create_node("Common::ConstFloat", &mut graph).unwrap();
        let constant = graph.add_node(constant.with_position(10.0, 20.0));
        let add = factory.create_node("Common::Add", &mut graph).unwrap();
        let add = graph.add_node(add);

        let value = graph.node(constant).unwrap().input_by_name(VALUE_PIN).unwrap().id;
        graph
            .find_pin_mut(value)
            .unwrap()
            .set_default_value(PinValue::Float(2.5))
            .unwrap();
        let out = graph.node(constant).unwrap().outputs[0].id;
        let b = graph.node(add).unwrap().inputs[1].id;
        graph.add_link(out, b).unwrap();
        graph
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(GraphFormat::from_path("a/b.nodegraph"), GraphFormat::Yaml);
        assert_eq!(GraphFormat::from_path("b.RON"), GraphFormat::Ron);
        assert_eq!(GraphFormat::from_path("noext"), GraphFormat::Yaml);
    }

    #[test]
    fn test_yaml_shape() {
        let factory = factory();
        let graph = sample(&factory);
        let text = GraphSerializer::new(&factory).save_to_string(&graph).unwrap();

        assert!(text.starts_with("NodeGraph:"));
        assert!(text.contains("Domain: Shader"));
        assert!(text.contains("Common::ConstFloat"));
        assert!(text.contains("StartPin:"));
        assert!(text.contains("Value: 2.5"));
    }

    #[test]
    fn test_domain_none_is_omitted() {
        let factory = factory();
        let graph = Graph::new("Plain", GraphDomain::None);
        let text = GraphSerializer::new(&factory).save_to_string(&graph).unwrap();
        assert!(!text.contains("Domain"));
    }

    #[test]
    fn test_round_trip_preserves_ids_and_values() {
        let factory = factory();
        let graph = sample(&factory);
        let serializer = GraphSerializer::new(&factory);
        let text = serializer.save_to_string(&graph).unwrap();

        let loaded = serializer.parse(&text).unwrap();
        assert_eq!(loaded.name(), "Sample");
        assert_eq!(loaded.domain(), GraphDomain::Shader);
        assert_eq!(loaded.uuid(), graph.uuid());
        assert_eq!(loaded.node_ids().collect::<Vec<_>>(), graph.node_ids().collect::<Vec<_>>());
        assert_eq!(loaded.link_count(), 1);
        assert!(!loaded.is_dirty());

        for node in graph.nodes() {
            let other = loaded.node(node.id).unwrap();
            assert_eq!(other.position, node.position);
            for (a, b) in node.pins().zip(other.pins()) {
                assert_eq!(a.id, b.id);
                assert_eq!(a.default_value(), b.default_value());
                assert_eq!(a.is_connected(), b.is_connected());
            }
        }
    }

    #[test]
    fn test_counters_advance_past_loaded_ids() {
        let factory = factory();
        let serializer = GraphSerializer::new(&factory);
        let text = serializer.save_to_string(&sample(&factory)).unwrap();
        let mut loaded = serializer.parse(&text).unwrap();

        let max_pin = loaded.nodes().flat_map(|n| n.pins()).map(|p| p.id.0).max().unwrap();
        let max_node = loaded.node_ids().map(|id| id.0).max().unwrap();
        assert!(loaded.allocate_pin_id().0 > max_pin);
        assert!(loaded.allocate_node_id().0 > max_node);
    }

    #[test]
    fn test_maximum_ids_rejected() {
        let node = "\
NodeGraph:
  Name: Big
  Nodes:
    - ID: 2147483647
      Type: Common::Time
";
        let pin = "\
NodeGraph:
  Name: Big
  Nodes:
    - ID: 1
      Type: Common::Abs
      Outputs:
        - ID: 2147483647
          Name: Result
          Type: Float
";
        let link = "\
NodeGraph:
  Name: Big
  Links:
    - ID: 2147483647
      StartPin: 1
      EndPin: 2
";
        let factory = factory();
        let serializer = GraphSerializer::new(&factory);
        for text in [node, pin, link] {
            assert!(matches!(
                serializer.parse(text),
                Err(SerializeError::IdOutOfRange(i32::MAX))
            ));
        }
    }

    #[test]
    fn test_near_maximum_id_loads() {
        let text = "\
NodeGraph:
  Name: Edge
  Nodes:
    - ID: 2147483646
      Type: Common::Time
";
        let factory = factory();
        let mut graph = GraphSerializer::new(&factory).parse(text).unwrap();
        assert!(graph.node(NodeId(i32::MAX - 1)).is_some());
        assert_eq!(graph.allocate_node_id(), NodeId::INVALID);
    }

    #[test]
    fn test_invalid_pin_id_rejected() {
        let text = "\
NodeGraph:
  Name: Sentinel
  Nodes:
    - ID: 1
      Type: Common::Abs
      Outputs:
        - ID: -1
          Name: Result
          Type: Float
";
        let factory = factory();
        assert!(matches!(
            GraphSerializer::new(&factory).parse(text),
            Err(SerializeError::IdOutOfRange(-1))
        ));
    }

    #[test]
    fn test_cyclic_document_still_loads() {
        let factory = factory();
        let mut graph = Graph::default();
        let a = factory.create_node("Common::Abs", &mut graph).unwrap();
        let a = graph.add_node(a);
        let b = factory.create_node("Common::Abs", &mut graph).unwrap();
        let b = graph.add_node(b);
        for (from, to) in [(a, b), (b, a)] {
            let out = graph.node(from).unwrap().outputs[0].id;
            let input = graph.node(to).unwrap().inputs[0].id;
            graph.add_link(out, input).unwrap();
        }

        let serializer = GraphSerializer::new(&factory);
        let loaded = serializer.parse(&serializer.save_to_string(&graph).unwrap()).unwrap();
        assert_eq!(loaded.link_count(), 2);
        assert!(loaded.has_cycle());
    }

    #[test]
    fn test_null_values() {
        let text = "\
NodeGraph:
  Name: Nulls
  ID: 7
  Nodes:
    - ID: 1
      Type: Common::Add
      Inputs:
        - ID: 1
          Name: A
          Type: Float
          Value: null
        - ID: 2
          Name: B
          Type: Float
          Value: \"null\"
      Outputs:
        - ID: 3
          Name: Result
          Type: Float
";
        let factory = factory();
        let graph = GraphSerializer::new(&factory).parse(text).unwrap();
        let node = graph.node(NodeId(1)).unwrap();
        assert!(node.inputs.iter().all(|p| p.default_value().is_none()));
        assert_eq!(graph.uuid(), GraphUuid(7));
    }

    #[test]
    fn test_inputs_restored_by_name() {
        let text = "\
NodeGraph:
  Name: Reordered
  ID: 1
  Nodes:
    - ID: 4
      Type: Common::Lerp
      Inputs:
        - ID: 10
          Name: T
          Type: Float
          Value: 0.25
        - ID: 11
          Name: Gone
          Type: Float
          Value: 9.0
        - ID: 12
          Name: A
          Type: Float
          Value: 3
";
        let factory = factory();
        let graph = GraphSerializer::new(&factory).parse(text).unwrap();
        let node = graph.node(NodeId(4)).unwrap();

        let t = node.input_by_name("T").unwrap();
        assert_eq!(t.id, PinId(10));
        assert_eq!(t.default_value(), &PinValue::Float(0.25));
        assert_eq!(node.input_by_name("A").unwrap().default_value(), &PinValue::Float(3.0));
        // B was not stored: keeps its constructed default and a fresh ID
        let b = node.input_by_name("B").unwrap();
        assert_eq!(b.default_value(), &PinValue::Float(1.0));
        assert!(b.id.0 > 12);
        assert!(graph.find_pin(PinId(11)).is_none());
    }

    #[test]
    fn test_unknown_type_becomes_placeholder() {
        let text = "\
NodeGraph:
  Name: Legacy
  ID: 2
  Nodes:
    - ID: 1
      Type: Retired::Thing
      Display: Thing
      Inputs:
        - ID: 1
          Name: In
          Type: Vec3
          Value: [1.0, 2.0, 3.0]
      Outputs:
        - ID: 2
          Name: Out
          Type: Float
    - ID: 2
      Type: Common::Abs
      Inputs:
        - ID: 3
          Name: Value
          Type: Float
          Value: 0.0
      Outputs:
        - ID: 4
          Name: Result
          Type: Float
  Links:
    - ID: 1
      StartPin: 2
      EndPin: 3
";
        let factory = factory();
        let serializer = GraphSerializer::new(&factory);
        let graph = serializer.parse(text).unwrap();

        let placeholder = graph.node(NodeId(1)).unwrap();
        assert_eq!(placeholder.status, NodeStatus::Error);
        assert_eq!(placeholder.status_message, "Unknown node type: Retired::Thing");
        assert_eq!(placeholder.display_name, "Thing");
        assert_eq!(
            placeholder.inputs[0].default_value(),
            &PinValue::Vec3([1.0, 2.0, 3.0])
        );
        assert_eq!(graph.link_count(), 1);

        // Survives another save/load cycle
        let again = serializer.parse(&serializer.save_to_string(&graph).unwrap()).unwrap();
        assert_eq!(again.node(NodeId(1)).unwrap().type_name, "Retired::Thing");
        assert_eq!(again.link_count(), 1);
    }

    #[test]
    fn test_invalid_link_is_dropped() {
        let text = "\
NodeGraph:
  Name: Broken
  ID: 3
  Nodes:
    - ID: 1
      Type: Common::Abs
      Inputs:
        - ID: 1
          Name: Value
          Type: Float
          Value: 0.0
      Outputs:
        - ID: 2
          Name: Result
          Type: Float
  Links:
    - ID: 5
      StartPin: 2
      EndPin: 1
    - ID: 6
      StartPin: 2
      EndPin: 99
";
        let factory = factory();
        let graph = GraphSerializer::new(&factory).parse(text).unwrap();
        assert_eq!(graph.link_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_failed_load_keeps_graph() {
        let factory = factory();
        let serializer = GraphSerializer::new(&factory);
        let mut graph = sample(&factory);
        let before = serializer.save_to_string(&graph).unwrap();

        assert!(matches!(
            serializer.load_from_string(&mut graph, "Nodes: [unclosed"),
            Err(SerializeError::Yaml(_))
        ));
        assert!(matches!(
            serializer.load_from_string(&mut graph, "Something: 1\n"),
            Err(SerializeError::MissingRoot)
        ));
        assert_eq!(serializer.save_to_string(&graph).unwrap(), before);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let nodes = "\
NodeGraph:
  Name: Dup
  Nodes:
    - ID: 1
      Type: Common::Time
    - ID: 1
      Type: Common::Time
";
        let pins = "\
NodeGraph:
  Name: Dup
  Nodes:
    - ID: 1
      Type: Common::Abs
      Inputs:
        - ID: 4
          Name: Value
          Type: Float
      Outputs:
        - ID: 4
          Name: Result
          Type: Float
";
        let factory = factory();
        let serializer = GraphSerializer::new(&factory);
        assert!(matches!(
            serializer.parse(nodes),
            Err(SerializeError::DuplicateNodeId(NodeId(1)))
        ));
        assert!(matches!(
            serializer.parse(pins),
            Err(SerializeError::DuplicatePinId(PinId(4)))
        ));
    }

    #[test]
    fn test_ron_round_trip() {
        let factory = factory();
        let graph = sample(&factory);
        let serializer = GraphSerializer::new(&factory).with_format(GraphFormat::Ron);
        let text = serializer.save_to_string(&graph).unwrap();

        let mut loaded = Graph::default();
        serializer.load_from_string(&mut loaded, &text).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.link_count(), 1);
        assert_eq!(loaded.domain(), GraphDomain::Shader);
    }

    #[test]
    fn test_raw_value_conversion() {
        assert_eq!(
            RawValue::Int(4).into_pin_value(PinDataType::Float),
            Some(PinValue::Float(4.0))
        );
        assert_eq!(RawValue::Float(1.5).into_pin_value(PinDataType::Int), None);
        assert_eq!(
            RawValue::List(vec![0.5; 4]).into_pin_value(PinDataType::Color4),
            Some(PinValue::Vec4([0.5; 4]))
        );
        assert_eq!(RawValue::List(vec![0.0; 3]).into_pin_value(PinDataType::Vec2), None);
        assert_eq!(
            RawValue::Text("null".into()).into_pin_value(PinDataType::String),
            Some(PinValue::None)
        );
        assert_eq!(
            RawValue::List(vec![0.0; 9]).into_pin_value(PinDataType::Any),
            Some(PinValue::Mat3([0.0; 9]))
        );
    }
}

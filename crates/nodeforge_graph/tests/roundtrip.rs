// SPDX-License-Identifier: MIT OR Apache-2.0
//! File round trips through the process-wide factory.

use nodeforge_graph::nodes::register_common_nodes;
use nodeforge_graph::{
    EvaluationPlan, Graph, GraphDomain, GraphFormat, GraphSerializer, GraphUuid, InputSource,
    NodeFactory, NodeStatus, PinValue, SerializeError,
};
use std::path::PathBuf;

fn temp_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("nodeforge-{}.{extension}", GraphUuid::new().0))
}

/// Time -> Sin -> Multiply.A, constant 3.0 -> Multiply.B
fn build(factory: &NodeFactory) -> Graph {
    let mut graph = Graph::new("Wave", GraphDomain::Particle);
    let place = |graph: &mut Graph, type_name: &str| {
        let node = factory.create_node(type_name, graph).unwrap();
        graph.add_node(node)
    };
    let time = place(&mut graph, "Common::Time");
    let sin = place(&mut graph, "Common::Sin");
    let constant = place(&mut graph, "Common::ConstFloat");
    let multiply = place(&mut graph, "Common::Multiply");

    let pin = |graph: &Graph, node, output: bool, index: usize| {
        let node = graph.node(node).unwrap();
        if output {
            node.outputs[index].id
        } else {
            node.inputs[index].id
        }
    };

    let value = pin(&graph, constant, false, 0);
    graph
        .find_pin_mut(value)
        .unwrap()
        .set_default_value(PinValue::Float(3.0))
        .unwrap();

    let links = [
        (pin(&graph, time, true, 0), pin(&graph, sin, false, 0)),
        (pin(&graph, sin, true, 0), pin(&graph, multiply, false, 0)),
        (pin(&graph, constant, true, 0), pin(&graph, multiply, false, 1)),
    ];
    for (out, input) in links {
        graph.add_link(out, input).unwrap();
    }
    graph
}

#[test]
fn yaml_and_ron_files_round_trip() {
    {
        let mut factory = NodeFactory::global().write();
        if !factory.has_type("Common::Add") {
            register_common_nodes(&mut factory);
        }
    }
    let factory = NodeFactory::global().read();
    let serializer = GraphSerializer::new(&factory);
    let graph = build(&factory);

    for extension in ["nodegraph", "ron"] {
        let path = temp_path(extension);
        serializer.save_to_file(&graph, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        if GraphFormat::from_path(&path) == GraphFormat::Yaml {
            assert!(text.starts_with("NodeGraph:"));
        }

        let mut loaded = Graph::default();
        serializer.load_from_file(&mut loaded, &path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.name(), "Wave");
        assert_eq!(loaded.domain(), GraphDomain::Particle);
        assert_eq!(loaded.node_count(), 4);
        assert_eq!(loaded.link_count(), 3);
        assert!(loaded.validate().is_valid());
        assert!(loaded.nodes().all(|n| n.status == NodeStatus::Valid));

        let plan = EvaluationPlan::build(&loaded).unwrap();
        let order: Vec<_> = plan.order().collect();
        let saved: Vec<_> = graph.node_ids().collect();
        let index = |id| order.iter().position(|&n| n == id).unwrap();
        assert!(index(saved[0]) < index(saved[1]));
        assert!(index(saved[1]) < index(saved[3]));
        assert!(index(saved[2]) < index(saved[3]));

        let value_pin = loaded.node(saved[2]).unwrap().inputs[0].id;
        assert_eq!(
            plan.source(value_pin),
            Some(&InputSource::Default(PinValue::Float(3.0)))
        );
    }
}

#[test]
fn unknown_types_survive_a_round_trip() {
    let mut factory = NodeFactory::new();
    register_common_nodes(&mut factory);
    let graph = build(&factory);
    let text = GraphSerializer::new(&factory).save_to_string(&graph).unwrap();

    // Reload without the catalog: every node becomes a placeholder
    let empty = NodeFactory::new();
    let serializer = GraphSerializer::new(&empty);
    let mut loaded = Graph::default();
    serializer.load_from_string(&mut loaded, &text).unwrap();

    assert_eq!(loaded.node_count(), 4);
    assert_eq!(loaded.link_count(), 3);
    let report = loaded.validate();
    assert_eq!(report.flagged.len(), 4);
    assert!(report.flagged.iter().all(|(_, status)| *status == NodeStatus::Error));

    // Saving the placeholders again yields a document the full catalog reads
    let text = serializer.save_to_string(&loaded).unwrap();
    let restored = GraphSerializer::new(&factory).parse(&text).unwrap();
    assert!(restored.clone().validate().is_valid());
    assert_eq!(restored.link_count(), 3);
    for node in graph.nodes() {
        let other = restored.node(node.id).unwrap();
        assert_eq!(other.display_name, node.display_name);
        for (a, b) in node.pins().zip(other.pins()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.default_value(), b.default_value());
        }
    }
}

#[test]
fn missing_file_leaves_graph_untouched() {
    let factory = NodeFactory::new();
    let serializer = GraphSerializer::new(&factory);
    let mut graph = Graph::new("Kept", GraphDomain::Audio);

    let result = serializer.load_from_file(&mut graph, temp_path("nodegraph"));
    assert!(matches!(result, Err(SerializeError::Io(_))));
    assert_eq!(graph.name(), "Kept");
    assert_eq!(graph.domain(), GraphDomain::Audio);
}

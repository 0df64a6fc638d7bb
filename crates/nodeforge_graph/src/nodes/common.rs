// SPDX-License-Identifier: MIT OR Apache-2.0
//! Domain-agnostic math, vector and utility nodes.
//!
//! These are registered under [`GraphDomain::None`], which editors treat as
//! available in every domain.

use crate::factory::NodeFactory;
use crate::graph::{Graph, GraphDomain};
use crate::node::{Node, NodeBehavior, NodeFlags, NodeMessage};
use crate::pin::{PinDataType, PinValue};

const MATH_COLOR: [u8; 3] = [60, 120, 60];
const VECTOR_COLOR: [u8; 3] = [60, 60, 120];
const CONSTANT_COLOR: [u8; 3] = [100, 60, 60];
const UTILITY_COLOR: [u8; 3] = [100, 100, 60];
const COMMENT_COLOR: [u8; 3] = [80, 80, 80];

/// Name of the hidden input holding a constant node's value
pub const VALUE_PIN: &str = "##value";
/// Name of the hidden input holding a comment's text
pub const TEXT_PIN: &str = "##text";

/// Built-in node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommonNode {
    /// `A + B`
    Add,
    /// `A - B`
    Subtract,
    /// `A * B`
    Multiply,
    /// `A / B`
    Divide,
    /// Dot product of two 3D vectors
    DotProduct,
    /// Cross product of two 3D vectors
    CrossProduct,
    /// Unit-length 3D vector
    Normalize,
    /// Linear interpolation
    Lerp,
    /// Clamp into `[Min, Max]`
    Clamp,
    /// Absolute value
    Abs,
    /// `Base ^ Exponent`
    Power,
    /// Sine
    Sin,
    /// Cosine
    Cos,
    /// Build a 2D vector
    MakeVec2,
    /// Build a 3D vector
    MakeVec3,
    /// Build a 4D vector
    MakeVec4,
    /// Split a 3D vector into components
    SplitVec3,
    /// Split a 4D vector into components
    SplitVec4,
    /// Constant float
    ConstFloat,
    /// Constant 3D vector
    ConstVec3,
    /// Constant RGBA color
    ConstColor,
    /// Elapsed and frame time
    Time,
    /// Free-text annotation
    Comment,
}

impl CommonNode {
    /// Every built-in node type
    pub const ALL: [CommonNode; 23] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::DotProduct,
        Self::CrossProduct,
        Self::Normalize,
        Self::Lerp,
        Self::Clamp,
        Self::Abs,
        Self::Power,
        Self::Sin,
        Self::Cos,
        Self::MakeVec2,
        Self::MakeVec3,
        Self::MakeVec4,
        Self::SplitVec3,
        Self::SplitVec4,
        Self::ConstFloat,
        Self::ConstVec3,
        Self::ConstColor,
        Self::Time,
        Self::Comment,
    ];

    /// Registered type name
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Add => "Common::Add",
            Self::Subtract => "Common::Subtract",
            Self::Multiply => "Common::Multiply",
            Self::Divide => "Common::Divide",
            Self::DotProduct => "Common::DotProduct",
            Self::CrossProduct => "Common::CrossProduct",
            Self::Normalize => "Common::Normalize",
            Self::Lerp => "Common::Lerp",
            Self::Clamp => "Common::Clamp",
            Self::Abs => "Common::Abs",
            Self::Power => "Common::Power",
            Self::Sin => "Common::Sin",
            Self::Cos => "Common::Cos",
            Self::MakeVec2 => "Common::MakeVec2",
            Self::MakeVec3 => "Common::MakeVec3",
            Self::MakeVec4 => "Common::MakeVec4",
            Self::SplitVec3 => "Common::SplitVec3",
            Self::SplitVec4 => "Common::SplitVec4",
            Self::ConstFloat => "Common::ConstFloat",
            Self::ConstVec3 => "Common::ConstVec3",
            Self::ConstColor => "Common::ConstColor",
            Self::Time => "Common::Time",
            Self::Comment => "Common::Comment",
        }
    }

    /// Name shown in menus and node headers
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
            Self::DotProduct => "Dot Product",
            Self::CrossProduct => "Cross Product",
            Self::Normalize => "Normalize",
            Self::Lerp => "Lerp",
            Self::Clamp => "Clamp",
            Self::Abs => "Abs",
            Self::Power => "Power",
            Self::Sin => "Sin",
            Self::Cos => "Cos",
            Self::MakeVec2 => "Make Vec2",
            Self::MakeVec3 => "Make Vec3",
            Self::MakeVec4 => "Make Vec4",
            Self::SplitVec3 => "Split Vec3",
            Self::SplitVec4 => "Split Vec4",
            Self::ConstFloat => "Float",
            Self::ConstVec3 => "Vec3",
            Self::ConstColor => "Color",
            Self::Time => "Time",
            Self::Comment => "Comment",
        }
    }

    /// Menu category
    pub fn category(self) -> &'static str {
        match self {
            Self::Sin | Self::Cos => "Math/Trigonometry",
            Self::MakeVec2 | Self::MakeVec3 | Self::MakeVec4 | Self::SplitVec3 | Self::SplitVec4 => {
                "Vector"
            }
            Self::ConstFloat | Self::ConstVec3 | Self::ConstColor => "Constants",
            Self::Time | Self::Comment => "Utility",
            _ => "Math",
        }
    }

    /// Header color
    pub fn header_color(self) -> [u8; 3] {
        match self {
            Self::MakeVec2 | Self::MakeVec3 | Self::MakeVec4 | Self::SplitVec3 | Self::SplitVec4 => {
                VECTOR_COLOR
            }
            Self::ConstFloat | Self::ConstVec3 | Self::ConstColor => CONSTANT_COLOR,
            Self::Time => UTILITY_COLOR,
            Self::Comment => COMMENT_COLOR,
            _ => MATH_COLOR,
        }
    }
}

fn inputs(node: &mut Node, graph: &mut Graph, pins: &[(&str, PinDataType, PinValue)]) {
    for (name, data_type, value) in pins {
        node.add_input(graph.allocate_pin_id(), *name, *data_type, value.clone());
    }
}

fn outputs(node: &mut Node, graph: &mut Graph, pins: &[(&str, PinDataType)]) {
    for (name, data_type) in pins {
        node.add_output(graph.allocate_pin_id(), *name, *data_type);
    }
}

fn floats(node: &mut Node, graph: &mut Graph, pins: &[(&str, f32)]) {
    for (name, value) in pins {
        node.add_input(graph.allocate_pin_id(), *name, PinDataType::Float, *value);
    }
}

fn result(node: &mut Node, graph: &mut Graph, data_type: PinDataType) {
    node.add_output(graph.allocate_pin_id(), "Result", data_type);
}

impl NodeBehavior for CommonNode {
    fn init(&self, node: &mut Node, graph: &mut Graph) {
        use PinDataType::{Color4, Float, Vec2, Vec3, Vec4};

        match self {
            Self::Add | Self::Subtract => {
                floats(node, graph, &[("A", 0.0), ("B", 0.0)]);
                result(node, graph, Float);
            }
            Self::Multiply | Self::Divide => {
                floats(node, graph, &[("A", 1.0), ("B", 1.0)]);
                result(node, graph, Float);
            }
            Self::DotProduct | Self::CrossProduct => {
                let zero = PinValue::Vec3([0.0; 3]);
                inputs(node, graph, &[("A", Vec3, zero.clone()), ("B", Vec3, zero)]);
                let ty = if *self == Self::DotProduct { Float } else { Vec3 };
                result(node, graph, ty);
            }
            Self::Normalize => {
                inputs(node, graph, &[("Vector", Vec3, PinValue::Vec3([0.0, 1.0, 0.0]))]);
                result(node, graph, Vec3);
            }
            Self::Lerp => {
                floats(node, graph, &[("A", 0.0), ("B", 1.0), ("T", 0.5)]);
                result(node, graph, Float);
            }
            Self::Clamp => {
                floats(node, graph, &[("Value", 0.0), ("Min", 0.0), ("Max", 1.0)]);
                result(node, graph, Float);
            }
            Self::Abs => {
                floats(node, graph, &[("Value", 0.0)]);
                result(node, graph, Float);
            }
            Self::Power => {
                floats(node, graph, &[("Base", 2.0), ("Exponent", 2.0)]);
                result(node, graph, Float);
            }
            Self::Sin | Self::Cos => {
                floats(node, graph, &[("Angle", 0.0)]);
                result(node, graph, Float);
            }
            Self::MakeVec2 => {
                floats(node, graph, &[("X", 0.0), ("Y", 0.0)]);
                outputs(node, graph, &[("Vector", Vec2)]);
            }
            Self::MakeVec3 => {
                floats(node, graph, &[("X", 0.0), ("Y", 0.0), ("Z", 0.0)]);
                outputs(node, graph, &[("Vector", Vec3)]);
            }
            Self::MakeVec4 => {
                floats(node, graph, &[("X", 0.0), ("Y", 0.0), ("Z", 0.0), ("W", 1.0)]);
                outputs(node, graph, &[("Vector", Vec4)]);
            }
            Self::SplitVec3 => {
                inputs(node, graph, &[("Vector", Vec3, PinValue::Vec3([0.0; 3]))]);
                outputs(node, graph, &[("X", Float), ("Y", Float), ("Z", Float)]);
            }
            Self::SplitVec4 => {
                inputs(node, graph, &[("Vector", Vec4, PinValue::Vec4([0.0; 4]))]);
                outputs(node, graph, &[("X", Float), ("Y", Float), ("Z", Float), ("W", Float)]);
            }
            Self::ConstFloat => {
                node.flags = NodeFlags::IS_CONSTANT | NodeFlags::IS_COMPACT;
                outputs(node, graph, &[("Value", Float)]);
                node.add_input(graph.allocate_pin_id(), VALUE_PIN, Float, 0.0).is_hidden = true;
            }
            Self::ConstVec3 => {
                node.flags = NodeFlags::IS_CONSTANT;
                outputs(node, graph, &[("Value", Vec3)]);
                node.add_input(graph.allocate_pin_id(), VALUE_PIN, Vec3, [0.0; 3]).is_hidden = true;
            }
            Self::ConstColor => {
                node.flags = NodeFlags::IS_CONSTANT;
                outputs(node, graph, &[("Color", Color4)]);
                node.add_input(graph.allocate_pin_id(), VALUE_PIN, Color4, [1.0; 4]).is_hidden = true;
            }
            Self::Time => {
                node.flags = NodeFlags::IS_CONSTANT | NodeFlags::IS_COMPACT;
                outputs(
                    node,
                    graph,
                    &[("Time", Float), ("SinTime", Float), ("CosTime", Float), ("DeltaTime", Float)],
                );
            }
            Self::Comment => {
                node.flags = NodeFlags::IS_COMMENT;
                node.add_input(
                    graph.allocate_pin_id(),
                    TEXT_PIN,
                    PinDataType::String,
                    "Double-click to edit",
                )
                .is_hidden = true;
            }
        }
    }

    fn validate(&self, node: &Node) -> NodeMessage {
        if *self == Self::Divide {
            if let Some(divisor) = node.inputs.get(1) {
                let value = divisor.default_value().as_float().unwrap_or(1.0);
                if !divisor.is_connected() && value == 0.0 {
                    return NodeMessage::warning("Division by zero");
                }
            }
        }
        NodeMessage::valid()
    }
}

/// Register every built-in node type with `factory`
pub fn register_common_nodes(factory: &mut NodeFactory) {
    for kind in CommonNode::ALL {
        factory.register_node(
            kind.type_name(),
            kind.display_name(),
            kind.category(),
            GraphDomain::None,
            kind.header_color(),
            None,
            kind,
        );
    }
    tracing::debug!(count = CommonNode::ALL.len(), "common nodes registered");
}

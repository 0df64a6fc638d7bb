// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions: typed connection points owned by nodes.

use crate::graph::LinkError;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a pin within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub i32);

impl PinId {
    /// Sentinel for "no pin"
    pub const INVALID: Self = Self(-1);

    /// Whether this ID refers to an allocated pin
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for PinId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin#{}", self.0)
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Receives at most one incoming link
    Input,
    /// Fans out to any number of links
    Output,
}

/// Kind of data that flows through a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinDataType {
    /// Untyped
    #[default]
    None,
    /// Boolean value
    Bool,
    /// 32-bit integer
    Int,
    /// 32-bit float
    Float,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
    /// 3x3 matrix
    Mat3,
    /// 4x4 matrix
    Mat4,
    /// 2D texture handle
    Texture2D,
    /// Cube texture handle
    TextureCube,
    /// Sampler state handle
    Sampler,
    /// RGB color
    Color3,
    /// RGBA color
    Color4,
    /// Text value or path reference
    String,
    /// Execution flow marker
    Flow,
    /// Generic object reference
    Object,
    /// Scene entity reference
    Entity,
    /// Audio stream handle
    AudioStream,
    /// Audio parameter handle
    AudioParam,
    /// Animation pose
    Pose,
    /// Animation clip reference
    AnimClip,
    /// Blend space reference
    BlendSpace,
    /// Wildcard, connects to everything
    Any,
}

impl PinDataType {
    /// Every data type, in declaration order
    pub const ALL: [PinDataType; 24] = [
        Self::None,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::Mat3,
        Self::Mat4,
        Self::Texture2D,
        Self::TextureCube,
        Self::Sampler,
        Self::Color3,
        Self::Color4,
        Self::String,
        Self::Flow,
        Self::Object,
        Self::Entity,
        Self::AudioStream,
        Self::AudioParam,
        Self::Pose,
        Self::AnimClip,
        Self::BlendSpace,
        Self::Any,
    ];

    /// Stable name used in persisted documents
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Vec2 => "Vec2",
            Self::Vec3 => "Vec3",
            Self::Vec4 => "Vec4",
            Self::Mat3 => "Mat3",
            Self::Mat4 => "Mat4",
            Self::Texture2D => "Texture2D",
            Self::TextureCube => "TextureCube",
            Self::Sampler => "Sampler",
            Self::Color3 => "Color3",
            Self::Color4 => "Color4",
            Self::String => "String",
            Self::Flow => "Flow",
            Self::Object => "Object",
            Self::Entity => "Entity",
            Self::AudioStream => "AudioStream",
            Self::AudioParam => "AudioParam",
            Self::Pose => "Pose",
            Self::AnimClip => "AnimClip",
            Self::BlendSpace => "BlendSpace",
            Self::Any => "Any",
        }
    }

    /// Get the color for this data type (for UI and link display)
    pub fn color(self) -> [u8; 3] {
        match self {
            Self::Bool => [200, 50, 50],
            Self::Int => [50, 180, 220],
            Self::Float => [150, 200, 50],
            Self::Vec2 => [100, 220, 100],
            Self::Vec3 => [100, 100, 220],
            Self::Vec4 => [180, 100, 220],
            Self::Color3 => [255, 200, 50],
            Self::Color4 => [255, 180, 50],
            Self::Mat3 => [180, 180, 100],
            Self::Mat4 => [200, 200, 120],
            Self::Texture2D => [220, 100, 100],
            Self::TextureCube => [200, 120, 120],
            Self::Sampler => [180, 140, 100],
            Self::String => [220, 100, 220],
            Self::Flow => [255, 255, 255],
            Self::Object => [50, 150, 200],
            Self::Entity => [50, 200, 150],
            Self::AudioStream => [255, 150, 50],
            Self::AudioParam => [255, 180, 80],
            Self::Pose => [50, 200, 255],
            Self::AnimClip => [100, 180, 255],
            Self::BlendSpace => [80, 160, 240],
            Self::Any => [200, 200, 200],
            Self::None => [128, 128, 128],
        }
    }

    /// Check whether values of this type may flow into (or out of) `other`.
    ///
    /// The relation is symmetric. Besides identity and the `Any` wildcard only
    /// these pairs match: `Float` with `Vec2`/`Vec3`/`Vec4` (scalar promotion),
    /// `Int` with `Float`, `Color3` with `Vec3` and `Color4` with `Vec4`.
    pub fn is_compatible_with(self, other: PinDataType) -> bool {
        if self == other || self == Self::Any || other == Self::Any {
            return true;
        }

        matches!(
            (self, other),
            (Self::Float, Self::Vec2 | Self::Vec3 | Self::Vec4)
                | (Self::Vec2 | Self::Vec3 | Self::Vec4, Self::Float)
                | (Self::Int, Self::Float)
                | (Self::Float, Self::Int)
                | (Self::Color3, Self::Vec3)
                | (Self::Vec3, Self::Color3)
                | (Self::Color4, Self::Vec4)
                | (Self::Vec4, Self::Color4)
        )
    }
}

impl fmt::Display for PinDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error when parsing an unknown data type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown pin data type: {0}")]
pub struct UnknownDataType(pub String);

impl FromStr for PinDataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

/// Value stored on a pin (defaults for unconnected inputs)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PinValue {
    /// No value
    #[default]
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// 2D vector
    Vec2([f32; 2]),
    /// 3D vector or RGB color
    Vec3([f32; 3]),
    /// 4D vector or RGBA color
    Vec4([f32; 4]),
    /// 3x3 matrix, row-major
    Mat3([f32; 9]),
    /// 4x4 matrix, row-major
    Mat4([f32; 16]),
    /// String or path reference
    String(String),
}

impl PinValue {
    /// Data type this value naturally carries
    pub fn data_type(&self) -> PinDataType {
        match self {
            Self::None => PinDataType::None,
            Self::Bool(_) => PinDataType::Bool,
            Self::Int(_) => PinDataType::Int,
            Self::Float(_) => PinDataType::Float,
            Self::Vec2(_) => PinDataType::Vec2,
            Self::Vec3(_) => PinDataType::Vec3,
            Self::Vec4(_) => PinDataType::Vec4,
            Self::Mat3(_) => PinDataType::Mat3,
            Self::Mat4(_) => PinDataType::Mat4,
            Self::String(_) => PinDataType::String,
        }
    }

    /// Whether this value may be stored on a pin of `data_type`.
    ///
    /// `None` fits every pin and every value fits an `Any` pin. Colors share
    /// storage with the vector of the same width.
    pub fn fits(&self, data_type: PinDataType) -> bool {
        match (self, data_type) {
            (Self::None, _)
            | (_, PinDataType::Any)
            | (Self::Vec3(_), PinDataType::Color3)
            | (Self::Vec4(_), PinDataType::Color4) => true,
            (value, ty) => value.data_type() == ty,
        }
    }

    /// Zero value for a data type; `None` for handle and flow types
    pub fn zero_for(data_type: PinDataType) -> Self {
        match data_type {
            PinDataType::Bool => Self::Bool(false),
            PinDataType::Int => Self::Int(0),
            PinDataType::Float => Self::Float(0.0),
            PinDataType::Vec2 => Self::Vec2([0.0; 2]),
            PinDataType::Vec3 | PinDataType::Color3 => Self::Vec3([0.0; 3]),
            PinDataType::Vec4 | PinDataType::Color4 => Self::Vec4([0.0; 4]),
            PinDataType::Mat3 => Self::Mat3([0.0; 9]),
            PinDataType::Mat4 => Self::Mat4([0.0; 16]),
            PinDataType::String => Self::String(String::new()),
            _ => Self::None,
        }
    }

    /// Whether this is the empty value
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Scalar view of a numeric value
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// String view of a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Components of a vector or matrix value, in row/component order
    pub fn components(&self) -> Option<&[f32]> {
        match self {
            Self::Vec2(v) => Some(v),
            Self::Vec3(v) => Some(v),
            Self::Vec4(v) => Some(v),
            Self::Mat3(m) => Some(m),
            Self::Mat4(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for PinValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for PinValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for PinValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for PinValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for PinValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for PinValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<&str> for PinValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PinValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Error when a default value does not match the pin's data type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Value of type {value} does not fit pin of type {pin}")]
pub struct PinValueError {
    /// Data type of the pin
    pub pin: PinDataType,
    /// Data type carried by the rejected value
    pub value: PinDataType,
}

/// A typed connection point on a node.
///
/// Pins never reference links; connectivity lives in the graph's link table
/// and `is_connected` is a cache the graph keeps current.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    /// Unique pin ID within the graph
    pub id: PinId,
    /// Pin name
    pub name: String,
    /// Hidden from the node UI (editor-only flag)
    pub is_hidden: bool,
    pub(crate) owner: NodeId,
    pub(crate) is_connected: bool,
    data_type: PinDataType,
    direction: PinDirection,
    default_value: PinValue,
}

impl Pin {
    /// Create a new pin with no default value
    pub fn new(
        id: PinId,
        name: impl Into<String>,
        data_type: PinDataType,
        direction: PinDirection,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            is_hidden: false,
            owner: NodeId::INVALID,
            is_connected: false,
            data_type,
            direction,
            default_value: PinValue::None,
        }
    }

    /// Create a new input pin.
    ///
    /// A default that does not fit `data_type` is replaced by the type's zero
    /// value.
    pub fn input(
        id: PinId,
        name: impl Into<String>,
        data_type: PinDataType,
        default_value: impl Into<PinValue>,
    ) -> Self {
        let mut pin = Self::new(id, name, data_type, PinDirection::Input);
        if let Err(err) = pin.set_default_value(default_value.into()) {
            tracing::warn!(pin = %pin.name, "{err}; using zero value");
            pin.default_value = PinValue::zero_for(data_type);
        }
        pin
    }

    /// Create a new output pin
    pub fn output(id: PinId, name: impl Into<String>, data_type: PinDataType) -> Self {
        Self::new(id, name, data_type, PinDirection::Output)
    }

    /// Mark as hidden
    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// ID of the node owning this pin
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Data type flowing through this pin
    pub fn data_type(&self) -> PinDataType {
        self.data_type
    }

    /// Pin direction
    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    /// Whether this is an input pin
    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    /// Whether this is an output pin
    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }

    /// Whether at least one link references this pin
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Value used while the pin is unconnected
    pub fn default_value(&self) -> &PinValue {
        &self.default_value
    }

    /// Replace the default value, rejecting values that don't fit the data type
    pub fn set_default_value(&mut self, value: PinValue) -> Result<(), PinValueError> {
        if !value.fits(self.data_type) {
            return Err(PinValueError {
                pin: self.data_type,
                value: value.data_type(),
            });
        }
        self.default_value = value;
        Ok(())
    }

    /// Check if a connection to another pin is valid
    pub fn check_connection(&self, other: &Pin) -> Result<(), LinkError> {
        if self.direction == other.direction {
            return Err(LinkError::SameDirection);
        }
        if self.owner == other.owner {
            return Err(LinkError::SameNode(self.owner));
        }
        if !self.data_type.is_compatible_with(other.data_type) {
            return Err(LinkError::IncompatibleTypes(self.data_type, other.data_type));
        }
        Ok(())
    }

    /// Check if a connection to another pin is valid
    pub fn can_connect_to(&self, other: &Pin) -> bool {
        self.check_connection(other).is_ok()
    }
}

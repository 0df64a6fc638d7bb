// SPDX-License-Identifier: MIT OR Apache-2.0
//! Domain-agnostic node graph engine.
//!
//! This crate provides the data model shared by every graph domain:
//! - Shader and post-process graphs
//! - Animation blend graphs
//! - Audio graphs
//! - Blueprint, behavior tree and particle graphs
//!
//! ## Architecture
//!
//! The engine is built on a single graph model with:
//! - Typed input/output pins and a fixed compatibility table
//! - Link validation (single link per input, cycles detected on demand)
//! - A type-name keyed node factory for construction and reloading
//! - YAML and RON persistence that tolerates unknown node types
//!
//! Nodes never evaluate values here; domain evaluators consume an
//! [`EvaluationPlan`].

pub mod evaluation;
pub mod factory;
pub mod graph;
pub mod link;
pub mod node;
pub mod nodes;
pub mod pin;
pub mod serializer;

pub use evaluation::{EvaluationPlan, InputSource};
pub use factory::{NodeFactory, NodeRegistration};
pub use graph::{CycleError, Graph, GraphDomain, GraphUuid, LinkError, ValidationReport};
pub use link::{Link, LinkId};
pub use node::{Node, NodeBehavior, NodeFlags, NodeId, NodeMessage, NodeStatus};
pub use pin::{Pin, PinDataType, PinDirection, PinId, PinValue, PinValueError};
pub use serializer::{GraphFormat, GraphSerializer, SerializeError};

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Evaluation planning.
//!
//! The engine never computes values. It hands domain evaluators a plan: the
//! nodes in dependency order, and for every input pin where its value comes
//! from.

use crate::graph::{CycleError, Graph};
use crate::node::NodeId;
use crate::pin::{PinId, PinValue};
use std::collections::HashMap;

/// Where an input pin reads its value from
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// Output pin of an upstream node
    Connected {
        /// Upstream node
        node: NodeId,
        /// Upstream output pin
        pin: PinId,
    },
    /// The pin's own default value
    Default(PinValue),
}

impl InputSource {
    /// Upstream node, if connected
    pub fn upstream_node(&self) -> Option<NodeId> {
        match self {
            Self::Connected { node, .. } => Some(*node),
            Self::Default(_) => None,
        }
    }
}

/// One node to evaluate
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// Node to evaluate
    pub node: NodeId,
    /// Input pins in declaration order, with their sources
    pub inputs: Vec<(PinId, InputSource)>,
}

/// Ordered evaluation steps for an acyclic graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationPlan {
    steps: Vec<PlanStep>,
    index: HashMap<PinId, (usize, usize)>,
}

impl EvaluationPlan {
    /// Build a plan for `graph`
    pub fn build(graph: &Graph) -> Result<Self, CycleError> {
        let order = graph.evaluation_order()?;
        let mut plan = Self::default();

        for node_id in order {
            let Some(node) = graph.node(node_id) else {
                continue;
            };

            let inputs: Vec<(PinId, InputSource)> = node
                .inputs
                .iter()
                .map(|pin| {
                    let source = match graph.connected_output_pin(pin.id) {
                        Some(upstream) => InputSource::Connected {
                            node: upstream.owner(),
                            pin: upstream.id,
                        },
                        None => InputSource::Default(pin.default_value().clone()),
                    };
                    (pin.id, source)
                })
                .collect();

            let step = plan.steps.len();
            for (slot, (pin_id, _)) in inputs.iter().enumerate() {
                plan.index.insert(*pin_id, (step, slot));
            }
            plan.steps.push(PlanStep {
                node: node_id,
                inputs,
            });
        }

        tracing::debug!(graph = %graph.name(), steps = plan.steps.len(), "evaluation plan built");
        Ok(plan)
    }

    /// Steps in evaluation order
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Node IDs in evaluation order
    pub fn order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps.iter().map(|step| step.node)
    }

    /// Source of an input pin
    pub fn source(&self, pin_id: PinId) -> Option<&InputSource> {
        let &(step, slot) = self.index.get(&pin_id)?;
        self.steps.get(step)?.inputs.get(slot).map(|(_, source)| source)
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphDomain;
    use crate::node::Node;
    use crate::pin::PinDataType;

    fn add_scale(graph: &mut Graph, factor: f32) -> NodeId {
        let mut node = Node::new("Test::Scale");
        node.add_input(graph.allocate_pin_id(), "Value", PinDataType::Float, 1.0);
        node.add_input(graph.allocate_pin_id(), "Factor", PinDataType::Float, factor);
        node.add_output(graph.allocate_pin_id(), "Result", PinDataType::Float);
        graph.add_node(node)
    }

    #[test]
    fn test_plan_follows_links() {
        let mut graph = Graph::new("Plan", GraphDomain::Shader);
        let first = add_scale(&mut graph, 2.0);
        let second = add_scale(&mut graph, 3.0);

        let out = graph.node(first).unwrap().outputs[0].id;
        let value_in = graph.node(second).unwrap().inputs[0].id;
        let factor_in = graph.node(second).unwrap().inputs[1].id;
        graph.add_link(out, value_in).unwrap();

        let plan = EvaluationPlan::build(&graph).unwrap();
        assert_eq!(plan.order().collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(
            plan.source(value_in),
            Some(&InputSource::Connected {
                node: first,
                pin: out
            })
        );
        assert_eq!(
            plan.source(factor_in),
            Some(&InputSource::Default(PinValue::Float(3.0)))
        );
        assert_eq!(plan.source(factor_in).and_then(InputSource::upstream_node), None);
    }

    #[test]
    fn test_plan_rejects_cycle() {
        let mut graph = Graph::default();
        let a = add_scale(&mut graph, 1.0);
        let b = add_scale(&mut graph, 1.0);

        let a_out = graph.node(a).unwrap().outputs[0].id;
        let b_in = graph.node(b).unwrap().inputs[0].id;
        let b_out = graph.node(b).unwrap().outputs[0].id;
        let a_in = graph.node(a).unwrap().inputs[0].id;
        graph.add_link(a_out, b_in).unwrap();
        graph.add_link(b_out, a_in).unwrap();

        assert_eq!(
            EvaluationPlan::build(&graph),
            Err(CycleError { unordered: 2 })
        );
    }

    #[test]
    fn test_empty_graph() {
        let plan = EvaluationPlan::build(&Graph::default()).unwrap();
        assert!(plan.is_empty());
        assert!(plan.source(PinId(1)).is_none());
    }
}

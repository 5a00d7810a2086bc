//! Parents-before-children ordering.

use std::collections::VecDeque;

use super::{ModuleGraph, NodeId};
use crate::error::{ModuleError, Result};

/// Kahn's algorithm seeded with the root.
///
/// A node is emitted once every parent has been emitted; siblings keep
/// their link order, so the result is deterministic for a given graph.
/// Nodes that never reach in-degree zero sit on (or below) a cycle.
pub(super) fn topological_order(graph: &ModuleGraph) -> Result<Vec<NodeId>> {
    let mut remaining: Vec<usize> = (0..graph.len())
        .map(|i| graph.parents_of(NodeId(i)).len())
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    let root = graph.root().id();
    if remaining[root.0] == 0 {
        queue.push_back(root);
    }

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &child in graph.children_of(id) {
            remaining[child.0] -= 1;
            if remaining[child.0] == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() < graph.len() {
        let modules = remaining
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(i, _)| graph.nodes[i].module.name.clone())
            .collect();
        return Err(ModuleError::CyclicDependency { modules });
    }

    Ok(order)
}

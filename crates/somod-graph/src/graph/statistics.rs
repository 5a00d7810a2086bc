use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::ModuleGraph;
use crate::module::ModuleType;

/// Summary numbers for a built graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub module_count: usize,
    pub edge_count: usize,
    pub plugin_count: usize,
    /// Largest shortest-path distance from the root.
    pub max_depth: usize,
}

impl ModuleGraph {
    pub fn statistics(&self) -> GraphStatistics {
        let edge_count = self
            .nodes
            .iter()
            .map(|node| node.children.len())
            .sum();

        let plugin_count = self
            .nodes
            .iter()
            .filter(|node| node.module.module_type == ModuleType::Plugin)
            .count();

        let mut depth: Vec<Option<usize>> = vec![None; self.len()];
        let mut queue = VecDeque::new();
        let root = self.root().id();
        depth[root.0] = Some(0);
        queue.push_back(root);

        while let Some(id) = queue.pop_front() {
            let next = depth[id.0].unwrap_or_default() + 1;
            for &child in self.children_of(id) {
                if depth[child.0].is_none() {
                    depth[child.0] = Some(next);
                    queue.push_back(child);
                }
            }
        }

        GraphStatistics {
            module_count: self.len(),
            edge_count,
            plugin_count,
            max_depth: depth.into_iter().flatten().max().unwrap_or_default(),
        }
    }
}

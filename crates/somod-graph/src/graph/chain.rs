//! Dependency chains for diagnostics.
//!
//! Answers "why is this module in the build?" with the shortest path from
//! the root, e.g. `app -> @s/auth -> @s/core`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{ModuleGraph, NodeId};
use crate::error::Result;

/// A chain of module names from the root to a target module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyChain {
    /// Module names from root to target
    pub path: Vec<String>,
    /// Depth of this chain (path length - 1)
    pub depth: usize,
}

impl DependencyChain {
    /// Create a new dependency chain from a path.
    pub fn new(path: Vec<String>) -> Self {
        let depth = path.len().saturating_sub(1);
        Self { path, depth }
    }

    /// Get the target (last module in the chain).
    pub fn target(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// Format the chain as a human-readable string.
    ///
    /// Example: "app -> auth -> core"
    pub fn format_chain(&self) -> String {
        self.path.join(" -> ")
    }
}

impl ModuleGraph {
    /// Shortest chain from the root to the module called `name`.
    pub fn chain_to(&self, name: &str) -> Result<DependencyChain> {
        let target = self.get(name)?.id();

        let mut previous: Vec<Option<NodeId>> = vec![None; self.len()];
        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::new();

        let root = self.root().id();
        seen[root.0] = true;
        queue.push_back(root);

        while let Some(id) = queue.pop_front() {
            if id == target {
                break;
            }
            for &child in self.children_of(id) {
                if !seen[child.0] {
                    seen[child.0] = true;
                    previous[child.0] = Some(id);
                    queue.push_back(child);
                }
            }
        }

        let mut path = vec![self.node(target).name().to_string()];
        let mut cursor = previous[target.0];
        while let Some(id) = cursor {
            path.push(self.node(id).name().to_string());
            cursor = previous[id.0];
        }
        path.reverse();

        Ok(DependencyChain::new(path))
    }
}

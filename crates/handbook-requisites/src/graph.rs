//! Prerequisite graph over harvested subjects.
//!
//! Each subject points at every subject named by one of its subject-set
//! constraints, antirequisites excluded. Subjects that are only referenced
//! (never harvested themselves) still get a node.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::types::SubjectRecord;

/// Directed requisite graph keyed by subject code.
#[derive(Debug, Default)]
pub struct RequisiteGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl RequisiteGraph {
    pub fn from_records(records: &[SubjectRecord]) -> Self {
        let mut graph = Self::default();
        for record in records {
            let from = graph.node(&record.code);
            for constraint in &record.constraints {
                if constraint.is_antirequisite() {
                    continue;
                }
                for code in constraint.subjects() {
                    let to = graph.node(code);
                    graph.graph.update_edge(from, to, ());
                }
            }
        }
        graph
    }

    fn node(&mut self, code: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(code) {
            return idx;
        }
        let idx = self.graph.add_node(code.to_string());
        self.index.insert(code.to_string(), idx);
        idx
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Direct requisites of `code`, sorted.
    pub fn requisites_of(&self, code: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(code) else {
            return Vec::new();
        };
        self.sorted_neighbors(idx)
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    fn sorted_neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        neighbors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        neighbors
    }

    /// Breadth-first spanning tree from `root`. Every reachable subject appears
    /// exactly once, under the first parent that reached it. `None` if the
    /// root is not in the graph.
    pub fn spanning_tree(&self, root: &str) -> Option<TreeNode> {
        let &root_idx = self.index.get(root)?;

        let mut visited: HashSet<NodeIndex> = HashSet::from([root_idx]);
        let mut children: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut queue = VecDeque::from([root_idx]);

        while let Some(current) = queue.pop_front() {
            for next in self.sorted_neighbors(current) {
                if visited.insert(next) {
                    children.entry(current).or_default().push(next);
                    queue.push_back(next);
                }
            }
        }

        Some(self.assemble(root_idx, &children))
    }

    fn assemble(
        &self,
        idx: NodeIndex,
        children: &HashMap<NodeIndex, Vec<NodeIndex>>,
    ) -> TreeNode {
        TreeNode {
            code: self.graph[idx].clone(),
            children: children
                .get(&idx)
                .map(|kids| kids.iter().map(|k| self.assemble(*k, children)).collect())
                .unwrap_or_default(),
        }
    }
}

/// One node of a prerequisite spanning tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub code: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of subjects in this tree, root included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    /// Indented text rendering, two spaces per level.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.code);
        out.push('\n');
        for child in &self.children {
            child.render_into(depth + 1, out);
        }
    }
}

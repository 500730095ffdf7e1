//! Benchmark hierarchy index
//!
//! A flat index over the benchmark forest: adjacency, parent backlinks,
//! labels, and longest-path-to-leaf depths. Rebuilt whenever a payload is
//! loaded, never maintained incrementally.

use crate::data::BenchmarkNode;
use std::collections::{HashMap, HashSet};

/// Root ID prefix selecting the grayscale palette and excluding a tree
/// from the global score
pub const ENGINEERING_ROOT: &str = "engineering";

/// Derived index over a benchmark forest
#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    children: HashMap<String, Vec<String>>,
    parents: HashMap<String, String>,
    labels: HashMap<String, String>,
    roots: Vec<String>,
    /// IDs in ascending depth order (all leaves first). Depth is the
    /// longest path to a leaf, so every child precedes its parent.
    depth_order: Vec<String>,
}

impl HierarchyIndex {
    /// Build the index. Duplicate IDs are not validated; the last
    /// occurrence wins.
    pub fn build(forest: &[BenchmarkNode]) -> Self {
        let mut index = Self {
            roots: forest.iter().map(|n| n.id.clone()).collect(),
            ..Self::default()
        };
        let mut depths: HashMap<String, usize> = HashMap::new();
        for node in forest {
            index.insert_node(node, None, &mut depths);
        }

        let mut ordered: Vec<String> = depths.keys().cloned().collect();
        ordered.sort_by_key(|id| (depths[id], id.clone()));
        index.depth_order = ordered;
        index
    }

    fn insert_node(
        &mut self,
        node: &BenchmarkNode,
        parent: Option<&str>,
        depths: &mut HashMap<String, usize>,
    ) -> usize {
        if let Some(parent) = parent {
            self.parents.insert(node.id.clone(), parent.to_string());
        }
        self.labels.insert(node.id.clone(), node.label.clone());
        self.children.insert(
            node.id.clone(),
            node.children.iter().map(|c| c.id.clone()).collect(),
        );

        let depth = node
            .children
            .iter()
            .map(|child| self.insert_node(child, Some(&node.id), depths) + 1)
            .max()
            .unwrap_or(0);
        depths.insert(node.id.clone(), depth);
        depth
    }

    pub fn contains(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// A node is a leaf when it is known and has no children
    pub fn is_leaf(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(Vec::is_empty)
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.contains(id) && !self.parents.contains_key(id)
    }

    /// Walk up to the root of the tree containing `id`
    pub fn root_of<'a>(&'a self, id: &'a str) -> Option<&'a str> {
        if !self.contains(id) {
            return None;
        }
        let mut cursor = id;
        while let Some(parent) = self.parent_of(cursor) {
            cursor = parent;
        }
        Some(cursor)
    }

    /// Whether `id` lives under an engineering root
    pub fn is_engineering(&self, id: &str) -> bool {
        self.root_of(id)
            .is_some_and(|root| root.starts_with(ENGINEERING_ROOT))
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Top-level categories contributing to the global filtered score
    /// (every root outside the engineering tree)
    pub fn scoring_roots(&self) -> impl Iterator<Item = &str> {
        self.roots
            .iter()
            .map(String::as_str)
            .filter(|root| !root.starts_with(ENGINEERING_ROOT))
    }

    /// All known IDs, ascending by depth: children always precede parents
    pub fn ids_by_depth(&self) -> impl Iterator<Item = &str> {
        self.depth_order.iter().map(String::as_str)
    }

    /// IDs in pre-order (parents before children, trees in forest order),
    /// the natural column order of the grid
    pub fn ids_preorder(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.depth_order.len());
        let mut stack: Vec<&str> = self.roots.iter().rev().map(String::as_str).collect();
        while let Some(id) = stack.pop() {
            out.push(id.to_string());
            for child in self.children_of(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Leaf IDs in the subtree rooted at `id` (just `id` if it is a leaf)
    pub fn leaf_descendants(&self, id: &str) -> Vec<String> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let children = self.children_of(cur);
            if children.is_empty() {
                leaves.push(cur.to_string());
            } else {
                stack.extend(children.iter().map(String::as_str));
            }
        }
        leaves
    }

    /// The recursive fully-excluded predicate: a node is fully excluded
    /// when it is itself excluded, or it has children and every child is
    /// fully excluded. Applied literally for mixed multi-level exclusion:
    /// a partially excluded sibling branch keeps its ancestor alive.
    pub fn is_fully_excluded(&self, id: &str, excluded: &HashSet<String>) -> bool {
        if excluded.contains(id) {
            return true;
        }
        let children = self.children_of(id);
        !children.is_empty()
            && children
                .iter()
                .all(|child| self.is_fully_excluded(child, excluded))
    }

    /// Leaves of the subtree that are not excluded
    pub fn surviving_leaves(&self, id: &str, excluded: &HashSet<String>) -> usize {
        self.leaf_descendants(id)
            .iter()
            .filter(|leaf| !excluded.contains(*leaf))
            .count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::BenchmarkNode;

    /// The fixture forest used across the crate's tests:
    /// neural -> V1 -> {bench_a, bench_b}; behavior -> bench_c;
    /// engineering -> imagenet
    pub(crate) fn fixture_forest() -> Vec<BenchmarkNode> {
        vec![
            BenchmarkNode::parent(
                "neural",
                "Neural",
                vec![BenchmarkNode::parent(
                    "V1",
                    "V1",
                    vec![
                        BenchmarkNode::leaf("bench_a", "Bench A"),
                        BenchmarkNode::leaf("bench_b", "Bench B"),
                    ],
                )],
            ),
            BenchmarkNode::parent(
                "behavior",
                "Behavior",
                vec![BenchmarkNode::leaf("bench_c", "Bench C")],
            ),
            BenchmarkNode::parent(
                "engineering",
                "Engineering",
                vec![BenchmarkNode::leaf("imagenet", "ImageNet")],
            ),
        ]
    }

    fn excluded(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_set_matches_forest() {
        let index = HierarchyIndex::build(&fixture_forest());
        let mut ids: Vec<&str> = index.ids_by_depth().collect();
        ids.sort_unstable();
        assert_eq!(
            ids,
            vec![
                "V1",
                "behavior",
                "bench_a",
                "bench_b",
                "bench_c",
                "engineering",
                "imagenet",
                "neural",
            ]
        );
        assert_eq!(index.children_of("V1"), ["bench_a", "bench_b"]);
        assert_eq!(index.children_of("bench_a"), Vec::<String>::new());
    }

    #[test]
    fn test_children_precede_parents_in_depth_order() {
        let index = HierarchyIndex::build(&fixture_forest());
        let order: Vec<&str> = index.ids_by_depth().collect();
        let pos = |id: &str| order.iter().position(|x| *x == id).unwrap();
        assert!(pos("bench_a") < pos("V1"));
        assert!(pos("V1") < pos("neural"));
        assert!(pos("bench_c") < pos("behavior"));
    }

    #[test]
    fn test_parent_and_root_links() {
        let index = HierarchyIndex::build(&fixture_forest());
        assert_eq!(index.parent_of("bench_a"), Some("V1"));
        assert_eq!(index.parent_of("V1"), Some("neural"));
        assert_eq!(index.parent_of("neural"), None);
        assert_eq!(index.root_of("bench_a"), Some("neural"));
        assert!(index.is_engineering("imagenet"));
        assert!(!index.is_engineering("bench_a"));
    }

    #[test]
    fn test_scoring_roots_skip_engineering() {
        let index = HierarchyIndex::build(&fixture_forest());
        let roots: Vec<&str> = index.scoring_roots().collect();
        assert_eq!(roots, vec!["neural", "behavior"]);
    }

    #[test]
    fn test_leaf_descendants() {
        let index = HierarchyIndex::build(&fixture_forest());
        let mut leaves = index.leaf_descendants("neural");
        leaves.sort_unstable();
        assert_eq!(leaves, vec!["bench_a", "bench_b"]);
        assert_eq!(index.leaf_descendants("bench_c"), vec!["bench_c"]);
    }

    #[test]
    fn test_fully_excluded_predicate() {
        let index = HierarchyIndex::build(&fixture_forest());

        assert!(!index.is_fully_excluded("neural", &excluded(&["bench_a"])));
        assert!(index.is_fully_excluded("V1", &excluded(&["bench_a", "bench_b"])));
        assert!(index.is_fully_excluded("neural", &excluded(&["bench_a", "bench_b"])));
        assert!(index.is_fully_excluded("neural", &excluded(&["V1"])));
        assert!(!index.is_fully_excluded("behavior", &excluded(&["bench_a", "bench_b"])));
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let forest = vec![
            BenchmarkNode::parent("dup", "First", vec![BenchmarkNode::leaf("a", "A")]),
            BenchmarkNode::parent("dup", "Second", vec![BenchmarkNode::leaf("b", "B")]),
        ];
        let index = HierarchyIndex::build(&forest);
        assert_eq!(index.children_of("dup"), ["b"]);
        assert_eq!(index.label("dup"), Some("Second"));
    }

    #[test]
    fn test_preorder_column_order() {
        let index = HierarchyIndex::build(&fixture_forest());
        assert_eq!(
            index.ids_preorder(),
            vec![
                "neural",
                "V1",
                "bench_a",
                "bench_b",
                "behavior",
                "bench_c",
                "engineering",
                "imagenet",
            ]
        );
    }
}

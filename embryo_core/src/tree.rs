//! The "TREE" Assembler - projects the linked history into a lineage tree.
//!
//! Per-frame identity continuations carry no lineage information, so only
//! two kinds of edges are emitted:
//! - timepoint 1: identity continuations, re-pointed at the synthetic root
//! - timepoint > 1: divisions (cell name differs from its ancestor's name)
//!
//! Nodes are keyed by name. A name that receives a parent more than once is
//! resolved last-write-wins and reported in [`LineageTree::reparented`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::history::History;

/// Name of the synthetic root node.
pub const ROOT_NAME: &str = "root";

/// A `(name, parent)` pair collected from the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub name: String,

    /// `None` for the synthetic root and for cells with no ancestor
    pub parent: Option<String>,
}

impl LineageEdge {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
        }
    }
}

/// One node of the display tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageNode {
    pub name: String,
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LineageNode>,
}

impl LineageNode {
    fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(&node.children);
        }
        total
    }

    fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Pre-order walk, children left to right.
    fn preorder(&self) -> impl Iterator<Item = &LineageNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    fn find(&self, name: &str) -> Option<&LineageNode> {
        self.preorder().find(|node| node.name == name)
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.extend(
            self.preorder()
                .filter(|node| node.children.is_empty())
                .map(|node| node.name.as_str()),
        );
    }

    fn truncated(&self, depth: usize) -> LineageNode {
        let mut pending = Vec::new();
        let mut stack = vec![(self, None, 1)];
        while let Some((node, up, level)) = stack.pop() {
            let idx = pending.len();
            pending.push(PendingNode {
                name: node.name.clone(),
                parent: node.parent.clone(),
                up,
            });
            if level < depth {
                stack.extend(node.children.iter().rev().map(|c| (c, Some(idx), level + 1)));
            }
        }
        fold_preorder(pending).unwrap_or_else(|| LineageNode {
            name: self.name.clone(),
            parent: self.parent.clone(),
            children: Vec::new(),
        })
    }
}

// Flattens the subtree so dropping a long chain does not recurse.
impl Drop for LineageNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// A node recorded in pre-order, pointing at its parent's slot.
struct PendingNode {
    name: String,
    parent: Option<String>,
    up: Option<usize>,
}

/// Builds the tree bottom-up from a pre-order listing. Parents always
/// precede their children, so walking backwards finishes every child first.
fn fold_preorder(pending: Vec<PendingNode>) -> Option<LineageNode> {
    let mut children: Vec<Vec<LineageNode>> = pending.iter().map(|_| Vec::new()).collect();
    let mut top = None;

    for (idx, entry) in pending.into_iter().enumerate().rev() {
        let mut kids = std::mem::take(&mut children[idx]);
        kids.reverse();
        let node = LineageNode {
            name: entry.name,
            parent: entry.parent,
            children: kids,
        };
        match entry.up {
            Some(up) => children[up].push(node),
            None => top = Some(node),
        }
    }

    top
}

/// The assembled lineage forest. In well-formed data `roots` holds the
/// synthetic root only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageTree {
    /// Top-level nodes in edge order
    pub roots: Vec<LineageNode>,

    /// Names that were assigned a parent more than once
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reparented: Vec<String>,
}

impl LineageTree {
    /// The synthetic root node.
    pub fn root(&self) -> Option<&LineageNode> {
        self.roots.iter().find(|n| n.name == ROOT_NAME)
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&LineageNode> {
        self.roots.iter().find_map(|n| n.find(name))
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(LineageNode::count).sum()
    }

    /// Number of levels in the deepest top-level subtree.
    pub fn depth(&self) -> usize {
        self.roots.iter().map(LineageNode::depth).max().unwrap_or(0)
    }

    /// Names of all childless nodes, depth-first.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.collect_leaves(&mut out);
        }
        out
    }

    /// Copy of the tree cut below `depth` levels.
    ///
    /// `collapsed(2)` keeps the top-level nodes and their direct children,
    /// the initial view of a collapsible tree.
    pub fn collapsed(&self, depth: usize) -> LineageTree {
        if depth == 0 {
            return LineageTree {
                roots: Vec::new(),
                reparented: self.reparented.clone(),
            };
        }
        LineageTree {
            roots: self.roots.iter().map(|n| n.truncated(depth)).collect(),
            reparented: self.reparented.clone(),
        }
    }
}

// ============================================================================
// EDGE COLLECTION
// ============================================================================

/// Collects lineage edges from the history in timepoint/record order.
///
/// The first edge is always the synthetic root.
pub fn collect_edges(history: &History) -> Vec<LineageEdge> {
    let mut edges = vec![LineageEdge::new(ROOT_NAME, None)];

    for (t, timepoint) in history.iter().enumerate() {
        if t == 0 {
            continue;
        }
        for record in &timepoint.records {
            let parent = record.ancestor_name(history);
            let same_name = parent == Some(record.name.as_str());

            if t == 1 {
                if same_name {
                    edges.push(LineageEdge::new(record.name.clone(), Some(ROOT_NAME)));
                }
            } else if !same_name {
                edges.push(LineageEdge::new(record.name.clone(), parent));
            }
        }
    }

    edges
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Assembles the lineage tree for the whole history.
pub fn assemble(history: &History) -> LineageTree {
    assemble_edges(&collect_edges(history))
}

/// Builds the name-keyed tree from a list of edges.
///
/// Edges whose parent is absent, unknown, or the node itself produce
/// top-level nodes. Nodes that cannot be reached from any top-level node
/// (re-parenting cycles) are promoted to top level.
pub fn assemble_edges(edges: &[LineageEdge]) -> LineageTree {
    let mut order: Vec<&str> = Vec::new();
    let mut parent_of: HashMap<&str, Option<&str>> = HashMap::new();
    let mut reparented: Vec<String> = Vec::new();

    for edge in edges {
        let parent = edge.parent.as_deref();
        match parent_of.insert(edge.name.as_str(), parent) {
            None => order.push(edge.name.as_str()),
            Some(previous) if previous != parent => {
                warn!(
                    name = %edge.name,
                    from = previous.unwrap_or("-"),
                    to = parent.unwrap_or("-"),
                    "cell re-parented, keeping last edge"
                );
                if !reparented.iter().any(|n| n == &edge.name) {
                    reparented.push(edge.name.clone());
                }
            }
            Some(_) => {}
        }
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut top_level: Vec<&str> = Vec::new();
    for &name in &order {
        match parent_of.get(name).copied().flatten() {
            Some(parent) if parent != name && parent_of.contains_key(parent) => {
                children.entry(parent).or_default().push(name);
            }
            _ => top_level.push(name),
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut roots: Vec<LineageNode> = Vec::new();
    for name in top_level {
        if let Some(node) = build_node(name, &parent_of, &children, &mut visited) {
            roots.push(node);
        }
    }

    for &name in &order {
        if visited.contains(name) {
            continue;
        }
        warn!(name = %name, "lineage node unreachable from any root, promoting");
        if let Some(node) = build_node(name, &parent_of, &children, &mut visited) {
            roots.push(node);
        }
    }

    LineageTree { roots, reparented }
}

fn build_node<'a>(
    name: &'a str,
    parent_of: &HashMap<&'a str, Option<&'a str>>,
    children: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
) -> Option<LineageNode> {
    let mut pending = Vec::new();
    let mut stack: Vec<(&'a str, Option<usize>)> = vec![(name, None)];

    while let Some((name, up)) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }
        let idx = pending.len();
        pending.push(PendingNode {
            name: name.to_string(),
            parent: parent_of.get(name).copied().flatten().map(str::to_string),
            up,
        });
        if let Some(kids) = children.get(name) {
            stack.extend(kids.iter().rev().map(|&child| (child, Some(idx))));
        }
    }

    fold_preorder(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SnapshotRow;
    use crate::resolver::NameResolver;
    use proptest::prelude::*;

    fn history(frames: &[&[&str]]) -> History {
        let resolver = NameResolver::default();
        let mut history = History::new();
        for frame in frames {
            let rows = frame
                .iter()
                .map(|n| SnapshotRow::new(*n, 0.0, 0.0, 0.0, 1.0))
                .collect();
            history.push_snapshot(rows, &resolver);
        }
        history
    }

    fn child_names(node: &LineageNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_first_generation_anchors_under_root() {
        let h = history(&[
            &["AB", "P1"],
            &["AB", "P1"],
            &["AB", "EMS", "P2"],
            &["ABa", "ABp", "EMS", "P2"],
        ]);
        let tree = assemble(&h);

        assert_eq!(tree.roots.len(), 1);
        let root = tree.root().unwrap();
        assert_eq!(child_names(root), vec!["AB", "P1"]);

        let p1 = tree.find("P1").unwrap();
        assert_eq!(child_names(p1), vec!["EMS", "P2"]);
        assert_eq!(p1.parent.as_deref(), Some(ROOT_NAME));

        let ab = tree.find("AB").unwrap();
        assert_eq!(child_names(ab), vec!["ABa", "ABp"]);
        assert!(tree.reparented.is_empty());
    }

    #[test]
    fn test_zygote_start_without_identity_at_t1() {
        // P0 divides between t0 and t1, so t1 emits no root edges and the
        // P1 daughters surface as top-level nodes
        let h = history(&[&["P0"], &["AB", "P1"], &["AB", "EMS", "P2"]]);
        let edges = collect_edges(&h);

        assert_eq!(
            edges,
            vec![
                LineageEdge::new(ROOT_NAME, None),
                LineageEdge::new("EMS", Some("P1")),
                LineageEdge::new("P2", Some("P1")),
            ]
        );

        let tree = assemble_edges(&edges);
        let names: Vec<&str> = tree.roots.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec![ROOT_NAME, "EMS", "P2"]);
    }

    #[test]
    fn test_identity_continuations_after_t1_are_skipped() {
        let h = history(&[&["AB"], &["AB"], &["AB"], &["AB"], &["ABa", "ABp"]]);
        let edges = collect_edges(&h);

        assert_eq!(edges.len(), 4);
        assert_eq!(edges[1], LineageEdge::new("AB", Some(ROOT_NAME)));
    }

    #[test]
    fn test_orphans_after_t1_become_top_level() {
        let h = history(&[&["AB"], &["AB"], &["AB", "Nuc7"]]);
        let tree = assemble(&h);

        let names: Vec<&str> = tree.roots.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec![ROOT_NAME, "Nuc7"]);
        assert_eq!(tree.find("Nuc7").unwrap().parent, None);
    }

    #[test]
    fn test_reparenting_is_last_write_wins() {
        let edges = vec![
            LineageEdge::new(ROOT_NAME, None),
            LineageEdge::new("A", Some(ROOT_NAME)),
            LineageEdge::new("B", Some(ROOT_NAME)),
            LineageEdge::new("X", Some("A")),
            LineageEdge::new("X", Some("B")),
        ];
        let tree = assemble_edges(&edges);

        assert_eq!(tree.reparented, vec!["X".to_string()]);
        assert!(tree.find("A").unwrap().children.is_empty());
        assert_eq!(child_names(tree.find("B").unwrap()), vec!["X"]);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_repeated_identical_edges_are_deduplicated() {
        let edges = vec![
            LineageEdge::new(ROOT_NAME, None),
            LineageEdge::new("A", Some(ROOT_NAME)),
            LineageEdge::new("A", Some(ROOT_NAME)),
        ];
        let tree = assemble_edges(&edges);

        assert!(tree.reparented.is_empty());
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_reparenting_cycle_does_not_hang() {
        let edges = vec![
            LineageEdge::new(ROOT_NAME, None),
            LineageEdge::new("A", Some("B")),
            LineageEdge::new("B", Some("A")),
        ];
        let tree = assemble_edges(&edges);

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.roots.len(), 2);
        assert_eq!(tree.roots[1].name, "A");
        assert_eq!(child_names(&tree.roots[1]), vec!["B"]);
    }

    #[test]
    fn test_tree_queries() {
        let h = history(&[
            &["AB", "P1"],
            &["AB", "P1"],
            &["ABa", "ABp", "P1"],
            &["ABal", "ABar", "ABp", "P1"],
        ]);
        let tree = assemble(&h);

        assert_eq!(tree.node_count(), 7);
        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.leaves(), vec!["ABal", "ABar", "ABp", "P1"]);

        let collapsed = tree.collapsed(2);
        assert_eq!(collapsed.node_count(), 3);
        assert!(collapsed.find("ABa").is_none());
        assert_eq!(tree.collapsed(0).node_count(), 0);
    }

    #[test]
    fn test_long_chain_does_not_overflow_the_stack() {
        const LEN: usize = 100_000;
        let mut edges = vec![LineageEdge::new(ROOT_NAME, None)];
        edges.push(LineageEdge::new("n0", Some(ROOT_NAME)));
        for i in 1..LEN {
            edges.push(LineageEdge::new(format!("n{}", i), Some(format!("n{}", i - 1).as_str())));
        }
        let tree = assemble_edges(&edges);

        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.node_count(), LEN + 1);
        assert_eq!(tree.depth(), LEN + 1);
        assert_eq!(tree.leaves(), vec![format!("n{}", LEN - 1).as_str()]);
        assert_eq!(
            tree.find(&format!("n{}", LEN - 1)).unwrap().parent,
            Some(format!("n{}", LEN - 2))
        );

        let collapsed = tree.collapsed(3);
        assert_eq!(collapsed.node_count(), 3);
        assert_eq!(collapsed.leaves(), vec!["n1"]);
        assert_eq!(tree.collapsed(LEN + 1).node_count(), LEN + 1);
    }

    #[test]
    fn test_empty_history_has_bare_root() {
        let tree = assemble(&History::new());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root().unwrap().name, ROOT_NAME);
    }

    #[test]
    fn test_tree_serializes_without_empty_children() {
        let tree = assemble(&History::new());
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(json, r#"{"roots":[{"name":"root","parent":null}]}"#);
    }

    proptest! {
        #[test]
        fn prop_assembly_is_idempotent(
            frames in prop::collection::vec(
                prop::collection::vec("(AB|P1|EMS|MS)[ap]{0,2}", 0..10),
                1..7,
            )
        ) {
            let resolver = NameResolver::default();
            let mut h = History::new();
            for frame in &frames {
                let rows = frame
                    .iter()
                    .map(|n| SnapshotRow::new(n.clone(), 0.0, 0.0, 0.0, 1.0))
                    .collect();
                h.push_snapshot(rows, &resolver);
            }

            let first = assemble(&h);
            let second = assemble(&h);
            prop_assert_eq!(&first, &second);

            // Every distinct edge name appears exactly once in the tree
            let distinct: HashSet<String> =
                collect_edges(&h).into_iter().map(|e| e.name).collect();
            prop_assert_eq!(first.node_count(), distinct.len());
        }
    }
}

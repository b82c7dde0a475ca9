use super::{DirectedGraph, NodeAttrs, NodeKind};
use std::collections::{BTreeMap, BTreeSet};

/// Which nodes make it into a built graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphMode {
    /// Every seeded node and every edge endpoint.
    Full,

    /// Only nodes known to the run, and edges between them.
    Narrow,
}

/// Accumulates nodes and edge observations, then builds [`DirectedGraph`]s.
///
/// The result does not depend on the order of the calls.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: BTreeMap<String, NodeAttrs>,
    edges: BTreeMap<(String, String), u64>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a node, or merge attributes into an existing one.
    pub fn add_node(&mut self, id: &str, kind: NodeKind, organization: Option<&str>) {
        let attrs = NodeAttrs::new(kind).with_organization(organization);
        match self.nodes.get_mut(id) {
            Some(existing) => existing.merge(&attrs),
            None => {
                let _ = self.nodes.insert(id.to_string(), attrs);
            }
        }
    }

    /// Observe an edge. Repeated observations of the same pair add up their weights.
    pub fn add_edge(&mut self, source: (&str, NodeKind), target: (&str, NodeKind), weight: u64) {
        self.add_node(source.0, source.1, None);
        self.add_node(target.0, target.1, None);

        let total = self.edges.entry((source.0.to_string(), target.0.to_string())).or_insert(0);
        *total = total.saturating_add(weight);
    }

    /// Build a graph. `known` is only consulted in [`GraphMode::Narrow`].
    #[must_use]
    pub fn build(&self, mode: GraphMode, known: &BTreeSet<String>) -> DirectedGraph {
        match mode {
            GraphMode::Full => DirectedGraph {
                nodes: self.nodes.clone(),
                edges: self.edges.clone(),
            },
            GraphMode::Narrow => DirectedGraph {
                nodes: self
                    .nodes
                    .iter()
                    .filter(|(id, _)| known.contains(*id))
                    .map(|(id, attrs)| (id.clone(), attrs.clone()))
                    .collect(),
                edges: self
                    .edges
                    .iter()
                    .filter(|((source, target), _)| known.contains(source) && known.contains(target))
                    .map(|(pair, weight)| (pair.clone(), *weight))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(ToString::to_string).collect()
    }

    fn follows(builder: &mut GraphBuilder, edges: &[(&str, &str)]) {
        for &(s, t) in edges {
            builder.add_edge((s, NodeKind::User), (t, NodeKind::User), 1);
        }
    }

    #[test]
    fn test_repeated_edges_add_weight() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(("alice", NodeKind::User), ("acme/widgets", NodeKind::Repository), 3);
        builder.add_edge(("alice", NodeKind::User), ("acme/widgets", NodeKind::Repository), 2);

        let graph = builder.build(GraphMode::Full, &BTreeSet::new());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight("alice", "acme/widgets"), Some(5));
        assert_eq!(graph.node("acme/widgets").unwrap().kind, NodeKind::Repository);
    }

    #[test]
    fn test_build_is_commutative() {
        let edges = [("a", "b"), ("b", "c"), ("a", "b"), ("c", "a"), ("x", "a")];
        let mut forward = GraphBuilder::new();
        follows(&mut forward, &edges);
        forward.add_node("a", NodeKind::User, Some("acme"));

        let mut reversed = GraphBuilder::new();
        reversed.add_node("a", NodeKind::User, Some("acme"));
        let mut backwards = edges;
        backwards.reverse();
        follows(&mut reversed, &backwards);

        let known = known(&["a", "b"]);
        for mode in [GraphMode::Full, GraphMode::Narrow] {
            assert_eq!(forward.build(mode, &known), reversed.build(mode, &known));
        }
    }

    #[test]
    fn test_seeded_nodes_without_edges_are_kept() {
        let mut builder = GraphBuilder::new();
        builder.add_node("acme/empty", NodeKind::Repository, Some("acme"));

        let graph = builder.build(GraphMode::Full, &BTreeSet::new());
        assert!(graph.contains_node("acme/empty"));
        assert_eq!(graph.node("acme/empty").unwrap().organization_label(), "acme");
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_narrow_drops_outsiders() {
        let mut builder = GraphBuilder::new();
        builder.add_node("alice", NodeKind::User, Some("acme"));
        builder.add_node("bob", NodeKind::User, Some("acme"));
        follows(&mut builder, &[("alice", "bob"), ("stranger", "alice"), ("bob", "celebrity")]);

        let known = known(&["alice", "bob", "acme"]);
        let full = builder.build(GraphMode::Full, &known);
        let narrow = builder.build(GraphMode::Narrow, &known);

        assert_eq!(full.node_count(), 4);
        assert_eq!(full.edge_count(), 3);
        assert_eq!(narrow.nodes().map(|(id, _)| id).collect::<Vec<_>>(), ["alice", "bob"]);
        assert_eq!(narrow.edges().collect::<Vec<_>>(), [("alice", "bob", 1)]);
    }

    #[test]
    fn test_narrow_is_subset_of_full() {
        let mut builder = GraphBuilder::new();
        follows(&mut builder, &[("a", "b"), ("b", "c"), ("d", "a"), ("c", "e")]);
        builder.add_node("f", NodeKind::User, Some("acme"));

        let known = known(&["a", "c", "f", "zzz"]);
        let full = builder.build(GraphMode::Full, &known);
        let narrow = builder.build(GraphMode::Narrow, &known);

        for (id, _) in narrow.nodes() {
            assert!(full.contains_node(id));
        }
        for (s, t, _) in narrow.edges() {
            assert!(narrow.contains_node(s) && narrow.contains_node(t));
        }
        assert!(!narrow.contains_node("zzz"));
    }

    #[test]
    fn test_edge_endpoint_merges_with_seed() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(("alice", NodeKind::User), ("acme", NodeKind::Organization), 1);
        builder.add_node("alice", NodeKind::User, Some("acme"));
        builder.add_node("acme", NodeKind::User, None);

        let graph = builder.build(GraphMode::Full, &BTreeSet::new());
        assert_eq!(graph.node("alice").unwrap().organization_label(), "acme");
        assert_eq!(graph.node("acme").unwrap().kind, NodeKind::Organization);
    }
}

use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, IntoStaticStr};

/// What kind of account or object a node stands for.
///
/// Ordered so that merging two observations of the same node keeps the most specific
/// kind: an account first seen as a user and later as an organization is an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
    User,
    Organization,
    Repository,
}

/// Attributes attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttrs {
    pub kind: NodeKind,

    /// Scraped organizations the node was seen under.
    pub organizations: BTreeSet<String>,
}

impl NodeAttrs {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            organizations: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_organization(mut self, organization: Option<&str>) -> Self {
        if let Some(org) = organization {
            let _ = self.organizations.insert(org.to_string());
        }
        self
    }

    /// Fold another observation of the same node into this one.
    pub fn merge(&mut self, other: &Self) {
        self.kind = self.kind.max(other.kind);
        self.organizations.extend(other.organizations.iter().cloned());
    }

    /// The organizations joined by `;`.
    #[must_use]
    pub fn organization_label(&self) -> String {
        self.organizations.iter().map(String::as_str).collect::<Vec<_>>().join(";")
    }
}

/// A directed graph with weighted edges, keyed by natural identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectedGraph {
    pub(super) nodes: BTreeMap<String, NodeAttrs>,
    pub(super) edges: BTreeMap<(String, String), u64>,
}

impl DirectedGraph {
    /// Nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeAttrs)> {
        self.nodes.iter().map(|(id, attrs)| (id.as_str(), attrs))
    }

    /// Edges ordered by (source, target).
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.edges.iter().map(|((s, t), w)| (s.as_str(), t.as_str(), *w))
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeAttrs> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn edge_weight(&self, source: &str, target: &str) -> Option<u64> {
        self.edges.get(&(source.to_string(), target.to_string())).copied()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_merge_keeps_most_specific() {
        let mut attrs = NodeAttrs::new(NodeKind::User).with_organization(Some("beta"));
        attrs.merge(&NodeAttrs::new(NodeKind::Organization).with_organization(Some("acme")));

        assert_eq!(attrs.kind, NodeKind::Organization);
        assert_eq!(attrs.organization_label(), "acme;beta");

        attrs.merge(&NodeAttrs::new(NodeKind::User));
        assert_eq!(attrs.kind, NodeKind::Organization);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(NodeKind::Repository.to_string(), "repository");
        let name: &'static str = NodeKind::Organization.into();
        assert_eq!(name, "organization");
    }
}

//! Directed graphs folded from relational scrape kinds
//!
//! Contributions, follow relations, and organization memberships are accumulated in a
//! [`GraphBuilder`] as weighted edge observations, plus seeded nodes that must appear even
//! without edges. Building produces a [`DirectedGraph`] in one of two modes:
//!
//! - **Full**: every seeded node and every edge endpoint
//! - **Narrow**: only the members and organizations known to the run, and the edges
//!   between them
//!
//! Nodes and edges live in sorted maps, so the same observations always produce the same
//! graph regardless of the order in which they arrived.

mod builder;
mod directed_graph;

pub use builder::{GraphBuilder, GraphMode};
pub use directed_graph::{DirectedGraph, NodeAttrs, NodeKind};

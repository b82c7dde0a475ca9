//! File exports for harvested data
//!
//! Tables are written as CSV through the `csv` crate, one file per table, with the header
//! row always present. Graphs are written as GEXF 1.2 documents that Gephi and similar
//! tools can open directly. Each [`Harvest`](crate::facts::Harvest) maps to a fixed set of
//! file names inside the run directory.

mod csv;
mod exports;
mod gexf;

pub use exports::{
    CONTRIBUTOR_NETWORK, FULL_FOLLOWER_NETWORK, MEMBERSHIP_NETWORK, NARROW_FOLLOWER_NETWORK, export_failures, export_harvest,
};

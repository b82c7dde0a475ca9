#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for gh-orgnet
//!
//! This library consolidates all functionality for the gh-orgnet tool, which harvests
//! organizational accounts on GitHub and exports them as CSV tables and GEXF networks.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`facts`]: Rate-limited API access, pagination, and entity collection
//! - [`graph`]: Directed graphs folded from relational scrape kinds
//! - [`reports`]: CSV and GEXF exporters

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod facts;
pub mod graph;
pub mod reports;

pub use crate::commands::{Host, run};

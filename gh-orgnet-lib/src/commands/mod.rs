//! Command-line interface and orchestration for gh-orgnet
//!
//! This module implements the CLI commands and drives the collector and exporters end
//! to end. It handles argument parsing, configuration management, and the high-level
//! workflow of a run.
//!
//! # Commands
//!
//! - **scrape**: Resolve configuration, credential, and organizations, then collect
//!   each requested kind in order and export its tables and graphs into a timestamped
//!   run directory, followed by the failure manifest
//! - **init**: Generate a default configuration file
//! - **orgs**: Derive an organizations file from a Code for All style directory
//!
//! Configuration comes from an optional TOML file; command-line flags and the
//! `GITHUB_USER`/`GITHUB_TOKEN` environment variables take precedence over it.

mod common;
mod config;
mod host;
mod init;
mod org_list;
mod orgs;
mod progress_reporter;
mod run;
mod scrape;

#[cfg(debug_assertions)]
pub use config::Config;

pub use host::Host;
pub use init::{InitArgs, init_config};
pub use orgs::{OrgsArgs, process_orgs};
pub use run::run;
pub use scrape::{ScrapeArgs, process_scrape};

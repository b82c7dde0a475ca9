//! Command dispatch logic for gh-orgnet

use super::{InitArgs, OrgsArgs, ScrapeArgs, init_config, process_orgs, process_scrape};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "gh-orgnet", version, author, long_about = None)]
#[command(about = "Harvest GitHub organization data into CSV tables and GEXF networks")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape organizations and export tables and networks
    Scrape(Box<ScrapeArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Build an organizations file from a Code for All style directory
    Orgs(OrgsArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Scrape(scrape_args) => process_scrape(host, scrape_args).await,
        Command::Init(init_args) => init_config(host, init_args),
        Command::Orgs(orgs_args) => process_orgs(host, orgs_args).await,
    }
}

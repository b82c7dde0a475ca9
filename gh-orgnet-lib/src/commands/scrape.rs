use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use super::org_list::read_organizations;
use super::progress_reporter::ProgressReporter;
use crate::Result;
use crate::facts::{Client, Collector, Credential, Failure, Progress, ScrapeKind};
use crate::reports::{export_failures, export_harvest};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use clap::Parser;
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, app_err, bail};
use owo_colors::OwoColorize;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use strum::IntoEnumIterator;

const LOG_TARGET: &str = "    scrape";

/// Name format of the per-run output directory.
const RUN_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// How long a run must last before the progress bar appears.
const PROGRESS_DELAY: Duration = Duration::from_millis(300);

#[derive(Parser, Debug, Default)]
#[expect(clippy::struct_excessive_bools, reason = "one flag per kind of data")]
pub struct ScrapeArgs {
    /// Scrape every kind of data
    #[arg(long, short = 'a', help_heading = "Data")]
    pub all: bool,

    /// Organization repositories
    #[arg(long, short = 'r', help_heading = "Data")]
    pub repos: bool,

    /// Contributors of the organization repositories, with the contributor network
    #[arg(long, short = 'c', help_heading = "Data")]
    pub contributors: bool,

    /// Repositories owned by organization members
    #[arg(long, help_heading = "Data")]
    pub member_repos: bool,

    /// Profiles of organization members
    #[arg(long, help_heading = "Data")]
    pub member_infos: bool,

    /// Repositories starred by organization members
    #[arg(long, short = 's', help_heading = "Data")]
    pub starred: bool,

    /// Follower relations of organization members, with the full and narrow networks
    #[arg(long, short = 'f', help_heading = "Data")]
    pub followers: bool,

    /// Organization members and their memberships, with the membership network
    #[arg(long, short = 'm', help_heading = "Data")]
    pub memberships: bool,

    /// Organization to scrape; repeat to scrape several (replaces the organizations file)
    #[arg(long = "org", value_name = "NAME")]
    pub orgs: Vec<String>,

    /// CSV file with a `github_org_name` column
    #[arg(long, value_name = "PATH")]
    pub orgs_file: Option<Utf8PathBuf>,

    /// Directory receiving the timestamped run directory
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<Utf8PathBuf>,

    /// GitHub user name
    #[arg(long, env = "GITHUB_USER", value_name = "NAME")]
    pub user: Option<String>,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Path to configuration file (default is `gh-orgnet.toml`)
    #[arg(long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,
}

impl ScrapeArgs {
    /// The kinds selected on the command line, in execution order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ScrapeKind> {
        if self.all {
            return ScrapeKind::iter().collect();
        }

        let selected = [
            (self.memberships, ScrapeKind::Memberships),
            (self.repos, ScrapeKind::Repositories),
            (self.contributors, ScrapeKind::Contributors),
            (self.member_repos, ScrapeKind::MemberRepos),
            (self.member_infos, ScrapeKind::MemberInfos),
            (self.starred, ScrapeKind::Starred),
            (self.followers, ScrapeKind::Followers),
        ];

        Collector::plan(selected.into_iter().filter(|(on, _)| *on).map(|(_, kind)| kind))
    }

    /// Fold the command-line overrides into the loaded configuration.
    fn apply_to(&self, mut config: Config) -> Result<Config> {
        if let Some(user) = &self.user {
            config.user_name = Some(user.clone());
        }
        if let Some(token) = &self.token {
            config.api_token = Some(token.clone());
        }
        if let Some(url) = &self.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(path) = &self.orgs_file {
            config.organizations_file.clone_from(path);
        }
        if let Some(path) = &self.output_dir {
            config.output_dir.clone_from(path);
        }

        config.validate()?;
        Ok(config)
    }
}

pub async fn process_scrape<H: Host>(host: &mut H, args: &ScrapeArgs) -> Result<()> {
    init_logging(args.log_level);

    let kinds = args.kinds();
    if kinds.is_empty() {
        bail!("nothing to scrape: pass --all or at least one of --memberships, --repos, --contributors, --member-repos, --member-infos, --starred, --followers");
    }

    let config = args.apply_to(Config::load(args.config.as_deref())?)?;
    let credential = credential(&config)?;

    let organizations = if args.orgs.is_empty() {
        read_organizations(&config.organizations_file)?
    } else {
        args.orgs.clone()
    };

    let run_dir = create_run_dir(&config.output_dir)?;
    log::info!(target: LOG_TARGET, "Writing results to '{run_dir}'");

    let delay = if args.log_level == LogLevel::None {
        PROGRESS_DELAY
    } else {
        Duration::from_secs(365 * 24 * 60 * 60)
    };
    let progress = Arc::new(ProgressReporter::new(delay, args.color.enabled_for(&std::io::stderr())));
    let progress_sink: Arc<dyn Progress> = Arc::clone(&progress) as Arc<dyn Progress>;

    let client = Client::new(credential, config.client_options())?;
    let client = if args.log_level == LogLevel::None {
        client.with_progress(Arc::clone(&progress_sink))
    } else {
        client
    };
    let mut collector = Collector::new(client, organizations, progress_sink)?;

    let mut failures = Vec::new();
    let outcome = collect_kinds(host, &mut collector, &kinds, &run_dir, &mut failures).await;
    progress.done();

    // Units abandoned before an abort are still reported.
    if let Some(path) = export_failures(&failures, &run_dir)? {
        let use_colors = args.color.enabled_for(&std::io::stderr());
        report_failures(&mut host.error(), &failures, &path, use_colors)?;
    }

    outcome
}

/// Collect and export each kind in turn, gathering unit failures into `failures`.
async fn collect_kinds<H: Host>(
    host: &mut H,
    collector: &mut Collector,
    kinds: &[ScrapeKind],
    run_dir: &Utf8Path,
    failures: &mut Vec<Failure>,
) -> Result<()> {
    for &kind in kinds {
        let report = collector.collect(kind).await?;
        failures.extend(report.failures);
        let Some(harvest) = report.harvest else {
            continue;
        };

        let files = export_harvest(&harvest, run_dir).map_err(|e| e.enrich(format!("could not export {}", harvest.kind())))?;
        for file in files {
            let _ = writeln!(host.output(), "- file saved as {file}");
        }
    }

    Ok(())
}

fn credential(config: &Config) -> Result<Credential> {
    let user = config
        .user_name
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| app_err!("no GitHub user name: pass --user, set GITHUB_USER, or add user_name to the configuration file"))?;
    let token = config
        .api_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| app_err!("no GitHub token: pass --token, set GITHUB_TOKEN, or add api_token to the configuration file"))?;

    Ok(Credential::new(user, token))
}

fn create_run_dir(output_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let run_dir = output_dir.join(Local::now().format(RUN_DIR_FORMAT).to_string());
    fs::create_dir_all(&run_dir).into_app_err_with(|| format!("creating output directory '{run_dir}'"))?;
    Ok(run_dir)
}

fn report_failures(out: &mut impl Write, failures: &[Failure], manifest: &Utf8Path, use_colors: bool) -> Result<()> {
    let heading = format!("{} unit(s) could not be scraped, see {manifest}", failures.len());
    if use_colors {
        writeln!(out, "{}", heading.yellow().bold()).into_app_err("writing failure summary")?;
    } else {
        writeln!(out, "{heading}").into_app_err("writing failure summary")?;
    }

    for failure in failures {
        let written = if use_colors {
            writeln!(out, "  {} {}: {}", format!("[{}]", failure.kind).red(), failure.unit.bold(), failure.reason)
        } else {
            writeln!(out, "  {failure}")
        };
        written.into_app_err("writing failure summary")?;
    }

    Ok(())
}

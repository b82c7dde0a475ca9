use super::Host;
use super::common::{LogLevel, init_logging};
use super::org_list::write_organizations;
use crate::Result;
use crate::facts::RetryPolicy;
use crate::facts::resilient_http::{DEFAULT_REQUEST_TIMEOUT, resilient_get};
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::{IntoAppError, app_err, bail};
use serde::Deserialize;
use std::io::Write;
use url::Url;

const LOG_TARGET: &str = "      orgs";

/// Civic tech organization directory maintained by Code for All.
pub const DEFAULT_SOURCE_URL: &str = "https://raw.githubusercontent.com/Code-for-All/codeforall.org/gh-pages/_data/organizations.json";

#[derive(Parser, Debug)]
pub struct OrgsArgs {
    /// URL of an `organizations.json` directory
    #[arg(long, value_name = "URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Keep only entries carrying this tag (case-insensitive)
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Write an organizations CSV file instead of printing the names
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// One entry of an organization directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgEntry {
    #[serde(default)]
    pub projects_list_url: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl OrgEntry {
    fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .is_some_and(|tags| tags.iter().any(|t| t.trim().eq_ignore_ascii_case(tag)))
    }
}

/// GitHub organization logins of the entries carrying `tag`, in directory order and without repeats.
#[must_use]
pub fn org_slugs(entries: &[OrgEntry], tag: Option<&str>) -> Vec<String> {
    let mut slugs: Vec<String> = Vec::new();
    for entry in entries {
        if tag.is_some_and(|tag| !entry.has_tag(tag)) {
            continue;
        }

        if let Some(slug) = entry.projects_list_url.as_deref().and_then(github_slug)
            && !slugs.contains(&slug)
        {
            slugs.push(slug);
        }
    }

    slugs
}

/// The account name in a github.com URL: the last non-empty path segment.
fn github_slug(url: &str) -> Option<String> {
    let url = Url::parse(url.trim()).ok()?;
    if !matches!(url.host_str()?, "github.com" | "www.github.com") {
        return None;
    }

    url.path_segments()?.rev().find(|s| !s.is_empty()).map(str::to_string)
}

pub async fn process_orgs<H: Host>(host: &mut H, args: &OrgsArgs) -> Result<()> {
    init_logging(args.log_level);

    let entries = download_entries(&args.source_url).await?;
    let slugs = org_slugs(&entries, args.tag.as_deref());
    log::info!(target: LOG_TARGET, "Found {} GitHub organization(s) among {} entries", slugs.len(), entries.len());

    if let Some(path) = &args.output {
        write_organizations(path, &slugs)?;
        let _ = writeln!(host.output(), "Wrote {} organization(s) to {path}", slugs.len());
    } else {
        let mut out = host.output();
        for slug in &slugs {
            writeln!(out, "{slug}").into_app_err("writing organization names")?;
        }
    }

    Ok(())
}

async fn download_entries(source_url: &str) -> Result<Vec<OrgEntry>> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("gh-orgnet/", env!("CARGO_PKG_VERSION")))
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .into_app_err("unable to create HTTP client")?;

    log::info!(target: LOG_TARGET, "Downloading organization directory from '{source_url}'");
    let response = resilient_get(|| http.get(source_url), &RetryPolicy::default())
        .await
        .map_err(|e| app_err!("downloading '{source_url}': {e}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("downloading '{source_url}': HTTP {status}");
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).into_app_err_with(|| format!("parsing organization directory from '{source_url}'"))
}

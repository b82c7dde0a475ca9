use crate::Result;
use crate::facts::{ClientOptions, DEFAULT_API_BASE_URL, MAX_PER_PAGE, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use core::fmt::{Debug, Formatter};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gh-orgnet.toml";

#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// GitHub user name for basic authentication
    pub user_name: Option<String>,

    /// GitHub personal access token for basic authentication
    pub api_token: Option<String>,

    /// Base URL of the GitHub REST API
    pub api_base_url: String,

    /// CSV file with a `github_org_name` column
    pub organizations_file: Utf8PathBuf,

    /// Directory receiving one timestamped subdirectory per run
    pub output_dir: Utf8PathBuf,

    /// Records requested per page (1..=100)
    pub per_page: u32,

    /// Retries for server errors and network failures
    pub max_retries: usize,

    /// Base delay of the exponential backoff, in milliseconds
    pub retry_base_delay_ms: u64,

    /// Upper bound of a single wait on an exhausted quota, in seconds
    pub max_rate_limit_wait_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: None,
            api_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            organizations_file: Utf8PathBuf::from("organizations.csv"),
            output_dir: Utf8PathBuf::from("data"),
            per_page: MAX_PER_PAGE,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            max_rate_limit_wait_secs: 3600,
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("user_name", &self.user_name)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("organizations_file", &self.organizations_file)
            .field("output_dir", &self.output_dir)
            .field("per_page", &self.per_page)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("max_rate_limit_wait_secs", &self.max_rate_limit_wait_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// An explicit `config_path` must exist. Without one, `gh-orgnet.toml` in the working
    /// directory is used when present.
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading gh-orgnet configuration file '{path}'"))?;
            (path.to_path_buf(), text)
        } else {
            let path = Utf8PathBuf::from(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading gh-orgnet configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            return Err(app_err!("per_page must be between 1 and {MAX_PER_PAGE}, got {}", self.per_page));
        }

        let url = Url::parse(&self.api_base_url).into_app_err_with(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(app_err!("api_base_url must use http or https, got '{}'", url.scheme()));
        }

        if self.retry_base_delay_ms == 0 && self.max_retries > 0 {
            return Err(app_err!("retry_base_delay_ms must be positive when retries are enabled"));
        }

        Ok(())
    }

    /// Request engine settings derived from this configuration.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_base_url.clone(),
            per_page: self.per_page,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
            max_rate_limit_wait: Duration::from_secs(self.max_rate_limit_wait_secs),
            ..ClientOptions::default()
        }
    }
}

//! Shapes of the GitHub REST API payloads the collector reads.
//!
//! Only the fields that end up in a table or a graph are declared; everything else in
//! the payload is ignored.

use serde::Deserialize;
use serde_json::Value;

/// Account reference embedded in other payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// An entry of `orgs/{org}/repos`, `users/{user}/repos` or `users/{user}/starred`.
#[derive(Debug, Clone, Deserialize)]
#[expect(clippy::struct_field_names, reason = "field names match GitHub API exactly")]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: Option<u64>,
    #[serde(default)]
    pub forks_count: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// An entry of `repos/{owner}/{repo}/contributors`.
///
/// Anonymous contributors (when requested) come without a login.
#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub contributions: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// An entry of `orgs/{org}/members`, `users/{user}/followers` or `users/{user}/following`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// The payload of `users/{user}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// An entry of `users/{user}/orgs`.
#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub login: String,
}

/// Decode a raw record into one of the payload shapes.
pub fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}

//! Rows of the tables the collector produces.
//!
//! Each row type serializes to exactly the columns listed in its [`Record::COLUMNS`], in
//! that order, so the CSV exporter can write the header row even for an empty table.

use core::fmt::Debug;
use serde::Serialize;

/// A row that can be stored in a [`ScrapeTable`](super::ScrapeTable).
pub trait Record: Serialize + Debug {
    /// Natural identity of the row. Two rows with the same key describe the same entity.
    type Key: Ord + Clone + Debug;

    /// Name of the exported table, without extension.
    const TABLE_NAME: &'static str;

    /// Column names, in serialization order.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    /// Fold a newer observation of the same entity into this row.
    ///
    /// Scalar fields take the newer values.
    fn absorb(&mut self, newer: Self)
    where
        Self: Sized,
    {
        *self = newer;
    }
}

/// A repository owned by one of the scraped organizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgRepository {
    pub organization: String,
    pub name: String,
    pub full_name: String,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub homepage: Option<String>,
    pub fork: bool,
    pub description: Option<String>,
}

impl Record for OrgRepository {
    type Key = String;

    const TABLE_NAME: &'static str = "org_repositories";
    const COLUMNS: &'static [&'static str] = &[
        "organization",
        "name",
        "full_name",
        "stargazers_count",
        "forks_count",
        "language",
        "created_at",
        "updated_at",
        "homepage",
        "fork",
        "description",
    ];

    fn key(&self) -> String {
        self.full_name.clone()
    }
}

/// A contributor of a repository owned by a scraped organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub organization: String,
    pub repository: String,
    pub login: String,
    pub contributions: u64,
    pub html_url: Option<String>,
    pub url: Option<String>,
}

impl Record for Contribution {
    type Key = (String, String);

    const TABLE_NAME: &'static str = "contributor_list";
    const COLUMNS: &'static [&'static str] = &["organization", "repository", "login", "contributions", "html_url", "url"];

    fn key(&self) -> (String, String) {
        (self.login.clone(), self.repository.clone())
    }

    fn absorb(&mut self, newer: Self) {
        let contributions = self.contributions.saturating_add(newer.contributions);
        *self = newer;
        self.contributions = contributions;
    }
}

/// A repository owned by a member of a scraped organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRepository {
    pub organization: String,
    pub user: String,
    pub full_name: String,
    pub fork: bool,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub language: Option<String>,
    pub description: Option<String>,
}

impl Record for MemberRepository {
    type Key = String;

    const TABLE_NAME: &'static str = "members_repositories";
    const COLUMNS: &'static [&'static str] = &[
        "organization",
        "user",
        "full_name",
        "fork",
        "stargazers_count",
        "forks_count",
        "language",
        "description",
    ];

    fn key(&self) -> String {
        self.full_name.clone()
    }
}

/// Public profile of a member of a scraped organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberInfo {
    pub organization: String,
    pub login: String,
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
}

impl Record for MemberInfo {
    type Key = String;

    const TABLE_NAME: &'static str = "members_info";
    const COLUMNS: &'static [&'static str] = &["organization", "login", "name", "url", "type", "company", "blog", "location"];

    fn key(&self) -> String {
        self.login.clone()
    }
}

/// A repository starred by a member of a scraped organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarredRepository {
    pub organization: String,
    pub user: String,
    pub full_name: String,
    pub html_url: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
}

impl Record for StarredRepository {
    type Key = (String, String);

    const TABLE_NAME: &'static str = "starred_repositories";
    const COLUMNS: &'static [&'static str] = &["organization", "user", "full_name", "html_url", "language", "description"];

    fn key(&self) -> (String, String) {
        (self.user.clone(), self.full_name.clone())
    }
}

/// One account following another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Follow {
    pub follower: String,
    pub followed: String,
    pub weight: u64,
}

impl Record for Follow {
    type Key = (String, String);

    const TABLE_NAME: &'static str = "follower_list";
    const COLUMNS: &'static [&'static str] = &["follower", "followed", "weight"];

    fn key(&self) -> (String, String) {
        (self.follower.clone(), self.followed.clone())
    }

    fn absorb(&mut self, newer: Self) {
        self.weight = self.weight.saturating_add(newer.weight);
    }
}

/// A public member of a scraped organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgMember {
    pub organization: String,
    pub login: String,
    pub html_url: Option<String>,
}

impl Record for OrgMember {
    type Key = (String, String);

    const TABLE_NAME: &'static str = "members_list";
    const COLUMNS: &'static [&'static str] = &["organization", "login", "html_url"];

    fn key(&self) -> (String, String) {
        (self.organization.clone(), self.login.clone())
    }
}

/// A member's public membership in any organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub login: String,
    pub organization: String,
    pub weight: u64,
}

impl Record for Membership {
    type Key = (String, String);

    const TABLE_NAME: &'static str = "membership_list";
    const COLUMNS: &'static [&'static str] = &["login", "organization", "weight"];

    fn key(&self) -> (String, String) {
        (self.login.clone(), self.organization.clone())
    }

    fn absorb(&mut self, newer: Self) {
        self.weight = self.weight.saturating_add(newer.weight);
    }
}

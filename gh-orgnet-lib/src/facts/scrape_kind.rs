use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A category of data the collector can harvest.
///
/// Variants are declared in execution order: `Memberships` comes first because it loads
/// the roster of organization members the member-level kinds depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScrapeKind {
    Memberships,
    Repositories,
    Contributors,
    MemberRepos,
    MemberInfos,
    Starred,
    Followers,
}

impl ScrapeKind {
    /// Whether this kind walks the members loaded by [`ScrapeKind::Memberships`].
    #[must_use]
    pub const fn requires_roster(self) -> bool {
        matches!(self, Self::MemberRepos | Self::MemberInfos | Self::Starred | Self::Followers)
    }

    /// Short human-readable description used in progress output.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Memberships => "organization memberships",
            Self::Repositories => "organization repositories",
            Self::Contributors => "repository contributors",
            Self::MemberRepos => "member repositories",
            Self::MemberInfos => "member profiles",
            Self::Starred => "starred repositories",
            Self::Followers => "follower networks",
        }
    }
}

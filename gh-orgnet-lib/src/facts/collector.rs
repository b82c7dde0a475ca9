use super::api::{self, Contributor, Organization, Repository, User, UserProfile};
use super::client::{Client, FetchError};
use super::paginator::fetch_all;
use super::progress::Progress;
use super::records::{Contribution, Follow, MemberInfo, MemberRepository, Membership, OrgMember, OrgRepository, StarredRepository};
use super::{Failure, Roster, ScrapeKind, ScrapeTable};
use crate::Result;
use crate::graph::{DirectedGraph, GraphBuilder, GraphMode, NodeKind};
use ohno::{app_err, bail};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const LOG_TARGET: &str = " collector";

/// The tables and graphs harvested for one kind.
#[derive(Debug, Clone)]
pub enum Harvest {
    Memberships {
        members: ScrapeTable<OrgMember>,
        memberships: ScrapeTable<Membership>,
        network: DirectedGraph,
    },
    Repositories {
        repositories: ScrapeTable<OrgRepository>,
    },
    Contributors {
        contributions: ScrapeTable<Contribution>,
        network: DirectedGraph,
    },
    MemberRepos {
        repositories: ScrapeTable<MemberRepository>,
    },
    MemberInfos {
        profiles: ScrapeTable<MemberInfo>,
    },
    Starred {
        starred: ScrapeTable<StarredRepository>,
    },
    Followers {
        follows: ScrapeTable<Follow>,
        full_network: DirectedGraph,
        narrow_network: DirectedGraph,
    },
}

impl Harvest {
    #[must_use]
    pub const fn kind(&self) -> ScrapeKind {
        match self {
            Self::Memberships { .. } => ScrapeKind::Memberships,
            Self::Repositories { .. } => ScrapeKind::Repositories,
            Self::Contributors { .. } => ScrapeKind::Contributors,
            Self::MemberRepos { .. } => ScrapeKind::MemberRepos,
            Self::MemberInfos { .. } => ScrapeKind::MemberInfos,
            Self::Starred { .. } => ScrapeKind::Starred,
            Self::Followers { .. } => ScrapeKind::Followers,
        }
    }
}

/// What collecting one kind produced.
#[derive(Debug, Clone)]
pub struct KindReport {
    pub kind: ScrapeKind,

    /// `None` when the kind was skipped.
    pub harvest: Option<Harvest>,

    pub failures: Vec<Failure>,
}

/// Harvests GitHub data for a fixed list of organizations, one kind at a time.
pub struct Collector {
    client: Client,
    organizations: Vec<String>,
    progress: Arc<dyn Progress>,
    roster: Option<Roster>,
    org_repositories: BTreeMap<String, Vec<Repository>>,
}

impl core::fmt::Debug for Collector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collector")
            .field("client", &self.client)
            .field("organizations", &self.organizations)
            .field("roster", &self.roster)
            .field("progress", &"<dyn Progress>")
            .finish_non_exhaustive()
    }
}

impl Collector {
    /// Create a collector for `organizations`, scraped in the given order.
    ///
    /// Duplicate organization names are ignored. An empty list is an error.
    pub fn new(client: Client, organizations: impl IntoIterator<Item = String>, progress: Arc<dyn Progress>) -> Result<Self> {
        let mut unique = Vec::new();
        for org in organizations {
            let org = org.trim().to_string();
            if !org.is_empty() && !unique.contains(&org) {
                unique.push(org);
            }
        }

        if unique.is_empty() {
            bail!("no organizations to scrape");
        }

        Ok(Self {
            client,
            organizations: unique,
            progress,
            roster: None,
            org_repositories: BTreeMap::new(),
        })
    }

    /// The order in which `kinds` must run: deduplicated, `memberships` first.
    #[must_use]
    pub fn plan(kinds: impl IntoIterator<Item = ScrapeKind>) -> Vec<ScrapeKind> {
        kinds.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
    }

    #[must_use]
    pub fn organizations(&self) -> &[String] {
        &self.organizations
    }

    /// The roster loaded by [`ScrapeKind::Memberships`], once it ran.
    #[must_use]
    pub const fn roster(&self) -> Option<&Roster> {
        self.roster.as_ref()
    }

    /// Harvest one kind.
    ///
    /// Units whose requests fail are recorded as failures and skipped. The only error
    /// returned is a rejected credential, which makes every further request pointless.
    pub async fn collect(&mut self, kind: ScrapeKind) -> Result<KindReport> {
        self.progress.set_phase(kind.description());
        log::info!(target: LOG_TARGET, "Collecting {}", kind.description());

        let mut failures = Vec::new();
        let harvest = if kind.requires_roster() && self.roster.is_none() {
            log::warn!(target: LOG_TARGET, "Skipping {kind}: the organization members have not been loaded");
            failures.push(Failure::missing_dependency(kind));
            None
        } else {
            Some(match kind {
                ScrapeKind::Memberships => {
                    let (harvest, roster) = self.collect_memberships(&mut failures).await?;
                    self.roster = Some(roster);
                    harvest
                }
                ScrapeKind::Repositories => self.collect_repositories(&mut failures).await?,
                ScrapeKind::Contributors => self.collect_contributors(&mut failures).await?,
                ScrapeKind::MemberRepos => self.collect_member_repos(&mut failures).await?,
                ScrapeKind::MemberInfos => self.collect_member_infos(&mut failures).await?,
                ScrapeKind::Starred => self.collect_starred(&mut failures).await?,
                ScrapeKind::Followers => self.collect_followers(&mut failures).await?,
            })
        };

        log::info!(
            target: LOG_TARGET,
            "Finished {} with {} failed unit(s)",
            kind.description(),
            failures.len()
        );

        Ok(KindReport { kind, harvest, failures })
    }

    fn loaded_roster(&self, kind: ScrapeKind) -> Result<&Roster> {
        self.roster
            .as_ref()
            .ok_or_else(|| app_err!("cannot collect {kind} before the organization members are loaded"))
    }

    async fn collect_memberships(&self, failures: &mut Vec<Failure>) -> Result<(Harvest, Roster)> {
        let kind = ScrapeKind::Memberships;
        let mut roster = Roster::new();
        let mut members = ScrapeTable::new();
        let mut memberships = ScrapeTable::new();
        let mut builder = GraphBuilder::new();

        for (index, org) in self.organizations.iter().enumerate() {
            self.report_unit(index, self.organizations.len(), org);
            roster.add_organization(org);
            builder.add_node(org, NodeKind::Organization, Some(org));

            let result = self.fetch_list::<User>(&format!("orgs/{org}/members")).await;
            let Some(users) = settle(result, kind, org, failures)? else {
                continue;
            };

            for user in users {
                roster.add_member(org, &user.login);
                let _ = members.upsert(OrgMember {
                    organization: org.clone(),
                    login: user.login,
                    html_url: user.html_url,
                });
            }
        }

        let logins: Vec<&str> = roster.members().collect();
        for (index, login) in logins.iter().copied().enumerate() {
            self.report_unit(index, logins.len(), login);
            for org in roster.organizations_of(login) {
                builder.add_node(login, NodeKind::User, Some(org));
            }

            let result = self.fetch_list::<Organization>(&format!("users/{login}/orgs")).await;
            let Some(organizations) = settle(result, kind, login, failures)? else {
                continue;
            };

            for organization in organizations {
                builder.add_edge((login, NodeKind::User), (&organization.login, NodeKind::Organization), 1);
                let _ = memberships.upsert(Membership {
                    login: login.to_string(),
                    organization: organization.login,
                    weight: 1,
                });
            }
        }

        let network = builder.build(GraphMode::Full, &roster.known_accounts());
        let harvest = Harvest::Memberships {
            members,
            memberships,
            network,
        };

        Ok((harvest, roster))
    }

    async fn collect_repositories(&mut self, failures: &mut Vec<Failure>) -> Result<Harvest> {
        let kind = ScrapeKind::Repositories;
        let mut repositories = ScrapeTable::new();

        for (index, org) in self.organizations.iter().enumerate() {
            self.report_unit(index, self.organizations.len(), org);

            let result = self.fetch_list::<Repository>(&format!("orgs/{org}/repos")).await;
            let Some(repos) = settle(result, kind, org, failures)? else {
                continue;
            };

            for repo in &repos {
                let _ = repositories.upsert(OrgRepository {
                    organization: org.clone(),
                    name: repo.name.clone(),
                    full_name: repo.full_name.clone(),
                    stargazers_count: repo.stargazers_count,
                    forks_count: repo.forks_count,
                    language: repo.language.clone(),
                    created_at: repo.created_at.clone(),
                    updated_at: repo.updated_at.clone(),
                    homepage: repo.homepage.clone(),
                    fork: repo.fork,
                    description: repo.description.clone(),
                });
            }

            let _ = self.org_repositories.insert(org.clone(), repos);
        }

        Ok(Harvest::Repositories { repositories })
    }

    async fn collect_contributors(&mut self, failures: &mut Vec<Failure>) -> Result<Harvest> {
        let kind = ScrapeKind::Contributors;
        let mut contributions = ScrapeTable::new();
        let mut builder = GraphBuilder::new();

        for org in self.organizations.clone() {
            let repos = if let Some(cached) = self.org_repositories.get(&org) {
                log::debug!(target: LOG_TARGET, "Reusing {} repositories already listed for '{org}'", cached.len());
                cached.clone()
            } else {
                let result = self.fetch_list::<Repository>(&format!("orgs/{org}/repos")).await;
                let Some(repos) = settle(result, kind, &org, failures)? else {
                    continue;
                };
                let _ = self.org_repositories.insert(org.clone(), repos.clone());
                repos
            };

            for (index, repo) in repos.iter().enumerate() {
                self.report_unit(index, repos.len(), &repo.full_name);
                builder.add_node(&repo.full_name, NodeKind::Repository, Some(&org));

                let endpoint = format!("repos/{}/{}/contributors", repo.owner.login, repo.name);
                let result = self.fetch_list::<Contributor>(&endpoint).await;
                let Some(contributors) = settle(result, kind, &repo.full_name, failures)? else {
                    continue;
                };

                for contributor in contributors {
                    let Some(login) = contributor.login else {
                        continue;
                    };

                    builder.add_node(&login, NodeKind::User, Some(&org));
                    builder.add_edge(
                        (&login, NodeKind::User),
                        (&repo.full_name, NodeKind::Repository),
                        contributor.contributions,
                    );
                    let _ = contributions.upsert(Contribution {
                        organization: org.clone(),
                        repository: repo.full_name.clone(),
                        login,
                        contributions: contributor.contributions,
                        html_url: contributor.html_url,
                        url: contributor.url,
                    });
                }
            }
        }

        let network = builder.build(GraphMode::Full, &BTreeSet::new());
        Ok(Harvest::Contributors { contributions, network })
    }

    async fn collect_member_repos(&self, failures: &mut Vec<Failure>) -> Result<Harvest> {
        let kind = ScrapeKind::MemberRepos;
        let roster = self.loaded_roster(kind)?;
        let mut repositories = ScrapeTable::new();

        for (index, login) in roster.members().enumerate() {
            self.report_unit(index, roster.member_count(), login);

            let result = self.fetch_list::<Repository>(&format!("users/{login}/repos")).await;
            let Some(repos) = settle(result, kind, login, failures)? else {
                continue;
            };

            let organization = roster.organization_label(login);
            for repo in repos {
                let _ = repositories.upsert(MemberRepository {
                    organization: organization.clone(),
                    user: login.to_string(),
                    full_name: repo.full_name,
                    fork: repo.fork,
                    stargazers_count: repo.stargazers_count,
                    forks_count: repo.forks_count,
                    language: repo.language,
                    description: repo.description,
                });
            }
        }

        Ok(Harvest::MemberRepos { repositories })
    }

    async fn collect_member_infos(&self, failures: &mut Vec<Failure>) -> Result<Harvest> {
        let kind = ScrapeKind::MemberInfos;
        let roster = self.loaded_roster(kind)?;
        let mut profiles = ScrapeTable::new();

        for (index, login) in roster.members().enumerate() {
            self.report_unit(index, roster.member_count(), login);

            let result = self.fetch_object::<UserProfile>(&format!("users/{login}")).await;
            let Some(Some(profile)) = settle(result, kind, login, failures)? else {
                continue;
            };

            let _ = profiles.upsert(MemberInfo {
                organization: roster.organization_label(login),
                login: profile.login,
                name: profile.name,
                url: profile.url,
                account_type: profile.account_type,
                company: profile.company,
                blog: profile.blog,
                location: profile.location,
            });
        }

        Ok(Harvest::MemberInfos { profiles })
    }

    async fn collect_starred(&self, failures: &mut Vec<Failure>) -> Result<Harvest> {
        let kind = ScrapeKind::Starred;
        let roster = self.loaded_roster(kind)?;
        let mut starred = ScrapeTable::new();

        for (index, login) in roster.members().enumerate() {
            self.report_unit(index, roster.member_count(), login);

            let result = self.fetch_list::<Repository>(&format!("users/{login}/starred")).await;
            let Some(repos) = settle(result, kind, login, failures)? else {
                continue;
            };

            let organization = roster.organization_label(login);
            for repo in repos {
                let _ = starred.upsert(StarredRepository {
                    organization: organization.clone(),
                    user: login.to_string(),
                    full_name: repo.full_name,
                    html_url: repo.html_url,
                    language: repo.language,
                    description: repo.description,
                });
            }
        }

        Ok(Harvest::Starred { starred })
    }

    async fn collect_followers(&self, failures: &mut Vec<Failure>) -> Result<Harvest> {
        let kind = ScrapeKind::Followers;
        let roster = self.loaded_roster(kind)?;
        let mut follows = ScrapeTable::new();
        let mut builder = GraphBuilder::new();

        for login in roster.members() {
            for org in roster.organizations_of(login) {
                builder.add_node(login, NodeKind::User, Some(org));
            }
        }

        // The same relation shows up in both members' lists; count it once.
        let mut relations = BTreeSet::new();
        for (index, login) in roster.members().enumerate() {
            self.report_unit(index, roster.member_count(), login);

            let followers = self.fetch_list::<User>(&format!("users/{login}/followers")).await;
            let Some(followers) = settle(followers, kind, login, failures)? else {
                continue;
            };
            let following = self.fetch_list::<User>(&format!("users/{login}/following")).await;
            let Some(following) = settle(following, kind, login, failures)? else {
                continue;
            };

            relations.extend(followers.into_iter().map(|f| (f.login, login.to_string())));
            relations.extend(following.into_iter().map(|f| (login.to_string(), f.login)));
        }

        for (follower, followed) in relations {
            builder.add_edge((&follower, NodeKind::User), (&followed, NodeKind::User), 1);
            let _ = follows.upsert(Follow {
                follower,
                followed,
                weight: 1,
            });
        }

        let known = roster.known_accounts();
        Ok(Harvest::Followers {
            follows,
            full_network: builder.build(GraphMode::Full, &known),
            narrow_network: builder.build(GraphMode::Narrow, &known),
        })
    }

    fn report_unit(&self, index: usize, total: usize, unit: &str) {
        log::debug!(target: LOG_TARGET, "Scraping '{unit}' ({}/{total})", index + 1);
        self.progress.set_determinate(total as u64, index as u64, unit);
    }

    /// Fetch and decode every record of a list endpoint.
    async fn fetch_list<T: DeserializeOwned>(&self, endpoint: &str) -> core::result::Result<Vec<T>, FetchError> {
        fetch_all(&self.client, endpoint)
            .await?
            .into_iter()
            .map(|value| api::decode(value).map_err(|e| self.malformed(endpoint, &e)))
            .collect()
    }

    /// Fetch and decode a single object, `None` if the server sent no body.
    async fn fetch_object<T: DeserializeOwned>(&self, endpoint: &str) -> core::result::Result<Option<T>, FetchError> {
        let value = self.client.fetch_one(endpoint).await?;
        if value.is_null() {
            return Ok(None);
        }

        api::decode(value).map(Some).map_err(|e| self.malformed(endpoint, &e))
    }

    fn malformed(&self, endpoint: &str, error: &serde_json::Error) -> FetchError {
        FetchError::http(&self.client.url_for(endpoint), None, app_err!("unexpected payload: {error}"))
    }
}

/// Turn the outcome of one unit into data, a recorded failure, or a fatal error.
fn settle<T>(
    result: core::result::Result<T, FetchError>,
    kind: ScrapeKind,
    unit: &str,
    failures: &mut Vec<Failure>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_unauthorized() => Err(app_err!("{e}")),
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not scrape {kind} for '{unit}': {e}");
            failures.push(Failure::new(kind, unit, e.to_string()));
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ClientOptions, Credential, NoProgress};

    fn collector(organizations: &[&str]) -> Result<Collector> {
        let client = Client::new(Credential::new("u", "t"), ClientOptions::default())?;
        Collector::new(client, organizations.iter().map(ToString::to_string), Arc::new(NoProgress))
    }

    #[test]
    fn test_plan_orders_and_dedups() {
        let plan = Collector::plan([
            ScrapeKind::Followers,
            ScrapeKind::Repositories,
            ScrapeKind::Memberships,
            ScrapeKind::Followers,
        ]);
        assert_eq!(plan, [ScrapeKind::Memberships, ScrapeKind::Repositories, ScrapeKind::Followers]);
    }

    #[test]
    fn test_new_rejects_empty_organizations() {
        assert!(collector(&[]).is_err());
        assert!(collector(&["", "  "]).is_err());
    }

    #[test]
    fn test_new_dedups_organizations() {
        let collector = collector(&["acme", "beta", "acme", " beta "]).unwrap();
        assert_eq!(collector.organizations(), ["acme", "beta"]);
        assert!(collector.roster().is_none());
    }

    #[test]
    fn test_settle_records_http_failures() {
        let mut failures = Vec::new();
        let err = FetchError::http("https://x/y", None, app_err!("boom"));
        let outcome = settle::<()>(Err(err), ScrapeKind::Starred, "octocat", &mut failures).unwrap();

        assert!(outcome.is_none());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].unit, "octocat");
    }

    #[test]
    fn test_settle_propagates_unauthorized() {
        let mut failures = Vec::new();
        let err = FetchError::Unauthorized {
            status: 401,
            url: "https://x/y".into(),
        };
        let _ = settle::<()>(Err(err), ScrapeKind::Starred, "octocat", &mut failures).unwrap_err();
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_member_kind_without_roster_is_skipped() {
        let mut collector = collector(&["acme"]).unwrap();
        let report = collector.collect(ScrapeKind::MemberInfos).await.unwrap();

        assert_eq!(report.kind, ScrapeKind::MemberInfos);
        assert!(report.harvest.is_none());
        assert_eq!(report.failures, [Failure::missing_dependency(ScrapeKind::MemberInfos)]);
    }
}

use std::collections::{BTreeMap, BTreeSet};

/// The public members of the scraped organizations.
///
/// Loaded once per run and consulted by every member-level kind. A member belonging to
/// several scraped organizations appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    organizations: Vec<String>,
    by_member: BTreeMap<String, BTreeSet<String>>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization, even if it turns out to have no public members.
    pub fn add_organization(&mut self, organization: &str) {
        if !self.organizations.iter().any(|o| o == organization) {
            self.organizations.push(organization.to_string());
        }
    }

    /// Record that `login` is a member of `organization`.
    pub fn add_member(&mut self, organization: &str, login: &str) {
        self.add_organization(organization);
        let _ = self
            .by_member
            .entry(login.to_string())
            .or_default()
            .insert(organization.to_string());
    }

    /// Distinct members, sorted by login.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.by_member.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_member(&self, login: &str) -> bool {
        self.by_member.contains_key(login)
    }

    /// The scraped organizations `login` belongs to, sorted.
    pub fn organizations_of(&self, login: &str) -> impl Iterator<Item = &str> {
        self.by_member.get(login).into_iter().flatten().map(String::as_str)
    }

    /// The scraped organizations of `login` joined by `;`.
    #[must_use]
    pub fn organization_label(&self, login: &str) -> String {
        self.organizations_of(login).collect::<Vec<_>>().join(";")
    }

    /// Every member and organization known to this run.
    #[must_use]
    pub fn known_accounts(&self) -> BTreeSet<String> {
        self.by_member.keys().chain(self.organizations.iter()).cloned().collect()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.by_member.len()
    }
}

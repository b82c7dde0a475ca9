use super::ScrapeKind;
use core::fmt::{Display, Formatter};
use serde::Serialize;

/// Unit name used when a whole kind was skipped.
pub const WHOLE_KIND: &str = "*";

/// A unit of work that produced no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ScrapeKind,

    /// The organization, member, or repository being scraped, or [`WHOLE_KIND`].
    pub unit: String,

    pub reason: String,
}

impl Failure {
    pub const TABLE_NAME: &'static str = "failures";
    pub const COLUMNS: &'static [&'static str] = &["kind", "unit", "reason"];

    #[must_use]
    pub fn new(kind: ScrapeKind, unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// A member-level kind was requested without the kind that loads the roster.
    #[must_use]
    pub fn missing_dependency(kind: ScrapeKind) -> Self {
        Self::new(
            kind,
            WHOLE_KIND,
            format!("missing dependency: '{kind}' needs the organization members loaded by 'memberships'"),
        )
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.unit, self.reason)
    }
}

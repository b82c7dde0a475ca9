//! Data collection from the GitHub REST API
//!
//! This module harvests organizational data from GitHub and turns it into deduplicated
//! tables and directed graphs.
//!
//! # Implementation Model
//!
//! The layers, from the wire up:
//! - **Request engine** ([`Client`]): authenticated GET requests with exponential backoff
//!   for transient failures and a [`QuotaTracker`] that suspends the run while the API
//!   quota is exhausted
//! - **Paginator** ([`paginate`]): a lazy stream of raw records over `per_page`/`page`
//!   pagination, ending on an empty page or the last `Link` page
//! - **Collector** ([`Collector`]): one [`ScrapeKind`] at a time, decodes the records,
//!   upserts them into [`ScrapeTable`]s keyed by natural identifiers, and folds relations
//!   into graphs
//!
//! Requests that fail for good only cost the unit (organization, member, or repository)
//! being scraped; the unit is recorded as a [`Failure`] and collection moves on. A
//! rejected credential is the one error that aborts collection.

mod api;
mod client;
mod collector;
mod failure;
mod paginator;
mod progress;
mod quota;
mod records;
pub(crate) mod resilient_http;
mod roster;
mod scrape_kind;
mod scrape_table;

pub use client::{Client, ClientOptions, Credential, DEFAULT_API_BASE_URL, FetchError, MAX_PER_PAGE, NextPage, Page};
pub use collector::{Collector, Harvest, KindReport};
pub use failure::{Failure, WHOLE_KIND};
pub use paginator::{fetch_all, paginate};
pub use progress::{NoProgress, Progress};
pub use quota::{QuotaTracker, RateLimitInfo};
pub use records::{Contribution, Follow, MemberInfo, MemberRepository, Membership, OrgMember, OrgRepository, Record, StarredRepository};
pub use resilient_http::RetryPolicy;
pub use roster::Roster;
pub use scrape_kind::ScrapeKind;
pub use scrape_table::ScrapeTable;

//! Data models for catalogue reporting.
//!
//! This module contains the catalogue entities consumed by the reports
//! (read-only mirrors of the cataloguing application's tables) and the
//! result records the report generators produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a catalogue entity.
///
/// Reports only ever emit rows for entities whose whole linking chain
/// (package, resource group, resource, organization) is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Entity is live and visible.
    Active,
    /// Entity has been soft-deleted.
    Deleted,
}

impl State {
    /// Returns true for [`State::Active`].
    pub fn is_active(&self) -> bool {
        matches!(self, State::Active)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Active => write!(f, "active"),
            State::Deleted => write!(f, "deleted"),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::Active
    }
}

/// A catalogued dataset with metadata and zero or more resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Internal identifier.
    pub id: String,
    /// URL-safe short name.
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Free-text description; may be empty or missing.
    #[serde(default)]
    pub notes: Option<String>,
    /// When the metadata record was created.
    pub metadata_created: DateTime<Utc>,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
    /// Owning organization id, if the dataset has one.
    #[serde(default)]
    pub owner_org: Option<String>,
}

/// Association between a package and a tag.
///
/// Presence or absence of these rows is what makes a dataset "tagless".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tagging {
    /// Package the tag is attached to.
    pub package_id: String,
    /// The tag itself.
    pub tag_id: String,
}

/// Owning entity for packages; may form a hierarchy via `parent_id`.
///
/// Groups double as organizations in the underlying model; only rows with
/// `is_organization` set participate in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Internal identifier.
    pub id: String,
    /// URL-safe short name.
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
    /// Distinguishes organizations from plain groups.
    pub is_organization: bool,
    /// Parent organization id for hierarchical organizations.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Link table between a package and its resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroup {
    /// Internal identifier.
    pub id: String,
    /// Package the group belongs to.
    pub package_id: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
}

/// A downloadable file or URL attached to a package, linked to it through
/// a resource group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Internal identifier.
    pub id: String,
    /// Resource group the resource hangs off.
    pub resource_group_id: String,
    /// The link itself.
    pub url: String,
    /// Display position within the package.
    pub position: i32,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
}

/// Key/value fact about a resource recorded by the external link-checking
/// worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Resource id the fact refers to.
    pub entity_id: String,
    /// Fact key; see [`task_keys`].
    pub key: String,
    /// Fact value, always stored as text.
    pub value: String,
}

/// Task-status keys written by the link checker.
pub mod task_keys {
    /// HTTP-like status code recorded for the last check, as text.
    pub const ERROR_CODE: &str = "error_code";
    /// Human-readable reason the last check failed.
    pub const REASON: &str = "openness_score_reason";
    /// Number of consecutive failed checks.
    pub const FAILURE_COUNT: &str = "openness_score_failure_count";
}

/// One sample row of the tagless-datasets report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaglessRow {
    /// Dataset short name.
    pub name: String,
    /// Dataset title.
    pub title: String,
    /// Dataset description, or a placeholder when it has none.
    pub notes: String,
    /// Creation timestamp as an ISO-8601 string.
    pub created: String,
}

/// Result record of the tagless-datasets report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaglessReport {
    /// Sample of tagless datasets, at most five rows.
    pub table: Vec<TaglessRow>,
    /// Total packages matching the filter.
    pub num_packages: usize,
    /// Share of packages with zero tags; absent when no packages match.
    pub packages_without_tags_percent: Option<f64>,
    /// Mean tag count per package, one decimal; absent when no packages
    /// match.
    pub average_tags_per_package: Option<f64>,
}

/// Per-organization row of the broken-links report in aggregate mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokenOrgRow {
    /// Organization short name.
    pub organization_name: String,
    /// Organization title.
    pub organization_title: String,
    /// Distinct datasets with at least one broken resource.
    pub broken_package_count: usize,
    /// Broken resources in the organization.
    pub broken_resource_count: usize,
    /// Broken resources relative to the organization's resource total.
    pub broken_resource_percent: Option<f64>,
    /// Active datasets owned by the organization.
    pub package_count: usize,
    /// Broken datasets relative to the organization's dataset total.
    pub broken_package_percent: Option<f64>,
}

/// Per-resource row of the broken-links report when drilling into a single
/// organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokenResourceRow {
    /// Owning dataset short name.
    pub dataset_name: String,
    /// Owning dataset title.
    pub dataset_title: String,
    /// Resource id.
    pub resource_id: String,
    /// Resource position within the dataset.
    pub resource_position: i32,
    /// The broken link.
    pub resource_url: String,
    /// Failure reason recorded by the link checker.
    pub reason: String,
    /// Consecutive failed checks recorded by the link checker.
    pub failure_count: u32,
}

/// Table payload of the broken-links report; the variant depends on whether
/// an organization filter was supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrokenLinkTable {
    /// Aggregate mode: one row per organization with broken links.
    ByOrganization(Vec<BrokenOrgRow>),
    /// Drill-down mode: one row per broken resource.
    ByResource(Vec<BrokenResourceRow>),
}

impl BrokenLinkTable {
    /// Number of rows in the table, whichever variant is active.
    #[allow(dead_code)] // Utility for report consumers
    pub fn len(&self) -> usize {
        match self {
            BrokenLinkTable::ByOrganization(rows) => rows.len(),
            BrokenLinkTable::ByResource(rows) => rows.len(),
        }
    }

    /// True when the table has no rows.
    #[allow(dead_code)] // Utility for report consumers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result record of the broken-links report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokenLinkReport {
    /// Per-mode row list.
    pub table: BrokenLinkTable,
    /// Datasets with at least one broken resource in the filtered scope.
    pub num_broken_packages: usize,
    /// Active datasets in the filtered scope.
    pub num_packages: usize,
    /// Broken datasets relative to the scope's dataset total.
    pub broken_package_percent: Option<f64>,
    /// Broken resources in the filtered scope.
    pub num_broken_resources: usize,
    /// Active resources in the filtered scope.
    pub num_resources: usize,
    /// Broken resources relative to the scope's resource total.
    pub broken_resource_percent: Option<f64>,
    /// Field ordering of the active table variant, for presentation.
    pub order: Vec<String>,
}

//! Data access for catalogue entities.
//!
//! Reports run against the [`CatalogStore`] trait so the same aggregation
//! code can be driven by the snapshot-backed store in production and by
//! hand-built fixtures in tests.

pub mod memory;

pub use memory::{CatalogSnapshot, MemoryStore};

use crate::error::StoreError;
use crate::models::{Organization, Package, Resource};
use std::collections::HashSet;

/// The set of organizations a report is restricted to.
///
/// An unrestricted scope matches every package, including ones without an
/// owning organization; a restricted scope matches only packages owned by
/// one of its organization ids.
#[derive(Debug, Clone, Default)]
pub struct OrgScope {
    ids: Option<HashSet<String>>,
}

impl OrgScope {
    /// Scope matching every package.
    pub fn all() -> Self {
        Self { ids: None }
    }

    /// Scope restricted to the given organization ids.
    pub fn restricted_to(ids: HashSet<String>) -> Self {
        Self { ids: Some(ids) }
    }

    /// Scope restricted to a single organization id.
    pub fn single(id: String) -> Self {
        Self::restricted_to(HashSet::from([id]))
    }

    /// Whether a package owner (or lack of one) falls inside the scope.
    pub fn contains(&self, owner_org: Option<&str>) -> bool {
        match &self.ids {
            None => true,
            Some(ids) => owner_org.is_some_and(|org| ids.contains(org)),
        }
    }

    /// True when an organization filter is in effect.
    #[allow(dead_code)] // Utility for store implementations
    pub fn is_restricted(&self) -> bool {
        self.ids.is_some()
    }
}

/// Read-only access to the catalogue's entities.
///
/// Every method sees only committed data; the store owns nothing and the
/// reports mutate nothing.
pub trait CatalogStore {
    /// Active organizations, ordered by title ascending.
    fn organizations(&self) -> Result<Vec<Organization>, StoreError>;

    /// Resolve an organization name to the scope it covers, widening to
    /// active descendant organizations when `include_sub_organizations` is
    /// set. An unknown name yields an empty scope rather than an error, so
    /// reports degrade to all-zero counts.
    fn organization_scope(
        &self,
        name: &str,
        include_sub_organizations: bool,
    ) -> Result<OrgScope, StoreError>;

    /// Active packages within the scope.
    fn packages(&self, scope: &OrgScope) -> Result<Vec<Package>, StoreError>;

    /// Number of tag associations on a package.
    fn tag_count(&self, package_id: &str) -> Result<usize, StoreError>;

    /// Active resources of a package, linked through an active resource
    /// group, ordered by position.
    fn resources(&self, package_id: &str) -> Result<Vec<Resource>, StoreError>;

    /// Task-status value recorded for a resource under `key`, if any.
    fn task_status(&self, resource_id: &str, key: &str) -> Result<Option<String>, StoreError>;
}

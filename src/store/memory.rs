//! In-memory catalogue store loaded from a JSON snapshot.
//!
//! The snapshot is a plain export of the catalogue's tables. The store
//! builds lookup indexes once at construction and answers every query from
//! memory; it never mutates anything.

use crate::error::StoreError;
use crate::models::{Organization, Package, Resource, ResourceGroup, Tagging, TaskStatus};
use crate::store::{CatalogStore, OrgScope};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Serialized form of a catalogue export.
///
/// Every collection defaults to empty so partial snapshots load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Organizations (groups with the is-organization flag).
    #[serde(default)]
    pub organizations: Vec<Organization>,
    /// Datasets.
    #[serde(default)]
    pub packages: Vec<Package>,
    /// Tag associations.
    #[serde(default)]
    pub taggings: Vec<Tagging>,
    /// Package-to-resource link rows.
    #[serde(default)]
    pub resource_groups: Vec<ResourceGroup>,
    /// Resources.
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Link-checker facts.
    #[serde(default)]
    pub task_statuses: Vec<TaskStatus>,
}

/// Snapshot-backed implementation of [`CatalogStore`].
pub struct MemoryStore {
    organizations: Vec<Organization>,
    packages: Vec<Package>,
    tag_counts: HashMap<String, usize>,
    resources_by_package: HashMap<String, Vec<Resource>>,
    task_statuses: HashMap<String, HashMap<String, String>>,
    children: HashMap<String, Vec<String>>,
    org_ids_by_name: HashMap<String, String>,
    orgs_by_id: HashMap<String, Organization>,
}

impl MemoryStore {
    /// Build a store from a snapshot, indexing as it goes.
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        let mut tag_counts: HashMap<String, usize> = HashMap::new();
        for tagging in &snapshot.taggings {
            *tag_counts.entry(tagging.package_id.clone()).or_default() += 1;
        }

        // Resolve the resource-group indirection up front. Only active
        // resources reached through an active group are visible.
        let mut groups_by_id: HashMap<&str, &ResourceGroup> = HashMap::new();
        for group in &snapshot.resource_groups {
            groups_by_id.insert(group.id.as_str(), group);
        }

        let mut resources_by_package: HashMap<String, Vec<Resource>> = HashMap::new();
        for resource in &snapshot.resources {
            if !resource.state.is_active() {
                continue;
            }
            let Some(group) = groups_by_id.get(resource.resource_group_id.as_str()) else {
                debug!(
                    "resource {} references unknown resource group {}",
                    resource.id, resource.resource_group_id
                );
                continue;
            };
            if !group.state.is_active() {
                continue;
            }
            resources_by_package
                .entry(group.package_id.clone())
                .or_default()
                .push(resource.clone());
        }
        for resources in resources_by_package.values_mut() {
            resources.sort_by_key(|r| r.position);
        }

        let mut task_statuses: HashMap<String, HashMap<String, String>> = HashMap::new();
        for status in &snapshot.task_statuses {
            task_statuses
                .entry(status.entity_id.clone())
                .or_default()
                .insert(status.key.clone(), status.value.clone());
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut org_ids_by_name: HashMap<String, String> = HashMap::new();
        let mut orgs_by_id: HashMap<String, Organization> = HashMap::new();
        for org in &snapshot.organizations {
            if let Some(parent) = &org.parent_id {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(org.id.clone());
            }
            org_ids_by_name.insert(org.name.clone(), org.id.clone());
            orgs_by_id.insert(org.id.clone(), org.clone());
        }

        Self {
            organizations: snapshot.organizations,
            packages: snapshot.packages,
            tag_counts,
            resources_by_package,
            task_statuses,
            children,
            org_ids_by_name,
            orgs_by_id,
        }
    }

    /// Load a store from a JSON snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;

        let snapshot: CatalogSnapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?;

        debug!(
            "snapshot loaded: {} organizations, {} packages, {} resources",
            snapshot.organizations.len(),
            snapshot.packages.len(),
            snapshot.resources.len()
        );

        Ok(Self::new(snapshot))
    }

    /// Is this id an active organization?
    fn is_active_organization(&self, id: &str) -> bool {
        self.orgs_by_id
            .get(id)
            .map(|org| org.is_organization && org.state.is_active())
            .unwrap_or(false)
    }

    /// The id plus every active descendant organization id.
    fn descendant_ids(&self, id: &str) -> HashSet<String> {
        let mut ids = HashSet::from([id.to_string()]);
        let mut queue = vec![id.to_string()];

        while let Some(current) = queue.pop() {
            if let Some(child_ids) = self.children.get(&current) {
                for child in child_ids {
                    if !self.is_active_organization(child) {
                        continue;
                    }
                    if ids.insert(child.clone()) {
                        queue.push(child.clone());
                    }
                }
            }
        }

        ids
    }
}

impl CatalogStore for MemoryStore {
    fn organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let mut orgs: Vec<Organization> = self
            .organizations
            .iter()
            .filter(|org| org.is_organization && org.state.is_active())
            .cloned()
            .collect();

        orgs.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.name.cmp(&b.name)));
        Ok(orgs)
    }

    fn organization_scope(
        &self,
        name: &str,
        include_sub_organizations: bool,
    ) -> Result<OrgScope, StoreError> {
        let Some(id) = self.org_ids_by_name.get(name) else {
            // Unknown names filter everything out instead of erroring.
            return Ok(OrgScope::restricted_to(HashSet::new()));
        };
        if !self.is_active_organization(id) {
            return Ok(OrgScope::restricted_to(HashSet::new()));
        }

        if include_sub_organizations {
            Ok(OrgScope::restricted_to(self.descendant_ids(id)))
        } else {
            Ok(OrgScope::single(id.clone()))
        }
    }

    fn packages(&self, scope: &OrgScope) -> Result<Vec<Package>, StoreError> {
        Ok(self
            .packages
            .iter()
            .filter(|pkg| pkg.state.is_active() && scope.contains(pkg.owner_org.as_deref()))
            .cloned()
            .collect())
    }

    fn tag_count(&self, package_id: &str) -> Result<usize, StoreError> {
        Ok(self.tag_counts.get(package_id).copied().unwrap_or(0))
    }

    fn resources(&self, package_id: &str) -> Result<Vec<Resource>, StoreError> {
        Ok(self
            .resources_by_package
            .get(package_id)
            .cloned()
            .unwrap_or_default())
    }

    fn task_status(&self, resource_id: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .task_statuses
            .get(resource_id)
            .and_then(|facts| facts.get(key))
            .cloned())
    }
}

//! Broken-resource-links report.
//!
//! Without an organization filter the report answers "which organizations
//! have problems": one row per organization carrying broken links. With a
//! filter it answers "what exactly is broken here": one row per broken
//! resource. Both modes share the scope-wide totals and percentages.

use crate::error::ReportError;
use crate::models::{
    task_keys, BrokenLinkReport, BrokenLinkTable, BrokenOrgRow, BrokenResourceRow, Organization,
    Package,
};
use crate::reports::{
    number_cell, percent, scope_for, Column, ReportOptions, ReportOutput, Table,
};
use crate::store::{CatalogStore, OrgScope};
use serde_json::Value;
use std::collections::HashSet;
use std::ops::Range;
use tracing::debug;

/// Error-code band treated as broken; upper bound exclusive.
const BROKEN_RANGE: Range<u32> = 400..600;

/// Status code inside the band that is never counted as broken.
const EXCLUDED_STATUS: u32 = 511;

/// Field order of aggregate-mode rows.
const ORGANIZATION_ORDER: &[&str] = &[
    "organization_name",
    "organization_title",
    "broken_package_count",
    "broken_resource_count",
    "broken_resource_percent",
    "package_count",
    "broken_package_percent",
];

/// Field order of drill-down rows.
const RESOURCE_ORDER: &[&str] = &[
    "dataset_name",
    "dataset_title",
    "resource_id",
    "resource_position",
    "resource_url",
    "reason",
    "failure_count",
];

/// Is this recorded status code a broken link?
fn is_broken_code(code: u32) -> bool {
    BROKEN_RANGE.contains(&code) && code != EXCLUDED_STATUS
}

/// Whether the link checker has flagged a resource as broken.
///
/// An absent `error_code` record means the resource has not been flagged;
/// a present but non-numeric one is upstream data corruption and errors out.
fn is_broken(store: &dyn CatalogStore, resource_id: &str) -> Result<bool, ReportError> {
    match store.task_status(resource_id, task_keys::ERROR_CODE)? {
        None => Ok(false),
        Some(value) => match value.trim().parse::<u32>() {
            Ok(code) => Ok(is_broken_code(code)),
            Err(_) => Err(ReportError::MalformedTaskStatus {
                resource_id: resource_id.to_string(),
                key: task_keys::ERROR_CODE,
                value,
            }),
        },
    }
}

/// A task-status value that must exist for a broken resource.
fn required_status(
    store: &dyn CatalogStore,
    resource_id: &str,
    key: &'static str,
) -> Result<String, ReportError> {
    store
        .task_status(resource_id, key)?
        .ok_or_else(|| ReportError::MissingTaskStatus {
            resource_id: resource_id.to_string(),
            key,
        })
}

/// Produce the broken-links report for the given options.
pub fn broken_link_report(
    store: &dyn CatalogStore,
    options: &ReportOptions,
) -> Result<BrokenLinkReport, ReportError> {
    let scope = scope_for(store, options)?;
    let packages = store.packages(&scope)?;

    let mut num_resources = 0usize;
    for pkg in &packages {
        num_resources += store.resources(&pkg.id)?.len();
    }
    let num_packages = packages.len();

    let (table, num_broken_packages, num_broken_resources, order) =
        if options.organization.is_none() {
            let (rows, broken_packages, broken_resources) = aggregate_rows(store)?;
            (
                BrokenLinkTable::ByOrganization(rows),
                broken_packages,
                broken_resources,
                ORGANIZATION_ORDER,
            )
        } else {
            let (rows, broken_packages) = resource_rows(store, &packages)?;
            let broken_resources = rows.len();
            (
                BrokenLinkTable::ByResource(rows),
                broken_packages,
                broken_resources,
                RESOURCE_ORDER,
            )
        };

    debug!(
        "broken-links report: {} broken resources across {} datasets",
        num_broken_resources, num_broken_packages
    );

    Ok(BrokenLinkReport {
        table,
        num_broken_packages,
        num_packages,
        broken_package_percent: percent(num_broken_packages, num_packages),
        num_broken_resources,
        num_resources,
        broken_resource_percent: percent(num_broken_resources, num_resources),
        order: order.iter().map(|field| field.to_string()).collect(),
    })
}

/// Aggregate mode: one row per organization with at least one broken link,
/// ordered by organization title, plus grand totals.
fn aggregate_rows(
    store: &dyn CatalogStore,
) -> Result<(Vec<BrokenOrgRow>, usize, usize), ReportError> {
    let mut rows = Vec::new();
    let mut total_broken_packages = 0usize;
    let mut total_broken_resources = 0usize;

    for org in store.organizations()? {
        let tally = tally_organization(store, &org)?;
        if tally.broken_resources == 0 {
            continue;
        }

        total_broken_packages += tally.broken_packages;
        total_broken_resources += tally.broken_resources;

        rows.push(BrokenOrgRow {
            organization_name: org.name,
            organization_title: org.title,
            broken_package_count: tally.broken_packages,
            broken_resource_count: tally.broken_resources,
            broken_resource_percent: percent(tally.broken_resources, tally.resources),
            package_count: tally.packages,
            broken_package_percent: percent(tally.broken_packages, tally.packages),
        });
    }

    Ok((rows, total_broken_packages, total_broken_resources))
}

/// Per-organization counts feeding an aggregate row.
struct OrgTally {
    packages: usize,
    resources: usize,
    broken_packages: usize,
    broken_resources: usize,
}

fn tally_organization(
    store: &dyn CatalogStore,
    org: &Organization,
) -> Result<OrgTally, ReportError> {
    let org_packages = store.packages(&OrgScope::single(org.id.clone()))?;

    let mut tally = OrgTally {
        packages: org_packages.len(),
        resources: 0,
        broken_packages: 0,
        broken_resources: 0,
    };

    for pkg in &org_packages {
        let resources = store.resources(&pkg.id)?;
        tally.resources += resources.len();

        let mut broken_here = 0usize;
        for resource in &resources {
            if is_broken(store, &resource.id)? {
                broken_here += 1;
            }
        }
        if broken_here > 0 {
            tally.broken_packages += 1;
            tally.broken_resources += broken_here;
        }
    }

    Ok(tally)
}

/// Drill-down mode: one row per broken resource of the scope's packages,
/// ordered by dataset name then resource position. Also returns the
/// distinct broken dataset count.
fn resource_rows(
    store: &dyn CatalogStore,
    packages: &[Package],
) -> Result<(Vec<BrokenResourceRow>, usize), ReportError> {
    let mut rows = Vec::new();
    let mut broken_datasets: HashSet<&str> = HashSet::new();

    for pkg in packages {
        for resource in store.resources(&pkg.id)? {
            if !is_broken(store, &resource.id)? {
                continue;
            }

            let reason = required_status(store, &resource.id, task_keys::REASON)?;
            let raw_count = required_status(store, &resource.id, task_keys::FAILURE_COUNT)?;
            let failure_count = raw_count.trim().parse::<u32>().map_err(|_| {
                ReportError::MalformedTaskStatus {
                    resource_id: resource.id.clone(),
                    key: task_keys::FAILURE_COUNT,
                    value: raw_count.clone(),
                }
            })?;

            broken_datasets.insert(pkg.id.as_str());
            rows.push(BrokenResourceRow {
                dataset_name: pkg.name.clone(),
                dataset_title: pkg.title.clone(),
                resource_id: resource.id.clone(),
                resource_position: resource.position,
                resource_url: resource.url.clone(),
                reason,
                failure_count,
            });
        }
    }

    rows.sort_by(|a, b| {
        a.dataset_name
            .cmp(&b.dataset_name)
            .then_with(|| a.resource_position.cmp(&b.resource_position))
    });

    Ok((rows, broken_datasets.len()))
}

/// Registry adapter: run the report and flatten it for presentation.
pub fn generate(
    store: &dyn CatalogStore,
    options: &ReportOptions,
) -> Result<ReportOutput, ReportError> {
    broken_link_report(store, options).map(into_output)
}

fn into_output(report: BrokenLinkReport) -> ReportOutput {
    let table = match &report.table {
        BrokenLinkTable::ByOrganization(rows) => Table {
            columns: vec![
                Column { key: "organization_name", label: "Organization" },
                Column { key: "organization_title", label: "Title" },
                Column { key: "broken_package_count", label: "Broken datasets" },
                Column { key: "broken_resource_count", label: "Broken links" },
                Column { key: "broken_resource_percent", label: "Broken links (%)" },
                Column { key: "package_count", label: "Datasets" },
                Column { key: "broken_package_percent", label: "Broken datasets (%)" },
            ],
            rows: rows
                .iter()
                .map(|row| {
                    vec![
                        Value::from(row.organization_name.clone()),
                        Value::from(row.organization_title.clone()),
                        Value::from(row.broken_package_count),
                        Value::from(row.broken_resource_count),
                        number_cell(row.broken_resource_percent),
                        Value::from(row.package_count),
                        number_cell(row.broken_package_percent),
                    ]
                })
                .collect(),
        },
        BrokenLinkTable::ByResource(rows) => Table {
            columns: vec![
                Column { key: "dataset_name", label: "Dataset" },
                Column { key: "dataset_title", label: "Title" },
                Column { key: "resource_id", label: "Resource id" },
                Column { key: "resource_position", label: "Position" },
                Column { key: "resource_url", label: "URL" },
                Column { key: "reason", label: "Reason" },
                Column { key: "failure_count", label: "Failure count" },
            ],
            rows: rows
                .iter()
                .map(|row| {
                    vec![
                        Value::from(row.dataset_name.clone()),
                        Value::from(row.dataset_title.clone()),
                        Value::from(row.resource_id.clone()),
                        Value::from(row.resource_position),
                        Value::from(row.resource_url.clone()),
                        Value::from(row.reason.clone()),
                        Value::from(row.failure_count),
                    ]
                })
                .collect(),
        },
    };

    ReportOutput {
        summary: vec![
            ("num_broken_packages", report.num_broken_packages.into()),
            ("num_packages", report.num_packages.into()),
            (
                "broken_package_percent",
                number_cell(report.broken_package_percent),
            ),
            ("num_broken_resources", report.num_broken_resources.into()),
            ("num_resources", report.num_resources.into()),
            (
                "broken_resource_percent",
                number_cell(report.broken_resource_percent),
            ),
        ],
        table,
    }
}

/// Option sets worth pre-rendering: the unfiltered report plus one per
/// organization that currently has a broken link.
pub fn option_combinations(
    store: &dyn CatalogStore,
) -> Result<Vec<ReportOptions>, ReportError> {
    let mut combinations = vec![ReportOptions::default()];
    for org in store.organizations()? {
        if organization_has_broken_link(store, &org)? {
            combinations.push(ReportOptions::for_organization(&org.name));
        }
    }
    Ok(combinations)
}

fn organization_has_broken_link(
    store: &dyn CatalogStore,
    org: &Organization,
) -> Result<bool, ReportError> {
    for pkg in store.packages(&OrgScope::single(org.id.clone()))? {
        for resource in store.resources(&pkg.id)? {
            if is_broken(store, &resource.id)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Organization, Package, Resource, ResourceGroup, State, TaskStatus};
    use crate::store::{CatalogSnapshot, MemoryStore};
    use chrono::{TimeZone, Utc};

    fn org(id: &str, name: &str, title: &str) -> Organization {
        Organization {
            id: id.to_string(),
            name: name.to_string(),
            title: title.to_string(),
            state: State::Active,
            is_organization: true,
            parent_id: None,
        }
    }

    fn package(id: &str, name: &str, owner: &str) -> Package {
        Package {
            id: id.to_string(),
            name: name.to_string(),
            title: format!("Title of {}", name),
            notes: None,
            metadata_created: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            state: State::Active,
            owner_org: Some(owner.to_string()),
        }
    }

    fn group(id: &str, package_id: &str) -> ResourceGroup {
        ResourceGroup {
            id: id.to_string(),
            package_id: package_id.to_string(),
            state: State::Active,
        }
    }

    fn resource(id: &str, group_id: &str, position: i32) -> Resource {
        Resource {
            id: id.to_string(),
            resource_group_id: group_id.to_string(),
            url: format!("http://example.org/{}", id),
            position,
            state: State::Active,
        }
    }

    fn status(resource_id: &str, key: &str, value: &str) -> TaskStatus {
        TaskStatus {
            entity_id: resource_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn check_result(resource_id: &str, code: &str, reason: &str, failures: &str) -> Vec<TaskStatus> {
        vec![
            status(resource_id, task_keys::ERROR_CODE, code),
            status(resource_id, task_keys::REASON, reason),
            status(resource_id, task_keys::FAILURE_COUNT, failures),
        ]
    }

    /// Organization "alpha": 10 packages, 20 resources, 3 broken resources
    /// spanning 2 packages. Organization "beta": one broken resource.
    fn example_snapshot() -> CatalogSnapshot {
        let mut packages = Vec::new();
        let mut resource_groups = Vec::new();
        let mut resources = Vec::new();
        let mut task_statuses = Vec::new();

        // alpha: 10 packages with 2 resources each.
        for i in 0..10 {
            let pkg_id = format!("a-p{}", i);
            packages.push(package(&pkg_id, &format!("alpha-data-{}", i), "org-a"));
            let grp_id = format!("a-g{}", i);
            resource_groups.push(group(&grp_id, &pkg_id));
            for pos in 0..2 {
                resources.push(resource(&format!("a-r{}-{}", i, pos), &grp_id, pos));
            }
        }
        // Broken: two resources of package 0, one of package 1.
        task_statuses.extend(check_result("a-r0-0", "404", "Not found", "3"));
        task_statuses.extend(check_result("a-r0-1", "500", "Server error", "1"));
        task_statuses.extend(check_result("a-r1-0", "403", "Forbidden", "2"));
        // Healthy check result on another resource.
        task_statuses.push(status("a-r2-0", task_keys::ERROR_CODE, "200"));
        // 511 must never count as broken.
        task_statuses.extend(check_result("a-r3-0", "511", "Auth required", "9"));

        // beta: one package with one broken resource at position 2.
        packages.push(package("b-p0", "beta-data", "org-b"));
        resource_groups.push(group("b-g0", "b-p0"));
        resources.push(Resource {
            id: "b-r0".to_string(),
            resource_group_id: "b-g0".to_string(),
            url: "http://x/y".to_string(),
            position: 2,
            state: State::Active,
        });
        task_statuses.extend(check_result("b-r0", "404", "timeout", "5"));

        // gamma: nothing broken, must not appear in the aggregate table.
        packages.push(package("c-p0", "gamma-data", "org-c"));
        resource_groups.push(group("c-g0", "c-p0"));
        resources.push(resource("c-r0", "c-g0", 0));

        CatalogSnapshot {
            organizations: vec![
                org("org-a", "alpha", "Alpha Organization"),
                org("org-b", "beta", "Beta Organization"),
                org("org-c", "gamma", "Gamma Organization"),
            ],
            packages,
            resource_groups,
            resources,
            task_statuses,
            ..Default::default()
        }
    }

    fn example_store() -> MemoryStore {
        MemoryStore::new(example_snapshot())
    }

    #[test]
    fn test_broken_code_band() {
        assert!(!is_broken_code(200));
        assert!(!is_broken_code(399));
        assert!(is_broken_code(400));
        assert!(is_broken_code(404));
        assert!(is_broken_code(510));
        assert!(!is_broken_code(511));
        assert!(is_broken_code(512));
        assert!(is_broken_code(599));
        assert!(!is_broken_code(600));
    }

    #[test]
    fn test_aggregate_row_matches_worked_example() {
        let report =
            broken_link_report(&example_store(), &ReportOptions::default()).unwrap();

        let BrokenLinkTable::ByOrganization(rows) = &report.table else {
            panic!("expected aggregate table");
        };

        assert_eq!(rows.len(), 2);
        let alpha = &rows[0];
        assert_eq!(alpha.organization_name, "alpha");
        assert_eq!(alpha.broken_package_count, 2);
        assert_eq!(alpha.broken_resource_count, 3);
        assert_eq!(alpha.broken_resource_percent, Some(15.0));
        assert_eq!(alpha.package_count, 10);
        assert_eq!(alpha.broken_package_percent, Some(20.0));

        // Ordered by title; gamma has no broken links and is absent.
        assert_eq!(rows[1].organization_name, "beta");

        assert_eq!(report.num_broken_packages, 3);
        assert_eq!(report.num_broken_resources, 4);
        assert_eq!(report.num_packages, 12);
        assert_eq!(report.num_resources, 22);
        assert_eq!(report.order[0], "organization_name");
    }

    #[test]
    fn test_drilldown_row_matches_worked_example() {
        let report = broken_link_report(
            &example_store(),
            &ReportOptions::for_organization("beta"),
        )
        .unwrap();

        let BrokenLinkTable::ByResource(rows) = &report.table else {
            panic!("expected drill-down table");
        };

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.dataset_name, "beta-data");
        assert_eq!(row.dataset_title, "Title of beta-data");
        assert_eq!(row.resource_id, "b-r0");
        assert_eq!(row.resource_position, 2);
        assert_eq!(row.resource_url, "http://x/y");
        assert_eq!(row.reason, "timeout");
        assert_eq!(row.failure_count, 5);

        assert_eq!(report.num_broken_packages, 1);
        assert_eq!(report.num_broken_resources, 1);
        assert_eq!(report.num_packages, 1);
        assert_eq!(report.num_resources, 1);
        assert_eq!(report.broken_package_percent, Some(100.0));
        assert_eq!(report.order[0], "dataset_name");
    }

    #[test]
    fn test_drilldown_rows_sorted_by_dataset_then_position() {
        let mut snapshot = example_snapshot();
        // Second broken resource for beta, earlier position, plus a second
        // dataset sorting before "beta-data".
        snapshot.resources.push(resource("b-r1", "b-g0", 0));
        snapshot
            .task_statuses
            .extend(check_result("b-r1", "400", "Bad request", "1"));
        snapshot.packages.push(package("b-p1", "aardvark", "org-b"));
        snapshot.resource_groups.push(group("b-g1", "b-p1"));
        snapshot.resources.push(resource("b-r2", "b-g1", 9));
        snapshot
            .task_statuses
            .extend(check_result("b-r2", "599", "Gateway", "2"));

        let store = MemoryStore::new(snapshot);
        let report =
            broken_link_report(&store, &ReportOptions::for_organization("beta")).unwrap();

        let BrokenLinkTable::ByResource(rows) = &report.table else {
            panic!("expected drill-down table");
        };
        let order: Vec<(&str, i32)> = rows
            .iter()
            .map(|r| (r.dataset_name.as_str(), r.resource_position))
            .collect();
        assert_eq!(
            order,
            vec![("aardvark", 9), ("beta-data", 0), ("beta-data", 2)]
        );
        assert_eq!(report.num_broken_packages, 2);
    }

    #[test]
    fn test_unknown_organization_degrades_to_zero_counts() {
        let report = broken_link_report(
            &example_store(),
            &ReportOptions::for_organization("does-not-exist"),
        )
        .unwrap();

        assert_eq!(report.num_packages, 0);
        assert_eq!(report.num_resources, 0);
        assert_eq!(report.num_broken_resources, 0);
        assert_eq!(report.broken_package_percent, None);
        assert_eq!(report.broken_resource_percent, None);
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_malformed_error_code_is_an_error() {
        let mut snapshot = example_snapshot();
        snapshot
            .task_statuses
            .push(status("c-r0", task_keys::ERROR_CODE, "not-a-number"));

        let store = MemoryStore::new(snapshot);
        let err = broken_link_report(&store, &ReportOptions::default()).unwrap_err();

        assert_eq!(
            err,
            ReportError::MalformedTaskStatus {
                resource_id: "c-r0".to_string(),
                key: task_keys::ERROR_CODE,
                value: "not-a-number".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_reason_is_an_error_in_drilldown() {
        let mut snapshot = example_snapshot();
        snapshot.resources.push(resource("c-r1", "c-g0", 1));
        snapshot
            .task_statuses
            .push(status("c-r1", task_keys::ERROR_CODE, "404"));

        let store = MemoryStore::new(snapshot);
        let err = broken_link_report(&store, &ReportOptions::for_organization("gamma"))
            .unwrap_err();

        assert_eq!(
            err,
            ReportError::MissingTaskStatus {
                resource_id: "c-r1".to_string(),
                key: task_keys::REASON,
            }
        );
    }

    #[test]
    fn test_option_combinations_round_trip() {
        let store = example_store();
        let combinations = option_combinations(&store).unwrap();

        // No-filter case plus exactly the organizations with broken links.
        assert_eq!(combinations[0], ReportOptions::default());
        let names: Vec<&str> = combinations[1..]
            .iter()
            .map(|c| c.organization.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);

        // The yielded organizations are exactly the aggregate-table rows,
        // and each drill-down reproduces its row's counts.
        let aggregate = broken_link_report(&store, &ReportOptions::default()).unwrap();
        let BrokenLinkTable::ByOrganization(rows) = &aggregate.table else {
            panic!("expected aggregate table");
        };
        let row_names: Vec<&str> = rows.iter().map(|r| r.organization_name.as_str()).collect();
        assert_eq!(names, row_names);

        for row in rows {
            let drill = broken_link_report(
                &store,
                &ReportOptions::for_organization(&row.organization_name),
            )
            .unwrap();
            assert_eq!(drill.num_broken_resources, row.broken_resource_count);
            assert_eq!(drill.num_broken_packages, row.broken_package_count);
        }
    }

    #[test]
    fn test_output_summary_and_columns() {
        let output = generate(&example_store(), &ReportOptions::default()).unwrap();

        assert_eq!(output.summary_count("num_broken_resources"), Some(4));
        let keys: Vec<&str> = output.table.columns.iter().map(|c| c.key).collect();
        assert_eq!(keys, ORGANIZATION_ORDER);
    }
}

//! Datasets-without-tags report.
//!
//! Lists a sample of datasets that carry no tags and summarizes how tagging
//! looks across the filtered dataset population.

use crate::error::ReportError;
use crate::models::{Package, TaglessReport, TaglessRow};
use crate::reports::{
    number_cell, percent, round1, scope_for, Column, ReportOptions, ReportOutput, Table,
};
use crate::store::CatalogStore;
use chrono::SecondsFormat;
use serde_json::Value;
use tracing::debug;

/// Sample rows included in the report table.
const SAMPLE_ROWS: usize = 5;

/// Placeholder shown when a dataset has no description.
const DEFAULT_NOTES: &str = "No description";

/// Produce the tagless-datasets report for the given options.
pub fn tagless_report(
    store: &dyn CatalogStore,
    options: &ReportOptions,
) -> Result<TaglessReport, ReportError> {
    let scope = scope_for(store, options)?;
    let packages = store.packages(&scope)?;

    let mut tagless: Vec<&Package> = Vec::new();
    let mut num_taggings = 0usize;
    for pkg in &packages {
        let tags = store.tag_count(&pkg.id)?;
        num_taggings += tags;
        if tags == 0 {
            tagless.push(pkg);
        }
    }
    tagless.sort_by(|a, b| a.name.cmp(&b.name));

    let num_packages = packages.len();
    debug!(
        "tagless report: {} of {} packages untagged, {} taggings",
        tagless.len(),
        num_packages,
        num_taggings
    );

    let table = tagless
        .iter()
        .take(SAMPLE_ROWS)
        .map(|pkg| TaglessRow {
            name: pkg.name.clone(),
            title: pkg.title.clone(),
            notes: dataset_notes(pkg),
            created: pkg
                .metadata_created
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
        .collect();

    let average_tags_per_package = if num_packages == 0 {
        None
    } else {
        Some(round1(num_taggings as f64 / num_packages as f64))
    };

    Ok(TaglessReport {
        table,
        num_packages,
        packages_without_tags_percent: percent(tagless.len(), num_packages),
        average_tags_per_package,
    })
}

/// Dataset description with a placeholder for empty or missing notes.
fn dataset_notes(pkg: &Package) -> String {
    match pkg.notes.as_deref() {
        Some(notes) if !notes.trim().is_empty() => notes.to_string(),
        _ => DEFAULT_NOTES.to_string(),
    }
}

/// Registry adapter: run the report and flatten it for presentation.
pub fn generate(
    store: &dyn CatalogStore,
    options: &ReportOptions,
) -> Result<ReportOutput, ReportError> {
    tagless_report(store, options).map(into_output)
}

fn into_output(report: TaglessReport) -> ReportOutput {
    let columns = vec![
        Column { key: "name", label: "Dataset" },
        Column { key: "title", label: "Title" },
        Column { key: "notes", label: "Notes" },
        Column { key: "created", label: "Created" },
    ];

    let rows = report
        .table
        .iter()
        .map(|row| {
            vec![
                Value::from(row.name.clone()),
                Value::from(row.title.clone()),
                Value::from(row.notes.clone()),
                Value::from(row.created.clone()),
            ]
        })
        .collect();

    ReportOutput {
        summary: vec![
            ("num_packages", report.num_packages.into()),
            (
                "packages_without_tags_percent",
                number_cell(report.packages_without_tags_percent),
            ),
            (
                "average_tags_per_package",
                number_cell(report.average_tags_per_package),
            ),
        ],
        table: Table { columns, rows },
    }
}

/// Option sets worth pre-rendering: the unfiltered report plus one per
/// active organization.
pub fn option_combinations(
    store: &dyn CatalogStore,
) -> Result<Vec<ReportOptions>, ReportError> {
    let mut combinations = vec![ReportOptions::default()];
    for org in store.organizations()? {
        combinations.push(ReportOptions::for_organization(&org.name));
    }
    Ok(combinations)
}

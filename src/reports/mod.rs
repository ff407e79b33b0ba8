//! Report registry and shared aggregation helpers.
//!
//! Each report kind registers a generator and an option-combination
//! enumerator under a stable name; the registry is built once at startup
//! instead of being discovered at runtime.

pub mod broken_links;
pub mod tagless;

pub use broken_links::broken_link_report;
pub use tagless::tagless_report;

use crate::error::{ReportError, StoreError};
use crate::store::{CatalogStore, OrgScope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options accepted by every report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Restrict to one organization by name; `None` aggregates across all.
    #[serde(default)]
    pub organization: Option<String>,
    /// Widen an organization filter to its descendant organizations.
    #[serde(default)]
    pub include_sub_organizations: bool,
}

impl ReportOptions {
    /// Options filtered to one organization, without sub-organizations.
    pub fn for_organization(name: &str) -> Self {
        Self {
            organization: Some(name.to_string()),
            include_sub_organizations: false,
        }
    }
}

/// Resolve report options to the organization scope they describe.
pub fn scope_for(
    store: &dyn CatalogStore,
    options: &ReportOptions,
) -> Result<OrgScope, StoreError> {
    match &options.organization {
        Some(name) => store.organization_scope(name, options.include_sub_organizations),
        None => Ok(OrgScope::all()),
    }
}

/// Percentage of `numerator` in `denominator`, rounded to one decimal.
///
/// `None` when the denominator is zero; callers render that as an absent
/// value rather than dividing.
pub fn percent(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(round1(100.0 * numerator as f64 / denominator as f64))
    }
}

/// Round to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Turn an optional number into a table cell value.
pub(crate) fn number_cell(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Column of a rendered table: stable key plus display label.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    /// Machine-readable field name.
    pub key: &'static str,
    /// Human-readable heading.
    pub label: &'static str,
}

/// Generic ordered table handed to the presentation layer.
///
/// Rows are cell vectors aligned with `columns`; the column sequence is the
/// presentation order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Table {
    /// Ordered columns.
    pub columns: Vec<Column>,
    /// Cell values, one vector per row.
    pub rows: Vec<Vec<Value>>,
}

/// Uniform output of a report run: summary fields in presentation order
/// plus the table payload.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    /// Named summary figures, in presentation order.
    pub summary: Vec<(&'static str, Value)>,
    /// The report table.
    pub table: Table,
}

impl ReportOutput {
    /// Look up a summary figure as an integer, if present.
    pub fn summary_count(&self, key: &str) -> Option<u64> {
        self.summary
            .iter()
            .find(|(name, _)| *name == key)
            .and_then(|(_, value)| value.as_u64())
    }
}

/// Generator function of a report kind.
pub type GenerateFn = fn(&dyn CatalogStore, &ReportOptions) -> Result<ReportOutput, ReportError>;

/// Option-combination enumerator of a report kind.
pub type OptionCombinationsFn =
    fn(&dyn CatalogStore) -> Result<Vec<ReportOptions>, ReportError>;

/// A registered report kind.
#[derive(Debug)]
pub struct ReportInfo {
    /// Stable report name, used on the command line and in file names.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Defaults applied when no options are given.
    pub option_defaults: ReportOptions,
    /// Generator.
    pub generate: GenerateFn,
    /// Enumerates the option sets worth pre-rendering.
    pub option_combinations: OptionCombinationsFn,
}

/// Registry of report kinds, built once at startup.
pub struct Registry {
    reports: Vec<ReportInfo>,
}

impl Registry {
    /// Registry holding the built-in reports.
    pub fn with_builtin_reports() -> Self {
        Self {
            reports: vec![
                ReportInfo {
                    name: "tagless-datasets",
                    description: "Datasets which have no tags.",
                    option_defaults: ReportOptions::default(),
                    generate: tagless::generate,
                    option_combinations: tagless::option_combinations,
                },
                ReportInfo {
                    name: "broken-links",
                    description: "Dataset resource URLs that are found to result in errors \
                                  when resolved.",
                    option_defaults: ReportOptions::default(),
                    generate: broken_links::generate,
                    option_combinations: broken_links::option_combinations,
                },
            ],
        }
    }

    /// Look up a report by name.
    pub fn get(&self, name: &str) -> Result<&ReportInfo, ReportError> {
        self.reports
            .iter()
            .find(|info| info.name == name)
            .ok_or_else(|| ReportError::UnknownReport(name.to_string()))
    }

    /// Iterate over the registered reports.
    pub fn iter(&self) -> impl Iterator<Item = &ReportInfo> {
        self.reports.iter()
    }

    /// Number of registered reports.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// True when nothing is registered.
    #[allow(dead_code)] // Companion to len
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

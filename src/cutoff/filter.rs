use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use crate::cutoff::{
    dataset::Dataset,
    models::{Category, CutoffRecord},
};

/// Conjunction of optional column predicates. An empty set or `None` means
/// the column is not filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub branches: BTreeSet<String>,
    pub college: Option<String>,
    pub category: Option<Category>,
    pub locations: BTreeSet<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(mut self, code: impl AsRef<str>) -> Self {
        if let Some(code) = non_empty(code.as_ref()) {
            self.branches.insert(code);
        }
        self
    }

    pub fn with_branches<I, S>(self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes.into_iter().fold(self, |f, code| f.with_branch(code))
    }

    pub fn with_college(mut self, code: impl AsRef<str>) -> Self {
        self.college = non_empty(code.as_ref());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_location(mut self, location: impl AsRef<str>) -> Self {
        if let Some(location) = non_empty(location.as_ref()) {
            self.locations.insert(location);
        }
        self
    }

    pub fn with_locations<I, S>(self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        locations.into_iter().fold(self, |f, l| f.with_location(l))
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
            && self.college.is_none()
            && self.category.is_none()
            && self.locations.is_empty()
    }

    /// True if the record satisfies every supplied predicate
    pub fn matches(&self, record: &CutoffRecord) -> bool {
        (self.branches.is_empty() || self.branches.contains(&record.branch_code))
            && self
                .college
                .as_deref()
                .map_or(true, |code| record.college_code == code)
            && self
                .category
                .map_or(true, |category| record.category == category.code())
            && (self.locations.is_empty() || self.locations.contains(&record.location))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Order used by the explorer view: college, then branch, then rank.
pub fn explorer_order(a: &CutoffRecord, b: &CutoffRecord) -> Ordering {
    a.college_code
        .cmp(&b.college_code)
        .then_with(|| a.branch_code.cmp(&b.branch_code))
        .then_with(|| a.cutoff_rank.cmp(&b.cutoff_rank))
}

/// Rows matching `filter` with no null output cell, sorted by
/// (College Code, Branch Code, Cutoff Rank).
pub fn filter_records<'a>(dataset: &'a Dataset, filter: &RecordFilter) -> Vec<&'a CutoffRecord> {
    let mut rows: Vec<&CutoffRecord> = dataset
        .records()
        .iter()
        .filter(|record| filter.matches(record))
        .filter(|record| record.is_complete())
        .collect();

    rows.sort_by(|a, b| explorer_order(a, b));

    debug!(
        "Filter {:?} kept {} of {} rows",
        filter,
        rows.len(),
        dataset.len()
    );
    rows
}

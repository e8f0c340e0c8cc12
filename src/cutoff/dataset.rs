use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    cutoff::models::{CutoffRecord, RawCutoffRow},
    error::{Result, SelectError},
};

/// Columns every cutoff file must carry (after header trimming)
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "College Code",
    "College Name",
    "Location",
    "Branch Code",
    "Branch Name",
    "Category",
    "Cutoff Rank",
];

/// Read-only cutoff table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<CutoffRecord>,
    source: Option<PathBuf>,
}

impl Dataset {
    pub fn from_records(records: Vec<CutoffRecord>) -> Self {
        Self {
            records,
            source: None,
        }
    }

    /// Load a cutoff CSV from disk
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading cutoff dataset from {}", path.display());
        let file = File::open(path).map_err(|e| {
            SelectError::Data(format!("cannot read {}: {}", path.display(), e))
        })?;

        let mut dataset = Self::from_reader(file)?;
        dataset.source = Some(path.to_path_buf());
        Ok(dataset)
    }

    /// Parse CSV text. Header names and cells are trimmed; the rank column is
    /// coerced, so a bad rank never fails the load. Any malformed row does.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SelectError::MissingColumns(missing));
        }

        let mut records = Vec::new();
        for row in reader.deserialize::<RawCutoffRow>() {
            records.push(CutoffRecord::from(row?));
        }

        let unranked = records.iter().filter(|r| r.cutoff_rank.is_none()).count();
        debug!(
            "Parsed {} cutoff rows ({} without a usable rank)",
            records.len(),
            unranked
        );

        Ok(Self {
            records,
            source: None,
        })
    }

    pub fn records(&self) -> &[CutoffRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn ranked_count(&self) -> usize {
        self.records.iter().filter(|r| r.cutoff_rank.is_some()).count()
    }

    /// Distinct `(College Code, College Name)` pairs, sorted
    pub fn colleges(&self) -> Vec<(String, String)> {
        self.distinct_pairs(|r| (&r.college_code, &r.college_name))
    }

    /// Distinct `(Branch Code, Branch Name)` pairs, sorted
    pub fn branches(&self) -> Vec<(String, String)> {
        self.distinct_pairs(|r| (&r.branch_code, &r.branch_name))
    }

    /// Distinct non-null locations, sorted
    pub fn locations(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.location.is_empty())
            .map(|r| r.location.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn distinct_pairs<F>(&self, project: F) -> Vec<(String, String)>
    where
        F: Fn(&CutoffRecord) -> (&String, &String),
    {
        self.records
            .iter()
            .map(&project)
            .filter(|(code, _)| !code.is_empty())
            .map(|(code, name)| (code.clone(), name.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

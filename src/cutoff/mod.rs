pub mod models;
pub mod dataset;
pub mod filter;
pub mod eligibility;
pub mod cache;
pub mod labels;

pub use models::{Category, CutoffRecord};
pub use dataset::{Dataset, REQUIRED_COLUMNS};
pub use filter::{filter_records, RecordFilter};
pub use eligibility::{find_eligible, tolerance, EligibilityChecker, EligibleSet, RankQuery, ToleranceBand};
pub use cache::{CsvFile, DatasetCache, DatasetSource};

use serde::Serialize;
use tracing::debug;

use crate::{
    cutoff::{
        dataset::Dataset,
        filter::RecordFilter,
        models::{Category, CutoffRecord},
    },
    error::{Result, SelectError},
};

/// Smallest half-width of the band, whatever the rank
pub const MIN_TOLERANCE: u32 = 500;

/// Band half-width as a percentage of the rank
pub const TOLERANCE_PERCENT: u64 = 15;

/// `max(floor(rank * 0.15), 500)`, computed in integers.
pub fn tolerance(rank: u32) -> u32 {
    let scaled = u64::from(rank) * TOLERANCE_PERCENT / 100;
    // rank * 0.15 always fits back into u32
    (scaled as u32).max(MIN_TOLERANCE)
}

/// Inclusive window of cutoff ranks considered reachable from `rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToleranceBand {
    pub rank: u32,
    pub tolerance: u32,
    pub min_rank: u32,
    pub max_rank: u32,
}

impl ToleranceBand {
    /// Rejects ranks below 1 (and beyond `u32`) as an invalid query.
    pub fn for_rank(rank: i64) -> Result<Self> {
        if rank < 1 {
            return Err(SelectError::InvalidQuery(format!(
                "rank must be a positive integer, got {}",
                rank
            )));
        }
        let rank = u32::try_from(rank)
            .map_err(|_| SelectError::InvalidQuery(format!("rank {} is out of range", rank)))?;

        let tolerance = tolerance(rank);
        Ok(Self {
            rank,
            tolerance,
            min_rank: rank.saturating_sub(tolerance).max(1),
            max_rank: rank.saturating_add(tolerance),
        })
    }

    pub fn contains(&self, cutoff_rank: u32) -> bool {
        (self.min_rank..=self.max_rank).contains(&cutoff_rank)
    }
}

/// Rank-based search request. The category is mandatory; any category set on
/// `filters` is overridden by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankQuery {
    pub rank: i64,
    pub category: Category,
    pub filters: RecordFilter,
}

impl RankQuery {
    pub fn new(rank: i64, category: Category) -> Self {
        Self {
            rank,
            category,
            filters: RecordFilter::default(),
        }
    }

    pub fn with_filters(mut self, filters: RecordFilter) -> Self {
        self.filters = filters;
        self
    }
}

/// Records reachable for a query, ordered by cutoff rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibleSet<'a> {
    pub band: ToleranceBand,
    pub records: Vec<&'a CutoffRecord>,
}

impl EligibleSet<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct EligibilityChecker<'a> {
    dataset: &'a Dataset,
}

impl<'a> EligibilityChecker<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Check whether a single record is reachable inside `band`
    ///
    /// A record is eligible if:
    /// 1. it passes the query's column filters,
    /// 2. it is published for the query's category, and
    /// 3. it has a cutoff rank inside the band.
    pub fn is_eligible(&self, record: &CutoffRecord, band: &ToleranceBand, query: &RankQuery) -> bool {
        query.filters.matches(record)
            && record.category == query.category.code()
            && record.cutoff_rank.map_or(false, |r| band.contains(r))
    }

    /// Validate the rank, build the band and collect every eligible record,
    /// sorted ascending by cutoff rank (ties keep dataset order).
    pub fn find_eligible(&self, query: &RankQuery) -> Result<EligibleSet<'a>> {
        let band = ToleranceBand::for_rank(query.rank)?;
        let query = RankQuery {
            filters: RecordFilter {
                category: Some(query.category),
                ..query.filters.clone()
            },
            ..query.clone()
        };

        let mut records: Vec<&'a CutoffRecord> = self
            .dataset
            .records()
            .iter()
            .filter(|record| self.is_eligible(record, &band, &query))
            .collect();
        records.sort_by_key(|record| record.cutoff_rank);

        debug!(
            "Rank {} ({}): band [{}, {}] matched {} rows",
            band.rank,
            query.category,
            band.min_rank,
            band.max_rank,
            records.len()
        );

        Ok(EligibleSet { band, records })
    }
}

/// Convenience wrapper around [`EligibilityChecker::find_eligible`]
pub fn find_eligible<'a>(dataset: &'a Dataset, query: &RankQuery) -> Result<EligibleSet<'a>> {
    EligibilityChecker::new(dataset).find_eligible(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_floor_and_scaling() {
        assert_eq!(tolerance(1), 500);
        assert_eq!(tolerance(1000), 500);
        assert_eq!(tolerance(3333), 500);
        assert_eq!(tolerance(3340), 501);
        assert_eq!(tolerance(10000), 1500);
        assert_eq!(tolerance(10007), 1501);
    }

    #[test]
    fn test_band_for_small_rank_floors_at_one() {
        let band = ToleranceBand::for_rank(100).unwrap();
        assert_eq!(band.tolerance, 500);
        assert_eq!((band.min_rank, band.max_rank), (1, 600));
        assert!(band.contains(1));
        assert!(band.contains(600));
        assert!(!band.contains(601));
    }

    #[test]
    fn test_band_rejects_non_positive_rank() {
        assert!(matches!(ToleranceBand::for_rank(0), Err(SelectError::InvalidQuery(_))));
        assert!(matches!(ToleranceBand::for_rank(-5), Err(SelectError::InvalidQuery(_))));
        assert!(matches!(
            ToleranceBand::for_rank(i64::from(u32::MAX) + 1),
            Err(SelectError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_band_saturates_at_top() {
        let band = ToleranceBand::for_rank(i64::from(u32::MAX)).unwrap();
        assert_eq!(band.max_rank, u32::MAX);
    }

    #[test]
    fn test_category_on_filters_is_overridden() {
        let row = |category: &str, rank| CutoffRecord {
            college_code: "C1".to_string(),
            college_name: "College".to_string(),
            location: "X".to_string(),
            branch_code: "B1".to_string(),
            branch_name: "Branch".to_string(),
            category: category.to_string(),
            cutoff_rank: Some(rank),
        };
        let dataset = Dataset::from_records(vec![row("GM", 1000), row("SCG", 1000)]);

        let query = RankQuery::new(1000, Category::SCG)
            .with_filters(RecordFilter::new().with_category(Category::GM));
        let result = find_eligible(&dataset, &query).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.records[0].category, "SCG");
    }
}

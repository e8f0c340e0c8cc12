use cet_select::cutoff::{
    filter_records, find_eligible, tolerance, Category, CutoffRecord, Dataset, DatasetCache, RankQuery,
    RecordFilter, ToleranceBand,
};
use cet_select::SelectError;
use std::io::Write;

const CAT_A: Category = Category::GM;
const CAT_B: Category = Category::SCG;

fn row(college: &str, branch: &str, location: &str, category: Category, rank: u32) -> CutoffRecord {
    CutoffRecord {
        college_code: college.to_string(),
        college_name: format!("College {college}"),
        location: location.to_string(),
        branch_code: branch.to_string(),
        branch_name: format!("Branch {branch}"),
        category: category.code().to_string(),
        cutoff_rank: Some(rank),
    }
}

fn three_rows() -> Dataset {
    Dataset::from_records(vec![
        row("C1", "B1", "X", CAT_A, 1000),
        row("C1", "B2", "Y", CAT_A, 2000),
        row("C2", "B1", "X", CAT_B, 1500),
    ])
}

fn larger_dataset() -> Dataset {
    let colleges = ["C1", "C2", "C3"];
    let branches = ["B1", "B2", "B3"];
    let locations = ["X", "Y"];
    let categories = [Category::GM, Category::SCG, Category::Cat2AR];

    let mut rows = Vec::new();
    let mut rank = 37u32;
    for (ci, college) in colleges.iter().enumerate() {
        for branch in branches {
            for category in categories {
                rank = (rank * 7919 + 13) % 20_000 + 1;
                rows.push(row(college, branch, locations[ci % 2], category, rank));
            }
        }
    }
    // A few incomplete rows that the explorer must drop
    let mut no_rank = row("C1", "B1", "X", Category::GM, 1);
    no_rank.cutoff_rank = None;
    rows.push(no_rank);
    let mut no_location = row("C2", "B2", "", Category::GM, 800);
    no_location.location.clear();
    rows.push(no_location);

    Dataset::from_records(rows)
}

fn key(college: &str, branch: &str, category: &str, rank: Option<u32>) -> (String, String, String, Option<u32>) {
    (college.to_string(), branch.to_string(), category.to_string(), rank)
}

fn keys(rows: &[&CutoffRecord]) -> Vec<(String, String, String, Option<u32>)> {
    rows.iter()
        .map(|r| (r.college_code.clone(), r.branch_code.clone(), r.category.clone(), r.cutoff_rank))
        .collect()
}

#[test]
fn rank_1000_cat_a_returns_only_exact_row() {
    let dataset = three_rows();
    let result = find_eligible(&dataset, &RankQuery::new(1000, CAT_A)).unwrap();

    assert_eq!(result.band.tolerance, 500);
    assert_eq!((result.band.min_rank, result.band.max_rank), (500, 1500));
    assert_eq!(
        keys(&result.records),
        vec![key("C1", "B1", "GM", Some(1000))]
    );
}

#[test]
fn branch_and_category_filter_selects_third_row() {
    let dataset = three_rows();
    let filter = RecordFilter::new().with_branch("B1").with_category(CAT_B);
    let rows = filter_records(&dataset, &filter);
    assert_eq!(
        keys(&rows),
        vec![key("C2", "B1", "SCG", Some(1500))]
    );
}

#[test]
fn small_rank_band_floors_at_one() {
    let band = ToleranceBand::for_rank(100).unwrap();
    assert_eq!((band.min_rank, band.max_rank), (1, 600));
}

#[test]
fn no_filters_returns_whole_dataset_sorted() {
    let dataset = three_rows();
    let rows = filter_records(&dataset, &RecordFilter::new());
    assert_eq!(rows.len(), 3);
    assert_eq!(
        keys(&rows),
        vec![
            key("C1", "B1", "GM", Some(1000)),
            key("C1", "B2", "GM", Some(2000)),
            key("C2", "B1", "SCG", Some(1500)),
        ]
    );
}

#[test]
fn tolerance_examples() {
    assert_eq!(tolerance(1000), 500);
    assert_eq!(tolerance(10000), 1500);
    for rank in [1u32, 2, 499, 3333, 3334, 3340, 9999, 123_456] {
        let expected = ((u64::from(rank) * 15) / 100).max(500) as u32;
        assert_eq!(tolerance(rank), expected, "rank {rank}");
    }
}

#[test]
fn non_positive_rank_is_invalid_query_not_empty_result() {
    let dataset = three_rows();
    for rank in [0, -1, -1000] {
        let err = find_eligible(&dataset, &RankQuery::new(rank, CAT_A)).unwrap_err();
        assert!(matches!(err, SelectError::InvalidQuery(_)));
        assert!(!err.is_data_error());
    }

    // An empty result is a normal outcome
    let empty = find_eligible(&dataset, &RankQuery::new(50_000, CAT_A)).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn filter_is_sound_and_complete_for_all_combinations() {
    let dataset = larger_dataset();

    let branch_sets: Vec<Vec<&str>> = vec![vec![], vec!["B1"], vec!["B2", "B3"]];
    let colleges = [None, Some("C2")];
    let categories = [None, Some(Category::GM), Some(Category::Cat2AR)];
    let location_sets: Vec<Vec<&str>> = vec![vec![], vec!["Y"], vec!["X", "Y"]];

    for branches in &branch_sets {
        for college in colleges {
            for category in categories {
                for locations in &location_sets {
                    let mut filter = RecordFilter::new()
                        .with_branches(branches)
                        .with_locations(locations);
                    if let Some(college) = college {
                        filter = filter.with_college(college);
                    }
                    if let Some(category) = category {
                        filter = filter.with_category(category);
                    }

                    let rows = filter_records(&dataset, &filter);

                    let satisfies = |r: &CutoffRecord| {
                        (branches.is_empty() || branches.contains(&r.branch_code.as_str()))
                            && college.map_or(true, |c| r.college_code == c)
                            && category.map_or(true, |c| r.category == c.code())
                            && (locations.is_empty() || locations.contains(&r.location.as_str()))
                            && r.is_complete()
                    };

                    // soundness
                    assert!(rows.iter().all(|r| satisfies(*r)), "{filter:?}");
                    // completeness
                    let expected = dataset.records().iter().filter(|r| satisfies(*r)).count();
                    assert_eq!(rows.len(), expected, "{filter:?}");
                    // ordering
                    assert!(rows.windows(2).all(|w| {
                        (&w[0].college_code, &w[0].branch_code, w[0].cutoff_rank)
                            <= (&w[1].college_code, &w[1].branch_code, w[1].cutoff_rank)
                    }));
                }
            }
        }
    }
}

#[test]
fn eligible_results_stay_inside_band_and_are_rank_sorted() {
    let dataset = larger_dataset();

    for rank in [1i64, 250, 999, 4_000, 9_000, 15_000, 19_999] {
        for category in [Category::GM, Category::SCG, Category::Cat2AR] {
            let query = RankQuery::new(rank, category);
            let result = find_eligible(&dataset, &query).unwrap();
            let band = result.band;

            let lo = (rank - i64::from(band.tolerance)).max(1);
            let hi = rank + i64::from(band.tolerance);
            for record in &result.records {
                let cutoff = i64::from(record.cutoff_rank.unwrap());
                assert!((lo..=hi).contains(&cutoff));
                assert_eq!(record.category, category.code());
            }
            assert!(result
                .records
                .windows(2)
                .all(|w| w[0].cutoff_rank <= w[1].cutoff_rank));

            let expected = dataset
                .records()
                .iter()
                .filter(|r| r.category == category.code())
                .filter(|r| r.cutoff_rank.map_or(false, |c| (lo..=hi).contains(&i64::from(c))))
                .count();
            assert_eq!(result.len(), expected);
        }
    }
}

#[test]
fn eligible_respects_other_filters() {
    let dataset = larger_dataset();
    let filters = RecordFilter::new().with_college("C3").with_branches(["B1", "B3"]);
    let query = RankQuery::new(10_000, Category::GM).with_filters(filters);
    let result = find_eligible(&dataset, &query).unwrap();
    assert!(result
        .records
        .iter()
        .all(|r| r.college_code == "C3" && r.branch_code != "B2"));
}

#[test]
fn repeated_queries_are_identical() {
    let dataset = larger_dataset();
    let filter = RecordFilter::new().with_location("X");
    assert_eq!(filter_records(&dataset, &filter), filter_records(&dataset, &filter));

    let query = RankQuery::new(8_000, Category::SCG);
    assert_eq!(
        find_eligible(&dataset, &query).unwrap(),
        find_eligible(&dataset, &query).unwrap()
    );
}

#[test]
fn cache_serves_csv_file_until_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cutoffs.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "College Code , College Name,Location,Branch Code,Branch Name,Category,Cutoff Rank").unwrap();
    writeln!(file, "E001,Alpha,Bangalore,CS,Computer Science,GM,1200").unwrap();
    drop(file);

    let cache = DatasetCache::from_path(&path);
    let first = cache.get().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first.source(), Some(path.as_path()));

    std::fs::write(
        &path,
        "College Code,College Name,Location,Branch Code,Branch Name,Category,Cutoff Rank\n\
         E001,Alpha,Bangalore,CS,Computer Science,GM,1200\n\
         E002,Beta,Mysore,EC,Electronics,GM,1300\n",
    )
    .unwrap();

    // Still the cached copy
    assert_eq!(cache.get().unwrap().len(), 1);
    // Explicit reload picks up the new file
    assert_eq!(cache.reload().unwrap().len(), 2);

    std::fs::write(&path, "College Code,Category\nE001,GM\n").unwrap();
    let err = cache.reload().unwrap_err();
    assert!(matches!(err, SelectError::MissingColumns(_)));
    assert!(!cache.is_loaded());
}

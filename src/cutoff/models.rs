use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SelectError;

/// One row of the cutoff table: a college/branch/category combination.
///
/// Text cells that were empty in the source are kept as empty strings and
/// count as null; see [`CutoffRecord::is_complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutoffRecord {
    #[serde(rename = "College Code")]
    pub college_code: String,
    #[serde(rename = "College Name")]
    pub college_name: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Branch Code")]
    pub branch_code: String,
    #[serde(rename = "Branch Name")]
    pub branch_name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Cutoff Rank")]
    pub cutoff_rank: Option<u32>,
}

impl CutoffRecord {
    /// True when none of the seven output columns is null.
    pub fn is_complete(&self) -> bool {
        self.cutoff_rank.is_some()
            && [
                &self.college_code,
                &self.college_name,
                &self.location,
                &self.branch_code,
                &self.branch_name,
                &self.category,
            ]
            .iter()
            .all(|cell| !cell.is_empty())
    }
}

/// Row as it appears in the CSV, before rank coercion.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCutoffRow {
    #[serde(rename = "College Code")]
    pub college_code: String,
    #[serde(rename = "College Name")]
    pub college_name: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Branch Code")]
    pub branch_code: String,
    #[serde(rename = "Branch Name")]
    pub branch_name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Cutoff Rank")]
    pub cutoff_rank: String,
}

impl From<RawCutoffRow> for CutoffRecord {
    fn from(raw: RawCutoffRow) -> Self {
        let cutoff_rank = parse_rank(&raw.cutoff_rank);
        Self {
            college_code: raw.college_code,
            college_name: raw.college_name,
            location: raw.location,
            branch_code: raw.branch_code,
            branch_name: raw.branch_name,
            category: raw.category,
            cutoff_rank,
        }
    }
}

/// Coerce a rank cell. Anything that is not a positive integer (integral
/// floats such as `1500.0` included) becomes a missing rank.
pub fn parse_rank(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(n) = raw.parse::<u64>() {
        return u32::try_from(n).ok().filter(|n| *n > 0);
    }

    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value >= 1.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

/// Reservation categories a cutoff can be published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    GM,
    GMK,
    GMR,
    Cat1G,
    Cat1K,
    Cat1R,
    Cat2AG,
    Cat2AK,
    Cat2AR,
    Cat2BG,
    Cat2BK,
    Cat2BR,
    Cat3AG,
    Cat3AK,
    Cat3AR,
    Cat3BG,
    Cat3BK,
    Cat3BR,
    SCG,
    SCK,
    SCR,
    STG,
    STK,
    STR,
}

impl Category {
    pub const ALL: [Category; 24] = [
        Category::GM,
        Category::GMK,
        Category::GMR,
        Category::Cat1G,
        Category::Cat1K,
        Category::Cat1R,
        Category::Cat2AG,
        Category::Cat2AK,
        Category::Cat2AR,
        Category::Cat2BG,
        Category::Cat2BK,
        Category::Cat2BR,
        Category::Cat3AG,
        Category::Cat3AK,
        Category::Cat3AR,
        Category::Cat3BG,
        Category::Cat3BK,
        Category::Cat3BR,
        Category::SCG,
        Category::SCK,
        Category::SCR,
        Category::STG,
        Category::STK,
        Category::STR,
    ];

    /// Code as written in the dataset's `Category` column
    pub fn code(&self) -> &'static str {
        match self {
            Category::GM => "GM",
            Category::GMK => "GMK",
            Category::GMR => "GMR",
            Category::Cat1G => "1G",
            Category::Cat1K => "1K",
            Category::Cat1R => "1R",
            Category::Cat2AG => "2AG",
            Category::Cat2AK => "2AK",
            Category::Cat2AR => "2AR",
            Category::Cat2BG => "2BG",
            Category::Cat2BK => "2BK",
            Category::Cat2BR => "2BR",
            Category::Cat3AG => "3AG",
            Category::Cat3AK => "3AK",
            Category::Cat3AR => "3AR",
            Category::Cat3BG => "3BG",
            Category::Cat3BK => "3BK",
            Category::Cat3BR => "3BR",
            Category::SCG => "SCG",
            Category::SCK => "SCK",
            Category::SCR => "SCR",
            Category::STG => "STG",
            Category::STK => "STK",
            Category::STR => "STR",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::GM => "General Merit (Unreserved)",
            Category::GMK => "General Merit - Kannada Medium",
            Category::GMR => "General Merit - Rural",
            Category::Cat1G => "Category 1 - General",
            Category::Cat1K => "Category 1 - Kannada Medium",
            Category::Cat1R => "Category 1 - Rural",
            Category::Cat2AG => "Category 2A - General",
            Category::Cat2AK => "Category 2A - Kannada Medium",
            Category::Cat2AR => "Category 2A - Rural",
            Category::Cat2BG => "Category 2B - General",
            Category::Cat2BK => "Category 2B - Kannada Medium",
            Category::Cat2BR => "Category 2B - Rural",
            Category::Cat3AG => "Category 3A - General",
            Category::Cat3AK => "Category 3A - Kannada Medium",
            Category::Cat3AR => "Category 3A - Rural",
            Category::Cat3BG => "Category 3B - General",
            Category::Cat3BK => "Category 3B - Kannada Medium",
            Category::Cat3BR => "Category 3B - Rural",
            Category::SCG => "SC - General",
            Category::SCK => "SC - Kannada Medium",
            Category::SCR => "SC - Rural",
            Category::STG => "ST - General",
            Category::STK => "ST - Kannada Medium",
            Category::STR => "ST - Rural",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Category {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SelectError::InvalidQuery(format!("unknown category '{}'", wanted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank() {
        assert_eq!(parse_rank("1500"), Some(1500));
        assert_eq!(parse_rank(" 42 "), Some(42));
        assert_eq!(parse_rank("1500.0"), Some(1500));
        assert_eq!(parse_rank(""), None);
        assert_eq!(parse_rank("--"), None);
        assert_eq!(parse_rank("0"), None);
        assert_eq!(parse_rank("-12"), None);
        assert_eq!(parse_rank("12.5"), None);
        assert_eq!(parse_rank("NaN"), None);
        assert_eq!(parse_rank("99999999999"), None);
    }

    #[test]
    fn test_category_codes_roundtrip() {
        for category in Category::ALL {
            assert_eq!(category.code().parse::<Category>().unwrap(), category);
        }
        assert_eq!("2ag".parse::<Category>().unwrap(), Category::Cat2AG);
        assert!(matches!(
            "XYZ".parse::<Category>(),
            Err(SelectError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_is_complete() {
        let mut record = CutoffRecord {
            college_code: "E001".to_string(),
            college_name: "Some College".to_string(),
            location: "Bangalore".to_string(),
            branch_code: "CS".to_string(),
            branch_name: "Computer Science".to_string(),
            category: "GM".to_string(),
            cutoff_rank: Some(1200),
        };
        assert!(record.is_complete());

        record.location.clear();
        assert!(!record.is_complete());

        record.location = "Mysore".to_string();
        record.cutoff_rank = None;
        assert!(!record.is_complete());
    }
}

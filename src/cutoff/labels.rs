use std::path::Path;

use tracing::info;

use crate::error::{Result, SelectError};

/// Substrings that mark a branch as computer-science flavoured
pub const CS_KEYWORDS: [&str; 11] = [
    "computer",
    "cs",
    "data sc",
    "data science",
    "ai",
    "artificial intelligence",
    "cyber security",
    "info",
    "information science",
    "machine learning",
    "data engineering",
];

const CS_SUFFIX: &str = "(Computer Science)";

/// Case-insensitive substring match against [`CS_KEYWORDS`].
///
/// Loose on purpose: "Electronics" matches through "cs". Review the output
/// before publishing it.
pub fn is_cs_branch(branch_name: &str) -> bool {
    let name = branch_name.to_lowercase();
    CS_KEYWORDS.iter().any(|kw| name.contains(kw))
}

pub fn append_cs_label(branch_name: &str) -> String {
    if branch_name.to_lowercase().contains("computer science") {
        branch_name.to_string()
    } else {
        format!("{} {}", branch_name, CS_SUFFIX)
    }
}

/// True when both paths resolve to the same file on disk.
fn same_file(input: &Path, output: &Path) -> Result<bool> {
    if !output.exists() {
        return Ok(false);
    }
    Ok(std::fs::canonicalize(input)? == std::fs::canonicalize(output)?)
}

/// Copy `input` to `output`, tagging CS-like values in the `Branch Name`
/// column. Every other cell is written back untouched. Returns the number of
/// rows whose branch name changed.
///
/// `output` must not resolve to `input`: the writer truncates it before the
/// reader is done.
pub fn relabel_file(input: &Path, output: &Path) -> Result<usize> {
    if same_file(input, output)? {
        return Err(SelectError::InvalidInput(format!(
            "output {} is the same file as the input",
            output.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new().from_path(input)?;
    let headers = reader.headers()?.clone();
    let branch_idx = headers
        .iter()
        .position(|h| h.trim() == "Branch Name")
        .ok_or_else(|| SelectError::MissingColumns(vec!["Branch Name".to_string()]))?;

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&headers)?;

    let mut changed = 0;
    for row in reader.records() {
        let row = row?;
        let relabelled: Option<String> = row
            .get(branch_idx)
            .filter(|name| is_cs_branch(name))
            .map(append_cs_label)
            .filter(|label| Some(label.as_str()) != row.get(branch_idx));

        match relabelled {
            Some(label) => {
                changed += 1;
                let cells = row
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| if i == branch_idx { label.as_str() } else { cell });
                writer.write_record(cells)?;
            }
            None => writer.write_record(&row)?,
        }
    }
    writer.flush()?;

    info!(
        "Relabelled {} branch name(s) from {} into {}",
        changed,
        input.display(),
        output.display()
    );
    Ok(changed)
}

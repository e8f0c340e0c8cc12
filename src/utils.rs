use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cutoff::Category;

/// Format a cutoff rank; missing ranks show as `-`
pub fn format_rank(rank: Option<u32>) -> String {
    rank.map_or_else(|| "-".to_string(), |rank| rank.to_string())
}

/// Code and label as shown in option listings, e.g. `GM – General Merit (Unreserved)`
pub fn format_category(category: Category) -> String {
    format!("{} – {}", category.code(), category.label())
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Cut `text` to at most `width` terminal columns, marking the cut with `…`
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Pad to `width` terminal columns (truncating if longer)
pub fn pad(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let row = columns
        .iter()
        .zip(widths)
        .map(|(col, width)| pad(col, *width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", row.trim_end());
}

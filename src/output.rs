//! CLI output formatting.
//!
//! # Output Format
//!
//! ## exif
//!
//! ```text
//! IFD0   Make               FUJIFILM
//! IFD0   Orientation        normal
//! Exif   ExposureTime       1/250 s
//! GPS    GPSLatitude        48 deg 51 min 24 sec
//!
//! 4 fields
//! ```
//!
//! ## scan
//!
//! ```text
//! 0.912  /photos/2024/dawn.jpg
//! 0.734  /photos/2024/ridge.png
//!
//! 2 matches of 40 images (3 skipped)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::types::{ExifField, ScanSummary};

/// Pad `text` with spaces to `width` characters.
fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// exif
// ============================================================================

/// Format decoded fields as aligned `ifd  tag  value` rows.
pub fn format_fields(fields: &[ExifField]) -> Vec<String> {
    if fields.is_empty() {
        return vec!["No EXIF data found".to_string()];
    }

    let ifd_width = fields.iter().map(|f| f.ifd.chars().count()).max().unwrap_or(0);
    let tag_width = fields.iter().map(|f| f.tag.chars().count()).max().unwrap_or(0);

    let mut lines: Vec<String> = fields
        .iter()
        .map(|f| {
            format!("{}  {}  {}", pad(&f.ifd, ifd_width), pad(&f.tag, tag_width), f.value)
                .trim_end()
                .to_string()
        })
        .collect();
    lines.push(String::new());
    lines.push(plural(fields.len(), "field", "fields"));
    lines
}

pub fn print_fields(fields: &[ExifField]) {
    for line in format_fields(fields) {
        println!("{line}");
    }
}

// ============================================================================
// scan
// ============================================================================

/// Format scan matches as `score  path` rows followed by a summary line.
pub fn format_summary(summary: &ScanSummary) -> Vec<String> {
    let mut lines: Vec<String> = summary
        .matches
        .iter()
        .map(|m| format!("{:.3}  {}", m.score, m.path))
        .collect();
    if summary.matches.is_empty() {
        lines.push("No matching images found".to_string());
    }
    lines.push(String::new());

    let mut tail = format!(
        "{} of {}",
        plural(summary.matches.len(), "match", "matches"),
        plural(summary.candidates, "image", "images")
    );
    if summary.skipped > 0 {
        tail.push_str(&format!(" ({} skipped)", summary.skipped));
    }
    lines.push(tail);
    lines
}

pub fn print_summary(summary: &ScanSummary) {
    for line in format_summary(summary) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AestheticMatch;

    fn field(ifd: &str, tag: &str, value: &str) -> ExifField {
        ExifField {
            tag: tag.into(),
            ifd: ifd.into(),
            value: value.into(),
        }
    }

    // =========================================================================
    // format_fields
    // =========================================================================

    #[test]
    fn fields_are_column_aligned() {
        let lines = format_fields(&[
            field("IFD0", "Make", "FUJIFILM"),
            field("Exif", "ExposureTime", "1/250 s"),
            field("GPS", "GPSLatitude", "48 deg 51 min 24 sec"),
        ]);
        assert_eq!(
            lines,
            vec![
                "IFD0  Make          FUJIFILM",
                "Exif  ExposureTime  1/250 s",
                "GPS   GPSLatitude   48 deg 51 min 24 sec",
                "",
                "3 fields",
            ]
        );
    }

    #[test]
    fn empty_value_leaves_no_trailing_space() {
        let lines = format_fields(&[field("IFD0", "Artist", "")]);
        assert_eq!(lines[0], "IFD0  Artist");
        assert_eq!(lines[2], "1 field");
    }

    #[test]
    fn no_fields_says_so() {
        assert_eq!(format_fields(&[]), vec!["No EXIF data found"]);
    }

    // =========================================================================
    // format_summary
    // =========================================================================

    #[test]
    fn summary_lists_matches_then_counts() {
        let summary = ScanSummary {
            matches: vec![
                AestheticMatch {
                    path: "/p/a.jpg".into(),
                    score: 0.9124,
                },
                AestheticMatch {
                    path: "/p/b.png".into(),
                    score: 0.5,
                },
            ],
            candidates: 10,
            skipped: 1,
        };
        assert_eq!(
            format_summary(&summary),
            vec![
                "0.912  /p/a.jpg",
                "0.500  /p/b.png",
                "",
                "2 matches of 10 images (1 skipped)",
            ]
        );
    }

    #[test]
    fn empty_summary_says_no_matches() {
        let summary = ScanSummary {
            matches: Vec::new(),
            candidates: 1,
            skipped: 0,
        };
        assert_eq!(
            format_summary(&summary),
            vec!["No matching images found", "", "0 matches of 1 image"]
        );
    }
}

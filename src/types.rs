//! Shared result types returned by the command layer.
//!
//! Both serialize to JSON for `--json` output and for callers embedding the
//! library behind an RPC boundary.

use serde::{Deserialize, Serialize};

/// One decoded EXIF field.
///
/// `ifd` is the directory label (`IFD0`, `Exif`, `GPS`, `Interop`, `IFD1`),
/// `tag` the human-readable tag name or `0x<4-hex>` for unknown tags, and
/// `value` the display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifField {
    pub tag: String,
    pub ifd: String,
    pub value: String,
}

/// An image whose aesthetic score exceeded the requested threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AestheticMatch {
    /// Absolute path of the image.
    pub path: String,
    /// Score in `[0, 1]`.
    pub score: f64,
}

/// Outcome of a folder scan, including the files that were not scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Matches sorted by descending score, ties broken by path.
    pub matches: Vec<AestheticMatch>,
    /// Number of image-extension files considered.
    pub candidates: usize,
    /// Candidates that could not be read, decoded or scored.
    pub skipped: usize,
}

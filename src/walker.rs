//! Folder walker: find images under a root whose aesthetic score reaches a
//! threshold.
//!
//! ## Pipeline
//!
//! ```text
//! validate threshold → validate root → walkdir (single pass) → candidates
//!     → rayon pool: read bytes → walk container → score → filter
//!     → merge per-worker results → sort
//! ```
//!
//! Enumeration is synchronous and deterministic (`sort_by_file_name`). Scoring
//! runs on a dedicated rayon pool sized by [`config::effective_threads`], so a
//! large tree never runs more workers than there are cores. Each worker folds
//! into its own `Vec` and the partial lists are concatenated at join time; no
//! lock is shared between workers.
//!
//! ## Failure policy
//!
//! Only a bad threshold or a bad root fail the call. A file that cannot be
//! read, is not a recognised image despite its extension, has a broken
//! container structure, or cannot be scored is logged at `debug` and
//! counted in [`ScanSummary::skipped`]. An intact image without an EXIF
//! block is still a candidate.

use crate::config::{self, AppConfig};
use crate::exif::{ExifError, container};
use crate::scoring::{AestheticScorer, ScoreError, validate_score};
use crate::types::{AestheticMatch, ScanSummary};
use rayon::prelude::*;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Case-insensitive extension allow-list for scan candidates.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "webp", "heic", "heif", "avif", "bmp",
];

/// Folder names skipped unless hidden entries are included.
const SYSTEM_DIRS: &[&str] = &["$RECYCLE.BIN", "System Volume Information", "@eaDir", "lost+found"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Invalid threshold: {0} (expected a finite, non-negative number)")]
    InvalidThreshold(f64),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Why a single candidate was left out of the results.
#[derive(Error, Debug)]
enum SkipReason {
    #[error("read failed: {0}")]
    Read(#[from] io::Error),
    #[error("not a supported image: {0}")]
    NotAnImage(#[from] ExifError),
    #[error("scoring failed: {0}")]
    Score(#[from] ScoreError),
}

/// Traversal and parallelism settings for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    pub follow_links: bool,
    /// Worker threads for scoring. Zero is treated as one.
    pub threads: usize,
}

impl ScanOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            recursive: config.scan.recursive,
            include_hidden: config.scan.include_hidden,
            follow_links: config.scan.follow_links,
            threads: config::effective_threads(&config.processing),
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Return the images under `root` scoring at least `min_score`, best first.
pub fn find_aesthetic_images(
    root: &Path,
    min_score: f64,
    scorer: &dyn AestheticScorer,
    options: &ScanOptions,
) -> Result<Vec<AestheticMatch>, ScanError> {
    Ok(scan(root, min_score, scorer, options)?.matches)
}

/// Like [`find_aesthetic_images`], also reporting candidate and skip counts.
pub fn scan(
    root: &Path,
    min_score: f64,
    scorer: &dyn AestheticScorer,
    options: &ScanOptions,
) -> Result<ScanSummary, ScanError> {
    validate_threshold(min_score)?;
    let root = validate_root(root)?;

    let candidates = collect_candidates(&root, options);
    debug!(root = %root.display(), candidates = candidates.len(), "enumerated candidates");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.max(1))
        .build()?;

    let (mut matches, skipped) = pool.install(|| {
        candidates
            .par_iter()
            .fold(
                || (Vec::new(), 0usize),
                |(mut found, mut skipped), path| {
                    match score_file(path, scorer) {
                        Ok(score) if score >= min_score => found.push(AestheticMatch {
                            path: path.to_string_lossy().into_owned(),
                            score,
                        }),
                        Ok(_) => {}
                        Err(reason) => {
                            debug!(path = %path.display(), %reason, "skipped");
                            skipped += 1;
                        }
                    }
                    (found, skipped)
                },
            )
            .reduce(
                || (Vec::new(), 0),
                |(mut a, skipped_a), (b, skipped_b)| {
                    a.extend(b);
                    (a, skipped_a + skipped_b)
                },
            )
    });

    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.path.cmp(&b.path))
    });

    info!(
        root = %root.display(),
        candidates = candidates.len(),
        matches = matches.len(),
        skipped,
        "scan complete"
    );

    Ok(ScanSummary {
        matches,
        candidates: candidates.len(),
        skipped,
    })
}

fn validate_threshold(min_score: f64) -> Result<(), ScanError> {
    if min_score.is_finite() && min_score >= 0.0 {
        Ok(())
    } else {
        Err(ScanError::InvalidThreshold(min_score))
    }
}

/// Resolve `root` to an absolute, readable directory.
fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    if root.as_os_str().is_empty() || !root.is_dir() {
        return Err(ScanError::InvalidPath(root.to_path_buf()));
    }
    let root = std::path::absolute(root).map_err(|_| ScanError::InvalidPath(root.to_path_buf()))?;
    match fs::read_dir(&root) {
        Ok(_) => Ok(root),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(ScanError::PermissionDenied(root)),
        Err(_) => Err(ScanError::InvalidPath(root)),
    }
}

/// Enumerate image-extension files under `root` in file-name order.
pub fn collect_candidates(root: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let mut walk = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name();
    if !options.recursive {
        walk = walk.max_depth(1);
    }

    walk.into_iter()
        .filter_entry(|e| e.depth() == 0 || options.include_hidden || !is_hidden(e.file_name()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(%err, "walk error");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && has_image_extension(e.path()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn is_hidden(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || SYSTEM_DIRS.contains(&name.as_ref())
}

/// Whether the path's extension is in [`IMAGE_EXTENSIONS`], ignoring case.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn score_file(path: &Path, scorer: &dyn AestheticScorer) -> Result<f64, SkipReason> {
    let bytes = fs::read(path)?;
    // A recognised signature is not enough; the segment/chunk/box layout
    // has to hold together too. A missing EXIF block is fine.
    container::locate(&bytes)?;
    let score = validate_score(scorer.score(&bytes)?)?;
    Ok(score)
}

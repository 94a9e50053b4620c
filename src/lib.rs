//! # exif-scout
//!
//! Reads EXIF metadata from photo files and finds the best-scoring images in
//! a folder tree.
//!
//! # Architecture: Two Request/Response Operations
//!
//! ```text
//! read_exif(file)                  bytes → container → TIFF block → IFD tree → ordered fields
//! find_aesthetic_images(dir, min)  walk → per-file (read → sniff → score) → filter → rank
//! ```
//!
//! Both operations are exposed as async calls on [`commands::Backend`], which
//! moves the blocking work onto tokio's blocking pool and reports failures as
//! plain strings. The synchronous building blocks are public too, for callers
//! that already run on their own threads.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`exif`] | Pure-Rust EXIF decoder: byte reader, container sniffing, IFD walk, tag names, value formatting |
//! | [`scoring`] | `AestheticScorer` trait and the built-in contrast scorer |
//! | [`walker`] | Folder enumeration and bounded-parallel scoring with rayon |
//! | [`commands`] | Async entry points returning `Result<_, String>` |
//! | [`types`] | Serializable results (`ExifField`, `AestheticMatch`, `ScanSummary`) |
//! | [`config`] | `exif-scout.toml` loading and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI table formatting |
//!
//! # Design Decisions
//!
//! ## Hand-Written EXIF Decoder
//!
//! The [`exif`] module walks TIFF structures directly instead of depending on
//! a metadata crate. Every read is bounds-checked, every directory offset is
//! recorded so cyclic chains terminate, and the number of directories is
//! capped. Damage inside a file shortens the field list; it never fails the
//! call. Only an unreadable path or an unrecognised container is an error.
//!
//! ## One Decoder, Many Containers
//!
//! JPEG, TIFF, PNG, WebP and HEIF/AVIF all embed the same TIFF structure.
//! [`exif::container::locate`] reduces each of them to a byte range, and a
//! single IFD decoder handles the rest.
//!
//! ## Scoring Is Injected
//!
//! The walker only knows the [`scoring::AestheticScorer`] trait. The CLI
//! ships a contrast-based baseline; model-backed scorers plug in through
//! [`commands::Backend::new`], and tests use a deterministic fake.
//!
//! ## Per-Worker Accumulation
//!
//! Scans run on a dedicated rayon pool capped at the core count. Each worker
//! folds matches into its own list and the lists are merged at join time, so
//! no result is lost or duplicated and no lock is contended. Results are
//! sorted by descending score, ties broken by path, which keeps re-scans of
//! an unchanged folder identical.

pub mod commands;
pub mod config;
pub mod exif;
pub mod logging;
pub mod output;
pub mod scoring;
pub mod types;
pub mod walker;

#[cfg(test)]
pub(crate) mod test_helpers;

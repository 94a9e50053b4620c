//! Request/response entry points for UI and RPC callers.
//!
//! Each call runs its blocking work on tokio's blocking pool and resolves
//! exactly once. Errors cross this boundary as human-readable strings.

use crate::exif;
use crate::scoring::{AestheticScorer, ContrastScorer};
use crate::types::{AestheticMatch, ExifField, ScanSummary};
use crate::walker::{self, ScanOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state for the command entry points: the injected scorer and the
/// scan settings. Cheap to clone; overlapping calls are independent.
#[derive(Clone)]
pub struct Backend {
    scorer: Arc<dyn AestheticScorer>,
    options: ScanOptions,
}

impl Backend {
    pub fn new(scorer: Arc<dyn AestheticScorer>, options: ScanOptions) -> Self {
        Self { scorer, options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Decode the EXIF fields of one image file.
    pub async fn read_exif(&self, path: String) -> Result<Vec<ExifField>, String> {
        tokio::task::spawn_blocking(move || exif::read_exif_file(&PathBuf::from(path)))
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())
    }

    /// Scan a directory for images scoring at least `min_score`.
    pub async fn find_aesthetic_images(
        &self,
        path: String,
        min_score: f64,
    ) -> Result<Vec<AestheticMatch>, String> {
        Ok(self.scan(path, min_score).await?.matches)
    }

    /// Like [`Backend::find_aesthetic_images`], keeping the candidate and
    /// skip counts.
    pub async fn scan(&self, path: String, min_score: f64) -> Result<ScanSummary, String> {
        let scorer = Arc::clone(&self.scorer);
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || {
            walker::scan(&PathBuf::from(path), min_score, scorer.as_ref(), &options)
        })
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new(Arc::new(ContrastScorer), ScanOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::ByteOrder;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    fn backend() -> Backend {
        Backend::new(Arc::new(FakeScorer), ScanOptions::default())
    }

    fn path_string(path: &std::path::Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn read_exif_returns_fields() {
        let tmp = TempDir::new().unwrap();
        let mut b = TiffBuilder::new(ByteOrder::Little);
        let ifd0 = b.add_ifd();
        b.entry(ifd0, Entry::ascii(0x010F, "Leica"));
        let path = tmp.path().join("leica.jpg");
        fs::write(&path, jpeg_with_exif(&b.build())).unwrap();

        let fields = backend().read_exif(path_string(&path)).await.unwrap();
        assert_eq!(
            fields,
            vec![ExifField {
                tag: "Make".into(),
                ifd: "IFD0".into(),
                value: "Leica".into()
            }]
        );
    }

    #[tokio::test]
    async fn read_exif_without_metadata_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        fs::write(&path, jpeg_without_exif()).unwrap();
        assert!(backend().read_exif(path_string(&path)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_exif_errors_are_strings() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.jpg");
        let err = backend().read_exif(path_string(&missing)).await.unwrap_err();
        assert!(err.starts_with("Invalid path"), "{err}");

        let text = tmp.path().join("notes.jpg");
        fs::write(&text, "hello").unwrap();
        let err = backend().read_exif(path_string(&text)).await.unwrap_err();
        assert_eq!(err, "Unsupported image format");
    }

    #[tokio::test]
    async fn find_aesthetic_images_returns_matches() {
        let tmp = TempDir::new().unwrap();
        write_scored(tmp.path(), "keep.png", 0.8);
        write_scored(tmp.path(), "drop.png", 0.1);
        let found = backend()
            .find_aesthetic_images(path_string(tmp.path()), 0.5)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("keep.png"));
        assert_eq!(found[0].score, 0.8);
    }

    #[tokio::test]
    async fn find_aesthetic_images_rejects_bad_input() {
        let tmp = TempDir::new().unwrap();
        let err = backend()
            .find_aesthetic_images(path_string(tmp.path()), f64::NAN)
            .await
            .unwrap_err();
        assert!(err.starts_with("Invalid threshold"), "{err}");

        let err = backend()
            .find_aesthetic_images(path_string(&tmp.path().join("nope")), 0.5)
            .await
            .unwrap_err();
        assert!(err.starts_with("Invalid path"), "{err}");
    }

    #[tokio::test]
    async fn overlapping_scans_are_independent() {
        let tmp = TempDir::new().unwrap();
        write_scored(tmp.path(), "a.png", 0.7);
        write_scored(tmp.path(), "b.png", 0.3);
        let backend = backend();
        let root = path_string(tmp.path());
        let (high, low) = tokio::join!(
            backend.find_aesthetic_images(root.clone(), 0.5),
            backend.find_aesthetic_images(root, 0.0),
        );
        assert_eq!(high.unwrap().len(), 1);
        assert_eq!(low.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn scan_reports_counts() {
        let tmp = TempDir::new().unwrap();
        write_scored(tmp.path(), "a.png", 0.7);
        fs::write(tmp.path().join("bad.png"), "nope").unwrap();
        let summary = backend().scan(path_string(tmp.path()), 0.5).await.unwrap();
        assert_eq!(summary.matches.len(), 1);
        assert_eq!(summary.candidates, 2);
        assert_eq!(summary.skipped, 1);
    }
}

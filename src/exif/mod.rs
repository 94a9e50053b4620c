//! EXIF metadata decoding in pure Rust, with no external metadata crates.
//!
//! | Stage | Module |
//! |---|---|
//! | Endian-aware reads | [`reader`] |
//! | Container sniffing (JPEG, TIFF, PNG, WebP, HEIF/AVIF, BMP) | [`container`] |
//! | IFD tree walk | [`ifd`] |
//! | Tag names | [`tags`] |
//! | Display values | [`format`] |
//!
//! [`read_exif_file`] chains them into an ordered [`ExifField`] list.
//!
//! ## Failure policy
//!
//! Only path-level problems and unrecognised containers are errors. A
//! recognised image with no EXIF block, a broken TIFF header, truncated
//! directories and cyclic IFD chains all degrade to a shorter (possibly
//! empty) field list.

pub mod container;
pub mod format;
pub mod ifd;
pub mod reader;
pub mod tags;

use crate::types::ExifField;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use container::{ContainerKind, Located, TiffBlock};
pub use ifd::{Decoded, IfdKind, RawField, Value};
pub use reader::{ByteOrder, ByteReader};

#[derive(Error, Debug)]
pub enum ExifError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Truncated data: {needed} bytes at offset {offset} exceed buffer of {len} bytes")]
    TruncatedData {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("Malformed directory at offset {offset}: {reason}")]
    MalformedDirectory { offset: usize, reason: &'static str },
}

/// Decode EXIF fields from an in-memory image file.
pub fn read_exif_bytes(data: &[u8]) -> Result<Vec<ExifField>, ExifError> {
    let located = match container::locate(data) {
        Ok(located) => located,
        Err(ExifError::UnsupportedFormat) => return Err(ExifError::UnsupportedFormat),
        Err(issue) => {
            tracing::debug!(%issue, "container structure broken before EXIF block");
            return Ok(Vec::new());
        }
    };

    let Some(block) = located.block else {
        tracing::debug!(container = located.kind.name(), "no EXIF block");
        return Ok(Vec::new());
    };

    let decoded = match ifd::decode(block.slice(data)) {
        Ok(decoded) => decoded,
        Err(issue) => {
            tracing::debug!(container = located.kind.name(), %issue, "unusable TIFF header");
            return Ok(Vec::new());
        }
    };

    Ok(decoded
        .fields
        .iter()
        .map(|field| {
            let (tag, value) = format::resolve(field.ifd, field.tag, &field.value);
            ExifField {
                tag,
                ifd: field.ifd.label().to_string(),
                value,
            }
        })
        .collect())
}

/// Read a file and decode its EXIF fields.
pub fn read_exif_file(path: &Path) -> Result<Vec<ExifField>, ExifError> {
    if path.as_os_str().is_empty() || !path.is_file() {
        return Err(ExifError::InvalidPath(path.to_path_buf()));
    }
    let data = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExifError::PermissionDenied(path.to_path_buf()),
        std::io::ErrorKind::NotFound => ExifError::InvalidPath(path.to_path_buf()),
        _ => ExifError::Io(e),
    })?;
    read_exif_bytes(&data)
}

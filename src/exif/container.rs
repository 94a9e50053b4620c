//! Container sniffing: identify the outer file format from its signature and
//! locate the embedded TIFF structure that carries EXIF.
//!
//! | Container | Signature | EXIF location |
//! |---|---|---|
//! | JPEG | `FF D8 FF` | `APP1` segment starting with `Exif\0\0` |
//! | TIFF | `II*\0` / `MM\0*` | the whole file |
//! | PNG | `\x89PNG\r\n\x1a\n` | `eXIf` chunk |
//! | WebP | `RIFF....WEBP` | `EXIF` chunk (optionally `Exif\0\0`-prefixed) |
//! | HEIF / AVIF | `....ftyp` + brand | `Exif` item via `meta` → `iinf` + `iloc` |
//! | BMP | `BM` + known DIB header size | none |
//!
//! Every container kind resolves to the same [`TiffBlock`] result so a
//! single IFD decoder serves all of them.

use super::ExifError;
use super::reader::{ByteOrder, ByteReader};
use std::ops::Range;

/// Outer image container recognised by signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Jpeg,
    Tiff,
    Png,
    WebP,
    Heif,
    Avif,
    Bmp,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Tiff => "TIFF",
            Self::Png => "PNG",
            Self::WebP => "WebP",
            Self::Heif => "HEIF",
            Self::Avif => "AVIF",
            Self::Bmp => "BMP",
        }
    }
}

/// Byte range of an embedded TIFF structure within the file.
///
/// `range.start` is the TIFF base: every offset inside the structure is
/// relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffBlock {
    pub range: Range<usize>,
}

impl TiffBlock {
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.range.clone()]
    }
}

/// Result of locating metadata in a recognised container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub kind: ContainerKind,
    /// `None` means the container is valid but carries no EXIF block.
    pub block: Option<TiffBlock>,
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];
const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];

/// BITMAPCOREHEADER through BITMAPV5HEADER.
const BMP_DIB_HEADER_SIZES: &[u32] = &[12, 40, 52, 56, 64, 108, 124];

/// Identify the container from its leading bytes.
pub fn sniff(data: &[u8]) -> Result<ContainerKind, ExifError> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(ContainerKind::Jpeg);
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Ok(ContainerKind::Tiff);
    }
    if data.starts_with(PNG_SIGNATURE) {
        return Ok(ContainerKind::Png);
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Ok(ContainerKind::WebP);
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        if let Some(kind) = sniff_ftyp(data) {
            return Ok(kind);
        }
    }
    if data.len() >= 18 && data.starts_with(b"BM") {
        let dib = u32::from_le_bytes([data[14], data[15], data[16], data[17]]);
        if BMP_DIB_HEADER_SIZES.contains(&dib) {
            return Ok(ContainerKind::Bmp);
        }
    }
    Err(ExifError::UnsupportedFormat)
}

/// Classify an ISO-BMFF file by the brands in its `ftyp` box.
///
/// AVIF files usually also list `mif1`, so AVIF brands win over HEIF ones.
fn sniff_ftyp(data: &[u8]) -> Option<ContainerKind> {
    let size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let end = size.clamp(12, data.len());
    let major = &data[8..12];
    // Compatible brands start after major brand + minor version.
    let compatible = data.get(16..end).unwrap_or(&[]);
    let brands: Vec<&[u8]> = std::iter::once(major)
        .chain(compatible.chunks_exact(4))
        .collect();

    if brands.iter().any(|b| AVIF_BRANDS.iter().any(|a| &a[..] == *b)) {
        Some(ContainerKind::Avif)
    } else if brands.iter().any(|b| HEIF_BRANDS.iter().any(|h| &h[..] == *b)) {
        Some(ContainerKind::Heif)
    } else {
        None
    }
}

/// Sniff the container and find its embedded TIFF block, if any.
///
/// `Err(UnsupportedFormat)` means the bytes are not a recognised image.
/// `Err(TruncatedData | MalformedDirectory)` means the container structure
/// broke before an EXIF block was found.
pub fn locate(data: &[u8]) -> Result<Located, ExifError> {
    let kind = sniff(data)?;
    let block = match kind {
        ContainerKind::Jpeg => locate_in_jpeg(data)?,
        ContainerKind::Tiff => Some(TiffBlock {
            range: 0..data.len(),
        }),
        ContainerKind::Png => locate_in_png(data)?,
        ContainerKind::WebP => locate_in_webp(data)?,
        ContainerKind::Heif | ContainerKind::Avif => locate_in_isobmff(data)?,
        ContainerKind::Bmp => None,
    };
    Ok(Located { kind, block })
}

// ---------------------------------------------------------------------------
// JPEG: APP1 "Exif\0\0"
// ---------------------------------------------------------------------------

fn locate_in_jpeg(data: &[u8]) -> Result<Option<TiffBlock>, ExifError> {
    let mut r = ByteReader::new(data, ByteOrder::Big);
    r.seek(2)?;

    loop {
        if r.read_u8()? != 0xFF {
            return Err(ExifError::MalformedDirectory {
                offset: r.position() - 1,
                reason: "expected JPEG marker",
            });
        }
        let mut marker = r.read_u8()?;
        // Fill bytes
        while marker == 0xFF {
            marker = r.read_u8()?;
        }

        match marker {
            // Standalone markers without a length field
            0x01 | 0xD0..=0xD7 => continue,
            // Start of scan / end of image: metadata segments are over
            0xDA | 0xD9 => return Ok(None),
            _ => {}
        }

        let len = r.read_u16()? as usize;
        if len < 2 {
            return Err(ExifError::MalformedDirectory {
                offset: r.position() - 2,
                reason: "JPEG segment length below 2",
            });
        }
        let start = r.position();
        let payload = r.read_bytes(len - 2)?;

        if marker == 0xE1 && payload.starts_with(EXIF_PREFIX) {
            return Ok(Some(TiffBlock {
                range: start + EXIF_PREFIX.len()..start + payload.len(),
            }));
        }
    }
}

// ---------------------------------------------------------------------------
// PNG: eXIf chunk
// ---------------------------------------------------------------------------

fn locate_in_png(data: &[u8]) -> Result<Option<TiffBlock>, ExifError> {
    let mut r = ByteReader::new(data, ByteOrder::Big);
    r.seek(PNG_SIGNATURE.len())?;

    while r.remaining() > 0 {
        let len = r.read_u32()? as usize;
        let chunk_type = r.read_bytes(4)?;
        let start = r.position();
        r.skip(len)?;
        // CRC
        r.skip(4)?;

        match chunk_type {
            b"eXIf" => {
                return Ok(Some(TiffBlock {
                    range: start..start + len,
                }));
            }
            b"IEND" => break,
            _ => {}
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// WebP: RIFF EXIF chunk
// ---------------------------------------------------------------------------

fn locate_in_webp(data: &[u8]) -> Result<Option<TiffBlock>, ExifError> {
    let mut r = ByteReader::new(data, ByteOrder::Little);
    r.seek(4)?;
    let riff_end = (r.read_u32()? as usize).saturating_add(8).min(data.len());
    r.seek(12)?;

    while r.position() + 8 <= riff_end {
        let fourcc = r.read_bytes(4)?;
        let len = r.read_u32()? as usize;
        let start = r.position();
        let payload = r.read_bytes(len)?;
        // Chunks are padded to an even length
        if len % 2 == 1 && r.remaining() > 0 {
            r.skip(1)?;
        }

        if fourcc == b"EXIF" {
            let skip = if payload.starts_with(EXIF_PREFIX) {
                EXIF_PREFIX.len()
            } else {
                0
            };
            return Ok(Some(TiffBlock {
                range: start + skip..start + len,
            }));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// HEIF / AVIF: ISO-BMFF "Exif" item
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct BoxHeader {
    kind: [u8; 4],
    /// Offset of the first payload byte.
    body: usize,
    /// Offset one past the last payload byte.
    end: usize,
}

/// Read the box header at the reader's position, bounded by `limit`.
fn read_box(r: &mut ByteReader<'_>, limit: usize) -> Result<BoxHeader, ExifError> {
    let start = r.position();
    let size = r.read_u32()? as u64;
    let mut kind = [0u8; 4];
    kind.copy_from_slice(r.read_bytes(4)?);
    let size = match size {
        0 => (limit - start) as u64,
        1 => r.read_u64()?,
        n => n,
    };
    let body = r.position();
    let end = start
        .checked_add(usize::try_from(size).unwrap_or(usize::MAX))
        .filter(|&end| end >= body && end <= limit)
        .ok_or(ExifError::MalformedDirectory {
            offset: start,
            reason: "box size out of bounds",
        })?;
    Ok(BoxHeader { kind, body, end })
}

/// Find the first child box of the given type within `range`.
fn find_box(
    r: &mut ByteReader<'_>,
    range: Range<usize>,
    kind: &[u8; 4],
) -> Result<Option<BoxHeader>, ExifError> {
    r.seek(range.start)?;
    while r.position() + 8 <= range.end {
        let header = read_box(r, range.end)?;
        if &header.kind == kind {
            return Ok(Some(header));
        }
        r.seek(header.end)?;
    }
    Ok(None)
}

fn locate_in_isobmff(data: &[u8]) -> Result<Option<TiffBlock>, ExifError> {
    let mut r = ByteReader::new(data, ByteOrder::Big);
    let Some(meta) = find_box(&mut r, 0..data.len(), b"meta")? else {
        return Ok(None);
    };
    // meta is a full box: version + flags precede its children
    let children = meta.body + 4..meta.end;

    let Some(iinf) = find_box(&mut r, children.clone(), b"iinf")? else {
        return Ok(None);
    };
    let Some(item_id) = find_exif_item_id(&mut r, &iinf)? else {
        return Ok(None);
    };
    let Some(iloc) = find_box(&mut r, children, b"iloc")? else {
        return Ok(None);
    };
    let Some(extent) = find_item_extent(&mut r, &iloc, item_id)? else {
        return Ok(None);
    };

    // Exif item payload: u32 offset to the TIFF header, then the header.
    let mut item = ByteReader::new(r.slice_at(extent.start, extent.len())?, ByteOrder::Big);
    let header_offset = item.read_u32()? as usize;
    let tiff_start = extent
        .start
        .checked_add(4)
        .and_then(|s| s.checked_add(header_offset))
        .filter(|&s| s <= extent.end)
        .ok_or(ExifError::MalformedDirectory {
            offset: extent.start,
            reason: "Exif item header offset out of bounds",
        })?;
    Ok(Some(TiffBlock {
        range: tiff_start..extent.end,
    }))
}

fn find_exif_item_id(r: &mut ByteReader<'_>, iinf: &BoxHeader) -> Result<Option<u32>, ExifError> {
    r.seek(iinf.body)?;
    let version = r.read_u8()?;
    r.skip(3)?;
    let entry_count = if version == 0 {
        u32::from(r.read_u16()?)
    } else {
        r.read_u32()?
    };

    let mut pos = r.position();
    for _ in 0..entry_count {
        if pos + 8 > iinf.end {
            break;
        }
        r.seek(pos)?;
        let infe = read_box(r, iinf.end)?;
        pos = infe.end;
        if &infe.kind != b"infe" {
            continue;
        }
        let infe_version = r.read_u8()?;
        r.skip(3)?;
        // Versions 0 and 1 carry no item type
        if infe_version < 2 {
            continue;
        }
        let item_id = if infe_version == 2 {
            u32::from(r.read_u16()?)
        } else {
            r.read_u32()?
        };
        // item_protection_index
        r.skip(2)?;
        if r.read_bytes(4)? == b"Exif" {
            return Ok(Some(item_id));
        }
    }
    Ok(None)
}

/// Resolve the file byte range of an item's first extent.
///
/// Only file-offset construction (method 0) is supported; items stored in
/// `idat` or referencing other items resolve to `None`.
fn find_item_extent(
    r: &mut ByteReader<'_>,
    iloc: &BoxHeader,
    item_id: u32,
) -> Result<Option<Range<usize>>, ExifError> {
    r.seek(iloc.body)?;
    let version = r.read_u8()?;
    r.skip(3)?;
    let sizes = r.read_u8()?;
    let (offset_size, length_size) = (sizes >> 4, sizes & 0x0F);
    let sizes = r.read_u8()?;
    let base_offset_size = sizes >> 4;
    let index_size = if version == 1 || version == 2 {
        sizes & 0x0F
    } else {
        0
    };
    let item_count = if version < 2 {
        u32::from(r.read_u16()?)
    } else {
        r.read_u32()?
    };

    for _ in 0..item_count {
        let id = if version < 2 {
            u32::from(r.read_u16()?)
        } else {
            r.read_u32()?
        };
        let construction_method = if version == 1 || version == 2 {
            r.read_u16()? & 0x0F
        } else {
            0
        };
        // data_reference_index
        r.skip(2)?;
        let base_offset = r.read_uint(base_offset_size)?;
        let extent_count = r.read_u16()?;

        let mut first = None;
        for _ in 0..extent_count {
            r.read_uint(index_size)?;
            let offset = r.read_uint(offset_size)?;
            let length = r.read_uint(length_size)?;
            first.get_or_insert((offset, length));
        }

        if id != item_id {
            continue;
        }
        if construction_method != 0 {
            return Ok(None);
        }
        let Some((offset, length)) = first else {
            return Ok(None);
        };
        let start = base_offset.checked_add(offset);
        let end = start.and_then(|s| s.checked_add(length));
        return match (start, end) {
            (Some(start), Some(end)) if end <= r.len() as u64 => {
                Ok(Some(start as usize..end as usize))
            }
            _ => Err(ExifError::MalformedDirectory {
                offset: iloc.body,
                reason: "Exif item extent out of bounds",
            }),
        };
    }
    Ok(None)
}

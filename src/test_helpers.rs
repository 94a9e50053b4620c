//! Shared test utilities for the exif-scout test suite.
//!
//! Provides a [`TiffBuilder`] that lays out TIFF structures byte by byte,
//! wrappers that embed a TIFF block in each supported container, and a
//! deterministic [`FakeScorer`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut b = TiffBuilder::new(ByteOrder::Little);
//! let ifd0 = b.add_ifd();
//! let exif = b.add_ifd();
//! b.entry(ifd0, Entry::ascii(0x010F, "Canon"));
//! b.entry(ifd0, Entry::pointer(0x8769, exif));
//! b.entry(exif, Entry::rationals(0x829A, &[(1, 125)]));
//! let jpeg = jpeg_with_exif(&b.build());
//! ```

use crate::exif::ByteOrder;
use crate::scoring::{AestheticScorer, ScoreError};
use std::path::Path;

// =========================================================================
// TIFF builder
// =========================================================================

#[derive(Debug, Clone)]
enum Payload {
    /// Already-ordered bytes (ASCII, BYTE, UNDEFINED).
    Bytes(Vec<u8>),
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    Rationals(Vec<(u32, u32)>),
    SRationals(Vec<(i32, i32)>),
    /// LONG offset of another directory, resolved at build time.
    Ifd(usize),
    /// Same, stored as a SHORT.
    ShortIfd(usize),
    /// Value field written verbatim, regardless of count.
    Raw(u32),
}

/// One directory entry to be written by [`TiffBuilder`].
#[derive(Debug, Clone)]
pub struct Entry {
    tag: u16,
    type_id: u16,
    count: u32,
    payload: Payload,
}

impl Entry {
    /// ASCII with a trailing NUL.
    pub fn ascii(tag: u16, text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        Self::raw_payload(tag, 2, bytes.len() as u32, bytes)
    }

    pub fn undefined(tag: u16, bytes: &[u8]) -> Self {
        Self::raw_payload(tag, 7, bytes.len() as u32, bytes.to_vec())
    }

    pub fn shorts(tag: u16, values: &[u16]) -> Self {
        Self {
            tag,
            type_id: 3,
            count: values.len() as u32,
            payload: Payload::Shorts(values.to_vec()),
        }
    }

    pub fn longs(tag: u16, values: &[u32]) -> Self {
        Self {
            tag,
            type_id: 4,
            count: values.len() as u32,
            payload: Payload::Longs(values.to_vec()),
        }
    }

    pub fn rationals(tag: u16, values: &[(u32, u32)]) -> Self {
        Self {
            tag,
            type_id: 5,
            count: values.len() as u32,
            payload: Payload::Rationals(values.to_vec()),
        }
    }

    pub fn srationals(tag: u16, values: &[(i32, i32)]) -> Self {
        Self {
            tag,
            type_id: 10,
            count: values.len() as u32,
            payload: Payload::SRationals(values.to_vec()),
        }
    }

    /// Pointer tag whose LONG value is the offset of directory `ifd`.
    pub fn pointer(tag: u16, ifd: usize) -> Self {
        Self {
            tag,
            type_id: 4,
            count: 1,
            payload: Payload::Ifd(ifd),
        }
    }

    /// Pointer tag stored with `type_id`: 3 (SHORT) writes a 16-bit offset,
    /// anything else a 32-bit one.
    pub fn typed_pointer(tag: u16, type_id: u16, ifd: usize) -> Self {
        Self {
            tag,
            type_id,
            count: 1,
            payload: if type_id == 3 {
                Payload::ShortIfd(ifd)
            } else {
                Payload::Ifd(ifd)
            },
        }
    }

    /// Arbitrary type and count with payload bytes already encoded in the
    /// builder's byte order.
    pub fn raw_payload(tag: u16, type_id: u16, count: u32, bytes: Vec<u8>) -> Self {
        Self {
            tag,
            type_id,
            count,
            payload: Payload::Bytes(bytes),
        }
    }

    /// Hostile entry: claims `count` values of `type_id` at `value_or_offset`.
    pub fn raw(tag: u16, type_id: u16, count: u32, value_or_offset: u32) -> Self {
        Self {
            tag,
            type_id,
            count,
            payload: Payload::Raw(value_or_offset),
        }
    }

    fn encode(&self, order: ByteOrder, offsets: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        match &self.payload {
            Payload::Bytes(b) => out.extend_from_slice(b),
            Payload::Shorts(v) => v.iter().for_each(|&x| put_u16(&mut out, order, x)),
            Payload::Longs(v) => v.iter().for_each(|&x| put_u32(&mut out, order, x)),
            Payload::Rationals(v) => v.iter().for_each(|&(n, d)| {
                put_u32(&mut out, order, n);
                put_u32(&mut out, order, d);
            }),
            Payload::SRationals(v) => v.iter().for_each(|&(n, d)| {
                put_u32(&mut out, order, n as u32);
                put_u32(&mut out, order, d as u32);
            }),
            Payload::Ifd(i) => put_u32(&mut out, order, offsets[*i]),
            Payload::ShortIfd(i) => put_u16(&mut out, order, offsets[*i] as u16),
            Payload::Raw(v) => put_u32(&mut out, order, *v),
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
enum Next {
    None,
    Ifd(usize),
}

#[derive(Debug, Default)]
struct IfdSpec {
    entries: Vec<Entry>,
    next: Option<Next>,
}

/// Builds TIFF bytes: an 8-byte header, then each directory in creation
/// order, each followed by its out-of-line values. Directory 0 is IFD0.
pub struct TiffBuilder {
    order: ByteOrder,
    ifds: Vec<IfdSpec>,
}

impl TiffBuilder {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            ifds: Vec::new(),
        }
    }

    pub fn add_ifd(&mut self) -> usize {
        self.ifds.push(IfdSpec::default());
        self.ifds.len() - 1
    }

    pub fn entry(&mut self, ifd: usize, entry: Entry) {
        self.ifds[ifd].entries.push(entry);
    }

    /// Set the next-IFD link of `from`.
    pub fn link(&mut self, from: usize, to: usize) {
        self.ifds[from].next = Some(Next::Ifd(to));
    }

    pub fn build(&self) -> Vec<u8> {
        let order = self.order;
        let placeholder = vec![0u32; self.ifds.len()];

        // Pass 1: directory offsets
        let mut offsets = Vec::with_capacity(self.ifds.len());
        let mut pos = 8usize;
        for ifd in &self.ifds {
            offsets.push(pos as u32);
            pos += 2 + 12 * ifd.entries.len() + 4;
            for entry in &ifd.entries {
                let len = entry.encode(order, &placeholder).len();
                if len > 4 && !matches!(entry.payload, Payload::Raw(_)) {
                    pos += len + len % 2;
                }
            }
        }

        // Pass 2: bytes
        let mut out = Vec::with_capacity(pos);
        match order {
            ByteOrder::Little => out.extend_from_slice(b"II"),
            ByteOrder::Big => out.extend_from_slice(b"MM"),
        }
        put_u16(&mut out, order, 42);
        put_u32(&mut out, order, offsets.first().copied().unwrap_or(0));

        for ifd in &self.ifds {
            let table_end = out.len() + 2 + 12 * ifd.entries.len() + 4;
            let mut data_area = Vec::new();

            put_u16(&mut out, order, ifd.entries.len() as u16);
            for entry in &ifd.entries {
                put_u16(&mut out, order, entry.tag);
                put_u16(&mut out, order, entry.type_id);
                put_u32(&mut out, order, entry.count);
                let bytes = entry.encode(order, &offsets);
                if matches!(entry.payload, Payload::Raw(_)) || bytes.len() <= 4 {
                    let mut field = [0u8; 4];
                    field[..bytes.len()].copy_from_slice(&bytes);
                    out.extend_from_slice(&field);
                } else {
                    put_u32(&mut out, order, (table_end + data_area.len()) as u32);
                    data_area.extend_from_slice(&bytes);
                    if bytes.len() % 2 == 1 {
                        data_area.push(0);
                    }
                }
            }
            let next = match ifd.next.unwrap_or(Next::None) {
                Next::None => 0,
                Next::Ifd(i) => offsets[i],
            };
            put_u32(&mut out, order, next);
            out.extend_from_slice(&data_area);
        }
        out
    }
}

fn put_u16(out: &mut Vec<u8>, order: ByteOrder, v: u16) {
    match order {
        ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
    }
}

fn put_u32(out: &mut Vec<u8>, order: ByteOrder, v: u32) {
    match order {
        ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
    }
}

// =========================================================================
// Container wrappers
// =========================================================================

fn jpeg_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
}

fn jpeg(app1: Option<&[u8]>) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    jpeg_segment(&mut out, 0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
    if let Some(tiff) = app1 {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(tiff);
        jpeg_segment(&mut out, 0xE1, &payload);
    }
    jpeg_segment(&mut out, 0xDB, &[0; 65]);
    jpeg_segment(&mut out, 0xDA, &[1, 1, 0, 0, 0x3F, 0]);
    out.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// JPEG with an APP0 segment followed by an `APP1` EXIF segment.
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    jpeg(Some(tiff))
}

pub fn jpeg_without_exif() -> Vec<u8> {
    jpeg(None)
}

/// PNG with an `IHDR`, the given chunks, and `IEND`. CRCs are zeroed.
pub fn png_with_chunks(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0; 4]);
    }
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    chunk(&mut out, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]);
    for (kind, data) in chunks {
        chunk(&mut out, kind, data);
    }
    chunk(&mut out, b"IEND", &[]);
    out
}

/// WebP with a `VP8X` chunk and an `EXIF` chunk.
pub fn webp_with_exif(tiff: &[u8], exif_prefix: bool) -> Vec<u8> {
    fn chunk(body: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        body.extend_from_slice(kind);
        body.extend_from_slice(&(data.len() as u32).to_le_bytes());
        body.extend_from_slice(data);
        if data.len() % 2 == 1 {
            body.push(0);
        }
    }
    let mut body = b"WEBP".to_vec();
    chunk(&mut body, b"VP8X", &[0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    let mut exif = if exif_prefix { b"Exif\0\0".to_vec() } else { Vec::new() };
    exif.extend_from_slice(tiff);
    chunk(&mut body, b"EXIF", &exif);

    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

/// ISO-BMFF file (`ftyp` + `meta` + `mdat`) with an `Exif` item.
pub fn heif_with_exif(major_brand: &[u8; 4], tiff: &[u8]) -> Vec<u8> {
    fn bmff_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        out
    }

    let mut ftyp = major_brand.to_vec();
    ftyp.extend_from_slice(&[0, 0, 0, 0]);
    ftyp.extend_from_slice(b"mif1");
    ftyp.extend_from_slice(major_brand);
    let ftyp = bmff_box(b"ftyp", &ftyp);

    // infe v2: item 1 of type "Exif"
    let mut infe = vec![2, 0, 0, 0];
    infe.extend_from_slice(&1u16.to_be_bytes());
    infe.extend_from_slice(&0u16.to_be_bytes());
    infe.extend_from_slice(b"Exif");
    infe.push(0);
    let infe = bmff_box(b"infe", &infe);
    let mut iinf = vec![0, 0, 0, 0];
    iinf.extend_from_slice(&1u16.to_be_bytes());
    iinf.extend_from_slice(&infe);
    let iinf = bmff_box(b"iinf", &iinf);

    let mut item = 6u32.to_be_bytes().to_vec();
    item.extend_from_slice(b"Exif\0\0");
    item.extend_from_slice(tiff);

    // iloc v0, offset_size 4, length_size 4, base_offset_size 0
    let iloc_len = 8 + 4 + 2 + 2 + 2 + 2 + 2 + 4 + 4;
    let meta_len = 8 + 4 + iinf.len() + iloc_len;
    let item_offset = ftyp.len() + meta_len + 8;

    let mut iloc = vec![0, 0, 0, 0, 0x44, 0x00];
    iloc.extend_from_slice(&1u16.to_be_bytes());
    iloc.extend_from_slice(&1u16.to_be_bytes());
    iloc.extend_from_slice(&0u16.to_be_bytes());
    iloc.extend_from_slice(&1u16.to_be_bytes());
    iloc.extend_from_slice(&(item_offset as u32).to_be_bytes());
    iloc.extend_from_slice(&(item.len() as u32).to_be_bytes());
    let iloc = bmff_box(b"iloc", &iloc);

    let mut meta = vec![0, 0, 0, 0];
    meta.extend_from_slice(&iinf);
    meta.extend_from_slice(&iloc);
    let meta = bmff_box(b"meta", &meta);
    assert_eq!(meta.len(), meta_len);

    let mut out = ftyp;
    out.extend_from_slice(&meta);
    out.extend_from_slice(&bmff_box(b"mdat", &item));
    out
}

/// A 1x1 24-bit BMP.
pub fn bmp_bytes() -> Vec<u8> {
    let mut out = b"BM".to_vec();
    out.extend_from_slice(&58u32.to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&1i32.to_le_bytes());
    out.extend_from_slice(&1i32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&[0; 24]);
    out.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0]);
    out
}

// =========================================================================
// Scoring
// =========================================================================

const SCORE_MARKER: &[u8] = b"score=";

/// Scores an image by reading a `score=<float>` marker embedded in its
/// bytes. Images without a marker fail to score.
pub struct FakeScorer;

impl AestheticScorer for FakeScorer {
    fn score(&self, image: &[u8]) -> Result<f64, ScoreError> {
        let start = image
            .windows(SCORE_MARKER.len())
            .position(|w| w == SCORE_MARKER)
            .map(|p| p + SCORE_MARKER.len())
            .ok_or_else(|| ScoreError::Decode("no score marker".into()))?;
        let digits: String = image[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit() || **b == b'.' || **b == b'-')
            .map(|&b| b as char)
            .collect();
        digits
            .parse()
            .map_err(|_| ScoreError::Decode(format!("bad score marker {digits:?}")))
    }
}

/// A PNG the [`FakeScorer`] rates at `score`.
pub fn scored_png(score: f64) -> Vec<u8> {
    png_with_chunks(&[(b"tEXt", format!("score={score}").as_bytes())])
}

/// Write a [`scored_png`] to `dir/name`, creating parent directories.
pub fn write_scored(dir: &Path, name: &str, score: f64) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, scored_png(score)).unwrap();
}

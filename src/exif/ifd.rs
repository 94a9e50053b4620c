//! Image File Directory decoding.
//!
//! Walks the IFD tree of a TIFF structure in a fixed order:
//!
//! ```text
//! IFD0 ──ExifIFDPointer──────────▶ Exif ──InteroperabilityIFDPointer──▶ Interop
//!  │ └──GPSInfoIFDPointer────────▶ GPS
//!  └──next IFD──▶ IFD1 (thumbnail)
//! ```
//!
//! Each directory is a 2-byte entry count, that many 12-byte entries and a
//! 4-byte offset to the next directory. Values larger than four bytes live
//! out of line at a TIFF-base-relative offset.
//!
//! ## Hostile input
//!
//! Nothing here trusts the file. A visited-offset set stops cycles, a cap on
//! the number of directories bounds long chains, and every read goes through
//! [`ByteReader`], so a bad offset becomes a [`ExifError::TruncatedData`]
//! instead of a panic. Anomalies stop the affected directory or chain, are
//! recorded in [`Decoded::issues`], and never discard fields already decoded.

use super::ExifError;
use super::reader::{ByteOrder, ByteReader};
use std::collections::HashSet;
use std::fmt;

pub const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
pub const TAG_GPS_IFD_POINTER: u16 = 0x8825;
pub const TAG_INTEROP_IFD_POINTER: u16 = 0xA005;

/// Upper bound on directories decoded from one TIFF structure.
pub const MAX_DIRECTORIES: usize = 8;

const ENTRY_SIZE: usize = 12;

/// Directory segment a field was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IfdKind {
    /// IFD0, the primary image.
    Primary,
    Exif,
    Gps,
    Interop,
    /// IFD1, the thumbnail.
    Thumbnail,
}

impl IfdKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "IFD0",
            Self::Exif => "Exif",
            Self::Gps => "GPS",
            Self::Interop => "Interop",
            Self::Thumbnail => "IFD1",
        }
    }
}

impl fmt::Display for IfdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// TIFF field types. Unknown type ids are kept so they can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
    /// TIFF-EP `IFD` (13): a LONG that holds a sub-directory offset.
    Ifd,
    Unknown(u16),
}

impl FieldType {
    pub fn from_u16(id: u16) -> Self {
        match id {
            1 => Self::Byte,
            2 => Self::Ascii,
            3 => Self::Short,
            4 => Self::Long,
            5 => Self::Rational,
            6 => Self::SByte,
            7 => Self::Undefined,
            8 => Self::SShort,
            9 => Self::SLong,
            10 => Self::SRational,
            11 => Self::Float,
            12 => Self::Double,
            13 => Self::Ifd,
            other => Self::Unknown(other),
        }
    }

    /// Size in bytes of a single value, `None` for unknown types.
    pub fn size(self) -> Option<usize> {
        match self {
            Self::Byte | Self::Ascii | Self::SByte | Self::Undefined => Some(1),
            Self::Short | Self::SShort => Some(2),
            Self::Long | Self::SLong | Self::Float | Self::Ifd => Some(4),
            Self::Rational | Self::SRational | Self::Double => Some(8),
            Self::Unknown(_) => None,
        }
    }
}

/// Parsed TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub order: ByteOrder,
    /// Offset of IFD0, relative to the TIFF base.
    pub ifd0_offset: u32,
}

impl TiffHeader {
    pub fn parse(tiff: &[u8]) -> Result<Self, ExifError> {
        let order = ByteOrder::from_marker(tiff).ok_or(ExifError::MalformedDirectory {
            offset: 0,
            reason: "invalid TIFF byte order marker",
        })?;
        let mut r = ByteReader::new(tiff, order);
        r.seek(2)?;
        if r.read_u16()? != 42 {
            return Err(ExifError::MalformedDirectory {
                offset: 2,
                reason: "invalid TIFF magic number",
            });
        }
        Ok(Self {
            order,
            ifd0_offset: r.read_u32()?,
        })
    }
}

/// One 12-byte directory entry as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: FieldType,
    pub count: u32,
    pub value_or_offset: u32,
    /// The raw 4-byte value field, holding inline values.
    pub inline: [u8; 4],
}

impl IfdEntry {
    /// Total value size in bytes, `None` for unknown types or overflow.
    pub fn byte_len(&self) -> Option<usize> {
        self.field_type
            .size()
            .and_then(|s| s.checked_mul(self.count as usize))
    }

    pub fn is_inline(&self) -> bool {
        self.byte_len().is_some_and(|n| n <= 4)
    }
}

/// A decoded, not yet formatted, field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(Vec<u8>),
    /// Raw ASCII bytes including any NUL terminators.
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Unknown { type_id: u16, count: u32 },
}

impl Value {
    /// First element as an unsigned integer, for pointer and enum tags.
    pub fn first_uint(&self) -> Option<u32> {
        match self {
            Self::Byte(v) => v.first().map(|&x| u32::from(x)),
            Self::Short(v) => v.first().map(|&x| u32::from(x)),
            Self::Long(v) => v.first().copied(),
            _ => None,
        }
    }
}

/// A decoded field tagged with its directory of origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub ifd: IfdKind,
    pub tag: u16,
    pub value: Value,
}

/// Output of [`decode`]: fields in traversal order plus recoverable anomalies.
#[derive(Debug)]
pub struct Decoded {
    pub header: TiffHeader,
    pub fields: Vec<RawField>,
    pub issues: Vec<ExifError>,
}

/// Decode all directories of a TIFF structure.
///
/// Fails only when the header itself is unusable. Everything after the
/// header degrades to partial results with the anomaly recorded in
/// [`Decoded::issues`].
pub fn decode(tiff: &[u8]) -> Result<Decoded, ExifError> {
    let header = TiffHeader::parse(tiff)?;
    let mut walker = Walker {
        reader: ByteReader::new(tiff, header.order),
        visited: HashSet::new(),
        fields: Vec::new(),
        issues: Vec::new(),
    };

    let (ifd0_pointers, next) = walker.directory(IfdKind::Primary, header.ifd0_offset);

    let mut interop = ifd0_pointers.interop;
    if let Some(offset) = ifd0_pointers.exif {
        let (exif_pointers, _) = walker.directory(IfdKind::Exif, offset);
        interop = interop.or(exif_pointers.interop);
    }
    if let Some(offset) = ifd0_pointers.gps {
        walker.directory(IfdKind::Gps, offset);
    }
    if let Some(offset) = interop {
        walker.directory(IfdKind::Interop, offset);
    }
    if next != 0 {
        walker.directory(IfdKind::Thumbnail, next);
    }

    Ok(Decoded {
        header,
        fields: walker.fields,
        issues: walker.issues,
    })
}

/// Sub-directory offsets found while decoding one directory.
#[derive(Debug, Default)]
struct Pointers {
    exif: Option<u32>,
    gps: Option<u32>,
    interop: Option<u32>,
}

struct Walker<'a> {
    reader: ByteReader<'a>,
    visited: HashSet<u32>,
    fields: Vec<RawField>,
    issues: Vec<ExifError>,
}

impl Walker<'_> {
    /// Decode one directory, returning its pointers and next-IFD offset.
    ///
    /// A refused or broken directory yields no pointers and a next offset of
    /// zero, which ends that chain.
    fn directory(&mut self, kind: IfdKind, offset: u32) -> (Pointers, u32) {
        if let Err(issue) = self.admit(offset) {
            tracing::debug!(ifd = %kind, offset, %issue, "skipping directory");
            self.issues.push(issue);
            return (Pointers::default(), 0);
        }

        let mut pointers = Pointers::default();
        let mut seen_tags = HashSet::new();
        match self.entries(kind, offset, &mut pointers, &mut seen_tags) {
            Ok(next) => (pointers, next),
            Err(issue) => {
                tracing::debug!(ifd = %kind, offset, %issue, "directory decoding stopped early");
                self.issues.push(issue);
                (pointers, 0)
            }
        }
    }

    /// Cycle, bound and range checks before entering a directory.
    fn admit(&mut self, offset: u32) -> Result<(), ExifError> {
        let at = offset as usize;
        if self.visited.contains(&offset) {
            return Err(ExifError::MalformedDirectory {
                offset: at,
                reason: "directory offset already visited",
            });
        }
        if self.visited.len() >= MAX_DIRECTORIES {
            return Err(ExifError::MalformedDirectory {
                offset: at,
                reason: "too many directories",
            });
        }
        if at.checked_add(2).is_none_or(|end| end > self.reader.len()) {
            return Err(ExifError::MalformedDirectory {
                offset: at,
                reason: "directory offset outside buffer",
            });
        }
        self.visited.insert(offset);
        Ok(())
    }

    fn entries(
        &mut self,
        kind: IfdKind,
        offset: u32,
        pointers: &mut Pointers,
        seen_tags: &mut HashSet<u16>,
    ) -> Result<u32, ExifError> {
        self.reader.seek(offset as usize)?;
        let count = self.reader.read_u16()? as usize;

        for i in 0..count {
            self.reader.seek(offset as usize + 2 + i * ENTRY_SIZE)?;
            let entry = self.read_entry()?;

            // Hostile files may repeat a tag id; the first occurrence wins.
            if !seen_tags.insert(entry.tag) {
                tracing::trace!(ifd = %kind, tag = entry.tag, "ignoring duplicate tag");
                continue;
            }

            let value = self.resolve_value(&entry)?;
            if kind != IfdKind::Thumbnail {
                record_pointer(kind, entry.tag, &value, pointers);
            }
            self.fields.push(RawField {
                ifd: kind,
                tag: entry.tag,
                value,
            });
        }

        self.reader.seek(offset as usize + 2 + count * ENTRY_SIZE)?;
        self.reader.read_u32()
    }

    fn read_entry(&mut self) -> Result<IfdEntry, ExifError> {
        let tag = self.reader.read_u16()?;
        let field_type = FieldType::from_u16(self.reader.read_u16()?);
        let count = self.reader.read_u32()?;
        let mut inline = [0u8; 4];
        inline.copy_from_slice(self.reader.read_bytes(4)?);
        Ok(IfdEntry {
            tag,
            field_type,
            count,
            value_or_offset: self.reader.order().u32(inline),
            inline,
        })
    }

    fn resolve_value(&self, entry: &IfdEntry) -> Result<Value, ExifError> {
        let Some(len) = entry.byte_len() else {
            return match entry.field_type {
                FieldType::Unknown(type_id) => Ok(Value::Unknown {
                    type_id,
                    count: entry.count,
                }),
                _ => Err(ExifError::MalformedDirectory {
                    offset: self.reader.position(),
                    reason: "value size overflows",
                }),
            };
        };
        let bytes = if entry.is_inline() {
            &entry.inline[..len]
        } else {
            self.reader.slice_at(entry.value_or_offset as usize, len)?
        };
        Ok(parse_value(entry.field_type, bytes, self.reader.order()))
    }
}

/// Offsets may be stored as BYTE, SHORT, LONG or IFD.
fn record_pointer(kind: IfdKind, tag: u16, value: &Value, pointers: &mut Pointers) {
    let Some(offset) = value.first_uint().filter(|&o| o != 0) else {
        return;
    };
    match (kind, tag) {
        (IfdKind::Primary, TAG_EXIF_IFD_POINTER) => pointers.exif = Some(offset),
        (IfdKind::Primary, TAG_GPS_IFD_POINTER) => pointers.gps = Some(offset),
        (IfdKind::Primary | IfdKind::Exif, TAG_INTEROP_IFD_POINTER) => {
            pointers.interop = Some(offset)
        }
        _ => {}
    }
}

/// Decode `bytes` (exactly `count * size` long) as values of `field_type`.
fn parse_value(field_type: FieldType, bytes: &[u8], order: ByteOrder) -> Value {
    let u16s = || {
        bytes
            .chunks_exact(2)
            .map(|c| order.u16([c[0], c[1]]))
            .collect::<Vec<_>>()
    };
    let u32s = || {
        bytes
            .chunks_exact(4)
            .map(|c| order.u32([c[0], c[1], c[2], c[3]]))
            .collect::<Vec<_>>()
    };
    let pairs = || {
        bytes
            .chunks_exact(8)
            .map(|c| {
                (
                    order.u32([c[0], c[1], c[2], c[3]]),
                    order.u32([c[4], c[5], c[6], c[7]]),
                )
            })
            .collect::<Vec<_>>()
    };

    match field_type {
        FieldType::Byte => Value::Byte(bytes.to_vec()),
        FieldType::Ascii => Value::Ascii(bytes.to_vec()),
        FieldType::Undefined => Value::Undefined(bytes.to_vec()),
        FieldType::SByte => Value::SByte(bytes.iter().map(|&b| b as i8).collect()),
        FieldType::Short => Value::Short(u16s()),
        FieldType::SShort => Value::SShort(u16s().into_iter().map(|v| v as i16).collect()),
        FieldType::Long | FieldType::Ifd => Value::Long(u32s()),
        FieldType::SLong => Value::SLong(u32s().into_iter().map(|v| v as i32).collect()),
        FieldType::Float => Value::Float(u32s().into_iter().map(f32::from_bits).collect()),
        FieldType::Rational => Value::Rational(pairs()),
        FieldType::SRational => Value::SRational(
            pairs()
                .into_iter()
                .map(|(n, d)| (n as i32, d as i32))
                .collect(),
        ),
        FieldType::Double => Value::Double(
            bytes
                .chunks_exact(8)
                .map(|c| {
                    let mut b = [0u8; 8];
                    b.copy_from_slice(c);
                    f64::from_bits(order.u64(b))
                })
                .collect(),
        ),
        FieldType::Unknown(type_id) => Value::Unknown {
            type_id,
            count: bytes.len() as u32,
        },
    }
}

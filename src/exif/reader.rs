//! Endian-aware cursor over a byte buffer.
//!
//! Every decoder step reads through a [`ByteReader`]. Reads never panic and
//! never return garbage: any read that would run past the end of the buffer
//! fails with [`ExifError::TruncatedData`], which callers treat as a local,
//! recoverable condition.

use super::ExifError;

/// Byte order of a TIFF structure, fixed once from its first two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `"II"` (Intel)
    Little,
    /// `"MM"` (Motorola)
    Big,
}

impl ByteOrder {
    /// Parse the two-byte TIFF byte-order marker.
    pub fn from_marker(marker: &[u8]) -> Option<Self> {
        match marker {
            [b'I', b'I', ..] => Some(Self::Little),
            [b'M', b'M', ..] => Some(Self::Big),
            _ => None,
        }
    }

    pub fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            Self::Little => u16::from_le_bytes(b),
            Self::Big => u16::from_be_bytes(b),
        }
    }

    pub fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(b),
            Self::Big => u32::from_be_bytes(b),
        }
    }

    pub fn u64(self, b: [u8; 8]) -> u64 {
        match self {
            Self::Little => u64::from_le_bytes(b),
            Self::Big => u64::from_be_bytes(b),
        }
    }
}

/// Cursor with a current position over a borrowed buffer.
///
/// All offsets are relative to the start of the wrapped slice, so wrapping
/// the TIFF block (not the whole file) makes offsets TIFF-base-relative.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move to an absolute offset. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<(), ExifError> {
        if offset > self.data.len() {
            return Err(self.truncated(offset, 0));
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ExifError> {
        self.read_bytes(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ExifError> {
        let bytes = self
            .pos
            .checked_add(n)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or_else(|| self.truncated(self.pos, n))?;
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ExifError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ExifError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ExifError> {
        let b = self.read_array()?;
        Ok(self.order.u16(b))
    }

    pub fn read_u32(&mut self) -> Result<u32, ExifError> {
        let b = self.read_array()?;
        Ok(self.order.u32(b))
    }

    pub fn read_u64(&mut self) -> Result<u64, ExifError> {
        let b = self.read_array()?;
        Ok(self.order.u64(b))
    }

    /// Read an unsigned integer stored in `size` bytes (0, 1, 2, 4 or 8).
    ///
    /// A size of zero reads nothing and yields 0, which is how ISO-BMFF
    /// encodes absent optional fields.
    pub fn read_uint(&mut self, size: u8) -> Result<u64, ExifError> {
        match size {
            0 => Ok(0),
            1 => self.read_u8().map(u64::from),
            2 => self.read_u16().map(u64::from),
            4 => self.read_u32().map(u64::from),
            8 => self.read_u64(),
            _ => Err(ExifError::MalformedDirectory {
                offset: self.pos,
                reason: "unsupported integer width",
            }),
        }
    }

    /// Read a RATIONAL as a `(numerator, denominator)` pair.
    pub fn read_rational(&mut self) -> Result<(u32, u32), ExifError> {
        Ok((self.read_u32()?, self.read_u32()?))
    }

    /// Read an SRATIONAL as a `(numerator, denominator)` pair.
    pub fn read_srational(&mut self) -> Result<(i32, i32), ExifError> {
        Ok((self.read_u32()? as i32, self.read_u32()? as i32))
    }

    /// Borrow `n` bytes at an absolute offset without moving the cursor.
    pub fn slice_at(&self, offset: usize, n: usize) -> Result<&'a [u8], ExifError> {
        offset
            .checked_add(n)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| self.truncated(offset, n))
    }

    fn truncated(&self, offset: usize, needed: usize) -> ExifError {
        ExifError::TruncatedData {
            offset,
            needed,
            len: self.data.len(),
        }
    }
}

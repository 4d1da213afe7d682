use std::ops::Range;

use nom::{bytes::complete::take, combinator::map, sequence::tuple, IResult};

use crate::dbf::field::{self, FieldDescriptor};
use crate::dbf::parse_utils::{t_status, t_u16, t_u32, t_u8, t_update_date};
use crate::error::{DbfError, DbfParseError, Result};
use crate::DeSerialise;

pub const BASE_HEADER_SIZE: usize = 32;
pub const FIELD_TERMINATOR: u8 = 0x0D;
pub const EOF_MARKER: u8 = 0x1A;

/// Table variant/encryption state carried by the first header byte.
///
/// 0x03 is a plain level-3 table and 0x06 a SIX-encrypted one. Every other
/// value is preserved verbatim and never interpreted as "encrypted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Plain,
    SxEncrypted,
    Other(u8),
}

impl TableStatus {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x03 => TableStatus::Plain,
            0x06 => TableStatus::SxEncrypted,
            other => TableStatus::Other(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            TableStatus::Plain => 0x03,
            TableStatus::SxEncrypted => 0x06,
            TableStatus::Other(byte) => byte,
        }
    }
}

/// Last-update stamp at header offsets 1..=3.
///
/// The stored year byte counts from 1900 when it is at least 80 and from
/// 2000 otherwise; encoding reverses the same split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl UpdateDate {
    pub fn from_stored(yy: u8, month: u8, day: u8) -> Self {
        let year = if yy >= 80 {
            1900 + u16::from(yy)
        } else {
            2000 + u16::from(yy)
        };
        UpdateDate { year, month, day }
    }

    pub fn to_stored(self) -> [u8; 3] {
        let yy = if self.year >= 2000 {
            self.year - 2000
        } else {
            self.year - 1900
        };
        [yy as u8, self.month, self.day]
    }
}

/// The 32-byte fixed DBF base header.
///
/// Only the interpreted fields are materialized; reserved bytes stay in the
/// source buffer and are carried through every rewrite untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbfHeader {
    // Offset 0: status/encryption byte.
    pub status: TableStatus,

    // Offsets 1..=3: last update stamp (YY, MM, DD).
    pub last_update: UpdateDate,

    // Offsets 4..=7: number of records, u32 little-endian.
    pub record_count: u32,

    // Offsets 8..=9: total header size in bytes, including the field
    // descriptors and the 0x0D terminator, u16 little-endian.
    pub header_length: u16,

    // Offsets 10..=11: size of one record including the 1-byte deletion
    // marker, u16 little-endian.
    pub record_length: u16,

    // Offset 28: MDX/production index flag, preserved verbatim.
    pub mdx_flag: u8,

    // Offset 29: language driver byte naming the code page of character
    // data.
    pub language_driver: u8,
}

fn parse_base_header(buffer: &[u8]) -> IResult<&[u8], DbfHeader, DbfParseError<&[u8]>> {
    map(
        tuple((
            t_status,
            t_update_date,
            t_u32,
            t_u16,
            t_u16,
            take(16usize),
            t_u8,
            t_u8,
            take(2usize),
        )),
        |(status, last_update, record_count, header_length, record_length, _, mdx_flag, language_driver, _)| {
            DbfHeader {
                status,
                last_update,
                record_count,
                header_length,
                record_length,
                mdx_flag,
                language_driver,
            }
        },
    )(buffer)
}

impl<'a> DeSerialise<'a> for DbfHeader {
    type Item = DbfHeader;

    fn deserialize(buffer: &'a [u8]) -> Result<Self::Item> {
        if buffer.len() < BASE_HEADER_SIZE {
            return Err(DbfError::MalformedHeader(
                "buffer shorter than the 32-byte base header",
            ));
        }
        let (_, header) = parse_base_header(buffer)?;
        Ok(header)
    }
}

impl DbfHeader {
    /// Parse the base header and the field descriptor region.
    ///
    /// Rejects the buffer as [`DbfError::MalformedHeader`] when any of the
    /// structural invariants fail: the declared header length must cover at
    /// least the base header plus terminator, the record length must be
    /// non-zero, the buffer must hold the whole header, the descriptor
    /// region must end in 0x0D, and the field widths plus the deletion
    /// marker must add up to the record length.
    pub fn parse(buffer: &[u8]) -> Result<(DbfHeader, Vec<FieldDescriptor>)> {
        let header = DbfHeader::deserialize(buffer)?;

        let header_length = header.header_length as usize;
        if header_length < BASE_HEADER_SIZE + 1 {
            return Err(DbfError::MalformedHeader("header length below 33 bytes"));
        }
        if header.record_length == 0 {
            return Err(DbfError::MalformedHeader("record length is zero"));
        }
        if buffer.len() < header_length {
            return Err(DbfError::MalformedHeader(
                "buffer shorter than the declared header length",
            ));
        }

        let fields = parse_descriptor_region(&buffer[..header_length])?;

        let widths: usize = fields.iter().map(|f| f.length as usize).sum();
        if widths + 1 != header.record_length as usize {
            return Err(DbfError::MalformedHeader(
                "field widths do not add up to the record length",
            ));
        }

        Ok((header, fields))
    }

    /// Patch the interpreted scalar fields back into `buffer`, leaving all
    /// reserved bytes and the descriptor region untouched.
    pub fn write_into(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < BASE_HEADER_SIZE {
            return Err(DbfError::MalformedHeader(
                "buffer shorter than the 32-byte base header",
            ));
        }
        buffer[0] = self.status.to_byte();
        buffer[1..4].copy_from_slice(&self.last_update.to_stored());
        buffer[4..8].copy_from_slice(&self.record_count.to_le_bytes());
        buffer[8..10].copy_from_slice(&self.header_length.to_le_bytes());
        buffer[10..12].copy_from_slice(&self.record_length.to_le_bytes());
        Ok(())
    }
}

// Walks the 32-byte descriptor slots from offset 32 until the 0x0D
// terminator. `header_region` is exactly `header_length` bytes long, so a
// slot that would run past it means the terminator is missing.
fn parse_descriptor_region(header_region: &[u8]) -> Result<Vec<FieldDescriptor>> {
    let mut fields = Vec::new();
    let mut pos = BASE_HEADER_SIZE;
    // Offset 0 of every record is the deletion marker.
    let mut offset_in_record = 1usize;

    loop {
        match header_region.get(pos) {
            None => {
                return Err(DbfError::MalformedHeader(
                    "descriptor region missing its 0x0D terminator",
                ))
            }
            Some(&FIELD_TERMINATOR) => break,
            Some(_) => {}
        }
        if pos + FieldDescriptor::SIZE > header_region.len() {
            return Err(DbfError::MalformedHeader(
                "descriptor region missing its 0x0D terminator",
            ));
        }

        let slot = &header_region[pos..pos + FieldDescriptor::SIZE];
        let (_, descriptor) = field::parse_descriptor(slot, offset_in_record)?;
        offset_in_record += descriptor.length as usize;
        fields.push(descriptor);
        pos += FieldDescriptor::SIZE;
    }

    Ok(fields)
}

/// The record payload occupies `[header_length, header_length +
/// record_count * record_length)`; everything past it (e.g. a trailing 0x1A
/// EOF marker) belongs to the caller.
pub fn payload_range(header: &DbfHeader) -> Range<usize> {
    let start = header.header_length as usize;
    let len = header.record_count as usize * header.record_length as usize;
    start..start + len
}

pub fn payload_slice<'a>(buffer: &'a [u8], header: &DbfHeader) -> Result<&'a [u8]> {
    let range = payload_range(header);
    if buffer.len() < range.end {
        return Err(DbfError::PayloadOutOfRange {
            declared: range.len(),
            available: buffer.len().saturating_sub(range.start),
        });
    }
    Ok(&buffer[range])
}

/// A copy of `buffer` with the payload region replaced by `new_payload`,
/// which must have exactly the payload's length.
pub fn replace_payload(buffer: &[u8], header: &DbfHeader, new_payload: &[u8]) -> Result<Vec<u8>> {
    let range = payload_range(header);
    if buffer.len() < range.end {
        return Err(DbfError::PayloadOutOfRange {
            declared: range.len(),
            available: buffer.len().saturating_sub(range.start),
        });
    }
    if new_payload.len() != range.len() {
        return Err(DbfError::ReplaceSizeMismatch {
            expected: range.len(),
            got: new_payload.len(),
        });
    }
    let mut out = buffer.to_vec();
    out[range].copy_from_slice(new_payload);
    Ok(out)
}

/// Single-byte patch of the status byte at offset 0.
pub fn set_status(buffer: &mut [u8], status: TableStatus) {
    buffer[0] = status.to_byte();
}

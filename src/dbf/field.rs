use nom::{bytes::complete::take, combinator::map, sequence::tuple, IResult};

use crate::dbf::parse_utils::{t_field_name, t_field_type, t_u8};
use crate::error::DbfParseError;

/// Column type letter from byte 11 of a descriptor. Letters this codec does
/// not recognize are carried as `Character` so their raw content stays
/// reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Logical,
    Date,
    Memo,
}

impl FieldType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'L' => FieldType::Logical,
            b'D' => FieldType::Date,
            b'M' => FieldType::Memo,
            _ => FieldType::Character,
        }
    }
}

/// One 32-byte column descriptor from the header region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    // Name (bytes 0..=10): ASCII, null-terminated or null/space padded.
    pub name: String,
    // Type (byte 11): one ASCII letter.
    pub kind: FieldType,
    // Length (byte 16): field width in bytes inside a record.
    pub length: u8,
    // DecimalPlaces (byte 17): digits after the point for numeric fields.
    pub decimal_places: u8,
    // Byte offset of this field inside a record. The first field sits at 1,
    // right after the deletion marker; each next field follows the previous
    // one's width.
    pub offset_in_record: usize,
}

impl FieldDescriptor {
    pub const SIZE: usize = 32;
}

pub(crate) fn parse_descriptor(
    buffer: &[u8],
    offset_in_record: usize,
) -> IResult<&[u8], FieldDescriptor, DbfParseError<&[u8]>> {
    map(
        tuple((
            t_field_name,
            t_field_type,
            take(4usize),
            t_u8,
            t_u8,
            take(14usize),
        )),
        move |(name, kind, _, length, decimal_places, _)| FieldDescriptor {
            name,
            kind,
            length,
            decimal_places,
            offset_in_record,
        },
    )(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptor_bytes(name: &[u8], kind: u8, length: u8, decimals: u8) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[..name.len()].copy_from_slice(name);
        bytes[11] = kind;
        bytes[16] = length;
        bytes[17] = decimals;
        bytes
    }

    #[test]
    fn parses_a_numeric_descriptor() {
        let bytes = descriptor_bytes(b"PRICE", b'N', 8, 2);
        let (rest, field) = parse_descriptor(&bytes, 7).unwrap();

        assert!(rest.is_empty());
        assert_eq!(
            FieldDescriptor {
                name: "PRICE".to_string(),
                kind: FieldType::Numeric,
                length: 8,
                decimal_places: 2,
                offset_in_record: 7,
            },
            field
        );
    }

    #[test]
    fn unknown_type_letters_fall_back_to_character() {
        let bytes = descriptor_bytes(b"BLOB", b'Z', 10, 0);
        let (_, field) = parse_descriptor(&bytes, 1).unwrap();
        assert_eq!(FieldType::Character, field.kind);
    }

    #[test]
    fn type_letters_map_to_their_variants() {
        for (byte, kind) in [
            (b'C', FieldType::Character),
            (b'N', FieldType::Numeric),
            (b'F', FieldType::Float),
            (b'L', FieldType::Logical),
            (b'D', FieldType::Date),
            (b'M', FieldType::Memo),
        ] {
            assert_eq!(kind, FieldType::from_byte(byte));
        }
    }
}

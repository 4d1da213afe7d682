use std::collections::HashMap;

use chrono::NaiveDate;

use crate::dbf::codepage;
use crate::dbf::field::{FieldDescriptor, FieldType};
use crate::dbf::header::DbfHeader;
use crate::error::{DbfError, Result};

pub const LIVE_MARKER: u8 = 0x20;
pub const DELETED_MARKER: u8 = 0x2A;

/// Decoded value of a single field. The variant set is closed; every value
/// this codec produces lands in exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Character(String),
    Integer(i64),
    Decimal(f64),
    Float(f64),
    Logical(bool),
    Date(NaiveDate),
    /// Raw 10-byte memo pointer, trimmed. Resolving it against the memo
    /// file is the caller's business.
    Memo(String),
    Null,
}

/// One decoded row. A deleted row (marker byte 0x2A) is its own variant so
/// callers can tell it apart from a live row whose fields are all blank.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    Deleted,
    Row(HashMap<String, FieldValue>),
}

/// Converts raw fixed-width records of a decrypted payload into typed
/// values, honoring the table's code page.
///
/// Value-level parse failures are recoverable: the field decodes to
/// [`FieldValue::Null`] and a note lands in the `issues` list handed to
/// [`RecordDecoder::decode`].
pub struct RecordDecoder<'a> {
    header: &'a DbfHeader,
    fields: &'a [FieldDescriptor],
    code_page: Option<u16>,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(header: &'a DbfHeader, fields: &'a [FieldDescriptor]) -> Self {
        RecordDecoder {
            header,
            fields,
            code_page: codepage::resolve(header.language_driver),
        }
    }

    /// Raw bytes of one record, deleted or not.
    pub fn raw_record<'b>(&self, payload: &'b [u8], index: usize) -> Result<&'b [u8]> {
        let count = self.header.record_count as usize;
        if index >= count {
            return Err(DbfError::RecordIndexOutOfRange { index, count });
        }
        let record_length = self.header.record_length as usize;
        let start = index * record_length;
        Ok(&payload[start..start + record_length])
    }

    pub fn decode(
        &self,
        payload: &[u8],
        index: usize,
        issues: &mut Vec<String>,
    ) -> Result<DecodedRecord> {
        let raw = self.raw_record(payload, index)?;
        if raw[0] == DELETED_MARKER {
            return Ok(DecodedRecord::Deleted);
        }

        let mut values = HashMap::with_capacity(self.fields.len());
        for field in self.fields {
            let start = field.offset_in_record;
            let bytes = &raw[start..start + field.length as usize];
            values.insert(
                field.name.clone(),
                self.decode_value(field, bytes, index, issues),
            );
        }
        Ok(DecodedRecord::Row(values))
    }

    fn decode_value(
        &self,
        field: &FieldDescriptor,
        bytes: &[u8],
        index: usize,
        issues: &mut Vec<String>,
    ) -> FieldValue {
        match field.kind {
            FieldType::Character => FieldValue::Character(self.trimmed_text(bytes)),
            FieldType::Memo => {
                // Memo pointers are right-aligned block numbers; trim both
                // sides and hand the text back unresolved.
                FieldValue::Memo(self.trimmed_text(bytes).trim_start().to_string())
            }
            FieldType::Numeric => {
                let text = ascii_trimmed(bytes);
                if text.is_empty() {
                    return FieldValue::Null;
                }
                if field.decimal_places > 0 {
                    match text.parse::<f64>() {
                        Ok(value) => FieldValue::Decimal(value),
                        Err(_) => self.note_issue(field, index, &text, issues),
                    }
                } else {
                    match text.parse::<i64>() {
                        Ok(value) => FieldValue::Integer(value),
                        Err(_) => self.note_issue(field, index, &text, issues),
                    }
                }
            }
            FieldType::Float => {
                let text = ascii_trimmed(bytes);
                if text.is_empty() {
                    return FieldValue::Null;
                }
                match text.parse::<f64>() {
                    Ok(value) => FieldValue::Float(value),
                    Err(_) => self.note_issue(field, index, &text, issues),
                }
            }
            FieldType::Logical => match bytes.first() {
                Some(b'T' | b't' | b'Y' | b'y') => FieldValue::Logical(true),
                Some(b'F' | b'f' | b'N' | b'n') => FieldValue::Logical(false),
                // '?' and blank mean "not set"; anything else has no
                // recoverable reading either.
                _ => FieldValue::Null,
            },
            FieldType::Date => {
                let text = ascii_trimmed(bytes);
                if text.is_empty() {
                    return FieldValue::Null;
                }
                match parse_date(&text) {
                    Some(date) => FieldValue::Date(date),
                    None => self.note_issue(field, index, &text, issues),
                }
            }
        }
    }

    fn note_issue(
        &self,
        field: &FieldDescriptor,
        index: usize,
        text: &str,
        issues: &mut Vec<String>,
    ) -> FieldValue {
        issues.push(format!(
            "record {index}: field {}: unparsable {:?}",
            field.name, text
        ));
        FieldValue::Null
    }

    fn trimmed_text(&self, bytes: &[u8]) -> String {
        // Right-trim of spaces and NULs happens on the raw bytes, before
        // the code page gets involved.
        let end = bytes
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |p| p + 1);
        codepage::decode_text(&bytes[..end], self.code_page)
    }
}

// D fields are 8 ASCII digits, YYYYMMDD. Anything else is unparsable.
fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = text[..4].parse().ok()?;
    let month: u32 = text[4..6].parse().ok()?;
    let day: u32 = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn ascii_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbf::header::{TableStatus, UpdateDate};
    use pretty_assertions::assert_eq;

    fn header(record_count: u32, record_length: u16, language_driver: u8) -> DbfHeader {
        DbfHeader {
            status: TableStatus::Plain,
            last_update: UpdateDate {
                year: 2024,
                month: 2,
                day: 15,
            },
            record_count,
            header_length: 33,
            record_length,
            mdx_flag: 0,
            language_driver,
        }
    }

    fn field(name: &str, kind: FieldType, length: u8, decimals: u8, offset: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            kind,
            length,
            decimal_places: decimals,
            offset_in_record: offset,
        }
    }

    fn sample_fields() -> Vec<FieldDescriptor> {
        vec![
            field("NAME", FieldType::Character, 6, 0, 1),
            field("QTY", FieldType::Numeric, 4, 0, 7),
            field("PRICE", FieldType::Numeric, 7, 2, 11),
            field("RATE", FieldType::Float, 6, 2, 18),
            field("WHEN", FieldType::Date, 8, 0, 24),
            field("OK", FieldType::Logical, 1, 0, 32),
            field("NOTE", FieldType::Memo, 10, 0, 33),
        ]
    }

    // record layout: 1 + 6 + 4 + 7 + 6 + 8 + 1 + 10 = 43 bytes
    fn live_record() -> Vec<u8> {
        let mut raw = Vec::new();
        raw.push(LIVE_MARKER);
        raw.extend_from_slice(b"ALPHA ");
        raw.extend_from_slice(b"  12");
        raw.extend_from_slice(b"  19.50");
        raw.extend_from_slice(b"  1.25");
        raw.extend_from_slice(b"20240215");
        raw.push(b'T');
        raw.extend_from_slice(b"   1234567");
        raw
    }

    fn blank_record() -> Vec<u8> {
        let mut raw = vec![b' '; 43];
        raw[0] = LIVE_MARKER;
        raw
    }

    #[test]
    fn decodes_typed_values() {
        let header = header(1, 43, 0x03);
        let fields = sample_fields();
        let decoder = RecordDecoder::new(&header, &fields);
        let mut issues = Vec::new();

        let record = decoder.decode(&live_record(), 0, &mut issues).unwrap();
        let values = match record {
            DecodedRecord::Row(values) => values,
            DecodedRecord::Deleted => panic!("live record decoded as deleted"),
        };

        assert_eq!(FieldValue::Character("ALPHA".to_string()), values["NAME"]);
        assert_eq!(FieldValue::Integer(12), values["QTY"]);
        assert_eq!(FieldValue::Decimal(19.5), values["PRICE"]);
        assert_eq!(FieldValue::Float(1.25), values["RATE"]);
        assert_eq!(
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()),
            values["WHEN"]
        );
        assert_eq!(FieldValue::Logical(true), values["OK"]);
        assert_eq!(FieldValue::Memo("1234567".to_string()), values["NOTE"]);
        assert!(issues.is_empty());
    }

    #[test]
    fn deleted_rows_decode_to_the_sentinel() {
        let header = header(1, 43, 0x03);
        let fields = sample_fields();
        let decoder = RecordDecoder::new(&header, &fields);
        let mut issues = Vec::new();

        let mut raw = live_record();
        raw[0] = DELETED_MARKER;
        let record = decoder.decode(&raw, 0, &mut issues).unwrap();
        assert_eq!(DecodedRecord::Deleted, record);

        // The raw bytes stay reachable even for deleted rows.
        assert_eq!(&raw[..], decoder.raw_record(&raw, 0).unwrap());
    }

    #[test]
    fn blank_fields_follow_the_empty_policies() {
        let header = header(1, 43, 0x03);
        let fields = sample_fields();
        let decoder = RecordDecoder::new(&header, &fields);
        let mut issues = Vec::new();

        let record = decoder.decode(&blank_record(), 0, &mut issues).unwrap();
        let values = match record {
            DecodedRecord::Row(values) => values,
            DecodedRecord::Deleted => panic!("live record decoded as deleted"),
        };

        assert_eq!(FieldValue::Character(String::new()), values["NAME"]);
        assert_eq!(FieldValue::Null, values["QTY"]);
        assert_eq!(FieldValue::Null, values["PRICE"]);
        assert_eq!(FieldValue::Null, values["RATE"]);
        assert_eq!(FieldValue::Null, values["WHEN"]);
        assert_eq!(FieldValue::Null, values["OK"]);
        assert_eq!(FieldValue::Memo(String::new()), values["NOTE"]);
        assert!(issues.is_empty());
    }

    #[test]
    fn logical_variants_cover_the_documented_letters() {
        let header = header(1, 2, 0x03);
        let fields = vec![field("OK", FieldType::Logical, 1, 0, 1)];
        let decoder = RecordDecoder::new(&header, &fields);

        for (byte, expected) in [
            (b'T', FieldValue::Logical(true)),
            (b't', FieldValue::Logical(true)),
            (b'Y', FieldValue::Logical(true)),
            (b'y', FieldValue::Logical(true)),
            (b'F', FieldValue::Logical(false)),
            (b'f', FieldValue::Logical(false)),
            (b'N', FieldValue::Logical(false)),
            (b'n', FieldValue::Logical(false)),
            (b'?', FieldValue::Null),
            (b' ', FieldValue::Null),
        ] {
            let raw = [LIVE_MARKER, byte];
            let mut issues = Vec::new();
            let record = decoder.decode(&raw, 0, &mut issues).unwrap();
            match record {
                DecodedRecord::Row(values) => assert_eq!(expected, values["OK"]),
                DecodedRecord::Deleted => panic!("live record decoded as deleted"),
            }
        }
    }

    #[test]
    fn unparsable_content_recovers_to_null_with_a_note() {
        let header = header(1, 13, 0x03);
        let fields = vec![
            field("QTY", FieldType::Numeric, 4, 0, 1),
            field("WHEN", FieldType::Date, 8, 0, 5),
        ];
        let decoder = RecordDecoder::new(&header, &fields);
        let mut issues = Vec::new();

        let mut raw = Vec::new();
        raw.push(LIVE_MARKER);
        raw.extend_from_slice(b"12xy");
        raw.extend_from_slice(b"2024021x");

        let record = decoder.decode(&raw, 0, &mut issues).unwrap();
        let values = match record {
            DecodedRecord::Row(values) => values,
            DecodedRecord::Deleted => panic!("live record decoded as deleted"),
        };
        assert_eq!(FieldValue::Null, values["QTY"]);
        assert_eq!(FieldValue::Null, values["WHEN"]);
        assert_eq!(2, issues.len());
        assert!(issues[0].contains("QTY"));
        assert!(issues[1].contains("WHEN"));
    }

    #[test]
    fn impossible_calendar_dates_are_rejected() {
        assert_eq!(None, parse_date("20240230"));
        assert_eq!(None, parse_date("2024021"));
        assert_eq!(
            NaiveDate::from_ymd_opt(2024, 2, 29),
            parse_date("20240229")
        );
    }

    #[test]
    fn character_fields_use_the_resolved_code_page() {
        let header = header(1, 4, 0xC9); // driver 0xC9 -> cp1251
        let fields = vec![field("TXT", FieldType::Character, 3, 0, 1)];
        let decoder = RecordDecoder::new(&header, &fields);
        let mut issues = Vec::new();

        let raw = [LIVE_MARKER, 0xC0, 0xC1, b' '];
        let record = decoder.decode(&raw, 0, &mut issues).unwrap();
        match record {
            DecodedRecord::Row(values) => {
                assert_eq!(FieldValue::Character("АБ".to_string()), values["TXT"]);
            }
            DecodedRecord::Deleted => panic!("live record decoded as deleted"),
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let header = header(2, 43, 0x03);
        let fields = sample_fields();
        let decoder = RecordDecoder::new(&header, &fields);

        let payload = [live_record(), live_record()].concat();
        let err = decoder.raw_record(&payload, 2).unwrap_err();
        assert_eq!(DbfError::RecordIndexOutOfRange { index: 2, count: 2 }, err);
    }
}

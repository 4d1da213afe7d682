use crate::dbf::field::FieldDescriptor;
use crate::dbf::header::{self, DbfHeader, TableStatus};
use crate::dbf::record::{DecodedRecord, RecordDecoder};
use crate::error::Result;
use crate::sx::{SxCipher, SxKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    Decrypt,
    Encrypt,
}

/// Result bundle of one transform: the rewritten file bytes, the parsed
/// structure, optionally the decoded rows, recoverable field notes, and a
/// human-readable status line.
#[derive(Debug)]
pub struct TransformOutcome {
    pub bytes: Vec<u8>,
    pub header: DbfHeader,
    pub fields: Vec<FieldDescriptor>,
    pub records: Option<Vec<DecodedRecord>>,
    pub notes: Vec<String>,
    pub status: String,
}

/// Run one whole-file transform: parse the header, carve out the record
/// payload, run the cipher over it, retag the status byte, and optionally
/// decode the records afterwards.
///
/// The caller's buffer is never touched; the returned bytes are a fresh
/// copy. Header-level failures abort before any output exists, so a
/// cancelled or failed call leaves nothing half-transformed. Bytes outside
/// the payload (reserved header bytes, the trailing EOF marker) are carried
/// through verbatim.
pub fn transform(
    buffer: &[u8],
    key: &SxKey,
    mode: TransformMode,
    decode_records: bool,
) -> Result<TransformOutcome> {
    let (mut parsed_header, fields) = DbfHeader::parse(buffer)?;
    header::payload_slice(buffer, &parsed_header)?;
    let range = header::payload_range(&parsed_header);

    let mut bytes = buffer.to_vec();
    let cipher = SxCipher::new(*key);

    let status = match mode {
        TransformMode::Decrypt => match parsed_header.status {
            TableStatus::SxEncrypted => {
                cipher.decrypt_in_place(&mut bytes[range.clone()]);
                parsed_header.status = TableStatus::Plain;
                header::set_status(&mut bytes, TableStatus::Plain);
                format!("decrypted {} records", parsed_header.record_count)
            }
            TableStatus::Plain => "already plain, payload left untouched".to_string(),
            TableStatus::Other(byte) => {
                format!("status byte 0x{byte:02X} is not SIX-encrypted, payload left untouched")
            }
        },
        TransformMode::Encrypt => {
            cipher.encrypt_in_place(&mut bytes[range.clone()]);
            parsed_header.status = TableStatus::SxEncrypted;
            header::set_status(&mut bytes, TableStatus::SxEncrypted);
            format!("encrypted {} records", parsed_header.record_count)
        }
    };

    let mut notes = Vec::new();
    let records = if decode_records && mode == TransformMode::Decrypt {
        let decoder = RecordDecoder::new(&parsed_header, &fields);
        let payload = &bytes[range];
        let mut rows = Vec::with_capacity(parsed_header.record_count as usize);
        for index in 0..parsed_header.record_count as usize {
            rows.push(decoder.decode(payload, index, &mut notes)?);
        }
        Some(rows)
    } else {
        None
    };

    Ok(TransformOutcome {
        bytes,
        header: parsed_header,
        fields,
        records,
        notes,
        status,
    })
}

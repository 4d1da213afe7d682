pub mod codepage;
pub mod field;
pub mod header;
pub mod parse_utils;
pub mod pipeline;
pub mod record;

pub use field::{FieldDescriptor, FieldType};
pub use header::{DbfHeader, TableStatus, UpdateDate};
pub use record::{DecodedRecord, FieldValue, RecordDecoder};

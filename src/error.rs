use nom::error::ParseError;
use thiserror::Error;

pub type Result<T, E = DbfError> = std::result::Result<T, E>;

/// Errors surfaced by the DBF codec and the transform pipeline.
///
/// The cipher itself never fails; record-level value parse issues are
/// recovered in place and reported as annotations, not as errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DbfError {
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),

    #[error("payload of {declared} bytes exceeds the {available} bytes after the header")]
    PayloadOutOfRange { declared: usize, available: usize },

    #[error("replacement payload is {got} bytes, payload region holds {expected}")]
    ReplaceSizeMismatch { expected: usize, got: usize },

    #[error("record index {index} out of range, table holds {count} records")]
    RecordIndexOutOfRange { index: usize, count: usize },

    #[error("unparsable {0} structure")]
    Parse(&'static str),
}

#[derive(Debug)]
pub struct DbfParseError<I> {
    kind: ErrorKind<I>,
    backtrace: Vec<DbfParseError<I>>,
}

#[derive(Debug)]
pub enum ErrorKind<I> {
    Nom(I, nom::error::ErrorKind),
}

impl<I> ParseError<I> for DbfParseError<I> {
    fn from_error_kind(input: I, kind: nom::error::ErrorKind) -> Self {
        Self {
            kind: ErrorKind::Nom(input, kind),
            backtrace: Vec::new(),
        }
    }

    fn append(input: I, kind: nom::error::ErrorKind, mut other: Self) -> Self {
        other.backtrace.push(Self::from_error_kind(input, kind));
        other
    }
}

impl<I> From<nom::Err<DbfParseError<I>>> for DbfError {
    fn from(_: nom::Err<DbfParseError<I>>) -> Self {
        DbfError::Parse("dbf")
    }
}

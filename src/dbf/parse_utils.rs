use nom::{
    bytes::complete::take,
    combinator::map,
    number::complete::{le_u16, le_u32},
    sequence::tuple,
    IResult,
};

use crate::dbf::field::FieldType;
use crate::dbf::header::{TableStatus, UpdateDate};
use crate::error::DbfParseError;

pub fn t_u8(buffer: &[u8]) -> IResult<&[u8], u8, DbfParseError<&[u8]>> {
    nom::number::complete::u8(buffer)
}

pub fn t_u16(buffer: &[u8]) -> IResult<&[u8], u16, DbfParseError<&[u8]>> {
    le_u16(buffer)
}

pub fn t_u32(buffer: &[u8]) -> IResult<&[u8], u32, DbfParseError<&[u8]>> {
    le_u32(buffer)
}

pub fn t_status(buffer: &[u8]) -> IResult<&[u8], TableStatus, DbfParseError<&[u8]>> {
    map(t_u8, TableStatus::from_byte)(buffer)
}

pub fn t_update_date(buffer: &[u8]) -> IResult<&[u8], UpdateDate, DbfParseError<&[u8]>> {
    map(tuple((t_u8, t_u8, t_u8)), |(yy, month, day)| {
        UpdateDate::from_stored(yy, month, day)
    })(buffer)
}

pub fn t_field_name(buffer: &[u8]) -> IResult<&[u8], String, DbfParseError<&[u8]>> {
    map(take(11usize), |bytes: &[u8]| {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).trim().to_string()
    })(buffer)
}

pub fn t_field_type(buffer: &[u8]) -> IResult<&[u8], FieldType, DbfParseError<&[u8]>> {
    map(t_u8, FieldType::from_byte)(buffer)
}

use encoding_rs::Encoding;

/// Map the language-driver byte at header offset 29 to its numeric code
/// page. Driver bytes outside the documented xBase set resolve to `None`.
pub fn resolve(language_driver: u8) -> Option<u16> {
    let code_page = match language_driver {
        0x01 | 0x09 | 0x0B | 0x0D | 0x0F | 0x11 | 0x15 | 0x18 | 0x19 | 0x1B => 437,
        0x02 | 0x0A | 0x0E | 0x10 | 0x12 | 0x14 | 0x16 | 0x1A | 0x1D | 0x25 | 0x37 => 850,
        0x03 | 0x57 | 0x58 | 0x59 => 1252,
        0x04 => 10000,
        0x08 | 0x17 | 0x66 => 865,
        0x13 | 0x7B => 932,
        0x1C | 0x6C => 863,
        0x1F | 0x22 | 0x23 | 0x40 | 0x64 | 0x87 => 852,
        0x24 => 860,
        0x26 | 0x65 => 866,
        0x4D | 0x7A => 936,
        0x4E | 0x79 => 949,
        0x4F | 0x78 => 950,
        0x50 | 0x7C => 874,
        0x67 => 861,
        0x6A | 0x86 => 737,
        0x6B | 0x88 => 857,
        0xC8 => 1250,
        0xC9 => 1251,
        0xCA => 1254,
        0xCB => 1253,
        0xCC => 1257,
        _ => return None,
    };
    Some(code_page)
}

/// The `encoding_rs` encoding for a code page, where one exists. The DOS
/// OEM pages (437, 737, 850, 852, 857, 860, 861, 863, 865) have no
/// counterpart and fall through to the Latin-1 identity in
/// [`decode_text`].
pub fn encoding_for(code_page: u16) -> Option<&'static Encoding> {
    match code_page {
        866 => Some(encoding_rs::IBM866),
        874 => Some(encoding_rs::WINDOWS_874),
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1257 => Some(encoding_rs::WINDOWS_1257),
        10000 => Some(encoding_rs::MACINTOSH),
        _ => None,
    }
}

/// Decode raw field bytes using the table's code page when one is known.
///
/// Without a usable encoding every byte maps to the Unicode scalar of the
/// same value (Latin-1 identity), so no byte sequence can fail to decode
/// and repeated runs always produce the same text.
pub fn decode_text(bytes: &[u8], code_page: Option<u16>) -> String {
    match code_page.and_then(encoding_for) {
        Some(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
        None => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

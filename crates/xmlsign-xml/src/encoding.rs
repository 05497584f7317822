#![forbid(unsafe_code)]

//! Byte encodings of input documents.
//!
//! UTF-16 is recognized by its byte order mark; everything else is read as
//! UTF-8, with or without a mark. A document is written back in the
//! encoding it was read in.

use xmlsign_core::Error;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// UTF-8 preceded by a byte order mark.
    Utf8Bom,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Encode `text`, byte order mark included.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => [&UTF8_BOM[..], text.as_bytes()].concat(),
            TextEncoding::Utf16Le => utf16_bytes(UTF16LE_BOM, text, u16::to_le_bytes),
            TextEncoding::Utf16Be => utf16_bytes(UTF16BE_BOM, text, u16::to_be_bytes),
        }
    }
}

/// Decode document bytes; the byte order mark is not part of the text.
pub fn decode(data: &[u8]) -> Result<(String, TextEncoding), Error> {
    if let Some(rest) = data.strip_prefix(&UTF8_BOM[..]) {
        return Ok((utf8(rest)?, TextEncoding::Utf8Bom));
    }
    if let Some(rest) = data.strip_prefix(&UTF16LE_BOM[..]) {
        return Ok((utf16(rest, u16::from_le_bytes)?, TextEncoding::Utf16Le));
    }
    if let Some(rest) = data.strip_prefix(&UTF16BE_BOM[..]) {
        return Ok((utf16(rest, u16::from_be_bytes)?, TextEncoding::Utf16Be));
    }
    Ok((utf8(data)?, TextEncoding::Utf8))
}

fn utf8(data: &[u8]) -> Result<String, Error> {
    String::from_utf8(data.to_vec()).map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))
}

fn utf16(data: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, Error> {
    if data.len() % 2 != 0 {
        return Err(Error::XmlParse("truncated UTF-16 input".into()));
    }
    let units = data.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| Error::XmlParse(format!("invalid UTF-16: {e}")))
}

fn utf16_bytes(bom: [u8; 2], text: &str, bytes: fn(u16) -> [u8; 2]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&bom);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&bytes(unit));
    }
    out
}

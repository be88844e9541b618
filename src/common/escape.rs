// src/common/escape.rs

/// Decodes legacy `%XY` escapes (two hex digits) in text headed for the display.
///
/// Scans left to right: a `%` followed by two hex digits becomes the byte they
/// encode and the scan advances past all three characters; any other character,
/// including a `%` without two hex digits after it, is copied as is.
/// The decoded bytes are read as UTF-8, replacing invalid sequences.
pub fn decode_escapes(text: &str) -> String {
    if !text.contains('%') {
        return text.to_owned();
    }

    let bytes = text.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                decoded.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

#[inline]
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

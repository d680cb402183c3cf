//! DeviceSQL string decoding for Pioneer databases
//!
//! DeviceSQL strings use three encoding formats, distinguished by the first
//! byte of the record:
//! - Short ASCII: total record length (including the header byte) encoded
//!   in the header as `len << 1 | 1`
//! - Long ASCII (0x40): 4-byte header with a u16 total length
//! - Long UTF-16LE (0x90): 4-byte header with a u16 total length
//!
//! Reference: https://djl-analysis.deepsymmetry.org/rekordbox-export-analysis/exports.html

/// Flag byte values for the long encodings
const FLAG_LONG_ASCII: u8 = 0x40;
const FLAG_UTF16LE: u8 = 0x90;

/// Decode a DeviceSQL string starting at the beginning of `data`.
///
/// `data` runs to the end of the enclosing buffer; the record's own header
/// says how much of it belongs to the string. Any declared length that
/// would run past `data` yields the empty string rather than an error —
/// a truncated name is not worth abandoning the row over.
pub fn decode_device_string(data: &[u8]) -> String {
    let Some(&length_and_kind) = data.first() else {
        return String::new();
    };

    match length_and_kind {
        FLAG_LONG_ASCII => {
            let Some(total_len) = crate::bytes::read_u16_le(data, 1) else {
                return String::new();
            };
            let total_len = total_len as usize;
            if total_len < 4 || total_len > data.len() {
                return String::new();
            }
            String::from_utf8_lossy(&data[4..total_len]).into_owned()
        }
        FLAG_UTF16LE => {
            let Some(total_len) = crate::bytes::read_u16_le(data, 1) else {
                return String::new();
            };
            let total_len = total_len as usize;
            if total_len < 4 {
                return String::new();
            }
            let payload_len = (total_len - 4).min(data.len().saturating_sub(4));
            utf16le_to_string(&data[4..4 + payload_len])
        }
        _ => {
            // Short ASCII: total length (header byte included) in the high
            // seven bits.
            let total_len = (length_and_kind >> 1) as usize;
            if total_len == 0 || total_len > data.len() {
                return String::new();
            }
            String::from_utf8_lossy(&data[1..total_len]).into_owned()
        }
    }
}

/// Transcode UTF-16LE bytes to UTF-8, stopping at a NUL code unit or at the
/// end of input. An odd trailing byte is ignored.
pub fn utf16le_to_string(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0);
    std::char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Transcode UTF-16BE bytes to UTF-8, stopping at a NUL code unit or at the
/// end of input.
pub fn utf16be_to_string(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0);
    std::char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

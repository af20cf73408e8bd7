/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::{error, fmt};

/// Character encoding used to validate string candidates.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Encoding {
    #[default]
    Ascii,
    EucJp,
    ShiftJis,
}

/// Control bytes that can be represented with a simple escape on a `.asciz`
/// directive. Anything else below 0x20 disqualifies a string candidate,
/// including `\a`, which in practice only shows up on binary blobs.
const ALLOWED_CONTROL_BYTES: [u8; 4] = [b'\t', b'\n', 0x0C, b'\r'];

impl Encoding {
    /// Checks `bytes` is a valid string under this encoding, with no
    /// disallowed control characters.
    pub fn validate(&self, bytes: &[u8]) -> Result<(), StrDecodingError> {
        for (i, &b) in bytes.iter().enumerate() {
            if b < 0x20 && !ALLOWED_CONTROL_BYTES.contains(&b) {
                return Err(StrDecodingError::BannedChar { offset: i, byte: b });
            }
            if b == 0x7F {
                return Err(StrDecodingError::BannedChar { offset: i, byte: b });
            }
        }

        match self {
            Encoding::Ascii => {
                if let Some(offset) = bytes.iter().position(|x| *x > 0x7F) {
                    return Err(StrDecodingError::InvalidEncoding { offset });
                }
            }
            Encoding::EucJp => {
                if encoding_rs::EUC_JP
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .is_none()
                {
                    return Err(StrDecodingError::InvalidEncoding { offset: 0 });
                }
            }
            Encoding::ShiftJis => {
                if encoding_rs::SHIFT_JIS
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .is_none()
                {
                    return Err(StrDecodingError::InvalidEncoding { offset: 0 });
                }
            }
        }

        Ok(())
    }

    /// Decodes a NUL-terminated string candidate, returning its total size
    /// in bytes, terminator included.
    pub fn check_valid_c_string(&self, bytes: &[u8]) -> Result<usize, StrDecodingError> {
        let nul = bytes
            .iter()
            .position(|x| *x == 0)
            .ok_or(StrDecodingError::MissingTerminator)?;

        self.validate(&bytes[..nul])?;

        Ok(nul + 1)
    }

    /// Decodes a length-prefixed (Pascal) string candidate, returning its
    /// total size in bytes, length byte included.
    pub fn check_valid_pascal_string(&self, bytes: &[u8]) -> Result<usize, StrDecodingError> {
        let len = *bytes.first().ok_or(StrDecodingError::MissingTerminator)? as usize;
        if bytes.len() < 1 + len {
            return Err(StrDecodingError::MissingTerminator);
        }

        self.validate(&bytes[1..1 + len])?;

        Ok(1 + len)
    }
}

/// Escapes raw string bytes for emission on a `.ascii`/`.asciz` directive.
///
/// Bytes outside printable ASCII are written as three-digit octal escapes,
/// which reassemble byte-exactly regardless of the characters that follow.
#[must_use]
pub fn escape_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());

    for &b in bytes {
        match b {
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            0x0C => out.push_str("\\f"),
            b'\r' => out.push_str("\\r"),
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                out.push('\\');
                out.push_str(&format!("{:03o}", b));
            }
        }
    }

    out
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrDecodingError {
    MissingTerminator,
    BannedChar { offset: usize, byte: u8 },
    InvalidEncoding { offset: usize },
}

impl fmt::Display for StrDecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrDecodingError::MissingTerminator => {
                write!(f, "String is not terminated within its symbol")
            }
            StrDecodingError::BannedChar { offset, byte } => {
                write!(
                    f,
                    "Byte 0x{:02X} at offset 0x{:X} is not allowed on a string",
                    byte, offset
                )
            }
            StrDecodingError::InvalidEncoding { offset } => {
                write!(f, "Bytes starting at offset 0x{:X} can't be decoded", offset)
            }
        }
    }
}
impl error::Error for StrDecodingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_string() {
        assert_eq!(
            Encoding::Ascii.check_valid_c_string(b"Hello\0\0\0"),
            Ok(6)
        );
    }

    #[test]
    fn bell_character_is_rejected() {
        assert!(Encoding::Ascii.check_valid_c_string(b"ding\x07\0").is_err());
    }

    #[test]
    fn unterminated_string_is_rejected() {
        assert_eq!(
            Encoding::Ascii.check_valid_c_string(b"Hello"),
            Err(StrDecodingError::MissingTerminator)
        );
    }

    #[test]
    fn escaping_keeps_printable_ascii() {
        assert_eq!(escape_string(b"a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
        assert_eq!(escape_string(&[0x82, 0xA0]), "\\202\\240");
    }

    #[test]
    fn pascal_string_length_prefix() {
        assert_eq!(
            Encoding::Ascii.check_valid_pascal_string(b"\x05Hello\0\0"),
            Ok(6)
        );
    }
}

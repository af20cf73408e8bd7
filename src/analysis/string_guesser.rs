/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::{error, fmt};

use rabbitizer::Vram;

use crate::{
    metadata::SymbolMetadata,
    str_decoding::{Encoding, StrDecodingError},
};

/// How aggressively data bytes get classified as strings.
///
/// Each level is a strict superset of the previous one: anything recognized
/// at some level is also recognized at every higher level.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum StringGuesserLevel {
    /// Never guess strings.
    Disabled,

    /// Only guess on completely untyped symbols which are referenced exactly
    /// once.
    #[default]
    UniqueReference,

    /// Allow guessing on symbols with multiple references. Compilers
    /// deduplicate identical strings, so this is usually safe.
    MultipleReferences,

    /// Allow guessing empty strings.
    EmptyStrings,

    /// Allow guessing even when the symbol has autodetected type
    /// information. User-declared types are still respected.
    IgnoreDetectedType,
}

impl StringGuesserLevel {
    /// The numeric level, matching the `--*-string-guesser` CLI arguments.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            StringGuesserLevel::Disabled => 0,
            StringGuesserLevel::UniqueReference => 1,
            StringGuesserLevel::MultipleReferences => 2,
            StringGuesserLevel::EmptyStrings => 3,
            StringGuesserLevel::IgnoreDetectedType => 4,
        }
    }

    #[must_use]
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => StringGuesserLevel::Disabled,
            1 => StringGuesserLevel::UniqueReference,
            2 => StringGuesserLevel::MultipleReferences,
            3 => StringGuesserLevel::EmptyStrings,
            _ => StringGuesserLevel::IgnoreDetectedType,
        }
    }

    /// Decides if the bytes at `vram` look like a NUL-terminated string
    /// under this level, returning the string's size in bytes, terminator
    /// included.
    pub fn guess(
        &self,
        reference: Option<&SymbolMetadata>,
        vram: Vram,
        bytes: &[u8],
        encoding: Encoding,
        reached_late_rodata: bool,
    ) -> Result<usize, StringGuessRejection> {
        self.common_gates(reference, vram, reached_late_rodata)?;

        let size = encoding
            .check_valid_c_string(bytes)
            .map_err(StringGuessRejection::Decode)?;

        if size == 1 && *self < StringGuesserLevel::EmptyStrings {
            return Err(StringGuessRejection::Empty);
        }

        Self::check_trailing_padding(bytes, size)?;

        Ok(size)
    }

    /// Same as [`StringGuesserLevel::guess`], for length-prefixed strings.
    pub fn guess_pascal(
        &self,
        reference: Option<&SymbolMetadata>,
        vram: Vram,
        bytes: &[u8],
        encoding: Encoding,
        reached_late_rodata: bool,
    ) -> Result<usize, StringGuessRejection> {
        self.common_gates(reference, vram, reached_late_rodata)?;

        let size = encoding
            .check_valid_pascal_string(bytes)
            .map_err(StringGuessRejection::Decode)?;

        if size == 1 && *self < StringGuesserLevel::EmptyStrings {
            return Err(StringGuessRejection::Empty);
        }

        Self::check_trailing_padding(bytes, size)?;

        Ok(size)
    }

    fn common_gates(
        &self,
        reference: Option<&SymbolMetadata>,
        _vram: Vram,
        reached_late_rodata: bool,
    ) -> Result<(), StringGuessRejection> {
        if *self == StringGuesserLevel::Disabled {
            return Err(StringGuessRejection::GuesserDisabled);
        }
        if reached_late_rodata {
            // late rodata only holds jumptables, floats and doubles.
            return Err(StringGuessRejection::LateRodata);
        }

        if let Some(reference) = reference {
            if reference.user_declared_type().is_some() {
                return Err(StringGuessRejection::UserDeclaredType);
            }
            if reference.autodetected_type().is_some()
                && *self < StringGuesserLevel::IgnoreDetectedType
            {
                return Err(StringGuessRejection::DetectedType);
            }
            if reference.reference_counter() > 1 && *self < StringGuesserLevel::MultipleReferences
            {
                return Err(StringGuessRejection::MultiplyReferenced);
            }
        }

        Ok(())
    }

    /// The leftover bytes up to the next word boundary must be zero,
    /// otherwise the "string" is likely the prefix of something bigger.
    fn check_trailing_padding(bytes: &[u8], size: usize) -> Result<(), StringGuessRejection> {
        let padded_end = size.next_multiple_of(4);
        for offset in size..padded_end.min(bytes.len()) {
            if bytes[offset] != 0 {
                return Err(StringGuessRejection::DirtyPadding { offset });
            }
        }
        Ok(())
    }
}

/// Why a string candidate was turned down. Rejections are not user-visible
/// errors, analysis just falls back to plain `.word` emission.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum StringGuessRejection {
    GuesserDisabled,
    LateRodata,
    UserDeclaredType,
    DetectedType,
    MultiplyReferenced,
    Empty,
    Decode(StrDecodingError),
    DirtyPadding { offset: usize },
}

impl fmt::Display for StringGuessRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringGuessRejection::GuesserDisabled => write!(f, "String guesser is disabled"),
            StringGuessRejection::LateRodata => {
                write!(f, "Strings can't show up on late rodata")
            }
            StringGuessRejection::UserDeclaredType => {
                write!(f, "The symbol has a user-declared type")
            }
            StringGuessRejection::DetectedType => {
                write!(f, "The symbol has autodetected type information")
            }
            StringGuessRejection::MultiplyReferenced => {
                write!(f, "The symbol is referenced more than once")
            }
            StringGuessRejection::Empty => write!(f, "Empty strings not allowed at this level"),
            StringGuessRejection::Decode(e) => write!(f, "{}", e),
            StringGuessRejection::DirtyPadding { offset } => {
                write!(f, "Non-zero padding byte at offset 0x{:X}", offset)
            }
        }
    }
}
impl error::Error for StringGuessRejection {}

#[cfg(test)]
mod tests {
    use super::*;

    fn guess_at(level: StringGuesserLevel, bytes: &[u8]) -> Result<usize, StringGuessRejection> {
        level.guess(None, Vram::new(0x80010000), bytes, Encoding::Ascii, false)
    }

    #[test]
    fn disabled_level_rejects_everything() {
        assert_eq!(
            guess_at(StringGuesserLevel::Disabled, b"Hello\0\0\0"),
            Err(StringGuessRejection::GuesserDisabled)
        );
    }

    #[test]
    fn simple_terminated_string() {
        assert_eq!(guess_at(StringGuesserLevel::UniqueReference, b"Hello\0\0\0"), Ok(6));
    }

    #[test]
    fn dirty_padding_is_rejected() {
        assert!(guess_at(StringGuesserLevel::UniqueReference, b"Hello\0\x01\0").is_err());
    }

    #[test]
    fn empty_string_needs_higher_level() {
        assert!(guess_at(StringGuesserLevel::MultipleReferences, b"\0\0\0\0").is_err());
        assert_eq!(guess_at(StringGuesserLevel::EmptyStrings, b"\0\0\0\0"), Ok(1));
    }

    #[test]
    fn levels_are_monotonic() {
        let levels = [
            StringGuesserLevel::Disabled,
            StringGuesserLevel::UniqueReference,
            StringGuesserLevel::MultipleReferences,
            StringGuesserLevel::EmptyStrings,
            StringGuesserLevel::IgnoreDetectedType,
        ];
        let candidates: [&[u8]; 4] = [b"Hi\0\0", b"\0\0\0\0", b"x\x07\0\0", b"word"];

        for pair in levels.windows(2) {
            for candidate in candidates {
                let lower = pair[0].guess(None, Vram::new(0x1000), candidate, Encoding::Ascii, false);
                let higher = pair[1].guess(None, Vram::new(0x1000), candidate, Encoding::Ascii, false);
                if lower.is_ok() {
                    assert_eq!(lower, higher);
                }
            }
        }
    }
}

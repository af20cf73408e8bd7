/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::fmt;

use rabbitizer::Vram;

use crate::addresses::{Rom, Size};

/// Non-fatal findings produced during analysis.
///
/// The pipeline keeps going after any of these; callers decide whether to
/// print them. A few get upgraded to panics by the config's panic toggles.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum AnalysisWarning {
    /// A user-declared symbol points outside every mapped vram range.
    SymbolOutOfRange { name: String, vram: Vram },

    /// The user-declared size of a symbol doesn't match what analysis
    /// found.
    SizeMismatch {
        vram: Vram,
        declared: Size,
        detected: Size,
    },

    /// A `%lo` pairing produced an addend outside the signed 16 bit band.
    AddendOverflow { vram: Vram, addend: i64 },

    /// A user-provided relocation has a type this emitter can't spell.
    UnknownReloc { rom: Rom, reloc_value: u32 },

    /// An invalid opcode showed up in the middle of a function.
    InvalidInstruction { rom: Rom, word: u32 },

    /// A rodata symbol demands migration to a function which doesn't exist.
    MigrationOwnerMissing { rodata_vram: Vram, owner_name: String },
}

impl AnalysisWarning {
    /// Whether the `panic_range_check` toggle turns this warning fatal.
    #[must_use]
    pub fn is_range_check(&self) -> bool {
        matches!(
            self,
            AnalysisWarning::SymbolOutOfRange { .. } | AnalysisWarning::SizeMismatch { .. }
        )
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::SymbolOutOfRange { name, vram } => {
                write!(
                    f,
                    "Symbol '{}' (0x{}) lies outside every mapped vram range",
                    name, vram
                )
            }
            AnalysisWarning::SizeMismatch {
                vram,
                declared,
                detected,
            } => {
                write!(
                    f,
                    "Symbol at 0x{} has declared size {} but analysis detected {}",
                    vram, declared, detected
                )
            }
            AnalysisWarning::AddendOverflow { vram, addend } => {
                write!(
                    f,
                    "Reference to 0x{} has addend 0x{:X}, outside the signed 16 bit band",
                    vram, addend
                )
            }
            AnalysisWarning::UnknownReloc { rom, reloc_value } => {
                write!(
                    f,
                    "Relocation at rom {} has unhandled type {}; emitting a raw word",
                    rom, reloc_value
                )
            }
            AnalysisWarning::InvalidInstruction { rom, word } => {
                write!(
                    f,
                    "Invalid opcode 0x{:08X} at rom {} terminates the current function",
                    word, rom
                )
            }
            AnalysisWarning::MigrationOwnerMissing {
                rodata_vram,
                owner_name,
            } => {
                write!(
                    f,
                    "Rodata at 0x{} wants to migrate to function '{}', which is not present",
                    rodata_vram, owner_name
                )
            }
        }
    }
}

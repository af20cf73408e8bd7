/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{metadata::SymbolType, section_type::SectionType, str_decoding::Encoding};

/// Compiler profile of the binary being analyzed.
///
/// Many small details of the analysis and the emitted assembly depend on
/// which compiler produced the original binary, like rodata migration rules,
/// alignment of specific symbol kinds or the encoding used for strings.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Compiler {
    /// MIPSpro, used by most N64 games.
    IDO,
    /// KMC gcc, N64.
    KMC,
    /// SN64 gcc, N64.
    SN64,
    /// egcs, N64.
    EGCS,
    /// Psy-Q SDK, PSX.
    PSYQ,
    /// Metrowerks CodeWarrior, PS2.
    MWCC,
    /// Emotion Engine gcc, PS2.
    EEGCC,
}

impl Compiler {
    /// Whether this compiler emits jumptables and doubles on a distinguished
    /// `.late_rodata` chunk after every other migrated rodata.
    #[must_use]
    pub fn allows_late_rodata(&self) -> bool {
        matches!(self, Compiler::IDO)
    }

    /// Whether a rodata symbol referenced by multiple functions may still be
    /// migrated to the first of them.
    #[must_use]
    pub fn migrates_shared_rodata(&self) -> bool {
        matches!(self, Compiler::IDO)
    }

    /// Whether a bare `j` targetting an address outside the current function
    /// should be considered a tail call, ending the function.
    #[must_use]
    pub fn plain_j_ends_function(&self) -> bool {
        matches!(
            self,
            Compiler::SN64 | Compiler::PSYQ | Compiler::MWCC | Compiler::EEGCC
        )
    }

    /// The alignment directive exponent that must precede a symbol of the
    /// given type for the bytes to line up on reassembly.
    #[must_use]
    pub fn prev_align_for_type(&self, sym_type: SymbolType) -> Option<u8> {
        match self {
            Compiler::IDO => match sym_type {
                SymbolType::CString => Some(2),
                _ => None,
            },
            _ => match sym_type {
                SymbolType::Jumptable | SymbolType::Float64 => Some(3),
                SymbolType::CString | SymbolType::PascalString => Some(2),
                _ => None,
            },
        }
    }

    #[must_use]
    pub fn default_encoding_for(&self, section_type: SectionType) -> Encoding {
        match (self, section_type) {
            (Compiler::IDO, SectionType::Rodata) => Encoding::EucJp,
            _ => Encoding::Ascii,
        }
    }
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use super::{RelocReferencedSym, RelocationInfo};

/// Relocation kinds the emitter knows how to spell out.
///
/// Most of these mirror the ELF MIPS relocation types. The two `R_CUSTOM_`
/// ones do not exist on any ABI: they keep track of paired constants so the
/// emitter can reproduce a `lui`/`ori` pair that does not reference any
/// symbol.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelocationType {
    R_MIPS_NONE,
    R_MIPS_16,
    R_MIPS_32,
    R_MIPS_26,
    R_MIPS_HI16,
    R_MIPS_LO16,
    R_MIPS_GPREL16,
    R_MIPS_LITERAL,
    R_MIPS_GOT16,
    R_MIPS_PC16,
    R_MIPS_CALL16,
    R_MIPS_GPREL32,
    R_MIPS_GOT_HI16,
    R_MIPS_GOT_LO16,
    R_MIPS_CALL_HI16,
    R_MIPS_CALL_LO16,

    R_CUSTOM_CONSTANT_HI,
    R_CUSTOM_CONSTANT_LO,
}

impl RelocationType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RelocationType::R_MIPS_NONE => "R_MIPS_NONE",
            RelocationType::R_MIPS_16 => "R_MIPS_16",
            RelocationType::R_MIPS_32 => "R_MIPS_32",
            RelocationType::R_MIPS_26 => "R_MIPS_26",
            RelocationType::R_MIPS_HI16 => "R_MIPS_HI16",
            RelocationType::R_MIPS_LO16 => "R_MIPS_LO16",
            RelocationType::R_MIPS_GPREL16 => "R_MIPS_GPREL16",
            RelocationType::R_MIPS_LITERAL => "R_MIPS_LITERAL",
            RelocationType::R_MIPS_GOT16 => "R_MIPS_GOT16",
            RelocationType::R_MIPS_PC16 => "R_MIPS_PC16",
            RelocationType::R_MIPS_CALL16 => "R_MIPS_CALL16",
            RelocationType::R_MIPS_GPREL32 => "R_MIPS_GPREL32",
            RelocationType::R_MIPS_GOT_HI16 => "R_MIPS_GOT_HI16",
            RelocationType::R_MIPS_GOT_LO16 => "R_MIPS_GOT_LO16",
            RelocationType::R_MIPS_CALL_HI16 => "R_MIPS_CALL_HI16",
            RelocationType::R_MIPS_CALL_LO16 => "R_MIPS_CALL_LO16",
            RelocationType::R_CUSTOM_CONSTANT_HI => "R_CUSTOM_CONSTANT_HI",
            RelocationType::R_CUSTOM_CONSTANT_LO => "R_CUSTOM_CONSTANT_LO",
        }
    }

    /// The operator wrapped around the symbol on an instruction operand,
    /// like `%hi`. `None` when the operand is the bare symbol (or no symbol
    /// at all).
    #[must_use]
    pub fn percent_operator(&self) -> Option<&'static str> {
        match self {
            RelocationType::R_MIPS_HI16 | RelocationType::R_CUSTOM_CONSTANT_HI => Some("%hi"),
            RelocationType::R_MIPS_LO16 | RelocationType::R_CUSTOM_CONSTANT_LO => Some("%lo"),
            RelocationType::R_MIPS_GPREL16 | RelocationType::R_MIPS_LITERAL => Some("%gp_rel"),
            RelocationType::R_MIPS_GOT16 => Some("%got"),
            RelocationType::R_MIPS_CALL16 => Some("%call16"),
            RelocationType::R_MIPS_GOT_HI16 => Some("%got_hi"),
            RelocationType::R_MIPS_GOT_LO16 => Some("%got_lo"),
            RelocationType::R_MIPS_CALL_HI16 => Some("%call_hi"),
            RelocationType::R_MIPS_CALL_LO16 => Some("%call_lo"),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, RelocationType::R_MIPS_NONE)
    }

    /// Whether this relocation is resolved through the global offset table.
    #[must_use]
    pub fn is_got(&self) -> bool {
        matches!(
            self,
            RelocationType::R_MIPS_GOT16
                | RelocationType::R_MIPS_CALL16
                | RelocationType::R_MIPS_GOT_HI16
                | RelocationType::R_MIPS_GOT_LO16
                | RelocationType::R_MIPS_CALL_HI16
                | RelocationType::R_MIPS_CALL_LO16
        )
    }

    #[must_use]
    pub fn new_reloc_info(self, referenced_sym: RelocReferencedSym) -> RelocationInfo {
        RelocationInfo::new(self, referenced_sym)
    }
}

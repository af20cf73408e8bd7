/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt::Write;

use rabbitizer::Vram;

use crate::{
    collections::FindSettings, context::Context, parent_segment_info::ParentSegmentInfo,
};

use super::RelocationType;

/// What a relocation points at: either an address the context may know a
/// symbol for, or a raw name with an addend.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelocReferencedSym {
    Address(Vram),
    SymName(Arc<str>, i32),
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelocationInfo {
    reloc_type: RelocationType,
    referenced_sym: RelocReferencedSym,
}

impl RelocationInfo {
    #[must_use]
    pub(crate) fn new(reloc_type: RelocationType, referenced_sym: RelocReferencedSym) -> Self {
        Self {
            reloc_type,
            referenced_sym,
        }
    }

    #[must_use]
    pub fn reloc_type(&self) -> RelocationType {
        self.reloc_type
    }

    #[must_use]
    pub fn referenced_sym(&self) -> &RelocReferencedSym {
        &self.referenced_sym
    }

    /// Builds the operand text for this relocation, like `%lo(sym + 0x10)`.
    ///
    /// Returns `None` when the relocation can't be spelled as an operand:
    /// either it is `R_MIPS_NONE` (the raw value must be kept) or it points
    /// at an address no segment knows a symbol for.
    #[must_use]
    pub fn display_str(
        &self,
        context: &Context,
        parent_segment_info: &ParentSegmentInfo,
    ) -> Option<String> {
        if self.reloc_type.is_none() {
            return None;
        }

        let sym_text = self.resolve_sym_text(context, parent_segment_info)?;

        Some(match self.reloc_type.percent_operator() {
            Some(operator) => format!("{}({})", operator, sym_text),
            None => sym_text,
        })
    }

    /// The symbol-plus-addend text alone, without any `%` operator. Used by
    /// the gp-rel expansion hack, which spells the raw symbol.
    #[must_use]
    pub(crate) fn display_bare_str(
        &self,
        context: &Context,
        parent_segment_info: &ParentSegmentInfo,
    ) -> Option<String> {
        self.resolve_sym_text(context, parent_segment_info)
    }

    fn resolve_sym_text(
        &self,
        context: &Context,
        parent_segment_info: &ParentSegmentInfo,
    ) -> Option<String> {
        let (name, addend) = match &self.referenced_sym {
            RelocReferencedSym::SymName(name, addend) => (name.to_string(), *addend),
            RelocReferencedSym::Address(vram) => {
                let segment = context.find_referenced_segment(*vram, parent_segment_info)?;
                let metadata = segment.find_symbol(*vram, FindSettings::new(true))?;
                if !metadata.allowed_to_be_referenced() {
                    return None;
                }

                let addend = vram.sub_vram_signed(&metadata.vram()).inner();
                (
                    metadata
                        .display_name()
                        .with_naming(context.global_config())
                        .to_string(),
                    addend,
                )
            }
        };

        let mut sym_text = name;
        if addend > 0 {
            write!(sym_text, " + 0x{:X}", addend).ok()?;
        } else if addend < 0 {
            write!(sym_text, " - 0x{:X}", -(addend as i64)).ok()?;
        }

        Some(sym_text)
    }
}

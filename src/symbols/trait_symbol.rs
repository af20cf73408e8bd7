/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::Vram;

use crate::{
    addresses::{AddressRange, RomVramRange},
    collections::FindSettings,
    context::Context,
    metadata::SymbolMetadata,
    parent_segment_info::ParentSegmentInfo,
    relocation::RelocationInfo,
    section_type::SectionType,
};

use super::display::SymDisplayError;

pub trait Symbol {
    fn vram_range(&self) -> &AddressRange<Vram>;

    fn parent_segment_info(&self) -> &ParentSegmentInfo;

    #[must_use]
    fn section_type(&self) -> SectionType;

    /// This symbol's own entry on the context.
    fn find_own_metadata<'ctx>(
        &self,
        context: &'ctx Context,
    ) -> Result<&'ctx SymbolMetadata, SymDisplayError> {
        let owned_segment = context.find_owned_segment(self.parent_segment_info())?;
        owned_segment
            .find_symbol(
                self.vram_range().start(),
                FindSettings::new(false),
            )
            .ok_or(SymDisplayError::SelfSymbolNotFound {
                vram: self.vram_range().start(),
            })
    }
}

/// Symbols that exist on the ROM image (anything but bss).
pub trait RomSymbol: Symbol {
    #[must_use]
    fn rom_vram_range(&self) -> &RomVramRange;

    /// One slot per word (or per instruction), holding the relocation the
    /// emitter must spell on that spot.
    #[must_use]
    fn relocs(&self) -> &[Option<RelocationInfo>];
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::Vram;

use crate::{
    addresses::{AddressRange, RomVramRange},
    collections::UnorderedSet,
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::Symbol,
};

pub trait Section {
    fn name(&self) -> &str;

    fn vram_range(&self) -> &AddressRange<Vram>;

    fn parent_segment_info(&self) -> &ParentSegmentInfo;

    #[must_use]
    fn section_type(&self) -> SectionType;

    fn symbol_list(&self) -> &[impl Symbol];

    fn symbols_vrams(&self) -> &UnorderedSet<Vram>;
}

/// Sections with backing bytes on the ROM image.
pub trait RomSection: Section {
    fn rom_vram_range(&self) -> &RomVramRange;
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::{error, fmt};

use rabbitizer::Vram;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    collections::{AddendedOrderedMap, FindSettings},
    section_type::SectionType,
};

use super::{GeneratedBy, OverlayCategoryName, SymbolMetadata, SymbolType};

/// Addresses which must never be treated as symbols, no matter what the
/// bytes look like. `0x0` and `0x7FFFFFFF` show up constantly as trap
/// immediates and sentinel values.
const DEFAULT_BANNED_VRAMS: [u32; 2] = [0x0, 0x7FFFFFFF];

/// The symbols of a single segment, either the global one or an overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMetadata {
    ranges: RomVramRange,
    name: Option<Arc<str>>,
    category_name: Option<OverlayCategoryName>,

    symbols: AddendedOrderedMap<Vram, SymbolMetadata>,

    ignored_ranges: Vec<AddressRange<Vram>>,
    prioritised_overlays: Vec<Arc<str>>,
}

impl SegmentMetadata {
    pub(crate) fn new(
        ranges: RomVramRange,
        name: Option<Arc<str>>,
        category_name: Option<OverlayCategoryName>,
        symbols: AddendedOrderedMap<Vram, SymbolMetadata>,
        ignored_ranges: Vec<AddressRange<Vram>>,
        prioritised_overlays: Vec<Arc<str>>,
    ) -> Self {
        Self {
            ranges,
            name,
            category_name,
            symbols,
            ignored_ranges,
            prioritised_overlays,
        }
    }

    #[must_use]
    pub const fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn category_name(&self) -> Option<&OverlayCategoryName> {
        self.category_name.as_ref()
    }

    #[must_use]
    pub fn in_vram_range(&self, vram: Vram) -> bool {
        self.ranges.in_vram_range(vram)
    }

    #[must_use]
    pub fn in_rom_range(&self, rom: Rom) -> bool {
        self.ranges.in_rom_range(rom)
    }

    #[must_use]
    pub fn is_vram_ignored(&self, vram: Vram) -> bool {
        if DEFAULT_BANNED_VRAMS.contains(&vram.inner()) {
            return true;
        }
        self.ignored_ranges.iter().any(|x| x.in_range(vram))
    }

    pub fn add_ignored_range(&mut self, range: AddressRange<Vram>) {
        self.ignored_ranges.push(range);
    }

    #[must_use]
    pub fn prioritised_overlays(&self) -> &[Arc<str>] {
        &self.prioritised_overlays
    }

    #[must_use]
    pub fn symbols(&self) -> &AddendedOrderedMap<Vram, SymbolMetadata> {
        &self.symbols
    }

    #[must_use]
    pub fn find_symbol(&self, vram: Vram, settings: FindSettings) -> Option<&SymbolMetadata> {
        self.symbols.find(vram, settings)
    }

    #[must_use]
    pub fn find_symbol_mut(
        &mut self,
        vram: Vram,
        settings: FindSettings,
    ) -> Option<&mut SymbolMetadata> {
        self.symbols.find_mut(vram, settings)
    }

    pub fn find_symbols_range(
        &self,
        range: AddressRange<Vram>,
    ) -> btree_map::Range<'_, Vram, SymbolMetadata> {
        self.symbols.range(range.start()..range.end())
    }
}

impl SegmentMetadata {
    /// Fetches the symbol at `vram`, creating an autogenerated one if no
    /// symbol claims that address yet.
    ///
    /// With `allow_addend` the address may land inside an already-known
    /// sized symbol, which is then returned instead of creating a new one.
    pub fn add_symbol(
        &mut self,
        vram: Vram,
        allow_addend: bool,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        if self.is_vram_ignored(vram) {
            return Err(AddSymbolError::IgnoredAddress {
                vram,
                segment_name: self.name.clone(),
            });
        }
        if !self.in_vram_range(vram) {
            return Err(AddSymbolError::VramOutOfRange {
                vram,
                segment_name: self.name.clone(),
                segment_range: *self.ranges.vram(),
            });
        }

        let in_overlay = self.category_name.is_some();
        let (sym, newly_created) = self.symbols.find_mut_or_insert_with(
            vram,
            FindSettings::new(allow_addend),
            || (vram, SymbolMetadata::new(GeneratedBy::Autogenerated, vram)),
        );
        if newly_created {
            sym.set_in_overlay(in_overlay);
        }
        Ok(sym)
    }

    /// Registers the symbol a section analyzer just materialized for itself,
    /// stamping everything that is known for sure at that point.
    pub(crate) fn add_self_symbol(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        size: Size,
        section_type: SectionType,
        sym_type: Option<SymbolType>,
        trailing_padding: impl FnOnce(&SymbolMetadata) -> Size,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        let metadata = self.add_symbol(vram, false)?;
        metadata.update_rom(rom);
        *metadata.autodetected_size_mut() = Some(size);
        metadata.update_section_type(Some(section_type));
        if let Some(sym_type) = sym_type {
            metadata.set_type_with_priorities(sym_type, GeneratedBy::Autogenerated);
        }
        metadata.set_defined();

        let padding = trailing_padding(metadata);
        metadata.set_trailing_padding_size(padding);

        Ok(metadata)
    }

    pub fn add_function(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        let sym = self.add_symbol(vram, false)?;
        sym.update_rom(rom);
        sym.set_type_with_priorities(SymbolType::Function, generated_by);
        sym.update_section_type(Some(SectionType::Text));
        Ok(sym)
    }

    pub fn add_branch_label(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        let sym = self.add_symbol(vram, false)?;
        sym.update_rom(rom);
        sym.set_type_with_priorities(SymbolType::BranchLabel, generated_by);
        sym.update_section_type(Some(SectionType::Text));
        Ok(sym)
    }

    pub fn add_jumptable(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        let sym = self.add_symbol(vram, false)?;
        sym.update_rom(rom);
        sym.set_type_with_priorities(SymbolType::Jumptable, generated_by);
        Ok(sym)
    }

    pub fn add_jumptable_label(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        let sym = self.add_symbol(vram, false)?;
        sym.update_rom(rom);
        sym.set_type_with_priorities(SymbolType::JumptableLabel, generated_by);
        sym.update_section_type(Some(SectionType::Text));
        Ok(sym)
    }

    pub fn add_gcc_except_table(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        let sym = self.add_symbol(vram, false)?;
        sym.update_rom(rom);
        sym.set_type_with_priorities(SymbolType::GccExceptTable, generated_by);
        sym.update_section_type(Some(SectionType::GccExceptTable));
        Ok(sym)
    }

    pub fn add_gcc_except_table_label(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> Result<&mut SymbolMetadata, AddSymbolError> {
        let sym = self.add_symbol(vram, false)?;
        sym.update_rom(rom);
        sym.set_type_with_priorities(SymbolType::GccExceptTableLabel, generated_by);
        sym.update_section_type(Some(SectionType::Text));
        Ok(sym)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AddSymbolError {
    IgnoredAddress {
        vram: Vram,
        segment_name: Option<Arc<str>>,
    },
    VramOutOfRange {
        vram: Vram,
        segment_name: Option<Arc<str>>,
        segment_range: AddressRange<Vram>,
    },
}

impl fmt::Display for AddSymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn segment(f: &mut fmt::Formatter<'_>, name: &Option<Arc<str>>) -> fmt::Result {
            if let Some(name) = name {
                write!(f, "overlay segment '{}'", name)
            } else {
                write!(f, "global segment")
            }
        }

        match self {
            AddSymbolError::IgnoredAddress { vram, segment_name } => {
                write!(f, "Can't add a symbol at banned address 0x{} to the ", vram)?;
                segment(f, segment_name)
            }
            AddSymbolError::VramOutOfRange {
                vram,
                segment_name,
                segment_range,
            } => {
                write!(
                    f,
                    "Address 0x{} is outside the vram range ({}) of the ",
                    vram, segment_range
                )?;
                segment(f, segment_name)
            }
        }
    }
}
impl error::Error for AddSymbolError {}

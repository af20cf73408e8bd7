/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::{error, fmt};

use rabbitizer::Vram;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    collections::{AddendedOrderedMap, FindSettings},
    metadata::{GeneratedBy, OverlayCategoryName, SegmentMetadata, SymbolMetadata, SymbolType},
};

#[derive(Debug, Clone, PartialEq)]
struct SegmentBuilder {
    ranges: RomVramRange,
    name: Option<Arc<str>>,
    category_name: Option<OverlayCategoryName>,
    prioritised_overlays: Vec<Arc<str>>,
    ignored_ranges: Vec<AddressRange<Vram>>,
    user_symbols: AddendedOrderedMap<Vram, SymbolMetadata>,
}

impl SegmentBuilder {
    fn new(
        ranges: RomVramRange,
        name: Option<Arc<str>>,
        category_name: Option<OverlayCategoryName>,
    ) -> Self {
        Self {
            ranges,
            name,
            category_name,
            prioritised_overlays: Vec::new(),
            ignored_ranges: Vec::new(),
            user_symbols: AddendedOrderedMap::new(),
        }
    }

    fn add_prioritised_overlay(&mut self, segment_name: Arc<str>) {
        self.prioritised_overlays.push(segment_name);
    }

    fn add_ignored_range(&mut self, range: AddressRange<Vram>) {
        self.ignored_ranges.push(range);
    }

    fn add_user_symbol(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<Rom>,
        sym_type: Option<SymbolType>,
    ) -> Result<&mut SymbolMetadata, AddUserSymbolError> {
        if let Some(rom) = rom {
            if !self.ranges.in_rom_range(rom) {
                return Err(AddUserSymbolError::RomOutOfRange {
                    name,
                    vram,
                    segment_name: self.name.clone(),
                    rom,
                    segment_range: *self.ranges.rom(),
                });
            }
        }

        if !self.ranges.in_vram_range(vram) {
            return Err(AddUserSymbolError::VramOutOfRange {
                name,
                vram,
                segment_name: self.name.clone(),
                segment_range: *self.ranges.vram(),
            });
        }

        let check_addend = !sym_type.is_some_and(|x| x.is_label());

        let (sym, newly_created) = self.user_symbols.find_mut_or_insert_with(
            vram,
            FindSettings::new(check_addend),
            || (vram, SymbolMetadata::new(GeneratedBy::UserDeclared, vram)),
        );

        if sym.vram() != vram
            && !(sym.is_trustable_function() && sym_type.is_some_and(|x| x.is_label()))
        {
            Err(AddUserSymbolError::Overlap {
                name,
                vram,
                segment_name: self.name.clone(),
                other_name: sym.display_name().to_string(),
                other_vram: sym.vram(),
                other_size: sym.size_or_aligned_default(),
            })
        } else if !newly_created {
            Err(AddUserSymbolError::Duplicated {
                name,
                vram,
                segment_name: self.name.clone(),
                other_name: sym.display_name().to_string(),
                other_vram: sym.vram(),
            })
        } else {
            *sym.user_declared_name_mut() = Some(name);
            *sym.rom_mut() = rom;
            if let Some(sym_type) = sym_type {
                sym.set_type_with_priorities(sym_type, GeneratedBy::UserDeclared);
            }
            Ok(sym)
        }
    }

    fn finish_symbols(self) -> SegmentMetadata {
        SegmentMetadata::new(
            self.ranges,
            self.name,
            self.category_name,
            self.user_symbols,
            self.ignored_ranges,
            self.prioritised_overlays,
        )
    }
}

/// Collects everything known about the global segment before analysis
/// starts: user symbols, banned ranges, prioritised overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSegmentBuilder {
    inner: SegmentBuilder,
}

impl GlobalSegmentBuilder {
    pub fn new(ranges: RomVramRange) -> Self {
        Self {
            inner: SegmentBuilder::new(ranges, None, None),
        }
    }

    pub fn add_prioritised_overlay(&mut self, segment_name: Arc<str>) {
        self.inner.add_prioritised_overlay(segment_name);
    }

    pub fn add_ignored_range(&mut self, range: AddressRange<Vram>) {
        self.inner.add_ignored_range(range);
    }

    pub fn add_user_symbol(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<Rom>,
        sym_type: Option<SymbolType>,
    ) -> Result<&mut SymbolMetadata, AddUserSymbolError> {
        self.inner.add_user_symbol(name, vram, rom, sym_type)
    }

    #[must_use]
    pub fn finish_symbols(self) -> SegmentMetadata {
        self.inner.finish_symbols()
    }
}

/// Same as [`GlobalSegmentBuilder`], for a single overlay segment.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySegmentBuilder {
    inner: SegmentBuilder,
}

impl OverlaySegmentBuilder {
    pub fn new(
        ranges: RomVramRange,
        category_name: OverlayCategoryName,
        segment_name: Arc<str>,
    ) -> Self {
        Self {
            inner: SegmentBuilder::new(ranges, Some(segment_name), Some(category_name)),
        }
    }

    pub fn add_prioritised_overlay(&mut self, segment_name: Arc<str>) {
        self.inner.add_prioritised_overlay(segment_name);
    }

    pub fn add_ignored_range(&mut self, range: AddressRange<Vram>) {
        self.inner.add_ignored_range(range);
    }

    pub fn add_user_symbol(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<Rom>,
        sym_type: Option<SymbolType>,
    ) -> Result<&mut SymbolMetadata, AddUserSymbolError> {
        self.inner.add_user_symbol(name, vram, rom, sym_type)
    }

    #[must_use]
    pub fn finish_symbols(self) -> SegmentMetadata {
        self.inner.finish_symbols()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AddUserSymbolError {
    VramOutOfRange {
        name: String,
        vram: Vram,
        segment_name: Option<Arc<str>>,
        segment_range: AddressRange<Vram>,
    },
    RomOutOfRange {
        name: String,
        vram: Vram,
        segment_name: Option<Arc<str>>,
        rom: Rom,
        segment_range: AddressRange<Rom>,
    },
    Overlap {
        name: String,
        vram: Vram,
        segment_name: Option<Arc<str>>,
        other_name: String,
        other_vram: Vram,
        other_size: Size,
    },
    Duplicated {
        name: String,
        vram: Vram,
        segment_name: Option<Arc<str>>,
        other_name: String,
        other_vram: Vram,
    },
}

impl fmt::Display for AddUserSymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn segment(f: &mut fmt::Formatter<'_>, name: &Option<Arc<str>>) -> fmt::Result {
            match name {
                Some(name) => write!(f, "segment '{}'", name),
                None => write!(f, "the global segment"),
            }
        }

        match self {
            AddUserSymbolError::VramOutOfRange {
                name,
                vram,
                segment_name,
                segment_range,
            } => {
                write!(f, "Symbol '{}' (0x{}) is outside the vram range ({}) of ", name, vram, segment_range)?;
                segment(f, segment_name)
            }
            AddUserSymbolError::RomOutOfRange {
                name,
                vram,
                segment_name,
                rom,
                segment_range,
            } => {
                write!(f, "Symbol '{}' (0x{}, rom {}) is outside the rom range ({}) of ", name, vram, rom, segment_range)?;
                segment(f, segment_name)
            }
            AddUserSymbolError::Overlap {
                name,
                vram,
                segment_name,
                other_name,
                other_vram,
                other_size,
            } => {
                write!(
                    f,
                    "Symbol '{}' (0x{}) overlaps '{}' (0x{}, size {}) on ",
                    name, vram, other_name, other_vram, other_size
                )?;
                segment(f, segment_name)
            }
            AddUserSymbolError::Duplicated {
                name,
                vram,
                segment_name,
                other_name,
                other_vram,
            } => {
                write!(
                    f,
                    "Symbol '{}' (0x{}) is already declared as '{}' (0x{}) on ",
                    name, vram, other_name, other_vram
                )?;
                segment(f, segment_name)
            }
        }
    }
}
impl error::Error for AddUserSymbolError {}

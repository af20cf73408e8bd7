/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::BTreeMap;
use alloc::vec::Vec;
use core::hash;

use rabbitizer::Vram;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    config::Compiler,
    context::Context,
    metadata::{GeneratedBy, ParentSectionMetadata, SymbolMetadata, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    relocation::{RelocReferencedSym, RelocationInfo, RelocationType},
    section_type::SectionType,
    str_decoding::Encoding,
};

use super::{
    display::{InternalSymDisplSettings, SymDataDisplay, SymDataDisplaySettings, SymDisplayError},
    trait_symbol::RomSymbol,
    Symbol, SymbolCreationError,
};

/// A single data, rodata or exception-table symbol, with its raw bytes and
/// the relocations discovered for each of its words.
#[derive(Debug, Clone)]
pub struct DataSym {
    ranges: RomVramRange,
    raw_bytes: Vec<u8>,
    parent_segment_info: ParentSegmentInfo,
    section_type: SectionType,
    relocs: Vec<Option<RelocationInfo>>,

    encoding: Encoding,
}

impl DataSym {
    pub(crate) fn new(
        context: &mut Context,
        raw_bytes: Vec<u8>,
        rom: Rom,
        vram: Vram,
        _in_section_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        section_type: SectionType,
        properties: DataSymProperties,
    ) -> Result<Self, SymbolCreationError> {
        let size = Size::new(raw_bytes.len() as u32);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        let mut relocs = vec![None; raw_bytes.len() / 4];

        let endian = context.global_config().endian();

        let owned_segment = context.find_owned_segment_mut(&parent_segment_info)?;
        let metadata = owned_segment.add_self_symbol(
            vram,
            Some(rom),
            size,
            section_type,
            properties.detected_type,
            |_metadata| Size::new(0),
        )?;

        let encoding = properties.encoding;
        properties.apply_to_metadata(metadata);

        let sym_type = metadata.sym_type();
        let table_owner = metadata.reference_functions().iter().next().copied();

        let should_search_for_address = sym_type.is_none_or(|x| x.can_reference_symbols())
            && metadata.allowed_to_reference_symbols();
        let is_table = sym_type.is_some_and(|x| x.is_table());

        if rom.inner() % 4 == 0 && should_search_for_address {
            // The extent of a table is bounded by the function that uses it:
            // entries must be labels inside that single function.
            let owner_range = table_owner.and_then(|owner_vram| {
                let owner = owned_segment.find_symbol(
                    owner_vram,
                    crate::collections::FindSettings::new(false),
                )?;
                let owner_size = owner.size()?;
                Some(AddressRange::new(owner_vram, owner_vram + owner_size))
            });

            let mut table_ended = false;

            for (i, word_bytes) in raw_bytes.chunks_exact(4).enumerate() {
                let word = endian.word_from_bytes(word_bytes);
                let word_vram = Vram::new(word);
                let word_rom = rom + Size::new(i as u32 * 4);

                if is_table && !table_ended {
                    let valid_entry = word % 4 == 0
                        && owner_range.as_ref().is_none_or(|x| x.in_range(word_vram))
                        && owned_segment.in_vram_range(word_vram)
                        && !owned_segment.is_vram_ignored(word_vram);

                    if valid_entry {
                        let label = if section_type == SectionType::GccExceptTable {
                            owned_segment.add_gcc_except_table_label(
                                word_vram,
                                None,
                                GeneratedBy::Autogenerated,
                            )?
                        } else {
                            owned_segment.add_jumptable_label(
                                word_vram,
                                None,
                                GeneratedBy::Autogenerated,
                            )?
                        };
                        label.add_reference_symbol(vram, word_rom);

                        relocs[i] = Some(
                            RelocationType::R_MIPS_32
                                .new_reloc_info(RelocReferencedSym::Address(word_vram)),
                        );
                        continue;
                    }
                    table_ended = true;
                }

                if owned_segment.is_vram_ignored(word_vram) {
                    continue;
                }

                if owned_segment.in_vram_range(word_vram) {
                    let sym_metadata = owned_segment.add_symbol(word_vram, true)?;
                    sym_metadata.add_reference_symbol(vram, word_rom);

                    relocs[i] = Some(
                        RelocationType::R_MIPS_32
                            .new_reloc_info(RelocReferencedSym::Address(word_vram)),
                    );
                }
            }
        }

        Ok(Self {
            ranges,
            raw_bytes,
            parent_segment_info,
            section_type,
            relocs,

            encoding,
        })
    }
}

impl DataSym {
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Replaces autodetected relocs with user-provided ones, one per word.
    pub fn apply_user_relocs(&mut self, user_relocs: &BTreeMap<Rom, RelocationInfo>) {
        let rom_range = *self.ranges.rom();
        for (rom, reloc) in user_relocs.range(rom_range.start()..rom_range.end()) {
            let index = ((*rom - rom_range.start()).inner() / 4) as usize;
            if index < self.relocs.len() {
                self.relocs[index] = Some(reloc.clone());
            }
        }
    }
}

impl<'ctx, 'sym, 'flg> DataSym {
    pub fn display(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg SymDataDisplaySettings,
    ) -> Result<SymDataDisplay<'ctx, 'sym, 'flg>, SymDisplayError> {
        SymDataDisplay::new(context, self, settings)
    }

    pub(crate) fn display_internal(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg SymDataDisplaySettings,
        internal_settings: InternalSymDisplSettings,
    ) -> Result<SymDataDisplay<'ctx, 'sym, 'flg>, SymDisplayError> {
        SymDataDisplay::new_internal(context, self, settings, internal_settings)
    }
}

impl Symbol for DataSym {
    fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    #[must_use]
    fn section_type(&self) -> SectionType {
        self.section_type
    }
}

impl RomSymbol for DataSym {
    #[must_use]
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }

    fn relocs(&self) -> &[Option<RelocationInfo>] {
        &self.relocs
    }
}

impl hash::Hash for DataSym {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.parent_segment_info.hash(state);
        self.ranges.hash(state);
    }
}
impl PartialEq for DataSym {
    fn eq(&self, other: &Self) -> bool {
        self.parent_segment_info == other.parent_segment_info && self.ranges == other.ranges
    }
}
impl PartialOrd for DataSym {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        // Compare segment info first, so symbols get sorted by segment
        match self
            .parent_segment_info
            .partial_cmp(&other.parent_segment_info)
        {
            Some(core::cmp::Ordering::Equal) => {}
            ord => return ord,
        }
        self.ranges.partial_cmp(&other.ranges)
    }
}

#[derive(Debug, Clone, Hash, PartialEq)]
pub(crate) struct DataSymProperties {
    pub parent_metadata: ParentSectionMetadata,
    pub compiler: Option<Compiler>,
    pub auto_pad_by: Option<Vram>,
    pub detected_type: Option<SymbolType>,
    pub encoding: Encoding,
}

impl DataSymProperties {
    fn apply_to_metadata(self, metadata: &mut SymbolMetadata) {
        metadata.set_parent_metadata(self.parent_metadata);

        if let Some(compiler) = self.compiler {
            metadata.set_compiler(compiler);
        }

        if let Some(auto_pad_by) = self.auto_pad_by {
            metadata.set_auto_created_pad_by(auto_pad_by);
        }

        if let Some(detected_type) = self.detected_type {
            metadata.set_type(detected_type, GeneratedBy::Autogenerated);
        }
    }
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::{btree_map::BTreeMap, btree_set::BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;

use rabbitizer::Vram;

use crate::{
    addresses::AddressRange,
    collections::UnorderedSet,
    config::Compiler,
    context::Context,
    metadata::ParentSectionMetadata,
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::{NoloadSym, NoloadSymProperties, Symbol},
};

use super::{Section, SectionCreationError};

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SectionNoloadSettings {
    compiler: Option<Compiler>,
}

impl SectionNoloadSettings {
    pub fn new(compiler: Option<Compiler>) -> Self {
        Self { compiler }
    }

    #[must_use]
    pub fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }
}

/// A bss section: no bytes, only a vram range carved into symbols.
#[derive(Debug, Clone)]
#[must_use]
pub struct SectionNoload {
    name: Arc<str>,

    vram_range: AddressRange<Vram>,

    parent_segment_info: ParentSegmentInfo,

    noload_symbols: Vec<NoloadSym>,

    symbol_vrams: UnorderedSet<Vram>,
}

impl SectionNoload {
    pub fn new(
        context: &mut Context,
        settings: &SectionNoloadSettings,
        name: Arc<str>,
        vram_range: AddressRange<Vram>,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, SectionCreationError> {
        if vram_range.size().inner() == 0 {
            return Err(SectionCreationError::EmptySection {
                name,
                vram: vram_range.start(),
            });
        }

        let owned_segment = context.find_owned_segment(&parent_segment_info)?;

        let mut symbols_info = BTreeSet::new();
        // Ensure there's a symbol at the beginning of the section.
        symbols_info.insert(vram_range.start());

        let mut auto_pads: BTreeMap<Vram, Vram> = BTreeMap::new();

        for (sym_vram, sym) in owned_segment.find_symbols_range(vram_range) {
            symbols_info.insert(*sym_vram);

            if let Some(size) = sym.user_declared_size() {
                let next_vram = sym.vram() + size;
                if next_vram != vram_range.end() && vram_range.in_range(next_vram) {
                    // Avoid generating a symbol at the end of the section
                    symbols_info.insert(next_vram);
                    auto_pads.insert(next_vram, sym.vram());
                }
            }
        }

        let symbols_info_vec: Vec<Vram> = symbols_info.into_iter().collect();

        let mut noload_symbols = Vec::with_capacity(symbols_info_vec.len());
        let mut symbol_vrams = UnorderedSet::new();

        for (i, new_sym_vram) in symbols_info_vec.iter().enumerate() {
            let start = new_sym_vram.sub_vram(&vram_range.start()).inner() as usize;
            let new_sym_vram_end = if i + 1 < symbols_info_vec.len() {
                symbols_info_vec[i + 1]
            } else {
                vram_range.end()
            };
            debug_assert!(
                *new_sym_vram < new_sym_vram_end,
                "{:?} {} {}",
                vram_range,
                new_sym_vram,
                new_sym_vram_end
            );

            symbol_vrams.insert(*new_sym_vram);

            let properties = NoloadSymProperties {
                parent_metadata: ParentSectionMetadata::new(
                    name.clone(),
                    vram_range.start(),
                    parent_segment_info.clone(),
                ),
                compiler: settings.compiler,
                auto_pad_by: auto_pads.get(new_sym_vram).copied(),
            };
            let sym = NoloadSym::new(
                context,
                AddressRange::new(*new_sym_vram, new_sym_vram_end),
                start,
                parent_segment_info.clone(),
                properties,
            )?;

            noload_symbols.push(sym);
        }

        Ok(Self {
            name,
            vram_range,
            parent_segment_info,
            noload_symbols,
            symbol_vrams,
        })
    }

    pub fn noload_symbols(&self) -> &[NoloadSym] {
        &self.noload_symbols
    }
}

impl Section for SectionNoload {
    fn name(&self) -> &str {
        &self.name
    }

    fn vram_range(&self) -> &AddressRange<Vram> {
        &self.vram_range
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    #[must_use]
    fn section_type(&self) -> SectionType {
        SectionType::Bss
    }

    fn symbol_list(&self) -> &[impl Symbol] {
        &self.noload_symbols
    }

    fn symbols_vrams(&self) -> &UnorderedSet<Vram> {
        &self.symbol_vrams
    }
}

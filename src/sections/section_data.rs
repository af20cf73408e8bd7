/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use rabbitizer::Vram;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    analysis::StringGuesserLevel,
    collections::{FindSettings, UnorderedMap, UnorderedSet},
    config::{Compiler, Endian},
    context::Context,
    metadata::{ParentSectionMetadata, SegmentMetadata, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    str_decoding::Encoding,
    symbols::{DataSym, DataSymProperties, Symbol},
};

use super::{RomSection, Section, SectionCreationError};

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SectionDataSettings {
    compiler: Option<Compiler>,
    string_guesser_level: StringGuesserLevel,
    pascal_string_guesser_level: StringGuesserLevel,
    encoding: Encoding,
}

impl SectionDataSettings {
    pub fn new(compiler: Option<Compiler>) -> Self {
        Self {
            compiler,
            string_guesser_level: StringGuesserLevel::default(),
            pascal_string_guesser_level: StringGuesserLevel::Disabled,
            encoding: Encoding::default(),
        }
    }

    #[must_use]
    pub fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }

    #[must_use]
    pub fn string_guesser_level(&self) -> StringGuesserLevel {
        self.string_guesser_level
    }
    pub fn set_string_guesser_level(&mut self, string_guesser_level: StringGuesserLevel) {
        self.string_guesser_level = string_guesser_level;
    }
    #[must_use]
    pub fn with_string_guesser_level(self, string_guesser_level: StringGuesserLevel) -> Self {
        Self {
            string_guesser_level,
            ..self
        }
    }

    #[must_use]
    pub fn pascal_string_guesser_level(&self) -> StringGuesserLevel {
        self.pascal_string_guesser_level
    }
    #[must_use]
    pub fn with_pascal_string_guesser_level(
        self,
        pascal_string_guesser_level: StringGuesserLevel,
    ) -> Self {
        Self {
            pascal_string_guesser_level,
            ..self
        }
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }
    #[must_use]
    pub fn with_encoding(self, encoding: Encoding) -> Self {
        Self { encoding, ..self }
    }
}

/// A loaded data-like section: `.data`, `.rodata` or `.gcc_except_table`.
#[derive(Debug, Clone)]
#[must_use]
pub struct SectionData {
    name: Arc<str>,

    ranges: RomVramRange,

    parent_segment_info: ParentSegmentInfo,

    section_type: SectionType,

    data_symbols: Vec<DataSym>,

    symbol_vrams: UnorderedSet<Vram>,
}

impl SectionData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: &mut Context,
        settings: &SectionDataSettings,
        name: Arc<str>,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
        section_type: SectionType,
    ) -> Result<Self, SectionCreationError> {
        if raw_bytes.is_empty() {
            return Err(SectionCreationError::EmptySection { name, vram });
        }
        if (rom.inner() % 4) != (vram.inner() % 4) {
            return Err(SectionCreationError::RomVramAlignmentMismatch {
                name,
                rom,
                vram,
                multiple_of: 4,
            });
        }

        let size = Size::new(raw_bytes.len() as u32);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        // Ensure there's a symbol at the beginning of the section.
        context
            .find_owned_segment_mut(&parent_segment_info)?
            .add_symbol(vram, false)?;

        let owned_segment = context.find_owned_segment(&parent_segment_info)?;

        let (symbols_info_vec, auto_pads) = Self::find_symbols(
            owned_segment,
            settings,
            raw_bytes,
            vram_range,
            section_type,
            context.global_config().endian(),
        );

        let mut data_symbols = Vec::with_capacity(symbols_info_vec.len());
        let mut symbol_vrams = UnorderedSet::new();

        for (i, (new_sym_vram, sym_type)) in symbols_info_vec.iter().enumerate() {
            let start = new_sym_vram.sub_vram(&vram).inner() as usize;
            let end = if i + 1 < symbols_info_vec.len() {
                symbols_info_vec[i + 1].0.sub_vram(&vram).inner() as usize
            } else {
                raw_bytes.len()
            };
            debug_assert!(
                start < end,
                "{:?} {} {} {} {}",
                rom,
                vram,
                start,
                end,
                raw_bytes.len()
            );

            let sym_rom = rom + Size::new(start as u32);

            symbol_vrams.insert(*new_sym_vram);

            let properties = DataSymProperties {
                parent_metadata: ParentSectionMetadata::new(
                    name.clone(),
                    vram,
                    parent_segment_info.clone(),
                ),
                compiler: settings.compiler,
                auto_pad_by: auto_pads.get(new_sym_vram).copied(),
                detected_type: *sym_type,
                encoding: settings.encoding,
            };
            let sym = DataSym::new(
                context,
                raw_bytes[start..end].into(),
                sym_rom,
                *new_sym_vram,
                start,
                parent_segment_info.clone(),
                section_type,
                properties,
            )?;

            data_symbols.push(sym);
        }

        Ok(Self {
            name,
            ranges,
            parent_segment_info,
            section_type,
            data_symbols,
            symbol_vrams,
        })
    }

    /// Decides where symbols start inside this section and which type, if
    /// any, each one was detected with.
    #[allow(clippy::type_complexity)]
    fn find_symbols(
        owned_segment: &SegmentMetadata,
        settings: &SectionDataSettings,
        raw_bytes: &[u8],
        vram_range: AddressRange<Vram>,
        section_type: SectionType,
        endian: Endian,
    ) -> (Vec<(Vram, Option<SymbolType>)>, UnorderedMap<Vram, Vram>) {
        let mut symbols_info = BTreeMap::new();
        // Ensure there's a symbol at the beginning of the section.
        symbols_info.insert(vram_range.start(), None);
        let mut auto_pads = UnorderedMap::new();

        if vram_range.start().inner() % 4 != 0 || section_type == SectionType::GccExceptTable {
            // Not word-aligned, so pointer scanning would only find noise.
            // An exception table needs no scanning either: it only contains
            // tables, whose labels the symbol itself takes care of.
            for (reference_vram, reference) in owned_segment.find_symbols_range(vram_range) {
                symbols_info.insert(*reference_vram, reference.sym_type());
                if let Some(size) = reference.user_declared_size() {
                    let next_vram = *reference_vram + size;
                    if vram_range.in_range(next_vram) {
                        symbols_info.insert(next_vram, None);
                        auto_pads.insert(next_vram, *reference_vram);
                    }
                }
            }

            return (symbols_info.into_iter().collect(), auto_pads);
        }

        let mut remaining_string_size: i32 = 0;

        let mut prev_sym_info: Option<(Vram, Option<SymbolType>)> = None;
        // If true: the previous symbol made us think we may be in late_rodata
        let mut maybe_reached_late_rodata = false;
        // If true, we are sure we are in late_rodata
        let mut reached_late_rodata = false;

        let mut float_counter = 0;
        let mut float_padding_counter = 0;

        for (i, word_bytes) in raw_bytes.chunks_exact(4).enumerate() {
            let local_offset = i * 4;
            let current_vram = vram_range.start() + Size::new(local_offset as u32);

            let mid_refs: Vec<Vram> = (1..4)
                .map(|x| current_vram + Size::new(x))
                .filter(|x| {
                    owned_segment
                        .find_symbol(*x, FindSettings::new(false))
                        .is_some()
                })
                .collect();
            let current_ref = owned_segment.find_symbol(current_vram, FindSettings::new(false));

            if remaining_string_size <= 0 && mid_refs.is_empty() {
                let word = endian.word_from_bytes(word_bytes);

                let current_type = match current_ref {
                    None => prev_sym_info.and_then(|x| x.1),
                    Some(reference) => reference.sym_type(),
                };

                if maybe_reached_late_rodata
                    && matches!(
                        current_type,
                        Some(SymbolType::Float32 | SymbolType::Float64)
                    )
                    && current_ref.is_some()
                {
                    reached_late_rodata = true;
                }

                // Trailing zeroes after a float tell late rodata apart from
                // a const array of floats.
                if let Some(reference) = current_ref {
                    if matches!(
                        reference.sym_type(),
                        Some(SymbolType::Float32 | SymbolType::Float64)
                    ) {
                        float_counter = 1;
                        float_padding_counter = 0;
                    } else {
                        float_counter = 0;
                        float_padding_counter = 0;
                    }
                } else if current_type == Some(SymbolType::Float32) {
                    float_counter += 1;
                    if word == 0 {
                        float_padding_counter += 1;
                    }
                } else if current_type == Some(SymbolType::Float64) {
                    if current_vram.inner() % 8 == 0 {
                        if local_offset + 8 <= raw_bytes.len() {
                            float_counter += 1;
                            if endian.dword_from_bytes(&raw_bytes[local_offset..local_offset + 8])
                                == 0
                            {
                                float_padding_counter += 1;
                            }
                        } else {
                            float_counter = 0;
                            float_padding_counter = 0;
                        }
                    }
                } else {
                    float_counter = 0;
                    float_padding_counter = 0;
                }

                // A jumptable runs until its first non-entry word.
                if current_type.is_some_and(|x| x.is_table()) && current_ref.is_none() {
                    let word_vram = Vram::new(word);
                    let valid_entry = word % 4 == 0
                        && !owned_segment.is_vram_ignored(word_vram)
                        && owned_segment
                            .find_symbol(word_vram, FindSettings::new(true))
                            .is_some_and(|x| x.is_trustable_function());
                    if !valid_entry {
                        symbols_info.entry(current_vram).or_insert(None);
                        if let Some((table_vram, _)) = prev_sym_info {
                            auto_pads.insert(current_vram, table_vram);
                        }
                        prev_sym_info = Some((current_vram, None));
                    }
                }

                let should_search_for_address =
                    current_type.is_none_or(|x| x.can_reference_symbols());

                if should_search_for_address {
                    let word_vram = Vram::new(word);
                    if !owned_segment.is_vram_ignored(word_vram)
                        && vram_range.in_range(word_vram)
                    {
                        // Vram is contained in this section
                        let word_ref =
                            owned_segment.find_symbol(word_vram, FindSettings::new(true));
                        if word_ref.is_none_or(|x| {
                            x.vram() == word_vram || current_type.is_some_and(|t| t.is_table())
                        }) {
                            // Only count this symbol if it doesn't have an
                            // addend. If it does, it may be part of a larger
                            // symbol.
                            symbols_info.entry(word_vram).or_insert(None);
                        }
                    }
                }

                let is_pointable = current_ref.is_none_or(|x| x.vram() == current_vram);
                if !owned_segment.is_vram_ignored(current_vram) && is_pointable {
                    Self::guess_string(
                        settings,
                        owned_segment,
                        raw_bytes,
                        local_offset,
                        current_vram,
                        current_ref,
                        vram_range,
                        maybe_reached_late_rodata || reached_late_rodata,
                        &mut symbols_info,
                        &mut auto_pads,
                        &mut remaining_string_size,
                        &mut prev_sym_info,
                        endian,
                    );
                }
            }

            if remaining_string_size <= 0 {
                for x_vram in core::iter::once(current_vram).chain(mid_refs.iter().copied()) {
                    if owned_segment.is_vram_ignored(x_vram) {
                        continue;
                    }

                    if let Some(reference) =
                        owned_segment.find_symbol(x_vram, FindSettings::new(false))
                    {
                        symbols_info
                            .entry(reference.vram())
                            .or_insert(reference.sym_type());

                        if let Some(size) = reference.user_declared_size() {
                            let next_vram = reference.vram() + size;

                            // Avoid generating a symbol at the end of the section
                            if vram_range.in_range(next_vram) {
                                let allow_next = match reference.sym_type() {
                                    Some(SymbolType::CString) => next_vram.inner() % 4 == 0,
                                    _ => true,
                                };
                                if allow_next {
                                    symbols_info.entry(next_vram).or_insert(None);
                                    auto_pads.insert(next_vram, reference.vram());
                                }
                            }
                        }
                        prev_sym_info = Some((x_vram, reference.sym_type()));
                    }
                }
            }

            maybe_reached_late_rodata = false;
            if !reached_late_rodata
                && section_type == SectionType::Rodata
                && prev_sym_info.is_some_and(|x| {
                    x.1.is_some_and(|t| t.is_late_rodata(settings.compiler()))
                })
            {
                if prev_sym_info.is_some_and(|x| x.1 == Some(SymbolType::Jumptable)) {
                    reached_late_rodata = true;
                } else if float_padding_counter + 1 == float_counter {
                    // Finding a float or a double is not proof enough to say
                    // we are in late_rodata, because we can be after a const
                    // array of floats/doubles. It is okay for late rodata
                    // floats to have padding, but if a float has non-zero
                    // padding it means it isn't a late_rodata float.
                    maybe_reached_late_rodata = true;
                }
            }
            remaining_string_size -= 4;
        }

        // Record the types of every known reference on the boundaries we
        // produced.
        let mut result: Vec<(Vram, Option<SymbolType>)> = symbols_info.into_iter().collect();
        for (sym_vram, sym_type) in result.iter_mut() {
            if sym_type.is_none() {
                if let Some(reference) =
                    owned_segment.find_symbol(*sym_vram, FindSettings::new(false))
                {
                    *sym_type = reference.sym_type();
                }
            }
        }

        (result, auto_pads)
    }

    /// Tries the C and Pascal string guessers at `current_vram`, splitting
    /// the section and marking the type when one of them accepts.
    #[allow(clippy::too_many_arguments)]
    fn guess_string(
        settings: &SectionDataSettings,
        owned_segment: &SegmentMetadata,
        raw_bytes: &[u8],
        local_offset: usize,
        current_vram: Vram,
        current_ref: Option<&crate::metadata::SymbolMetadata>,
        vram_range: AddressRange<Vram>,
        in_late_rodata: bool,
        symbols_info: &mut BTreeMap<Vram, Option<SymbolType>>,
        auto_pads: &mut UnorderedMap<Vram, Vram>,
        remaining_string_size: &mut i32,
        prev_sym_info: &mut Option<(Vram, Option<SymbolType>)>,
        endian: Endian,
    ) {
        let guessed = settings
            .string_guesser_level
            .guess(
                current_ref,
                current_vram,
                &raw_bytes[local_offset..],
                settings.encoding,
                in_late_rodata,
            )
            .map(|x| (x, SymbolType::CString))
            .or_else(|_| {
                settings
                    .pascal_string_guesser_level
                    .guess_pascal(
                        current_ref,
                        current_vram,
                        &raw_bytes[local_offset..],
                        settings.encoding,
                        in_late_rodata,
                    )
                    .map(|x| (x, SymbolType::PascalString))
            });

        let Ok((str_size, str_type)) = guessed else {
            return;
        };

        let str_sym_size = str_size.next_multiple_of(4);
        let mut in_between_range = owned_segment.find_symbols_range(AddressRange::new(
            current_vram + Size::new(1),
            (current_vram + Size::new(str_sym_size as u32)).min(vram_range.end()),
        ));

        if in_between_range.next().is_some() {
            // Another symbol lives inside the would-be string, so this is
            // not a string.
            return;
        }

        *remaining_string_size = str_size as i32;

        *symbols_info.entry(current_vram).or_insert(None) = Some(str_type);
        if !auto_pads.contains_key(&current_vram) {
            auto_pads.insert(current_vram, current_vram);
        }

        let mut next_vram = current_vram + Size::new(str_sym_size as u32);
        if next_vram.inner() % 8 == 4 {
            // Some compilers align strings to 8, leaving some annoying
            // padding. We try to check if the next symbol is aligned, and if
            // that's the case then grab the padding into this symbol.
            if local_offset + str_sym_size + 4 <= raw_bytes.len() {
                let next_word = endian.word_from_bytes(&raw_bytes[local_offset + str_sym_size..]);
                if next_word == 0 {
                    // The next word could be padding, unless something
                    // references it.
                    if owned_segment
                        .find_symbol(next_vram, FindSettings::new(false))
                        .is_none_or(|x| x.reference_counter() == 0)
                    {
                        let next_next_vram = Vram::new(next_vram.inner().next_multiple_of(8));
                        if vram_range.in_range(next_next_vram) {
                            let next_next_ref = owned_segment
                                .find_symbol(next_next_vram, FindSettings::new(false));

                            if let Some(compiler) = settings.compiler {
                                if next_next_ref.is_some_and(|x| {
                                    x.sym_type().is_some_and(|sym_type| {
                                        compiler.prev_align_for_type(sym_type) >= Some(3)
                                    })
                                }) {
                                    next_vram += Size::new(4);
                                }
                            }
                        } else if vram_range.end() == next_next_vram {
                            // trailing padding, lets just add it here
                            next_vram += Size::new(4);
                        }
                    }
                }
            }
        }

        if vram_range.in_range(next_vram) && !owned_segment.is_vram_ignored(next_vram) {
            // Avoid generating a symbol at the end of the section
            symbols_info.entry(next_vram).or_insert(None);
            auto_pads.insert(next_vram, current_vram);
        }

        // Next symbol should not be affected by this string.
        *prev_sym_info = None;
    }
}

impl SectionData {
    pub fn data_symbols(&self) -> &[DataSym] {
        &self.data_symbols
    }
}

impl Section for SectionData {
    fn name(&self) -> &str {
        &self.name
    }

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

    fn symbol_list(&self) -> &[impl Symbol] {
        &self.data_symbols
    }

    fn symbols_vrams(&self) -> &UnorderedSet<Vram> {
        &self.symbol_vrams
    }
}

impl RomSection for SectionData {
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }
}

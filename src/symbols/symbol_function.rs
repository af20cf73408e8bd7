/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::{btree_map::BTreeMap, btree_set::BTreeSet};
use alloc::vec::Vec;
use core::hash;

use rabbitizer::{access_type::AccessType, Instruction, Vram};

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    analysis::{InstructionAnalysisResult, InstructionAnalyzer, GAS_ADDEND_SLACK},
    collections::UnorderedSet,
    config::Compiler,
    context::{AnalysisWarning, Context},
    metadata::{GeneratedBy, ParentSectionMetadata, SegmentMetadata, SymbolMetadata, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    relocation::{RelocReferencedSym, RelocationInfo, RelocationType},
    section_type::SectionType,
};

use super::{
    display::{FunctionDisplay, FunctionDisplaySettings, SymDisplayError},
    trait_symbol::RomSymbol,
    Symbol, SymbolCreationError,
};

const SECTION_TYPE: SectionType = SectionType::Text;

const ADDEND_BAND: i64 = 0x8000;

#[derive(Debug, Clone)]
pub struct FunctionSym {
    ranges: RomVramRange,
    instructions: Vec<Instruction>,
    parent_segment_info: ParentSegmentInfo,

    instr_analysis: InstructionAnalysisResult,
    relocs: Vec<Option<RelocationInfo>>,
}

impl FunctionSym {
    pub(crate) fn new(
        context: &mut Context,
        instructions: Vec<Instruction>,
        rom: Rom,
        vram: Vram,
        _in_section_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        properties: FunctionSymProperties,
    ) -> Result<Self, SymbolCreationError> {
        let size = Size::new(instructions.len() as u32 * 4);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        let instr_analysis =
            InstructionAnalyzer::analyze(context, &parent_segment_info, ranges, &instructions)?;

        let mut relocs = vec![None; instructions.len()];

        let owned_segment = context.find_owned_segment_mut(&parent_segment_info)?;
        let metadata = owned_segment.add_self_symbol(
            vram,
            Some(rom),
            size,
            SECTION_TYPE,
            Some(SymbolType::Function),
            |metadata| count_padding(&instructions, metadata.user_declared_size()),
        )?;

        properties.apply_to_metadata(metadata);

        Self::process_instr_analysis_result_owned(
            &mut relocs,
            &instr_analysis,
            &ranges,
            owned_segment,
        )?;
        Self::process_instr_analysis_result_referenced(
            &mut relocs,
            &instr_analysis,
            &ranges,
            context,
            &parent_segment_info,
        )?;
        Self::generate_relocs_from_analyzer(&mut relocs, &instr_analysis, &ranges, &instructions);

        Ok(Self {
            ranges,
            instructions,
            parent_segment_info,
            instr_analysis,
            relocs,
        })
    }

    fn instr_index(ranges: &RomVramRange, instr_rom: Rom) -> usize {
        ((instr_rom - ranges.rom().start()).inner() / 4) as usize
    }

    fn process_instr_analysis_result_owned(
        relocs: &mut [Option<RelocationInfo>],
        instr_analysis: &InstructionAnalysisResult,
        ranges: &RomVramRange,
        owned_segment: &mut SegmentMetadata,
    ) -> Result<(), SymbolCreationError> {
        let in_targets = instr_analysis.branch_targets().iter();
        let out_targets = instr_analysis.branch_targets_outside().iter();

        for (instr_rom, target_vram) in in_targets.chain(out_targets) {
            if owned_segment.is_vram_ignored(*target_vram) {
                continue;
            }

            // A branch may point outside the segment on corrupted or
            // handwritten code. Nothing useful can be labeled there.
            let Ok(branch_sym) = owned_segment.add_branch_label(
                *target_vram,
                ranges.rom_from_vram(*target_vram),
                GeneratedBy::Autogenerated,
            ) else {
                continue;
            };
            branch_sym.add_reference_function(ranges.vram().start(), *instr_rom);

            if let Some(typ) = branch_sym.sym_type() {
                if typ.valid_branch_target() {
                    let instr_index = Self::instr_index(ranges, *instr_rom);
                    relocs[instr_index] = Some(
                        RelocationType::R_MIPS_PC16
                            .new_reloc_info(RelocReferencedSym::Address(*target_vram)),
                    );
                }
            }
        }

        Ok(())
    }

    fn process_instr_analysis_result_referenced(
        relocs: &mut [Option<RelocationInfo>],
        instr_analysis: &InstructionAnalysisResult,
        ranges: &RomVramRange,
        context: &mut Context,
        parent_segment_info: &ParentSegmentInfo,
    ) -> Result<(), SymbolCreationError> {
        let function_vram = ranges.vram().start();
        let mut overflowed_addends: Vec<(Vram, i64)> = Vec::new();

        // Jumptables
        for (instr_rom, target_vram) in instr_analysis.referenced_jumptables() {
            if context
                .find_owned_segment(parent_segment_info)?
                .is_vram_ignored(*target_vram)
            {
                continue;
            }

            if let Some(referenced_segment) =
                context.find_referenced_segment_mut(*target_vram, parent_segment_info)
            {
                let jumptable = referenced_segment.add_jumptable(
                    *target_vram,
                    None,
                    GeneratedBy::Autogenerated,
                )?;
                jumptable.add_reference_function(function_vram, *instr_rom);
            }
        }

        for (instr_rom, target_vram) in instr_analysis.func_calls() {
            if context
                .find_owned_segment(parent_segment_info)?
                .is_vram_ignored(*target_vram)
            {
                continue;
            }

            if let Some(referenced_segment) =
                context.find_referenced_segment_mut(*target_vram, parent_segment_info)
            {
                let func_sym = referenced_segment.add_function(
                    *target_vram,
                    None,
                    GeneratedBy::Autogenerated,
                )?;
                func_sym.add_reference_function(function_vram, *instr_rom);
            }

            let instr_index = Self::instr_index(ranges, *instr_rom);
            relocs[instr_index] = Some(
                RelocationType::R_MIPS_26.new_reloc_info(RelocReferencedSym::Address(*target_vram)),
            );
        }

        for (instr_rom, symbol_vram) in instr_analysis.address_per_lo_instr() {
            let sym_access = single_access_type(instr_analysis, *symbol_vram);

            let realigned_symbol_vram = realign_for_access(*symbol_vram, sym_access);
            if context
                .find_owned_segment(parent_segment_info)?
                .is_vram_ignored(realigned_symbol_vram)
            {
                continue;
            }

            if let Some(referenced_segment) =
                context.find_referenced_segment_mut(realigned_symbol_vram, parent_segment_info)
            {
                let sym_metadata = referenced_segment.add_symbol(realigned_symbol_vram, true)?;
                sym_metadata.add_reference_function(function_vram, *instr_rom);
                if let Some(sym_access) = sym_access {
                    sym_metadata.set_access_type_if_unset(sym_access);
                }

                // Addends slightly past the band show up on output of modern
                // assemblers and reassemble fine; only report past the slack.
                let addend = realigned_symbol_vram.sub_vram(&sym_metadata.vram()).inner() as i64;
                if addend < -ADDEND_BAND || addend > ADDEND_BAND - 1 + GAS_ADDEND_SLACK {
                    overflowed_addends.push((realigned_symbol_vram, addend));
                }
            }

            let instr_index = Self::instr_index(ranges, *instr_rom);
            relocs[instr_index] = Some(
                RelocationType::R_MIPS_LO16
                    .new_reloc_info(RelocReferencedSym::Address(*symbol_vram)),
            );
        }

        for (instr_rom, symbol_vram) in instr_analysis.address_per_hi_instr() {
            let instr_index = Self::instr_index(ranges, *instr_rom);
            relocs[instr_index] = Some(
                RelocationType::R_MIPS_HI16
                    .new_reloc_info(RelocReferencedSym::Address(*symbol_vram)),
            );
        }

        for (instr_rom, symbol_vram) in instr_analysis.address_per_gprel_instr() {
            if context
                .find_owned_segment(parent_segment_info)?
                .is_vram_ignored(*symbol_vram)
            {
                continue;
            }

            if let Some(referenced_segment) =
                context.find_referenced_segment_mut(*symbol_vram, parent_segment_info)
            {
                let sym_metadata = referenced_segment.add_symbol(*symbol_vram, true)?;
                sym_metadata.add_reference_function(function_vram, *instr_rom);
                sym_metadata.set_accessed_as_gp_rel();
                if let Some(sym_access) = single_access_type(instr_analysis, *symbol_vram) {
                    sym_metadata.set_access_type_if_unset(sym_access);
                }
            }

            let instr_index = Self::instr_index(ranges, *instr_rom);
            relocs[instr_index] = Some(
                RelocationType::R_MIPS_GPREL16
                    .new_reloc_info(RelocReferencedSym::Address(*symbol_vram)),
            );
        }

        let gp_value = context
            .global_config()
            .gp_config()
            .map(|x| x.gp_value().inner() as i64);
        for (instr_rom, symbol_vram) in instr_analysis.address_per_got_instr() {
            if context
                .find_owned_segment(parent_segment_info)?
                .is_vram_ignored(*symbol_vram)
            {
                continue;
            }

            let mut is_function = false;
            if let Some(referenced_segment) =
                context.find_referenced_segment_mut(*symbol_vram, parent_segment_info)
            {
                let sym_metadata = referenced_segment.add_symbol(*symbol_vram, true)?;
                sym_metadata.add_reference_function(function_vram, *instr_rom);

                let got_offset = gp_value.map(|gp| symbol_vram.inner() as i64 - gp);
                if got_offset.is_some_and(|x| x >= 0) {
                    sym_metadata.set_got_global(None);
                } else {
                    sym_metadata.set_got_local(None);
                }
                is_function = sym_metadata.is_function();
            }

            let reloc_type = if is_function {
                RelocationType::R_MIPS_CALL16
            } else {
                RelocationType::R_MIPS_GOT16
            };
            let instr_index = Self::instr_index(ranges, *instr_rom);
            relocs[instr_index] =
                Some(reloc_type.new_reloc_info(RelocReferencedSym::Address(*symbol_vram)));
        }

        for (vram, addend) in overflowed_addends {
            context.add_warning(AnalysisWarning::AddendOverflow { vram, addend });
        }

        Ok(())
    }

    fn generate_relocs_from_analyzer(
        relocs: &mut [Option<RelocationInfo>],
        instr_analysis: &InstructionAnalysisResult,
        ranges: &RomVramRange,
        instrs: &[Instruction],
    ) {
        for (instr_rom, constant) in instr_analysis.constant_per_instr() {
            if instr_analysis.cpload_roms().contains(instr_rom) {
                continue;
            }

            let instr_index = Self::instr_index(ranges, *instr_rom);
            let instr = &instrs[instr_index];
            let reloc_type = if instr.opcode().can_be_hi() {
                RelocationType::R_CUSTOM_CONSTANT_HI
            } else {
                RelocationType::R_CUSTOM_CONSTANT_LO
            };

            relocs[instr_index] = Some(reloc_type.new_reloc_info(RelocReferencedSym::SymName(
                format!("0x{:X}", constant).into(),
                0,
            )));
        }

        // Handle unpaired `lui`s
        for (instr_rom, (_hi_reg, hi_imm)) in instr_analysis.hi_instrs() {
            if instr_analysis.address_per_hi_instr().contains_key(instr_rom)
                || instr_analysis.constant_per_instr().contains_key(instr_rom)
                || instr_analysis.cpload_roms().contains(instr_rom)
            {
                continue;
            }

            let instr_index = Self::instr_index(ranges, *instr_rom);
            let constant = (*hi_imm as u32) << 16;
            relocs[instr_index] =
                Some(RelocationType::R_CUSTOM_CONSTANT_HI.new_reloc_info(
                    RelocReferencedSym::SymName(format!("0x{:X}", constant).into(), 0),
                ));
        }

        // The `.cpload` preamble materializes `_gp_disp`, not an address.
        for instr_rom in instr_analysis.cpload_roms() {
            let instr_index = Self::instr_index(ranges, *instr_rom);
            let reloc_type = if instr_analysis.hi_instrs().contains_key(instr_rom) {
                Some(RelocationType::R_MIPS_HI16)
            } else if instrs[instr_index].opcode().can_be_lo() {
                Some(RelocationType::R_MIPS_LO16)
            } else {
                // The trailing `addu $gp, $gp, $t9` has no relocation.
                None
            };

            relocs[instr_index] = reloc_type.map(|x| {
                x.new_reloc_info(RelocReferencedSym::SymName("_gp_disp".into(), 0))
            });
        }
    }
}

impl FunctionSym {
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn instr_analysis(&self) -> &InstructionAnalysisResult {
        &self.instr_analysis
    }

    #[must_use]
    pub fn handwritten_instrs(&self) -> &BTreeSet<Rom> {
        self.instr_analysis.handwritten_instrs()
    }

    #[must_use]
    pub fn referenced_vrams(&self) -> &UnorderedSet<Vram> {
        self.instr_analysis.referenced_vrams()
    }

    /// Replaces autodetected relocs with the ones the user provided,
    /// typically lifted from an ELF `.rel` section.
    ///
    /// An `R_MIPS_NONE` override forces the raw instruction to be emitted
    /// without symbolizing anything.
    pub fn apply_user_relocs(&mut self, user_relocs: &BTreeMap<Rom, RelocationInfo>) {
        let rom_range = *self.ranges.rom();
        for (rom, reloc) in user_relocs.range(rom_range.start()..rom_range.end()) {
            let instr_index = Self::instr_index(&self.ranges, *rom);
            self.relocs[instr_index] = Some(reloc.clone());
        }
    }
}

impl<'ctx, 'sym, 'flg> FunctionSym {
    pub fn display(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg FunctionDisplaySettings,
    ) -> Result<FunctionDisplay<'ctx, 'sym, 'flg>, SymDisplayError> {
        FunctionDisplay::new(context, self, settings)
    }
}

impl Symbol for FunctionSym {
    fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    #[must_use]
    fn section_type(&self) -> SectionType {
        SECTION_TYPE
    }
}

impl RomSymbol for FunctionSym {
    #[must_use]
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }

    #[must_use]
    fn relocs(&self) -> &[Option<RelocationInfo>] {
        &self.relocs
    }
}

impl hash::Hash for FunctionSym {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.parent_segment_info.hash(state);
        self.ranges.hash(state);
    }
}
impl PartialEq for FunctionSym {
    fn eq(&self, other: &Self) -> bool {
        self.parent_segment_info == other.parent_segment_info && self.ranges == other.ranges
    }
}
impl PartialOrd for FunctionSym {
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
pub(crate) struct FunctionSymProperties {
    pub parent_metadata: ParentSectionMetadata,
    pub compiler: Option<Compiler>,
    pub auto_pad_by: Option<Vram>,
}

impl FunctionSymProperties {
    fn apply_to_metadata(self, metadata: &mut SymbolMetadata) {
        metadata.set_parent_metadata(self.parent_metadata);

        if let Some(compiler) = self.compiler {
            metadata.set_compiler(compiler);
        }

        if let Some(auto_pad_by) = self.auto_pad_by {
            metadata.set_auto_created_pad_by(auto_pad_by);
        }
    }
}

fn single_access_type(
    instr_analysis: &InstructionAnalysisResult,
    vram: Vram,
) -> Option<(AccessType, bool)> {
    let access_info = instr_analysis.type_info_per_address().get(&vram)?;
    if access_info.len() == 1 {
        access_info.iter().next().map(|(k, _v)| *k)
    } else {
        None
    }
}

/// Unaligned accesses (`lwl`/`ldr` and friends) point at the start of the
/// word or doubleword they poke, not at the symbol itself.
fn realign_for_access(vram: Vram, sym_access: Option<(AccessType, bool)>) -> Vram {
    match sym_access {
        Some((AccessType::UNALIGNED_WORD_LEFT | AccessType::UNALIGNED_WORD_RIGHT, _)) => {
            Vram::new(vram.inner() - (vram.inner() % 4))
        }
        Some((
            AccessType::UNALIGNED_DOUBLEWORD_LEFT | AccessType::UNALIGNED_DOUBLEWORD_RIGHT,
            _,
        )) => Vram::new(vram.inner() - (vram.inner() % 8)),
        None | Some(_) => vram,
    }
}

fn count_padding(instructions: &[Instruction], user_declared_size: Option<Size>) -> Size {
    if user_declared_size.is_some() {
        return Size::new(0);
    }

    let mut count = 0;

    for pair in instructions.windows(2).rev() {
        let prev_instr = pair[0];
        let instr = pair[1];

        if prev_instr.opcode().has_delay_slot() {
            break;
        }
        if !instr.is_nop() {
            break;
        }

        count += 4;
    }

    Size::new(count)
}

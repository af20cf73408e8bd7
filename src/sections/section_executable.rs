/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::sync::Arc;
use alloc::vec::Vec;

use rabbitizer::{Instruction, InstructionFlags, Vram};

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    collections::{FindSettings, UnorderedSet},
    config::Compiler,
    context::{AnalysisWarning, Context},
    metadata::{ParentSectionMetadata, SegmentMetadata},
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::{FunctionSym, FunctionSymProperties, Symbol},
};

use super::{RomSection, Section, SectionCreationError};

#[derive(Debug, Clone)]
pub struct SectionExecutableSettings {
    compiler: Option<Compiler>,
    instruction_flags: InstructionFlags,

    /// Glue a stray `jr $ra; nop` pair after a function's end back into that
    /// function, an artifact some compilers leave behind.
    detect_redundant_function_end: bool,
}

impl SectionExecutableSettings {
    pub fn new(compiler: Option<Compiler>, instruction_flags: InstructionFlags) -> Self {
        Self {
            compiler,
            instruction_flags,
            detect_redundant_function_end: false,
        }
    }

    #[must_use]
    pub fn with_detect_redundant_function_end(self, detect_redundant_function_end: bool) -> Self {
        Self {
            detect_redundant_function_end,
            ..self
        }
    }

    #[must_use]
    pub fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }
}

/// An executable section, split into functions.
#[derive(Debug, Clone)]
#[must_use]
pub struct SectionExecutable {
    name: Arc<str>,

    ranges: RomVramRange,

    parent_segment_info: ParentSegmentInfo,

    functions: Vec<FunctionSym>,

    symbol_vrams: UnorderedSet<Vram>,
}

impl SectionExecutable {
    pub fn new(
        context: &mut Context,
        settings: &SectionExecutableSettings,
        name: Arc<str>,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, SectionCreationError> {
        if raw_bytes.is_empty() {
            return Err(SectionCreationError::EmptySection { name, vram });
        }
        if rom.inner() % 4 != 0 || vram.inner() % 4 != 0 {
            return Err(SectionCreationError::RomVramAlignmentMismatch {
                name,
                rom,
                vram,
                multiple_of: 4,
            });
        }
        if raw_bytes.len() % 4 != 0 {
            return Err(SectionCreationError::BadBytesSize {
                name,
                size: raw_bytes.len(),
                multiple_of: 4,
            });
        }

        let size = Size::new(raw_bytes.len() as u32);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        let endian = context.global_config().endian();
        let instructions: Vec<Instruction> = raw_bytes
            .chunks_exact(4)
            .enumerate()
            .map(|(i, word_bytes)| {
                let word = endian.word_from_bytes(word_bytes);
                Instruction::new(
                    word,
                    vram + Size::new(i as u32 * 4),
                    settings.instruction_flags,
                )
            })
            .collect();

        let owned_segment = context.find_owned_segment(&parent_segment_info)?;
        let (boundaries, invalid_runs) =
            Self::find_functions(settings, owned_segment, &instructions, ranges);

        for (index, word) in invalid_runs {
            context.add_warning(AnalysisWarning::InvalidInstruction {
                rom: rom + Size::new(index as u32 * 4),
                word,
            });
        }

        let mut functions = Vec::with_capacity(boundaries.len());
        let mut symbol_vrams = UnorderedSet::new();

        for (start_index, count) in boundaries {
            let func_rom = rom + Size::new(start_index as u32 * 4);
            let func_vram = vram + Size::new(start_index as u32 * 4);

            symbol_vrams.insert(func_vram);

            let properties = FunctionSymProperties {
                parent_metadata: ParentSectionMetadata::new(
                    name.clone(),
                    vram,
                    parent_segment_info.clone(),
                ),
                compiler: settings.compiler,
                auto_pad_by: None,
            };
            let func = FunctionSym::new(
                context,
                instructions[start_index..start_index + count].to_vec(),
                func_rom,
                func_vram,
                start_index * 4,
                parent_segment_info.clone(),
                properties,
            )?;

            functions.push(func);
        }

        Ok(Self {
            name,
            ranges,
            parent_segment_info,
            functions,
            symbol_vrams,
        })
    }

    /// Splits the instruction stream into function extents.
    ///
    /// Returns `(start_index, instruction_count)` pairs, plus the invalid
    /// words found inside function bodies.
    #[allow(clippy::type_complexity)]
    fn find_functions(
        settings: &SectionExecutableSettings,
        owned_segment: &SegmentMetadata,
        instructions: &[Instruction],
        ranges: RomVramRange,
    ) -> (Vec<(usize, usize)>, Vec<(usize, u32)>) {
        let vram_start = ranges.vram().start();
        let len = instructions.len();

        let mut boundaries = Vec::new();
        let mut invalid_instrs = Vec::new();

        let mut index = 0;

        // Leading nops are inter-function padding, not code.
        while index < len && instructions[index].is_nop() {
            index += 1;
        }
        if index == len {
            // A section of pure nops still has to be covered by something.
            return (vec![(0, len)], invalid_instrs);
        }
        let leading_pad = index;

        let mut current_start = index;
        // Instruction index which the farthest intra-function branch targets.
        let mut farthest_target = index;
        let mut user_size_end: Option<usize> =
            Self::user_declared_end(owned_segment, vram_start, current_start, len);

        while index < len {
            let instr = &instructions[index];
            let current_vram = vram_start + Size::new(index as u32 * 4);

            // A user-declared function forces a boundary no matter what the
            // instructions look like.
            if index != current_start && Self::is_user_function_start(owned_segment, current_vram)
            {
                boundaries.push((current_start, index - current_start));
                current_start = index;
                farthest_target = index;
                user_size_end = Self::user_declared_end(owned_segment, vram_start, index, len);
                continue;
            }

            if user_size_end == Some(index) && index != current_start {
                // Padding after the declared end still belongs to this
                // function, otherwise those bytes would not be covered.
                let mut end = index;
                while end < len
                    && instructions[end].is_nop()
                    && !Self::is_user_function_start(
                        owned_segment,
                        vram_start + Size::new(end as u32 * 4),
                    )
                {
                    end += 1;
                }
                boundaries.push((current_start, end - current_start));
                index = end;
                current_start = end;
                farthest_target = end;
                user_size_end = Self::user_declared_end(owned_segment, vram_start, end, len);
                continue;
            }

            if !instr.is_valid() {
                // Invalid opcodes terminate the current function.
                invalid_instrs.push((index, instr.word()));
                index += 1;
                while index < len && !instructions[index].is_valid() {
                    invalid_instrs.push((index, instructions[index].word()));
                    index += 1;
                }
                while index < len && instructions[index].is_nop() {
                    index += 1;
                }
                boundaries.push((current_start, index - current_start));
                current_start = index;
                farthest_target = index;
                user_size_end = Self::user_declared_end(owned_segment, vram_start, index, len);
                continue;
            }

            if let Some(target) = instr.get_branch_vram_generic() {
                if ranges.in_vram_range(target) {
                    let target_index =
                        (target.sub_vram(&vram_start).inner() as usize) / 4;
                    farthest_target = farthest_target.max(target_index);
                }
            }

            let is_return = Self::is_function_end(settings, instr, ranges, index, vram_start);
            if is_return && index >= farthest_target {
                // The delay slot belongs to the function.
                let mut end = (index + 2).min(len);

                if settings.detect_redundant_function_end {
                    end = Self::absorb_redundant_end(instructions, end, len);
                }

                // Trailing nops pad the next function's alignment but belong
                // to the one that just ended.
                while end < len
                    && instructions[end].is_nop()
                    && !Self::is_user_function_start(
                        owned_segment,
                        vram_start + Size::new(end as u32 * 4),
                    )
                {
                    end += 1;
                }

                boundaries.push((current_start, end - current_start));
                index = end;
                current_start = end;
                farthest_target = end;
                user_size_end = Self::user_declared_end(owned_segment, vram_start, end, len);
                continue;
            }

            index += 1;
        }

        if current_start < len {
            boundaries.push((current_start, len - current_start));
        }

        // Stick the leading padding onto the first discovered function, so
        // every byte of the section is covered.
        if leading_pad != 0 {
            if let Some(first) = boundaries.first_mut() {
                first.1 += first.0;
                first.0 = 0;
            }
        }

        (boundaries, invalid_instrs)
    }

    fn is_user_function_start(owned_segment: &SegmentMetadata, vram: Vram) -> bool {
        owned_segment
            .find_symbol(vram, FindSettings::new(false))
            .is_some_and(|sym| sym.is_user_declared() && sym.is_function())
    }

    fn user_declared_end(
        owned_segment: &SegmentMetadata,
        vram_start: Vram,
        start_index: usize,
        len: usize,
    ) -> Option<usize> {
        let vram = vram_start + Size::new(start_index as u32 * 4);
        let sym = owned_segment.find_symbol(vram, FindSettings::new(false))?;
        let size = sym.user_declared_size()?;

        let end = start_index + (size.inner() as usize) / 4;
        (end <= len).then_some(end)
    }

    fn is_function_end(
        settings: &SectionExecutableSettings,
        instr: &Instruction,
        ranges: RomVramRange,
        index: usize,
        vram_start: Vram,
    ) -> bool {
        let opcode = instr.opcode();

        // jr $ra
        if opcode.is_jump() && !opcode.is_jump_with_address() && !opcode.does_link() {
            if let Some(rs) = instr.field().rs() {
                if rs as usize == 31 {
                    return true;
                }
            }
            // `jr` on any other register is a jumptable dispatch or computed
            // tail call; either way the function keeps going.
            return false;
        }

        // Some compilers end functions with a bare `j` tail call.
        if opcode.is_jump_with_address() && !opcode.does_link() {
            if let Some(target) = instr.get_instr_index_as_vram() {
                let current_vram = vram_start + Size::new(index as u32 * 4);
                let outside = !ranges.in_vram_range(target) || target <= current_vram;
                return outside
                    && settings
                        .compiler
                        .is_some_and(|x| x.plain_j_ends_function());
            }
        }

        false
    }

    /// `jr $ra; nop` right after an end, with nothing pointing at it, is a
    /// leftover of the previous function.
    fn absorb_redundant_end(instructions: &[Instruction], mut end: usize, len: usize) -> usize {
        let mut probe = end;
        while probe < len && instructions[probe].is_nop() {
            probe += 1;
        }

        if probe + 1 < len {
            let instr = &instructions[probe];
            let opcode = instr.opcode();
            let is_jr_ra = opcode.is_jump()
                && !opcode.is_jump_with_address()
                && !opcode.does_link()
                && instr.field().rs().is_some_and(|rs| rs as usize == 31);

            if is_jr_ra && instructions[probe + 1].is_nop() {
                end = probe + 2;
            }
        }

        end
    }
}

impl SectionExecutable {
    pub fn functions(&self) -> &[FunctionSym] {
        &self.functions
    }
}

impl Section for SectionExecutable {
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
        SectionType::Text
    }

    fn symbol_list(&self) -> &[impl Symbol] {
        &self.functions
    }

    fn symbols_vrams(&self) -> &UnorderedSet<Vram> {
        &self.symbol_vrams
    }
}

impl RomSection for SectionExecutable {
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }
}

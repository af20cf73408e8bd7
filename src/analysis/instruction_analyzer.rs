/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::vec::Vec;

use rabbitizer::{Instruction, Vram};

use crate::{
    addresses::{Rom, RomVramRange, Size},
    collections::UnorderedSet,
    config::GlobalConfig,
    context::{Context, OwnedSegmentNotFoundError},
    metadata::SegmentMetadata,
    parent_segment_info::ParentSegmentInfo,
};

use super::{
    register_tracker::{instr_destination, GPR_GP, GPR_RA, GPR_T9, GPR_ZERO},
    InstructionAnalysisResult, RegisterTracker,
};

/// How many nested conditional branches the look-ahead is willing to fork
/// through before giving up on a path.
const LOOKAHEAD_MAX_DEPTH: u32 = 10;

/// The raw 16-bit immediate of an instruction, regardless of whether its
/// operand is the signed or unsigned variant (e.g. `addiu` vs `lui`).
fn get_processed_immediate(instr: &Instruction) -> Option<i16> {
    instr
        .field()
        .imm_i16()
        .or_else(|| instr.field().imm_u16().map(|v| v as i16))
}

/// Walks the instructions of a single function, tracking register values to
/// discover `%hi`/`%lo` pairs, jumptables, `$gp` accesses and everything
/// else the emitter will need to symbolize operands.
pub struct InstructionAnalyzer;

impl InstructionAnalyzer {
    pub(crate) fn analyze(
        context: &Context,
        parent_segment_info: &ParentSegmentInfo,
        ranges: RomVramRange,
        instrs: &[Instruction],
    ) -> Result<InstructionAnalysisResult, OwnedSegmentNotFoundError> {
        let owned_segment = context.find_owned_segment(parent_segment_info)?;

        let mut analyzer = Analyzer {
            context,
            global_config: context.global_config(),
            owned_segment,
            ranges,
            instrs,
            result: InstructionAnalysisResult::new(ranges),
            cpload: CploadTracker::default(),
        };
        analyzer.run();

        Ok(analyzer.result)
    }
}

/// What the control flow did at a given instruction, so the walkers know
/// when to fork and when to stop.
#[derive(Debug, Copy, Clone, PartialEq)]
enum Step {
    Normal,
    /// Conditional branch into this function. Payload is the target index.
    Branch(usize),
    /// Unconditional transfer. Payload is the intra-function target index,
    /// if the target is inside the function.
    UncondJump(Option<usize>),
    Call,
    Return,
}

#[derive(Debug, Default, Copy, Clone)]
struct CploadTracker {
    hi_rom: Option<Rom>,
    lo_rom: Option<Rom>,
}

struct Analyzer<'a> {
    context: &'a Context,
    global_config: &'a GlobalConfig,
    owned_segment: &'a SegmentMetadata,
    ranges: RomVramRange,
    instrs: &'a [Instruction],
    result: InstructionAnalysisResult,
    cpload: CploadTracker,
}

impl Analyzer<'_> {
    fn run(&mut self) {
        let mut regs = RegisterTracker::new();
        let mut forks: Vec<(usize, RegisterTracker, u32)> = Vec::new();
        let mut visited: UnorderedSet<usize> = UnorderedSet::new();

        let mut pending_fork: Option<usize> = None;
        let mut pending_call_clear = false;

        for i in 0..self.instrs.len() {
            let step = self.process_instr(&mut regs, i);

            // Pendings fire one instruction late, so the delay slot has
            // already been folded into the register state. This is also what
            // makes a `lui` sitting on a delay slot pair up on the branch
            // path, as if it was placed before the branch.
            if let Some(target) = pending_fork.take() {
                forks.push((target, regs.clone(), 1));
            }
            if pending_call_clear {
                regs.unset_registers_after_func_call();
                pending_call_clear = false;
            }

            match step {
                Step::Branch(target) => pending_fork = Some(target),
                Step::Call => pending_call_clear = true,
                Step::Normal | Step::UncondJump(_) | Step::Return => {}
            }
        }

        // Drain the branch forks, merging whatever they discover on a
        // first-seen-wins basis.
        while let Some((start, mut regs, depth)) = forks.pop() {
            if !visited.insert(start) {
                continue;
            }

            let mut pending_fork: Option<usize> = None;
            let mut pending_call_clear = false;
            // One extra instruction runs after a terminator, its delay slot.
            let mut countdown: Option<u32> = None;

            for i in start..self.instrs.len() {
                let step = self.process_instr(&mut regs, i);

                if let Some(target) = pending_fork.take() {
                    if depth < LOOKAHEAD_MAX_DEPTH {
                        forks.push((target, regs.clone(), depth + 1));
                    }
                }
                if pending_call_clear {
                    regs.unset_registers_after_func_call();
                    pending_call_clear = false;
                }

                match countdown {
                    Some(0) => break,
                    Some(n) => countdown = Some(n - 1),
                    None => {}
                }

                match step {
                    Step::Branch(target) => pending_fork = Some(target),
                    Step::Call => pending_call_clear = true,
                    Step::UncondJump(_) | Step::Return => countdown = Some(0),
                    Step::Normal => {}
                }
            }
        }
    }

    fn rom_from_index(&self, index: usize) -> Rom {
        self.ranges.rom().start() + Size::new(index as u32 * 4)
    }

    fn index_from_vram(&self, vram: Vram) -> Option<usize> {
        if !self.ranges.in_vram_range(vram) {
            return None;
        }
        let offset = vram.sub_vram(&self.ranges.vram().start()).inner();
        Some(offset as usize / 4)
    }

    fn process_instr(&mut self, regs: &mut RegisterTracker, i: usize) -> Step {
        let instr = &self.instrs[i];
        if !instr.is_valid() {
            return Step::Normal;
        }
        let instr_rom = self.rom_from_index(i);

        if instr.is_likely_handwritten() {
            self.result.add_handwritten_instr(instr_rom);
        }

        let opcode = instr.opcode();

        if opcode.is_branch() {
            if let Some(target) = instr.get_branch_vram_generic() {
                self.result.add_branch_target(instr_rom, target);

                if instr.is_unconditional_branch() {
                    return Step::UncondJump(self.index_from_vram(target));
                }
                if let Some(target_index) = self.index_from_vram(target) {
                    return Step::Branch(target_index);
                }
            }
            return Step::Normal;
        }

        if opcode.is_jump_with_address() {
            if let Some(target) = instr.get_instr_index_as_vram() {
                if opcode.does_link() {
                    self.result.add_func_call(instr_rom, target);
                    return Step::Call;
                }

                // A plain `j` landing inside the function is one of the ways
                // compilers spell a branch. Outside, it is a tail call.
                if let Some(target_index) = self.index_from_vram(target) {
                    self.result.add_branch_target(instr_rom, target);
                    return Step::UncondJump(Some(target_index));
                }
                self.result.add_func_call(instr_rom, target);
            }
            return Step::UncondJump(None);
        }

        if opcode.is_jump() {
            if opcode.does_link() {
                // jalr
                regs.overwrite_dst(instr);
                return Step::Call;
            }

            if let Some(rs) = instr.field().rs() {
                let rs = rs as usize;
                if rs == GPR_RA {
                    return Step::Return;
                }

                if let Some(jr_data) = regs.get_jr_reg_data(rs) {
                    let table_vram = Vram::new(jr_data.address());
                    if jr_data.dereferenced() && !self.owned_segment.is_vram_ignored(table_vram) {
                        self.result
                            .add_referenced_jumptable(jr_data.lo_rom(), table_vram);
                    }
                }
            }
            return Step::UncondJump(None);
        }

        if opcode.can_be_hi() {
            self.process_hi(regs, instr, instr_rom);
            return Step::Normal;
        }

        if opcode.can_be_lo() {
            return self.process_lo_candidate(regs, instr, instr_rom);
        }

        if let Some((dst, left, right)) = move_like_operands(instr) {
            if right == GPR_ZERO {
                regs.process_move(dst, left);
            } else if left == GPR_ZERO {
                regs.process_move(dst, right);
            } else {
                regs.propagate_hi_for_addu(dst, left, right);

                // cpload third step: addu $gp, $gp, $t9
                if self.is_pic()
                    && dst == GPR_GP
                    && left == GPR_GP
                    && right == GPR_T9
                {
                    if let (Some(hi_rom), Some(lo_rom)) = (self.cpload.hi_rom, self.cpload.lo_rom) {
                        self.result.add_cpload_rom(hi_rom);
                        self.result.add_cpload_rom(lo_rom);
                        self.result.add_cpload_rom(instr_rom);
                        self.cpload = CploadTracker::default();
                        regs.clear_reg(GPR_GP);
                    }
                }
            }
            return Step::Normal;
        }

        regs.overwrite_dst(instr);
        Step::Normal
    }

    fn process_hi(&mut self, regs: &mut RegisterTracker, instr: &Instruction, instr_rom: Rom) {
        let (Some(rt), Some(imm)) = (instr.field().rt(), instr.field().imm_i16()) else {
            return;
        };
        let rt = rt as usize;
        let imm = imm as u32 as u16;

        self.result.add_hi_instr(instr_rom, rt as u8, imm);
        regs.process_hi(rt, imm, instr_rom);

        if self.is_pic() && rt == GPR_GP {
            self.cpload.hi_rom = Some(instr_rom);
        }
    }

    fn process_lo_candidate(
        &mut self,
        regs: &mut RegisterTracker,
        instr: &Instruction,
        instr_rom: Rom,
    ) -> Step {
        let opcode = instr.opcode();
        let (Some(base), Some(imm)) = (instr.field().rs(), instr.field().imm_i16()) else {
            regs.overwrite_dst(instr);
            return Step::Normal;
        };
        let base = base as usize;
        let dst = instr_destination(instr);

        // Second step of a `.cpload`: addiu $gp, $gp, %lo(_gp_disp).
        if self.is_pic() && base == GPR_GP && dst == Some(GPR_GP) {
            self.cpload.lo_rom = Some(instr_rom);
            return Step::Normal;
        }

        // $gp-relative access, resolved against the static gp value.
        if base == GPR_GP {
            if let Some(gp_config) = self.global_config.gp_config() {
                let address = Vram::new(gp_config.gp_value().inner().wrapping_add(imm as u32));
                if !self.owned_segment.is_vram_ignored(address) {
                    if gp_config.pic() {
                        self.result.add_got_access(instr_rom, address);
                    } else {
                        self.result.add_gprel_access(instr_rom, address);
                    }
                    self.record_access_type(instr, address);

                    if let Some(dst) = dst {
                        regs.process_lo(dst, address.inner(), instr_rom, None);
                        if opcode.does_load() {
                            regs.process_dereference(dst, instr_rom);
                        }
                    }
                    return Step::Normal;
                }
            }
        }

        if let Some(hi_info) = regs.get_hi_info_for_lo(base) {
            let address = if is_unsigned_lo(instr) {
                ((hi_info.value as u32) << 16) | (imm as u32 & 0xFFFF)
            } else {
                ((hi_info.value as u32) << 16).wrapping_add(imm as u32)
            };
            let address_vram = Vram::new(address);

            if self.owned_segment.is_vram_ignored(address_vram)
                || !self.context.in_any_vram_range(address_vram)
            {
                // Not an address after all. Keep the pair as a constant so
                // the emitter can still reproduce the exact value.
                self.result.add_constant(hi_info.instr_rom, address);
                self.result.add_constant(instr_rom, address);
            } else {
                self.result
                    .add_address_pair(Some(hi_info.instr_rom), instr_rom, address_vram);
                self.record_access_type(instr, address_vram);
            }

            if let Some(dst) = dst {
                regs.process_lo(dst, address, instr_rom, Some(hi_info.instr_rom));
                if opcode.does_load() {
                    regs.process_dereference(dst, instr_rom);
                }
            }
            return Step::Normal;
        }

        // Dereference of an address materialized earlier, like a field
        // access off a struct pointer.
        if opcode.does_dereference() {
            if let Some(address) = regs.get_address_for_deref(base) {
                let target = Vram::new(address.wrapping_add(imm as u32));
                if !self.owned_segment.is_vram_ignored(target)
                    && self.context.in_any_vram_range(target)
                {
                    self.record_access_type(instr, target);
                }
            }
        }

        regs.overwrite_dst(instr);
        Step::Normal
    }

    fn record_access_type(&mut self, instr: &Instruction, address: Vram) {
        if let Some(access_type) = instr.opcode().access_type() {
            self.result.add_type_info(
                address,
                access_type,
                instr.opcode().does_unsigned_memory_access(),
            );
        }
    }

    fn is_pic(&self) -> bool {
        self.global_config.gp_config().is_some_and(|x| x.pic())
    }
}

fn is_unsigned_lo(instr: &Instruction) -> bool {
    instr.opcode().name() == "ori"
}

/// Operands of copy-like and add-like register instructions, the ones worth
/// propagating tracked state across.
fn move_like_operands(instr: &Instruction) -> Option<(usize, usize, usize)> {
    if !matches!(instr.opcode().name(), "addu" | "daddu" | "or" | "move") {
        return None;
    }

    let dst = instr.field().rd()? as usize;
    let left = instr.field().rs()? as usize;
    let right = instr.field().rt()? as usize;
    Some((dst, left, right))
}

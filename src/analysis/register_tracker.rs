/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::Instruction;

use crate::addresses::Rom;

use super::{HiInfo, JrRegData, TrackedRegisterState};

pub(crate) const GPR_COUNT: usize = 32;

pub(crate) const GPR_ZERO: usize = 0;
pub(crate) const GPR_GP: usize = 28;
pub(crate) const GPR_T9: usize = 25;
pub(crate) const GPR_RA: usize = 31;

/// Registers which a function call is allowed to clobber under every MIPS
/// calling convention we care about.
const CALLER_SAVED: [usize; 18] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 24, 25, 31];

/// Per-register abstract state for one pass over a function's body.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct RegisterTracker {
    registers: [TrackedRegisterState; GPR_COUNT],
}

impl RegisterTracker {
    pub(crate) fn new() -> Self {
        Self {
            registers: [TrackedRegisterState::new(); GPR_COUNT],
        }
    }

    pub(crate) fn state(&self, reg: usize) -> &TrackedRegisterState {
        &self.registers[reg]
    }

    pub(crate) fn clear_reg(&mut self, reg: usize) {
        if reg != GPR_ZERO {
            self.registers[reg].clear();
        }
    }

    pub(crate) fn unset_registers_after_func_call(&mut self) {
        for reg in CALLER_SAVED {
            self.registers[reg].clear();
        }
    }

    pub(crate) fn process_hi(&mut self, reg: usize, value: u16, instr_rom: Rom) {
        if reg != GPR_ZERO {
            self.registers[reg].set_hi(value, instr_rom);
        }
    }

    pub(crate) fn process_lo(&mut self, reg: usize, address: u32, instr_rom: Rom, hi_rom: Option<Rom>) {
        if reg != GPR_ZERO {
            self.registers[reg].set_lo(address, instr_rom, hi_rom);
        }
    }

    pub(crate) fn process_dereference(&mut self, reg: usize, instr_rom: Rom) {
        if reg != GPR_ZERO {
            self.registers[reg].set_dereferenced(instr_rom);
        }
    }

    /// Copies the whole state of `src` into `dst`, for copy-like
    /// instructions (`move`, `addu` with `$zero`, plain `or`).
    pub(crate) fn process_move(&mut self, dst: usize, src: usize) {
        if dst != GPR_ZERO {
            self.registers[dst] = self.registers[src];
        }
    }

    /// Propagates a pending `hi` across an `addu dst, base, index`, which is
    /// how jumptable dispatches compute their entry address.
    pub(crate) fn propagate_hi_for_addu(&mut self, dst: usize, left: usize, right: usize) {
        let propagated = if let Some(hi_info) = self.registers[left].hi_info() {
            Some(hi_info)
        } else {
            self.registers[right].hi_info()
        };

        if dst != GPR_ZERO {
            match propagated {
                Some(HiInfo { instr_rom, value }) => self.registers[dst].set_hi(value, instr_rom),
                None => self.registers[dst].clear(),
            }
        }
    }

    pub(crate) fn get_hi_info_for_lo(&self, base_reg: usize) -> Option<HiInfo> {
        self.registers[base_reg].hi_info()
    }

    pub(crate) fn get_address_for_deref(&self, base_reg: usize) -> Option<u32> {
        self.registers[base_reg].lo_info().map(|x| x.address)
    }

    pub(crate) fn get_jr_reg_data(&self, reg: usize) -> Option<JrRegData> {
        let state = &self.registers[reg];
        let lo_info = state.lo_info()?;

        Some(JrRegData::new(
            lo_info.instr_rom,
            lo_info.address,
            state.dereferenced().is_some(),
        ))
    }

    /// Clears the state of whatever register `instr` writes to.
    ///
    /// Must run after the instruction's sources have been consumed, since an
    /// instruction may read and write the same register.
    pub(crate) fn overwrite_dst(&mut self, instr: &Instruction) {
        if let Some(dst) = instr_destination(instr) {
            self.clear_reg(dst);
        }
    }
}

/// The general purpose register an instruction writes to, if any.
pub(crate) fn instr_destination(instr: &Instruction) -> Option<usize> {
    let opcode = instr.opcode();
    if opcode.modifies_rd() {
        instr.field().rd().map(|x| x as usize)
    } else if opcode.modifies_rt() {
        instr.field().rt().map(|x| x as usize)
    } else {
        None
    }
}

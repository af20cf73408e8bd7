/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::addresses::Rom;

/// A pending `lui` whose pairing `lo` has not been seen yet.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub(crate) struct HiInfo {
    pub(crate) instr_rom: Rom,
    pub(crate) value: u16,
}

/// A fully materialized address sitting on a register.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub(crate) struct LoInfo {
    pub(crate) instr_rom: Rom,
    pub(crate) address: u32,
    pub(crate) hi_rom: Option<Rom>,
}

/// The abstract value tracked for a single register.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Default)]
pub(crate) struct TrackedRegisterState {
    hi_info: Option<HiInfo>,
    lo_info: Option<LoInfo>,
    /// Rom of the load which dereferenced the address held by this register.
    dereferenced: Option<Rom>,
}

impl TrackedRegisterState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.hi_info = None;
        self.lo_info = None;
        self.dereferenced = None;
    }

    pub(crate) fn hi_info(&self) -> Option<HiInfo> {
        self.hi_info
    }
    pub(crate) fn lo_info(&self) -> Option<LoInfo> {
        self.lo_info
    }
    pub(crate) fn dereferenced(&self) -> Option<Rom> {
        self.dereferenced
    }

    pub(crate) fn set_hi(&mut self, value: u16, instr_rom: Rom) {
        self.clear();
        self.hi_info = Some(HiInfo { instr_rom, value });
    }

    pub(crate) fn set_lo(&mut self, address: u32, instr_rom: Rom, hi_rom: Option<Rom>) {
        self.hi_info = None;
        self.lo_info = Some(LoInfo {
            instr_rom,
            address,
            hi_rom,
        });
        self.dereferenced = None;
    }

    pub(crate) fn set_dereferenced(&mut self, instr_rom: Rom) {
        self.dereferenced = Some(instr_rom);
    }
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::{btree_map::BTreeMap, btree_set::BTreeSet};

use rabbitizer::{access_type::AccessType, Vram};

use crate::{
    addresses::{Rom, RomVramRange},
    collections::{UnorderedMap, UnorderedSet},
};

/// Everything a pass over a function's instructions figured out.
///
/// All maps are keyed by the rom address of the instruction that produced
/// the fact, so reloc generation can line facts back up with instruction
/// indices.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionAnalysisResult {
    ranges: RomVramRange,

    branch_targets: BTreeMap<Rom, Vram>,
    branch_targets_outside: BTreeMap<Rom, Vram>,

    func_calls: BTreeMap<Rom, Vram>,

    referenced_jumptables: BTreeMap<Rom, Vram>,

    hi_instrs: BTreeMap<Rom, (u8, u16)>,
    address_per_hi_instr: BTreeMap<Rom, Vram>,
    address_per_lo_instr: BTreeMap<Rom, Vram>,
    address_per_gprel_instr: BTreeMap<Rom, Vram>,
    address_per_got_instr: BTreeMap<Rom, Vram>,

    constant_per_instr: BTreeMap<Rom, u32>,

    type_info_per_address: BTreeMap<Vram, UnorderedMap<(AccessType, bool), u32>>,

    cpload_roms: BTreeSet<Rom>,

    handwritten_instrs: BTreeSet<Rom>,

    referenced_vrams: UnorderedSet<Vram>,
}

impl InstructionAnalysisResult {
    pub(crate) fn new(ranges: RomVramRange) -> Self {
        Self {
            ranges,
            branch_targets: BTreeMap::new(),
            branch_targets_outside: BTreeMap::new(),
            func_calls: BTreeMap::new(),
            referenced_jumptables: BTreeMap::new(),
            hi_instrs: BTreeMap::new(),
            address_per_hi_instr: BTreeMap::new(),
            address_per_lo_instr: BTreeMap::new(),
            address_per_gprel_instr: BTreeMap::new(),
            address_per_got_instr: BTreeMap::new(),
            constant_per_instr: BTreeMap::new(),
            type_info_per_address: BTreeMap::new(),
            cpload_roms: BTreeSet::new(),
            handwritten_instrs: BTreeSet::new(),
            referenced_vrams: UnorderedSet::new(),
        }
    }

    #[must_use]
    pub const fn ranges(&self) -> &RomVramRange {
        &self.ranges
    }

    /// Branch targets which land inside this function.
    #[must_use]
    pub fn branch_targets(&self) -> &BTreeMap<Rom, Vram> {
        &self.branch_targets
    }

    /// Branch targets which land outside this function's known extent.
    #[must_use]
    pub fn branch_targets_outside(&self) -> &BTreeMap<Rom, Vram> {
        &self.branch_targets_outside
    }

    #[must_use]
    pub fn func_calls(&self) -> &BTreeMap<Rom, Vram> {
        &self.func_calls
    }

    #[must_use]
    pub fn referenced_jumptables(&self) -> &BTreeMap<Rom, Vram> {
        &self.referenced_jumptables
    }

    /// Every `lui`, paired or not. The value is `(rt, imm)`.
    #[must_use]
    pub fn hi_instrs(&self) -> &BTreeMap<Rom, (u8, u16)> {
        &self.hi_instrs
    }

    #[must_use]
    pub fn address_per_hi_instr(&self) -> &BTreeMap<Rom, Vram> {
        &self.address_per_hi_instr
    }

    #[must_use]
    pub fn address_per_lo_instr(&self) -> &BTreeMap<Rom, Vram> {
        &self.address_per_lo_instr
    }

    #[must_use]
    pub fn address_per_gprel_instr(&self) -> &BTreeMap<Rom, Vram> {
        &self.address_per_gprel_instr
    }

    #[must_use]
    pub fn address_per_got_instr(&self) -> &BTreeMap<Rom, Vram> {
        &self.address_per_got_instr
    }

    #[must_use]
    pub fn constant_per_instr(&self) -> &BTreeMap<Rom, u32> {
        &self.constant_per_instr
    }

    #[must_use]
    pub fn type_info_per_address(
        &self,
    ) -> &BTreeMap<Vram, UnorderedMap<(AccessType, bool), u32>> {
        &self.type_info_per_address
    }

    /// Instructions that make up a recognized `.cpload` preamble.
    #[must_use]
    pub fn cpload_roms(&self) -> &BTreeSet<Rom> {
        &self.cpload_roms
    }

    #[must_use]
    pub fn handwritten_instrs(&self) -> &BTreeSet<Rom> {
        &self.handwritten_instrs
    }

    #[must_use]
    pub fn referenced_vrams(&self) -> &UnorderedSet<Vram> {
        &self.referenced_vrams
    }
}

impl InstructionAnalysisResult {
    pub(crate) fn add_branch_target(&mut self, instr_rom: Rom, target: Vram) {
        if self.ranges.in_vram_range(target) {
            self.branch_targets.entry(instr_rom).or_insert(target);
        } else {
            self.branch_targets_outside
                .entry(instr_rom)
                .or_insert(target);
        }
    }

    pub(crate) fn add_func_call(&mut self, instr_rom: Rom, target: Vram) {
        self.func_calls.entry(instr_rom).or_insert(target);
        self.referenced_vrams.insert(target);
    }

    pub(crate) fn add_referenced_jumptable(&mut self, instr_rom: Rom, table: Vram) {
        self.referenced_jumptables.entry(instr_rom).or_insert(table);
        self.referenced_vrams.insert(table);
    }

    pub(crate) fn add_hi_instr(&mut self, instr_rom: Rom, reg: u8, imm: u16) {
        self.hi_instrs.entry(instr_rom).or_insert((reg, imm));
    }

    pub(crate) fn add_address_pair(&mut self, hi_rom: Option<Rom>, lo_rom: Rom, address: Vram) {
        if let Some(hi_rom) = hi_rom {
            self.address_per_hi_instr.entry(hi_rom).or_insert(address);
        }
        self.address_per_lo_instr.entry(lo_rom).or_insert(address);
        self.referenced_vrams.insert(address);
    }

    pub(crate) fn add_gprel_access(&mut self, instr_rom: Rom, address: Vram) {
        self.address_per_gprel_instr
            .entry(instr_rom)
            .or_insert(address);
        self.referenced_vrams.insert(address);
    }

    pub(crate) fn add_got_access(&mut self, instr_rom: Rom, address: Vram) {
        self.address_per_got_instr
            .entry(instr_rom)
            .or_insert(address);
        self.referenced_vrams.insert(address);
    }

    pub(crate) fn add_constant(&mut self, instr_rom: Rom, constant: u32) {
        self.constant_per_instr.entry(instr_rom).or_insert(constant);
    }

    pub(crate) fn add_type_info(
        &mut self,
        address: Vram,
        access_type: AccessType,
        unsigned: bool,
    ) {
        *self
            .type_info_per_address
            .entry(address)
            .or_default()
            .entry((access_type, unsigned))
            .or_default() += 1;
    }

    pub(crate) fn add_cpload_rom(&mut self, instr_rom: Rom) {
        self.cpload_roms.insert(instr_rom);
    }

    pub(crate) fn add_handwritten_instr(&mut self, instr_rom: Rom) {
        self.handwritten_instrs.insert(instr_rom);
    }
}

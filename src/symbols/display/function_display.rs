/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

use rabbitizer::{InstructionDisplayFlags, Vram};

use crate::{
    addresses::Size,
    collections::FindSettings,
    context::Context,
    metadata::SymbolType,
    relocation::RelocationType,
    symbols::{FunctionSym, RomSymbol, Symbol},
};

use super::{SymCommonDisplaySettings, SymDisplayError, WordComment};

#[derive(Debug, Clone)]
pub struct FunctionDisplaySettings {
    common: SymCommonDisplaySettings,

    display_flags: InstructionDisplayFlags,

    asm_label: Arc<str>,
    jumptable_label_macro: Arc<str>,
    eh_label_macro: Arc<str>,

    /// Expand `%gp_rel` operands into the plain-symbol form and declare the
    /// touched symbols with `.extern`.
    gp_rel_hack: bool,

    /// Collapse a detected PIC preamble into a `.cpload` directive.
    emit_cpload: bool,

    /// Name branch labels `.L_<function>_<n>` instead of by address.
    sequential_label_names: bool,
}

impl FunctionDisplaySettings {
    pub fn new(display_flags: InstructionDisplayFlags) -> Self {
        Self {
            common: SymCommonDisplaySettings::new(),
            display_flags,
            asm_label: "glabel".into(),
            jumptable_label_macro: "jlabel".into(),
            eh_label_macro: "ehlabel".into(),
            gp_rel_hack: false,
            emit_cpload: true,
            sequential_label_names: false,
        }
    }

    #[must_use]
    pub fn with_common(self, common: SymCommonDisplaySettings) -> Self {
        Self { common, ..self }
    }

    #[must_use]
    pub fn with_asm_label(self, asm_label: Arc<str>) -> Self {
        Self { asm_label, ..self }
    }

    #[must_use]
    pub fn with_gp_rel_hack(self, gp_rel_hack: bool) -> Self {
        Self {
            gp_rel_hack,
            ..self
        }
    }

    #[must_use]
    pub fn with_emit_cpload(self, emit_cpload: bool) -> Self {
        Self {
            emit_cpload,
            ..self
        }
    }

    #[must_use]
    pub fn with_sequential_label_names(self, sequential_label_names: bool) -> Self {
        Self {
            sequential_label_names,
            ..self
        }
    }

    #[must_use]
    pub fn common(&self) -> &SymCommonDisplaySettings {
        &self.common
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym FunctionSym,
    settings: &'flg FunctionDisplaySettings,

    /// Sequential names for the labels inside this function, when enabled.
    label_overrides: BTreeMap<Vram, String>,
}

impl<'ctx, 'sym, 'flg> FunctionDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym FunctionSym,
        settings: &'flg FunctionDisplaySettings,
    ) -> Result<Self, SymDisplayError> {
        let mut label_overrides = BTreeMap::new();

        if settings.sequential_label_names {
            let metadata = sym.find_own_metadata(context)?;
            let func_name = metadata
                .display_name()
                .with_naming(context.global_config())
                .to_string();
            let owned_segment = context.find_owned_segment(sym.parent_segment_info())?;

            let mut counter = 0;
            for (vram, label) in owned_segment.find_symbols_range(*sym.vram_range()) {
                if *vram == sym.vram_range().start() {
                    continue;
                }
                if label.sym_type().is_some_and(|x| x.is_label()) {
                    label_overrides.insert(*vram, format!(".L_{}_{}", func_name, counter));
                    counter += 1;
                }
            }
        }

        Ok(Self {
            context,
            sym,
            settings,
            label_overrides,
        })
    }

    fn label_name_for(&self, vram: Vram, label_type: SymbolType) -> Option<String> {
        if let Some(name) = self.label_overrides.get(&vram) {
            return Some(name.clone());
        }

        let owned_segment = self
            .context
            .find_owned_segment(self.sym.parent_segment_info())
            .ok()?;
        let metadata = owned_segment.find_symbol(vram, FindSettings::new(false))?;
        if metadata.sym_type() != Some(label_type) {
            return None;
        }
        Some(
            metadata
                .display_name()
                .with_naming(self.context.global_config())
                .to_string(),
        )
    }

    /// The override text shown instead of the instruction's immediate, built
    /// from the reloc attached to that instruction.
    fn operand_override(&self, instr_index: usize) -> Option<String> {
        let reloc = self.sym.relocs().get(instr_index)?.as_ref()?;

        if let crate::relocation::RelocReferencedSym::Address(address) = reloc.referenced_sym() {
            if reloc.reloc_type() == RelocationType::R_MIPS_PC16 {
                if let Some(name) = self.label_overrides.get(address) {
                    return Some(name.clone());
                }
            }
        }

        if self.settings.gp_rel_hack && reloc.reloc_type() == RelocationType::R_MIPS_GPREL16 {
            return reloc.display_bare_str(self.context, self.sym.parent_segment_info());
        }

        reloc.display_str(self.context, self.sym.parent_segment_info())
    }

    /// Every symbol referenced through `%gp_rel`, for the `.extern` prelude
    /// of the gp-rel expansion hack.
    fn gp_rel_referenced_syms(&self) -> BTreeMap<String, Size> {
        let mut out = BTreeMap::new();

        let Ok(owned_segment) = self
            .context
            .find_owned_segment(self.sym.parent_segment_info())
        else {
            return out;
        };

        for reloc in self.sym.relocs().iter().flatten() {
            if reloc.reloc_type() != RelocationType::R_MIPS_GPREL16 {
                continue;
            }
            let crate::relocation::RelocReferencedSym::Address(address) = reloc.referenced_sym()
            else {
                continue;
            };
            let Some(metadata) = owned_segment.find_symbol(*address, FindSettings::new(true))
            else {
                continue;
            };

            out.insert(
                metadata
                    .display_name()
                    .with_naming(self.context.global_config())
                    .to_string(),
                metadata.size_or_aligned_default(),
            );
        }

        out
    }
}

impl fmt::Display for FunctionDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.sym.find_own_metadata(self.context).map_err(|_| fmt::Error)?;
        let name = metadata
            .display_name()
            .with_naming(self.context.global_config());
        let line_end = self.settings.common.line_end();

        if self.settings.gp_rel_hack {
            for (sym_name, size) in self.gp_rel_referenced_syms() {
                write!(f, ".extern {}, {}{}", sym_name, size, line_end)?;
            }
        }

        write!(f, "{} {}{}", self.settings.asm_label, name, line_end)?;

        // Handwritten code relies on explicit delay slots and raw `$at`
        // usage, which the assembler's macros are free to rewrite.
        let is_handwritten = !self.sym.handwritten_instrs().is_empty();
        if is_handwritten {
            self.settings.common.display_indentation(f)?;
            write!(f, ".set noreorder{}", line_end)?;
            self.settings.common.display_indentation(f)?;
            write!(f, ".set noat{}", line_end)?;
        }

        let vram_start = self.sym.vram_range().start();
        let rom_start = self.sym.rom_vram_range().rom().start();
        let cpload_roms = self.sym.instr_analysis().cpload_roms();
        let mut cpload_emitted = false;

        for (i, instr) in self.sym.instructions().iter().enumerate() {
            let current_vram = vram_start + Size::new(i as u32 * 4);
            let current_rom = rom_start + Size::new(i as u32 * 4);

            // Labels land before their instruction.
            if i != 0 {
                if let Some(label_name) =
                    self.label_name_for(current_vram, SymbolType::JumptableLabel)
                {
                    self.settings.common.display_label_indentation(f)?;
                    write!(
                        f,
                        "{} {}{}",
                        self.settings.jumptable_label_macro, label_name, line_end
                    )?;
                } else if let Some(label_name) =
                    self.label_name_for(current_vram, SymbolType::GccExceptTableLabel)
                {
                    self.settings.common.display_label_indentation(f)?;
                    write!(
                        f,
                        "{} {}{}",
                        self.settings.eh_label_macro, label_name, line_end
                    )?;
                } else if let Some(label_name) =
                    self.label_name_for(current_vram, SymbolType::BranchLabel)
                {
                    self.settings.common.display_label_indentation(f)?;
                    write!(f, "{}:{}", label_name, line_end)?;
                }
            }

            // `.cpload` is itself a macro, so it stays suppressed on
            // handwritten functions and the raw preamble is kept.
            if cpload_roms.contains(&current_rom) && self.settings.emit_cpload && !is_handwritten
            {
                if !cpload_emitted {
                    self.settings.common.display_indentation(f)?;
                    write!(f, ".cpload $t9{}", line_end)?;
                    cpload_emitted = true;
                }
                continue;
            }

            self.settings.common.display_indentation(f)?;
            self.settings.common.display_asm_comment(
                f,
                Some(current_rom),
                current_vram,
                WordComment::U32(instr.word()),
            )?;

            if instr.is_valid() {
                let imm_override = self.operand_override(i);
                write!(
                    f,
                    "{}{}",
                    instr.display(&self.settings.display_flags, imm_override.as_deref(), 0),
                    line_end
                )?;
            } else {
                // Invalid opcodes still have to reassemble byte-exactly.
                write!(
                    f,
                    ".word 0x{:08X} /* invalid instruction */{}",
                    instr.word(),
                    line_end
                )?;
            }
        }

        if is_handwritten {
            self.settings.common.display_indentation(f)?;
            write!(f, ".set at{}", line_end)?;
            self.settings.common.display_indentation(f)?;
            write!(f, ".set reorder{}", line_end)?;
        }

        if self.settings.common.emit_size_directive() {
            write!(f, ".size {}, . - {}{}", name, name, line_end)?;
        }

        if let Some(name_end) = metadata.user_declared_name_end() {
            write!(f, "{}:{}", name_end, line_end)?;
        }

        Ok(())
    }
}

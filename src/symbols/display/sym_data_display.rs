/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use rabbitizer::Vram;

use crate::{
    addresses::{Rom, Size},
    config::Endian,
    context::Context,
    metadata::{SymbolMetadata, SymbolType},
    section_type::SectionType,
    str_decoding::escape_string,
    symbols::{DataSym, RomSymbol, Symbol},
};

use super::{
    InternalSymDisplSettings, SymCommonDisplaySettings, SymDisplayError, WordComment,
};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymDataDisplaySettings {
    common: SymCommonDisplaySettings,
}

impl SymDataDisplaySettings {
    pub fn new() -> Self {
        Self {
            common: SymCommonDisplaySettings::new(),
        }
    }

    #[must_use]
    pub fn with_common(self, common: SymCommonDisplaySettings) -> Self {
        Self { common }
    }

    #[must_use]
    pub fn common(&self) -> &SymCommonDisplaySettings {
        &self.common
    }
}

impl Default for SymDataDisplaySettings {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct SymDataDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym DataSym,
    settings: &'flg SymDataDisplaySettings,

    internal_settings: InternalSymDisplSettings,
}

impl<'ctx, 'sym, 'flg> SymDataDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym DataSym,
        settings: &'flg SymDataDisplaySettings,
    ) -> Result<Self, SymDisplayError> {
        Self::new_internal(context, sym, settings, InternalSymDisplSettings::new(false))
    }

    pub(crate) fn new_internal(
        context: &'ctx Context,
        sym: &'sym DataSym,
        settings: &'flg SymDataDisplaySettings,
        internal_settings: InternalSymDisplSettings,
    ) -> Result<Self, SymDisplayError> {
        // Fail early if the context lost track of this symbol.
        sym.find_own_metadata(context)?;

        Ok(Self {
            context,
            sym,
            settings,
            internal_settings,
        })
    }

    fn endian(&self) -> Endian {
        self.context.global_config().endian()
    }

    fn element_position(&self, offset: usize) -> (Rom, Vram) {
        let rom = self.sym.rom_vram_range().rom().start() + Size::new(offset as u32);
        let vram = self.sym.vram_range().start() + Size::new(offset as u32);
        (rom, vram)
    }

    fn display_words(&self, f: &mut fmt::Formatter<'_>, start_offset: usize) -> fmt::Result {
        let bytes = self.sym.raw_bytes();
        let line_end = self.settings.common.line_end();

        let mut offset = start_offset;
        while offset + 4 <= bytes.len() {
            let word = self.endian().word_from_bytes(&bytes[offset..]);
            let (rom, vram) = self.element_position(offset);

            self.settings.common.display_indentation(f)?;
            self.settings
                .common
                .display_asm_comment(f, Some(rom), vram, WordComment::U32(word))?;

            let reloc_text = self
                .sym
                .relocs()
                .get(offset / 4)
                .and_then(|x| x.as_ref())
                .and_then(|x| x.display_str(self.context, self.sym.parent_segment_info()));
            match reloc_text {
                Some(text) => write!(f, ".word {}{}", text, line_end)?,
                None => write!(f, ".word 0x{:08X}{}", word, line_end)?,
            }

            offset += 4;
        }

        self.display_byte_tail(f, offset)
    }

    fn display_byte_tail(&self, f: &mut fmt::Formatter<'_>, start_offset: usize) -> fmt::Result {
        let bytes = self.sym.raw_bytes();
        let line_end = self.settings.common.line_end();

        for offset in start_offset..bytes.len() {
            let (rom, vram) = self.element_position(offset);

            self.settings.common.display_indentation(f)?;
            self.settings.common.display_asm_comment(
                f,
                Some(rom),
                vram,
                WordComment::U32(bytes[offset] as u32),
            )?;
            write!(f, ".byte 0x{:02X}{}", bytes[offset], line_end)?;
        }

        Ok(())
    }

    fn display_shorts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.sym.raw_bytes();
        let line_end = self.settings.common.line_end();

        let mut offset = 0;
        while offset + 2 <= bytes.len() {
            let value = self.endian().short_from_bytes(&bytes[offset..]);
            let (rom, vram) = self.element_position(offset);

            self.settings.common.display_indentation(f)?;
            self.settings
                .common
                .display_asm_comment(f, Some(rom), vram, WordComment::U32(value as u32))?;
            write!(f, ".short 0x{:04X}{}", value, line_end)?;

            offset += 2;
        }

        self.display_byte_tail(f, offset)
    }

    fn display_c_string(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.sym.raw_bytes();
        let line_end = self.settings.common.line_end();

        let Some(nul) = bytes.iter().position(|x| *x == 0) else {
            return self.display_words(f, 0);
        };

        let (rom, vram) = self.element_position(0);
        self.settings.common.display_indentation(f)?;
        self.settings
            .common
            .display_asm_comment(f, Some(rom), vram, WordComment::No)?;
        write!(f, ".asciz \"{}\"{}", escape_string(&bytes[..nul]), line_end)?;

        // Compilers pad strings up to the next word. The leftover beyond
        // that shows up when the next symbol required a stricter alignment.
        let mut offset = nul + 1;
        if offset % 4 != 0 && offset < bytes.len() {
            self.settings.common.display_indentation(f)?;
            write!(f, ".align 2{}", line_end)?;
            offset = offset.next_multiple_of(4);
        }

        self.display_words(f, offset.min(bytes.len()))
    }

    fn display_pascal_string(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.sym.raw_bytes();
        let line_end = self.settings.common.line_end();

        let Some(&length) = bytes.first() else {
            return self.display_words(f, 0);
        };
        let text_end = 1 + length as usize;
        if text_end > bytes.len() {
            return self.display_words(f, 0);
        }

        let (rom, vram) = self.element_position(0);
        self.settings.common.display_indentation(f)?;
        self.settings
            .common
            .display_asm_comment(f, Some(rom), vram, WordComment::No)?;
        write!(f, ".byte 0x{:02X}{}", length, line_end)?;
        self.settings.common.display_indentation(f)?;
        write!(
            f,
            ".ascii \"{}\"{}",
            escape_string(&bytes[1..text_end]),
            line_end
        )?;

        let mut offset = text_end;
        if offset % 4 != 0 && offset < bytes.len() {
            self.settings.common.display_indentation(f)?;
            write!(f, ".align 2{}", line_end)?;
            offset = offset.next_multiple_of(4);
        }

        self.display_words(f, offset.min(bytes.len()))
    }

    fn display_float(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.sym.raw_bytes();
        let line_end = self.settings.common.line_end();

        if bytes.len() < 4 {
            return self.display_byte_tail(f, 0);
        }

        let word = self.endian().word_from_bytes(bytes);
        let value = f32::from_bits(word);
        if !value.is_finite() {
            return self.display_words(f, 0);
        }

        let (rom, vram) = self.element_position(0);
        self.settings.common.display_indentation(f)?;
        self.settings
            .common
            .display_asm_comment(f, Some(rom), vram, WordComment::U32(word))?;
        write!(f, ".float {:?}{}", value, line_end)?;

        self.display_words(f, 4)
    }

    fn display_double(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.sym.raw_bytes();
        let line_end = self.settings.common.line_end();

        if bytes.len() < 8 {
            return self.display_words(f, 0);
        }

        // On little endian images the two halves are stored swapped; going
        // through the endian-aware dword read puts them back together, and
        // the assembler redoes the swap on output.
        let dword = self.endian().dword_from_bytes(bytes);
        let value = f64::from_bits(dword);
        if !value.is_finite() {
            return self.display_words(f, 0);
        }

        let (rom, vram) = self.element_position(0);
        self.settings.common.display_indentation(f)?;
        self.settings
            .common
            .display_asm_comment(f, Some(rom), vram, WordComment::U64(dword))?;
        write!(f, ".double {:?}{}", value, line_end)?;

        self.display_words(f, 8)
    }

    fn prev_align(&self, metadata: &SymbolMetadata) -> Option<u8> {
        let sym_type = metadata.sym_type()?;
        let compiler = metadata.compiler()?;
        compiler.prev_align_for_type(sym_type)
    }
}

impl fmt::Display for SymDataDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self
            .sym
            .find_own_metadata(self.context)
            .map_err(|_| fmt::Error)?;
        let name = metadata
            .display_name()
            .with_naming(self.context.global_config());
        let line_end = self.settings.common.line_end();

        if let Some(align) = self.prev_align(metadata) {
            write!(f, ".align {}{}", align, line_end)?;
        }

        // Rodata which moved inside a function's file gets the full-blown
        // label so reassembly keeps its visibility.
        let label_macro: &str = if self.internal_settings.migrated() {
            "glabel"
        } else {
            "dlabel"
        };
        write!(f, "{} {}{}", label_macro, name, line_end)?;

        match metadata.sym_type() {
            Some(SymbolType::CString) => self.display_c_string(f)?,
            Some(SymbolType::PascalString) => self.display_pascal_string(f)?,
            Some(SymbolType::Float32) => self.display_float(f)?,
            Some(SymbolType::Float64) => self.display_double(f)?,
            Some(SymbolType::Byte) => self.display_byte_tail(f, 0)?,
            Some(SymbolType::Short) => self.display_shorts(f)?,
            _ => {
                if self.sym.section_type() == SectionType::GccExceptTable
                    || self.sym.vram_range().start().inner() % 4 == 0
                {
                    self.display_words(f, 0)?
                } else {
                    self.display_byte_tail(f, 0)?
                }
            }
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

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::sync::Arc;
use core::fmt;

use rabbitizer::Vram;

use crate::addresses::Rom;

/// The value shown on the end-of-line hex comment.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum WordComment {
    No,
    U32(u32),
    U64(u64),
}

/// Emission knobs shared by every symbol kind.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymCommonDisplaySettings {
    line_end: Option<Arc<str>>,

    emit_asm_comment: bool,

    asm_indentation: u8,
    asm_indentation_labels: u8,

    emit_size_directive: bool,
}

impl SymCommonDisplaySettings {
    pub fn new() -> Self {
        Self {
            line_end: None,
            emit_asm_comment: true,
            asm_indentation: 4,
            asm_indentation_labels: 2,
            emit_size_directive: false,
        }
    }

    #[must_use]
    pub fn with_line_end(self, line_end: Option<Arc<str>>) -> Self {
        Self { line_end, ..self }
    }

    #[must_use]
    pub fn with_emit_asm_comment(self, emit_asm_comment: bool) -> Self {
        Self {
            emit_asm_comment,
            ..self
        }
    }

    #[must_use]
    pub fn with_asm_indentation(self, asm_indentation: u8) -> Self {
        Self {
            asm_indentation,
            ..self
        }
    }

    #[must_use]
    pub fn with_asm_indentation_labels(self, asm_indentation_labels: u8) -> Self {
        Self {
            asm_indentation_labels,
            ..self
        }
    }

    #[must_use]
    pub fn with_emit_size_directive(self, emit_size_directive: bool) -> Self {
        Self {
            emit_size_directive,
            ..self
        }
    }

    #[must_use]
    pub fn line_end(&self) -> &str {
        self.line_end.as_deref().unwrap_or("\n")
    }

    #[must_use]
    pub fn emit_size_directive(&self) -> bool {
        self.emit_size_directive
    }
}

impl SymCommonDisplaySettings {
    pub(crate) fn display_indentation(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.asm_indentation {
            write!(f, " ")?;
        }
        Ok(())
    }

    pub(crate) fn display_label_indentation(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.asm_indentation_labels {
            write!(f, " ")?;
        }
        Ok(())
    }

    /// The `/* rom vram word */` comment prefixing emitted lines.
    pub(crate) fn display_asm_comment(
        &self,
        f: &mut fmt::Formatter<'_>,
        rom: Option<Rom>,
        vram: Vram,
        word: WordComment,
    ) -> fmt::Result {
        if !self.emit_asm_comment {
            return Ok(());
        }

        write!(f, "/* ")?;
        if let Some(rom) = rom {
            write!(f, "{:06X} ", rom.inner())?;
        }
        write!(f, "{:08X} ", vram.inner())?;
        match word {
            WordComment::No => {}
            WordComment::U32(word) => write!(f, "{:08X} ", word)?,
            WordComment::U64(dword) => write!(f, "{:016X} ", dword)?,
        }
        write!(f, "*/ ")
    }
}

impl Default for SymCommonDisplaySettings {
    fn default() -> Self {
        Self::new()
    }
}

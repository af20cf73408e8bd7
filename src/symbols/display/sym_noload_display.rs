/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use crate::{
    context::Context,
    symbols::{NoloadSym, Symbol},
};

use super::{SymCommonDisplaySettings, SymDisplayError, WordComment};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymNoloadDisplaySettings {
    common: SymCommonDisplaySettings,
}

impl Default for SymNoloadDisplaySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SymNoloadDisplaySettings {
    pub fn new() -> Self {
        Self {
            common: SymCommonDisplaySettings::new(),
        }
    }

    #[must_use]
    pub fn with_common(self, common: SymCommonDisplaySettings) -> Self {
        Self { common }
    }
}

#[derive(Debug, Clone)]
pub struct SymNoloadDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym NoloadSym,
    settings: &'flg SymNoloadDisplaySettings,
}

impl<'ctx, 'sym, 'flg> SymNoloadDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym NoloadSym,
        settings: &'flg SymNoloadDisplaySettings,
    ) -> Result<Self, SymDisplayError> {
        sym.find_own_metadata(context)?;

        Ok(Self {
            context,
            sym,
            settings,
        })
    }
}

impl fmt::Display for SymNoloadDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self
            .sym
            .find_own_metadata(self.context)
            .map_err(|_| fmt::Error)?;

        let name = metadata
            .display_name()
            .with_naming(self.context.global_config());
        let line_end = self.settings.common.line_end();

        // Pads only exist to cover the distance up to the next declared
        // symbol, no point in exporting them.
        if !metadata.is_autogenerated_pad() {
            write!(f, ".globl {}{}", name, line_end)?;
        }
        write!(f, "{}:{}", name, line_end)?;

        self.settings.common.display_asm_comment(
            f,
            None,
            self.sym.vram_range().start(),
            WordComment::No,
        )?;
        write!(f, " .space 0x{:02X}{}", self.sym.size().inner(), line_end)?;

        Ok(())
    }
}

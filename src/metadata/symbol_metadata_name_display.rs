/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use crate::{config::GlobalConfig, section_type::SectionType};

use super::{SymbolMetadata, SymbolType};

/// Renders the name of a symbol, either the user-declared one or a
/// deterministic autogenerated one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SymbolMetadataNameDisplay<'sym> {
    sym: &'sym SymbolMetadata,
    custom_suffix: Option<&'sym str>,
    legacy_zero_padding: bool,
}

impl<'sym> SymbolMetadataNameDisplay<'sym> {
    pub(crate) fn new(sym: &'sym SymbolMetadata) -> Self {
        Self {
            sym,
            custom_suffix: None,
            legacy_zero_padding: false,
        }
    }

    /// Picks up the naming knobs of the given config.
    #[must_use]
    pub fn with_naming<'conf: 'sym>(self, config: &'conf GlobalConfig) -> Self {
        Self {
            sym: self.sym,
            custom_suffix: config.custom_suffix(),
            legacy_zero_padding: config.legacy_sym_addr_zero_padding(),
        }
    }

    fn autogenerated_prefix(&self) -> &'static str {
        match self.sym.sym_type() {
            Some(SymbolType::Function) => "func_",
            Some(SymbolType::BranchLabel) => ".L",
            Some(SymbolType::Jumptable) => "jtbl_",
            Some(SymbolType::JumptableLabel) => ".L",
            Some(SymbolType::GccExceptTable) => "ehtbl_",
            Some(SymbolType::GccExceptTableLabel) => "$LEH_",
            Some(SymbolType::CString | SymbolType::PascalString) => "STR_",
            Some(SymbolType::Float32) => "FLT_",
            Some(SymbolType::Float64) => "DBL_",
            Some(
                SymbolType::Byte | SymbolType::Short | SymbolType::Word | SymbolType::DWord,
            )
            | None => match self.sym.section_type() {
                Some(SectionType::Text) => "func_",
                Some(SectionType::Rodata) => "RO_",
                Some(SectionType::Bss) => "B_",
                Some(SectionType::Reloc) => "REL_",
                Some(SectionType::GccExceptTable) => "ehtbl_",
                Some(SectionType::Data) | None => "D_",
            },
        }
    }
}

/// Assemblers choke on a few characters when they show up raw on a symbol
/// name, so those names get quoted.
fn name_needs_quoting(name: &str) -> bool {
    name.chars().any(|c| matches!(c, '@' | '<' | '\\' | '-' | '+'))
}

impl fmt::Display for SymbolMetadataNameDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.sym.user_declared_name() {
            if name_needs_quoting(name) {
                return write!(f, "\"{}\"", name);
            }
            return write!(f, "{}", name);
        }

        let prefix = self.autogenerated_prefix();
        let addr = self.sym.vram().inner();
        if self.legacy_zero_padding {
            write!(f, "{}{:06X}", prefix, addr)?;
        } else {
            write!(f, "{}{:08X}", prefix, addr)?;
        }

        if let Some(suffix) = self.custom_suffix {
            write!(f, "{}", suffix)?;
        }

        Ok(())
    }
}

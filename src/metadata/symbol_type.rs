/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::access_type::AccessType;

use crate::{addresses::Size, config::Compiler};

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SymbolType {
    Function,
    BranchLabel,
    Jumptable,
    JumptableLabel,
    GccExceptTable,
    GccExceptTableLabel,

    Byte,
    Short,
    Word,
    DWord,
    Float32,
    Float64,
    CString,
    PascalString,
}

impl SymbolType {
    #[must_use]
    pub fn is_label(&self) -> bool {
        matches!(
            self,
            SymbolType::BranchLabel | SymbolType::JumptableLabel | SymbolType::GccExceptTableLabel
        )
    }

    #[must_use]
    pub fn is_table(&self) -> bool {
        matches!(self, SymbolType::Jumptable | SymbolType::GccExceptTable)
    }

    #[must_use]
    pub fn valid_branch_target(&self) -> bool {
        matches!(self, SymbolType::Function) || self.is_label()
    }

    /// Whether the words of a symbol with this type may be pointers to other
    /// symbols.
    #[must_use]
    pub fn can_reference_symbols(&self) -> bool {
        matches!(
            self,
            SymbolType::Word | SymbolType::Jumptable | SymbolType::GccExceptTable
        )
    }

    #[must_use]
    pub fn is_late_rodata(&self, compiler: Option<Compiler>) -> bool {
        matches!(
            self,
            SymbolType::Jumptable | SymbolType::Float32 | SymbolType::Float64
        ) && compiler.is_some_and(|x| x.allows_late_rodata())
    }

    /// The size this type implies, if it implies one at all.
    #[must_use]
    pub fn fixed_size(&self) -> Option<Size> {
        match self {
            SymbolType::Byte => Some(Size::new(1)),
            SymbolType::Short => Some(Size::new(2)),
            SymbolType::Word | SymbolType::Float32 => Some(Size::new(4)),
            SymbolType::DWord | SymbolType::Float64 => Some(Size::new(8)),
            _ => None,
        }
    }

    /// Priority used when multiple autodetections collide on the same
    /// address. Higher wins.
    pub(crate) fn detection_priority(&self) -> u8 {
        match self {
            SymbolType::Function => 10,
            SymbolType::Jumptable | SymbolType::GccExceptTable => 9,
            SymbolType::JumptableLabel | SymbolType::GccExceptTableLabel => 8,
            SymbolType::BranchLabel => 7,
            SymbolType::CString | SymbolType::PascalString => 6,
            SymbolType::Float64 | SymbolType::Float32 => 5,
            SymbolType::DWord | SymbolType::Word | SymbolType::Short | SymbolType::Byte => 4,
        }
    }

    #[must_use]
    pub fn from_access_type(access_type: AccessType, unsigned: bool) -> Option<Self> {
        // The signedness of an access doesn't change the underlying width.
        let _ = unsigned;

        match access_type {
            AccessType::BYTE => Some(SymbolType::Byte),
            AccessType::SHORT => Some(SymbolType::Short),
            AccessType::WORD
            | AccessType::UNALIGNED_WORD_LEFT
            | AccessType::UNALIGNED_WORD_RIGHT => Some(SymbolType::Word),
            AccessType::DOUBLEWORD
            | AccessType::UNALIGNED_DOUBLEWORD_LEFT
            | AccessType::UNALIGNED_DOUBLEWORD_RIGHT => Some(SymbolType::DWord),
            AccessType::FLOAT => Some(SymbolType::Float32),
            AccessType::DOUBLEFLOAT => Some(SymbolType::Float64),
            _ => None,
        }
    }
}

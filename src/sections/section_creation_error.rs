/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::sync::Arc;
use core::{error, fmt};

use rabbitizer::Vram;

use crate::{
    addresses::Rom, context::OwnedSegmentNotFoundError, metadata::AddSymbolError,
    symbols::SymbolCreationError,
};

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SectionCreationError {
    EmptySection {
        name: Arc<str>,
        vram: Vram,
    },
    RomVramAlignmentMismatch {
        name: Arc<str>,
        rom: Rom,
        vram: Vram,
        multiple_of: u32,
    },
    BadBytesSize {
        name: Arc<str>,
        size: usize,
        multiple_of: u32,
    },
    OwnedSegmentNotFound(OwnedSegmentNotFoundError),
    SymbolCreation(SymbolCreationError),
}

impl fmt::Display for SectionCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionCreationError::EmptySection { name, vram } => {
                write!(
                    f,
                    "Can't create section '{}' (0x{}) with no bytes",
                    name, vram
                )
            }
            SectionCreationError::RomVramAlignmentMismatch {
                name,
                rom,
                vram,
                multiple_of,
            } => {
                write!(
                    f,
                    "Section '{}' has mismatched rom ({}) and vram (0x{}) alignments modulo {}",
                    name, rom, vram, multiple_of
                )
            }
            SectionCreationError::BadBytesSize {
                name,
                size,
                multiple_of,
            } => {
                write!(
                    f,
                    "Section '{}' has 0x{:X} bytes, which is not a multiple of {}",
                    name, size, multiple_of
                )
            }
            SectionCreationError::OwnedSegmentNotFound(e) => write!(f, "{}", e),
            SectionCreationError::SymbolCreation(e) => write!(f, "{}", e),
        }
    }
}
impl error::Error for SectionCreationError {}

impl From<OwnedSegmentNotFoundError> for SectionCreationError {
    fn from(value: OwnedSegmentNotFoundError) -> Self {
        SectionCreationError::OwnedSegmentNotFound(value)
    }
}
impl From<SymbolCreationError> for SectionCreationError {
    fn from(value: SymbolCreationError) -> Self {
        SectionCreationError::SymbolCreation(value)
    }
}
impl From<AddSymbolError> for SectionCreationError {
    fn from(value: AddSymbolError) -> Self {
        SectionCreationError::SymbolCreation(SymbolCreationError::AddSymbol(value))
    }
}

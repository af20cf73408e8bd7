/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::{error, fmt};

use crate::{context::OwnedSegmentNotFoundError, metadata::AddSymbolError};

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SymbolCreationError {
    OwnedSegmentNotFound(OwnedSegmentNotFoundError),
    AddSymbol(AddSymbolError),
}

impl fmt::Display for SymbolCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolCreationError::OwnedSegmentNotFound(e) => write!(f, "{}", e),
            SymbolCreationError::AddSymbol(e) => write!(f, "{}", e),
        }
    }
}
impl error::Error for SymbolCreationError {}

impl From<OwnedSegmentNotFoundError> for SymbolCreationError {
    fn from(value: OwnedSegmentNotFoundError) -> Self {
        SymbolCreationError::OwnedSegmentNotFound(value)
    }
}
impl From<AddSymbolError> for SymbolCreationError {
    fn from(value: AddSymbolError) -> Self {
        SymbolCreationError::AddSymbol(value)
    }
}

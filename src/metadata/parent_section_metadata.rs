/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::sync::Arc;

use rabbitizer::Vram;

use crate::parent_segment_info::ParentSegmentInfo;

/// Ties a symbol back to the section that produced it.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParentSectionMetadata {
    name: Arc<str>,
    vram: Vram,
    parent_segment_info: ParentSegmentInfo,
}

impl ParentSectionMetadata {
    #[must_use]
    pub fn new(name: Arc<str>, vram: Vram, parent_segment_info: ParentSegmentInfo) -> Self {
        Self {
            name,
            vram,
            parent_segment_info,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn vram(&self) -> Vram {
        self.vram
    }

    #[must_use]
    pub const fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::BTreeMap;

use crate::addresses::{Rom, RomVramRange};

use super::{OverlayCategoryName, SegmentMetadata};

/// Every overlay segment of a category, keyed by the rom address where each
/// one starts.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayCategory {
    name: OverlayCategoryName,
    /// Union of the ranges of every segment in this category.
    ranges: RomVramRange,
    segments: BTreeMap<Rom, SegmentMetadata>,
}

impl OverlayCategory {
    pub(crate) fn new(name: OverlayCategoryName, segment: SegmentMetadata) -> Self {
        let ranges = *segment.rom_vram_range();
        let mut segments = BTreeMap::new();
        segments.insert(segment.rom_vram_range().rom().start(), segment);

        Self {
            name,
            ranges,
            segments,
        }
    }

    pub(crate) fn add_segment(&mut self, segment: SegmentMetadata) {
        self.ranges.expand_ranges(segment.rom_vram_range());
        self.segments
            .insert(segment.rom_vram_range().rom().start(), segment);
    }

    #[must_use]
    pub fn name(&self) -> &OverlayCategoryName {
        &self.name
    }

    #[must_use]
    pub const fn ranges(&self) -> &RomVramRange {
        &self.ranges
    }

    #[must_use]
    pub fn segments(&self) -> &BTreeMap<Rom, SegmentMetadata> {
        &self.segments
    }

    pub(crate) fn segments_mut(&mut self) -> &mut BTreeMap<Rom, SegmentMetadata> {
        &mut self.segments
    }
}

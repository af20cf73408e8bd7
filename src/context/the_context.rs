/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::vec::Vec;
use core::{error, fmt};

use rabbitizer::Vram;

use crate::{
    addresses::Rom,
    collections::UnorderedMap,
    config::GlobalConfig,
    metadata::{OverlayCategory, OverlayCategoryName, SegmentMetadata},
    parent_segment_info::ParentSegmentInfo,
};

use super::AnalysisWarning;

/// The cross-section symbol store: one global segment plus any number of
/// overlay segments grouped by category.
///
/// This is the single piece of mutable state every analysis step shares.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    global_config: GlobalConfig,

    global_segment: SegmentMetadata,
    overlay_segments: UnorderedMap<OverlayCategoryName, OverlayCategory>,

    warnings: Vec<AnalysisWarning>,
}

impl Context {
    pub(crate) fn new(
        global_config: GlobalConfig,
        global_segment: SegmentMetadata,
        overlay_segments: UnorderedMap<OverlayCategoryName, OverlayCategory>,
    ) -> Self {
        Self {
            global_config,
            global_segment,
            overlay_segments,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn global_config(&self) -> &GlobalConfig {
        &self.global_config
    }

    #[must_use]
    pub const fn global_segment(&self) -> &SegmentMetadata {
        &self.global_segment
    }

    #[must_use]
    pub fn overlay_segments(&self) -> &UnorderedMap<OverlayCategoryName, OverlayCategory> {
        &self.overlay_segments
    }

    #[must_use]
    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    pub(crate) fn add_warning(&mut self, warning: AnalysisWarning) {
        if self.global_config.panic_range_check() && warning.is_range_check() {
            panic!("{}", warning);
        }
        self.warnings.push(warning);
    }

    /// Whether any known segment maps this address.
    #[must_use]
    pub fn in_any_vram_range(&self, vram: Vram) -> bool {
        if self.global_segment.in_vram_range(vram) {
            return true;
        }
        self.overlay_segments
            .values()
            .any(|category| category.ranges().in_vram_range(vram))
    }

    /// The segment a section belongs to, the one its symbols must be
    /// registered on.
    pub fn find_owned_segment(
        &self,
        info: &ParentSegmentInfo,
    ) -> Result<&SegmentMetadata, OwnedSegmentNotFoundError> {
        match info.overlay_category_name() {
            None => Ok(&self.global_segment),
            Some(category_name) => self
                .overlay_segments
                .get(category_name)
                .and_then(|category| category.segments().get(&info.segment_rom()))
                .ok_or_else(|| OwnedSegmentNotFoundError::new(info.clone())),
        }
    }

    pub fn find_owned_segment_mut(
        &mut self,
        info: &ParentSegmentInfo,
    ) -> Result<&mut SegmentMetadata, OwnedSegmentNotFoundError> {
        match info.overlay_category_name() {
            None => Ok(&mut self.global_segment),
            Some(category_name) => self
                .overlay_segments
                .get_mut(category_name)
                .and_then(|category| category.segments_mut().get_mut(&info.segment_rom()))
                .ok_or_else(|| OwnedSegmentNotFoundError::new(info.clone())),
        }
    }

    /// The segment a referenced address should be resolved against: the
    /// global segment when the address lies in its range, otherwise the
    /// caller's own overlay, otherwise any overlay the caller's segment
    /// prioritises.
    #[must_use]
    pub fn find_referenced_segment(
        &self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<&SegmentMetadata> {
        let (category_name, rom) = self.locate_referenced_segment(vram, info)?;
        match category_name {
            None => Some(&self.global_segment),
            Some(category_name) => self
                .overlay_segments
                .get(&category_name)
                .and_then(|category| category.segments().get(&rom)),
        }
    }

    #[must_use]
    pub fn find_referenced_segment_mut(
        &mut self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<&mut SegmentMetadata> {
        let (category_name, rom) = self.locate_referenced_segment(vram, info)?;
        match category_name {
            None => Some(&mut self.global_segment),
            Some(category_name) => self
                .overlay_segments
                .get_mut(&category_name)
                .and_then(|category| category.segments_mut().get_mut(&rom)),
        }
    }

    fn locate_referenced_segment(
        &self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<(Option<OverlayCategoryName>, Rom)> {
        if self.global_segment.in_vram_range(vram) {
            return Some((None, self.global_segment.rom_vram_range().rom().start()));
        }

        let owned = self.find_owned_segment(info).ok()?;
        if owned.in_vram_range(vram) {
            return Some((
                info.overlay_category_name().cloned(),
                info.segment_rom(),
            ));
        }

        // Last chance: overlays the owning segment explicitly prioritises.
        for prioritised_name in owned.prioritised_overlays() {
            for (category_name, category) in self.overlay_segments.iter() {
                if !category.ranges().in_vram_range(vram) {
                    continue;
                }
                for (rom, segment) in category.segments() {
                    if segment.name() == Some(&**prioritised_name) && segment.in_vram_range(vram) {
                        return Some((Some(category_name.clone()), *rom));
                    }
                }
            }
        }

        None
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OwnedSegmentNotFoundError {
    info: ParentSegmentInfo,
}

impl OwnedSegmentNotFoundError {
    fn new(info: ParentSegmentInfo) -> Self {
        Self { info }
    }
}

// Lets `?` bail out of `fmt::Display` impls which need to consult the
// context mid-formatting.
impl From<OwnedSegmentNotFoundError> for fmt::Error {
    fn from(_value: OwnedSegmentNotFoundError) -> Self {
        fmt::Error
    }
}

impl fmt::Display for OwnedSegmentNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No segment registered for rom {} on category {:?}. Overlay segments must be added to the ContextBuilder before analyzing their sections",
            self.info.segment_rom(),
            self.info.overlay_category_name().map(|x| x.inner()),
        )
    }
}
impl error::Error for OwnedSegmentNotFoundError {}

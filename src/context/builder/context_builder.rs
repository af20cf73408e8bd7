/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{
    collections::UnorderedMap,
    config::GlobalConfig,
    context::Context,
    metadata::{OverlayCategory, OverlayCategoryName, SegmentMetadata},
};

/// Assembles a [`Context`] out of the global segment and any overlay
/// segments.
///
/// Segments come from [`super::GlobalSegmentBuilder`] and
/// [`super::OverlaySegmentBuilder`], which is where user symbols are fed in.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBuilder {
    global_config: GlobalConfig,
    global_segment: SegmentMetadata,
    overlay_segments: UnorderedMap<OverlayCategoryName, OverlayCategory>,
}

impl ContextBuilder {
    #[must_use]
    pub fn new(global_config: GlobalConfig, global_segment: SegmentMetadata) -> Self {
        Self {
            global_config,
            global_segment,
            overlay_segments: UnorderedMap::new(),
        }
    }

    /// Registers a finished overlay segment under its category.
    ///
    /// Segments of a category are keyed by their starting rom address, which
    /// is how sections of an overlay find their own segment later.
    pub fn add_overlay_segment(&mut self, segment: SegmentMetadata) {
        let category_name = segment
            .category_name()
            .expect("Overlay segments carry a category name by construction")
            .clone();

        match self.overlay_segments.get_mut(&category_name) {
            Some(category) => category.add_segment(segment),
            None => {
                self.overlay_segments.insert(
                    category_name.clone(),
                    OverlayCategory::new(category_name, segment),
                );
            }
        }
    }

    #[must_use]
    pub fn build(self) -> Context {
        Context::new(
            self.global_config,
            self.global_segment,
            self.overlay_segments,
        )
    }
}

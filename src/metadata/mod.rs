/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod generated_by;
mod overlay_category;
mod overlay_category_name;
mod parent_section_metadata;
mod segment_metadata;
mod symbol_metadata;
mod symbol_metadata_name_display;
mod symbol_type;

pub use generated_by::GeneratedBy;
pub use overlay_category::OverlayCategory;
pub use overlay_category_name::OverlayCategoryName;
pub use parent_section_metadata::ParentSectionMetadata;
pub use segment_metadata::{AddSymbolError, SegmentMetadata};
pub use symbol_metadata::{RodataMigrationBehavior, SymbolMetadata};
pub use symbol_metadata_name_display::SymbolMetadataNameDisplay;
pub use symbol_type::SymbolType;

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod context_builder;
mod segment_builder;

pub use context_builder::ContextBuilder;
pub use segment_builder::{AddUserSymbolError, GlobalSegmentBuilder, OverlaySegmentBuilder};

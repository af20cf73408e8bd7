/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod function_display;
mod internal_common;
mod sym_common_display;
mod sym_data_display;
mod sym_display_error;
mod sym_noload_display;

pub use function_display::{FunctionDisplay, FunctionDisplaySettings};
pub(crate) use internal_common::InternalSymDisplSettings;
pub use sym_common_display::SymCommonDisplaySettings;
pub(crate) use sym_common_display::WordComment;
pub use sym_data_display::{SymDataDisplay, SymDataDisplaySettings};
pub use sym_display_error::SymDisplayError;
pub use sym_noload_display::{SymNoloadDisplay, SymNoloadDisplaySettings};

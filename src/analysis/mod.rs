/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod instruction_analysis_result;
mod instruction_analyzer;
mod jr_reg_data;
mod register_tracker;
mod string_guesser;
mod tracked_register_state;

pub use instruction_analysis_result::InstructionAnalysisResult;
pub use instruction_analyzer::InstructionAnalyzer;
pub use string_guesser::{StringGuessRejection, StringGuesserLevel};

pub(crate) use jr_reg_data::JrRegData;
pub(crate) use register_tracker::RegisterTracker;
pub(crate) use tracked_register_state::{HiInfo, LoInfo, TrackedRegisterState};

/// Extra room allowed past the strict signed-16-bit addend band.
///
/// Modern GAS versions are known to produce addends slightly above
/// `0x7FFF` when pairing `%hi`/`%lo` around large objects. The exact
/// threshold varies per assembler version, so it lives in this one
/// constant.
pub(crate) const GAS_ADDEND_SLACK: i64 = 0x30;

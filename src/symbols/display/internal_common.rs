/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

/// Knobs the migration plan passes down when it embeds a symbol's output
/// inside a function's file.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct InternalSymDisplSettings {
    migrated: bool,
}

impl InternalSymDisplSettings {
    pub(crate) fn new(migrated: bool) -> Self {
        Self { migrated }
    }

    pub(crate) fn migrated(&self) -> bool {
        self.migrated
    }
}

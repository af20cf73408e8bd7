/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::sync::Arc;
use core::fmt;

/// User-defined category shared by every overlay that occupies the same
/// vram region.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OverlayCategoryName {
    inner: Arc<str>,
}

impl OverlayCategoryName {
    #[must_use]
    pub fn new(inner: Arc<str>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn inner(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for OverlayCategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

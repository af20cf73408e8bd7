/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::{fmt, ops};

use rabbitizer::Vram;

/// A byte count, used for symbol and section sizes.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Size {
    inner: u32,
}

impl Size {
    #[must_use]
    pub const fn new(inner: u32) -> Self {
        Self { inner }
    }

    #[must_use]
    pub const fn inner(&self) -> u32 {
        self.inner
    }
}

impl ops::Add for Size {
    type Output = Size;

    fn add(self, rhs: Size) -> Self::Output {
        Size::new(self.inner + rhs.inner)
    }
}
impl ops::Sub for Size {
    type Output = Size;

    fn sub(self, rhs: Size) -> Self::Output {
        Size::new(self.inner - rhs.inner)
    }
}
impl ops::AddAssign for Size {
    fn add_assign(&mut self, rhs: Size) {
        self.inner += rhs.inner;
    }
}

impl ops::Add<Size> for Vram {
    type Output = Vram;

    fn add(self, rhs: Size) -> Self::Output {
        Vram::new(self.inner().wrapping_add(rhs.inner))
    }
}
impl ops::AddAssign<Size> for Vram {
    fn add_assign(&mut self, rhs: Size) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.inner)
    }
}

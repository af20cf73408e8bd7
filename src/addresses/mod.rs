/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod address_range;
mod rom;
mod rom_vram_range;
mod size;

pub use rabbitizer::{Vram, VramOffset};

pub use address_range::AddressRange;
pub use rom::Rom;
pub use rom_vram_range::RomVramRange;
pub use size::Size;

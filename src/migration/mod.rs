/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod function_rodata_pairing;

pub use function_rodata_pairing::{FunctionRodataPairing, FunctionRodataPairingDisplay};

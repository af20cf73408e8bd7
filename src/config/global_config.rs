/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::sync::Arc;

use super::{Endian, GpConfig};

/// Process-wide knobs, threaded by reference into every analysis and
/// emission step.
///
/// This is plain data: build it once before analysis starts and don't touch
/// it afterwards.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct GlobalConfig {
    endian: Endian,
    gp_config: Option<GpConfig>,

    /// Upgrades range-check warnings into panics.
    panic_range_check: bool,

    /// Appended to every autogenerated symbol name.
    custom_suffix: Option<Arc<str>>,
    /// Zero-pad autogenerated names to 6 hex digits instead of 8.
    legacy_sym_addr_zero_padding: bool,
}

impl GlobalConfig {
    pub fn new(endian: Endian) -> Self {
        Self {
            endian,
            gp_config: None,
            panic_range_check: false,
            custom_suffix: None,
            legacy_sym_addr_zero_padding: false,
        }
    }
}

impl GlobalConfig {
    #[must_use]
    pub const fn endian(&self) -> Endian {
        self.endian
    }
    pub fn endian_mut(&mut self) -> &mut Endian {
        &mut self.endian
    }
    #[must_use]
    pub fn with_endian(self, endian: Endian) -> Self {
        Self { endian, ..self }
    }

    #[must_use]
    pub const fn gp_config(&self) -> Option<GpConfig> {
        self.gp_config
    }
    pub fn gp_config_mut(&mut self) -> &mut Option<GpConfig> {
        &mut self.gp_config
    }
    #[must_use]
    pub fn with_gp_config(self, gp_config: Option<GpConfig>) -> Self {
        Self { gp_config, ..self }
    }

    #[must_use]
    pub const fn panic_range_check(&self) -> bool {
        self.panic_range_check
    }
    #[must_use]
    pub fn with_panic_range_check(self, panic_range_check: bool) -> Self {
        Self {
            panic_range_check,
            ..self
        }
    }

    #[must_use]
    pub fn custom_suffix(&self) -> Option<&str> {
        self.custom_suffix.as_deref()
    }
    #[must_use]
    pub fn with_custom_suffix(self, custom_suffix: Option<Arc<str>>) -> Self {
        Self {
            custom_suffix,
            ..self
        }
    }

    #[must_use]
    pub const fn legacy_sym_addr_zero_padding(&self) -> bool {
        self.legacy_sym_addr_zero_padding
    }
    #[must_use]
    pub fn with_legacy_sym_addr_zero_padding(self, legacy_sym_addr_zero_padding: bool) -> Self {
        Self {
            legacy_sym_addr_zero_padding,
            ..self
        }
    }
}

#[cfg(feature = "std")]
impl GlobalConfig {
    /// Applies every `SPIMDISASM_*` environment variable on top of the
    /// current values.
    ///
    /// Meant to be called exactly once, before any analysis begins. Malformed
    /// values are ignored, keeping whatever was already configured.
    #[must_use]
    pub fn with_environment_overrides(mut self) -> Self {
        use rabbitizer::Vram;

        if let Ok(value) = std::env::var("SPIMDISASM_ENDIAN") {
            match value.to_ascii_lowercase().as_str() {
                "big" => self.endian = Endian::Big,
                "little" => self.endian = Endian::Little,
                _ => {}
            }
        }

        if let Ok(value) = std::env::var("SPIMDISASM_GP_VALUE") {
            if let Some(gp_value) = parse_hex(&value) {
                let pic = std::env::var("SPIMDISASM_PIC").is_ok_and(|x| parse_bool(&x));
                self.gp_config = Some(GpConfig::new(Vram::new(gp_value), pic));
            }
        }

        if let Ok(value) = std::env::var("SPIMDISASM_PANIC_RANGE_CHECK") {
            self.panic_range_check = parse_bool(&value);
        }

        if let Ok(value) = std::env::var("SPIMDISASM_CUSTOM_SUFFIX") {
            if !value.is_empty() {
                self.custom_suffix = Some(value.into());
            }
        }

        if let Ok(value) = std::env::var("SPIMDISASM_LEGACY_SYM_ADDR_ZERO_PADDING") {
            self.legacy_sym_addr_zero_padding = parse_bool(&value);
        }

        self
    }
}

#[cfg(feature = "std")]
fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(feature = "std")]
fn parse_hex(value: &str) -> Option<u32> {
    let stripped = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(stripped, 16).ok()
}

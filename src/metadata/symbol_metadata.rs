/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_set::BTreeSet;
use alloc::string::String;
use core::fmt;

use rabbitizer::{access_type::AccessType, Vram};

use crate::{
    addresses::{Rom, Size},
    collections::addended_ordered_map::AddendedValue,
    config::Compiler,
    section_type::SectionType,
};

use super::{GeneratedBy, ParentSectionMetadata, SymbolMetadataNameDisplay, SymbolType};

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct GotInfo {
    is_got_global: bool,
    is_got_local: bool,
    got_index: Option<usize>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
#[non_exhaustive]
pub enum RodataMigrationBehavior {
    /// Let spimdisasm handle if it should migrate this rodata symbol.
    #[default]
    Default,

    /// Ignore rules for migrating rodata and force migration of this symbol
    /// to any function which references it.
    ForceMigrate,
    /// Ignore rules for migrating rodata and prevent migration of this
    /// symbol to any function which references it.
    ForceNotMigrate,

    /// Force migrating to the function that matches the specified name.
    ///
    /// Overrides all logic for determining if this symbol should be migrated
    /// or not and to which function should be migrated.
    ///
    /// This can be specially useful for unreferenced symbols that should be
    /// defined in-between actually referenced symbols.
    ///
    /// This field is ignored if applied on anything that is not a rodata
    /// symbol.
    MigrateToSpecificFunction(String),
}

/// Everything the context knows about a single address.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMetadata {
    generated_by: GeneratedBy,
    vram: Vram,
    rom: Option<Rom>,

    user_declared_name: Option<String>,
    user_declared_name_end: Option<String>,

    user_declared_size: Option<Size>,
    autodetected_size: Option<Size>,

    user_declared_type: Option<SymbolType>,
    autodetected_type: Option<SymbolType>,

    section_type: Option<SectionType>,

    /// This symbol exists (was found) in any of the analyzed sections
    is_defined: bool,

    access_type: Option<(AccessType, bool)>,

    /// How much this symbol is referenced by something else
    reference_counter: usize,
    /// Which functions reference this symbol
    reference_functions: BTreeSet<Vram>,
    /// Which data symbols reference this symbol
    reference_symbols: BTreeSet<Vram>,

    parent_metadata: Option<ParentSectionMetadata>,
    compiler: Option<Compiler>,

    got_info: Option<GotInfo>,
    accessed_as_gp_rel: bool,

    rodata_migration_behavior: RodataMigrationBehavior,

    /// Set when this symbol only exists because a sized symbol before it did
    /// not reach this address.
    auto_created_pad_by: Option<Vram>,

    allowed_to_reference_symbols: bool,
    allowed_to_be_referenced: bool,

    trailing_padding_size: Option<Size>,
    in_overlay: bool,
    is_mips1_double: bool,

    visibility: Option<String>,
}

impl SymbolMetadata {
    pub(crate) fn new(generated_by: GeneratedBy, vram: Vram) -> Self {
        Self {
            generated_by,
            vram,
            rom: None,

            user_declared_name: None,
            user_declared_name_end: None,

            user_declared_size: None,
            autodetected_size: None,
            user_declared_type: None,
            autodetected_type: None,

            section_type: None,

            is_defined: false,

            access_type: None,
            reference_counter: 0,
            reference_functions: BTreeSet::new(),
            reference_symbols: BTreeSet::new(),

            parent_metadata: None,
            compiler: None,

            got_info: None,
            accessed_as_gp_rel: false,
            rodata_migration_behavior: RodataMigrationBehavior::Default,
            auto_created_pad_by: None,

            allowed_to_reference_symbols: true,
            allowed_to_be_referenced: true,

            trailing_padding_size: None,
            in_overlay: false,
            is_mips1_double: false,
            visibility: None,
        }
    }

    #[must_use]
    pub fn generated_by(&self) -> GeneratedBy {
        self.generated_by
    }
    #[must_use]
    pub fn is_user_declared(&self) -> bool {
        self.generated_by == GeneratedBy::UserDeclared
    }

    #[must_use]
    pub const fn vram(&self) -> Vram {
        self.vram
    }

    #[must_use]
    pub fn rom(&self) -> Option<Rom> {
        self.rom
    }
    pub fn rom_mut(&mut self) -> &mut Option<Rom> {
        &mut self.rom
    }
    pub fn update_rom(&mut self, new_rom: Option<Rom>) {
        if self.rom.is_none() {
            self.rom = new_rom;
        }
    }

    #[must_use]
    pub fn user_declared_name(&self) -> Option<&str> {
        self.user_declared_name.as_deref()
    }
    pub fn user_declared_name_mut(&mut self) -> &mut Option<String> {
        &mut self.user_declared_name
    }

    #[must_use]
    pub fn user_declared_name_end(&self) -> Option<&str> {
        self.user_declared_name_end.as_deref()
    }
    pub fn user_declared_name_end_mut(&mut self) -> &mut Option<String> {
        &mut self.user_declared_name_end
    }

    #[must_use]
    pub fn display_name(&self) -> SymbolMetadataNameDisplay<'_> {
        SymbolMetadataNameDisplay::new(self)
    }

    #[must_use]
    pub fn user_declared_size(&self) -> Option<Size> {
        self.user_declared_size
    }
    pub fn user_declared_size_mut(&mut self) -> &mut Option<Size> {
        &mut self.user_declared_size
    }
    #[must_use]
    pub fn autodetected_size(&self) -> Option<Size> {
        self.autodetected_size
    }
    pub fn autodetected_size_mut(&mut self) -> &mut Option<Size> {
        &mut self.autodetected_size
    }

    /// The size of this symbol, preferring what the user declared over what
    /// the analysis detected.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        if let Some(siz) = self.user_declared_size {
            return Some(siz);
        }
        if let Some(siz) = self.autodetected_size {
            return Some(siz);
        }

        self.sym_type().and_then(|x| x.fixed_size())
    }

    /// Like [`SymbolMetadata::size`], but falls back to a size inferred from
    /// the symbol's address alignment.
    #[must_use]
    pub fn size_or_aligned_default(&self) -> Size {
        if let Some(siz) = self.size() {
            return siz;
        }

        if self.vram.inner() % 4 == 0 {
            Size::new(4)
        } else if self.vram.inner() % 2 == 0 {
            Size::new(2)
        } else {
            Size::new(1)
        }
    }

    #[must_use]
    pub fn sym_type(&self) -> Option<SymbolType> {
        if let Some(t) = self.user_declared_type {
            Some(t)
        } else {
            self.autodetected_type
        }
    }
    #[must_use]
    pub fn user_declared_type(&self) -> Option<SymbolType> {
        self.user_declared_type
    }
    pub fn user_declared_type_mut(&mut self) -> &mut Option<SymbolType> {
        &mut self.user_declared_type
    }
    #[must_use]
    pub fn autodetected_type(&self) -> Option<SymbolType> {
        self.autodetected_type
    }

    pub fn set_type(&mut self, new_type: SymbolType, generated_by: GeneratedBy) {
        match generated_by {
            GeneratedBy::Autogenerated => self.autodetected_type = Some(new_type),
            GeneratedBy::UserDeclared => self.user_declared_type = Some(new_type),
        }
    }

    /// Sets the type, refusing to downgrade an autodetection which carries
    /// more information than the new one (like turning a function into a
    /// plain branch target because a loop jumps back to its entrypoint).
    pub fn set_type_with_priorities(&mut self, new_type: SymbolType, generated_by: GeneratedBy) {
        if generated_by == GeneratedBy::UserDeclared {
            self.user_declared_type = Some(new_type);
            return;
        }

        match self.autodetected_type {
            None => self.autodetected_type = Some(new_type),
            Some(old_type) => {
                if new_type.detection_priority() > old_type.detection_priority() {
                    self.autodetected_type = Some(new_type);
                }
            }
        }
    }

    #[must_use]
    pub fn section_type(&self) -> Option<SectionType> {
        self.section_type
    }
    pub fn section_type_mut(&mut self) -> &mut Option<SectionType> {
        &mut self.section_type
    }
    pub fn update_section_type(&mut self, new_section_type: Option<SectionType>) {
        if self.section_type.is_none() {
            self.section_type = new_section_type;
        }
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.is_defined
    }
    pub fn set_defined(&mut self) {
        self.is_defined = true;
    }

    #[must_use]
    pub fn access_type(&self) -> Option<(AccessType, bool)> {
        self.access_type
    }
    pub fn set_access_type_if_unset(&mut self, access_type: (AccessType, bool)) {
        if self.access_type.is_none() {
            self.access_type = Some(access_type);

            if self.autodetected_type.is_none() {
                if let Some(t) = SymbolType::from_access_type(access_type.0, access_type.1) {
                    self.autodetected_type = Some(t);
                }
            }
        }
    }

    #[must_use]
    pub fn reference_counter(&self) -> usize {
        self.reference_counter
    }
    #[must_use]
    pub fn reference_functions(&self) -> &BTreeSet<Vram> {
        &self.reference_functions
    }
    #[must_use]
    pub fn reference_symbols(&self) -> &BTreeSet<Vram> {
        &self.reference_symbols
    }

    pub(crate) fn add_reference_function(&mut self, function_vram: Vram, _instr_rom: Rom) {
        self.reference_counter += 1;
        self.reference_functions.insert(function_vram);
    }
    pub(crate) fn add_reference_symbol(&mut self, symbol_vram: Vram, _word_rom: Rom) {
        self.reference_counter += 1;
        self.reference_symbols.insert(symbol_vram);
    }

    #[must_use]
    pub fn parent_metadata(&self) -> Option<&ParentSectionMetadata> {
        self.parent_metadata.as_ref()
    }
    pub(crate) fn set_parent_metadata(&mut self, parent_metadata: ParentSectionMetadata) {
        self.parent_metadata = Some(parent_metadata);
    }

    #[must_use]
    pub fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }
    pub(crate) fn set_compiler(&mut self, compiler: Compiler) {
        self.compiler = Some(compiler);
    }

    #[must_use]
    pub fn is_got_global(&self) -> bool {
        self.got_info.is_some_and(|x| x.is_got_global)
    }
    #[must_use]
    pub fn is_got_local(&self) -> bool {
        self.got_info.is_some_and(|x| x.is_got_local)
    }
    #[must_use]
    pub fn got_index(&self) -> Option<usize> {
        self.got_info.and_then(|x| x.got_index)
    }
    pub(crate) fn set_got_global(&mut self, got_index: Option<usize>) {
        self.got_info = Some(GotInfo {
            is_got_global: true,
            is_got_local: false,
            got_index,
        });
    }
    pub(crate) fn set_got_local(&mut self, got_index: Option<usize>) {
        self.got_info = Some(GotInfo {
            is_got_global: false,
            is_got_local: true,
            got_index,
        });
    }

    #[must_use]
    pub fn accessed_as_gp_rel(&self) -> bool {
        self.accessed_as_gp_rel
    }
    pub(crate) fn set_accessed_as_gp_rel(&mut self) {
        self.accessed_as_gp_rel = true;
    }

    #[must_use]
    pub fn rodata_migration_behavior(&self) -> &RodataMigrationBehavior {
        &self.rodata_migration_behavior
    }
    pub fn rodata_migration_behavior_mut(&mut self) -> &mut RodataMigrationBehavior {
        &mut self.rodata_migration_behavior
    }

    #[must_use]
    pub fn is_autogenerated_pad(&self) -> bool {
        self.auto_created_pad_by.is_some() && self.reference_counter == 0
    }
    #[must_use]
    pub fn auto_created_pad_by(&self) -> Option<Vram> {
        self.auto_created_pad_by
    }
    pub(crate) fn set_auto_created_pad_by(&mut self, vram: Vram) {
        self.auto_created_pad_by = Some(vram);
    }

    #[must_use]
    pub fn allowed_to_reference_symbols(&self) -> bool {
        self.allowed_to_reference_symbols
    }
    pub fn set_allowed_to_reference_symbols(&mut self, value: bool) {
        self.allowed_to_reference_symbols = value;
    }
    #[must_use]
    pub fn allowed_to_be_referenced(&self) -> bool {
        self.allowed_to_be_referenced
    }
    pub fn set_allowed_to_be_referenced(&mut self, value: bool) {
        self.allowed_to_be_referenced = value;
    }

    #[must_use]
    pub fn trailing_padding_size(&self) -> Option<Size> {
        self.trailing_padding_size
    }
    pub(crate) fn set_trailing_padding_size(&mut self, size: Size) {
        self.trailing_padding_size = Some(size);
    }

    #[must_use]
    pub fn in_overlay(&self) -> bool {
        self.in_overlay
    }
    pub(crate) fn set_in_overlay(&mut self, in_overlay: bool) {
        self.in_overlay = in_overlay;
    }

    #[must_use]
    pub fn is_mips1_double(&self) -> bool {
        self.is_mips1_double
    }
    pub(crate) fn set_mips1_double(&mut self) {
        self.is_mips1_double = true;
    }

    #[must_use]
    pub fn visibility(&self) -> Option<&str> {
        self.visibility.as_deref()
    }
    pub fn visibility_mut(&mut self) -> &mut Option<String> {
        &mut self.visibility
    }
}

impl SymbolMetadata {
    #[must_use]
    pub fn is_function(&self) -> bool {
        self.sym_type() == Some(SymbolType::Function)
    }
    #[must_use]
    pub fn is_jumptable(&self) -> bool {
        self.sym_type() == Some(SymbolType::Jumptable)
    }
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(
            self.sym_type(),
            Some(SymbolType::CString | SymbolType::PascalString)
        )
    }
    #[must_use]
    pub fn is_float(&self) -> bool {
        self.sym_type() == Some(SymbolType::Float32)
    }
    #[must_use]
    pub fn is_double(&self) -> bool {
        self.sym_type() == Some(SymbolType::Float64)
    }

    /// Functions we are confident enough about to let labels and sizes hang
    /// off them.
    #[must_use]
    pub fn is_trustable_function(&self) -> bool {
        self.is_function() && (self.is_defined || self.generated_by == GeneratedBy::UserDeclared)
    }
}

impl AddendedValue<Vram> for SymbolMetadata {
    fn addended_limit(&self, key: Vram) -> Vram {
        let size = self.size_or_aligned_default().inner().max(1);
        key + Size::new(size)
    }
}

impl PartialOrd for SymbolMetadata {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        match self.vram.partial_cmp(&other.vram) {
            Some(core::cmp::Ordering::Equal) => {}
            ord => return ord,
        };
        self.rom.partial_cmp(&other.rom)
    }
}

impl fmt::Display for SymbolMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SymbolMetadata {{ vram: 0x{}, name: {} }}",
            self.vram,
            self.display_name()
        )
    }
}

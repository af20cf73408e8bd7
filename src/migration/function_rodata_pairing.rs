/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;

use rabbitizer::Vram;

use crate::{
    collections::UnorderedMap,
    context::{AnalysisWarning, Context},
    metadata::{RodataMigrationBehavior, SymbolMetadata, SymbolType},
    sections::{SectionData, SectionExecutable},
    symbols::{
        display::{
            FunctionDisplaySettings, InternalSymDisplSettings, SymDataDisplaySettings,
            SymDisplayError,
        },
        Symbol,
    },
};

/// One entry of the emission plan produced by rodata migration: either a
/// function together with the rodata that belongs to it, or a lone rodata
/// block nothing claimed.
///
/// Emitting every pairing in order reproduces the original file layout,
/// which is what makes the reassembled object link back byte-exactly.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FunctionRodataPairing {
    function_index: Option<usize>,
    rodata_indices: Vec<usize>,
    late_rodata_indices: Vec<usize>,
}

/// How a rodata symbol got bound during the pairing pass.
#[derive(Debug, Clone, PartialEq)]
enum RodataBinding {
    /// Bound to the function at this vram.
    Function(Vram),
    /// Nothing referenced it; tags along with whatever group is open.
    Carried,
    /// Must stay in its own rodata file.
    Standalone,
}

impl FunctionRodataPairing {
    /// Computes the emission plan for a text section and its matching
    /// rodata section.
    ///
    /// The returned pairings are ordered: lone rodata first when it precedes
    /// everything owned, then each function in text order with its rodata.
    pub fn pair_sections(
        context: &mut Context,
        text_section: &SectionExecutable,
        rodata_section: Option<&SectionData>,
    ) -> Vec<FunctionRodataPairing> {
        let compiler = text_section
            .functions()
            .first()
            .and_then(|x| x.find_own_metadata(context).ok())
            .and_then(|x| x.compiler());
        let allows_late_rodata = compiler.is_some_and(|x| x.allows_late_rodata());
        let migrates_shared = compiler.is_some_and(|x| x.migrates_shared_rodata());

        // Index the functions of this text section by vram and by name.
        let mut function_by_vram: UnorderedMap<Vram, usize> = UnorderedMap::new();
        let mut function_by_name: UnorderedMap<alloc::string::String, usize> = UnorderedMap::new();
        for (index, func) in text_section.functions().iter().enumerate() {
            let vram = func.vram_range().start();
            function_by_vram.insert(vram, index);
            if let Ok(metadata) = func.find_own_metadata(context) {
                function_by_name.insert(
                    metadata
                        .display_name()
                        .with_naming(context.global_config())
                        .to_string(),
                    index,
                );
            }
        }

        let Some(rodata_section) = rodata_section else {
            return text_section
                .functions()
                .iter()
                .enumerate()
                .map(|(index, _)| FunctionRodataPairing {
                    function_index: Some(index),
                    rodata_indices: Vec::new(),
                    late_rodata_indices: Vec::new(),
                })
                .collect();
        };

        // Decide a binding for every rodata symbol, in vram order.
        let mut bindings: Vec<RodataBinding> = Vec::with_capacity(rodata_section.data_symbols().len());
        let mut missing_owners: Vec<(Vram, alloc::string::String)> = Vec::new();

        for sym in rodata_section.data_symbols() {
            let Ok(metadata) = sym.find_own_metadata(context) else {
                bindings.push(RodataBinding::Standalone);
                continue;
            };

            bindings.push(Self::bind_rodata_symbol(
                metadata,
                &function_by_vram,
                &function_by_name,
                text_section,
                migrates_shared,
                &mut missing_owners,
            ));
        }

        for (rodata_vram, owner_name) in missing_owners {
            context.add_warning(AnalysisWarning::MigrationOwnerMissing {
                rodata_vram,
                owner_name,
            });
        }

        // Group consecutive bindings, carrying unreferenced symbols with the
        // open group.
        enum PlanEntry {
            Lone(Vec<usize>),
            Owned(usize, Vec<usize>),
        }

        let mut plan: Vec<PlanEntry> = Vec::new();
        let mut open_group: Option<(usize, Vec<usize>)> = None;
        let mut lone_run: Vec<usize> = Vec::new();

        for (rodata_index, binding) in bindings.iter().enumerate() {
            match binding {
                RodataBinding::Function(func_vram) => {
                    let func_index = function_by_vram
                        .get(func_vram)
                        .copied()
                        .expect("Bindings only point at functions of this section");

                    match &mut open_group {
                        Some((open_index, group)) if *open_index == func_index => {
                            group.push(rodata_index);
                        }
                        _ => {
                            if let Some((index, group)) = open_group.take() {
                                plan.push(PlanEntry::Owned(index, group));
                            }
                            if !lone_run.is_empty() {
                                plan.push(PlanEntry::Lone(core::mem::take(&mut lone_run)));
                            }
                            open_group = Some((func_index, vec![rodata_index]));
                        }
                    }
                }
                RodataBinding::Carried => match &mut open_group {
                    Some((_, group)) => group.push(rodata_index),
                    None => lone_run.push(rodata_index),
                },
                RodataBinding::Standalone => {
                    if let Some((index, group)) = open_group.take() {
                        plan.push(PlanEntry::Owned(index, group));
                    }
                    lone_run.push(rodata_index);
                }
            }
        }
        if let Some((index, group)) = open_group.take() {
            plan.push(PlanEntry::Owned(index, group));
        }
        if !lone_run.is_empty() {
            plan.push(PlanEntry::Lone(lone_run));
        }

        // Interleave the plan with the functions of the text section,
        // preserving both orders.
        let mut pairings = Vec::new();
        let mut plan_iter = plan.into_iter().peekable();

        for func_index in 0..text_section.functions().len() {
            while let Some(PlanEntry::Lone(_)) = plan_iter.peek() {
                let Some(PlanEntry::Lone(indices)) = plan_iter.next() else {
                    unreachable!();
                };
                pairings.push(Self::new_lone(indices, rodata_section, context, allows_late_rodata));
            }

            let owned = matches!(plan_iter.peek(), Some(PlanEntry::Owned(index, _)) if *index == func_index);
            if owned {
                let Some(PlanEntry::Owned(_, indices)) = plan_iter.next() else {
                    unreachable!();
                };
                pairings.push(Self::new_owned(
                    func_index,
                    indices,
                    rodata_section,
                    context,
                    allows_late_rodata,
                ));
            } else {
                pairings.push(FunctionRodataPairing {
                    function_index: Some(func_index),
                    rodata_indices: Vec::new(),
                    late_rodata_indices: Vec::new(),
                });
            }
        }

        for entry in plan_iter {
            match entry {
                PlanEntry::Lone(indices) | PlanEntry::Owned(_, indices) => {
                    pairings.push(Self::new_lone(
                        indices,
                        rodata_section,
                        context,
                        allows_late_rodata,
                    ));
                }
            }
        }

        pairings
    }

    fn bind_rodata_symbol(
        metadata: &SymbolMetadata,
        function_by_vram: &UnorderedMap<Vram, usize>,
        function_by_name: &UnorderedMap<alloc::string::String, usize>,
        text_section: &SectionExecutable,
        migrates_shared: bool,
        missing_owners: &mut Vec<(Vram, alloc::string::String)>,
    ) -> RodataBinding {
        match metadata.rodata_migration_behavior() {
            RodataMigrationBehavior::ForceNotMigrate => return RodataBinding::Standalone,
            RodataMigrationBehavior::MigrateToSpecificFunction(name) => {
                return match function_by_name.get(name) {
                    Some(index) => RodataBinding::Function(
                        text_section.functions()[*index].vram_range().start(),
                    ),
                    None => {
                        missing_owners.push((metadata.vram(), name.clone()));
                        RodataBinding::Standalone
                    }
                };
            }
            RodataMigrationBehavior::ForceMigrate => {
                if let Some(func_vram) = metadata
                    .reference_functions()
                    .iter()
                    .find(|x| function_by_vram.contains_key(x))
                {
                    return RodataBinding::Function(*func_vram);
                }
                return RodataBinding::Standalone;
            }
            RodataMigrationBehavior::Default => {}
        }

        if !metadata.allowed_to_be_referenced() {
            return RodataBinding::Standalone;
        }

        let reference_functions = metadata.reference_functions();
        if reference_functions.is_empty() {
            return if metadata.reference_symbols().is_empty() {
                RodataBinding::Carried
            } else {
                RodataBinding::Standalone
            };
        }

        // Referenced by data or by other rodata: it has an address identity
        // of its own, migrating it would break those references.
        if !metadata.reference_symbols().is_empty() {
            return RodataBinding::Standalone;
        }

        // Jumptables belong to the single function that dispatches through
        // them. Everything else must be uniquely referenced, unless the
        // compiler deduplicates rodata across functions.
        let single_reference = reference_functions.len() == 1;
        if !single_reference && !migrates_shared && !metadata.is_jumptable() {
            return RodataBinding::Standalone;
        }

        match reference_functions
            .iter()
            .find(|x| function_by_vram.contains_key(x))
        {
            Some(func_vram) => RodataBinding::Function(*func_vram),
            // Referenced only by functions outside this text section.
            None => RodataBinding::Standalone,
        }
    }

    fn new_owned(
        function_index: usize,
        rodata_indices: Vec<usize>,
        rodata_section: &SectionData,
        context: &Context,
        allows_late_rodata: bool,
    ) -> Self {
        let (rodata_indices, late_rodata_indices) =
            Self::split_late_rodata(rodata_indices, rodata_section, context, allows_late_rodata);
        Self {
            function_index: Some(function_index),
            rodata_indices,
            late_rodata_indices,
        }
    }

    fn new_lone(
        rodata_indices: Vec<usize>,
        rodata_section: &SectionData,
        context: &Context,
        allows_late_rodata: bool,
    ) -> Self {
        let (rodata_indices, late_rodata_indices) =
            Self::split_late_rodata(rodata_indices, rodata_section, context, allows_late_rodata);
        Self {
            function_index: None,
            rodata_indices,
            late_rodata_indices,
        }
    }

    /// Jumptables and doubles go on the `.late_rodata` chunk for compilers
    /// which emit one, after every other migrated symbol.
    fn split_late_rodata(
        rodata_indices: Vec<usize>,
        rodata_section: &SectionData,
        context: &Context,
        allows_late_rodata: bool,
    ) -> (Vec<usize>, Vec<usize>) {
        if !allows_late_rodata {
            return (rodata_indices, Vec::new());
        }

        let mut normal = Vec::new();
        let mut late = Vec::new();

        for index in rodata_indices {
            let sym = &rodata_section.data_symbols()[index];
            let is_late = sym
                .find_own_metadata(context)
                .ok()
                .and_then(|x| x.sym_type())
                .is_some_and(|x| {
                    matches!(
                        x,
                        SymbolType::Jumptable | SymbolType::Float64 | SymbolType::Float32
                    )
                });
            if is_late {
                late.push(index);
            } else {
                normal.push(index);
            }
        }

        (normal, late)
    }

    #[must_use]
    pub fn function_index(&self) -> Option<usize> {
        self.function_index
    }

    #[must_use]
    pub fn rodata_indices(&self) -> &[usize] {
        &self.rodata_indices
    }

    #[must_use]
    pub fn late_rodata_indices(&self) -> &[usize] {
        &self.late_rodata_indices
    }
}

impl<'ctx, 'pairing, 'sect, 'flg> FunctionRodataPairing {
    #[allow(clippy::too_many_arguments)]
    pub fn display(
        &'pairing self,
        context: &'ctx Context,
        text_section: &'sect SectionExecutable,
        rodata_section: Option<&'sect SectionData>,
        function_display_settings: &'flg FunctionDisplaySettings,
        rodata_display_settings: &'flg SymDataDisplaySettings,
    ) -> Result<FunctionRodataPairingDisplay<'ctx, 'pairing, 'sect, 'flg>, SymDisplayError> {
        FunctionRodataPairingDisplay::new(
            self,
            context,
            text_section,
            rodata_section,
            function_display_settings,
            rodata_display_settings,
        )
    }
}

pub struct FunctionRodataPairingDisplay<'ctx, 'pairing, 'sect, 'flg> {
    pairing: &'pairing FunctionRodataPairing,
    context: &'ctx Context,
    text_section: &'sect SectionExecutable,
    rodata_section: Option<&'sect SectionData>,
    function_display_settings: &'flg FunctionDisplaySettings,
    rodata_display_settings: &'flg SymDataDisplaySettings,
}

impl<'ctx, 'pairing, 'sect, 'flg> FunctionRodataPairingDisplay<'ctx, 'pairing, 'sect, 'flg> {
    fn new(
        pairing: &'pairing FunctionRodataPairing,
        context: &'ctx Context,
        text_section: &'sect SectionExecutable,
        rodata_section: Option<&'sect SectionData>,
        function_display_settings: &'flg FunctionDisplaySettings,
        rodata_display_settings: &'flg SymDataDisplaySettings,
    ) -> Result<Self, SymDisplayError> {
        Ok(Self {
            pairing,
            context,
            text_section,
            rodata_section,
            function_display_settings,
            rodata_display_settings,
        })
    }

    fn display_rodata_list(
        &self,
        f: &mut fmt::Formatter<'_>,
        indices: &[usize],
        section_name: &str,
        line_end: &str,
    ) -> fmt::Result {
        let Some(rodata_section) = self.rodata_section else {
            return Ok(());
        };
        if indices.is_empty() {
            return Ok(());
        }

        write!(f, ".section {}{}{}", section_name, line_end, line_end)?;

        for index in indices {
            let sym = &rodata_section.data_symbols()[*index];
            let display = sym
                .display_internal(
                    self.context,
                    self.rodata_display_settings,
                    InternalSymDisplSettings::new(true),
                )
                .map_err(|_| fmt::Error)?;
            write!(f, "{}{}", display, line_end)?;
        }

        Ok(())
    }
}

impl fmt::Display for FunctionRodataPairingDisplay<'_, '_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line_end = self.function_display_settings.common().line_end();

        self.display_rodata_list(f, &self.pairing.rodata_indices, ".rodata", line_end)?;
        self.display_rodata_list(
            f,
            &self.pairing.late_rodata_indices,
            ".late_rodata",
            line_end,
        )?;

        if let Some(function_index) = self.pairing.function_index {
            let has_rodata = !self.pairing.rodata_indices.is_empty()
                || !self.pairing.late_rodata_indices.is_empty();
            if has_rodata {
                write!(f, ".section .text{}{}", line_end, line_end)?;
            }

            let func = &self.text_section.functions()[function_index];
            let display = func
                .display(self.context, self.function_display_settings)
                .map_err(|_| fmt::Error)?;
            write!(f, "{}", display)?;
        }

        Ok(())
    }
}

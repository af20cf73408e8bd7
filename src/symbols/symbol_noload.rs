/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::Vram;

use crate::{
    addresses::{AddressRange, Size},
    config::Compiler,
    context::{AnalysisWarning, Context},
    metadata::{ParentSectionMetadata, SymbolMetadata},
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
};

use super::{
    display::{SymDisplayError, SymNoloadDisplay, SymNoloadDisplaySettings},
    Symbol, SymbolCreationError,
};

const SECTION_TYPE: SectionType = SectionType::Bss;

/// A chunk of a bss section: a vram extent with no backing bytes.
///
/// There is nothing to scan here, so creating one is only about stamping
/// the context entry and cross-checking the extent against whatever size
/// the user declared for it.
#[derive(Debug, Clone, Hash, PartialEq)]
pub struct NoloadSym {
    vram_range: AddressRange<Vram>,
    parent_segment_info: ParentSegmentInfo,
}

impl NoloadSym {
    pub(crate) fn new(
        context: &mut Context,
        vram_range: AddressRange<Vram>,
        _in_section_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        properties: NoloadSymProperties,
    ) -> Result<Self, SymbolCreationError> {
        let vram = vram_range.start();
        let detected_size = vram_range.size();
        let in_overlay = parent_segment_info.overlay_category_name().is_some();

        let metadata = context
            .find_owned_segment_mut(&parent_segment_info)?
            .add_self_symbol(
                vram,
                None,
                detected_size,
                SECTION_TYPE,
                None,
                // No bytes, so nothing can pad this symbol.
                |_metadata| Size::new(0),
            )?;
        metadata.set_in_overlay(in_overlay);

        let declared_size = metadata.user_declared_size();
        properties.apply_to_metadata(metadata);

        // A bss extent comes from the distance to the next split, so a
        // diverging declared size means the symbol list and the splits
        // disagree about this address.
        if let Some(declared) = declared_size {
            if declared != detected_size {
                context.add_warning(AnalysisWarning::SizeMismatch {
                    vram,
                    declared,
                    detected: detected_size,
                });
            }
        }

        Ok(Self {
            vram_range,
            parent_segment_info,
        })
    }

    /// Size of this bss chunk.
    #[must_use]
    pub fn size(&self) -> Size {
        self.vram_range.size()
    }
}

impl<'ctx, 'sym, 'flg> NoloadSym {
    pub fn display(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg SymNoloadDisplaySettings,
    ) -> Result<SymNoloadDisplay<'ctx, 'sym, 'flg>, SymDisplayError> {
        SymNoloadDisplay::new(context, self, settings)
    }
}

impl Symbol for NoloadSym {
    fn vram_range(&self) -> &AddressRange<Vram> {
        &self.vram_range
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    #[must_use]
    fn section_type(&self) -> SectionType {
        SECTION_TYPE
    }
}

#[derive(Debug, Clone, Hash, PartialEq)]
pub(crate) struct NoloadSymProperties {
    pub parent_metadata: ParentSectionMetadata,
    pub compiler: Option<Compiler>,
    pub auto_pad_by: Option<Vram>,
}

impl NoloadSymProperties {
    fn apply_to_metadata(self, metadata: &mut SymbolMetadata) {
        metadata.set_parent_metadata(self.parent_metadata);

        if let Some(compiler) = self.compiler {
            metadata.set_compiler(compiler);
        }

        if let Some(auto_pad_by) = self.auto_pad_by {
            metadata.set_auto_created_pad_by(auto_pad_by);
        }
    }
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::{InstructionFlags, IsaVersion, Vram};
use spimdisasm::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    collections::FindSettings,
    config::{Endian, GlobalConfig},
    context::{builder::GlobalSegmentBuilder, Context, ContextBuilder},
    parent_segment_info::ParentSegmentInfo,
    sections::{SectionExecutable, SectionExecutableSettings},
    symbols::Symbol,
};

fn make_context(rom: Rom, vram: Vram, size: Size) -> Context {
    let ranges = RomVramRange::new(
        AddressRange::new(rom, rom + size),
        AddressRange::new(vram, vram + size),
    );
    let global_config = GlobalConfig::new(Endian::Big);
    let global_segment = GlobalSegmentBuilder::new(ranges).finish_symbols();
    ContextBuilder::new(global_config, global_segment).build()
}

#[test]
fn test_section_text_1() {
    let bytes: &[u8] = &[
        // 0x80000400
        0x27, 0xBD, 0xFF, 0xE8, // addiu
        0xAF, 0xB0, 0x00, 0x10, // sw
        0xAF, 0xBF, 0x00, 0x14, // sw
        0x0C, 0x00, 0x01, 0x3F, // jal
        0x00, 0x80, 0x80, 0x21, //  addu
        0x0C, 0x00, 0x01, 0x3F, // jal
        0x02, 0x00, 0x20, 0x21, //  addu
        0x3C, 0x03, 0x80, 0x1A, // lui
        0x8C, 0x63, 0x6D, 0x7C, // lw
        0x24, 0x02, 0x00, 0x02, // addiu
        0x14, 0x62, 0x00, 0x08, // bne
        0x00, 0x00, 0x00, 0x00, //  nop
        0x0C, 0x00, 0x01, 0x3F, // jal
        0x02, 0x00, 0x20, 0x21, //  addu
        0x8F, 0xBF, 0x00, 0x14, // lw
        0x8F, 0xB0, 0x00, 0x10, // lw
        0x27, 0xBD, 0x00, 0x18, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
        0x8F, 0xBF, 0x00, 0x14, // lw
        0x8F, 0xB0, 0x00, 0x10, // lw
        0x27, 0xBD, 0x00, 0x18, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
        // 0x80000460
        0x27, 0xBD, 0xFF, 0xD0, // addiu
        0x3C, 0x04, 0x01, 0x07, // lui
        0x24, 0x84, 0x7C, 0x60, // addiu
        0xAF, 0xB1, 0x00, 0x24, // sw
        0x3C, 0x11, 0x80, 0x1C, // lui
        0x8E, 0x31, 0x70, 0xB0, // lw
        0x3C, 0x05, 0x01, 0x08, // lui
        0x24, 0xA5, 0x35, 0xA0, // addiu
        0x00, 0xA4, 0x28, 0x23, // subu
        0xAF, 0xBF, 0x00, 0x28, // sw
        0x0C, 0x02, 0x66, 0x00, // jal
        0xAF, 0xB0, 0x00, 0x20, //  sw
        0x3C, 0x04, 0x00, 0x58, // lui
        0x24, 0x84, 0x1D, 0xF0, // addiu
        0x3C, 0x10, 0x00, 0x59, // lui
        0x26, 0x10, 0xD7, 0x30, // addiu
        0x02, 0x04, 0x80, 0x23, // subu
        0x02, 0x00, 0x30, 0x21, // addu
        0x0C, 0x00, 0x04, 0xC4, // jal
        0x02, 0x20, 0x28, 0x21, //  addu
        0x02, 0x20, 0x20, 0x21, // addu
        0x3C, 0x02, 0x80, 0x1C, // lui
        0x8C, 0x42, 0x70, 0xB0, // lw
        0x24, 0x05, 0xFF, 0xFF, // addiu
        0x00, 0x00, 0x30, 0x21, // addu
        0xAF, 0xA0, 0x00, 0x10, // sw
        0xAF, 0xA0, 0x00, 0x14, // sw
        0xAF, 0xA0, 0x00, 0x18, // sw
        0x00, 0x50, 0x10, 0x21, // addu
        0x3C, 0x01, 0x80, 0x1C, // lui
        0xAC, 0x22, 0x70, 0xB0, // sw
        0x0C, 0x01, 0x39, 0x39, // jal
        0x24, 0x07, 0x00, 0x02, //  addiu
        0x8F, 0xBF, 0x00, 0x28, // lw
        0x8F, 0xB1, 0x00, 0x24, // lw
        0x8F, 0xB0, 0x00, 0x20, // lw
        0x27, 0xBD, 0x00, 0x30, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
        // 0x800004FC
        0x27, 0xBD, 0xFF, 0xE8, // addiu
        0xAF, 0xBF, 0x00, 0x10, // sw
        0x3C, 0x01, 0x80, 0x22, // lui
        0xAC, 0x20, 0xAD, 0x28, // sw
        0x0C, 0x01, 0xD2, 0xBB, // jal
        0x00, 0x00, 0x00, 0x00, //  nop
        0x8F, 0xBF, 0x00, 0x10, // lw
        0x27, 0xBD, 0x00, 0x18, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let rom = Rom::new(0x001050);
    let vram = Vram::new(0x80000400);

    let mut context = make_context(rom, vram, Size::new(0x1000));
    let text_settings =
        SectionExecutableSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III));

    let section_text = SectionExecutable::new(
        &mut context,
        &text_settings,
        "test".into(),
        bytes,
        rom,
        vram,
        ParentSegmentInfo::new(rom, None),
    )
    .unwrap();

    assert_eq!(section_text.functions().len(), 3);

    let funcs: Vec<Vram> = section_text
        .functions()
        .iter()
        .map(|x| x.vram_range().start())
        .collect();
    assert_eq!(
        funcs,
        vec![
            Vram::new(0x80000400),
            Vram::new(0x80000460),
            Vram::new(0x800004FC)
        ]
    );

    // The three functions plus the branch target of the `bne`.
    assert_eq!(context.global_segment().symbols().len(), 4);
    assert!(context
        .global_segment()
        .find_symbol(Vram::new(0x8000044C), FindSettings::new(false))
        .is_some());
}

#[test]
fn function_boundaries_ignore_early_returns_before_branch_targets() {
    // A function whose first `jr $ra` sits before the target of one of its
    // own branches must not be split in two.
    let bytes: &[u8] = &[
        0x14, 0x80, 0x00, 0x03, // bne $a0, $zero, +0x10
        0x00, 0x00, 0x00, 0x00, //  nop
        0x03, 0xE0, 0x00, 0x08, // jr $ra
        0x00, 0x00, 0x00, 0x00, //  nop
        0x03, 0xE0, 0x00, 0x08, // jr $ra (branch target)
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let rom = Rom::new(0x001000);
    let vram = Vram::new(0x80000400);

    let mut context = make_context(rom, vram, Size::new(0x100));
    let text_settings =
        SectionExecutableSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III));

    let section_text = SectionExecutable::new(
        &mut context,
        &text_settings,
        "early_return".into(),
        bytes,
        rom,
        vram,
        ParentSegmentInfo::new(rom, None),
    )
    .unwrap();

    assert_eq!(section_text.functions().len(), 1);
}

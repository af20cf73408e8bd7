/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::{InstructionDisplayFlags, InstructionFlags, IsaVersion, Vram};
use spimdisasm::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    collections::FindSettings,
    config::{Endian, GlobalConfig, GpConfig},
    context::{builder::GlobalSegmentBuilder, Context, ContextBuilder},
    parent_segment_info::ParentSegmentInfo,
    sections::{SectionExecutable, SectionExecutableSettings},
    symbols::display::FunctionDisplaySettings,
};

fn make_context(gp_config: Option<GpConfig>) -> Context {
    let rom = Rom::new(0x001000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x20000);
    let ranges = RomVramRange::new(
        AddressRange::new(rom, rom + size),
        AddressRange::new(vram, vram + size),
    );

    let global_config = GlobalConfig::new(Endian::Big).with_gp_config(gp_config);
    let global_segment = GlobalSegmentBuilder::new(ranges).finish_symbols();
    ContextBuilder::new(global_config, global_segment).build()
}

#[test]
fn hi_lo_pair_creates_symbol() {
    // lui $at, 0x8001 / addiu $at, $at, 0x2340
    let bytes: &[u8] = &[
        0x3C, 0x01, 0x80, 0x01, // lui
        0x24, 0x21, 0x23, 0x40, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr $ra
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let rom = Rom::new(0x001000);
    let vram = Vram::new(0x80000000);

    let mut context = make_context(None);
    let settings =
        SectionExecutableSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III));

    let section = SectionExecutable::new(
        &mut context,
        &settings,
        "hi_lo".into(),
        bytes,
        rom,
        vram,
        ParentSegmentInfo::new(rom, None),
    )
    .unwrap();

    assert_eq!(section.functions().len(), 1);

    let sym = context
        .global_segment()
        .find_symbol(Vram::new(0x80012340), FindSettings::new(false))
        .expect("The pair must produce a symbol at the computed address");
    assert_eq!(sym.vram(), Vram::new(0x80012340));
    assert_eq!(sym.reference_counter(), 1);

    let display_settings =
        FunctionDisplaySettings::new(InstructionDisplayFlags::default());
    let text = section.functions()[0]
        .display(&context, &display_settings)
        .unwrap()
        .to_string();

    assert!(text.contains("%hi(D_80012340)"), "{}", text);
    assert!(text.contains("%lo(D_80012340)"), "{}", text);
}

#[test]
fn gp_relative_load_symbolizes_through_gp_value() {
    // lw $v0, 0x10($gp)
    let bytes: &[u8] = &[
        0x8F, 0x82, 0x00, 0x10, // lw
        0x03, 0xE0, 0x00, 0x08, // jr $ra
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let rom = Rom::new(0x001000);
    let vram = Vram::new(0x80000000);
    let gp_config = GpConfig::new(Vram::new(0x80010000), false);

    let mut context = make_context(Some(gp_config));
    let settings =
        SectionExecutableSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III));

    let section = SectionExecutable::new(
        &mut context,
        &settings,
        "gprel".into(),
        bytes,
        rom,
        vram,
        ParentSegmentInfo::new(rom, None),
    )
    .unwrap();

    let sym = context
        .global_segment()
        .find_symbol(Vram::new(0x80010010), FindSettings::new(false))
        .expect("The gp-relative access must produce a symbol");
    assert!(sym.accessed_as_gp_rel());

    let display_settings =
        FunctionDisplaySettings::new(InstructionDisplayFlags::default());
    let text = section.functions()[0]
        .display(&context, &display_settings)
        .unwrap()
        .to_string();
    assert!(text.contains("%gp_rel(D_80010010)"), "{}", text);

    // The expansion hack spells the bare symbol and declares it up front.
    let hack_settings = FunctionDisplaySettings::new(InstructionDisplayFlags::default())
        .with_gp_rel_hack(true);
    let hack_text = section.functions()[0]
        .display(&context, &hack_settings)
        .unwrap()
        .to_string();
    assert!(hack_text.contains(".extern D_80010010, 0x4"), "{}", hack_text);
    assert!(!hack_text.contains("%gp_rel"), "{}", hack_text);
}

#[test]
fn debug_fields() {
    use rabbitizer::Instruction;
    let lui_word: u32 = 0x3C018001;
    let addiu_word: u32 = 0x24212340;
    let lui = Instruction::new(lui_word, Vram::new(0x80000000), InstructionFlags::new(IsaVersion::MIPS_III));
    let addiu = Instruction::new(addiu_word, Vram::new(0x80000004), InstructionFlags::new(IsaVersion::MIPS_III));
    eprintln!("lui opcode {:?} can_be_hi={} rt={:?} imm_i16={:?}", lui.opcode().name(), lui.opcode().can_be_hi(), lui.field().rt(), lui.field().imm_i16());
    eprintln!("addiu opcode {:?} can_be_lo={} rs={:?} imm_i16={:?}", addiu.opcode().name(), addiu.opcode().can_be_lo(), addiu.field().rs(), addiu.field().imm_i16());
}

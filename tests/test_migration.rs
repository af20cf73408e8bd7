/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::{InstructionDisplayFlags, InstructionFlags, IsaVersion, Vram};
use spimdisasm::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    config::{Endian, GlobalConfig},
    context::{builder::GlobalSegmentBuilder, Context, ContextBuilder},
    migration::FunctionRodataPairing,
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    sections::{
        SectionData, SectionDataSettings, SectionExecutable, SectionExecutableSettings,
    },
    symbols::display::{FunctionDisplaySettings, SymDataDisplaySettings},
};

fn make_context() -> Context {
    let rom = Rom::new(0x001000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x30000);
    let ranges = RomVramRange::new(
        AddressRange::new(rom, rom + size),
        AddressRange::new(vram, vram + size),
    );

    let mut global_segment = GlobalSegmentBuilder::new(ranges);
    // An unreferenced rodata symbol sitting between the two referenced ones.
    global_segment
        .add_user_symbol("RO_80020008".into(), Vram::new(0x80020008), None, None)
        .unwrap();

    ContextBuilder::new(GlobalConfig::new(Endian::Big), global_segment.finish_symbols()).build()
}

/// Two tiny functions, each materializing the address of its own rodata
/// blob.
const TEXT_BYTES: &[u8] = &[
    // func_80000400: lui/addiu pair pointing at 0x80020000
    0x3C, 0x04, 0x80, 0x02, // lui $a0, 0x8002
    0x24, 0x84, 0x00, 0x00, // addiu $a0, $a0, 0x0
    0x03, 0xE0, 0x00, 0x08, // jr $ra
    0x00, 0x00, 0x00, 0x00, //  nop
    // func_80000410: lui/addiu pair pointing at 0x80020010
    0x3C, 0x04, 0x80, 0x02, // lui $a0, 0x8002
    0x24, 0x84, 0x00, 0x10, // addiu $a0, $a0, 0x10
    0x03, 0xE0, 0x00, 0x08, // jr $ra
    0x00, 0x00, 0x00, 0x00, //  nop
];

const RODATA_BYTES: &[u8] = &[
    0x00, 0x00, 0x00, 0x01, // RO_80020000 (referenced by func_80000400)
    0x00, 0x00, 0x00, 0x02, //
    0x00, 0x00, 0x00, 0x03, // RO_80020008 (unreferenced)
    0x00, 0x00, 0x00, 0x04, //
    0x00, 0x00, 0x00, 0x05, // RO_80020010 (referenced by func_80000410)
    0x00, 0x00, 0x00, 0x06, //
];

fn analyze(context: &mut Context) -> (SectionExecutable, SectionData) {
    let parent = ParentSegmentInfo::new(Rom::new(0x001000), None);

    let text = SectionExecutable::new(
        context,
        &SectionExecutableSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III)),
        "text".into(),
        TEXT_BYTES,
        Rom::new(0x001400),
        Vram::new(0x80000400),
        parent.clone(),
    )
    .unwrap();

    let rodata = SectionData::new(
        context,
        &SectionDataSettings::new(None),
        "rodata".into(),
        RODATA_BYTES,
        Rom::new(0x021000),
        Vram::new(0x80020000),
        parent,
        SectionType::Rodata,
    )
    .unwrap();

    (text, rodata)
}

#[test]
fn unreferenced_rodata_is_carried_with_the_preceding_function() {
    let mut context = make_context();
    let (text, rodata) = analyze(&mut context);

    assert_eq!(text.functions().len(), 2);
    assert_eq!(rodata.data_symbols().len(), 3);

    let pairings = FunctionRodataPairing::pair_sections(&mut context, &text, Some(&rodata));

    assert_eq!(pairings.len(), 2);

    // func_80000400 drags RO_80020000 plus the unreferenced RO_80020008.
    assert_eq!(pairings[0].function_index(), Some(0));
    assert_eq!(pairings[0].rodata_indices(), &[0, 1]);

    // func_80000410 gets RO_80020010.
    assert_eq!(pairings[1].function_index(), Some(1));
    assert_eq!(pairings[1].rodata_indices(), &[2]);
}

#[test]
fn pairing_display_interleaves_rodata_and_text() {
    let mut context = make_context();
    let (text, rodata) = analyze(&mut context);

    let pairings = FunctionRodataPairing::pair_sections(&mut context, &text, Some(&rodata));

    let function_settings = FunctionDisplaySettings::new(InstructionDisplayFlags::default());
    let rodata_settings = SymDataDisplaySettings::new();

    let output = pairings[0]
        .display(
            &context,
            &text,
            Some(&rodata),
            &function_settings,
            &rodata_settings,
        )
        .unwrap()
        .to_string();

    let rodata_pos = output.find(".section .rodata").unwrap();
    let text_pos = output.find(".section .text").unwrap();
    assert!(rodata_pos < text_pos, "{}", output);

    let unreferenced_pos = output.find("RO_80020008").unwrap();
    assert!(rodata_pos < unreferenced_pos && unreferenced_pos < text_pos, "{}", output);

    assert!(output.contains("glabel func_80000400"), "{}", output);
}

#[test]
fn migration_determinism() {
    let mut context_a = make_context();
    let (text_a, rodata_a) = analyze(&mut context_a);
    let mut context_b = make_context();
    let (text_b, rodata_b) = analyze(&mut context_b);

    let pairings_a = FunctionRodataPairing::pair_sections(&mut context_a, &text_a, Some(&rodata_a));
    let pairings_b = FunctionRodataPairing::pair_sections(&mut context_b, &text_b, Some(&rodata_b));

    assert_eq!(pairings_a, pairings_b);
}

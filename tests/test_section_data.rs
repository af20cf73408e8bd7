/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::{InstructionFlags, IsaVersion, Vram};
use spimdisasm::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    analysis::StringGuesserLevel,
    collections::FindSettings,
    config::{Endian, GlobalConfig},
    context::{builder::GlobalSegmentBuilder, Context, ContextBuilder},
    metadata::SymbolType,
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    sections::{
        SectionData, SectionDataSettings, SectionExecutable, SectionExecutableSettings,
    },
    symbols::{display::SymDataDisplaySettings, Symbol},
};

fn make_context(endian: Endian, user_symbols: &[(&str, u32, Option<SymbolType>)]) -> Context {
    let rom = Rom::new(0x001000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x20000);
    let ranges = RomVramRange::new(
        AddressRange::new(rom, rom + size),
        AddressRange::new(vram, vram + size),
    );

    let mut global_segment = GlobalSegmentBuilder::new(ranges);
    for (name, sym_vram, sym_type) in user_symbols {
        global_segment
            .add_user_symbol((*name).into(), Vram::new(*sym_vram), None, *sym_type)
            .unwrap();
    }

    ContextBuilder::new(GlobalConfig::new(endian), global_segment.finish_symbols()).build()
}

#[test]
fn jumptable_grows_until_first_non_entry_word() {
    // A function covering [0x80000100, 0x80000200), made of nops and a
    // return, so the jumptable entries have a body to point into.
    let mut text_bytes = vec![0; 0x100];
    text_bytes[0xF8..0xFC].copy_from_slice(&[0x03, 0xE0, 0x00, 0x08]); // jr $ra

    let mut context = make_context(
        Endian::Big,
        &[("jtbl_test", 0x80010000, Some(SymbolType::Jumptable))],
    );

    let text_rom = Rom::new(0x001100);
    let text_vram = Vram::new(0x80000100);
    let section_text = SectionExecutable::new(
        &mut context,
        &SectionExecutableSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III)),
        "text".into(),
        &text_bytes,
        text_rom,
        text_vram,
        ParentSegmentInfo::new(Rom::new(0x001000), None),
    )
    .unwrap();
    assert_eq!(section_text.functions().len(), 1);

    // Four entries into the function, then a word which is not a vram.
    let rodata_bytes: &[u8] = &[
        0x80, 0x00, 0x01, 0x00, //
        0x80, 0x00, 0x01, 0x14, //
        0x80, 0x00, 0x01, 0x28, //
        0x80, 0x00, 0x01, 0x3C, //
        0x00, 0x00, 0x00, 0x2A, //
    ];
    let rodata_rom = Rom::new(0x011000);
    let rodata_vram = Vram::new(0x80010000);

    let section_rodata = SectionData::new(
        &mut context,
        &SectionDataSettings::new(None),
        "rodata".into(),
        rodata_bytes,
        rodata_rom,
        rodata_vram,
        ParentSegmentInfo::new(Rom::new(0x001000), None),
        SectionType::Rodata,
    )
    .unwrap();

    // The table stops where the entries stop.
    assert_eq!(section_rodata.data_symbols().len(), 2);
    assert_eq!(
        section_rodata.data_symbols()[0].vram_range().size(),
        Size::new(0x10)
    );

    for label_vram in [0x80000100, 0x80000114, 0x80000128, 0x8000013C] {
        let label = context
            .global_segment()
            .find_symbol(Vram::new(label_vram), FindSettings::new(false))
            .expect("Every table entry must produce a label");
        let expected = if label_vram == 0x80000100 {
            // The table points at the function's entry, which stays a
            // function.
            SymbolType::Function
        } else {
            SymbolType::JumptableLabel
        };
        assert_eq!(label.sym_type(), Some(expected), "0x{:08X}", label_vram);
    }
}

#[test]
fn string_guesser_levels_change_data_classification() {
    let bytes: &[u8] = b"Hello\0\0\0";
    let rom = Rom::new(0x011000);
    let vram = Vram::new(0x80010000);
    let parent = ParentSegmentInfo::new(Rom::new(0x001000), None);

    // Level 1 accepts the unreferenced, NUL-terminated candidate.
    let mut context = make_context(Endian::Big, &[]);
    let section = SectionData::new(
        &mut context,
        &SectionDataSettings::new(None)
            .with_string_guesser_level(StringGuesserLevel::UniqueReference),
        "rodata".into(),
        bytes,
        rom,
        vram,
        parent.clone(),
        SectionType::Rodata,
    )
    .unwrap();

    let text = section.data_symbols()[0]
        .display(&context, &SymDataDisplaySettings::new())
        .unwrap()
        .to_string();
    assert!(text.contains(".asciz \"Hello\""), "{}", text);

    // Disabled guesser falls back to words.
    let mut context = make_context(Endian::Big, &[]);
    let section = SectionData::new(
        &mut context,
        &SectionDataSettings::new(None).with_string_guesser_level(StringGuesserLevel::Disabled),
        "rodata".into(),
        bytes,
        rom,
        vram,
        parent,
        SectionType::Rodata,
    )
    .unwrap();

    let text = section.data_symbols()[0]
        .display(&context, &SymDataDisplaySettings::new())
        .unwrap()
        .to_string();
    assert!(text.contains(".word 0x48656C6C"), "{}", text);
    assert!(!text.contains(".asciz"), "{}", text);
}

#[test]
fn little_endian_double_is_emitted_as_double() {
    // Little endian images store a double as two swapped 32 bit words.
    let bits = 3.14f64.to_bits();
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&((bits >> 32) as u32).to_le_bytes());
    bytes[4..].copy_from_slice(&(bits as u32).to_le_bytes());

    let mut context = make_context(
        Endian::Little,
        &[("DBL_80010000", 0x80010000, Some(SymbolType::Float64))],
    );

    let section = SectionData::new(
        &mut context,
        &SectionDataSettings::new(None),
        "rodata".into(),
        &bytes,
        Rom::new(0x011000),
        Vram::new(0x80010000),
        ParentSegmentInfo::new(Rom::new(0x001000), None),
        SectionType::Rodata,
    )
    .unwrap();

    let text = section.data_symbols()[0]
        .display(&context, &SymDataDisplaySettings::new())
        .unwrap()
        .to_string();
    assert!(text.contains(".double 3.14"), "{}", text);
}

/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::Vram;
use spimdisasm::{
    addresses::{AddressRange, Rom, RomVramRange, Size},
    collections::FindSettings,
    config::{Endian, GlobalConfig},
    context::{builder::GlobalSegmentBuilder, Context, ContextBuilder},
    parent_segment_info::ParentSegmentInfo,
    sections::{SectionNoload, SectionNoloadSettings},
    symbols::Symbol,
};

fn make_context() -> Context {
    let rom = Rom::new(0x001000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x20000);
    let ranges = RomVramRange::new(
        AddressRange::new(rom, rom + size),
        AddressRange::new(vram, vram + size),
    );

    let mut global_segment = GlobalSegmentBuilder::new(ranges);
    {
        let sym = global_segment
            .add_user_symbol("gBuffer".into(), Vram::new(0x80010000), None, None)
            .unwrap();
        *sym.user_declared_size_mut() = Some(Size::new(0x20));
    }
    global_segment
        .add_user_symbol("gCounter".into(), Vram::new(0x80010100), None, None)
        .unwrap();

    ContextBuilder::new(GlobalConfig::new(Endian::Big), global_segment.finish_symbols()).build()
}

#[test]
fn bss_splits_on_user_symbols_and_generates_pads() {
    let mut context = make_context();

    let vram_range = AddressRange::new(Vram::new(0x80010000), Vram::new(0x80010200));
    let section = SectionNoload::new(
        &mut context,
        &SectionNoloadSettings::new(None),
        "bss".into(),
        vram_range,
        ParentSegmentInfo::new(Rom::new(0x001000), None),
    )
    .unwrap();

    // gBuffer, the pad after its declared size, and gCounter.
    assert_eq!(section.noload_symbols().len(), 3);

    assert_eq!(section.noload_symbols()[0].size(), Size::new(0x20));
    assert_eq!(
        section.noload_symbols()[1].vram_range().start(),
        Vram::new(0x80010020)
    );
    assert_eq!(
        section.noload_symbols()[2].vram_range().start(),
        Vram::new(0x80010100)
    );
    assert_eq!(section.noload_symbols()[2].size(), Size::new(0x100));

    let pad = context
        .global_segment()
        .find_symbol(Vram::new(0x80010020), FindSettings::new(false))
        .unwrap();
    assert!(pad.is_autogenerated_pad());
    assert_eq!(pad.auto_created_pad_by(), Some(Vram::new(0x80010000)));
}

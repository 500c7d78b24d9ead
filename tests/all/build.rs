//! Two-pass build behavior: address layout, header encodings and the
//! listing of the final stream.

use super::*;
use r600_asm::{
    AluClauseKind, ExportKind, FlowKind, Output, VtxFetch, ALU_SRC_1, ALU_SRC_PV,
};

fn sample(family: ChipFamily) -> Program {
    let mut program = program(family);
    program.add_alu(sealed(mov(1, 0, gpr(0, 0)))).unwrap();
    program.add_vtx(VtxFetch {
        buffer_id: 1,
        dst_gpr: 2,
        dst_sel: [0, 1, 2, 3],
        mega_fetch_count: 0x1F,
        ..VtxFetch::default()
    });
    program
        .add_alu(sealed(add(3, 1, gpr(2, 0), literal(0x40490FDB))))
        .unwrap();
    program.add_cfinst(FlowKind::Return);
    program
}

#[test]
fn identical_sequences_build_identical_words() {
    let mut a = sample(ChipFamily::Rv770);
    let mut b = sample(ChipFamily::Rv770);
    a.build().unwrap();
    b.build().unwrap();
    assert!(!a.words().is_empty());
    assert_eq!(a.words(), b.words());

    // Rebuilding does not disturb the stream either.
    let first = a.words().to_vec();
    a.build().unwrap();
    assert_eq!(a.words(), first);
}

#[test]
fn fetch_bodies_land_on_fetch_boundaries() {
    let mut program = sample(ChipFamily::Rv770);
    program.build().unwrap();

    assert_block_kinds(
        &program,
        &[
            CfKind::Alu(AluClauseKind::Alu),
            CfKind::Vtx,
            CfKind::Alu(AluClauseKind::Alu),
            CfKind::Flow(FlowKind::Return),
        ],
    );
    for block in program.blocks() {
        match block.kind() {
            CfKind::Vtx | CfKind::Tex | CfKind::VtxTc | CfKind::Tc => {
                assert_eq!(block.addr() % 4, 0);
            }
            _ => {}
        }
    }
}

#[test]
fn headers_encode_their_blocks() {
    let mut program = program(ChipFamily::Rv770);
    program.add_alu(sealed(mov(1, 0, gpr(0, 0)))).unwrap();
    program.add_output(Output {
        kind: ExportKind::ExportDone,
        gpr: 1,
        end_of_program: true,
        ..Output::default()
    });
    program.build().unwrap();

    let words = program.words();
    assert_eq!(words.len(), 6);
    // ALU clause: body at 4, one slot pair, plain clause opcode.
    assert_eq!(words[0], 4 >> 1);
    assert_eq!(words[1], 0xA000_0000);
    // MOV body: GPR0.x source with the group terminator bit, GPR1.x
    // destination with write enable.
    assert_eq!(words[4], 0x8000_0000);
    assert_eq!(words[5], 0x0020_0C90);
    // Export: GPR1, pixel 0, identity swizzle, barrier and EOP.
    assert_eq!(words[2], 1 << 15);
    assert_eq!(words[3], 0x9420_0688);
}

#[test]
fn cayman_routes_vertex_fetches_through_the_texture_cache() {
    let mut program = program(ChipFamily::Cayman);
    program.add_vtx(VtxFetch {
        buffer_id: 0,
        dst_gpr: 1,
        dst_sel: [0, 1, 2, 3],
        ..VtxFetch::default()
    });
    program.add_cf_end();
    program.build().unwrap();

    let words = program.words();
    // The unified fetch clause carries the texture-path opcode.
    assert_eq!((words[1] >> 22) & 0xFF, 0x01);
    // Mega-fetch fields are gone from the record.
    assert_eq!((words[4] >> 26) & 0x3F, 0);
    assert_eq!((words[6] >> 19) & 1, 0);
    // END closes the stream in place of an export bit.
    assert_eq!(words[2], 0);
    assert_eq!(words[3], 0x8800_0000);
}

#[test]
fn listings_mirror_scheduled_state() {
    let mut program = program(ChipFamily::Rv770);
    program.add_alu(sealed(mov(1, 0, gpr(0, 0)))).unwrap();
    program
        .add_alu(sealed(add(2, 1, gpr(1, 0), literal(0x3F80_0000))))
        .unwrap();
    program.build().unwrap();

    let listing = program.dump();
    for block in program.blocks() {
        for inst in block.alu_instructions() {
            let line = format!(
                "SRC0(SEL:{} REL:0 CHAN:{} NEG:0)",
                inst.src[0].sel, inst.src[0].chan
            );
            assert!(listing.contains(&line), "missing {line:?} in:\n{listing}");
        }
    }
    // The listing shows the scheduled operands, not the ones added.
    let forwarded = format!("SRC0(SEL:{ALU_SRC_PV} REL:0 CHAN:0 NEG:0)");
    assert!(listing.contains(&forwarded));
    let folded = format!("SRC1(SEL:{ALU_SRC_1} REL:0 CHAN:0 NEG:0)");
    assert!(listing.contains(&folded));
}

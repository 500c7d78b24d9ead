//! Assembler tests driving the public API end to end.

mod alu;
mod build;
mod fetch;

use r600_asm::{AluInst, AluOp2, AluSrc, CfKind, ChipFamily, Program, ALU_SRC_LITERAL};

/// Fresh program with test logging wired up.
fn program(family: ChipFamily) -> Program {
    let _ = env_logger::try_init();
    Program::new(family)
}

fn gpr(sel: u32, chan: u8) -> AluSrc {
    AluSrc {
        sel,
        chan,
        ..AluSrc::default()
    }
}

fn literal(value: u32) -> AluSrc {
    AluSrc {
        sel: ALU_SRC_LITERAL,
        value,
        ..AluSrc::default()
    }
}

fn mov(dst_sel: u32, dst_chan: u8, src: AluSrc) -> AluInst {
    let mut inst = AluInst::new(AluOp2::Mov);
    inst.src[0] = src;
    inst.dst.sel = dst_sel;
    inst.dst.chan = dst_chan;
    inst.dst.write = true;
    inst
}

fn add(dst_sel: u32, dst_chan: u8, a: AluSrc, b: AluSrc) -> AluInst {
    let mut inst = AluInst::new(AluOp2::Add);
    inst.src[0] = a;
    inst.src[1] = b;
    inst.dst.sel = dst_sel;
    inst.dst.chan = dst_chan;
    inst.dst.write = true;
    inst
}

fn sealed(mut inst: AluInst) -> AluInst {
    inst.last = true;
    inst
}

#[track_caller]
fn assert_block_kinds(program: &Program, expected: &[CfKind]) {
    let kinds: Vec<CfKind> = program.blocks().map(|block| block.kind()).collect();
    assert_eq!(kinds, expected);
}

//! Group scheduling seen from the outside: slot assignment, merging,
//! forwarding, kcache locks and the literal pool.

use super::*;
use r600_asm::{
    AluClauseKind, AluOp, Error, KCacheMode, ALU_SRC_1, ALU_SRC_PV,
};

fn mul(dst_sel: u32, dst_chan: u8, a: AluSrc, b: AluSrc) -> AluInst {
    let mut inst = AluInst::new(AluOp2::Mul);
    inst.src[0] = a;
    inst.src[1] = b;
    inst.dst.sel = dst_sel;
    inst.dst.chan = dst_chan;
    inst.dst.write = true;
    inst
}

#[test]
fn dependent_groups_stay_separate_and_forward_pv() {
    let mut program = program(ChipFamily::Rv770);
    program.add_alu(sealed(mov(1, 0, gpr(0, 0)))).unwrap();
    program
        .add_alu(sealed(add(2, 1, gpr(1, 0), literal(0x3F80_0000))))
        .unwrap();

    assert_block_kinds(&program, &[CfKind::Alu(AluClauseKind::Alu)]);
    let block = program.blocks().next().unwrap();
    let alu = block.alu_instructions();
    assert_eq!(alu.len(), 2);

    // The ADD reads the MOV's destination in the same cycle window, so
    // the groups stay separate and the operand forwards through PV.
    assert!(alu[0].last && alu[1].last);
    assert_eq!(alu[1].src[0].sel, ALU_SRC_PV);
    assert_eq!(alu[1].src[0].chan, 0);
    // 1.0f folds onto the inline-one selector, leaving the pool empty.
    assert_eq!(alu[1].src[1].sel, ALU_SRC_1);
    assert_eq!(block.ndw(), 4);
}

#[test]
fn five_wide_group_fills_every_slot() {
    let mut program = program(ChipFamily::Rv770);
    for chan in 0..4 {
        program.add_alu(mov(1, chan, gpr(0, chan))).unwrap();
    }
    let mut recip = AluInst::new(AluOp2::RecipIeee);
    recip.src[0] = gpr(0, 0);
    recip.dst.sel = 2;
    recip.dst.write = true;
    program.add_alu(sealed(recip)).unwrap();

    let block = program.blocks().next().unwrap();
    let alu = block.alu_instructions();
    assert_eq!(alu.len(), 5);
    for (slot, inst) in alu.iter().take(4).enumerate() {
        assert_eq!(usize::from(inst.dst.chan), slot);
        assert!(!inst.last);
    }
    assert_eq!(alu[4].op, AluOp::Op2(AluOp2::RecipIeee));
    assert!(alu[4].last);
}

#[test]
fn cayman_groups_are_four_wide() {
    // The fifth any-unit instruction spills to the transcendental slot
    // where one exists.
    let mut wide = program(ChipFamily::Rv770);
    for chan in 0..4 {
        wide.add_alu(mov(1, chan, gpr(0, chan))).unwrap();
    }
    wide.add_alu(sealed(mov(2, 0, gpr(0, 0)))).unwrap();
    assert_eq!(wide.blocks().next().unwrap().alu_instructions().len(), 5);

    let mut narrow = program(ChipFamily::Cayman);
    for chan in 0..4 {
        narrow.add_alu(mov(1, chan, gpr(0, chan))).unwrap();
    }
    assert_eq!(
        narrow.add_alu(sealed(mov(2, 0, gpr(0, 0)))),
        Err(Error::SlotContention)
    );
}

#[test]
fn unsatisfiable_read_ports_are_rejected() {
    // Eight distinct x-channel registers over one group outrun the three
    // read cycles a vector unit gets per channel.
    let mut program = program(ChipFamily::Rv770);
    for chan in 0..3 {
        let sel = 2 + 2 * u32::from(chan);
        program
            .add_alu(mul(1, chan, gpr(sel, 0), gpr(sel + 1, 0)))
            .unwrap();
    }
    assert_eq!(
        program.add_alu(sealed(mul(1, 3, gpr(8, 0), gpr(9, 0)))),
        Err(Error::NoBankSwizzle)
    );
}

#[test]
fn resident_kcache_lines_are_shared() {
    let mut program = program(ChipFamily::Rv770);
    program.add_alu(sealed(mov(1, 0, gpr(520, 0)))).unwrap();
    program.add_alu(sealed(mov(1, 1, gpr(530, 0)))).unwrap();

    let block = program.blocks().next().unwrap();
    let slots = block.kcache_slots();
    assert_eq!(slots[0].mode, KCacheMode::Lock2);
    assert_eq!(slots[0].addr, 0);
    assert_eq!(slots[1].mode, KCacheMode::Nop);

    // Both constants translate onto the clause-local window of set 0,
    // and the independent groups fold into one.
    let alu = block.alu_instructions();
    assert_eq!(alu[0].src[0].sel, 136);
    assert_eq!(alu[1].src[0].sel, 146);
    assert!(!alu[0].last);
    assert!(alu[1].last);
}

#[test]
fn group_literals_deduplicate() {
    let value = 0x4020_0000;
    let mut program = program(ChipFamily::Rv770);
    for chan in 0..3 {
        program
            .add_alu(add(1, chan, literal(value), literal(value)))
            .unwrap();
    }
    program
        .add_alu(sealed(add(1, 3, literal(value), literal(value))))
        .unwrap();

    // Four instructions share one pooled dword, padded to two.
    assert_eq!(program.blocks().next().unwrap().ndw(), 10);

    program.build().unwrap();
    let block = program.blocks().next().unwrap();
    for inst in block.alu_instructions() {
        assert_eq!(inst.src[0].chan, 0);
        assert_eq!(inst.src[1].chan, 0);
    }
    assert_eq!(program.words()[10], value);
    assert_eq!(program.words()[11], 0);
}

#[test]
fn five_distinct_literals_overflow() {
    let mut program = program(ChipFamily::Rv770);
    program
        .add_alu(add(1, 0, literal(0x4000_0000), literal(0x4040_0000)))
        .unwrap();
    program
        .add_alu(add(1, 1, literal(0x4080_0000), literal(0x40A0_0000)))
        .unwrap();
    assert_eq!(
        program.add_alu(sealed(mov(1, 2, literal(0x40C0_0000)))),
        Err(Error::TooManyLiterals)
    );
}

#[test]
fn merged_groups_share_their_literal_pool() {
    let a = 0x4000_0000;
    let b = 0x4040_0000;
    let mut program = program(ChipFamily::Rv770);
    program.add_alu(sealed(add(1, 0, literal(a), literal(b)))).unwrap();
    program.add_alu(sealed(mov(1, 1, literal(a)))).unwrap();

    // The second group folds into the first; its pool charge is rolled
    // back and the shared value pools once.
    let block = program.blocks().next().unwrap();
    let alu = block.alu_instructions();
    assert_eq!(alu.len(), 2);
    assert!(!alu[0].last);
    assert!(alu[1].last);
    assert_eq!(block.ndw(), 6);
}

//! Bit-exact word encoders.
//!
//! Each function packs one record of the final bytecode stream. Layouts
//! shift between hardware revisions in small ways: R700 widens the ALU
//! opcode field by one bit at the expense of the output-modifier
//! position, Evergreen rearranges the control-flow word, Cayman drops
//! the mega-fetch fields. Callers pick the variant through `rev`.

use crate::family::ChipRev;
use crate::ir::{AluClauseKind, AluInst, FlowKind, KCacheSlot, Output, TexFetch, VtxFetch};
use crate::{Error, Result};

fn bit(flag: bool) -> u32 {
    u32::from(flag)
}

/// First ALU word: source operands 0 and 1, identical on every revision.
pub(crate) fn alu_word0(alu: &AluInst) -> u32 {
    let s0 = &alu.src[0];
    let s1 = &alu.src[1];
    (s0.sel & 0x1FF)
        | (bit(s0.rel) << 9)
        | ((u32::from(s0.chan) & 0x3) << 10)
        | (bit(s0.neg) << 12)
        | ((s1.sel & 0x1FF) << 13)
        | (bit(s1.rel) << 22)
        | ((u32::from(s1.chan) & 0x3) << 23)
        | (bit(s1.neg) << 25)
        | (bit(alu.last) << 31)
}

/// Second ALU word: destination, opcode and either the third source
/// operand or the two-operand modifier bits.
pub(crate) fn alu_word1(rev: ChipRev, alu: &AluInst) -> Result<u32> {
    let inst = alu
        .op
        .code(rev)
        .ok_or(Error::OpUnavailable { op: alu.op, rev })?;
    let dst = &alu.dst;
    let common = ((u32::from(alu.bank_swizzle) & 0x7) << 18)
        | ((dst.sel & 0x7F) << 21)
        | (bit(dst.rel) << 28)
        | ((u32::from(dst.chan) & 0x3) << 29)
        | (bit(dst.clamp) << 31);
    let word = if alu.op.is_op3() {
        let s2 = &alu.src[2];
        common
            | (s2.sel & 0x1FF)
            | (bit(s2.rel) << 9)
            | ((u32::from(s2.chan) & 0x3) << 10)
            | (bit(s2.neg) << 12)
            | ((inst & 0x1F) << 13)
    } else if rev == ChipRev::R600 {
        common
            | bit(alu.src[0].abs)
            | (bit(alu.src[1].abs) << 1)
            | (bit(alu.predicate) << 2)
            | (bit(alu.predicate) << 3)
            | (bit(dst.write) << 4)
            | ((u32::from(alu.omod) & 0x3) << 6)
            | ((inst & 0x3FF) << 8)
    } else {
        common
            | bit(alu.src[0].abs)
            | (bit(alu.src[1].abs) << 1)
            | (bit(alu.predicate) << 2)
            | (bit(alu.predicate) << 3)
            | (bit(dst.write) << 4)
            | ((u32::from(alu.omod) & 0x3) << 5)
            | ((inst & 0x7FF) << 7)
    };
    Ok(word)
}

/// Header words of an ALU clause.
pub(crate) fn cf_alu_words(
    rev: ChipRev,
    kind: AluClauseKind,
    addr: u32,
    ndw: u32,
    kcache: &[KCacheSlot; 2],
    uses_waterfall: bool,
) -> [u32; 2] {
    let word0 = ((addr >> 1) & 0x3F_FFFF)
        | ((kcache[0].bank & 0xF) << 22)
        | ((kcache[1].bank & 0xF) << 26)
        | (kcache[0].mode.code() << 30);
    // Bit 25 is USES_WATERFALL on R600 and repurposed afterwards.
    let waterfall = rev == ChipRev::R600 && uses_waterfall;
    let word1 = (kcache[1].mode.code() & 0x3)
        | ((kcache[0].addr & 0xFF) << 2)
        | ((kcache[1].addr & 0xFF) << 10)
        | (((ndw / 2 - 1) & 0x7F) << 18)
        | (bit(waterfall) << 25)
        | ((kind.code() & 0xF) << 26)
        | (1 << 31);
    [word0, word1]
}

/// Header words of a fetch clause. `inst` is the clause opcode, which
/// depends on the fetch path and revision.
pub(crate) fn cf_fetch_words(rev: ChipRev, inst: u32, addr: u32, ndw: u32) -> [u32; 2] {
    let count = ndw / 4 - 1;
    let word1 = if rev >= ChipRev::Evergreen {
        ((count & 0x3F) << 10) | ((inst & 0xFF) << 22) | (1 << 31)
    } else {
        let mut word1 = ((count & 0x7) << 10) | ((inst & 0x7F) << 23) | (1 << 31);
        if rev == ChipRev::R700 {
            // R700 grew the record count past the 3-bit field.
            word1 |= ((count >> 3) & 0x1) << 19;
        }
        word1
    };
    [addr >> 1, word1]
}

/// Header words of a clauseless control-flow block.
pub(crate) fn cf_flow_words(
    rev: ChipRev,
    kind: FlowKind,
    cf_addr: u32,
    cond: u32,
    pop_count: u32,
) -> [u32; 2] {
    let word1 = if rev >= ChipRev::Evergreen {
        (pop_count & 0x7) | ((cond & 0x3) << 8) | ((kind.code() & 0xFF) << 22) | (1 << 31)
    } else {
        (pop_count & 0x7) | ((cond & 0x3) << 8) | ((kind.code() & 0x7F) << 23) | (1 << 31)
    };
    [cf_addr >> 1, word1]
}

/// Header words of an export block.
pub(crate) fn export_words(rev: ChipRev, out: &Output) -> [u32; 2] {
    let word0 = (out.array_base & 0x1FFF)
        | ((out.ty & 0x3) << 13)
        | ((out.gpr & 0x7F) << 15)
        | ((out.elem_size & 0x3) << 30);
    let swiz = (u32::from(out.swizzle[0]) & 0x7)
        | ((u32::from(out.swizzle[1]) & 0x7) << 3)
        | ((u32::from(out.swizzle[2]) & 0x7) << 6)
        | ((u32::from(out.swizzle[3]) & 0x7) << 9);
    let word1 = if rev >= ChipRev::Evergreen {
        swiz | (((out.burst_count - 1) & 0xF) << 16)
            | (bit(out.end_of_program) << 21)
            | ((out.kind.code(rev) & 0xFF) << 22)
            | (bit(out.barrier) << 31)
    } else {
        swiz | (((out.burst_count - 1) & 0xF) << 17)
            | (bit(out.end_of_program) << 21)
            | ((out.kind.code(rev) & 0x7F) << 23)
            | (bit(out.barrier) << 31)
    };
    [word0, word1]
}

/// One vertex fetch record. The opcode is implied by the clause and
/// never encoded.
pub(crate) fn vtx_words(rev: ChipRev, vtx: &VtxFetch) -> [u32; 4] {
    let mut word0 = ((u32::from(vtx.fetch_type) & 0x3) << 5)
        | ((vtx.buffer_id & 0xFF) << 8)
        | ((vtx.src_gpr & 0x7F) << 16)
        | ((u32::from(vtx.src_sel_x) & 0x3) << 24);
    if rev < ChipRev::Cayman {
        word0 |= (u32::from(vtx.mega_fetch_count) & 0x3F) << 26;
    }
    let word1 = (vtx.dst_gpr & 0x7F)
        | ((u32::from(vtx.dst_sel[0]) & 0x7) << 9)
        | ((u32::from(vtx.dst_sel[1]) & 0x7) << 12)
        | ((u32::from(vtx.dst_sel[2]) & 0x7) << 15)
        | ((u32::from(vtx.dst_sel[3]) & 0x7) << 18)
        | (bit(vtx.use_const_fields) << 21)
        | ((vtx.data_format & 0x3F) << 22)
        | ((u32::from(vtx.num_format_all) & 0x3) << 28)
        | (bit(vtx.format_comp_all) << 30)
        | (bit(vtx.srf_mode_all) << 31);
    let mut word2 = (vtx.offset & 0xFFFF) | ((u32::from(vtx.endian) & 0x3) << 16);
    if rev < ChipRev::Cayman {
        word2 |= 1 << 19; // MEGA_FETCH
    }
    [word0, word1, word2, 0]
}

/// One texture fetch record.
pub(crate) fn tex_words(tex: &TexFetch) -> [u32; 4] {
    let word0 = (tex.inst & 0x1F)
        | ((tex.resource_id & 0xFF) << 8)
        | ((tex.src_gpr & 0x7F) << 16)
        | (bit(tex.src_rel) << 23);
    let word1 = (tex.dst_gpr & 0x7F)
        | (bit(tex.dst_rel) << 7)
        | ((u32::from(tex.dst_sel[0]) & 0x7) << 9)
        | ((u32::from(tex.dst_sel[1]) & 0x7) << 12)
        | ((u32::from(tex.dst_sel[2]) & 0x7) << 15)
        | ((u32::from(tex.dst_sel[3]) & 0x7) << 18)
        | ((u32::from(tex.lod_bias) & 0x7F) << 21)
        | (bit(tex.coord_type[0]) << 28)
        | (bit(tex.coord_type[1]) << 29)
        | (bit(tex.coord_type[2]) << 30)
        | (bit(tex.coord_type[3]) << 31);
    let word2 = (u32::from(tex.offset[0]) & 0x1F)
        | ((u32::from(tex.offset[1]) & 0x1F) << 5)
        | ((u32::from(tex.offset[2]) & 0x1F) << 10)
        | ((tex.sampler_id & 0x1F) << 15)
        | ((u32::from(tex.src_sel[0]) & 0x7) << 20)
        | ((u32::from(tex.src_sel[1]) & 0x7) << 23)
        | ((u32::from(tex.src_sel[2]) & 0x7) << 26)
        | ((u32::from(tex.src_sel[3]) & 0x7) << 29);
    [word0, word1, word2, 0]
}

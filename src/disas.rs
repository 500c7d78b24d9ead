//! Field-level listing of an assembled program.
//!
//! The listing pairs every raw word with the instruction fields it was
//! encoded from, so it shows post-scheduling state: folded constants,
//! PV/PS operands and relocated literal indices.

use crate::family::ChipRev;
use crate::ir::CfKind;
use crate::literal::LiteralPool;
use crate::program::Program;
use std::fmt::Write;

fn word(program: &Program, id: u32) -> u32 {
    program.words().get(id as usize).copied().unwrap_or(0)
}

fn bit(flag: bool) -> u32 {
    u32::from(flag)
}

pub(crate) fn dump(program: &Program) -> String {
    let rev = program.chip_rev();
    let chip = match rev {
        ChipRev::R600 => '6',
        ChipRev::R700 => '7',
        ChipRev::Evergreen => 'E',
        ChipRev::Cayman => 'C',
    };

    let mut out = String::new();
    writeln!(
        out,
        "bytecode {} dw -- {} gprs ---------------------",
        program.ndw(),
        program.ngpr()
    )
    .unwrap();
    writeln!(out, "     {chip}").unwrap();

    for cf in program.blocks() {
        let mut id = cf.id();
        match cf.kind() {
            CfKind::Alu(kind) => {
                let k = cf.kcache_slots();
                writeln!(
                    out,
                    "{:04} {:08X} ALU ADDR:{} KCACHE_MODE0:{:X} KCACHE_BANK0:{:X} KCACHE_BANK1:{:X}",
                    id,
                    word(program, id),
                    cf.addr(),
                    k[0].mode.code(),
                    k[0].bank,
                    k[1].bank
                )
                .unwrap();
                id += 1;
                writeln!(
                    out,
                    "{:04} {:08X} ALU INST:{} KCACHE_MODE1:{:X} KCACHE_ADDR0:{:X} KCACHE_ADDR1:{:X} COUNT:{}",
                    id,
                    word(program, id),
                    kind.code(),
                    k[1].mode.code(),
                    k[0].addr,
                    k[1].addr,
                    cf.ndw() / 2
                )
                .unwrap();
            }
            CfKind::Tex | CfKind::Vtx | CfKind::VtxTc | CfKind::Tc => {
                writeln!(
                    out,
                    "{:04} {:08X} TEX/VTX ADDR:{}",
                    id,
                    word(program, id),
                    cf.addr()
                )
                .unwrap();
                id += 1;
                writeln!(
                    out,
                    "{:04} {:08X} TEX/VTX INST:{} COUNT:{}",
                    id,
                    word(program, id),
                    cf.kind().fetch_code(),
                    cf.ndw() / 4
                )
                .unwrap();
            }
            CfKind::Export(_) => {
                let o = cf.output();
                writeln!(
                    out,
                    "{:04} {:08X} EXPORT GPR:{:X} ELEM_SIZE:{:X} ARRAY_BASE:{:X} TYPE:{:X}",
                    id,
                    word(program, id),
                    o.gpr,
                    o.elem_size,
                    o.array_base,
                    o.ty
                )
                .unwrap();
                id += 1;
                writeln!(
                    out,
                    "{:04} {:08X} EXPORT SWIZ_X:{:X} SWIZ_Y:{:X} SWIZ_Z:{:X} SWIZ_W:{:X} \
                     BARRIER:{:X} INST:{} BURST_COUNT:{} EOP:{:X}",
                    id,
                    word(program, id),
                    o.swizzle[0],
                    o.swizzle[1],
                    o.swizzle[2],
                    o.swizzle[3],
                    bit(o.barrier),
                    o.kind.code(rev),
                    o.burst_count,
                    bit(o.end_of_program)
                )
                .unwrap();
            }
            CfKind::Flow(kind) => {
                writeln!(
                    out,
                    "{:04} {:08X} CF ADDR:{}",
                    id,
                    word(program, id),
                    cf.cf_addr
                )
                .unwrap();
                id += 1;
                writeln!(
                    out,
                    "{:04} {:08X} CF INST:{} COND:{:X} POP_COUNT:{:X}",
                    id,
                    word(program, id),
                    kind.code(),
                    cf.cond,
                    cf.pop_count
                )
                .unwrap();
            }
        }

        let mut id = cf.addr();
        let mut pool = LiteralPool::new();
        for alu in cf.alu_instructions() {
            let _ = pool.collect(alu);

            writeln!(
                out,
                "{:04} {:08X}   SRC0(SEL:{} REL:{} CHAN:{} NEG:{}) SRC1(SEL:{} REL:{} CHAN:{} NEG:{}) LAST:{}",
                id,
                word(program, id),
                alu.src[0].sel,
                bit(alu.src[0].rel),
                alu.src[0].chan,
                bit(alu.src[0].neg),
                alu.src[1].sel,
                bit(alu.src[1].rel),
                alu.src[1].chan,
                bit(alu.src[1].neg),
                bit(alu.last)
            )
            .unwrap();
            id += 1;

            write!(
                out,
                "{:04} {:08X} {} INST:{} DST(SEL:{} CHAN:{} REL:{} CLAMP:{}) BANK_SWIZZLE:{} ",
                id,
                word(program, id),
                if alu.last { '*' } else { ' ' },
                alu.op.code(rev).unwrap_or(0),
                alu.dst.sel,
                alu.dst.chan,
                bit(alu.dst.rel),
                bit(alu.dst.clamp),
                alu.bank_swizzle
            )
            .unwrap();
            if alu.op.is_op3() {
                writeln!(
                    out,
                    "SRC2(SEL:{} REL:{} CHAN:{} NEG:{})",
                    alu.src[2].sel,
                    bit(alu.src[2].rel),
                    alu.src[2].chan,
                    bit(alu.src[2].neg)
                )
                .unwrap();
            } else {
                writeln!(
                    out,
                    "SRC0_ABS:{} SRC1_ABS:{} WRITE_MASK:{} OMOD:{} EXECUTE_MASK:{} UPDATE_PRED:{}",
                    bit(alu.src[0].abs),
                    bit(alu.src[1].abs),
                    bit(alu.dst.write),
                    alu.omod,
                    bit(alu.predicate),
                    bit(alu.predicate)
                )
                .unwrap();
            }
            id += 1;

            if alu.last {
                for _ in 0..pool.len() {
                    let w = word(program, id);
                    writeln!(out, "{:04} {:08X}\t{:.6}", id, w, f32::from_bits(w)).unwrap();
                    id += 1;
                }
                id += (pool.len() & 1) as u32;
                pool = LiteralPool::new();
            }
        }

        for vtx in cf.vtx_fetches() {
            writeln!(
                out,
                "{:04} {:08X}   INST:{} FETCH_TYPE:{} BUFFER_ID:{}",
                id,
                word(program, id),
                vtx.inst,
                vtx.fetch_type,
                vtx.buffer_id
            )
            .unwrap();
            id += 1;
            write!(
                out,
                "{:04} {:08X}   SRC(GPR:{} SEL_X:{}) ",
                id,
                word(program, id),
                vtx.src_gpr,
                vtx.src_sel_x
            )
            .unwrap();
            if rev < ChipRev::Cayman {
                write!(out, "MEGA_FETCH_COUNT:{} ", vtx.mega_fetch_count).unwrap();
            }
            writeln!(
                out,
                "DST(GPR:{} SEL_X:{} SEL_Y:{} SEL_Z:{} SEL_W:{}) USE_CONST_FIELDS:{} \
                 FORMAT(DATA:{} NUM:{} COMP:{} MODE:{})",
                vtx.dst_gpr,
                vtx.dst_sel[0],
                vtx.dst_sel[1],
                vtx.dst_sel[2],
                vtx.dst_sel[3],
                bit(vtx.use_const_fields),
                vtx.data_format,
                vtx.num_format_all,
                bit(vtx.format_comp_all),
                bit(vtx.srf_mode_all)
            )
            .unwrap();
            id += 1;
            writeln!(
                out,
                "{:04} {:08X}   ENDIAN:{} OFFSET:{}",
                id,
                word(program, id),
                vtx.endian,
                vtx.offset
            )
            .unwrap();
            id += 1;
            writeln!(out, "{:04} {:08X}", id, word(program, id)).unwrap();
            id += 1;
        }

        for tex in cf.tex_fetches() {
            writeln!(
                out,
                "{:04} {:08X}   INST:{} RESOURCE_ID:{} SRC(GPR:{} REL:{})",
                id,
                word(program, id),
                tex.inst,
                tex.resource_id,
                tex.src_gpr,
                bit(tex.src_rel)
            )
            .unwrap();
            id += 1;
            writeln!(
                out,
                "{:04} {:08X}   DST(GPR:{} REL:{} SEL_X:{} SEL_Y:{} SEL_Z:{} SEL_W:{}) LOD_BIAS:{} \
                 COORD_TYPE_X:{} COORD_TYPE_Y:{} COORD_TYPE_Z:{} COORD_TYPE_W:{}",
                id,
                word(program, id),
                tex.dst_gpr,
                bit(tex.dst_rel),
                tex.dst_sel[0],
                tex.dst_sel[1],
                tex.dst_sel[2],
                tex.dst_sel[3],
                tex.lod_bias,
                bit(tex.coord_type[0]),
                bit(tex.coord_type[1]),
                bit(tex.coord_type[2]),
                bit(tex.coord_type[3])
            )
            .unwrap();
            id += 1;
            writeln!(
                out,
                "{:04} {:08X}   OFFSET_X:{} OFFSET_Y:{} OFFSET_Z:{} SAMPLER_ID:{} \
                 SRC(SEL_X:{} SEL_Y:{} SEL_Z:{} SEL_W:{})",
                id,
                word(program, id),
                tex.offset[0],
                tex.offset[1],
                tex.offset[2],
                tex.sampler_id,
                tex.src_sel[0],
                tex.src_sel[1],
                tex.src_sel[2],
                tex.src_sel[3]
            )
            .unwrap();
            id += 1;
            writeln!(out, "{:04} {:08X}", id, word(program, id)).unwrap();
            id += 1;
        }
    }

    writeln!(out, "--------------------------------------").unwrap();
    out
}

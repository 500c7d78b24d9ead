//! Standalone vertex-fetch programs.
//!
//! Vertex shaders on these chips do not read vertex buffers themselves: a
//! fetch program runs first and loads every attribute into a GPR. The
//! hardware passes the vertex index in GPR0.x and the instance index in
//! GPR0.w; [`build_fetch_shader`] turns a set of vertex elements into
//! the fetch program and reports the buffer bindings it expects.

use crate::family::ChipFamily;
use crate::ir::{AluInst, FlowKind, VtxFetch, ALU_SRC_LITERAL};
use crate::op::AluOp2;
use crate::program::Program;
use crate::Result;

/// One vertex attribute, with its format already resolved to the
/// hardware enums.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexElement {
    /// Vertex buffer slot the attribute reads from.
    pub buffer_index: u32,
    /// Byte offset of the attribute within the buffer.
    pub src_offset: u32,
    /// 0 steps per vertex, n advances once every n instances.
    pub instance_divisor: u32,
    /// Hardware data format.
    pub data_format: u32,
    /// 0 normalized, 1 integer, 2 scaled.
    pub num_format_all: u8,
    /// Treat components as signed.
    pub format_comp_all: bool,
    /// 0 none, 1 swap within 16-bit units, 2 within 32-bit units.
    pub endian: u8,
    /// Destination write swizzle.
    pub dst_sel: [u8; 4],
}

/// An assembled fetch program and the bindings it expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchShader {
    /// The encoded program. Attribute `i` lands in GPR `i + 1`.
    pub words: Vec<u32>,
    /// GPRs used by the program itself.
    pub ngpr: u32,
    /// Stack entries the program needs.
    pub nstack: u32,
    /// Byte offset to fold into each element's buffer binding.
    pub buffer_offsets: Vec<u32>,
    /// Bindings are per element rather than per vertex buffer.
    pub one_resource_per_element: bool,
}

/// Assembles a fetch program for `elements`.
///
/// An element whose offset exceeds the 16-bit offset field of a fetch
/// record moves the excess into its buffer binding; the shader then
/// expects one binding per element, offset by [`FetchShader::buffer_offsets`].
/// Elements with an instance divisor greater than one get an ALU
/// prologue that divides the instance index by reciprocal
/// multiplication.
pub fn build_fetch_shader(family: ChipFamily, elements: &[VertexElement]) -> Result<FetchShader> {
    let buffer_offsets: Vec<u32> = elements.iter().map(|e| e.src_offset & !0xFFFF).collect();
    let one_resource_per_element = buffer_offsets.iter().any(|&offset| offset != 0);

    let mut program = Program::new(family);

    for (i, element) in elements.iter().enumerate() {
        if element.instance_divisor > 1 {
            let mut alu = AluInst::new(AluOp2::MulhiUint);
            alu.src[0].sel = 0;
            alu.src[0].chan = 3;
            alu.src[1].sel = ALU_SRC_LITERAL;
            alu.src[1].value = ((1u64 << 32) / u64::from(element.instance_divisor) + 1) as u32;
            alu.dst.sel = i as u32 + 1;
            alu.dst.chan = 3;
            alu.dst.write = true;
            alu.last = true;
            program.add_alu(alu)?;
        }
    }

    let start = family.chip_rev().fetch_resource_start();
    for (i, element) in elements.iter().enumerate() {
        let slot = if one_resource_per_element {
            i as u32
        } else {
            element.buffer_index
        };
        program.add_vtx(VtxFetch {
            buffer_id: slot + start,
            fetch_type: u8::from(element.instance_divisor != 0),
            src_gpr: if element.instance_divisor > 1 {
                i as u32 + 1
            } else {
                0
            },
            src_sel_x: if element.instance_divisor != 0 { 3 } else { 0 },
            mega_fetch_count: 0x1F,
            dst_gpr: i as u32 + 1,
            dst_sel: element.dst_sel,
            data_format: element.data_format,
            num_format_all: element.num_format_all,
            format_comp_all: element.format_comp_all,
            srf_mode_all: true,
            offset: element.src_offset,
            endian: element.endian,
            ..VtxFetch::default()
        });
    }

    program.add_cfinst(FlowKind::Return);
    program.build()?;

    log::trace!(
        "fetch shader for {} elements:\n{}",
        elements.len(),
        program.dump()
    );

    Ok(FetchShader {
        words: program.words().to_vec(),
        ngpr: program.ngpr(),
        nstack: program.nstack(),
        buffer_offsets,
        one_resource_per_element,
    })
}

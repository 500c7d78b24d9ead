//! Fetch clauses and the standalone fetch-shader builder.

use super::*;
use r600_asm::{
    build_fetch_shader, AluClauseKind, ExportKind, Output, TexFetch, VertexElement,
    TEX_INST_SAMPLE,
};

#[test]
fn tex_clause_word_stream() {
    let mut program = program(ChipFamily::R600);
    program.add_tex(TexFetch {
        inst: TEX_INST_SAMPLE,
        resource_id: 2,
        sampler_id: 1,
        src_sel: [0, 1, 2, 3],
        dst_gpr: 1,
        dst_sel: [0, 1, 2, 3],
        ..TexFetch::default()
    });
    program.build().unwrap();

    let words = program.words();
    assert_eq!(words.len(), 8);
    assert_eq!(words[0], 4 >> 1);
    assert_eq!((words[1] >> 23) & 0x7F, 0x01);
    assert_eq!((words[1] >> 10) & 0x7, 0);

    // Record: opcode and resource in word 0, sampler and read swizzle in
    // word 2, reserved tail zeroed.
    assert_eq!(words[4], 0x210);
    assert_eq!(words[6], 0x6880_8000);
    assert_eq!(words[7], 0);

    // Texture fetches count their registers, unlike vertex fetches.
    assert_eq!(program.ngpr(), 2);
}

#[test]
fn long_element_lists_split_fetch_clauses() {
    let elements: Vec<VertexElement> = (0..17)
        .map(|i| VertexElement {
            buffer_index: i,
            src_offset: 16 * i,
            dst_sel: [0, 1, 2, 3],
            ..VertexElement::default()
        })
        .collect();
    let shader = build_fetch_shader(ChipFamily::Rv770, &elements).unwrap();

    // Sixteen records fill the first clause and the seventeenth opens a
    // second, pushing the first body out past three header pairs.
    assert_eq!(shader.words.len(), 76);
    assert_eq!(shader.words[0], 8 >> 1);
    assert_eq!(shader.buffer_offsets.len(), 17);
    assert!(!shader.one_resource_per_element);
}

#[test]
fn textured_pixel_shader_assembles() {
    let mut program = program(ChipFamily::Redwood);
    program.add_alu(sealed(mov(0, 0, gpr(0, 0)))).unwrap();
    program.add_tex(TexFetch {
        inst: TEX_INST_SAMPLE,
        src_sel: [0, 1, 2, 3],
        dst_gpr: 1,
        dst_sel: [0, 1, 2, 3],
        ..TexFetch::default()
    });
    program.add_output(Output {
        kind: ExportKind::ExportDone,
        gpr: 1,
        end_of_program: true,
        ..Output::default()
    });
    program.build().unwrap();

    assert_block_kinds(
        &program,
        &[
            CfKind::Alu(AluClauseKind::Alu),
            CfKind::Tex,
            CfKind::Export(ExportKind::ExportDone),
        ],
    );
    let words = program.words();
    assert_eq!((words[5] >> 21) & 1, 1);
    assert!(program.dump().contains("EXPORT"));
}

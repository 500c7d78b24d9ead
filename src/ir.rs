//! Instruction and control-flow stream data model.
//!
//! A shader is a list of control-flow blocks ([`CfBlock`]), each owning the
//! ALU instructions or fetch records that make up its body. Source operands
//! are identified by a `sel` index: GPRs occupy 0..=127, inline hardware
//! constants 248..=255 and constant-buffer reads 512.. until kcache
//! translation folds them into the 128..=191 window.

use crate::family::ChipRev;
use crate::group::GroupWindow;
use crate::op::AluOp;
use cranelift_entity::entity_impl;

/// Inline constant 0.0.
pub const ALU_SRC_0: u32 = 248;
/// Inline constant 1.0.
pub const ALU_SRC_1: u32 = 249;
/// Inline integer constant 1.
pub const ALU_SRC_1_INT: u32 = 250;
/// Inline integer constant -1.
pub const ALU_SRC_M_1_INT: u32 = 251;
/// Inline constant 0.5.
pub const ALU_SRC_0_5: u32 = 252;
/// Operand taken from the literal pool trailing the instruction group.
pub const ALU_SRC_LITERAL: u32 = 253;
/// Previous vector result forwarded within the clause.
pub const ALU_SRC_PV: u32 = 254;
/// Previous scalar result forwarded within the clause.
pub const ALU_SRC_PS: u32 = 255;

/// Execute regardless of the condition state.
pub const CF_COND_ACTIVE: u32 = 0;
/// Never execute.
pub const CF_COND_FALSE: u32 = 1;
/// Execute when the selected boolean constant is set.
pub const CF_COND_BOOL: u32 = 2;
/// Execute when the selected boolean constant is clear.
pub const CF_COND_NOT_BOOL: u32 = 3;

/// Export target: color buffer.
pub const EXPORT_TYPE_PIXEL: u32 = 0;
/// Export target: position.
pub const EXPORT_TYPE_POS: u32 = 1;
/// Export target: parameter cache.
pub const EXPORT_TYPE_PARAM: u32 = 2;

/// Texture fetch: set horizontal gradients for a following sample.
pub const TEX_INST_SET_GRADIENTS_H: u32 = 0x0B;
/// Texture fetch: sample.
pub const TEX_INST_SAMPLE: u32 = 0x10;
/// Texture fetch: sample with depth compare.
pub const TEX_INST_SAMPLE_C: u32 = 0x18;

pub(crate) fn is_gpr(sel: u32) -> bool {
    sel <= 127
}

// Constant-buffer reads start at 512 and get translated to a kcache index
// when ALU clauses are constructed. Kcache operands compete for the same
// read ports as cfile constants.
pub(crate) fn is_cfile(sel: u32) -> bool {
    (sel > 255 && sel < 512)
        || (sel > 511 && sel < 4607) // kcache before translation
        || (sel > 127 && sel < 192) // kcache after translation
}

pub(crate) fn is_const(sel: u32) -> bool {
    is_cfile(sel) || (ALU_SRC_0..=ALU_SRC_LITERAL).contains(&sel)
}

/// Maps a literal bit pattern onto an inline hardware constant where one
/// exists. Returns the replacement `sel` and whether the operand's negate
/// flag must be toggled to compensate.
pub(crate) fn special_constant(value: u32) -> (u32, bool) {
    match value {
        0 => (ALU_SRC_0, false),
        1 => (ALU_SRC_1_INT, false),
        0xFFFFFFFF => (ALU_SRC_M_1_INT, false),
        0x3F800000 => (ALU_SRC_1, false),   // 1.0f
        0x3F000000 => (ALU_SRC_0_5, false), // 0.5f
        0xBF800000 => (ALU_SRC_1, true),    // -1.0f
        0xBF000000 => (ALU_SRC_0_5, true),  // -0.5f
        _ => (ALU_SRC_LITERAL, false),
    }
}

/// An ALU source operand.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AluSrc {
    /// Register, constant or forwarding selector.
    pub sel: u32,
    /// Component channel (x, y, z, w as 0..=3). Rewritten to the literal
    /// pool index when `sel` is [`ALU_SRC_LITERAL`].
    pub chan: u8,
    /// Negate the operand.
    pub neg: bool,
    /// Take the absolute value. Two-operand forms only.
    pub abs: bool,
    /// Index the register file through the address register.
    pub rel: bool,
    /// Literal bit pattern when `sel` is [`ALU_SRC_LITERAL`].
    pub value: u32,
}

/// An ALU destination operand.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AluDst {
    /// Destination GPR.
    pub sel: u32,
    /// Component channel written; also the issue slot requested for
    /// any-unit ops.
    pub chan: u8,
    /// Index the register file through the address register.
    pub rel: bool,
    /// Clamp the result to [0, 1].
    pub clamp: bool,
    /// Commit the result to the register file.
    pub write: bool,
}

/// One ALU instruction, occupying one issue slot of a group.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AluInst {
    /// Opcode.
    pub op: AluOp,
    /// Source operands; only the first `op.num_srcs()` are meaningful.
    pub src: [AluSrc; 3],
    /// Destination operand.
    pub dst: AluDst,
    /// Closes the instruction group.
    pub last: bool,
    /// Drives the update-execute-mask and update-predicate encoding bits.
    pub predicate: bool,
    /// Output modifier. Two-operand forms only.
    pub omod: u8,
    /// Bank swizzle chosen by the read-port solver.
    pub bank_swizzle: u8,
    /// Pins the bank swizzle instead of letting the solver choose.
    pub bank_swizzle_force: Option<u8>,
}

impl AluInst {
    /// Creates an instruction with all operands zeroed.
    pub fn new(op: impl Into<AluOp>) -> Self {
        AluInst {
            op: op.into(),
            src: [AluSrc::default(); 3],
            dst: AluDst::default(),
            last: false,
            predicate: false,
            omod: 0,
            bank_swizzle: 0,
            bank_swizzle_force: None,
        }
    }
}

/// A vertex-buffer fetch record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VtxFetch {
    /// Fetch opcode. Carried for listings; the hardware infers it from the
    /// clause.
    pub inst: u32,
    /// 0 to fetch by vertex index, 1 by instance index.
    pub fetch_type: u8,
    /// Fetch resource this record reads.
    pub buffer_id: u32,
    /// GPR holding the index.
    pub src_gpr: u32,
    /// Component of `src_gpr` holding the index.
    pub src_sel_x: u8,
    /// Dwords fetched together, minus one. Not encoded on Cayman.
    pub mega_fetch_count: u8,
    /// GPR receiving the fetched element.
    pub dst_gpr: u32,
    /// Destination write swizzle.
    pub dst_sel: [u8; 4],
    /// Take format fields from the resource constant instead of this record.
    pub use_const_fields: bool,
    /// Hardware data format.
    pub data_format: u32,
    /// 0 normalized, 1 integer, 2 scaled.
    pub num_format_all: u8,
    /// Treat components as signed.
    pub format_comp_all: bool,
    /// Keep integer formats unconverted.
    pub srf_mode_all: bool,
    /// Byte offset into the fetched element.
    pub offset: u32,
    /// 0 none, 1 swap within 16-bit units, 2 within 32-bit units.
    pub endian: u8,
}

/// A texture fetch record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TexFetch {
    /// Fetch opcode, e.g. [`TEX_INST_SAMPLE`].
    pub inst: u32,
    /// Texture resource this record reads.
    pub resource_id: u32,
    /// GPR holding the coordinates.
    pub src_gpr: u32,
    /// Index `src_gpr` through the address register.
    pub src_rel: bool,
    /// Coordinate read swizzle.
    pub src_sel: [u8; 4],
    /// GPR receiving the texel.
    pub dst_gpr: u32,
    /// Index `dst_gpr` through the address register.
    pub dst_rel: bool,
    /// Destination write swizzle.
    pub dst_sel: [u8; 4],
    /// LOD bias, 4.3 signed fixed point.
    pub lod_bias: u8,
    /// Per-component normalized/unnormalized coordinate flags.
    pub coord_type: [bool; 4],
    /// Texel offsets, 4.1 signed fixed point.
    pub offset: [u8; 3],
    /// Sampler state this record samples with.
    pub sampler_id: u32,
}

/// Export flavor; `ExportDone` closes the export stream of its type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExportKind {
    /// More exports of this type follow.
    Export,
    /// Final export of this type.
    ExportDone,
}

impl ExportKind {
    pub(crate) fn code(self, rev: ChipRev) -> u32 {
        match (self, rev >= ChipRev::Evergreen) {
            (ExportKind::Export, false) => 0x27,
            (ExportKind::ExportDone, false) => 0x28,
            (ExportKind::Export, true) => 0x53,
            (ExportKind::ExportDone, true) => 0x54,
        }
    }
}

/// An export descriptor: which GPRs to send where.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Output {
    /// Export flavor.
    pub kind: ExportKind,
    /// Export target, one of the `EXPORT_TYPE_*` values.
    pub ty: u32,
    /// First GPR exported.
    pub gpr: u32,
    /// Dwords per element, minus one. Scratch and ring exports only.
    pub elem_size: u32,
    /// Target slot (color buffer index, position slot, parameter slot).
    pub array_base: u32,
    /// Component selection for the exported value.
    pub swizzle: [u8; 4],
    /// Consecutive exports performed by this descriptor.
    pub burst_count: u32,
    /// Wait for previous instructions before exporting.
    pub barrier: bool,
    /// Ends the shader after this export.
    pub end_of_program: bool,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            kind: ExportKind::Export,
            ty: EXPORT_TYPE_PIXEL,
            gpr: 0,
            elem_size: 0,
            array_base: 0,
            swizzle: [0, 1, 2, 3],
            burst_count: 1,
            barrier: true,
            end_of_program: false,
        }
    }
}

/// ALU clause flavor, i.e. its interaction with the predicate stack.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AluClauseKind {
    /// Plain clause.
    Alu,
    /// Push the active mask before executing.
    AluPushBefore,
    /// Pop the stack once after executing.
    AluPopAfter,
    /// Pop the stack twice after executing.
    AluPop2After,
}

impl AluClauseKind {
    pub(crate) fn code(self) -> u32 {
        match self {
            AluClauseKind::Alu => 0x08,
            AluClauseKind::AluPushBefore => 0x09,
            AluClauseKind::AluPopAfter => 0x0A,
            AluClauseKind::AluPop2After => 0x0B,
        }
    }
}

/// Control-flow instructions without a clause body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[expect(missing_docs, reason = "self-describing mnemonics")]
pub enum FlowKind {
    LoopEnd,
    LoopStartNoAl,
    LoopContinue,
    LoopBreak,
    Jump,
    Else,
    Pop,
    CallFs,
    Return,
    /// Shader terminator. Cayman only; earlier revisions end the shader
    /// with the end-of-program bit instead.
    End,
}

impl FlowKind {
    pub(crate) fn code(self) -> u32 {
        match self {
            FlowKind::LoopEnd => 0x05,
            FlowKind::LoopStartNoAl => 0x07,
            FlowKind::LoopContinue => 0x08,
            FlowKind::LoopBreak => 0x09,
            FlowKind::Jump => 0x0A,
            FlowKind::Else => 0x0D,
            FlowKind::Pop => 0x0E,
            FlowKind::CallFs => 0x13,
            FlowKind::Return => 0x14,
            FlowKind::End => 0x20,
        }
    }
}

/// What a control-flow block is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CfKind {
    /// ALU clause.
    Alu(AluClauseKind),
    /// Texture fetch clause. Holds vertex fetches too on Cayman.
    Tex,
    /// Vertex fetch clause.
    Vtx,
    /// Vertex fetch clause on the texture cache path.
    VtxTc,
    /// Unified fetch clause. Cayman only.
    Tc,
    /// Export, tagged with the flavor the block was created with.
    Export(ExportKind),
    /// Clauseless control flow.
    Flow(FlowKind),
}

impl CfKind {
    /// Whether the block body holds fetch records.
    pub(crate) fn is_fetch(self) -> bool {
        matches!(self, CfKind::Tex | CfKind::Vtx | CfKind::VtxTc | CfKind::Tc)
    }

    /// CF opcode of a fetch clause. Cayman's unified clause shares the
    /// texture opcode.
    pub(crate) fn fetch_code(self) -> u32 {
        match self {
            CfKind::Tex | CfKind::Tc => 0x01,
            CfKind::Vtx => 0x02,
            CfKind::VtxTc => 0x03,
            CfKind::Alu(_) | CfKind::Export(_) | CfKind::Flow(_) => 0,
        }
    }
}

/// Constant-cache lock state for one of a clause's two kcache sets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KCacheSlot {
    /// Constant buffer the lock reads from.
    pub bank: u32,
    /// Lock mode.
    pub mode: KCacheMode,
    /// First locked line, in units of 16 constants.
    pub addr: u32,
}

/// Kcache lock modes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum KCacheMode {
    /// Slot unused.
    #[default]
    Nop,
    /// Lock one line.
    Lock1,
    /// Lock two consecutive lines.
    Lock2,
    /// Lock relative to the loop index.
    LockLoopIndex,
}

impl KCacheMode {
    pub(crate) fn code(self) -> u32 {
        match self {
            KCacheMode::Nop => 0,
            KCacheMode::Lock1 => 1,
            KCacheMode::Lock2 => 2,
            KCacheMode::LockLoopIndex => 3,
        }
    }
}

/// An opaque reference to a control-flow block within a [`Program`].
///
/// [`Program`]: crate::Program
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CfId(u32);
entity_impl!(CfId, "cf");

/// One control-flow block and the clause body it owns.
#[derive(Clone, Debug)]
pub struct CfBlock {
    pub(crate) kind: CfKind,
    /// Dword position of the block's two CF words in the final stream.
    pub(crate) id: u32,
    /// Dword position of the clause body, assigned by the first build pass.
    pub(crate) addr: u32,
    /// Clause body size in dwords.
    pub(crate) ndw: u32,
    pub(crate) alu: Vec<AluInst>,
    pub(crate) vtx: Vec<VtxFetch>,
    pub(crate) tex: Vec<TexFetch>,
    pub(crate) kcache: [KCacheSlot; 2],
    pub(crate) output: Output,
    /// Group heads considered for merging and forwarding.
    pub(crate) window: GroupWindow,
    /// Branch target in dwords, for flow blocks.
    pub cf_addr: u32,
    /// Execution condition, one of the `CF_COND_*` values.
    pub cond: u32,
    /// Stack entries popped before executing.
    pub pop_count: u32,
    /// Clause reads constants the driver fences manually. Encoded on the
    /// first revision only.
    pub uses_waterfall: bool,
}

impl CfBlock {
    pub(crate) fn new(kind: CfKind, id: u32) -> Self {
        CfBlock {
            kind,
            id,
            addr: 0,
            ndw: 0,
            alu: Vec::new(),
            vtx: Vec::new(),
            tex: Vec::new(),
            kcache: [KCacheSlot::default(); 2],
            output: Output::default(),
            window: GroupWindow::default(),
            cf_addr: 0,
            cond: CF_COND_ACTIVE,
            pop_count: 0,
            uses_waterfall: false,
        }
    }

    /// What this block is.
    pub fn kind(&self) -> CfKind {
        self.kind
    }

    /// Dword position of the block's CF words in the final stream.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Dword position of the clause body. Meaningful after building.
    pub fn addr(&self) -> u32 {
        self.addr
    }

    /// Clause body size in dwords.
    pub fn ndw(&self) -> u32 {
        self.ndw
    }

    /// ALU instructions of an ALU clause, in issue order.
    pub fn alu_instructions(&self) -> &[AluInst] {
        &self.alu
    }

    /// Vertex fetches of a fetch clause.
    pub fn vtx_fetches(&self) -> &[VtxFetch] {
        &self.vtx
    }

    /// Texture fetches of a fetch clause.
    pub fn tex_fetches(&self) -> &[TexFetch] {
        &self.tex
    }

    /// Kcache lock state of an ALU clause.
    pub fn kcache_slots(&self) -> &[KCacheSlot; 2] {
        &self.kcache
    }

    /// Export descriptor of an export block.
    pub fn output(&self) -> &Output {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sel_ranges() {
        assert!(is_gpr(0));
        assert!(is_gpr(127));
        assert!(!is_gpr(128));

        assert!(is_cfile(256));
        assert!(is_cfile(511));
        assert!(is_cfile(512)); // untranslated constant buffer
        assert!(is_cfile(4606));
        assert!(!is_cfile(4607));
        assert!(is_cfile(128)); // translated kcache window
        assert!(is_cfile(191));
        assert!(!is_cfile(192));
        assert!(!is_cfile(127));

        assert!(is_const(ALU_SRC_0));
        assert!(is_const(ALU_SRC_LITERAL));
        assert!(!is_const(ALU_SRC_PV));
        assert!(!is_const(ALU_SRC_PS));
        assert!(!is_const(5));
    }

    #[test]
    fn inline_constants() {
        assert_eq!(special_constant(0), (ALU_SRC_0, false));
        assert_eq!(special_constant(1), (ALU_SRC_1_INT, false));
        assert_eq!(special_constant(0xFFFFFFFF), (ALU_SRC_M_1_INT, false));
        assert_eq!(special_constant(1.0f32.to_bits()), (ALU_SRC_1, false));
        assert_eq!(special_constant(0.5f32.to_bits()), (ALU_SRC_0_5, false));
        assert_eq!(special_constant((-1.0f32).to_bits()), (ALU_SRC_1, true));
        assert_eq!(special_constant((-0.5f32).to_bits()), (ALU_SRC_0_5, true));
        assert_eq!(
            special_constant(1.5f32.to_bits()),
            (ALU_SRC_LITERAL, false)
        );
    }

    #[test]
    fn export_codes() {
        assert_eq!(ExportKind::Export.code(ChipRev::R700), 0x27);
        assert_eq!(ExportKind::ExportDone.code(ChipRev::R600), 0x28);
        assert_eq!(ExportKind::Export.code(ChipRev::Evergreen), 0x53);
        assert_eq!(ExportKind::ExportDone.code(ChipRev::Cayman), 0x54);
    }
}

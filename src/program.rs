//! Program construction and the two-pass build.
//!
//! [`Program`] owns the control-flow block list and all clause
//! bookkeeping: ALU adds schedule into the open clause group by group,
//! fetch and export adds reuse or open blocks of their kind, and
//! [`Program::build`] resolves clause addresses and emits the final word
//! stream.

use crate::disas;
use crate::encode;
use crate::family::{ChipFamily, ChipRev};
use crate::group;
use crate::ir::{
    self, AluClauseKind, AluInst, CfBlock, CfId, CfKind, ExportKind, FlowKind, Output, TexFetch,
    VtxFetch, ALU_SRC_LITERAL, TEX_INST_SET_GRADIENTS_H,
};
use crate::kcache;
use crate::literal::LiteralPool;
use crate::swizzle;
use crate::{Error, Result};
use cranelift_entity::PrimaryMap;

/// Pipeline stage a program executes at. Only the call-stack floor
/// depends on it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ShaderStage {
    /// Pixel shader.
    #[default]
    Pixel,
    /// Vertex shader. Always reserves one call-stack entry.
    Vertex,
}

/// A shader program under construction.
///
/// Instructions are scheduled as they are added; [`Program::build`] only
/// places the already-shaped clauses and encodes their words.
pub struct Program {
    family: ChipFamily,
    rev: ChipRev,
    stage: ShaderStage,
    cfs: PrimaryMap<CfId, CfBlock>,
    bytecode: Vec<u32>,
    /// Size of the program in dwords. Tracked incrementally while adding
    /// and recomputed from block addresses by `build`.
    ndw: u32,
    ngpr: u32,
    nstack: u32,
    stack_depth: u32,
    /// The next instruction must open a fresh block, because the open
    /// clause filled up or a fetch hazard was found.
    force_add_cf: bool,
}

impl Program {
    /// Creates an empty program targeting `family`.
    pub fn new(family: ChipFamily) -> Self {
        Program {
            family,
            rev: family.chip_rev(),
            stage: ShaderStage::default(),
            cfs: PrimaryMap::new(),
            bytecode: Vec::new(),
            ndw: 0,
            ngpr: 0,
            nstack: 0,
            stack_depth: 0,
            force_add_cf: false,
        }
    }

    /// The ASIC this program targets.
    pub fn family(&self) -> ChipFamily {
        self.family
    }

    /// The bytecode revision this program encodes for.
    pub fn chip_rev(&self) -> ChipRev {
        self.rev
    }

    /// The pipeline stage, defaulting to [`ShaderStage::Pixel`].
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Sets the pipeline stage. Vertex programs reserve one call-stack
    /// entry even without any nesting.
    pub fn set_stage(&mut self, stage: ShaderStage) {
        self.stage = stage;
    }

    /// Reports a control-flow nesting depth. The deepest report drives
    /// the call-stack size derived by [`Program::build`].
    pub fn set_stack_depth(&mut self, depth: u32) {
        self.stack_depth = self.stack_depth.max(depth);
    }

    /// The built word stream. Empty until [`Program::build`] runs.
    pub fn words(&self) -> &[u32] {
        &self.bytecode
    }

    /// Size of the program in dwords.
    pub fn ndw(&self) -> u32 {
        self.ndw
    }

    /// One past the highest GPR the program touches.
    pub fn ngpr(&self) -> u32 {
        self.ngpr
    }

    /// Call-stack entries the program needs. Derived by
    /// [`Program::build`].
    pub fn nstack(&self) -> u32 {
        self.nstack
    }

    /// The control-flow blocks in program order.
    pub fn blocks(&self) -> impl Iterator<Item = &CfBlock> {
        self.cfs.values()
    }

    /// The block `id` refers to.
    pub fn block(&self, id: CfId) -> &CfBlock {
        &self.cfs[id]
    }

    /// Mutable access to a block, for patching branch targets and pop
    /// counts once they are known.
    pub fn block_mut(&mut self, id: CfId) -> &mut CfBlock {
        &mut self.cfs[id]
    }

    fn add_cf(&mut self, kind: CfKind) -> CfId {
        let id = match self.cfs.last() {
            Some((_, cf)) => cf.id + 2,
            None => 0,
        };
        self.ndw += 2;
        self.force_add_cf = false;
        self.cfs.push(CfBlock::new(kind, id))
    }

    /// Adds an ALU instruction to a plain clause.
    pub fn add_alu(&mut self, inst: AluInst) -> Result<()> {
        self.add_alu_of_kind(inst, AluClauseKind::Alu)
    }

    /// Adds an ALU instruction to a clause of the given kind, scheduling
    /// the group it closes when `inst.last` is set.
    ///
    /// Literal operands matching an inline hardware constant are folded
    /// at this point, and constant-buffer reads are translated onto the
    /// clause's kcache locks.
    pub fn add_alu_of_kind(&mut self, inst: AluInst, kind: AluClauseKind) -> Result<()> {
        let rev = self.rev;
        let mut inst = inst;

        if inst.op.code(rev).is_none() {
            log::error!("{} has no encoding on {:?}", inst.op.name(), rev);
            return Err(Error::OpUnavailable { op: inst.op, rev });
        }

        // An open clause of another kind closes, except that a plain
        // clause without predicate updates may retype to PUSH_BEFORE in
        // place.
        if let Some((_, cf)) = self.cfs.last() {
            if cf.kind != CfKind::Alu(kind) {
                if cf.kind == CfKind::Alu(AluClauseKind::Alu)
                    && kind == AluClauseKind::AluPushBefore
                {
                    if cf.alu.iter().any(|a| a.predicate) {
                        self.force_add_cf = true;
                    }
                } else {
                    self.force_add_cf = true;
                }
            }
        }

        let mut id = match self.cfs.last() {
            Some((id, _)) if !self.force_add_cf => id,
            _ => self.add_cf(CfKind::Alu(kind)),
        };
        self.cfs[id].kind = CfKind::Alu(kind);

        id = self.alloc_kcache_lines(id, &mut inst, kind)?;

        for src in &mut inst.src {
            if ir::is_gpr(src.sel) && src.sel >= self.ngpr {
                self.ngpr = src.sel + 1;
            }
            if src.sel == ALU_SRC_LITERAL {
                let (sel, toggle_neg) = ir::special_constant(src.value);
                src.sel = sel;
                src.neg ^= toggle_neg;
            }
        }
        if inst.dst.sel >= self.ngpr {
            self.ngpr = inst.dst.sel + 1;
        }

        let head;
        {
            let cf = &mut self.cfs[id];
            head = *cf.window.curr.get_or_insert(cf.alu.len());
            cf.alu.push(inst);
            cf.ndw += 2;
        }
        self.ndw += 2;

        if inst.last {
            self.seal_group(id, head)?;
        }
        Ok(())
    }

    /// Locks the constant-cache lines `inst` reads and rewrites its
    /// constant-buffer selectors onto the kcache windows. Starts a fresh
    /// clause of the same kind when the open clause cannot hold the locks.
    fn alloc_kcache_lines(
        &mut self,
        id: CfId,
        inst: &mut AluInst,
        kind: AluClauseKind,
    ) -> Result<CfId> {
        let lines = kcache::collect_lines(inst)?;
        if lines.is_empty() {
            return Ok(id);
        }

        let id = if kcache::fits(&self.cfs[id].kcache, &lines) {
            id
        } else {
            log::trace!("constant reads exceed the clause's free kcache lines, splitting");
            self.add_cf(CfKind::Alu(kind))
        };

        let cf = &mut self.cfs[id];
        kcache::install(&mut cf.kcache, &lines);
        kcache::translate(&cf.kcache, inst);
        Ok(id)
    }

    /// Schedules the group headed at `head`: slot assignment, a merge
    /// attempt with the previous group, PV/PS forwarding and the bank
    /// swizzle solve, then accounts the group's literal pool.
    fn seal_group(&mut self, id: CfId, head: usize) -> Result<()> {
        let rev = self.rev;
        let cf = &mut self.cfs[id];

        let mut slots = group::assign_slots(rev, &cf.alu, head)?;

        if let Some(prev) = cf.window.prev_head() {
            group::merge_groups(rev, cf, &mut slots, prev)?;
        }
        // Merging may have shifted the window back one group.
        if let Some(prev) = cf.window.prev_head() {
            group::forward_pv_ps(rev, &mut cf.alu, &slots, prev)?;
        }

        swizzle::check_and_set_bank_swizzle(rev, &mut cf.alu, &slots)
            .map_err(|_| Error::NoBankSwizzle)?;

        let mut pool = LiteralPool::new();
        for idx in slots.iter().take(rev.max_slots()).flatten() {
            pool.collect(&cf.alu[*idx])?;
        }
        cf.ndw += pool.padded_len() as u32;

        // Close the clause while a worst-case group still fits under the
        // 128-slot hardware limit.
        let full = (cf.ndw >> 1) >= 120;
        cf.window.retire();
        if full {
            self.force_add_cf = true;
        }
        Ok(())
    }

    /// Adds a vertex fetch, reusing the open vertex clause when one is
    /// running. Cayman fetches through the texture cache instead.
    pub fn add_vtx(&mut self, fetch: VtxFetch) {
        let rev = self.rev;
        let id = match self.cfs.last() {
            Some((id, cf)) if !self.force_add_cf && Self::joins_vtx(rev, cf.kind) => id,
            _ => self.add_cf(if rev == ChipRev::Cayman {
                CfKind::Tc
            } else {
                CfKind::Vtx
            }),
        };

        let cf = &mut self.cfs[id];
        cf.vtx.push(fetch);
        cf.ndw += 4;
        let full = cf.ndw / 4 >= rev.fetch_clause_limit();
        self.ndw += 4;
        if full {
            self.force_add_cf = true;
        }
    }

    fn joins_vtx(rev: ChipRev, kind: CfKind) -> bool {
        if rev == ChipRev::Cayman {
            kind == CfKind::Tc
        } else {
            matches!(kind, CfKind::Vtx | CfKind::VtxTc)
        }
    }

    /// Adds a texture fetch, reusing the open texture clause unless a
    /// fetch hazard forces a fresh one.
    pub fn add_tex(&mut self, fetch: TexFetch) {
        let rev = self.rev;
        let join_kind = if rev == ChipRev::Cayman {
            CfKind::Tc
        } else {
            CfKind::Tex
        };

        if let Some((_, cf)) = self.cfs.last() {
            if cf.kind == join_kind {
                // A clause cannot sample through a register it fetches.
                if cf.tex.iter().any(|t| t.dst_gpr == fetch.src_gpr) {
                    self.force_add_cf = true;
                }
                // Gradient pairs must land in one clause together.
                if fetch.inst == TEX_INST_SET_GRADIENTS_H {
                    self.force_add_cf = true;
                }
            }
        }

        let id = match self.cfs.last() {
            Some((id, cf)) if !self.force_add_cf && cf.kind == join_kind => id,
            _ => self.add_cf(join_kind),
        };

        if fetch.src_gpr >= self.ngpr {
            self.ngpr = fetch.src_gpr + 1;
        }
        if fetch.dst_gpr >= self.ngpr {
            self.ngpr = fetch.dst_gpr + 1;
        }

        let cf = &mut self.cfs[id];
        cf.tex.push(fetch);
        cf.ndw += 4;
        let full = cf.ndw / 4 >= rev.fetch_clause_limit();
        self.ndw += 4;
        if full {
            self.force_add_cf = true;
        }
    }

    /// Adds an export, folding it into the previous export block when the
    /// two describe one contiguous burst.
    pub fn add_output(&mut self, output: Output) {
        if let Some((_, cf)) = self.cfs.last_mut() {
            if let CfKind::Export(kind) = cf.kind {
                let prev = &mut cf.output;
                // The block keeps its creation kind; only the emitted
                // descriptor upgrades EXPORT to EXPORT_DONE.
                let compatible = (kind == output.kind
                    || (kind == ExportKind::Export && output.kind == ExportKind::ExportDone))
                    && output.ty == prev.ty
                    && output.elem_size == prev.elem_size
                    && output.swizzle == prev.swizzle
                    && output.burst_count + prev.burst_count <= 16;

                if compatible {
                    if output.gpr + output.burst_count == prev.gpr
                        && output.array_base + output.burst_count == prev.array_base
                    {
                        prev.end_of_program |= output.end_of_program;
                        prev.kind = output.kind;
                        prev.gpr = output.gpr;
                        prev.array_base = output.array_base;
                        prev.burst_count += output.burst_count;
                        return;
                    }
                    if output.gpr == prev.gpr + prev.burst_count
                        && output.array_base == prev.array_base + prev.burst_count
                    {
                        prev.end_of_program |= output.end_of_program;
                        prev.kind = output.kind;
                        prev.burst_count += output.burst_count;
                        return;
                    }
                }
            }
        }

        let id = self.add_cf(CfKind::Export(output.kind));
        self.cfs[id].output = output;
    }

    /// Opens a clauseless control-flow block. Branch targets and pop
    /// counts are patched through [`Program::block_mut`] once known.
    pub fn add_cfinst(&mut self, kind: FlowKind) -> CfId {
        self.add_cf(CfKind::Flow(kind))
    }

    /// Terminates a Cayman program. Earlier revisions end the shader with
    /// the end-of-program bit on their final export instead.
    pub fn add_cf_end(&mut self) -> CfId {
        self.add_cfinst(FlowKind::End)
    }

    /// Resolves clause addresses and encodes the word stream.
    ///
    /// Pass one places each block's body after the CF headers, rounding
    /// fetch bodies up to 16-byte boundaries; pass two encodes headers
    /// and bodies. Literal pools are packed behind each group and the
    /// instructions' literal operands are relocated onto pool indices.
    pub fn build(&mut self) -> Result<()> {
        let rev = self.rev;

        if self.stack_depth > 0 {
            self.nstack = ((self.stack_depth + 3) >> 2) + 2;
        }
        if self.stage == ShaderStage::Vertex && self.nstack == 0 {
            self.nstack = 1;
        }

        let Some((_, last)) = self.cfs.last() else {
            self.bytecode.clear();
            return Ok(());
        };

        let mut addr = last.id + 2;
        for cf in self.cfs.values_mut() {
            if cf.kind.is_fetch() {
                // Fetch bodies are read in 16-byte bursts.
                addr = (addr + 3) & !3;
            }
            cf.addr = addr;
            addr += cf.ndw;
            self.ndw = cf.addr + cf.ndw;
        }

        self.bytecode = vec![0; self.ndw as usize];

        for cf in self.cfs.values_mut() {
            let header = match cf.kind {
                CfKind::Alu(kind) => {
                    encode::cf_alu_words(rev, kind, cf.addr, cf.ndw, &cf.kcache, cf.uses_waterfall)
                }
                CfKind::Tex | CfKind::Vtx | CfKind::VtxTc | CfKind::Tc => {
                    encode::cf_fetch_words(rev, cf.kind.fetch_code(), cf.addr, cf.ndw)
                }
                CfKind::Export(_) => encode::export_words(rev, &cf.output),
                CfKind::Flow(kind) => {
                    encode::cf_flow_words(rev, kind, cf.cf_addr, cf.cond, cf.pop_count)
                }
            };
            let id = cf.id as usize;
            self.bytecode[id] = header[0];
            self.bytecode[id + 1] = header[1];

            let mut addr = cf.addr as usize;
            match cf.kind {
                CfKind::Alu(_) => {
                    let mut pool = LiteralPool::new();
                    for alu in &mut cf.alu {
                        pool.collect(alu)?;
                        pool.relocate(alu);
                        self.bytecode[addr] = encode::alu_word0(alu);
                        self.bytecode[addr + 1] = encode::alu_word1(rev, alu)?;
                        addr += 2;
                        if alu.last {
                            for i in 0..pool.padded_len() {
                                self.bytecode[addr] = pool.word(i);
                                addr += 1;
                            }
                            pool = LiteralPool::new();
                        }
                    }
                }
                CfKind::Tex | CfKind::Vtx | CfKind::VtxTc | CfKind::Tc => {
                    // A unified Cayman clause carries its vertex records
                    // first.
                    for vtx in &cf.vtx {
                        let words = encode::vtx_words(rev, vtx);
                        self.bytecode[addr..addr + 4].copy_from_slice(&words);
                        addr += 4;
                    }
                    for tex in &cf.tex {
                        let words = encode::tex_words(tex);
                        self.bytecode[addr..addr + 4].copy_from_slice(&words);
                        addr += 4;
                    }
                }
                CfKind::Export(_) | CfKind::Flow(_) => {}
            }
        }

        log::debug!(
            "built {} dwords, {} gprs, {} stack entries",
            self.ndw,
            self.ngpr,
            self.nstack
        );
        Ok(())
    }

    /// Drops every block and built word, returning the program to its
    /// just-created state. The target family and stage survive.
    pub fn clear(&mut self) {
        self.cfs.clear();
        self.bytecode.clear();
        self.ndw = 0;
        self.ngpr = 0;
        self.nstack = 0;
        self.stack_depth = 0;
        self.force_add_cf = false;
    }

    /// Renders the program as a field-level listing. Raw word columns
    /// read as zero until [`Program::build`] has run.
    pub fn dump(&self) -> String {
        disas::dump(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AluSrc, EXPORT_TYPE_PARAM};
    use crate::op::AluOp2;

    fn gpr(sel: u32, chan: u8) -> AluSrc {
        AluSrc {
            sel,
            chan,
            ..AluSrc::default()
        }
    }

    fn mov(dst_sel: u32, dst_chan: u8, src: AluSrc) -> AluInst {
        let mut alu = AluInst::new(AluOp2::Mov);
        alu.src[0] = src;
        alu.dst.sel = dst_sel;
        alu.dst.chan = dst_chan;
        alu.dst.write = true;
        alu.last = true;
        alu
    }

    #[test]
    fn special_constants_fold_inline() {
        let mut program = Program::new(ChipFamily::Rv770);
        let mut alu = mov(1, 0, AluSrc {
            sel: ALU_SRC_LITERAL,
            value: 0xBF000000,
            ..AluSrc::default()
        });
        alu.src[0].neg = true;
        program.add_alu(alu).unwrap();

        let stored = program.blocks().next().unwrap().alu_instructions()[0];
        assert_eq!(stored.src[0].sel, ir::ALU_SRC_0_5);
        // -(-0.5) folds back to a plain half.
        assert!(!stored.src[0].neg);
    }

    #[test]
    fn plain_clause_retypes_to_push_before() {
        let mut program = Program::new(ChipFamily::R600);
        program.add_alu(mov(1, 0, gpr(0, 0))).unwrap();
        program
            .add_alu_of_kind(mov(2, 0, gpr(0, 1)), AluClauseKind::AluPushBefore)
            .unwrap();

        assert_eq!(program.blocks().count(), 1);
        let cf = program.blocks().next().unwrap();
        assert_eq!(cf.kind(), CfKind::Alu(AluClauseKind::AluPushBefore));
    }

    #[test]
    fn predicated_clause_stays_and_a_new_one_opens() {
        let mut program = Program::new(ChipFamily::R600);
        let mut pred = mov(1, 0, gpr(0, 0));
        pred.predicate = true;
        program.add_alu(pred).unwrap();
        program
            .add_alu_of_kind(mov(2, 0, gpr(0, 1)), AluClauseKind::AluPushBefore)
            .unwrap();

        let kinds: Vec<_> = program.blocks().map(|cf| cf.kind()).collect();
        assert_eq!(
            kinds,
            [
                CfKind::Alu(AluClauseKind::Alu),
                CfKind::Alu(AluClauseKind::AluPushBefore),
            ]
        );
    }

    #[test]
    fn full_alu_clause_closes() {
        let mut program = Program::new(ChipFamily::R600);
        for i in 0..121 {
            program.add_alu(mov(1, (i % 4) as u8, gpr(0, 0))).unwrap();
        }
        // 120 instruction pairs fill the clause; the next add rolls over.
        assert_eq!(program.blocks().count(), 2);
        assert_eq!(program.blocks().next().unwrap().ndw(), 240);
    }

    #[test]
    fn kcache_split_inherits_clause_kind() {
        let mut program = Program::new(ChipFamily::Rv770);

        let mut a = AluInst::new(AluOp2::Add);
        a.src[0] = gpr(512, 0);
        a.src[1] = gpr(544, 0);
        a.dst.sel = 1;
        a.dst.write = true;
        program
            .add_alu_of_kind(a, AluClauseKind::AluPopAfter)
            .unwrap();

        let mut b = mov(2, 0, gpr(576, 0));
        b.last = false;
        program
            .add_alu_of_kind(b, AluClauseKind::AluPopAfter)
            .unwrap();

        let blocks: Vec<_> = program.blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].kind(), CfKind::Alu(AluClauseKind::AluPopAfter));
        // Lines 0 and 2 stay locked in the first clause, line 4 moves.
        assert_eq!(blocks[0].kcache_slots()[0].addr, 0);
        assert_eq!(blocks[0].kcache_slots()[1].addr, 2);
        assert_eq!(blocks[1].kcache_slots()[0].addr, 4);
    }

    #[test]
    fn vertex_fetches_never_count_gprs() {
        let mut program = Program::new(ChipFamily::Rv770);
        program.add_vtx(VtxFetch {
            dst_gpr: 5,
            ..VtxFetch::default()
        });
        assert_eq!(program.ngpr(), 0);

        program.add_tex(TexFetch {
            src_gpr: 2,
            dst_gpr: 5,
            ..TexFetch::default()
        });
        assert_eq!(program.ngpr(), 6);
    }

    #[test]
    fn fetch_clause_capacity_splits() {
        let mut program = Program::new(ChipFamily::R600);
        for _ in 0..9 {
            program.add_vtx(VtxFetch::default());
        }
        // R600 holds eight fetch records per clause.
        assert_eq!(program.blocks().count(), 2);
    }

    #[test]
    fn tex_fetch_hazard_splits_clause() {
        let mut program = Program::new(ChipFamily::R600);
        program.add_tex(TexFetch {
            src_gpr: 0,
            dst_gpr: 2,
            ..TexFetch::default()
        });
        program.add_tex(TexFetch {
            src_gpr: 2,
            dst_gpr: 3,
            ..TexFetch::default()
        });
        assert_eq!(program.blocks().count(), 2);
    }

    #[test]
    fn gradient_fetch_opens_a_fresh_clause() {
        let mut program = Program::new(ChipFamily::R600);
        program.add_tex(TexFetch {
            src_gpr: 0,
            dst_gpr: 1,
            ..TexFetch::default()
        });
        // The registers do not overlap; the gradient instruction alone
        // forces the split.
        program.add_tex(TexFetch {
            inst: TEX_INST_SET_GRADIENTS_H,
            src_gpr: 2,
            dst_gpr: 3,
            ..TexFetch::default()
        });

        let blocks: Vec<_> = program.blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].tex_fetches()[0].inst, TEX_INST_SET_GRADIENTS_H);
    }

    #[test]
    fn cayman_fetches_share_one_clause() {
        let mut program = Program::new(ChipFamily::Cayman);
        program.add_vtx(VtxFetch::default());
        program.add_tex(TexFetch {
            src_gpr: 1,
            dst_gpr: 2,
            ..TexFetch::default()
        });
        program.add_vtx(VtxFetch::default());

        assert_eq!(program.blocks().count(), 1);
        let cf = program.blocks().next().unwrap();
        assert_eq!(cf.kind(), CfKind::Tc);
        assert_eq!(cf.vtx_fetches().len(), 2);
        assert_eq!(cf.tex_fetches().len(), 1);
    }

    #[test]
    fn export_bursts_merge_in_both_directions() {
        let out = |gpr: u32, base: u32| Output {
            kind: ExportKind::Export,
            ty: EXPORT_TYPE_PARAM,
            gpr,
            array_base: base,
            ..Output::default()
        };

        let mut program = Program::new(ChipFamily::Rv770);
        program.add_output(out(2, 1));
        program.add_output(out(3, 2));
        assert_eq!(program.blocks().count(), 1);
        {
            let o = program.blocks().next().unwrap().output();
            assert_eq!((o.gpr, o.array_base, o.burst_count), (2, 1, 2));
        }

        // Extending downward moves the base.
        program.add_output(out(1, 0));
        assert_eq!(program.blocks().count(), 1);
        let o = program.blocks().next().unwrap().output();
        assert_eq!((o.gpr, o.array_base, o.burst_count), (1, 0, 3));
    }

    #[test]
    fn export_done_upgrade_keeps_block_kind() {
        let mut program = Program::new(ChipFamily::Rv770);
        program.add_output(Output {
            kind: ExportKind::Export,
            ty: EXPORT_TYPE_PARAM,
            gpr: 1,
            array_base: 0,
            ..Output::default()
        });
        program.add_output(Output {
            kind: ExportKind::ExportDone,
            ty: EXPORT_TYPE_PARAM,
            gpr: 2,
            array_base: 1,
            ..Output::default()
        });

        assert_eq!(program.blocks().count(), 1);
        let cf = program.blocks().next().unwrap();
        assert_eq!(cf.kind(), CfKind::Export(ExportKind::Export));
        assert_eq!(cf.output().kind, ExportKind::ExportDone);
        assert_eq!(cf.output().burst_count, 2);
    }

    #[test]
    fn mismatched_exports_stay_separate() {
        let mut program = Program::new(ChipFamily::Rv770);
        program.add_output(Output {
            ty: EXPORT_TYPE_PARAM,
            gpr: 1,
            array_base: 0,
            ..Output::default()
        });
        program.add_output(Output {
            ty: EXPORT_TYPE_PARAM,
            gpr: 2,
            array_base: 1,
            swizzle: [0, 1, 2, 5],
            ..Output::default()
        });
        assert_eq!(program.blocks().count(), 2);
    }

    #[test]
    fn export_bursts_cap_at_sixteen() {
        let mut program = Program::new(ChipFamily::Rv770);
        for i in 0..17u32 {
            program.add_output(Output {
                ty: EXPORT_TYPE_PARAM,
                gpr: i,
                array_base: i,
                ..Output::default()
            });
        }

        // A burst descriptor counts at most sixteen exports; the
        // seventeenth starts its own block.
        let counts: Vec<_> = program
            .blocks()
            .map(|cf| cf.output().burst_count)
            .collect();
        assert_eq!(counts, [16, 1]);
    }

    #[test]
    fn stack_sizing() {
        let mut program = Program::new(ChipFamily::Rv770);
        program.add_cfinst(FlowKind::Return);
        program.build().unwrap();
        assert_eq!(program.nstack(), 0);

        let mut program = Program::new(ChipFamily::Rv770);
        program.set_stage(ShaderStage::Vertex);
        program.add_cfinst(FlowKind::Return);
        program.build().unwrap();
        assert_eq!(program.nstack(), 1);

        let mut program = Program::new(ChipFamily::Rv770);
        program.set_stack_depth(5);
        program.set_stack_depth(2);
        program.add_cfinst(FlowKind::Return);
        program.build().unwrap();
        assert_eq!(program.nstack(), 4);
    }

    #[test]
    fn unavailable_op_is_rejected_up_front() {
        // The interpolation ops only exist on Evergreen and later.
        let mut program = Program::new(ChipFamily::R600);
        let mut alu = AluInst::new(AluOp2::InterpXy);
        alu.src[0] = gpr(0, 0);
        alu.src[1] = gpr(0, 1);
        alu.dst.write = true;
        alu.last = true;
        let err = program.add_alu(alu).unwrap_err();
        assert!(matches!(err, Error::OpUnavailable { .. }));
        assert_eq!(program.blocks().count(), 0);
    }

    #[test]
    fn empty_build_produces_no_words() {
        let mut program = Program::new(ChipFamily::R600);
        program.build().unwrap();
        assert!(program.words().is_empty());
        assert_eq!(program.ndw(), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut program = Program::new(ChipFamily::Rv770);
        program.add_alu(mov(3, 0, gpr(0, 0))).unwrap();
        program.add_cfinst(FlowKind::Return);
        program.build().unwrap();

        program.clear();
        assert_eq!(program.blocks().count(), 0);
        assert!(program.words().is_empty());
        assert_eq!(program.ndw(), 0);
        assert_eq!(program.ngpr(), 0);

        // The program is reusable after a clear.
        program.add_alu(mov(1, 0, gpr(0, 0))).unwrap();
        program.build().unwrap();
        assert_eq!(program.ndw(), 4);
    }
}

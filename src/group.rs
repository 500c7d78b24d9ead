//! Instruction-group construction.
//!
//! A group issues up to four vector-slot instructions and one scalar-slot
//! instruction in lockstep. This module assigns instructions to slots,
//! folds consecutive half-empty groups into one, and rewrites reads of
//! the previous group's results onto the PV/PS forwarding registers.

use crate::family::ChipRev;
use crate::ir::{self, AluInst, CfBlock, ALU_SRC_PS, ALU_SRC_PV};
use crate::literal::LiteralPool;
use crate::swizzle;
use crate::{Error, Result};
use smallvec::SmallVec;

/// Issue-slot assignment for one group: per-slot indices into the owning
/// clause's instruction list (x, y, z, w, then the scalar slot).
pub(crate) type Slots = [Option<usize>; 5];

/// Heads of a clause's open group and of the two sealed groups before
/// it, as indices into the clause's instruction list.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct GroupWindow {
    /// Head of the group being assembled.
    pub curr: Option<usize>,
    /// Heads of the previous two sealed groups, most recent first.
    pub prev: [Option<usize>; 2],
}

impl GroupWindow {
    /// Seals the current group.
    pub fn retire(&mut self) {
        self.prev[1] = self.prev[0];
        self.prev[0] = self.curr;
        self.curr = None;
    }

    /// Records a merge into the previous group: the combined group now
    /// starts at `merged_head` and its predecessor is the group that was
    /// two back.
    pub fn absorb_prev(&mut self, merged_head: usize) {
        self.curr = Some(merged_head);
        self.prev[0] = self.prev[1];
        self.prev[1] = None;
    }

    /// Head of the most recently sealed group.
    pub fn prev_head(&self) -> Option<usize> {
        self.prev[0]
    }
}

/// Assigns each instruction of the group headed at `head` to an issue
/// slot.
///
/// Vector-only ops and any-unit ops take the slot named by their
/// destination channel; an any-unit op whose channel is taken spills to
/// the scalar slot. Double-booking a slot is a caller error.
pub(crate) fn assign_slots(rev: ChipRev, insts: &[AluInst], head: usize) -> Result<Slots> {
    let max_slots = rev.max_slots();
    let mut slots: Slots = [None; 5];

    for (i, alu) in insts.iter().enumerate().skip(head) {
        let chan = usize::from(alu.dst.chan);
        let trans = if max_slots == 4 {
            false
        } else if alu.op.is_trans_only(rev) {
            true
        } else if alu.op.is_vector_only(rev) {
            false
        } else {
            // Any-unit op: prefer the vector slot named by the
            // destination channel.
            slots[chan].is_some()
        };

        if trans {
            if slots[4].is_some() {
                return Err(Error::SlotContention);
            }
            slots[4] = Some(i);
        } else {
            if slots[chan].is_some() {
                return Err(Error::SlotContention);
            }
            slots[chan] = Some(i);
        }

        if alu.last {
            break;
        }
    }
    Ok(slots)
}

/// Tries to fold the just-sealed group (`slots`) into the sealed group
/// before it, headed at `prev_head`.
///
/// On success the clause's instruction list is respliced in slot order,
/// `slots` is rewritten to name the merged group and the clause's group
/// window shifts back by one. Any infeasibility leaves the clause as it
/// was; only slot assignment of the previous group can fail hard.
pub(crate) fn merge_groups(
    rev: ChipRev,
    cf: &mut CfBlock,
    slots: &mut Slots,
    prev_head: usize,
) -> Result<()> {
    let max_slots = rev.max_slots();
    let prev = assign_slots(rev, &cf.alu, prev_head)?;

    let mut result: Slots = [None; 5];
    let mut combined = LiteralPool::new();
    let mut prev_pool = LiteralPool::new();
    let mut num_exec_updates = 0;
    let mut have_mova = false;
    let mut have_rel = false;

    for i in 0..max_slots {
        if let Some(p) = prev[i] {
            // The merged group shares one literal pool.
            if combined.collect(&cf.alu[p]).is_err() {
                return Ok(());
            }
            if prev_pool.collect(&cf.alu[p]).is_err() {
                return Ok(());
            }
            if cf.alu[p].op.is_address_load(rev) {
                if have_rel {
                    return Ok(());
                }
                have_mova = true;
            }
            if cf.alu[p].op.updates_exec_state() {
                num_exec_updates += 1;
            }
        }
        if let Some(s) = slots[i] {
            if combined.collect(&cf.alu[s]).is_err() {
                return Ok(());
            }
        }

        match (prev[i], slots[i]) {
            (Some(p), None) => {
                result[i] = Some(p);
                continue;
            }
            (Some(p), Some(s)) => {
                // Both groups claim the slot; one of the two can move to
                // the scalar slot while it is still free.
                if max_slots == 5
                    && result[4].is_none()
                    && prev[4].is_none()
                    && slots[4].is_none()
                {
                    if cf.alu[s].op.is_any_unit(rev) {
                        result[i] = Some(p);
                        result[4] = Some(s);
                    } else if cf.alu[p].op.is_any_unit(rev) {
                        result[i] = Some(s);
                        result[4] = Some(p);
                    } else {
                        return Ok(());
                    }
                } else {
                    return Ok(());
                }
            }
            (None, None) => continue,
            (None, Some(s)) => result[i] = Some(s),
        }

        let Some(s) = slots[i] else { continue };
        if cf.alu[s].op.updates_exec_state() {
            num_exec_updates += 1;
        }

        if cf.alu[s].dst.rel {
            if have_mova {
                return Ok(());
            }
            have_rel = true;
        }

        // Reads of the incoming group must not race writes of the group
        // it would join.
        let num_srcs = cf.alu[s].op.num_srcs();
        for src_i in 0..num_srcs {
            let src = cf.alu[s].src[src_i];
            if src.rel {
                if have_mova {
                    return Ok(());
                }
                have_rel = true;
            }
            if !ir::is_gpr(src.sel) {
                continue;
            }
            for j in 0..max_slots {
                let Some(pj) = prev[j] else { continue };
                let pdst = cf.alu[pj].dst;
                if !pdst.write {
                    continue;
                }
                // A relative access hides which register it really
                // touches.
                if pdst.chan == src.chan && (pdst.sel == src.sel || pdst.rel || src.rel) {
                    return Ok(());
                }
            }
        }
    }

    // At most one KILL or predicate update per group.
    if num_exec_updates > 1 {
        return Ok(());
    }

    if swizzle::check_and_set_bank_swizzle(rev, &mut cf.alu, &result).is_err() {
        log::trace!("no bank swizzle for the combined group, keeping groups separate");
        return Ok(());
    }

    // Merge accepted. The previous group's literal pool dissolves into
    // the merged group's; take its dwords back off the clause.
    cf.ndw -= prev_pool.padded_len() as u32;

    // Resplice the merged group at the previous head, in slot order.
    let merged: SmallVec<[AluInst; 5]> = result
        .iter()
        .flatten()
        .map(|&idx| cf.alu[idx])
        .collect();
    let mut new_slots: Slots = [None; 5];
    let mut rank = 0;
    for (i, slot) in result.iter().enumerate() {
        if slot.is_some() {
            new_slots[i] = Some(prev_head + rank);
            rank += 1;
        }
    }

    cf.alu.truncate(prev_head);
    let count = merged.len();
    for (rank, mut inst) in merged.into_iter().enumerate() {
        inst.last = rank + 1 == count;
        cf.alu.push(inst);
    }

    *slots = new_slots;
    cf.window.absorb_prev(prev_head);
    log::trace!("folded alu group into its predecessor at {prev_head}");
    Ok(())
}

/// Rewrites GPR reads of the group in `slots` that name results of the
/// sealed group at `prev_head` into PV/PS forwards.
pub(crate) fn forward_pv_ps(
    rev: ChipRev,
    insts: &mut [AluInst],
    slots: &Slots,
    prev_head: usize,
) -> Result<()> {
    let max_slots = rev.max_slots();
    let prev = assign_slots(rev, insts, prev_head)?;

    let mut gpr: [Option<u32>; 5] = [None; 5];
    let mut chan = [0u8; 5];
    for i in 0..max_slots {
        if let Some(idx) = prev[i] {
            let p = &insts[idx];
            if (p.dst.write || p.op.is_op3()) && !p.dst.rel {
                gpr[i] = Some(p.dst.sel);
                // Reductions broadcast their result on PV.x; CUBE is the
                // one reduction writing four distinct values.
                chan[i] = if !p.op.is_cube() && p.op.is_reduction() {
                    0
                } else {
                    p.dst.chan
                };
            }
        }
    }

    for slot in slots.iter().take(max_slots) {
        let Some(idx) = *slot else { continue };
        let alu = &mut insts[idx];
        for src in &mut alu.src[..alu.op.num_srcs()] {
            if !ir::is_gpr(src.sel) || src.rel {
                continue;
            }

            if rev < ChipRev::Cayman && gpr[4] == Some(src.sel) && chan[4] == src.chan {
                src.sel = ALU_SRC_PS;
                src.chan = 0;
                continue;
            }

            for j in 0..4 {
                // PV is read per issue slot: the source channel names
                // the producing slot, not a component.
                if gpr[j] == Some(src.sel) && usize::from(src.chan) == j {
                    src.sel = ALU_SRC_PV;
                    src.chan = chan[j];
                    break;
                }
            }
        }
    }
    Ok(())
}

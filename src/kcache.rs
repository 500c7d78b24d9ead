//! Constant-cache line management for ALU clauses.
//!
//! Constant-buffer operands (`sel >= 512`) read through the kcache, which
//! a clause locks in its two kcache sets before running. Lines are
//! handled as single blocks of 32 constants; recognizing that a set
//! really locks two consecutive lines of 16 would pack slightly better
//! at the cost of messier bookkeeping.
//!
//! The clause-level flow lives in [`Program::add_alu`]: collect the lines
//! a group needs, start a new clause when they cannot join the locks
//! already held, then rewrite the operands onto the kcache window.
//!
//! [`Program::add_alu`]: crate::Program::add_alu

use crate::ir::{AluInst, KCacheMode, KCacheSlot};
use crate::{Error, Result};
use smallvec::SmallVec;

/// Cache lines required by one instruction, deduplicated.
pub(crate) type LineSet = SmallVec<[u32; 3]>;

/// First translated `sel` of each kcache set. The hardware defines four
/// windows; a clause header only addresses the first two.
const KCACHE_BASE: [u32; 4] = [128, 160, 256, 288];

/// Collects the cache lines the instruction's constant-buffer operands
/// need. An instruction can reference at most two distinct lines.
pub(crate) fn collect_lines(alu: &AluInst) -> Result<LineSet> {
    let mut lines = LineSet::new();
    for src in &alu.src {
        if src.sel < 512 {
            continue;
        }
        let line = ((src.sel - 512) / 32) * 2;
        if !lines.contains(&line) {
            lines.push(line);
        }
    }
    if lines.len() >= 3 {
        return Err(Error::KcacheLineOverflow);
    }
    Ok(lines)
}

/// Whether `lines` can join the locks already held by a clause.
pub(crate) fn fits(kcache: &[KCacheSlot; 2], lines: &LineSet) -> bool {
    let free = kcache
        .iter()
        .filter(|slot| slot.mode == KCacheMode::Nop)
        .count();
    // Lines already locked by earlier groups come for free.
    let required = lines
        .iter()
        .filter(|&&line| {
            !kcache
                .iter()
                .any(|slot| slot.mode == KCacheMode::Lock2 && slot.addr == line)
        })
        .count();
    required <= free
}

/// Locks `lines` into the clause's free kcache sets.
pub(crate) fn install(kcache: &mut [KCacheSlot; 2], lines: &LineSet) {
    for &line in lines {
        let held = kcache
            .iter()
            .any(|slot| slot.mode == KCacheMode::Lock2 && slot.addr == line);
        if held {
            continue;
        }
        for slot in kcache.iter_mut() {
            if slot.mode == KCacheMode::Nop {
                slot.bank = 0;
                slot.addr = line;
                slot.mode = KCacheMode::Lock2;
                break;
            }
        }
    }
}

/// Rewrites constant-buffer operands onto the kcache read window.
pub(crate) fn translate(kcache: &[KCacheSlot; 2], alu: &mut AluInst) {
    for src in &mut alu.src {
        if src.sel < 512 {
            continue;
        }
        src.sel -= 512;
        let line = (src.sel / 32) * 2;
        for (i, slot) in kcache.iter().enumerate() {
            if slot.mode == KCacheMode::Lock2 && slot.addr == line {
                src.sel = (src.sel & 0x1F) + KCACHE_BASE[i];
                break;
            }
        }
    }
}

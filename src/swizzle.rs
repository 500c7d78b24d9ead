//! Bank swizzle selection for ALU instruction groups.
//!
//! The register file feeds a group's vector slots through three read
//! cycles per channel, and the constant file through a handful of shared
//! ports. Each instruction's bank swizzle decides which cycle each of its
//! operands loads on. [`check_and_set_bank_swizzle`] searches swizzle
//! combinations until every read in the group lands on a free port.

use crate::family::ChipRev;
use crate::ir::{self, AluInst, ALU_SRC_PS, ALU_SRC_PV};

/// Vector-slot bank swizzle: sources load on cycles 0, 1, 2.
pub const ALU_VEC_012: u8 = 0;
/// Vector-slot bank swizzle: sources load on cycles 0, 2, 1.
pub const ALU_VEC_021: u8 = 1;
/// Vector-slot bank swizzle: sources load on cycles 1, 2, 0.
pub const ALU_VEC_120: u8 = 2;
/// Vector-slot bank swizzle: sources load on cycles 1, 0, 2.
pub const ALU_VEC_102: u8 = 3;
/// Vector-slot bank swizzle: sources load on cycles 2, 0, 1.
pub const ALU_VEC_201: u8 = 4;
/// Vector-slot bank swizzle: sources load on cycles 2, 1, 0.
pub const ALU_VEC_210: u8 = 5;

// Scalar-slot swizzles live in their own, shorter encoding space.

/// Scalar-slot bank swizzle: sources load on cycles 2, 1, 0.
pub const ALU_SCL_210: u8 = 0;
/// Scalar-slot bank swizzle: sources load on cycles 1, 2, 2.
pub const ALU_SCL_122: u8 = 1;
/// Scalar-slot bank swizzle: sources load on cycles 2, 1, 2.
pub const ALU_SCL_212: u8 = 2;
/// Scalar-slot bank swizzle: sources load on cycles 2, 2, 1.
pub const ALU_SCL_221: u8 = 3;

/// Read cycle per source operand for each vector bank swizzle.
const CYCLE_VEC: [[u8; 3]; 6] = [
    [0, 1, 2], // VEC_012
    [0, 2, 1], // VEC_021
    [1, 2, 0], // VEC_120
    [1, 0, 2], // VEC_102
    [2, 0, 1], // VEC_201
    [2, 1, 0], // VEC_210
];

/// Read cycle per source operand for each scalar bank swizzle.
const CYCLE_SCL: [[u8; 3]; 4] = [
    [2, 1, 0], // SCL_210
    [1, 2, 2], // SCL_122
    [2, 1, 2], // SCL_212
    [2, 2, 1], // SCL_221
];

/// The group's operand reads cannot be scheduled onto the register ports.
#[derive(Debug)]
pub(crate) struct Infeasible;

/// Port bookings for one candidate swizzle combination.
struct ReadPorts {
    /// GPR read ports, `[cycle][channel]`, holding the register read.
    gpr: [[Option<u32>; 4]; 3],
    /// Constant-file read ports, holding `(sel, chan)` pairs.
    cfile: [Option<(u32, u8)>; 4],
}

impl ReadPorts {
    fn new() -> Self {
        ReadPorts {
            gpr: [[None; 4]; 3],
            cfile: [None; 4],
        }
    }

    fn reserve_gpr(&mut self, sel: u32, chan: u8, cycle: u8) -> Result<(), Infeasible> {
        let port = &mut self.gpr[usize::from(cycle)][usize::from(chan)];
        match *port {
            None => {
                *port = Some(sel);
                Ok(())
            }
            Some(have) if have == sel => Ok(()),
            // Another operation already loads a different register on
            // this channel's cycle.
            Some(_) => Err(Infeasible),
        }
    }

    fn reserve_cfile(&mut self, rev: ChipRev, sel: u32, chan: u8) -> Result<(), Infeasible> {
        // R700 onwards has two full-width constant ports; R600 has four
        // half-width ones addressed per channel pair.
        let (num_ports, chan) = if rev >= ChipRev::R700 {
            (2, chan / 2)
        } else {
            (4, chan)
        };
        for port in &mut self.cfile[..num_ports] {
            match *port {
                None => {
                    *port = Some((sel, chan));
                    return Ok(());
                }
                // This scalar element is already being read.
                Some(have) if have == (sel, chan) => return Ok(()),
                Some(_) => {}
            }
        }
        Err(Infeasible)
    }
}

/// Books the reads of one vector-slot instruction under `swizzle`.
fn check_vector(
    rev: ChipRev,
    alu: &AluInst,
    ports: &mut ReadPorts,
    swizzle: u8,
) -> Result<(), Infeasible> {
    for (i, src) in alu.src[..alu.op.num_srcs()].iter().enumerate() {
        if ir::is_gpr(src.sel) {
            let cycle = CYCLE_VEC[usize::from(swizzle)][i];
            if i == 1 && src.sel == alu.src[0].sel && src.chan == alu.src[0].chan {
                // The second source rides the first source's reservation.
                continue;
            }
            ports.reserve_gpr(src.sel, src.chan, cycle)?;
        } else if ir::is_cfile(src.sel) {
            ports.reserve_cfile(rev, src.sel, src.chan)?;
        }
        // PV, PS, literals and inline constants load freely.
    }
    Ok(())
}

/// Books the reads of the scalar-slot instruction under `swizzle`.
fn check_scalar(
    rev: ChipRev,
    alu: &AluInst,
    ports: &mut ReadPorts,
    swizzle: u8,
) -> Result<(), Infeasible> {
    let num_srcs = alu.op.num_srcs();

    let mut const_count: u8 = 0;
    for src in &alu.src[..num_srcs] {
        if ir::is_const(src.sel) {
            // The scalar unit can load at most two constants, of any
            // kind.
            if const_count >= 2 {
                return Err(Infeasible);
            }
            const_count += 1;
        }
        if ir::is_cfile(src.sel) {
            ports.reserve_cfile(rev, src.sel, src.chan)?;
        }
    }

    for (i, src) in alu.src[..num_srcs].iter().enumerate() {
        if ir::is_gpr(src.sel) {
            let cycle = CYCLE_SCL[usize::from(swizzle)][i];
            // The leading cycles are taken by the constant loads.
            if cycle < const_count {
                return Err(Infeasible);
            }
            ports.reserve_gpr(src.sel, src.chan, cycle)?;
        }
        if const_count > 0 && (src.sel == ALU_SRC_PV || src.sel == ALU_SRC_PS) {
            let cycle = CYCLE_SCL[usize::from(swizzle)][i];
            if cycle < const_count {
                return Err(Infeasible);
            }
        }
    }
    Ok(())
}

/// Steps `digits` to the next candidate combination. Returns false once
/// the combinations are exhausted.
fn advance(digits: &mut [u8; 5], locked: &[bool; 5], scalar_only: bool, max_slots: usize) -> bool {
    if scalar_only {
        digits[4] += 1;
        return digits[4] <= ALU_SCL_221;
    }
    for i in 0..max_slots {
        if locked[i] {
            continue;
        }
        digits[i] += 1;
        if digits[i] <= ALU_VEC_210 {
            // The scalar digit overflows earlier than the shared bound;
            // treat stepping past its last encoding as exhaustion.
            return i != 4 || digits[4] <= ALU_SCL_221;
        }
        digits[i] = ALU_VEC_012;
    }
    false
}

/// Finds bank swizzles under which the whole group's reads fit the ports
/// and writes them into the slotted instructions.
///
/// Instructions with a pinned swizzle keep it; when every populated slot
/// is pinned the combination is accepted unchecked.
pub(crate) fn check_and_set_bank_swizzle(
    rev: ChipRev,
    insts: &mut [AluInst],
    slots: &[Option<usize>; 5],
) -> Result<(), Infeasible> {
    let max_slots = rev.max_slots();
    let mut forced = true;
    let mut scalar_only = rev != ChipRev::Cayman;

    for (i, slot) in slots.iter().enumerate().take(max_slots) {
        if let Some(idx) = *slot {
            if let Some(force) = insts[idx].bank_swizzle_force {
                insts[idx].bank_swizzle = force;
            } else {
                forced = false;
            }
            if i < 4 {
                scalar_only = false;
            }
        }
    }
    if forced {
        return Ok(());
    }

    // Try every combination of bank swizzles. Not very efficient, but
    // the first candidate works in most cases.
    let mut digits = [0u8; 5];
    let mut locked = [false; 5];
    for i in 0..4 {
        digits[i] = match slots[i] {
            Some(idx) if insts[idx].bank_swizzle_force.is_some() => insts[idx].bank_swizzle,
            _ => ALU_VEC_012,
        };
    }
    digits[4] = ALU_SCL_210;
    for i in 0..5 {
        locked[i] = slots[i].is_some_and(|idx| insts[idx].bank_swizzle_force.is_some());
    }

    loop {
        // Cayman has no scalar unit and its four slots cannot all load
        // on the last cycle.
        if max_slots == 4 && digits[..4].iter().any(|&d| d == ALU_VEC_210) {
            return Err(Infeasible);
        }

        let mut ports = ReadPorts::new();
        let mut ok = true;
        if !scalar_only {
            for i in 0..4 {
                if let Some(idx) = slots[i] {
                    if check_vector(rev, &insts[idx], &mut ports, digits[i]).is_err() {
                        ok = false;
                        break;
                    }
                }
            }
        }
        if ok && max_slots == 5 {
            if let Some(idx) = slots[4] {
                ok = check_scalar(rev, &insts[idx], &mut ports, digits[4]).is_ok();
            }
        }

        if ok {
            for i in 0..max_slots {
                if let Some(idx) = slots[i] {
                    insts[idx].bank_swizzle = digits[i];
                }
            }
            return Ok(());
        }

        if !advance(&mut digits, &locked, scalar_only, max_slots) {
            return Err(Infeasible);
        }
    }
}

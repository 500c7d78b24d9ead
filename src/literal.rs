//! The literal pool trailing an instruction group.
//!
//! Operands with `sel` [`ALU_SRC_LITERAL`] draw their bit pattern from up
//! to four dwords emitted after the group's last instruction. Equal bit
//! patterns share a pool entry; the operand's channel field indexes the
//! pool once the group layout is final.

use crate::ir::{AluInst, ALU_SRC_LITERAL};
use crate::{Error, Result};
use smallvec::SmallVec;

#[derive(Clone, Debug, Default)]
pub(crate) struct LiteralPool {
    values: SmallVec<[u32; 4]>,
}

impl LiteralPool {
    pub fn new() -> Self {
        LiteralPool::default()
    }

    /// Folds the instruction's literal operands into the pool.
    ///
    /// Fails with [`Error::TooManyLiterals`] when a fifth distinct value
    /// would be required. Operands scanned before the overflow stay
    /// admitted; callers that must not observe a partial fold work on a
    /// scratch pool and discard it on failure.
    pub fn collect(&mut self, alu: &AluInst) -> Result<()> {
        for src in &alu.src[..alu.op.num_srcs()] {
            if src.sel != ALU_SRC_LITERAL {
                continue;
            }
            if self.values.contains(&src.value) {
                continue;
            }
            if self.values.len() >= 4 {
                return Err(Error::TooManyLiterals);
            }
            self.values.push(src.value);
        }
        Ok(())
    }

    /// Rewrites literal operand channels to their pool index.
    pub fn relocate(&self, alu: &mut AluInst) {
        for src in &mut alu.src[..alu.op.num_srcs()] {
            if src.sel != ALU_SRC_LITERAL {
                continue;
            }
            if let Some(index) = self.values.iter().position(|v| *v == src.value) {
                src.chan = index as u8;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Pool size in dwords as emitted, padded to a multiple of two.
    pub fn padded_len(&self) -> usize {
        (self.values.len() + 1) & !1
    }

    /// Pool dword at `index`; the pad dword reads as zero.
    pub fn word(&self, index: usize) -> u32 {
        self.values.get(index).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::AluSrc;
    use crate::op::{AluOp2, AluOp3};

    fn lit(value: u32) -> AluSrc {
        AluSrc {
            sel: ALU_SRC_LITERAL,
            value,
            ..AluSrc::default()
        }
    }

    #[test]
    fn dedups_equal_values() {
        let mut add = AluInst::new(AluOp2::Add);
        add.src[0] = lit(0x40000000);
        add.src[1] = lit(0x40000000);

        let mut pool = LiteralPool::new();
        pool.collect(&add).unwrap();
        assert_eq!(pool.len(), 1);

        pool.relocate(&mut add);
        assert_eq!(add.src[0].chan, 0);
        assert_eq!(add.src[1].chan, 0);
    }

    #[test]
    fn fifth_distinct_value_fails() {
        let mut pool = LiteralPool::new();

        let mut a = AluInst::new(AluOp3::Muladd);
        a.src[0] = lit(1);
        a.src[1] = lit(2);
        a.src[2] = lit(3);
        pool.collect(&a).unwrap();

        let mut b = AluInst::new(AluOp2::Add);
        b.src[0] = lit(4);
        b.src[1] = lit(5);
        assert!(matches!(pool.collect(&b), Err(Error::TooManyLiterals)));

        // Operands scanned before the overflow stay admitted.
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.word(3), 4);
    }

    #[test]
    fn unused_srcs_are_ignored() {
        // src[1] of a one-operand op holds stale data the pool must skip.
        let mut mov = AluInst::new(AluOp2::Mov);
        mov.src[0] = lit(7);
        mov.src[1] = lit(0xDEAD);

        let mut pool = LiteralPool::new();
        pool.collect(&mov).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn emitted_words_pad_to_pairs() {
        let mut mov = AluInst::new(AluOp2::Mov);
        mov.src[0] = lit(9);

        let mut pool = LiteralPool::new();
        pool.collect(&mov).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.padded_len(), 2);
        assert_eq!(pool.word(0), 9);
        assert_eq!(pool.word(1), 0);

        assert_eq!(LiteralPool::new().padded_len(), 0);
    }
}

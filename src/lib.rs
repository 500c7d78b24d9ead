//! An assembler for the bytecode of AMD's R600 family of GPUs.
//!
//! The R600 through Cayman parts execute shaders as a list of control-flow
//! blocks whose bodies are clauses of VLIW ALU groups or fetch records.
//! This crate schedules instructions into that shape as they are added:
//! it assigns each ALU instruction an issue slot, folds half-empty groups
//! into their predecessor, rewrites reads of the previous group's results
//! onto the PV/PS forwarding registers, solves the register-file
//! bank-swizzle constraints, locks constant-cache lines per clause and
//! packs literal constants behind each group. [`Program::build`] then
//! resolves clause addresses and emits the final word stream.
//!
//! ```
//! use r600_asm::{AluInst, AluOp2, AluSrc, ChipFamily, FlowKind, Program};
//!
//! # fn main() -> r600_asm::Result<()> {
//! let mut program = Program::new(ChipFamily::Redwood);
//!
//! let mut mov = AluInst::new(AluOp2::Mov);
//! mov.dst.sel = 1;
//! mov.dst.write = true;
//! mov.src[0] = AluSrc {
//!     sel: r600_asm::ALU_SRC_LITERAL,
//!     value: 0x40490FDB,
//!     ..AluSrc::default()
//! };
//! mov.last = true;
//! program.add_alu(mov)?;
//!
//! program.add_cfinst(FlowKind::Return);
//! program.build()?;
//! assert!(!program.words().is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! The assembler produces native-endian words; byte swapping for the GPU
//! upload path is the caller's concern, as is everything in front of the
//! instruction stream (register allocation, format translation, descriptor
//! setup). The one built-in client is [`fetch::build_fetch_shader`], which
//! turns a vertex-element layout into a complete fetch program.

#![deny(missing_docs)]

pub mod family;
pub use family::*;
pub mod fetch;
pub use fetch::*;
pub mod ir;
pub use ir::*;
pub mod op;
pub use op::*;
pub mod program;
pub use program::*;

mod disas;
mod encode;
mod group;
mod kcache;
mod literal;
mod swizzle;

/// Errors reported while assembling a program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The opcode has no encoding on the revision the program targets.
    #[error("{} is not encodable on {:?}", .op.name(), .rev)]
    OpUnavailable {
        /// The rejected opcode.
        op: AluOp,
        /// The targeted revision.
        rev: ChipRev,
    },

    /// Two instructions of one group need the same issue slot and neither
    /// may move to the scalar unit.
    #[error("instruction group requests the same issue slot twice")]
    SlotContention,

    /// No bank-swizzle assignment satisfies the group's register-file
    /// read-port limits.
    #[error("no bank swizzle satisfies the instruction group")]
    NoBankSwizzle,

    /// An instruction group reads more than four distinct literal dwords.
    #[error("instruction group exceeds the four-dword literal pool")]
    TooManyLiterals,

    /// A single instruction reads more constant-cache lines than a clause
    /// can lock at once.
    #[error("constant reads exceed the clause's kcache line capacity")]
    KcacheLineOverflow,
}

/// A convenience alias for `Result` defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

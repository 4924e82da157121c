//! Low-level IR and liveness analysis for the Ori backend.
//!
//! This crate provides:
//!
//! - **Low-level IR** ([`Code`], [`Block`], [`Inst`], [`Operand`]) — the
//!   machine-shaped control-flow graph produced by instruction selection,
//!   with operands tagged by [`Role`] (def, early use, late use) and
//!   register [`Bank`].
//!
//! - **Liveness** ([`Liveness`], [`LocalCalc`]) — backward dataflow over
//!   that graph, computed independently for general-purpose temps,
//!   floating-point temps, and stack slots. The register allocator reads
//!   the per-block tail sets and walks [`LocalCalc`] cursors to build
//!   interference.
//!
//! # Design
//!
//! The fixpoint is written once, generic over a [`LivenessAdapter`] that
//! defines an entity universe and its dense index mapping. Blocks refer to
//! each other by index into the owning [`Code`]; the analysis never
//! mutates the graph.
//!
//! # Cargo features
//!
//! - `serde` — `Serialize`/`Deserialize` for the IR types.
//! - `parallel` — [`CodeLiveness::compute_parallel`] on the rayon pool.

pub mod ir;
pub mod liveness;

#[cfg(test)]
mod test_helpers;

pub use ir::{
    Arg, Bank, Block, BlockId, Code, CodeBuilder, CodeError, Inst, Opcode, Operand, Reg,
    RegisterFile, Role, StackSlotData, StackSlotId, StackSlotKind, Tmp,
};
pub use liveness::{
    CodeLiveness, FpLiveness, GpLiveness, IndexSparseSet, Liveness, LivenessAdapter,
    LivenessStats, LocalCalc, StackSlotLiveness,
};

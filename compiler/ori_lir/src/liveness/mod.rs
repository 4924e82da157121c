//! Backward dataflow liveness on the low-level IR.
//!
//! Computes, for every block, the entities live at its tail (exit), and
//! hands out [`LocalCalc`] cursors that replay per-instruction liveness
//! inside a block on demand. One generic engine serves three independent
//! universes, selected by a [`LivenessAdapter`]:
//!
//! - [`GpLiveness`] — general-purpose registers and temps
//! - [`FpLiveness`] — floating-point registers and temps
//! - [`StackSlotLiveness`] — abstract stack slots
//!
//! # Algorithm
//!
//! 1. **Seed** each block's tail with its terminator's late uses.
//! 2. Mark every block **dirty**.
//! 3. **Sweep** blocks in reverse index order, visiting the dirty ones:
//!    run a [`LocalCalc`] from tail to head, subtract the head entries
//!    already recorded for the block, record the rest, and add them to
//!    every predecessor's tail. A predecessor whose tail grew becomes
//!    dirty again.
//! 4. Stop after a sweep that dirties nothing. Head sets are dropped.
//!
//! Sets only grow, and there are `max_index` entities per block, so at
//! most `max_index * num_blocks` new head entries are ever discovered.
//! The sweep order only affects speed; every order reaches the same
//! fixpoint.
//!
//! # Instruction ordering
//!
//! An operand is a def, an early use, or a late use (see [`Role`]). Late
//! uses are read after the instruction's own defs, so a late-used entity
//! is live both above and across its instruction. [`LocalCalc`] models this
//! by adding instruction `i`'s late uses when stepping above `i + 1`.
//!
//! [`Role`]: crate::ir::Role

use rustc_hash::FxHashSet;

use crate::ir::{Block, BlockId, Code};

mod adapter;
mod local;
mod store;
mod workset;

pub use adapter::{
    BankKind, FpBank, FpTmpAdapter, GpBank, GpTmpAdapter, LivenessAdapter, StackSlotLivenessAdapter,
    TmpLivenessAdapter,
};
pub use local::LocalCalc;
pub use store::BlockLivenessStore;
pub use workset::IndexSparseSet;

/// Liveness of general-purpose temps.
pub type GpLiveness = Liveness<GpTmpAdapter>;
/// Liveness of floating-point temps.
pub type FpLiveness = Liveness<FpTmpAdapter>;
/// Liveness of stack slots.
pub type StackSlotLiveness = Liveness<StackSlotLivenessAdapter>;

/// Counters from one fixpoint run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LivenessStats {
    /// Reverse-order passes over the block list.
    pub sweeps: usize,
    /// Dirty blocks processed, summed over all sweeps.
    pub block_visits: usize,
    /// Head entries discovered for the first time, summed over all blocks.
    /// Bounded by `max_index * num_blocks`.
    pub insertions: usize,
}

/// Converged liveness of one entity universe over one [`Code`].
///
/// Fully computed by [`Liveness::new`]; read-only afterwards.
pub struct Liveness<A: LivenessAdapter> {
    adapter: A,
    live_at_tail: Vec<FxHashSet<usize>>,
    stats: LivenessStats,
}

impl<A: LivenessAdapter> Liveness<A> {
    /// Run the fixpoint over `code`.
    pub fn new(code: &Code) -> Self {
        let adapter = A::new(code);
        let num_blocks = code.len();

        tracing::debug!(
            universe = A::NAME,
            num_blocks,
            max_index = adapter.max_index(),
            "computing liveness"
        );

        let mut store = BlockLivenessStore::new(num_blocks);

        // A terminator's late uses are live at its block's tail.
        for block in code.blocks() {
            A::for_each_thing(block.last(), |thing, role, bank| {
                if role.is_late_use() && adapter.accepts_bank(bank) {
                    store.add_to_tail(block.id(), adapter.value_to_index(thing));
                }
            });
        }

        let mut dirty = vec![true; num_blocks];
        let mut workset = IndexSparseSet::new(adapter.max_index());
        let mut stats = LivenessStats::default();

        loop {
            stats.sweeps += 1;
            let mut changed = false;

            for block in code.blocks().iter().rev() {
                let id = block.id();
                if !std::mem::replace(&mut dirty[id.index()], false) {
                    continue;
                }
                stats.block_visits += 1;

                let mut local = LocalCalc::with_workset(&adapter, block, store.tail(id), workset);
                local.execute_all();
                workset = local.into_workset();

                // Recorded head entries can never leave, so if the counts
                // match nothing is new.
                let head = store.head(id);
                if workset.len() == head.len() {
                    workset.clear();
                } else {
                    workset.remove_all(head.iter().copied());
                }

                tracing::trace!(
                    universe = A::NAME,
                    block = id.raw(),
                    new = workset.len(),
                    "visited block"
                );

                if workset.is_empty() {
                    continue;
                }

                stats.insertions += workset.len();
                store.extend_head(id, workset.as_slice());

                for &pred in block.predecessors() {
                    for index in workset.iter() {
                        if store.add_to_tail(pred, index)
                            && !std::mem::replace(&mut dirty[pred.index()], true)
                        {
                            changed = true;
                        }
                    }
                }
            }

            if !changed {
                break;
            }
        }

        tracing::debug!(
            universe = A::NAME,
            sweeps = stats.sweeps,
            block_visits = stats.block_visits,
            insertions = stats.insertions,
            "liveness converged"
        );

        Liveness {
            adapter,
            live_at_tail: store.into_tails(),
            stats,
        }
    }

    #[inline]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    #[inline]
    pub fn stats(&self) -> LivenessStats {
        self.stats
    }

    /// Entities live at the exit of `block`.
    pub fn live_at_tail(&self, block: BlockId) -> impl Iterator<Item = A::Thing> + '_ {
        self.live_at_tail[block.index()]
            .iter()
            .map(|&index| self.adapter.index_to_value(index))
    }

    /// Entity indices live at the exit of `block`.
    #[inline]
    pub fn live_at_tail_indices(&self, block: BlockId) -> &FxHashSet<usize> {
        &self.live_at_tail[block.index()]
    }

    pub fn is_live_at_tail(&self, block: BlockId, thing: A::Thing) -> bool {
        self.live_at_tail[block.index()].contains(&self.adapter.value_to_index(thing))
    }

    /// A fresh cursor at the tail of `block`, for per-instruction queries.
    ///
    /// `block` must belong to the `Code` this liveness was computed over.
    pub fn local_calc<'a>(&'a self, block: &'a Block) -> LocalCalc<'a, A> {
        LocalCalc::with_workset(
            &self.adapter,
            block,
            &self.live_at_tail[block.id().index()],
            IndexSparseSet::new(self.adapter.max_index()),
        )
    }

    /// Entities live at the entry of `block`, recomputed from its tail.
    pub fn live_at_head(&self, block: &Block) -> Vec<A::Thing> {
        let mut local = self.local_calc(block);
        local.execute_all();
        local.live().collect()
    }
}

/// Liveness of all three universes over one [`Code`].
pub struct CodeLiveness {
    pub gp: GpLiveness,
    pub fp: FpLiveness,
    pub stack: StackSlotLiveness,
}

impl CodeLiveness {
    /// Run the three analyses one after another.
    pub fn compute(code: &Code) -> Self {
        CodeLiveness {
            gp: GpLiveness::new(code),
            fp: FpLiveness::new(code),
            stack: StackSlotLiveness::new(code),
        }
    }

    /// Run the three analyses on the rayon pool. Each owns its scratch
    /// state, so they need no synchronization beyond sharing `code`.
    #[cfg(feature = "parallel")]
    pub fn compute_parallel(code: &Code) -> Self {
        let ((gp, fp), stack) = rayon::join(
            || rayon::join(|| GpLiveness::new(code), || FpLiveness::new(code)),
            || StackSlotLiveness::new(code),
        );
        CodeLiveness { gp, fp, stack }
    }
}

//! Per-instruction liveness inside one block.

use rustc_hash::FxHashSet;

use crate::ir::Block;

use super::adapter::LivenessAdapter;
use super::workset::IndexSparseSet;

/// Backward cursor over one block.
///
/// Starts from the block's live-at-tail set. Each [`execute`](Self::execute)
/// moves the cursor up across one instruction; afterwards [`live`](Self::live)
/// is the set live immediately before that instruction. Instructions must
/// be executed from last to first.
///
/// Stepping to instruction `i`:
/// 1. removes everything `i` defines,
/// 2. adds everything `i` early-uses,
/// 3. adds everything `i - 1` late-uses (if `i > 0`).
///
/// Step 3 is why the terminator's own late uses are folded into the tail
/// set instead: there is no instruction after it in the block.
pub struct LocalCalc<'a, A: LivenessAdapter> {
    adapter: &'a A,
    block: &'a Block,
    workset: IndexSparseSet,
    /// Instructions at or above this index have been executed.
    position: usize,
}

impl<'a, A: LivenessAdapter> LocalCalc<'a, A> {
    /// Bind to `block`, reusing `workset` as scratch. `workset` must cover
    /// the adapter's whole universe.
    pub(crate) fn with_workset(
        adapter: &'a A,
        block: &'a Block,
        live_at_tail: &FxHashSet<usize>,
        mut workset: IndexSparseSet,
    ) -> Self {
        debug_assert_eq!(workset.universe(), adapter.max_index());
        workset.reset_from(live_at_tail.iter().copied());
        LocalCalc {
            adapter,
            block,
            workset,
            position: block.len(),
        }
    }

    /// Move above instruction `inst_index`.
    pub fn execute(&mut self, inst_index: usize) {
        debug_assert!(
            inst_index < self.position,
            "instruction {inst_index} of {} executed out of order (cursor at {})",
            self.block.id(),
            self.position,
        );
        self.position = inst_index;

        let adapter = self.adapter;
        let workset = &mut self.workset;
        let inst = self.block.at(inst_index);

        A::for_each_thing(inst, |thing, role, bank| {
            if role.is_def() && adapter.accepts_bank(bank) {
                workset.remove(adapter.value_to_index(thing));
            }
        });

        A::for_each_thing(inst, |thing, role, bank| {
            if role.is_early_use() && adapter.accepts_bank(bank) {
                workset.add(adapter.value_to_index(thing));
            }
        });

        if inst_index > 0 {
            let prev = self.block.at(inst_index - 1);
            A::for_each_thing(prev, |thing, role, bank| {
                if role.is_late_use() && adapter.accepts_bank(bank) {
                    workset.add(adapter.value_to_index(thing));
                }
            });
        }
    }

    /// Execute every remaining instruction, ending at the block head.
    pub fn execute_all(&mut self) {
        for inst_index in (0..self.position).rev() {
            self.execute(inst_index);
        }
    }

    /// Entities live at the cursor.
    pub fn live(&self) -> impl Iterator<Item = A::Thing> + '_ {
        self.workset
            .iter()
            .map(|index| self.adapter.index_to_value(index))
    }

    /// Entity indices live at the cursor.
    #[inline]
    pub fn live_indices(&self) -> &IndexSparseSet {
        &self.workset
    }

    pub fn is_live(&self, thing: A::Thing) -> bool {
        self.workset.contains(self.adapter.value_to_index(thing))
    }

    #[inline]
    pub fn block(&self) -> &'a Block {
        self.block
    }

    /// Index of the instruction the cursor sits just above; the block
    /// length before the first `execute`.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Give the scratch set back.
    pub fn into_workset(self) -> IndexSparseSet {
        self.workset
    }
}

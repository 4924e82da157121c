//! Per-block live sets kept by the fixpoint driver.

use rustc_hash::FxHashSet;

use crate::ir::BlockId;

/// Live-at-tail and live-at-head sets for every block, as entity indices.
///
/// Tail sets are the analysis output. Head sets only exist while the
/// fixpoint runs: they record what each block has already propagated to
/// its predecessors, so later visits can push just the difference. Both
/// only ever grow.
#[derive(Debug)]
pub struct BlockLivenessStore {
    live_at_tail: Vec<FxHashSet<usize>>,
    live_at_head: Vec<Vec<usize>>,
}

impl BlockLivenessStore {
    pub fn new(num_blocks: usize) -> Self {
        BlockLivenessStore {
            live_at_tail: vec![FxHashSet::default(); num_blocks],
            live_at_head: vec![Vec::new(); num_blocks],
        }
    }

    #[inline]
    pub fn tail(&self, block: BlockId) -> &FxHashSet<usize> {
        &self.live_at_tail[block.index()]
    }

    /// Add `index` to `block`'s tail set. Returns `true` if it was new.
    #[inline]
    pub fn add_to_tail(&mut self, block: BlockId, index: usize) -> bool {
        self.live_at_tail[block.index()].insert(index)
    }

    /// Entries recorded at `block`'s head so far.
    #[inline]
    pub fn head(&self, block: BlockId) -> &[usize] {
        &self.live_at_head[block.index()]
    }

    /// Record `new` entries at `block`'s head. The caller guarantees none
    /// of them is already recorded.
    pub fn extend_head(&mut self, block: BlockId, new: &[usize]) {
        let head = &mut self.live_at_head[block.index()];
        debug_assert!(
            new.iter().all(|index| !head.contains(index)),
            "head of {block} already records one of {new:?}",
        );
        head.extend_from_slice(new);
    }

    /// Drop the transient head sets and keep the tails.
    pub fn into_tails(self) -> Vec<FxHashSet<usize>> {
        self.live_at_tail
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::ir::BlockId;

    use super::BlockLivenessStore;

    #[test]
    fn tails_report_first_insertion_only() {
        let mut store = BlockLivenessStore::new(2);
        let b1 = BlockId::new(1);

        assert!(store.add_to_tail(b1, 4));
        assert!(!store.add_to_tail(b1, 4));
        assert!(store.tail(BlockId::new(0)).is_empty());

        let tails = store.into_tails();
        assert_eq!(tails.len(), 2);
        assert!(tails[1].contains(&4));
    }

    #[test]
    fn heads_accumulate() {
        let mut store = BlockLivenessStore::new(1);
        let b0 = BlockId::new(0);

        store.extend_head(b0, &[2, 0]);
        store.extend_head(b0, &[5]);
        assert_eq!(store.head(b0), &[2, 0, 5]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "already records")]
    fn heads_reject_duplicates() {
        let mut store = BlockLivenessStore::new(1);
        let b0 = BlockId::new(0);

        store.extend_head(b0, &[3]);
        store.extend_head(b0, &[3]);
    }
}

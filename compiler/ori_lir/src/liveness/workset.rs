//! Sparse set over a bounded index universe.

/// Set of indices in `[0, universe)` with O(1) `add`, `remove` and
/// `contains`, and iteration proportional to the number of members.
///
/// Classic dense/sparse pair: `dense` holds the members, `sparse[i]` holds
/// the position of `i` in `dense` when `i` is a member. Stale `sparse`
/// entries are harmless because membership is confirmed through `dense`.
/// `clear` is O(1).
///
/// Iteration follows `dense`, which is insertion order until a `remove`
/// moves the last member into the hole.
#[derive(Clone, Debug, Default)]
pub struct IndexSparseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
}

impl IndexSparseSet {
    /// An empty set over `[0, universe)`.
    pub fn new(universe: usize) -> Self {
        IndexSparseSet {
            dense: Vec::new(),
            sparse: vec![0; universe],
        }
    }

    /// Size of the index universe (not the member count).
    #[inline]
    pub fn universe(&self) -> usize {
        self.sparse.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Insert `index`. Returns `true` if it was not already a member.
    pub fn add(&mut self, index: usize) -> bool {
        if self.contains(index) {
            return false;
        }
        self.sparse[index] = self.dense.len();
        self.dense.push(index);
        true
    }

    /// Remove `index`. Returns `true` if it was a member.
    pub fn remove(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }
        let pos = self.sparse[index];
        self.dense.swap_remove(pos);
        if let Some(&moved) = self.dense.get(pos) {
            self.sparse[moved] = pos;
        }
        true
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        assert!(
            index < self.sparse.len(),
            "index {index} is outside the workset universe of {}",
            self.sparse.len(),
        );
        let pos = self.sparse[index];
        pos < self.dense.len() && self.dense[pos] == index
    }

    #[inline]
    pub fn clear(&mut self) {
        self.dense.clear();
    }

    /// Members, in dense order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.dense.iter().copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.dense
    }

    /// Replace the contents with `indices`.
    pub fn reset_from(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.clear();
        for index in indices {
            self.add(index);
        }
    }

    /// Remove every index in `indices`, leaving only members not listed.
    pub fn remove_all(&mut self, indices: impl IntoIterator<Item = usize>) {
        for index in indices {
            self.remove(index);
        }
    }
}

impl<'a> IntoIterator for &'a IndexSparseSet {
    type Item = usize;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.dense.iter().copied()
    }
}

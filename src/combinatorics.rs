//! Subset enumeration used by factor recombination.
//!
//! ```rust
//! use polybench::combinatorics::CombinationIterator;
//!
//! let mut c = CombinationIterator::new(4, 3);
//! let mut combinations = vec![];
//! while let Some(a) = c.next() {
//!     combinations.push(a.to_vec());
//! }
//!
//! assert_eq!(combinations, vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]);
//! ```

/// An iterator type for generating combinations of indices without replacement,
/// in lexicographic order.
///
/// The yielded slice borrows the iterator, so it cannot implement [Iterator].
pub struct CombinationIterator {
    n: usize,
    indices: Vec<usize>,
    init: bool,
}

impl CombinationIterator {
    /// Creates a new `CombinationIterator` for generating combinations of `k` elements from a set of `n` elements.
    pub fn new(n: usize, k: usize) -> CombinationIterator {
        CombinationIterator {
            indices: (0..k).collect(),
            n,
            init: false,
        }
    }

    /// Advances the iterator and returns the next combination.
    pub fn next(&mut self) -> Option<&[usize]> {
        if self.indices.is_empty() || self.indices.len() > self.n {
            return None;
        }

        if !self.init {
            self.init = true;
            return Some(&self.indices);
        }

        let k = self.indices.len();
        let i = (0..k)
            .rev()
            .find(|&i| self.indices[i] < self.n - k + i)?;

        let start = self.indices[i] + 1;
        for (p, v) in self.indices[i..].iter_mut().enumerate() {
            *v = start + p;
        }

        Some(&self.indices)
    }
}

/// Remove the entries at the sorted positions `indices` from `items`.
pub fn remove_indices<T>(items: &mut Vec<T>, indices: &[usize]) {
    for &i in indices.iter().rev() {
        items.remove(i);
    }
}

#[cfg(test)]
mod test {
    use super::{remove_indices, CombinationIterator};

    #[test]
    fn combinations() {
        let mut c = CombinationIterator::new(5, 2);
        let mut count = 0;
        let mut last = vec![];
        while let Some(a) = c.next() {
            count += 1;
            last = a.to_vec();
        }

        assert_eq!(count, 10);
        assert_eq!(last, vec![3, 4]);
    }

    #[test]
    fn empty_combinations() {
        assert!(CombinationIterator::new(2, 3).next().is_none());
        assert!(CombinationIterator::new(2, 0).next().is_none());
    }

    #[test]
    fn remove() {
        let mut v = vec!['a', 'b', 'c', 'd'];
        remove_indices(&mut v, &[0, 2]);
        assert_eq!(v, vec!['b', 'd']);
    }
}

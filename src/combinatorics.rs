//! Enumeration of index subsets, used to recombine modular factors.
//!
//! ```rust
//! use polybench::combinatorics::CombinationIterator;
//!
//! let mut subsets = CombinationIterator::new(4, 3);
//! let mut seen = vec![];
//! while let Some(s) = subsets.next() {
//!     seen.push(s.to_vec());
//! }
//!
//! assert_eq!(seen, vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]);
//! ```

/// Walks over the `k`-element subsets of `0..n` in lexicographic order.
/// The subsets are borrowed, so the iterator is driven with `while let`.
pub struct CombinationIterator {
    n: usize,
    subset: Vec<usize>,
    started: bool,
}

impl CombinationIterator {
    pub fn new(n: usize, k: usize) -> CombinationIterator {
        CombinationIterator {
            n,
            subset: (0..k).collect(),
            started: false,
        }
    }

    /// The next subset, or `None` when all have been visited. Empty subsets are never produced.
    pub fn next(&mut self) -> Option<&[usize]> {
        let k = self.subset.len();
        if k == 0 || k > self.n {
            return None;
        }

        if !self.started {
            self.started = true;
            return Some(&self.subset);
        }

        // the rightmost position that can still move up
        let pos = (0..k).rev().find(|&i| self.subset[i] < self.n - k + i)?;

        let start = self.subset[pos] + 1;
        for (offset, v) in self.subset[pos..].iter_mut().enumerate() {
            *v = start + offset;
        }

        Some(&self.subset)
    }
}

#[cfg(test)]
mod test {
    use super::CombinationIterator;

    fn collect(n: usize, k: usize) -> Vec<Vec<usize>> {
        let mut it = CombinationIterator::new(n, k);
        let mut res = vec![];
        while let Some(s) = it.next() {
            res.push(s.to_vec());
        }
        res
    }

    #[test]
    fn pairs() {
        assert_eq!(collect(3, 2), vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
        assert_eq!(collect(6, 2).len(), 15);
    }

    #[test]
    fn degenerate() {
        assert!(collect(2, 3).is_empty());
        assert!(collect(2, 0).is_empty());
        assert_eq!(collect(2, 2), vec![vec![0, 1]]);

        let mut it = CombinationIterator::new(1, 1);
        assert_eq!(it.next(), Some(&[0][..]));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }
}

//! Growable bit set of triangle (or vertex) indices.

use std::ops::Range;

const BITS: usize = u64::BITS as usize;

/// Membership set over element indices; grows on insert, absent indices read
/// as not contained.
#[derive(Debug, Clone, Default)]
pub struct ElementSet {
    words: Vec<u64>,
}

impl PartialEq for ElementSet {
    fn eq(&self, other: &Self) -> bool {
        let n = self.words.len().max(other.words.len());
        (0..n).all(|w| self.word(w) == other.word(w))
    }
}

impl Eq for ElementSet {}

impl ElementSet {
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Set containing `0..n`.
    pub fn full(n: usize) -> Self {
        let mut set = Self::new();
        set.insert_range(0..n);
        set
    }

    #[inline]
    fn word(&self, w: usize) -> u64 {
        self.words.get(w).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        self.word(i / BITS) & (1u64 << (i % BITS)) != 0
    }

    pub fn insert(&mut self, i: usize) {
        let w = i / BITS;
        if w >= self.words.len() {
            self.words.resize(w + 1, 0);
        }
        self.words[w] |= 1u64 << (i % BITS);
    }

    pub fn remove(&mut self, i: usize) {
        if let Some(word) = self.words.get_mut(i / BITS) {
            *word &= !(1u64 << (i % BITS));
        }
    }

    pub fn insert_range(&mut self, range: Range<usize>) {
        for i in range {
            self.insert(i);
        }
    }

    /// Drop every index `>= n`.
    pub fn truncate(&mut self, n: usize) {
        let keep_words = n.div_ceil(BITS);
        self.words.truncate(keep_words);
        if n % BITS != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << (n % BITS)) - 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn union_with(&mut self, other: &ElementSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &bits)| {
            let mut rest = bits;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(w * BITS + bit)
            })
        })
    }
}

impl FromIterator<usize> for ElementSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = ElementSet::new();
        for i in iter {
            set.insert(i);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_iterate() {
        let mut set = ElementSet::new();
        set.insert(3);
        set.insert(64);
        set.insert(130);
        assert!(set.contains(64));
        assert!(!set.contains(65));
        assert!(!set.contains(10_000));
        set.remove(64);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 130]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn truncate_drops_high_indices() {
        let mut set = ElementSet::full(100);
        set.truncate(65);
        assert_eq!(set.len(), 65);
        assert!(set.contains(64));
        assert!(!set.contains(65));
    }

    #[test]
    fn equality_ignores_trailing_words() {
        let mut a = ElementSet::full(3);
        a.insert(200);
        a.remove(200);
        assert_eq!(a, ElementSet::full(3));
    }

    #[test]
    fn union_grows() {
        let mut a: ElementSet = [1, 2].into_iter().collect();
        let b: ElementSet = [2, 99].into_iter().collect();
        a.union_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 2, 99]);
    }
}

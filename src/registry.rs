//! Edge-keyed registries used during a single slice or cap call.
//!
//! Both maps are keyed by an unordered pair of vertex indices, so the two
//! triangles sharing an edge always find the same entry.

#[cfg(feature = "hashmap")]
pub use hashbrown::{HashMap, HashSet};
#[cfg(not(feature = "hashmap"))]
pub use std::collections::{HashMap, HashSet};

/// Canonical (smaller index first) undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    lo: usize,
    hi: usize,
}

impl EdgeKey {
    #[inline]
    pub const fn new(a: usize, b: usize) -> Self {
        if a < b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    #[inline]
    pub const fn lo(&self) -> usize {
        self.lo
    }

    #[inline]
    pub const fn hi(&self) -> usize {
        self.hi
    }

    #[inline]
    pub const fn contains(&self, v: usize) -> bool {
        self.lo == v || self.hi == v
    }
}

/// Intersection vertices created on cut edges, so an edge shared by two
/// triangles is split at one vertex only.
#[derive(Debug, Default, Clone)]
pub struct EdgeVertexMap {
    map: HashMap<EdgeKey, usize>,
}

impl EdgeVertexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: usize, b: usize) -> Option<usize> {
        self.map.get(&EdgeKey::new(a, b)).copied()
    }

    /// Returns the vertex registered for edge `(a, b)`, creating it with `make`
    /// on first use.
    pub fn get_or_insert_with(&mut self, a: usize, b: usize, make: impl FnOnce() -> usize) -> usize {
        *self.map.entry(EdgeKey::new(a, b)).or_insert_with(make)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// For each cap edge, the triangle and side slot that most recently realised it.
///
/// Triangles are replaced, never edited, so an entry whose triangle has been
/// retired means the edge no longer exists.
#[derive(Debug, Default, Clone)]
pub struct EdgeTriangleMap {
    map: HashMap<EdgeKey, (usize, usize)>,
}

impl EdgeTriangleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, a: usize, b: usize, triangle: usize, slot: usize) {
        self.map.insert(EdgeKey::new(a, b), (triangle, slot));
    }

    pub fn get(&self, a: usize, b: usize) -> Option<(usize, usize)> {
        self.map.get(&EdgeKey::new(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_is_unordered() {
        assert_eq!(EdgeKey::new(3, 7), EdgeKey::new(7, 3));
        assert_eq!(EdgeKey::new(7, 3).lo(), 3);
        assert!(EdgeKey::new(7, 3).contains(7));
    }

    #[test]
    fn shared_edge_creates_one_vertex() {
        let mut map = EdgeVertexMap::new();
        let mut created = 0;
        let first = map.get_or_insert_with(4, 9, || {
            created += 1;
            100
        });
        let second = map.get_or_insert_with(9, 4, || {
            created += 1;
            101
        });
        assert_eq!(first, 100);
        assert_eq!(second, 100);
        assert_eq!(created, 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn latest_owner_wins() {
        let mut map = EdgeTriangleMap::new();
        map.record(1, 2, 0, 2);
        map.record(2, 1, 5, 0);
        assert_eq!(map.get(1, 2), Some((5, 0)));
        assert_eq!(map.get(2, 3), None);
    }
}

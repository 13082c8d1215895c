//! Slicing, capping and folding errors

use crate::float_types::Real;
use std::fmt::Display;

/// Everything that can make a slab operation fail outright.
///
/// Geometric degeneracy alone never produces an error; it is logged and the
/// operation carries on. These variants are reserved for outcomes the caller has
/// to decide about.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SlabError {
    /// (FoldDidNotConverge) The periodic fold kept moving vertices after the pass cap
    FoldDidNotConverge { passes: usize, moved: usize },
    /// (RecoveryStuck) A cap boundary edge could not be forced into the triangulation
    RecoveryStuck { from: usize, to: usize },
    /// (VertexOutOfRange) A face refers to a vertex that does not exist
    VertexOutOfRange { index: usize, count: usize },
    /// (DegenerateLattice) The lattice vectors do not span three dimensions
    DegenerateLattice(Real),
    /// (InvalidFace) A face has repeated vertex indices
    InvalidFace([usize; 3]),
}

impl Display for SlabError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlabError::FoldDidNotConverge { passes, moved } => write!(
                f,
                "(FoldDidNotConverge) periodic fold still moving after {} passes ({} vertices moved)",
                passes, moved
            ),
            SlabError::RecoveryStuck { from, to } => write!(
                f,
                "(RecoveryStuck) boundary edge {} -> {} could not be recovered",
                from, to
            ),
            SlabError::VertexOutOfRange { index, count } => write!(
                f,
                "(VertexOutOfRange) vertex index {} is out of range (vertex count = {})",
                index, count
            ),
            SlabError::DegenerateLattice(volume) => write!(
                f,
                "(DegenerateLattice) lattice vectors span a cell of volume {}",
                volume
            ),
            SlabError::InvalidFace(indices) => write!(
                f,
                "(InvalidFace) face {:?} repeats a vertex index",
                indices
            ),
        }
    }
}

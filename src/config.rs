//! Tunable tolerances and policies for slicing, capping and folding.

use crate::float_types::{Real, tolerance};

/// What to do when a cap boundary edge cannot be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StuckPolicy {
    /// Log the edge, leave it out and emit whatever cap could be validated.
    #[default]
    AcceptPartial,
    /// Abort the cap and return [`SlabError::RecoveryStuck`](crate::errors::SlabError::RecoveryStuck).
    Fail,
}

/// How emitted cap triangles reference their corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapVertexMode {
    /// Append a copy of every boundary vertex used by the cap, so the cap can
    /// carry its own normals and colours.
    #[default]
    Copy,
    /// Reuse the boundary vertices of the sliced surface, making the result
    /// index-watertight.
    Share,
}

/// Configuration shared by [`Slicer`](crate::slice::Slicer) and
/// [`Capper`](crate::cap::Capper).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabConfig {
    /// Residuals smaller than this in magnitude snap to exactly zero.
    pub residual_epsilon: Real,
    /// Barycentric coordinate (normalised cap frame) under which an inserted
    /// point is treated as lying on an edge or on a vertex.
    pub snap_barycentric: Real,
    /// Boundary edges shorter than this are merged before capping. Zero disables.
    pub min_edge_length: Real,
    /// Squared edge length flagged as degenerate on cap triangles.
    pub degenerate_edge2: Real,
    /// Squared area flagged as degenerate on cap triangles.
    pub degenerate_area2: Real,
    /// Leave degenerate cap triangles out of the emitted cap instead of only logging them.
    pub drop_degenerate: bool,
    /// Keep the cap triangulation Delaunay while inserting boundary vertices.
    pub delaunay: bool,
    pub cap_vertices: CapVertexMode,
    /// Upper bound on restarted passes of the periodic fold.
    pub max_fold_passes: usize,
    /// Upper bound on steps of a single edge-recovery walk.
    pub max_walk_steps: usize,
    pub stuck_policy: StuckPolicy,
}

impl Default for SlabConfig {
    fn default() -> Self {
        Self {
            residual_epsilon: tolerance(),
            snap_barycentric: 1e-7,
            min_edge_length: 0.0,
            degenerate_edge2: 1e-6,
            degenerate_area2: 1e-7,
            drop_degenerate: false,
            delaunay: true,
            cap_vertices: CapVertexMode::Copy,
            max_fold_passes: 1000,
            max_walk_steps: 10_000,
            stuck_policy: StuckPolicy::AcceptPartial,
        }
    }
}

impl SlabConfig {
    pub const fn with_residual_epsilon(mut self, epsilon: Real) -> Self {
        self.residual_epsilon = epsilon;
        self
    }

    pub const fn with_min_edge_length(mut self, length: Real) -> Self {
        self.min_edge_length = length;
        self
    }

    pub const fn with_degenerate_thresholds(mut self, edge2: Real, area2: Real) -> Self {
        self.degenerate_edge2 = edge2;
        self.degenerate_area2 = area2;
        self
    }

    pub const fn with_drop_degenerate(mut self, drop: bool) -> Self {
        self.drop_degenerate = drop;
        self
    }

    pub const fn with_delaunay(mut self, delaunay: bool) -> Self {
        self.delaunay = delaunay;
        self
    }

    pub const fn with_cap_vertices(mut self, mode: CapVertexMode) -> Self {
        self.cap_vertices = mode;
        self
    }

    pub const fn with_max_fold_passes(mut self, passes: usize) -> Self {
        self.max_fold_passes = passes;
        self
    }

    pub const fn with_max_walk_steps(mut self, steps: usize) -> Self {
        self.max_walk_steps = steps;
        self
    }

    pub const fn with_stuck_policy(mut self, policy: StuckPolicy) -> Self {
        self.stuck_policy = policy;
        self
    }

    /// Snap a raw residual to zero when it is within the residual tolerance.
    #[inline]
    pub fn snap_residual(&self, residual: Real) -> Real {
        if residual.abs() < self.residual_epsilon {
            0.0
        } else {
            residual
        }
    }
}

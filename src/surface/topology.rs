//! Edge-manifold analysis of the live faces of a [`SurfaceMesh`].
//!
//! Used to check that a slice leaves a watertight surface and that a cap
//! closes the cross-section it was built for.

use super::SurfaceMesh;
use crate::float_types::Real;
use crate::registry::{EdgeKey, HashMap};
use std::fmt::Debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyReport {
    pub faces: usize,
    /// Edges used by exactly one live face (0 for closed surfaces)
    pub boundary_edges: usize,
    /// Edges used by more than two live faces
    pub non_manifold_edges: usize,
    /// Manifold edges whose two faces traverse them in the same direction
    pub inconsistent_edges: usize,
    /// Face components connected through shared edges
    pub connected_components: usize,
}

impl TopologyReport {
    /// Closed, edge-manifold and consistently oriented.
    pub const fn is_closed(&self) -> bool {
        self.boundary_edges == 0 && self.non_manifold_edges == 0 && self.inconsistent_edges == 0
    }
}

impl<S: Clone + Debug> SurfaceMesh<S> {
    /// Analyse the live faces. With `weld = Some(tolerance)`, vertices whose
    /// positions agree after quantisation to `tolerance` count as one vertex, so
    /// caps built from copied vertices can be checked against the surface.
    pub fn analyze_topology(&self, weld: Option<Real>) -> TopologyReport {
        let canonical = self.weld_map(weld);
        let faces: Vec<[usize; 3]> = self
            .live_faces()
            .map(|(_, f)| f.indices.map(|i| canonical[i]))
            .collect();

        // edge -> (faces using it, net direction count lo->hi minus hi->lo)
        let mut edges: HashMap<EdgeKey, (Vec<usize>, i32)> = HashMap::new();
        for (fi, tri) in faces.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                if a == b {
                    continue;
                }
                let entry = edges.entry(EdgeKey::new(a, b)).or_default();
                entry.0.push(fi);
                entry.1 += if a < b { 1 } else { -1 };
            }
        }

        let mut report = TopologyReport {
            faces: faces.len(),
            ..Default::default()
        };
        for (users, net) in edges.values() {
            match users.len() {
                1 => report.boundary_edges += 1,
                2 if *net != 0 => report.inconsistent_edges += 1,
                2 => {},
                _ => report.non_manifold_edges += 1,
            }
        }

        // union-find over faces sharing an edge
        let mut parent: Vec<usize> = (0..faces.len()).collect();
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        for (users, _) in edges.values() {
            for pair in users.windows(2) {
                let (ra, rb) = (find(&mut parent, pair[0]), find(&mut parent, pair[1]));
                if ra != rb {
                    parent[ra] = rb;
                }
            }
        }
        report.connected_components = (0..faces.len())
            .filter(|&f| find(&mut parent, f) == f)
            .count();
        report
    }

    fn weld_map(&self, weld: Option<Real>) -> Vec<usize> {
        let Some(tolerance) = weld.filter(|t| *t > 0.0) else {
            return (0..self.vertices.len()).collect();
        };
        let mut seen: HashMap<(i64, i64, i64), usize> = HashMap::new();
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let key = (
                    (v.pos.x / tolerance).round() as i64,
                    (v.pos.y / tolerance).round() as i64,
                    (v.pos.z / tolerance).round() as i64,
                );
                *seen.entry(key).or_insert(i)
            })
            .collect()
    }
}

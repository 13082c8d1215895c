//! **Boundary edge recovery and interior marking**
//!
//! After all boundary vertices are inserted, each directed boundary edge must
//! appear as a side of the triangulation. A missing edge is recovered by
//! walking the fan around its start vertex to the triangle the edge leaves
//! through, then either swapping the blocking diagonal (when the far apex is
//! the edge's end) or inserting a Steiner point where the edge crosses it.

use super::triangulation::{CapPoint, PointOrigin, Triangulation};
use crate::config::SlabConfig;
use crate::float_types::{COLLINEAR_SINE, Real};
use crate::registry::{EdgeKey, HashMap};
use nalgebra::Vector2;
use std::collections::VecDeque;

/// A directed cut edge in cap-point indices; the cap interior lies to its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BoundaryEdge {
    pub from: usize,
    pub to: usize,
    /// Set on the remainder of an edge that was split during recovery.
    pub needs_reprocessing: bool,
    /// Mesh vertices of the edge this piece was cut from.
    pub origin: (usize, usize),
}

#[derive(Debug, Default)]
pub(crate) struct Boundary {
    pub edges: Vec<BoundaryEdge>,
    keys: HashMap<EdgeKey, usize>,
}

impl Boundary {
    /// Register an edge unless it is degenerate or already present.
    pub fn push(&mut self, edge: BoundaryEdge) -> bool {
        if edge.from == edge.to {
            return false;
        }
        let key = EdgeKey::new(edge.from, edge.to);
        if let Some(&existing) = self.keys.get(&key) {
            log::warn!(
                "boundary edge {} -> {} repeats edge {} -> {}; ignored",
                edge.from,
                edge.to,
                self.edges[existing].from,
                self.edges[existing].to
            );
            return false;
        }
        self.keys.insert(key, self.edges.len());
        self.edges.push(edge);
        true
    }

    pub fn index_of(&self, a: usize, b: usize) -> Option<usize> {
        self.keys.get(&EdgeKey::new(a, b)).copied()
    }

    pub fn get(&self, a: usize, b: usize) -> Option<&BoundaryEdge> {
        self.index_of(a, b).map(|i| &self.edges[i])
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.keys.contains_key(&EdgeKey::new(a, b))
    }

    /// Cut edge `ei` at point `x`. The edge keeps its head and becomes
    /// `from -> x`; the returned edge is the remainder `x -> to`.
    pub fn split(&mut self, ei: usize, x: usize) -> usize {
        let edge = self.edges[ei];
        self.keys.remove(&EdgeKey::new(edge.from, edge.to));
        if self.contains(edge.from, x) || self.contains(x, edge.to) {
            log::warn!("splitting boundary edge {} -> {} at {} overlaps another edge", edge.from, edge.to, x);
        }
        self.edges[ei].to = x;
        self.keys.insert(EdgeKey::new(edge.from, x), ei);

        let tail = self.edges.len();
        self.edges.push(BoundaryEdge {
            from: x,
            needs_reprocessing: true,
            ..edge
        });
        self.keys.insert(EdgeKey::new(x, edge.to), tail);
        tail
    }
}

/// Result of one step of the walk towards a missing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Realized,
    Swapped,
    /// The edge passes through an existing vertex.
    Through(usize),
    /// A Steiner point was inserted on the blocking side `(s, e)`.
    Steiner { x: usize, blocking: (usize, usize) },
    Stuck,
}

#[derive(Debug, Default)]
pub(crate) struct Recovery {
    pub steiner_points: usize,
    /// Indices into `Boundary::edges` that could not be recovered.
    pub stuck: Vec<usize>,
}

#[inline]
fn cross(a: &Vector2<Real>, b: &Vector2<Real>) -> Real {
    a.x * b.y - a.y * b.x
}

/// Force every boundary edge into the triangulation.
pub(crate) fn recover_edges(tri: &mut Triangulation, boundary: &mut Boundary, config: &SlabConfig) -> Recovery {
    let mut report = Recovery::default();
    let mut queue: VecDeque<usize> = (0..boundary.edges.len()).collect();

    while let Some(ei) = queue.pop_front() {
        let mut steps = 0;
        loop {
            let BoundaryEdge { from: a, to: b, .. } = boundary.edges[ei];
            if tri.has_edge(a, b) {
                break;
            }
            if steps >= config.max_walk_steps {
                log::warn!("edge recovery for {} -> {} exceeded {} steps", a, b, steps);
                report.stuck.push(ei);
                break;
            }
            steps += 1;

            match tri.step_towards(a, b, boundary, config.max_walk_steps) {
                Step::Realized | Step::Swapped => continue,
                Step::Through(c) => {
                    log::debug!("boundary edge {} -> {} passes through {}", a, b, c);
                    queue.push_back(boundary.split(ei, c));
                    break;
                },
                Step::Steiner { x, blocking } => {
                    log::debug!(
                        "steiner point {} on ({}, {}) for boundary edge {} -> {}",
                        x,
                        blocking.0,
                        blocking.1,
                        a,
                        b
                    );
                    report.steiner_points += 1;
                    if let Some(bi) = boundary.index_of(blocking.0, blocking.1) {
                        log::warn!("boundary edge {} -> {} crosses another boundary edge", a, b);
                        queue.push_back(boundary.split(bi, x));
                    }
                    queue.push_back(boundary.split(ei, x));
                    break;
                },
                Step::Stuck => {
                    log::warn!("edge recovery stuck on boundary edge {} -> {}", a, b);
                    report.stuck.push(ei);
                    break;
                },
            }
        }
    }
    report
}

impl Triangulation {
    /// Walk the fan around `a` to the triangle whose wedge contains `b`, and
    /// act on the side blocking the way.
    fn step_towards(&mut self, a: usize, b: usize, boundary: &Boundary, max_fan: usize) -> Step {
        let Some((t0, i0)) = self.home[a] else {
            return Step::Stuck;
        };
        if self.triangles[t0].retired || self.triangles[t0].vs[i0] != a {
            log::error!("vertex map for cap point {} is stale", a);
            return Step::Stuck;
        }
        let pa = self.points[a].local;
        let d = self.points[b].local - pa;
        let dl = d.norm();
        if dl <= Real::MIN_POSITIVE {
            return Step::Stuck;
        }

        let (mut t, mut i) = (t0, i0);
        for _ in 0..max_fan {
            let (s, e) = self.triangles[t].side(i);
            if s == b || e == b {
                return Step::Realized;
            }
            let ds = self.points[s].local - pa;
            let de = self.points[e].local - pa;
            let sin_s = cross(&ds, &d) / (ds.norm() * dl);
            let sin_e = cross(&d, &de) / (de.norm() * dl);

            for (v, dv, sin) in [(s, ds, sin_s), (e, de, sin_e)] {
                if sin.abs() <= COLLINEAR_SINE && dv.dot(&d) > 0.0 && dv.norm() < dl {
                    if self.points[v].origin == PointOrigin::Super {
                        return Step::Stuck;
                    }
                    return Step::Through(v);
                }
            }
            if sin_s > COLLINEAR_SINE && sin_e > COLLINEAR_SINE {
                return self.cross_side(t, i, a, b, boundary);
            }

            // next triangle counter-clockwise around `a` shares side (e, a)
            let Some((u, j)) = self.triangles[t].links[(i + 1) % 3] else {
                return Step::Stuck;
            };
            t = u;
            i = (j + 1) % 3;
            if t == t0 {
                return Step::Stuck;
            }
        }
        Step::Stuck
    }

    /// The edge `a -> b` leaves triangle `t` through side `i`.
    fn cross_side(&mut self, t: usize, i: usize, a: usize, b: usize, boundary: &Boundary) -> Step {
        let (s, e) = self.triangles[t].side(i);
        let Some((u, j)) = self.triangles[t].links[i] else {
            return Step::Stuck;
        };
        if self.triangles[u].vs[j] == b && !boundary.contains(s, e) && self.flip(t, i).is_some() {
            return Step::Swapped;
        }

        let (pa, pb) = (self.points[a].local, self.points[b].local);
        let (ps, pe) = (self.points[s].local, self.points[e].local);
        let d = pb - pa;
        let w = pe - ps;
        let denom = cross(&w, &d);
        if denom.abs() <= Real::MIN_POSITIVE {
            return Step::Stuck;
        }
        let lambda = (cross(&(pa - ps), &d) / denom).clamp(self.snap(), 1.0 - self.snap());
        let local = ps + w * lambda;
        let (ws, we) = (self.points[s].world, self.points[e].world);
        let mu = ((local - pa).dot(&d) / d.norm_squared()).clamp(0.0, 1.0);
        let (va, vb) = (self.points[a].value, self.points[b].value);

        let x = self.push_point(CapPoint {
            local,
            world: ws + (we - ws) * lambda,
            value: va + (vb - va) * mu,
            set: self.points[a].set,
            origin: PointOrigin::Steiner,
        });
        self.split2(t, i, x);
        Step::Steiner { x, blocking: (s, e) }
    }
}

/// Mark every triangle of the cap interior `ok`.
///
/// A triangle with sides on the boundary is seeded `ok` when all of them run in
/// the boundary direction, and blocked when any runs against it. `ok` then
/// spreads across sides that are not on the boundary.
pub(crate) fn mark_interior(tri: &mut Triangulation, boundary: &Boundary) -> usize {
    let live: Vec<usize> = tri.live().collect();
    let mut stack = Vec::new();
    for &t in &live {
        let mut edge_type = 0u8;
        let mut consistent = true;
        for i in 0..3 {
            let (x, y) = tri.triangles[t].side(i);
            if let Some(edge) = boundary.get(x, y) {
                edge_type |= 1 << i;
                consistent &= edge.from == x && edge.to == y;
            }
        }
        let tr = &mut tri.triangles[t];
        tr.edge_type = edge_type;
        tr.blocked = edge_type != 0 && !consistent;
        tr.ok = tr.valid && edge_type != 0 && consistent;
        if tr.ok {
            stack.push(t);
        }
    }

    while let Some(t) = stack.pop() {
        let tr = &tri.triangles[t];
        let (edge_type, links) = (tr.edge_type, tr.links);
        for (i, link) in links.iter().enumerate() {
            if edge_type & (1 << i) != 0 {
                continue;
            }
            let Some((u, _)) = *link else { continue };
            let n = &mut tri.triangles[u];
            if !n.retired && n.valid && !n.ok && !n.blocked && n.edge_type == 0 {
                n.ok = true;
                stack.push(u);
            }
        }
    }
    live.iter().filter(|&&t| tri.triangles[t].ok).count()
}

//! **Incremental triangulation of a flattened cross-section**
//!
//! Triangles live in an arena and are never edited in place: every split or
//! swap retires the triangles it replaces and appends new ones. Side `i` of a
//! triangle is the edge opposite `vs[i]`, running `vs[i+1] -> vs[i+2]`, and
//! `links[i]` names the neighbour across it together with the neighbour's own
//! side index. All live triangles are counter-clockwise in the local frame.

use crate::config::SlabConfig;
use crate::float_types::{INCIRCLE_EPSILON, Real};
use crate::registry::EdgeTriangleMap;
use nalgebra::{Point2, Point3};

pub(crate) type Link = Option<(usize, usize)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PointOrigin {
    /// A boundary vertex of the sliced mesh.
    Mesh(usize),
    /// A corner of the enclosing super-triangle.
    Super,
    /// A point inserted while recovering a boundary edge.
    Steiner,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CapPoint {
    /// Position in the normalised cap frame.
    pub local: Point2<Real>,
    pub world: Point3<Real>,
    pub value: Real,
    pub set: u32,
    pub origin: PointOrigin,
}

#[derive(Debug, Clone)]
pub(crate) struct CapTriangle {
    pub vs: [usize; 3],
    pub links: [Link; 3],
    pub retired: bool,
    /// Touches no super-triangle corner.
    pub valid: bool,
    pub degenerate: bool,
    /// Bit `i` set when side `i` lies on a boundary edge.
    pub edge_type: u8,
    pub ok: bool,
    pub blocked: bool,
    /// Points waiting to be inserted that fall inside this triangle.
    pub pending: Vec<usize>,
}

impl CapTriangle {
    /// Endpoints of side `i`, in winding order.
    #[inline]
    pub const fn side(&self, i: usize) -> (usize, usize) {
        (self.vs[(i + 1) % 3], self.vs[(i + 2) % 3])
    }

    #[inline]
    pub fn slot_of(&self, v: usize) -> Option<usize> {
        self.vs.iter().position(|&x| x == v)
    }
}

#[derive(Debug)]
pub(crate) struct Triangulation {
    pub points: Vec<CapPoint>,
    pub triangles: Vec<CapTriangle>,
    pub edges: EdgeTriangleMap,
    /// A live triangle and slot containing each point.
    pub home: Vec<Link>,
    alias: Vec<usize>,
    pub merged: usize,
    pub swaps: usize,
    snap: Real,
    degenerate_edge2: Real,
    degenerate_area2: Real,
}

impl Triangulation {
    /// Start from the super-triangle `corners` (point indices, counter-clockwise).
    pub fn new(points: Vec<CapPoint>, corners: [usize; 3], config: &SlabConfig) -> Self {
        let n = points.len();
        let mut tri = Triangulation {
            points,
            triangles: Vec::new(),
            edges: EdgeTriangleMap::new(),
            home: vec![None; n],
            alias: (0..n).collect(),
            merged: 0,
            swaps: 0,
            snap: config.snap_barycentric,
            degenerate_edge2: config.degenerate_edge2,
            degenerate_area2: config.degenerate_area2,
        };
        tri.add_triangle(corners);
        tri
    }

    /// The point `p` stands for after duplicate merging.
    pub fn resolve(&self, mut p: usize) -> usize {
        while self.alias[p] != p {
            p = self.alias[p];
        }
        p
    }

    /// Barycentric weight below which a point counts as lying on a side.
    #[inline]
    pub const fn snap(&self) -> Real {
        self.snap
    }

    pub fn push_point(&mut self, point: CapPoint) -> usize {
        self.points.push(point);
        self.home.push(None);
        self.alias.push(self.points.len() - 1);
        self.points.len() - 1
    }

    /// Twice the signed area of `(a, b, c)` in the local frame.
    #[inline]
    pub fn orient(&self, a: usize, b: usize, c: usize) -> Real {
        orient2d(&self.points[a].local, &self.points[b].local, &self.points[c].local)
    }

    pub fn live(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.triangles.len()).filter(|&t| !self.triangles[t].retired)
    }

    /// Whether some live triangle currently has `a`-`b` as a side.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edges
            .get(a, b)
            .is_some_and(|(t, _)| !self.triangles[t].retired)
    }

    pub(crate) fn add_triangle(&mut self, vs: [usize; 3]) -> usize {
        let t = self.triangles.len();
        let valid = vs
            .iter()
            .all(|&v| self.points[v].origin != PointOrigin::Super);

        let [a, b, c] = vs.map(|v| self.points[v].world);
        let min_edge2 = (b - a)
            .norm_squared()
            .min((c - b).norm_squared())
            .min((a - c).norm_squared());
        let area2 = (b - a).cross(&(c - a)).norm_squared() / 4.0;
        let degenerate = valid && (area2 < self.degenerate_area2 || min_edge2 < self.degenerate_edge2);
        if self.orient(vs[0], vs[1], vs[2]) <= 0.0 {
            log::error!("cap triangle {} {:?} has non-positive winding", t, vs);
        }

        self.triangles.push(CapTriangle {
            vs,
            links: [None; 3],
            retired: false,
            valid,
            degenerate,
            edge_type: 0,
            ok: false,
            blocked: false,
            pending: Vec::new(),
        });
        for i in 0..3 {
            let (x, y) = self.triangles[t].side(i);
            self.edges.record(x, y, t, i);
            self.home[vs[i]] = Some((t, i));
        }
        t
    }

    /// Link side `i` of `t` to `link`, and the neighbour back to `t`.
    pub(crate) fn set_link(&mut self, t: usize, i: usize, link: Link) {
        self.triangles[t].links[i] = link;
        if let Some((u, j)) = link {
            self.triangles[u].links[j] = Some((t, i));
        }
    }

    fn retire(&mut self, t: usize) -> Vec<usize> {
        let tri = &mut self.triangles[t];
        tri.retired = true;
        std::mem::take(&mut tri.pending)
    }

    /// Link symmetry and shared-endpoint agreement around `t`.
    pub(crate) fn check_links(&self, t: usize) -> bool {
        let tri = &self.triangles[t];
        let mut ok = true;
        for i in 0..3 {
            let Some((u, j)) = tri.links[i] else { continue };
            let other = &self.triangles[u];
            let (a, b) = tri.side(i);
            if other.retired || other.links[j] != Some((t, i)) || other.side(j) != (b, a) {
                log::error!(
                    "cap triangle {} side {} ({}, {}) disagrees with neighbour {} side {}",
                    t,
                    i,
                    a,
                    b,
                    u,
                    j
                );
                ok = false;
            }
        }
        ok
    }

    /// Barycentric weights of point `p` with respect to `vs[0..3]` of `t`.
    pub fn barycentric(&self, t: usize, p: usize) -> Option<[Real; 3]> {
        let [a, b, c] = self.triangles[t].vs;
        let area = self.orient(a, b, c);
        if area <= Real::MIN_POSITIVE {
            return None;
        }
        Some([
            self.orient(p, b, c) / area,
            self.orient(a, p, c) / area,
            self.orient(a, b, p) / area,
        ])
    }

    /// **Point insertion from per-triangle buckets**
    ///
    /// Every point in `order` starts in the bucket of the super-triangle. A
    /// triangle with a non-empty bucket takes its middle point, splits around
    /// it, and hands the rest of its bucket to the triangles that replace it.
    /// Work is driven by an explicit stack of triangles to revisit.
    pub fn insert_all(&mut self, order: Vec<usize>, delaunay: bool) {
        let Some(root) = self.live().next() else {
            return;
        };
        self.triangles[root].pending = order;
        let mut stack = vec![root];
        while let Some(t) = stack.pop() {
            if self.triangles[t].retired || self.triangles[t].pending.is_empty() {
                continue;
            }
            let mid = self.triangles[t].pending.len() / 2;
            let p = self.triangles[t].pending.remove(mid);
            let created = self.insert_point(t, p, delaunay);
            if created.is_empty() {
                stack.push(t);
            }
            stack.extend(created);
        }
    }

    /// Insert `p`, known to lie in (or on the boundary of) `t`. Returns the
    /// triangles created.
    fn insert_point(&mut self, t: usize, p: usize, delaunay: bool) -> Vec<usize> {
        let Some(weights) = self.barycentric(t, p) else {
            log::error!("cannot locate cap point {} in degenerate triangle {}", p, t);
            return Vec::new();
        };
        let vs = self.triangles[t].vs;
        if let Some(k) = (0..3).find(|&k| weights[k] > 1.0 - self.snap) {
            log::warn!(
                "cap point {} coincides with point {}; merging",
                p,
                vs[k]
            );
            self.alias[p] = vs[k];
            self.merged += 1;
            return Vec::new();
        }

        let mut created = match (0..3).find(|&k| weights[k] < self.snap) {
            Some(k) => self.split2(t, k, p),
            None => self.split3(t, p).to_vec(),
        };
        if delaunay {
            created.extend(self.legalize(p, &created.clone()));
        }
        created
    }

    /// **Split 1 → 3** around an interior point.
    pub(crate) fn split3(&mut self, t: usize, p: usize) -> [usize; 3] {
        let [a, b, c] = self.triangles[t].vs;
        let [l0, l1, l2] = self.triangles[t].links;
        let pending = self.retire(t);

        let ta = self.add_triangle([p, b, c]);
        let tb = self.add_triangle([a, p, c]);
        let tc = self.add_triangle([a, b, p]);
        self.set_link(ta, 0, l0);
        self.set_link(tb, 1, l1);
        self.set_link(tc, 2, l2);
        self.set_link(ta, 1, Some((tb, 0)));
        self.set_link(ta, 2, Some((tc, 0)));
        self.set_link(tb, 2, Some((tc, 1)));

        let created = [ta, tb, tc];
        self.redistribute(pending, &created);
        for &n in &created {
            self.check_links(n);
        }
        created
    }

    /// **Split 2 → 4** at a point on side `k` of `t`; the neighbour across that
    /// side (if any) is split too.
    pub(crate) fn split2(&mut self, t: usize, k: usize, p: usize) -> Vec<usize> {
        let vs = self.triangles[t].vs;
        let (o, s, e) = (vs[k], vs[(k + 1) % 3], vs[(k + 2) % 3]);
        let links = self.triangles[t].links;
        let (across, ls, le) = (links[k], links[(k + 1) % 3], links[(k + 2) % 3]);
        let mut pending = self.retire(t);

        let t1 = self.add_triangle([o, s, p]);
        let t2 = self.add_triangle([o, p, e]);
        self.set_link(t1, 2, le);
        self.set_link(t2, 1, ls);
        self.set_link(t1, 1, Some((t2, 2)));
        let mut created = vec![t1, t2];

        if let Some((u, m)) = across {
            let uvs = self.triangles[u].vs;
            let q = uvs[m];
            if uvs[(m + 1) % 3] != e || uvs[(m + 2) % 3] != s {
                log::error!("split edge ({}, {}) not shared by neighbour {}", s, e, u);
            }
            let ulinks = self.triangles[u].links;
            let (lu_e, lu_s) = (ulinks[(m + 1) % 3], ulinks[(m + 2) % 3]);
            pending.extend(self.retire(u));

            let u1 = self.add_triangle([q, e, p]);
            let u2 = self.add_triangle([q, p, s]);
            self.set_link(u1, 2, lu_s);
            self.set_link(u2, 1, lu_e);
            self.set_link(u1, 1, Some((u2, 2)));
            self.set_link(t1, 0, Some((u2, 0)));
            self.set_link(t2, 0, Some((u1, 0)));
            created.extend([u1, u2]);
        }

        self.redistribute(pending, &created);
        for &n in &created {
            self.check_links(n);
        }
        created
    }

    /// **Swap** the diagonal across side `i` of `t`, if the quadrilateral formed
    /// with the neighbour is strictly convex. The new triangles both have the
    /// old apex of `t` at slot 0.
    pub(crate) fn flip(&mut self, t: usize, i: usize) -> Option<[usize; 2]> {
        let (u, j) = self.triangles[t].links[i]?;
        let vs = self.triangles[t].vs;
        let (o, s, e) = (vs[i], vs[(i + 1) % 3], vs[(i + 2) % 3]);
        let uvs = self.triangles[u].vs;
        let q = uvs[j];
        if uvs[(j + 1) % 3] != e || uvs[(j + 2) % 3] != s {
            log::error!("swap across ({}, {}) found mismatched neighbour {}", s, e, u);
            return None;
        }
        if self.orient(o, s, q) <= 0.0 || self.orient(o, q, e) <= 0.0 {
            return None;
        }

        let links = self.triangles[t].links;
        let (ls, le) = (links[(i + 1) % 3], links[(i + 2) % 3]);
        let ulinks = self.triangles[u].links;
        let (lu_e, lu_s) = (ulinks[(j + 1) % 3], ulinks[(j + 2) % 3]);
        let mut pending = self.retire(t);
        pending.extend(self.retire(u));

        let n1 = self.add_triangle([o, s, q]);
        let n2 = self.add_triangle([o, q, e]);
        self.set_link(n1, 0, lu_e);
        self.set_link(n1, 2, le);
        self.set_link(n2, 0, lu_s);
        self.set_link(n2, 1, ls);
        self.set_link(n1, 1, Some((n2, 2)));
        self.swaps += 1;

        self.redistribute(pending, &[n1, n2]);
        self.check_links(n1);
        self.check_links(n2);
        Some([n1, n2])
    }

    /// Lawson flips restoring the empty-circumcircle property around a newly
    /// inserted point `p`.
    fn legalize(&mut self, p: usize, around: &[usize]) -> Vec<usize> {
        let mut created = Vec::new();
        let mut stack: Vec<(usize, usize)> = around
            .iter()
            .filter_map(|&t| self.triangles[t].slot_of(p).map(|i| (t, i)))
            .collect();
        while let Some((t, i)) = stack.pop() {
            if self.triangles[t].retired {
                continue;
            }
            let Some((u, j)) = self.triangles[t].links[i] else {
                continue;
            };
            let q = self.triangles[u].vs[j];
            let [a, b, c] = self.triangles[t].vs;
            let det = incircle(
                &self.points[a].local,
                &self.points[b].local,
                &self.points[c].local,
                &self.points[q].local,
            );
            if det <= INCIRCLE_EPSILON {
                continue;
            }
            if let Some([n1, n2]) = self.flip(t, i) {
                created.extend([n1, n2]);
                stack.push((n1, 0));
                stack.push((n2, 0));
            }
        }
        created
    }

    fn redistribute(&mut self, points: Vec<usize>, into: &[usize]) {
        for p in points {
            let mut best = (into[0], Real::NEG_INFINITY);
            for &t in into {
                let Some(w) = self.barycentric(t, p) else {
                    continue;
                };
                let min = w[0].min(w[1]).min(w[2]);
                if min > best.1 {
                    best = (t, min);
                }
                if min >= 0.0 {
                    break;
                }
            }
            self.triangles[best.0].pending.push(p);
        }
    }
}

#[inline]
pub(crate) fn orient2d(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>) -> Real {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Positive when `d` lies inside the circumcircle of the counter-clockwise
/// triangle `(a, b, c)`.
pub(crate) fn incircle(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>, d: &Point2<Real>) -> Real {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;
    adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx)
}

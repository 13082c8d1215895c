//! **Slicing, capping and periodic folding of triangulated isosurfaces.**
//!
//! A [`Slicer`] cuts the live triangles of a mesh against a [`Classifier`] (a
//! plane, a distance to a set of points, a value threshold, external per-vertex
//! data or a set of source ids), keeps the positive side watertight through
//! shared crossing vertices, and optionally closes the cut with a flat cap
//! built by the constrained triangulator in [`cap`]. Repeated ghost-mode slices
//! against the 26 bisecting planes of a lattice fold a surface into its
//! Wigner–Seitz (Brillouin) cell.
//!
//! The engine works on any host mesh through the [`MeshStore`] trait;
//! [`SurfaceMesh`] is the stock implementation.
//!
//! ```
//! use isoslab::{Classifier, Plane, Slicer, SurfaceMesh};
//! use nalgebra::Vector3;
//!
//! let mut cube: SurfaceMesh = SurfaceMesh::cube(2.0);
//! let keep_below = Plane::from_normal(-Vector3::z(), 0.0);
//! let outcome = Slicer::new(&mut cube)
//!     .slice(&Classifier::Plane(keep_below), true)
//!     .unwrap();
//! assert!(outcome.cap.is_some_and(|cap| cap.is_capped()));
//! assert!(cube.analyze_topology(Some(1e-9)).is_closed());
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **hashmap**: use hashbrown for the edge registries and topology analysis
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon to classify vertices

#![forbid(unsafe_code)]
#![warn(unused, clippy::missing_const_for_fn, clippy::all)]

pub mod aabb;
pub mod cap;
pub mod config;
pub mod errors;
pub mod float_types;
pub mod plane;
pub mod registry;
pub mod slice;
pub mod surface;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use aabb::Aabb;
pub use cap::{CapOutcome, Capper};
pub use config::{CapVertexMode, SlabConfig, StuckPolicy};
pub use errors::SlabError;
pub use plane::{Plane, PlaneFrame};
pub use slice::{Classifier, FoldOutcome, Lattice, Slab, SlabKind, SlabOutcome, SliceOutcome, Slicer};
pub use surface::{ElementSet, Face, FaceTarget, MeshStore, SurfaceMesh, SurfaceVertex};

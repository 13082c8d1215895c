// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Lazily-initialized residual tolerance used across the crate.
///
/// A vertex whose classifier residual is smaller than this in magnitude is
/// treated as lying exactly on the cut. It can be overridden:
///  1) **Build-time**: set env var `ISOSLAB_TOLERANCE` (e.g. `ISOSLAB_TOLERANCE=1e-5 cargo build`)
///  2) **Runtime**: call [`set_tolerance`] once before using the library
static TOLERANCE_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_tolerance() -> Real {
    1e-4
}

/// Returns the current residual tolerance.
/// If not set yet, it tries `ISOSLAB_TOLERANCE` (parsed as the active `Real`) and
/// falls back to `1e-4`.
pub fn tolerance() -> Real {
    *TOLERANCE_CELL.get_or_init(|| {
        // Compile-time env if provided, inherited by dependencies
        if let Some(environment_variable) = option_env!("ISOSLAB_TOLERANCE") {
            if let Ok(value) = Real::from_str(environment_variable) {
                return value.max(Real::EPSILON);
            }
        }
        default_tolerance()
    })
}

/// Set the residual tolerance programmatically once (subsequent calls are ignored).
/// Call near program start: `isoslab::float_types::set_tolerance(1e-5);`
pub fn set_tolerance(value: Real) {
    let _ = TOLERANCE_CELL.set(value.max(Real::EPSILON));
}

/// Threshold on the sine of the angle between two directions below which they
/// are considered collinear by the cap predicates (normalised coordinates).
#[cfg(feature = "f32")]
pub const COLLINEAR_SINE: Real = 1e-5;
/// Threshold on the sine of the angle between two directions below which they
/// are considered collinear by the cap predicates (normalised coordinates).
#[cfg(feature = "f64")]
pub const COLLINEAR_SINE: Real = 1e-10;

/// Minimum positive in-circle determinant that triggers a Delaunay flip.
#[cfg(feature = "f32")]
pub const INCIRCLE_EPSILON: Real = 1e-6;
/// Minimum positive in-circle determinant that triggers a Delaunay flip.
#[cfg(feature = "f64")]
pub const INCIRCLE_EPSILON: Real = 1e-12;

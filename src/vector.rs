//! 3-vector helpers
//!
//! Plain `[f64; 3]` arithmetic used by the pose algebra and the vendor codecs,
//! plus a least-squares plane fit over point clouds.

use crate::{Result, StationError};
use nalgebra::DMatrix;

pub type Vec3 = [f64; 3];

/// Euclidean length
pub fn norm(v: Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Unit vector with the direction of `v`
///
/// Fails with `Input` on the zero vector, where the direction is undefined.
pub fn normalize3(v: Vec3) -> Result<Vec3> {
    let n = norm(v);
    if n < 1e-12 {
        return Err(StationError::Input(
            "Cannot normalize a zero-length vector".to_string(),
        ));
    }
    Ok(mult3(v, 1.0 / n))
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Angle between two vectors in radians
///
/// The cosine is clamped to [-1, 1] so parallel inputs never produce NaN.
/// Returns `Input` if either vector has zero length.
pub fn angle3(a: Vec3, b: Vec3) -> Result<f64> {
    let ua = normalize3(a)?;
    let ub = normalize3(b)?;
    Ok(dot(ua, ub).clamp(-1.0, 1.0).acos())
}

pub fn mult3(v: Vec3, k: f64) -> Vec3 {
    [v[0] * k, v[1] * k, v[2] * k]
}

pub fn add3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn subs3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Distance between two points
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    norm(subs3(a, b))
}

/// Least-squares plane through a point cloud
///
/// Returns `(centroid, unit_normal)`. The normal is the right singular vector of
/// the centred points with the smallest singular value. At least four points
/// are required.
pub fn fit_plane(points: &[Vec3]) -> Result<(Vec3, Vec3)> {
    if points.len() < 4 {
        return Err(StationError::Input(format!(
            "Plane fit needs at least 4 points, got {}",
            points.len()
        )));
    }

    let count = points.len() as f64;
    let centroid = points
        .iter()
        .fold([0.0; 3], |acc, p| add3(acc, *p));
    let centroid = mult3(centroid, 1.0 / count);

    let centred = DMatrix::from_fn(points.len(), 3, |row, col| {
        points[row][col] - centroid[col]
    });

    let svd = centred.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| StationError::Input("Plane fit SVD did not converge".to_string()))?;

    let (smallest, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .fold((0usize, f64::INFINITY), |best, (i, &s)| {
            if s < best.1 {
                (i, s)
            } else {
                best
            }
        });

    let normal = normalize3([v_t[(smallest, 0)], v_t[(smallest, 1)], v_t[(smallest, 2)]])?;
    Ok((centroid, normal))
}

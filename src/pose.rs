//! Homogeneous 4x4 pose
//!
//! The canonical representation of position (mm) and orientation used on the
//! wire and by every vendor codec. Rotations are right-handed active
//! transforms on column vectors; angles are in radians.

use crate::codecs::{pose_to_ur, ur_to_pose};
use crate::vector::{self, Vec3};
use crate::{Result, StationError};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, Mul};

/// Tolerance on `R·Rᵀ = I` for a pose to count as homogeneous
pub const HOMOGENEOUS_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    m: Matrix4<f64>,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            m: Matrix4::identity(),
        }
    }

    /// Pose from four rows
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self {
            m: Matrix4::from_row_slice(&flat),
        }
    }

    /// Pose from 16 values in column-major order (the wire layout)
    pub fn from_col_major(values: &[f64]) -> Result<Self> {
        if values.len() != 16 {
            return Err(StationError::Input(format!(
                "A pose needs 16 values, got {}",
                values.len()
            )));
        }
        Ok(Self {
            m: Matrix4::from_column_slice(values),
        })
    }

    /// The 16 values in column-major order
    pub fn to_col_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.m.as_slice());
        out
    }

    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.m[(r, c)];
            }
        }
        rows
    }

    /// Pure translation
    pub fn transl(x: f64, y: f64, z: f64) -> Self {
        let mut pose = Self::identity();
        pose.set_pos([x, y, z]);
        pose
    }

    /// Rotation about the X axis
    pub fn rotx(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Y axis
    pub fn roty(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self::from_rows([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Z axis
    pub fn rotz(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self::from_rows([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Classic Denavit-Hartenberg link transform: `rotz(rz)·transl(tx,0,tz)·rotx(rx)`
    pub fn dh(rz: f64, tx: f64, tz: f64, rx: f64) -> Self {
        Self::rotz(rz) * Self::transl(tx, 0.0, tz) * Self::rotx(rx)
    }

    /// Modified (Craig) Denavit-Hartenberg: `rotx(rx)·transl(tx,0,0)·rotz(rz)·transl(0,0,tz)`
    pub fn dhm(rx: f64, tx: f64, rz: f64, tz: f64) -> Self {
        Self::rotx(rx) * Self::transl(tx, 0.0, 0.0) * Self::rotz(rz) * Self::transl(0.0, 0.0, tz)
    }

    pub fn transpose(&self) -> Self {
        Self {
            m: self.m.transpose(),
        }
    }

    /// Rotation block orthonormal and bottom row `(0, 0, 0, 1)`
    pub fn is_homogeneous(&self) -> bool {
        let bottom_ok = (0..3).all(|c| self.m[(3, c)].abs() < 1e-12)
            && (self.m[(3, 3)] - 1.0).abs() < 1e-12;
        if !bottom_ok {
            return false;
        }

        let r = self.m.fixed_view::<3, 3>(0, 0);
        let rrt = r * r.transpose();
        (0..3).all(|i| {
            (0..3).all(|j| {
                let expected = if i == j { 1.0 } else { 0.0 };
                (rrt[(i, j)] - expected).abs() < HOMOGENEOUS_TOLERANCE
            })
        })
    }

    /// Inverse of a homogeneous pose: `R' = Rᵀ`, `t' = -Rᵀ·t`
    pub fn inv_h(&self) -> Result<Self> {
        if !self.is_homogeneous() {
            return Err(StationError::Input(
                "Pose is not homogeneous and cannot be inverted".to_string(),
            ));
        }

        let mut inv = Self::identity();
        for r in 0..3 {
            for c in 0..3 {
                inv.m[(r, c)] = self.m[(c, r)];
            }
        }
        let t = self.pos();
        for r in 0..3 {
            inv.m[(r, 3)] = -(0..3).map(|k| self.m[(k, r)] * t[k]).sum::<f64>();
        }
        Ok(inv)
    }

    /// Translation column
    pub fn pos(&self) -> Vec3 {
        [self.m[(0, 3)], self.m[(1, 3)], self.m[(2, 3)]]
    }

    pub fn vx(&self) -> Vec3 {
        self.column3(0)
    }

    pub fn vy(&self) -> Vec3 {
        self.column3(1)
    }

    pub fn vz(&self) -> Vec3 {
        self.column3(2)
    }

    pub fn set_pos(&mut self, pos: Vec3) {
        self.set_column3(3, pos);
    }

    /// Set the X axis column; the input is normalized
    pub fn set_vx(&mut self, v: Vec3) -> Result<()> {
        let unit = vector::normalize3(v)?;
        self.set_column3(0, unit);
        Ok(())
    }

    /// Set the Y axis column; the input is normalized
    pub fn set_vy(&mut self, v: Vec3) -> Result<()> {
        let unit = vector::normalize3(v)?;
        self.set_column3(1, unit);
        Ok(())
    }

    /// Set the Z axis column; the input is normalized
    pub fn set_vz(&mut self, v: Vec3) -> Result<()> {
        let unit = vector::normalize3(v)?;
        self.set_column3(2, unit);
        Ok(())
    }

    /// Geodesic angle of the rotation block, in radians
    pub fn angle(&self) -> f64 {
        let trace = self.m[(0, 0)] + self.m[(1, 1)] + self.m[(2, 2)];
        ((trace - 1.0) / 2.0).clamp(-1.0, 1.0).acos()
    }

    /// Same rotation with zero translation
    pub fn rotation_pose(&self) -> Self {
        let mut pose = *self;
        pose.set_pos([0.0; 3]);
        pose
    }

    /// Post-multiplied offset `self·transl(x,y,z)·rotx(rx)·roty(ry)·rotz(rz)`
    pub fn offset(&self, x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64) -> Self {
        *self * Self::transl(x, y, z) * Self::rotx(rx) * Self::roty(ry) * Self::rotz(rz)
    }

    /// Apply the full transform to a point
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let mut out = [0.0; 3];
        for (r, value) in out.iter_mut().enumerate() {
            *value = self.m[(r, 0)] * p[0]
                + self.m[(r, 1)] * p[1]
                + self.m[(r, 2)] * p[2]
                + self.m[(r, 3)];
        }
        out
    }

    /// Apply only the rotation to a direction vector
    pub fn rotate_vector(&self, v: Vec3) -> Vec3 {
        vector::subs3(self.transform_point(v), self.pos())
    }

    /// Element-wise comparison within `tol`
    pub fn approx_eq(&self, other: &Pose, tol: f64) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }

    fn column3(&self, c: usize) -> Vec3 {
        [self.m[(0, c)], self.m[(1, c)], self.m[(2, c)]]
    }

    fn set_column3(&mut self, c: usize, v: Vec3) {
        for (r, value) in v.iter().enumerate() {
            self.m[(r, c)] = *value;
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<(usize, usize)> for Pose {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.m[index]
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose { m: self.m * rhs.m }
    }
}

impl Mul<&Pose> for &Pose {
    type Output = Pose;

    fn mul(self, rhs: &Pose) -> Pose {
        Pose { m: self.m * rhs.m }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            writeln!(
                f,
                "[{:>12.6}, {:>12.6}, {:>12.6}, {:>12.6}]",
                row[0], row[1], row[2], row[3]
            )?;
        }
        Ok(())
    }
}

/// Subdivide the Cartesian move `from -> to` into steps no longer than `delta_mm`
///
/// The intermediate poses interpolate the delta pose `from⁻¹·to` linearly in
/// rotation-vector space. The result always ends at `to` and holds
/// `ceil(|Δpos| / delta_mm)` poses (at least one).
pub fn pose_split(from: &Pose, to: &Pose, delta_mm: f64) -> Result<Vec<Pose>> {
    if !(delta_mm > 0.0) {
        return Err(StationError::Input(format!(
            "Split step must be positive, got {}",
            delta_mm
        )));
    }

    let delta = from.inv_h()? * *to;
    let distance = vector::norm(delta.pos());
    if distance <= delta_mm {
        return Ok(vec![*to]);
    }

    let steps = (distance / delta_mm).ceil() as usize;
    let ur = pose_to_ur(&delta);
    let mut poses = Vec::with_capacity(steps);
    for i in 1..steps {
        let factor = i as f64 / steps as f64;
        let partial = ur.map(|v| v * factor);
        poses.push(*from * ur_to_pose(&partial));
    }
    poses.push(*to);
    Ok(poses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn sample_pose() -> Pose {
        Pose::transl(100.0, -50.0, 300.0) * Pose::rotz(0.3) * Pose::roty(-1.1) * Pose::rotx(2.4)
    }

    #[test]
    fn test_inverse_times_pose_is_identity() {
        let p = sample_pose();
        let product = p.inv_h().unwrap() * p;
        assert!(product.approx_eq(&Pose::identity(), 1e-9));
        let product = p * p.inv_h().unwrap();
        assert!(product.approx_eq(&Pose::identity(), 1e-9));
    }

    #[test]
    fn test_inverse_rejects_non_homogeneous() {
        let mut rows = Pose::identity().to_rows();
        rows[0][0] = 2.0;
        let p = Pose::from_rows(rows);
        assert!(!p.is_homogeneous());
        assert!(matches!(p.inv_h(), Err(StationError::Input(_))));

        let mut rows = Pose::identity().to_rows();
        rows[3][0] = 0.5;
        assert!(!Pose::from_rows(rows).is_homogeneous());
    }

    #[test]
    fn test_rotations_are_active() {
        let p = Pose::rotz(FRAC_PI_2).transform_point([1.0, 0.0, 0.0]);
        assert!((p[0]).abs() < 1e-12 && (p[1] - 1.0).abs() < 1e-12);

        let p = Pose::rotx(FRAC_PI_2).transform_point([0.0, 1.0, 0.0]);
        assert!((p[2] - 1.0).abs() < 1e-12);

        let p = Pose::roty(FRAC_PI_2).transform_point([0.0, 0.0, 1.0]);
        assert!((p[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_col_major_layout() {
        let p = Pose::transl(1.0, 2.0, 3.0);
        let values = p.to_col_major();
        assert_eq!(&values[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(values[15], 1.0);
        assert_eq!(Pose::from_col_major(&values).unwrap(), p);
        assert!(Pose::from_col_major(&values[..15]).is_err());
    }

    #[test]
    fn test_axis_setters_normalize() {
        let mut p = Pose::identity();
        p.set_vx([0.0, 3.0, 0.0]).unwrap();
        assert_eq!(p.vx(), [0.0, 1.0, 0.0]);
        assert!(p.set_vz([0.0, 0.0, 0.0]).is_err());
        p.set_pos([4.0, 5.0, 6.0]);
        assert_eq!(p.pos(), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_angle_is_clamped() {
        assert_eq!(Pose::identity().angle(), 0.0);
        assert!((Pose::rotx(PI).angle() - PI).abs() < 1e-12);
        assert!((Pose::roty(0.7).angle() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_dh_matches_composition() {
        let p = Pose::dh(0.4, 25.0, 400.0, -FRAC_PI_2);
        let expected = Pose::rotz(0.4) * Pose::transl(0.0, 0.0, 400.0)
            * Pose::transl(25.0, 0.0, 0.0)
            * Pose::rotx(-FRAC_PI_2);
        assert!(p.approx_eq(&expected, 1e-12));
        assert!(Pose::dhm(0.2, 10.0, 0.5, 30.0).is_homogeneous());
    }

    #[test]
    fn test_pose_split_steps() {
        let from = sample_pose();
        let to = from * Pose::transl(35.0, 0.0, 0.0) * Pose::rotz(0.5);
        let poses = pose_split(&from, &to, 10.0).unwrap();

        assert_eq!(poses.len(), 4);
        assert!(poses.last().unwrap().approx_eq(&to, 1e-12));

        let mut previous = from;
        for pose in &poses {
            let step = vector::distance(previous.pos(), pose.pos());
            assert!(step <= 10.0 + 1e-9, "step {} too long", step);
            previous = *pose;
        }
    }

    #[test]
    fn test_pose_split_short_move() {
        let from = Pose::identity();
        let to = Pose::transl(0.5, 0.0, 0.0);
        let poses = pose_split(&from, &to, 1.0).unwrap();
        assert_eq!(poses.len(), 1);
        assert!(pose_split(&from, &to, 0.0).is_err());
    }
}

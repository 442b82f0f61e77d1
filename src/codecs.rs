//! Vendor pose codecs
//!
//! Conversions between [`Pose`] and the flat position/orientation vectors used
//! by robot controllers and CAD tools. Positions are always millimetres.
//! Euler forms are in degrees, except `TxyzRxyz` and the UR rotation vector
//! which are in radians.

use crate::pose::Pose;
use crate::{Result, StationError};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

/// Distance of the critical matrix element from ±1 that counts as gimbal lock
pub const GIMBAL_TOLERANCE: f64 = 1e-10;

/// Rotation angles below this are treated as no rotation
const ANGLE_TOLERANCE: f64 = 1e-12;

fn translated(x: f64, y: f64, z: f64, rotation: Pose) -> Pose {
    Pose::transl(x, y, z) * rotation
}

fn head(pose: &Pose) -> [f64; 3] {
    pose.pos()
}

fn with_angles(pos: [f64; 3], angles: [f64; 3]) -> [f64; 6] {
    [pos[0], pos[1], pos[2], angles[0], angles[1], angles[2]]
}

fn deg(angles: [f64; 3]) -> [f64; 3] {
    angles.map(f64::to_degrees)
}

/// Angles `(a, b, c)` with `R = Rx(a)·Ry(b)·Rz(c)`
pub fn euler_xyz(pose: &Pose) -> [f64; 3] {
    let r02 = pose[(0, 2)];
    if (r02.abs() - 1.0).abs() < GIMBAL_TOLERANCE {
        let b = FRAC_PI_2.copysign(r02);
        let c = pose[(1, 0)].atan2(pose[(1, 1)]);
        return [0.0, b, c];
    }
    let b = r02.atan2((pose[(0, 0)].powi(2) + pose[(0, 1)].powi(2)).sqrt());
    let a = (-pose[(1, 2)]).atan2(pose[(2, 2)]);
    let c = (-pose[(0, 1)]).atan2(pose[(0, 0)]);
    [a, b, c]
}

/// Angles `(alpha, beta, gamma)` with `R = Rz(gamma)·Ry(beta)·Rx(alpha)`
pub fn euler_zyx(pose: &Pose) -> [f64; 3] {
    let r20 = pose[(2, 0)];
    if (r20 + 1.0).abs() < GIMBAL_TOLERANCE {
        let gamma = pose[(1, 2)].atan2(pose[(1, 1)]);
        return [0.0, FRAC_PI_2, gamma];
    }
    if (r20 - 1.0).abs() < GIMBAL_TOLERANCE {
        let gamma = (-pose[(1, 2)]).atan2(pose[(1, 1)]);
        return [0.0, -FRAC_PI_2, gamma];
    }
    let beta = (-r20).atan2((pose[(0, 0)].powi(2) + pose[(1, 0)].powi(2)).sqrt());
    let gamma = pose[(1, 0)].atan2(pose[(0, 0)]);
    let alpha = pose[(2, 1)].atan2(pose[(2, 2)]);
    [alpha, beta, gamma]
}

/// Angles `(a, b, c)` with `R = Rz(a)·Ry(b)·Rz(c)`
pub fn euler_zyz(pose: &Pose) -> [f64; 3] {
    let r22 = pose[(2, 2)];
    if (r22 - 1.0).abs() < GIMBAL_TOLERANCE {
        return [0.0, 0.0, pose[(1, 0)].atan2(pose[(0, 0)])];
    }
    if (r22 + 1.0).abs() < GIMBAL_TOLERANCE {
        return [0.0, PI, pose[(1, 0)].atan2(pose[(1, 1)])];
    }
    let b = (pose[(0, 2)].powi(2) + pose[(1, 2)].powi(2)).sqrt().atan2(r22);
    let a = pose[(1, 2)].atan2(pose[(0, 2)]);
    let c = pose[(2, 1)].atan2(-pose[(2, 0)]);
    [a, b, c]
}

/// Angles `(a, b, c)` with `R = Rz(a)·Rx(b)·Rz(c)`
pub fn euler_zxz(pose: &Pose) -> [f64; 3] {
    let r22 = pose[(2, 2)];
    if (r22 - 1.0).abs() < GIMBAL_TOLERANCE {
        return [0.0, 0.0, pose[(1, 0)].atan2(pose[(0, 0)])];
    }
    if (r22 + 1.0).abs() < GIMBAL_TOLERANCE {
        return [0.0, PI, (-pose[(0, 1)]).atan2(pose[(0, 0)])];
    }
    let b = (pose[(0, 2)].powi(2) + pose[(1, 2)].powi(2)).sqrt().atan2(r22);
    let a = pose[(0, 2)].atan2(-pose[(1, 2)]);
    let c = pose[(2, 0)].atan2(pose[(2, 1)]);
    [a, b, c]
}

/// `[x, y, z, rx, ry, rz]` in radians, `T·Rx·Ry·Rz`
pub fn pose_to_txyzrxyz(pose: &Pose) -> [f64; 6] {
    with_angles(head(pose), euler_xyz(pose))
}

pub fn txyzrxyz_to_pose(v: &[f64; 6]) -> Pose {
    translated(
        v[0],
        v[1],
        v[2],
        Pose::rotx(v[3]) * Pose::roty(v[4]) * Pose::rotz(v[5]),
    )
}

/// `[x, y, z, r, p, w]` in degrees, `T·Rz(w)·Ry(p)·Rx(r)`
pub fn pose_to_xyzrpw(pose: &Pose) -> [f64; 6] {
    with_angles(head(pose), deg(euler_zyx(pose)))
}

pub fn xyzrpw_to_pose(v: &[f64; 6]) -> Pose {
    translated(
        v[0],
        v[1],
        v[2],
        Pose::rotz(v[5].to_radians()) * Pose::roty(v[4].to_radians()) * Pose::rotx(v[3].to_radians()),
    )
}

/// KUKA `[x, y, z, A, B, C]` in degrees, `T·Rz(A)·Ry(B)·Rx(C)`
pub fn pose_to_kuka(pose: &Pose) -> [f64; 6] {
    let [alpha, beta, gamma] = deg(euler_zyx(pose));
    with_angles(head(pose), [gamma, beta, alpha])
}

pub fn kuka_to_pose(v: &[f64; 6]) -> Pose {
    xyzrpw_to_pose(&[v[0], v[1], v[2], v[5], v[4], v[3]])
}

/// Nachi `[x, y, z, rz, ry, rx]` in degrees, `T·Rx(rx)·Ry(ry)·Rz(rz)`
pub fn pose_to_nachi(pose: &Pose) -> [f64; 6] {
    let [a, b, c] = deg(euler_xyz(pose));
    with_angles(head(pose), [c, b, a])
}

pub fn nachi_to_pose(v: &[f64; 6]) -> Pose {
    staubli_to_pose(&[v[0], v[1], v[2], v[5], v[4], v[3]])
}

/// Staubli `[x, y, z, rx, ry, rz]` in degrees, `T·Rx·Ry·Rz`
pub fn pose_to_staubli(pose: &Pose) -> [f64; 6] {
    with_angles(head(pose), deg(euler_xyz(pose)))
}

pub fn staubli_to_pose(v: &[f64; 6]) -> Pose {
    let r = [v[3], v[4], v[5]].map(f64::to_radians);
    txyzrxyz_to_pose(&[v[0], v[1], v[2], r[0], r[1], r[2]])
}

/// Adept and Comau `[x, y, z, r, p, w]` in degrees, `T·Rz(r)·Ry(p)·Rz(w)`
pub fn pose_to_adept(pose: &Pose) -> [f64; 6] {
    with_angles(head(pose), deg(euler_zyz(pose)))
}

pub fn adept_to_pose(v: &[f64; 6]) -> Pose {
    translated(
        v[0],
        v[1],
        v[2],
        Pose::rotz(v[3].to_radians()) * Pose::roty(v[4].to_radians()) * Pose::rotz(v[5].to_radians()),
    )
}

/// Catia and SolidWorks `[x, y, z, a, b, c]` in degrees, `T·Rz(a)·Rx(b)·Rz(c)`
pub fn pose_to_catia(pose: &Pose) -> [f64; 6] {
    with_angles(head(pose), deg(euler_zxz(pose)))
}

pub fn catia_to_pose(v: &[f64; 6]) -> Pose {
    translated(
        v[0],
        v[1],
        v[2],
        Pose::rotz(v[3].to_radians()) * Pose::rotx(v[4].to_radians()) * Pose::rotz(v[5].to_radians()),
    )
}

/// Unit quaternion `(w, x, y, z)` of the rotation block with `w >= 0`
///
/// Uses the largest of the trace and the diagonal as pivot, which keeps the
/// 180 degree case stable.
pub fn pose_to_quaternion(pose: &Pose) -> [f64; 4] {
    let (r00, r11, r22) = (pose[(0, 0)], pose[(1, 1)], pose[(2, 2)]);
    let trace = r00 + r11 + r22;

    let q = if trace > r00 && trace > r11 && trace > r22 {
        let s = (trace + 1.0).sqrt() * 2.0;
        [
            s / 4.0,
            (pose[(2, 1)] - pose[(1, 2)]) / s,
            (pose[(0, 2)] - pose[(2, 0)]) / s,
            (pose[(1, 0)] - pose[(0, 1)]) / s,
        ]
    } else if r00 >= r11 && r00 >= r22 {
        let s = (1.0 + r00 - r11 - r22).sqrt() * 2.0;
        [
            (pose[(2, 1)] - pose[(1, 2)]) / s,
            s / 4.0,
            (pose[(0, 1)] + pose[(1, 0)]) / s,
            (pose[(0, 2)] + pose[(2, 0)]) / s,
        ]
    } else if r11 >= r22 {
        let s = (1.0 + r11 - r00 - r22).sqrt() * 2.0;
        [
            (pose[(0, 2)] - pose[(2, 0)]) / s,
            (pose[(0, 1)] + pose[(1, 0)]) / s,
            s / 4.0,
            (pose[(1, 2)] + pose[(2, 1)]) / s,
        ]
    } else {
        let s = (1.0 + r22 - r00 - r11).sqrt() * 2.0;
        [
            (pose[(1, 0)] - pose[(0, 1)]) / s,
            (pose[(0, 2)] + pose[(2, 0)]) / s,
            (pose[(1, 2)] + pose[(2, 1)]) / s,
            s / 4.0,
        ]
    };

    let sign = if q[0] < 0.0 { -1.0 } else { 1.0 };
    let n = q.iter().map(|v| v * v).sum::<f64>().sqrt();
    q.map(|v| sign * v / n)
}

/// Rotation from a quaternion `(w, x, y, z)`; the input is normalized first
pub fn quaternion_to_rotation(q: &[f64; 4]) -> Result<Pose> {
    let n = q.iter().map(|v| v * v).sum::<f64>().sqrt();
    if n < ANGLE_TOLERANCE {
        return Err(StationError::Input(
            "Cannot build a rotation from a zero quaternion".to_string(),
        ));
    }
    let [w, x, y, z] = q.map(|v| v / n);

    Ok(Pose::from_rows([
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
            0.0,
        ],
        [
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
            0.0,
        ],
        [
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
            0.0,
        ],
        [0.0, 0.0, 0.0, 1.0],
    ]))
}

/// ABB `[x, y, z, q1, q2, q3, q4]` with `(q1..q4) = (w, x, y, z)`
pub fn pose_to_abb(pose: &Pose) -> [f64; 7] {
    let p = pose.pos();
    let q = pose_to_quaternion(pose);
    [p[0], p[1], p[2], q[0], q[1], q[2], q[3]]
}

pub fn abb_to_pose(v: &[f64; 7]) -> Result<Pose> {
    let rotation = quaternion_to_rotation(&[v[3], v[4], v[5], v[6]])?;
    Ok(translated(v[0], v[1], v[2], rotation))
}

/// Rotation vector (axis times angle, radians) of the rotation block
pub fn rotation_vector(pose: &Pose) -> [f64; 3] {
    let theta = pose.angle();
    if theta < ANGLE_TOLERANCE {
        return [0.0; 3];
    }

    let v = [
        pose[(2, 1)] - pose[(1, 2)],
        pose[(0, 2)] - pose[(2, 0)],
        pose[(1, 0)] - pose[(0, 1)],
    ];

    let axis = if theta > 0.75 * PI {
        // The antisymmetric part vanishes near pi: recover the axis from the
        // symmetric part pivoting on the largest diagonal
        let cos = theta.cos();
        let one_minus_cos = 1.0 - cos;
        let sym = |i: usize, j: usize| (pose[(i, j)] + pose[(j, i)]) / 2.0;
        let k = (0..3)
            .max_by(|&a, &b| sym(a, a).total_cmp(&sym(b, b)))
            .unwrap_or(0);

        let nk = ((sym(k, k) - cos) / one_minus_cos).max(0.0).sqrt();
        let mut axis = [0.0; 3];
        for (j, value) in axis.iter_mut().enumerate() {
            *value = if j == k {
                nk
            } else {
                sym(k, j) / (one_minus_cos * nk)
            };
        }
        let dir = axis[0] * v[0] + axis[1] * v[1] + axis[2] * v[2];
        if dir < 0.0 {
            axis.map(|a| -a)
        } else {
            axis
        }
    } else {
        let s = 2.0 * theta.sin();
        v.map(|c| c / s)
    };

    axis.map(|a| a * theta)
}

/// Rodrigues rotation from a rotation vector (radians)
pub fn rotation_from_vector(rv: &[f64; 3]) -> Pose {
    let theta = (rv[0] * rv[0] + rv[1] * rv[1] + rv[2] * rv[2]).sqrt();
    if theta < ANGLE_TOLERANCE {
        return Pose::identity();
    }
    let [x, y, z] = rv.map(|c| c / theta);
    let (s, c) = theta.sin_cos();
    let t = 1.0 - c;

    Pose::from_rows([
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s, 0.0],
        [y * x * t + z * s, c + y * y * t, y * z * t - x * s, 0.0],
        [z * x * t - y * s, z * y * t + x * s, c + z * z * t, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Universal Robots `[x, y, z, ux, uy, uz]`, rotation vector in radians
pub fn pose_to_ur(pose: &Pose) -> [f64; 6] {
    with_angles(head(pose), rotation_vector(pose))
}

pub fn ur_to_pose(v: &[f64; 6]) -> Pose {
    translated(v[0], v[1], v[2], rotation_from_vector(&[v[3], v[4], v[5]]))
}

/// Named pose representation, used to pick a codec at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseFormat {
    TxyzRxyz,
    Xyzrpw,
    Kuka,
    Motoman,
    Fanuc,
    Nachi,
    Staubli,
    Adept,
    Comau,
    Catia,
    SolidWorks,
    Abb,
    Ur,
}

impl PoseFormat {
    pub const ALL: [PoseFormat; 13] = [
        PoseFormat::TxyzRxyz,
        PoseFormat::Xyzrpw,
        PoseFormat::Kuka,
        PoseFormat::Motoman,
        PoseFormat::Fanuc,
        PoseFormat::Nachi,
        PoseFormat::Staubli,
        PoseFormat::Adept,
        PoseFormat::Comau,
        PoseFormat::Catia,
        PoseFormat::SolidWorks,
        PoseFormat::Abb,
        PoseFormat::Ur,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PoseFormat::TxyzRxyz => "txyzrxyz",
            PoseFormat::Xyzrpw => "xyzrpw",
            PoseFormat::Kuka => "kuka",
            PoseFormat::Motoman => "motoman",
            PoseFormat::Fanuc => "fanuc",
            PoseFormat::Nachi => "nachi",
            PoseFormat::Staubli => "staubli",
            PoseFormat::Adept => "adept",
            PoseFormat::Comau => "comau",
            PoseFormat::Catia => "catia",
            PoseFormat::SolidWorks => "solidworks",
            PoseFormat::Abb => "abb",
            PoseFormat::Ur => "ur",
        }
    }

    /// Number of values in the external form
    pub fn len(&self) -> usize {
        match self {
            PoseFormat::Abb => 7,
            _ => 6,
        }
    }

    /// Flat vector for this format
    pub fn encode(&self, pose: &Pose) -> Vec<f64> {
        match self {
            PoseFormat::TxyzRxyz => pose_to_txyzrxyz(pose).to_vec(),
            PoseFormat::Xyzrpw | PoseFormat::Motoman | PoseFormat::Fanuc => {
                pose_to_xyzrpw(pose).to_vec()
            }
            PoseFormat::Kuka => pose_to_kuka(pose).to_vec(),
            PoseFormat::Nachi => pose_to_nachi(pose).to_vec(),
            PoseFormat::Staubli => pose_to_staubli(pose).to_vec(),
            PoseFormat::Adept | PoseFormat::Comau => pose_to_adept(pose).to_vec(),
            PoseFormat::Catia | PoseFormat::SolidWorks => pose_to_catia(pose).to_vec(),
            PoseFormat::Abb => pose_to_abb(pose).to_vec(),
            PoseFormat::Ur => pose_to_ur(pose).to_vec(),
        }
    }

    /// Pose from a flat vector of exactly [`PoseFormat::len`] values
    pub fn decode(&self, values: &[f64]) -> Result<Pose> {
        if values.len() != self.len() {
            return Err(StationError::Input(format!(
                "Format {} needs {} values, got {}",
                self.name(),
                self.len(),
                values.len()
            )));
        }

        let six = || {
            let mut v = [0.0; 6];
            v.copy_from_slice(values);
            v
        };
        match self {
            PoseFormat::Abb => {
                let mut v = [0.0; 7];
                v.copy_from_slice(values);
                abb_to_pose(&v)
            }
            PoseFormat::TxyzRxyz => Ok(txyzrxyz_to_pose(&six())),
            PoseFormat::Xyzrpw | PoseFormat::Motoman | PoseFormat::Fanuc => {
                Ok(xyzrpw_to_pose(&six()))
            }
            PoseFormat::Kuka => Ok(kuka_to_pose(&six())),
            PoseFormat::Nachi => Ok(nachi_to_pose(&six())),
            PoseFormat::Staubli => Ok(staubli_to_pose(&six())),
            PoseFormat::Adept | PoseFormat::Comau => Ok(adept_to_pose(&six())),
            PoseFormat::Catia | PoseFormat::SolidWorks => Ok(catia_to_pose(&six())),
            PoseFormat::Ur => Ok(ur_to_pose(&six())),
        }
    }
}

impl fmt::Display for PoseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PoseFormat {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        PoseFormat::ALL
            .into_iter()
            .find(|format| format.name() == wanted)
            .ok_or_else(|| StationError::Input(format!("Unknown pose format: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic_pose() -> Pose {
        Pose::transl(450.0, -120.5, 730.25) * Pose::rotz(0.8) * Pose::roty(-0.4) * Pose::rotx(1.9)
    }

    #[test]
    fn test_translation_to_ur() {
        let p = Pose::transl(10.0, 20.0, 30.0);
        let ur = pose_to_ur(&p);
        let expected = [10.0, 20.0, 30.0, 0.0, 0.0, 0.0];
        for (a, b) in ur.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12, "got {:?}", ur);
        }
        assert!(ur_to_pose(&ur).approx_eq(&p, 1e-12));
    }

    #[test]
    fn test_every_format_round_trips() {
        let p = generic_pose();
        for format in PoseFormat::ALL {
            let encoded = format.encode(&p);
            assert_eq!(encoded.len(), format.len());
            let decoded = format.decode(&encoded).unwrap();
            assert!(decoded.approx_eq(&p, 1e-9), "{} did not round-trip", format);
        }
    }

    #[test]
    fn test_kuka_angle_order() {
        let p = Pose::transl(1.0, 2.0, 3.0) * Pose::rotz(FRAC_PI_2);
        let kuka = pose_to_kuka(&p);
        assert!((kuka[3] - 90.0).abs() < 1e-9);
        assert!(kuka[4].abs() < 1e-9 && kuka[5].abs() < 1e-9);

        let xyzrpw = pose_to_xyzrpw(&p);
        assert!((xyzrpw[5] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_pure_translation_has_zero_angles() {
        let p = Pose::transl(-5.0, 7.0, 9.0);
        for format in PoseFormat::ALL {
            if format == PoseFormat::Abb {
                continue;
            }
            let encoded = format.encode(&p);
            assert!(
                encoded[3..].iter().all(|a| a.abs() < 1e-12),
                "{} gave {:?}",
                format,
                encoded
            );
        }
        assert_eq!(pose_to_quaternion(&p), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_half_turn_quaternion() {
        let axis = [1.0, 2.0, 3.0];
        let n = (14.0f64).sqrt();
        let rv = axis.map(|a| a / n * PI);
        let p = translated(1.0, 2.0, 3.0, rotation_from_vector(&rv));

        let q = pose_to_quaternion(&p);
        assert!(q[0].abs() < 1e-9, "w = {}", q[0]);
        for (qi, ai) in q[1..].iter().zip(axis.iter()) {
            assert!((qi.abs() - ai / n).abs() < 1e-9);
        }

        let back = abb_to_pose(&pose_to_abb(&p)).unwrap();
        assert!(back.approx_eq(&p, 1e-9));
    }

    #[test]
    fn test_rotation_vector_near_half_turn() {
        for angle in [PI, PI - 1e-3, 0.8 * PI] {
            let rv = [0.0, -angle, 0.0];
            let p = ur_to_pose(&[0.0, 0.0, 0.0, rv[0], rv[1], rv[2]]);
            let back = ur_to_pose(&pose_to_ur(&p));
            assert!(back.approx_eq(&p, 1e-9), "angle {} did not round-trip", angle);
            assert!((crate::vector::norm(rotation_vector(&p)) - angle).abs() < 1e-7);
        }
    }

    #[test]
    fn test_zyx_gimbal_lock() {
        let p = Pose::rotz(0.3) * Pose::roty(FRAC_PI_2) * Pose::rotx(0.5);
        let encoded = pose_to_xyzrpw(&p);
        assert_eq!(encoded[3], 0.0);
        assert!((encoded[4] - 90.0).abs() < 1e-9);
        assert!(xyzrpw_to_pose(&encoded).approx_eq(&p, 1e-9));

        let p = Pose::rotz(-0.7) * Pose::roty(-FRAC_PI_2) * Pose::rotx(0.2);
        let encoded = pose_to_kuka(&p);
        assert_eq!(encoded[5], 0.0);
        assert!(kuka_to_pose(&encoded).approx_eq(&p, 1e-9));
    }

    #[test]
    fn test_xyz_and_zyz_gimbal_lock() {
        let p = Pose::rotx(0.4) * Pose::roty(FRAC_PI_2) * Pose::rotz(0.1);
        let encoded = pose_to_staubli(&p);
        assert_eq!(encoded[3], 0.0);
        assert!(staubli_to_pose(&encoded).approx_eq(&p, 1e-9));

        let p = Pose::rotz(0.6) * Pose::roty(PI) * Pose::rotz(0.2);
        let encoded = pose_to_adept(&p);
        assert_eq!(encoded[3], 0.0);
        assert!(adept_to_pose(&encoded).approx_eq(&p, 1e-9));

        let p = Pose::rotz(0.6) * Pose::rotz(0.2);
        let encoded = pose_to_catia(&p);
        assert!((encoded[5] - 0.8f64.to_degrees()).abs() < 1e-9);
        assert!(catia_to_pose(&encoded).approx_eq(&p, 1e-9));
    }

    #[test]
    fn test_decode_checks_length() {
        assert!(matches!(
            PoseFormat::Ur.decode(&[1.0, 2.0]),
            Err(StationError::Input(_))
        ));
        assert!(PoseFormat::Abb.decode(&[0.0; 7]).is_err());
        assert_eq!("KUKA".parse::<PoseFormat>().unwrap(), PoseFormat::Kuka);
        assert!("unknown".parse::<PoseFormat>().is_err());
    }
}

//! Simulated devices: spray guns, 2D cameras and measurement systems

use crate::item::Item;
use crate::matrix::Mat;
use crate::pose::Pose;
use crate::session::{Session, TimeoutClass};
use crate::Result;
use serde::Serialize;

/// Spray gun state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprayState {
    Off = 0,
    On = 1,
}

/// Selects every spray gun
pub const ALL_SPRAY_GUNS: i32 = -1;

/// Statistics reported by a spray gun
#[derive(Debug, Clone, PartialEq)]
pub struct SprayStats {
    pub info: String,
    pub data: Mat,
}

/// One reading of a stereo measurement system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StereoMeasurement {
    pub first: Pose,
    pub second: Pose,
    pub first_points: i32,
    pub second_points: i32,
    /// Milliseconds since the system started
    pub time_ms: i32,
    /// 0 when both poses were measured
    pub status: i32,
}

impl Session {
    /// Add a spray gun between `tool` and `object`; returns its id
    ///
    /// `parameters` is a free-form option string such as
    /// `"ELLYPSE PROJECT PARTICLE=SPHERE(4,8,1,1,0.5)"`. Empty matrices use
    /// the server defaults.
    pub fn spray_add(
        &self,
        tool: Option<&Item>,
        object: Option<&Item>,
        parameters: &str,
        points: &Mat,
        geometry: &Mat,
    ) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("Gun_Add");
            ex.send_opt_item(tool);
            ex.send_opt_item(object);
            ex.send_line(parameters);
            ex.send_matrix(points)?;
            ex.send_matrix(geometry)?;
            ex.rec_int()
        })
    }

    pub fn spray_set_state(&self, gun: i32, state: SprayState) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("Gun_SetState");
            ex.send_int(gun);
            ex.send_int(state as i32);
            ex.rec_int()
        })
    }

    pub fn spray_stats(&self, gun: i32) -> Result<SprayStats> {
        self.call(|ex| {
            ex.send_line("Gun_Stats");
            ex.send_int(gun);
            let info = ex.rec_line()?.replace("<br>", "\t");
            let data = ex.rec_matrix()?;
            Ok(SprayStats { info, data })
        })
    }

    /// Remove spray guns and the particles they deposited
    pub fn spray_clear(&self, gun: i32) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("Gun_Clear");
            ex.send_int(gun);
            ex.rec_int()
        })
    }

    /// Attach a 2D camera view to `frame`; returns the camera item
    pub fn cam2d_add(&self, frame: &Item, parameters: &str) -> Result<Item> {
        frame.require_valid()?;
        self.call(|ex| {
            ex.send_line("Cam2D_Add");
            ex.send_item(frame);
            ex.send_line(parameters);
            ex.rec_item()
        })
    }

    /// Save a snapshot of `camera` to `path`; true on success
    pub fn cam2d_snapshot(&self, path: &str, camera: &Item) -> Result<bool> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("Cam2D_Snapshot");
            ex.send_item(camera);
            ex.send_line(path);
            Ok(ex.rec_int()? > 0)
        })
    }

    /// Close one camera, or all of them with `None`
    pub fn cam2d_close(&self, camera: Option<&Item>) -> Result<bool> {
        self.call(|ex| {
            ex.send_line("Cam2D_Close");
            ex.send_opt_item(camera);
            Ok(ex.rec_int()? > 0)
        })
    }

    pub fn cam2d_set_params(&self, parameters: &str, camera: Option<&Item>) -> Result<bool> {
        self.call(|ex| {
            ex.send_line("Cam2D_SetParams");
            ex.send_opt_item(camera);
            ex.send_line(parameters);
            Ok(ex.rec_int()? > 0)
        })
    }

    pub fn stereo_measure(&self) -> Result<StereoMeasurement> {
        self.call(|ex| {
            ex.send_line("MeasurePose");
            Ok(StereoMeasurement {
                first: ex.rec_pose()?,
                second: ex.rec_pose()?,
                first_points: ex.rec_int()?,
                second_points: ex.rec_int()?,
                time_ms: ex.rec_int()?,
                status: ex.rec_int()?,
            })
        })
    }

    /// Laser tracker reading near `estimate`; `None` when nothing was measured
    pub fn laser_tracker_measure(&self, estimate: [f64; 3], search: bool) -> Result<Option<[f64; 3]>> {
        let values = self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("MeasLT2");
            ex.send_xyz(&estimate);
            ex.send_bool(search);
            ex.rec_array()
        })?;
        if values.len() < 3 {
            return Ok(None);
        }
        Ok(Some([values[0], values[1], values[2]]))
    }
}

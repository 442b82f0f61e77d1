//! Station-level operations
//!
//! Thin wrappers on [`Session`] for everything that is not addressed to a
//! single item: lookup, adding and removing items, collision settings,
//! station parameters, batch pose and joint updates, geometry and
//! calibration. Batch calls check their argument counts before anything is
//! sent.

use crate::item::{require_all_valid, send_item_list, Item, ItemType};
use crate::matrix::Mat;
use crate::pose::Pose;
use crate::session::{wire_count, Session, TimeoutClass};
use crate::{Result, StationError};
use serde::Serialize;
use tracing::debug;

/// How programs are handled when they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Simulate = 1,
    QuickValidate = 2,
    MakeRobotProg = 3,
    MakeRobotProgAndUpload = 4,
    MakeRobotProgAndStart = 5,
    RunRobot = 6,
}

impl RunMode {
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(RunMode::Simulate),
            2 => Ok(RunMode::QuickValidate),
            3 => Ok(RunMode::MakeRobotProg),
            4 => Ok(RunMode::MakeRobotProgAndUpload),
            5 => Ok(RunMode::MakeRobotProgAndStart),
            6 => Ok(RunMode::RunRobot),
            other => Err(StationError::Generic(format!("Unknown run mode {}", other))),
        }
    }
}

/// Main window state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Hidden = -1,
    Show = 0,
    Minimized = 1,
    Normal = 2,
    Maximized = 3,
    Fullscreen = 4,
    Cinema = 5,
    FullscreenCinema = 6,
    Video = 7,
}

/// How points are projected onto an object surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    None = 0,
    Closest = 1,
    AlongNormal = 2,
    AlongNormalRecalc = 3,
    ClosestRecalc = 4,
    Recalc = 5,
}

/// Value of a station parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(f64),
    Bytes(Vec<u8>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        ParamValue::Bytes(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerVersion {
    pub application: String,
    pub bits: i32,
    pub version: String,
    pub build_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    pub name: String,
    pub id: String,
}

/// Pair of objects (and link ids) checked for collisions
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPair {
    pub first: Item,
    pub second: Item,
    pub first_link: i32,
    pub second_link: i32,
}

impl CollisionPair {
    pub fn new(first: &Item, second: &Item) -> Self {
        Self {
            first: first.clone(),
            second: second.clone(),
            first_link: 0,
            second_link: 0,
        }
    }
}

/// Result of a tool (TCP) calibration
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCalibration {
    pub tcp: Vec<f64>,
    /// Mean, standard deviation and maximum error
    pub stats: Vec<f64>,
    /// Per-point errors
    pub errors: Mat,
}

/// Result of a reference frame calibration
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCalibration {
    pub pose: Pose,
    pub stats: Vec<f64>,
}

/// Options for docking an external window into the main window
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOptions {
    /// Title of the docked panel; the window name when `None`
    pub docked_name: Option<String>,
    pub size: Option<(i32, i32)>,
    pub pid: u32,
    pub area_add: i32,
    pub area_allowed: i32,
    /// Milliseconds to wait for the window to appear
    pub timeout_ms: i32,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            docked_name: None,
            size: None,
            pid: 0,
            area_add: 1,
            area_allowed: 15,
            timeout_ms: 500,
        }
    }
}

/// Prefix of a reply naming a parameter the server does not know
const UNKNOWN_PARAM_PREFIX: &str = "UNKNOWN";

fn check_parity(what: &str, left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(StationError::Input(format!(
            "{}: {} items but {} values",
            what, left, right
        )));
    }
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl Session {
    // Lookup

    /// Item by name, optionally restricted to a type; invalid when not found
    pub fn item(&self, name: &str, kind: Option<ItemType>) -> Result<Item> {
        self.call(|ex| {
            match kind {
                Some(kind) => {
                    ex.send_line("G_Item2");
                    ex.send_line(name);
                    ex.send_int(kind.code());
                }
                None => {
                    ex.send_line("G_Item");
                    ex.send_line(name);
                }
            }
            ex.rec_item()
        })
    }

    /// Names of all items, optionally of one type
    pub fn item_names(&self, kind: Option<ItemType>) -> Result<Vec<String>> {
        self.call(|ex| {
            match kind {
                Some(kind) => {
                    ex.send_line("G_List_Items_Type");
                    ex.send_int(kind.code());
                }
                None => ex.send_line("G_List_Items"),
            }
            ex.rec_line_list()
        })
    }

    /// All items, optionally of one type
    pub fn items(&self, kind: Option<ItemType>) -> Result<Vec<Item>> {
        self.call(|ex| {
            match kind {
                Some(kind) => {
                    ex.send_line("G_List_Items_Type_ptr");
                    ex.send_int(kind.code());
                }
                None => ex.send_line("G_List_Items_ptr"),
            }
            ex.rec_item_list()
        })
    }

    /// Let the user pick an item; invalid when cancelled
    pub fn pick_item(&self, prompt: &str, kind: Option<ItemType>) -> Result<Item> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("PickItem");
            ex.send_line(prompt);
            ex.send_int(kind.map_or(-1, |k| k.code()));
            ex.rec_item()
        })
    }

    /// Let the user pick one of `choices`; invalid when cancelled
    pub fn pick_item_from(&self, prompt: &str, choices: &[Item]) -> Result<Item> {
        require_all_valid(choices)?;
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("PickItemList");
            ex.send_line(prompt);
            send_item_list(ex, choices)?;
            ex.rec_item()
        })
    }

    // Server control

    pub fn version(&self) -> Result<ServerVersion> {
        self.call(|ex| {
            ex.send_line("Version");
            Ok(ServerVersion {
                application: ex.rec_line()?,
                bits: ex.rec_int()?,
                version: ex.rec_line()?,
                build_date: ex.rec_line()?,
            })
        })
    }

    fn simple(&self, command: &str) -> Result<()> {
        self.call(|ex| {
            ex.send_line(command);
            Ok(())
        })
    }

    /// Bring the main window to the front
    pub fn show(&self) -> Result<()> {
        self.simple("RAISE")
    }

    pub fn hide(&self) -> Result<()> {
        self.simple("HIDE")
    }

    /// Close the Station Host; the connection is dropped afterwards
    pub fn quit(&self) -> Result<()> {
        self.simple("QUIT")?;
        self.close_transport();
        Ok(())
    }

    pub fn set_window_state(&self, state: WindowState) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_WindowState");
            ex.send_int(state as i32);
            Ok(())
        })
    }

    pub fn license(&self) -> Result<License> {
        self.call(|ex| {
            ex.send_line("G_License2");
            Ok(License {
                name: ex.rec_line()?,
                id: ex.rec_line()?,
            })
        })
    }

    // Stations

    pub fn add_station(&self, name: &str) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("NewStation");
            ex.send_line(name);
            ex.rec_item()
        })
    }

    /// Close the active station without saving
    pub fn close_station(&self) -> Result<()> {
        self.simple("RemoveStn")
    }

    pub fn open_stations(&self) -> Result<Vec<Item>> {
        self.call(|ex| {
            ex.send_line("G_AllStn");
            ex.rec_item_list()
        })
    }

    pub fn active_station(&self) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("G_ActiveStn");
            ex.rec_item()
        })
    }

    pub fn set_active_station(&self, station: &Item) -> Result<()> {
        station.require_valid()?;
        self.call(|ex| {
            ex.send_line("S_ActiveStn");
            ex.send_item(station);
            Ok(())
        })
    }

    /// Save an item, or the active station when `None`
    pub fn save(&self, path: &str, item: Option<&Item>) -> Result<()> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("Save");
            ex.send_line(path);
            ex.send_opt_item(item);
            Ok(())
        })
    }

    // Adding and removing items

    /// Copy an item to the clipboard
    pub fn copy(&self, item: &Item) -> Result<()> {
        item.require_valid()?;
        self.call(|ex| {
            ex.send_line("Copy");
            ex.send_item(item);
            Ok(())
        })
    }

    /// Paste the clipboard under `parent` (the station when `None`)
    pub fn paste(&self, parent: Option<&Item>) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("Paste");
            ex.send_opt_item(parent);
            ex.rec_item()
        })
    }

    /// Load a file (station, robot, tool, object...) under `parent`
    pub fn add_file(&self, path: &str, parent: Option<&Item>) -> Result<Item> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("Add");
            ex.send_line(path);
            ex.send_opt_item(parent);
            ex.rec_item()
        })
    }

    pub fn add_target(&self, name: &str, parent: Option<&Item>, robot: Option<&Item>) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("Add_TARGET");
            ex.send_line(name);
            ex.send_opt_item(parent);
            ex.send_opt_item(robot);
            ex.rec_item()
        })
    }

    pub fn add_frame(&self, name: &str, parent: Option<&Item>) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("Add_FRAME");
            ex.send_line(name);
            ex.send_opt_item(parent);
            ex.rec_item()
        })
    }

    pub fn add_program(&self, name: &str, robot: Option<&Item>) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("Add_PROG");
            ex.send_line(name);
            ex.send_opt_item(robot);
            ex.rec_item()
        })
    }

    pub fn add_machining_project(&self, name: &str, robot: Option<&Item>) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("Add_MACHINING");
            ex.send_line(name);
            ex.send_opt_item(robot);
            ex.rec_item()
        })
    }

    /// Delete several items in one transaction; the handles become invalid
    pub fn delete_items(&self, items: &mut [Item]) -> Result<()> {
        require_all_valid(items)?;
        if items.is_empty() {
            return Ok(());
        }
        self.call(|ex| {
            ex.send_line("RemoveLst");
            send_item_list(ex, items)
        })?;
        items.iter_mut().for_each(Item::invalidate);
        Ok(())
    }

    // Rendering

    /// Turn rendering on after every change, or only on demand
    pub fn render(&self, always: bool) -> Result<()> {
        self.call(|ex| {
            ex.send_line("Render");
            ex.send_bool(!always);
            Ok(())
        })
    }

    /// Refresh the screen and internal state once
    pub fn refresh(&self) -> Result<()> {
        self.call(|ex| {
            ex.send_line("Refresh");
            ex.send_int(0);
            Ok(())
        })
    }

    pub fn view_pose(&self) -> Result<Pose> {
        self.call(|ex| {
            ex.send_line("G_ViewPose");
            ex.rec_pose()
        })
    }

    pub fn set_view_pose(&self, pose: &Pose) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_ViewPose");
            ex.send_pose(pose);
            Ok(())
        })
    }

    pub fn selection(&self) -> Result<Vec<Item>> {
        self.call(|ex| {
            ex.send_line("G_Selection");
            ex.rec_item_list()
        })
    }

    pub fn set_selection(&self, items: &[Item]) -> Result<()> {
        require_all_valid(items)?;
        self.call(|ex| {
            ex.send_line("S_Selection");
            send_item_list(ex, items)
        })
    }

    // Collisions

    /// True if `inner` lies completely inside `outer`
    pub fn is_inside(&self, inner: &Item, outer: &Item) -> Result<bool> {
        inner.require_valid()?;
        outer.require_valid()?;
        self.call(|ex| {
            ex.send_line("IsInside");
            ex.send_item(inner);
            ex.send_item(outer);
            Ok(ex.rec_int()? > 0)
        })
    }

    /// Switch collision checking on or off; returns the number of collisions
    pub fn set_collision_active(&self, active: bool) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("Collision_SetState");
            ex.send_bool(active);
            ex.rec_int()
        })
    }

    pub fn set_collision_active_pair(&self, active: bool, pair: &CollisionPair) -> Result<bool> {
        pair.first.require_valid()?;
        pair.second.require_valid()?;
        self.call(|ex| {
            ex.send_line("Collision_SetPair");
            ex.send_item(&pair.first);
            ex.send_item(&pair.second);
            ex.send_int(pair.first_link);
            ex.send_int(pair.second_link);
            ex.send_bool(active);
            Ok(ex.rec_int()? > 0)
        })
    }

    /// Set collision checking for many pairs; `states` pairs up with `pairs`
    pub fn set_collision_active_pairs(&self, states: &[bool], pairs: &[CollisionPair]) -> Result<bool> {
        check_parity("Collision pair list", pairs.len(), states.len())?;
        for pair in pairs {
            pair.first.require_valid()?;
            pair.second.require_valid()?;
        }
        let n = wire_count(pairs.len())?;
        self.call(|ex| {
            ex.send_line("Collision_SetPairList");
            ex.send_int(n);
            for (pair, state) in pairs.iter().zip(states) {
                ex.send_item(&pair.first);
                ex.send_item(&pair.second);
                ex.send_int(pair.first_link);
                ex.send_int(pair.second_link);
                ex.send_bool(*state);
            }
            Ok(ex.rec_int()? > 0)
        })
    }

    /// Number of pairs currently in collision
    pub fn collisions(&self) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("Collisions");
            ex.rec_int()
        })
    }

    pub fn collision(&self, first: &Item, second: &Item) -> Result<bool> {
        first.require_valid()?;
        second.require_valid()?;
        self.call(|ex| {
            ex.send_line("Collided");
            ex.send_item(first);
            ex.send_item(second);
            Ok(ex.rec_int()? > 0)
        })
    }

    /// Pairs currently in collision
    pub fn collision_pairs(&self) -> Result<Vec<CollisionPair>> {
        self.call(|ex| {
            ex.send_line("Collision_Pairs");
            let n = ex.rec_count()?;
            let mut pairs = Vec::with_capacity(n);
            for _ in 0..n {
                let first = ex.rec_item()?;
                let second = ex.rec_item()?;
                let first_link = ex.rec_int()?;
                let second_link = ex.rec_int()?;
                pairs.push(CollisionPair {
                    first,
                    second,
                    first_link,
                    second_link,
                });
            }
            Ok(pairs)
        })
    }

    /// First object hit by the segment `p1 -> p2`, with the hit point
    ///
    /// The item is invalid when nothing is hit.
    pub fn collision_line(&self, p1: [f64; 3], p2: [f64; 3]) -> Result<(Item, [f64; 3])> {
        self.call(|ex| {
            ex.send_line("CollisionLine");
            ex.send_xyz(&p1);
            ex.send_xyz(&p2);
            let item = ex.rec_item()?;
            let point = ex.rec_xyz()?;
            Ok((item, point))
        })
    }

    // Simulation

    /// Simulation speed as a multiple of real time
    pub fn set_simulation_speed(&self, speed: f64) -> Result<()> {
        self.call(|ex| {
            ex.send_line("SimulateSpeed");
            ex.send_real_int(speed * 1000.0)?;
            Ok(())
        })
    }

    pub fn simulation_speed(&self) -> Result<f64> {
        self.call(|ex| {
            ex.send_line("GetSimulateSpeed");
            Ok(f64::from(ex.rec_int()?) / 1000.0)
        })
    }

    pub fn set_run_mode(&self, mode: RunMode) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_RunMode");
            ex.send_int(mode as i32);
            Ok(())
        })
    }

    pub fn run_mode(&self) -> Result<RunMode> {
        let code = self.call(|ex| {
            ex.send_line("G_RunMode");
            ex.rec_int()
        })?;
        RunMode::from_code(code)
    }

    /// Run a program by name, or a function call when `is_function_call`
    pub fn run_code(&self, code: &str, is_function_call: bool) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("RunCode");
            ex.send_bool(is_function_call);
            ex.send_line(code);
            ex.rec_int()
        })
    }

    /// Show a message or comment in the program being generated
    pub fn run_message(&self, message: &str, is_comment: bool) -> Result<()> {
        self.call(|ex| {
            ex.send_line("RunMessage");
            ex.send_bool(is_comment);
            ex.send_line(message);
            Ok(())
        })
    }

    /// Show a message: a blocking popup, or the status bar
    pub fn show_message(&self, message: &str, popup: bool) -> Result<()> {
        if popup {
            self.transact(TimeoutClass::Indefinite, |ex| {
                ex.send_line("ShowMessage");
                ex.send_line(message);
                Ok(())
            })
        } else {
            self.call(|ex| {
                ex.send_line("ShowMessageStatus");
                ex.send_line(message);
                Ok(())
            })
        }
    }

    /// Start a new program in the program generator
    pub fn program_start(
        &self,
        name: &str,
        defaults_folder: &str,
        extension: &str,
        robot: Option<&Item>,
    ) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("ProgramStart");
            ex.send_line(name);
            ex.send_line(defaults_folder);
            ex.send_line(extension);
            ex.send_opt_item(robot);
            ex.rec_int()
        })
    }

    // Parameters and commands

    /// All station parameters as `(name, value)`
    pub fn params(&self) -> Result<Vec<(String, String)>> {
        self.call(|ex| {
            ex.send_line("G_Params");
            let n = ex.rec_count()?;
            (0..n)
                .map(|_| -> Result<(String, String)> { Ok((ex.rec_line()?, ex.rec_line()?)) })
                .collect()
        })
    }

    /// Station parameter; `None` when the server does not know it
    pub fn param(&self, name: &str) -> Result<Option<String>> {
        let value = self.call(|ex| {
            ex.send_line("G_Param");
            ex.send_line(name);
            ex.rec_line()
        })?;
        if value.starts_with(UNKNOWN_PARAM_PREFIX) {
            debug!("Station parameter {} is not set", name);
            return Ok(None);
        }
        Ok(Some(value))
    }

    pub fn set_param(&self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        match value.into() {
            ParamValue::Bytes(data) => self.set_param_bytes(name, &data),
            ParamValue::Text(text) => self.set_param_text(name, &text),
            ParamValue::Number(n) => self.set_param_text(name, &format_number(n)),
        }
    }

    fn set_param_text(&self, name: &str, value: &str) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_Param");
            ex.send_line(name);
            ex.send_line(value);
            Ok(())
        })
    }

    pub fn param_bytes(&self, name: &str) -> Result<Vec<u8>> {
        self.call(|ex| {
            ex.send_line("G_DataParam");
            ex.send_line(name);
            ex.rec_bytes()
        })
    }

    pub fn set_param_bytes(&self, name: &str, data: &[u8]) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_DataParam");
            ex.send_line(name);
            ex.send_bytes(data)?;
            Ok(())
        })
    }

    /// Generic string command; returns the server's reply
    pub fn command(&self, command: &str, value: &str) -> Result<String> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("SCMD");
            ex.send_line(command);
            ex.send_line(value);
            ex.rec_line()
        })
    }

    pub fn plugin_load(&self, name: &str) -> Result<String> {
        self.command("PluginLoad", name)
    }

    pub fn plugin_unload(&self, name: &str) -> Result<String> {
        self.command("PluginUnload", name)
    }

    pub fn plugin_command(&self, plugin: &str, command: &str, value: &str) -> Result<String> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("PluginCommand");
            ex.send_line(plugin);
            ex.send_line(command);
            ex.send_line(value);
            ex.rec_line()
        })
    }

    /// Dock an external window; true when it was found
    pub fn embed_window(&self, window_name: &str, options: &EmbedOptions) -> Result<bool> {
        let (width, height) = options.size.unwrap_or((-1, -1));
        let docked = options.docked_name.as_deref().unwrap_or(window_name);
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("WinProcDock");
            ex.send_line(docked);
            ex.send_line(window_name);
            ex.send_array(&[f64::from(width), f64::from(height)])?;
            ex.send_line(&options.pid.to_string());
            ex.send_int(options.area_allowed);
            ex.send_int(options.area_add);
            ex.send_int(options.timeout_ms);
            Ok(ex.rec_int()? > 0)
        })
    }

    // Batches

    /// Set the relative pose of many items at once
    pub fn set_poses(&self, items: &[Item], poses: &[Pose]) -> Result<()> {
        self.set_poses_with("S_Hlocals", items, poses)
    }

    /// Set the absolute pose of many items at once
    pub fn set_poses_abs(&self, items: &[Item], poses: &[Pose]) -> Result<()> {
        self.set_poses_with("S_Hlocal_AbsS", items, poses)
    }

    fn set_poses_with(&self, command: &str, items: &[Item], poses: &[Pose]) -> Result<()> {
        check_parity("Pose list", items.len(), poses.len())?;
        require_all_valid(items)?;
        let n = wire_count(items.len())?;
        self.call(|ex| {
            ex.send_line(command);
            ex.send_int(n);
            for (item, pose) in items.iter().zip(poses) {
                ex.send_item(item);
                ex.send_pose(pose);
            }
            Ok(())
        })
    }

    /// Current joints of many robots
    pub fn joints_list(&self, robots: &[Item]) -> Result<Vec<Vec<f64>>> {
        require_all_valid(robots)?;
        self.call(|ex| {
            ex.send_line("G_ThetasList");
            send_item_list(ex, robots)?;
            (0..robots.len()).map(|_| ex.rec_array()).collect()
        })
    }

    pub fn set_joints_list(&self, robots: &[Item], joints: &[Vec<f64>]) -> Result<()> {
        check_parity("Joint list", robots.len(), joints.len())?;
        require_all_valid(robots)?;
        let n = wire_count(robots.len())?;
        self.call(|ex| {
            ex.send_line("S_ThetasList");
            ex.send_int(n);
            for (robot, values) in robots.iter().zip(joints) {
                ex.send_item(robot);
                ex.send_array(values)?;
            }
            Ok(())
        })
    }

    // Geometry

    /// Add a triangle mesh (3xN points, N multiple of 3) as an object or into `add_to`
    pub fn add_shape(&self, triangles: &Mat, add_to: Option<&Item>, override_shapes: bool) -> Result<Item> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("AddShape2");
            ex.send_matrix(triangles)?;
            ex.send_opt_item(add_to);
            ex.send_bool(override_shapes);
            ex.rec_item()
        })
    }

    /// Add a curve (one point per column) relative to `reference`
    pub fn add_curve(
        &self,
        points: &Mat,
        reference: Option<&Item>,
        add_to_reference: bool,
        projection: Projection,
    ) -> Result<Item> {
        self.add_point_set("AddWire", points, reference, add_to_reference, projection)
    }

    /// Add a point cloud (one point per column) relative to `reference`
    pub fn add_points(
        &self,
        points: &Mat,
        reference: Option<&Item>,
        add_to_reference: bool,
        projection: Projection,
    ) -> Result<Item> {
        self.add_point_set("AddPoints", points, reference, add_to_reference, projection)
    }

    fn add_point_set(
        &self,
        command: &str,
        points: &Mat,
        reference: Option<&Item>,
        add_to_reference: bool,
        projection: Projection,
    ) -> Result<Item> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line(command);
            ex.send_matrix(points)?;
            ex.send_opt_item(reference);
            ex.send_bool(add_to_reference);
            ex.send_int(projection as i32);
            ex.rec_item()
        })
    }

    /// Project points onto the surface of `object`
    pub fn project_points(&self, points: &Mat, object: &Item, projection: Projection) -> Result<Mat> {
        object.require_valid()?;
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("ProjectPoints");
            ex.send_matrix(points)?;
            ex.send_item(object);
            ex.send_int(projection as i32);
            ex.rec_matrix()
        })
    }

    // Calibration

    /// Calibrate a TCP from robot poses or joints (one per column)
    pub fn calibrate_tool(
        &self,
        measurements: &Mat,
        format: i32,
        algorithm: i32,
        robot: Option<&Item>,
        tool: Option<&Item>,
    ) -> Result<ToolCalibration> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("CalibTCP3");
            ex.send_matrix(measurements)?;
            ex.send_int(format);
            ex.send_int(algorithm);
            ex.send_opt_item(robot);
            ex.send_opt_item(tool);
            let tcp = ex.rec_array()?;
            let stats = ex.rec_array()?;
            let errors = ex.rec_matrix()?;
            Ok(ToolCalibration { tcp, stats, errors })
        })
    }

    /// Calibrate a reference frame from measured points or robot joints
    pub fn calibrate_reference(
        &self,
        measurements: &Mat,
        method: i32,
        use_joints: bool,
        robot: Option<&Item>,
    ) -> Result<FrameCalibration> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("CalibFrame");
            ex.send_matrix(measurements)?;
            ex.send_int(if use_joints { -1 } else { 0 });
            ex.send_int(method);
            ex.send_opt_item(robot);
            let pose = ex.rec_pose()?;
            let stats = ex.rec_array()?;
            Ok(FrameCalibration { pose, stats })
        })
    }
}

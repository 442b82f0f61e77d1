//! Item handles
//!
//! An [`Item`] is the triple `(session, ptr, type)` naming an object that
//! lives in the Station Host: a robot, frame, tool, target, program and so
//! on. The client keeps no other state; every method is one transaction.
//! A handle with `ptr == 0` is invalid and fails before touching the wire.

use crate::pose::Pose;
use crate::session::{wire_count, Exchange, Session, TimeoutClass};
use crate::{Result, StationError};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of a station item as numbered by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Any,
    Station,
    Robot,
    Frame,
    Tool,
    Object,
    Target,
    Curve,
    Program,
    Instruction,
    PythonProgram,
    Machining,
    Ballbar,
    CalibProject,
    Iso9283,
    Folder,
    RobotArm,
    Camera,
    Generic,
    RobotAxes,
    Notes,
    Unknown(i32),
}

impl ItemType {
    pub fn code(&self) -> i32 {
        match self {
            ItemType::Any => -1,
            ItemType::Station => 1,
            ItemType::Robot => 2,
            ItemType::Frame => 3,
            ItemType::Tool => 4,
            ItemType::Object => 5,
            ItemType::Target => 6,
            ItemType::Curve => 7,
            ItemType::Program => 8,
            ItemType::Instruction => 9,
            ItemType::PythonProgram => 10,
            ItemType::Machining => 11,
            ItemType::Ballbar => 12,
            ItemType::CalibProject => 13,
            ItemType::Iso9283 => 14,
            ItemType::Folder => 17,
            ItemType::RobotArm => 18,
            ItemType::Camera => 19,
            ItemType::Generic => 20,
            ItemType::RobotAxes => 21,
            ItemType::Notes => 22,
            ItemType::Unknown(code) => *code,
        }
    }
}

impl From<i32> for ItemType {
    fn from(code: i32) -> Self {
        match code {
            -1 => ItemType::Any,
            1 => ItemType::Station,
            2 => ItemType::Robot,
            3 => ItemType::Frame,
            4 => ItemType::Tool,
            5 => ItemType::Object,
            6 => ItemType::Target,
            7 => ItemType::Curve,
            8 => ItemType::Program,
            9 => ItemType::Instruction,
            10 => ItemType::PythonProgram,
            11 => ItemType::Machining,
            12 => ItemType::Ballbar,
            13 => ItemType::CalibProject,
            14 => ItemType::Iso9283,
            17 => ItemType::Folder,
            18 => ItemType::RobotArm,
            19 => ItemType::Camera,
            20 => ItemType::Generic,
            21 => ItemType::RobotAxes,
            22 => ItemType::Notes,
            other => ItemType::Unknown(other),
        }
    }
}

/// Interpolation of a robot move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    Joint = 1,
    Linear = 2,
    Circular = 3,
}

/// Goal of a move: joints, a Cartesian pose or a target item
#[derive(Debug, Clone)]
pub enum MoveTarget {
    Joints(Vec<f64>),
    Pose(Pose),
    Item(Item),
}

impl From<Pose> for MoveTarget {
    fn from(pose: Pose) -> Self {
        MoveTarget::Pose(pose)
    }
}

impl From<Vec<f64>> for MoveTarget {
    fn from(joints: Vec<f64>) -> Self {
        MoveTarget::Joints(joints)
    }
}

impl From<&[f64]> for MoveTarget {
    fn from(joints: &[f64]) -> Self {
        MoveTarget::Joints(joints.to_vec())
    }
}

impl From<Item> for MoveTarget {
    fn from(item: Item) -> Self {
        MoveTarget::Item(item)
    }
}

impl From<&Item> for MoveTarget {
    fn from(item: &Item) -> Self {
        MoveTarget::Item(item.clone())
    }
}

impl MoveTarget {
    /// Tagged target: tag, array, item
    fn send(&self, ex: &mut Exchange<'_>) -> Result<()> {
        match self {
            MoveTarget::Joints(joints) => {
                ex.send_int(1);
                ex.send_array(joints)?;
                ex.send_ptr(0);
            }
            MoveTarget::Pose(pose) => {
                ex.send_int(2);
                ex.send_array(&pose.to_col_major())?;
                ex.send_ptr(0);
            }
            MoveTarget::Item(item) => {
                item.require_valid()?;
                ex.send_int(3);
                ex.send_array(&[])?;
                ex.send_item(item);
            }
        }
        Ok(())
    }
}

/// Joint limits of a robot
#[derive(Debug, Clone, PartialEq)]
pub struct JointLimits {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Joint type code reported by the server
    pub joint_type: f64,
}

/// Robot speeds and accelerations; negative entries are left unchanged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speeds {
    /// mm/s
    pub linear: f64,
    /// deg/s
    pub joints: f64,
    /// mm/s²
    pub linear_accel: f64,
    /// deg/s²
    pub joints_accel: f64,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            linear: -1.0,
            joints: -1.0,
            linear_accel: -1.0,
            joints_accel: -1.0,
        }
    }
}

/// Connection state of a robot driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotLinkState {
    pub state: i32,
    pub message: String,
}

/// Handle on a server-owned object
#[derive(Clone)]
pub struct Item {
    session: Session,
    ptr: u64,
    kind: ItemType,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.hash(state);
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("ptr", &format_args!("{:#x}", self.ptr))
            .field("kind", &self.kind)
            .finish()
    }
}

impl Item {
    pub fn new(session: Session, ptr: u64, kind: ItemType) -> Self {
        Self { session, ptr, kind }
    }

    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Type cached when the handle was received
    pub fn kind(&self) -> ItemType {
        self.kind
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// False for the null handle; says nothing about server-side deletion
    pub fn valid(&self) -> bool {
        self.ptr != 0
    }

    /// Same server object driven through another session
    pub fn with_session(&self, session: &Session) -> Item {
        Item {
            session: session.clone(),
            ptr: self.ptr,
            kind: self.kind,
        }
    }

    /// Turn the handle into the null handle
    pub(crate) fn invalidate(&mut self) {
        self.ptr = 0;
    }

    pub(crate) fn require_valid(&self) -> Result<()> {
        if self.ptr == 0 {
            return Err(StationError::InvalidItem(
                "Operation on an invalid item handle".to_string(),
            ));
        }
        Ok(())
    }

    /// One transaction on this item under the short timeout
    pub(crate) fn call<T>(&self, op: impl FnOnce(&mut Exchange<'_>) -> Result<T>) -> Result<T> {
        self.transact(TimeoutClass::Short, op)
    }

    pub(crate) fn transact<T>(
        &self,
        timeout: TimeoutClass,
        op: impl FnOnce(&mut Exchange<'_>) -> Result<T>,
    ) -> Result<T> {
        self.require_valid()?;
        self.session.transact(timeout, op)
    }

    fn get_pose(&self, command: &str) -> Result<Pose> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.rec_pose()
        })
    }

    /// Setters that send the item before the pose
    fn set_pose_item_first(&self, command: &str, pose: &Pose) -> Result<()> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.send_pose(pose);
            Ok(())
        })
    }

    /// Setters that send the pose before the item
    fn set_pose_item_last(&self, command: &str, pose: &Pose) -> Result<()> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_pose(pose);
            ex.send_item(self);
            Ok(())
        })
    }

    fn get_array(&self, command: &str) -> Result<Vec<f64>> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.rec_array()
        })
    }

    fn get_int(&self, command: &str) -> Result<i32> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.rec_int()
        })
    }

    fn send_simple(&self, command: &str) -> Result<()> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            Ok(())
        })
    }

    fn with_other(&self, command: &str, other: Option<&Item>) -> Result<()> {
        if let Some(other) = other {
            other.require_valid()?;
        }
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.send_opt_item(other);
            Ok(())
        })
    }

    // Tree and identity

    /// Current type as reported by the server
    pub fn fetch_type(&self) -> Result<ItemType> {
        self.get_int("G_Item_Type").map(ItemType::from)
    }

    pub fn name(&self) -> Result<String> {
        self.call(|ex| {
            ex.send_line("G_Name");
            ex.send_item(self);
            ex.rec_line()
        })
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_Name");
            ex.send_item(self);
            ex.send_line(name);
            Ok(())
        })
    }

    pub fn parent(&self) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("G_Parent");
            ex.send_item(self);
            ex.rec_item()
        })
    }

    pub fn children(&self) -> Result<Vec<Item>> {
        self.call(|ex| {
            ex.send_line("G_Childs");
            ex.send_item(self);
            ex.rec_item_list()
        })
    }

    /// Move under `parent` keeping the relative pose
    pub fn set_parent(&self, parent: &Item) -> Result<()> {
        self.with_other("S_Parent", Some(parent))
    }

    /// Move under `parent` keeping the absolute pose
    pub fn set_parent_static(&self, parent: &Item) -> Result<()> {
        self.with_other("S_Parent_Static", Some(parent))
    }

    /// Attach the closest object to this tool; the reply may be invalid
    pub fn attach_closest(&self) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("Attach_Closest");
            ex.send_item(self);
            ex.rec_item()
        })
    }

    /// Detach the closest attached object, optionally into `parent`
    pub fn detach_closest(&self, parent: Option<&Item>) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("Detach_Closest");
            ex.send_item(self);
            ex.send_opt_item(parent);
            ex.rec_item()
        })
    }

    pub fn detach_all(&self, parent: Option<&Item>) -> Result<()> {
        self.with_other("Detach_All", parent)
    }

    pub fn visible(&self) -> Result<bool> {
        self.get_int("G_Visible").map(|v| v != 0)
    }

    /// Show or hide the item; `frame_mask` of `None` leaves the frame display as is
    pub fn set_visible(&self, visible: bool, frame_mask: Option<i32>) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_Visible");
            ex.send_item(self);
            ex.send_bool(visible);
            ex.send_int(frame_mask.unwrap_or(-1));
            Ok(())
        })
    }

    /// Delete the server object and invalidate this handle
    pub fn delete(&mut self) -> Result<()> {
        self.send_simple("Remove")?;
        self.invalidate();
        Ok(())
    }

    /// Save the item (station, robot, object...) to a file
    pub fn save(&self, path: &str) -> Result<()> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("Save");
            ex.send_line(path);
            ex.send_item(self);
            Ok(())
        })
    }

    /// Item-specific string command
    pub fn command(&self, command: &str, value: &str) -> Result<String> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("ICMD");
            ex.send_item(self);
            ex.send_line(command);
            ex.send_line(value);
            ex.rec_line()
        })
    }

    // Poses

    /// Pose relative to the parent
    pub fn pose(&self) -> Result<Pose> {
        self.get_pose("G_Hlocal")
    }

    pub fn set_pose(&self, pose: &Pose) -> Result<()> {
        self.set_pose_item_first("S_Hlocal", pose)
    }

    /// Pose relative to the station
    pub fn pose_abs(&self) -> Result<Pose> {
        self.get_pose("G_Hlocal_Abs")
    }

    pub fn set_pose_abs(&self, pose: &Pose) -> Result<()> {
        self.set_pose_item_first("S_Hlocal_Abs", pose)
    }

    /// Pose of the geometry relative to the item frame
    pub fn geometry_pose(&self) -> Result<Pose> {
        self.get_pose("G_Hgeom")
    }

    pub fn set_geometry_pose(&self, pose: &Pose) -> Result<()> {
        self.set_pose_item_first("S_Hgeom", pose)
    }

    // Appearance

    /// RGBA in [0, 1]
    pub fn color(&self) -> Result<[f64; 4]> {
        let values = self.get_array("G_Color")?;
        if values.len() < 4 {
            return Err(StationError::Generic(format!(
                "Expected 4 color channels, got {}",
                values.len()
            )));
        }
        Ok([values[0], values[1], values[2], values[3]])
    }

    pub fn set_color(&self, rgba: [f64; 4]) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_Color");
            ex.send_item(self);
            ex.send_array(&rgba)?;
            Ok(())
        })
    }

    /// Replace `from` (every color when `None`) with `to` within `tolerance`
    pub fn recolor(&self, to: [f64; 4], from: Option<[f64; 4]>, tolerance: f64) -> Result<()> {
        let (from, tolerance) = match from {
            Some(from) => (from, tolerance),
            None => ([0.0; 4], 2.0),
        };
        let mut values = vec![tolerance];
        values.extend_from_slice(&to);
        values.extend_from_slice(&from);
        self.call(|ex| {
            ex.send_line("Recolor");
            ex.send_item(self);
            ex.send_array(&values)?;
            Ok(())
        })
    }

    /// Scale the geometry per axis
    pub fn scale(&self, factors: [f64; 3]) -> Result<()> {
        self.call(|ex| {
            ex.send_line("Scale");
            ex.send_item(self);
            ex.send_array(&factors)?;
            Ok(())
        })
    }

    // Targets

    pub fn set_as_cartesian_target(&self) -> Result<()> {
        self.send_simple("S_Target_As_RT")
    }

    pub fn set_as_joint_target(&self) -> Result<()> {
        self.send_simple("S_Target_As_JT")
    }

    pub fn is_joint_target(&self) -> Result<bool> {
        self.get_int("Target_Is_JT").map(|v| v > 0)
    }

    // Robot joints and kinematics

    /// Current joints of a robot, or the joints of a target
    pub fn joints(&self) -> Result<Vec<f64>> {
        self.get_array("G_Thetas")
    }

    pub fn set_joints(&self, joints: &[f64]) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_Thetas");
            ex.send_array(joints)?;
            ex.send_item(self);
            Ok(())
        })
    }

    pub fn joints_home(&self) -> Result<Vec<f64>> {
        self.get_array("G_Home")
    }

    pub fn set_joints_home(&self, joints: &[f64]) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_Home");
            ex.send_array(joints)?;
            ex.send_item(self);
            Ok(())
        })
    }

    /// Pose of every link for the given joints (current joints when empty)
    pub fn joint_poses(&self, joints: &[f64]) -> Result<Vec<Pose>> {
        self.call(|ex| {
            ex.send_line("G_LinkPoses");
            ex.send_item(self);
            ex.send_array(joints)?;
            let n = ex.rec_count()?;
            (0..n).map(|_| ex.rec_pose()).collect()
        })
    }

    /// Geometry object of a robot link
    pub fn object_link(&self, link_id: i32) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("G_LinkObjId");
            ex.send_item(self);
            ex.send_int(link_id);
            ex.rec_item()
        })
    }

    /// Item linked to this robot of the given type (controller, tool...)
    pub fn linked(&self, kind: ItemType) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("G_LinkType");
            ex.send_item(self);
            ex.send_int(kind.code());
            ex.rec_item()
        })
    }

    pub fn joint_limits(&self) -> Result<JointLimits> {
        self.call(|ex| {
            ex.send_line("G_RobLimits");
            ex.send_item(self);
            let lower = ex.rec_array()?;
            let upper = ex.rec_array()?;
            let joint_type = f64::from(ex.rec_int()?) / 1000.0;
            Ok(JointLimits {
                lower,
                upper,
                joint_type,
            })
        })
    }

    pub fn set_joint_limits(&self, lower: &[f64], upper: &[f64]) -> Result<()> {
        if lower.len() != upper.len() {
            return Err(StationError::Input(format!(
                "Joint limits differ in length: {} lower, {} upper",
                lower.len(),
                upper.len()
            )));
        }
        self.call(|ex| {
            ex.send_line("S_RobLimits");
            ex.send_item(self);
            ex.send_array(lower)?;
            ex.send_array(upper)?;
            Ok(())
        })
    }

    /// Robot used by this program or target
    pub fn set_robot(&self, robot: Option<&Item>) -> Result<()> {
        self.with_other("S_Robot", robot)
    }

    /// Add an empty tool to this robot
    pub fn add_tool(&self, tool_pose: &Pose, name: &str) -> Result<Item> {
        self.call(|ex| {
            ex.send_line("AddToolEmpty");
            ex.send_item(self);
            ex.send_pose(tool_pose);
            ex.send_line(name);
            ex.rec_item()
        })
    }

    /// Active TCP of a robot
    pub fn pose_tool(&self) -> Result<Pose> {
        self.get_pose("G_Tool")
    }

    pub fn set_pose_tool(&self, pose: &Pose) -> Result<()> {
        self.set_pose_item_last("S_Tool", pose)
    }

    /// Make `tool` the active tool of this robot
    pub fn set_tool(&self, tool: &Item) -> Result<()> {
        tool.require_valid()?;
        self.call(|ex| {
            ex.send_line("S_Tool_ptr");
            ex.send_item(tool);
            ex.send_item(self);
            Ok(())
        })
    }

    /// Active reference frame of a robot
    pub fn pose_frame(&self) -> Result<Pose> {
        self.get_pose("G_Frame")
    }

    pub fn set_pose_frame(&self, pose: &Pose) -> Result<()> {
        self.set_pose_item_last("S_Frame", pose)
    }

    /// Make `frame` the active reference of this robot
    pub fn set_frame(&self, frame: &Item) -> Result<()> {
        frame.require_valid()?;
        self.call(|ex| {
            ex.send_line("S_Frame_ptr");
            ex.send_item(frame);
            ex.send_item(self);
            Ok(())
        })
    }

    /// Flange pose for the given joints
    pub fn solve_fk(&self, joints: &[f64]) -> Result<Pose> {
        self.call(|ex| {
            ex.send_line("G_FK");
            ex.send_array(joints)?;
            ex.send_item(self);
            ex.rec_pose()
        })
    }

    /// Configuration flags (rear/front, elbow, wrist) for the given joints
    pub fn joints_config(&self, joints: &[f64]) -> Result<Vec<f64>> {
        self.call(|ex| {
            ex.send_line("G_Thetas_Config");
            ex.send_array(joints)?;
            ex.send_item(self);
            ex.rec_array()
        })
    }

    /// Joints reaching `pose`; empty when unreachable
    ///
    /// With `approx` the solution closest to those joints is returned.
    pub fn solve_ik(&self, pose: &Pose, approx: Option<&[f64]>) -> Result<Vec<f64>> {
        self.call(|ex| {
            match approx {
                Some(joints) => {
                    ex.send_line("G_IK_jnts");
                    ex.send_pose(pose);
                    ex.send_array(joints)?;
                }
                None => {
                    ex.send_line("G_IK");
                    ex.send_pose(pose);
                }
            }
            ex.send_item(self);
            ex.rec_array()
        })
    }

    /// Every IK solution, one per column
    pub fn solve_ik_all(&self, pose: &Pose) -> Result<Vec<Vec<f64>>> {
        self.call(|ex| {
            ex.send_line("G_IK_cmpl");
            ex.send_pose(pose);
            ex.send_item(self);
            Ok(ex.rec_matrix()?.columns())
        })
    }

    /// Pose and joints after applying the robot's accuracy filter
    pub fn filter_target(&self, pose: &Pose, approx: &[f64]) -> Result<(Pose, Vec<f64>)> {
        self.call(|ex| {
            ex.send_line("FilterTarget");
            ex.send_pose(pose);
            ex.send_array(approx)?;
            ex.send_item(self);
            let filtered = ex.rec_pose()?;
            let joints = ex.rec_array()?;
            Ok((filtered, joints))
        })
    }

    // Robot driver link

    /// Connect the real robot driver; returns the server's connection status
    pub fn connect_robot(&self, address: &str) -> Result<i32> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("Connect2");
            ex.send_item(self);
            ex.send_line(address);
            ex.rec_int()
        })
    }

    pub fn connected_state(&self) -> Result<RobotLinkState> {
        self.call(|ex| {
            ex.send_line("ConnectedState");
            ex.send_item(self);
            let state = ex.rec_int()?;
            let message = ex.rec_line()?;
            Ok(RobotLinkState { state, message })
        })
    }

    pub fn disconnect_robot(&self) -> Result<bool> {
        self.get_int("Disconnect").map(|v| v > 0)
    }

    // Motion

    /// Joint move; with `blocking` waits for the move to finish
    pub fn move_j(&self, target: impl Into<MoveTarget>, blocking: bool) -> Result<()> {
        self.move_x(MoveType::Joint, &target.into(), blocking)
    }

    /// Linear move; with `blocking` waits for the move to finish
    pub fn move_l(&self, target: impl Into<MoveTarget>, blocking: bool) -> Result<()> {
        self.move_x(MoveType::Linear, &target.into(), blocking)
    }

    fn move_x(&self, kind: MoveType, target: &MoveTarget, blocking: bool) -> Result<()> {
        self.call(|ex| {
            ex.send_line(if blocking { "MoveXb" } else { "MoveX" });
            ex.send_int(kind as i32);
            target.send(ex)?;
            ex.send_item(self);
            if blocking {
                ex.check_status()?;
                ex.promote(TimeoutClass::Long)?;
            }
            Ok(())
        })
    }

    /// Circular move through `via` ending at `end`
    pub fn move_c(
        &self,
        via: impl Into<MoveTarget>,
        end: impl Into<MoveTarget>,
        blocking: bool,
    ) -> Result<()> {
        let (via, end) = (via.into(), end.into());
        self.call(|ex| {
            ex.send_line(if blocking { "MoveCb" } else { "MoveC" });
            ex.send_int(MoveType::Circular as i32);
            via.send(ex)?;
            end.send(ex)?;
            ex.send_item(self);
            if blocking {
                ex.check_status()?;
                ex.promote(TimeoutClass::Long)?;
            }
            Ok(())
        })
    }

    /// Check a joint move for collisions; 0 means collision free
    pub fn move_j_test(&self, from: &[f64], to: &[f64], min_step_deg: f64) -> Result<i32> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("CollisionMove");
            ex.send_item(self);
            ex.send_array(from)?;
            ex.send_array(to)?;
            ex.send_real_int(min_step_deg * 1000.0)?;
            ex.rec_int()
        })
    }

    /// Check a linear move for collisions; 0 means collision free
    pub fn move_l_test(&self, from: &[f64], to: &Pose, min_step_mm: f64) -> Result<i32> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("CollisionMoveL");
            ex.send_item(self);
            ex.send_array(from)?;
            ex.send_array(&to.to_col_major())?;
            ex.send_real_int(min_step_mm * 1000.0)?;
            ex.rec_int()
        })
    }

    pub fn set_speed(&self, speeds: Speeds) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_Speed4");
            ex.send_item(self);
            ex.send_array(&[
                speeds.linear,
                speeds.joints,
                speeds.linear_accel,
                speeds.joints_accel,
            ])?;
            Ok(())
        })
    }

    /// Blending radius in mm; negative means fine positioning
    pub fn set_rounding(&self, radius_mm: f64) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_ZoneData");
            ex.send_real_int(radius_mm * 1000.0)?;
            ex.send_item(self);
            Ok(())
        })
    }

    pub fn busy(&self) -> Result<bool> {
        self.get_int("IsBusy").map(|v| v > 0)
    }

    pub fn stop(&self) -> Result<()> {
        self.send_simple("Stop")
    }

    /// Block until the robot finishes its current move
    pub fn wait_move(&self) -> Result<()> {
        self.call(|ex| {
            ex.send_line("WaitMove");
            ex.send_item(self);
            ex.check_status()?;
            ex.promote(TimeoutClass::Long)?;
            Ok(())
        })
    }

    pub fn set_accuracy_active(&self, active: bool) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_AbsAccOn");
            ex.send_item(self);
            ex.send_bool(active);
            Ok(())
        })
    }

    pub fn accuracy_active(&self) -> Result<bool> {
        self.get_int("G_AbsAccOn").map(|v| v > 0)
    }
}

/// Send `n` items for a batch command
pub(crate) fn send_item_list(ex: &mut Exchange<'_>, items: &[Item]) -> Result<()> {
    ex.send_int(wire_count(items.len())?);
    for item in items {
        ex.send_item(item);
    }
    Ok(())
}

/// Fail with `InvalidItem` if any handle is null
pub(crate) fn require_all_valid(items: &[Item]) -> Result<()> {
    items.iter().try_for_each(Item::require_valid)
}

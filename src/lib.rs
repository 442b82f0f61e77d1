//! Station Link - client library for the Station Host simulation server
//!
//! Speaks the Station Host's binary request/response protocol over one TCP
//! connection, exposes server-side objects as typed [`Item`] handles and
//! provides the pose algebra every call depends on: a 4x4 homogeneous
//! [`Pose`], a general [`Mat`] and conversions to the orientation formats of
//! common robot controllers.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use station_link::{ItemType, Pose, Session, StationConfig};
//!
//! fn main() -> station_link::Result<()> {
//!     let session = Session::connect(StationConfig::default())?;
//!     println!("Station Host build {}", session.build());
//!
//!     let robot = session.item("UR10", Some(ItemType::Robot))?;
//!     if robot.valid() {
//!         let home = robot.joints_home()?;
//!         robot.move_j(home, true)?;
//!         robot.move_l(robot.pose()? * Pose::transl(0.0, 0.0, -50.0), true)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Pose / Mat / codecs**: pure math, no I/O
//! - **Wire**: typed big-endian fields on a byte stream
//! - **Connection**: port scan, server launch, `RDK_API` handshake
//! - **Session**: one locked transaction at a time, status dispatch
//! - **Item**: opaque server handle with typed operations
//! - **AsyncSession**: the same calls from async code

pub mod async_session;
pub mod codecs;
pub mod config;
pub mod connection;
pub mod devices;
pub mod error;
pub mod item;
pub mod matrix;
pub mod pose;
pub mod program;
pub mod session;
pub mod station;
pub mod status;
pub mod vector;
pub mod wire;

pub use async_session::AsyncSession;
pub use codecs::PoseFormat;
pub use config::{PortRange, ServerArgs, ServerConfig, StationConfig};
pub use error::{Result, StationError};
pub use item::{Item, ItemType, JointLimits, MoveTarget, MoveType, Speeds};
pub use matrix::Mat;
pub use pose::{pose_split, Pose};
pub use program::{JointListRequest, PathReport, ProgramOutcome, RunType};
pub use session::{Exchange, LastStatus, Session, TimeoutClass};
pub use station::{CollisionPair, ParamValue, Projection, RunMode, WindowState};
pub use status::PathErrors;

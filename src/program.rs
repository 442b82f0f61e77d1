//! Program items
//!
//! Generation, simulation checks, instruction editing and I/O for items of
//! type `Program`. Generation failures reported by the server come back as a
//! [`ProgramOutcome`] rather than an error; transport errors still propagate.

use crate::item::{Item, MoveType};
use crate::matrix::Mat;
use crate::pose::Pose;
use crate::session::{wire_count, TimeoutClass};
use crate::station::RunMode;
use crate::status::PathErrors;
use crate::{Result, StationError};
use serde::Serialize;
use tracing::warn;

/// Where a program runs when started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    Simulator = 1,
    Robot = 2,
}

impl RunType {
    fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(RunType::Simulator),
            2 => Ok(RunType::Robot),
            other => Err(StationError::Generic(format!(
                "Unknown program run type {}",
                other
            ))),
        }
    }
}

/// How a code line is inserted into a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    CallProgram = 0,
    InsertCode = 1,
    StartThread = 2,
    Comment = 3,
    ShowMessage = 4,
}

/// Result of generating robot code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramOutcome {
    pub ok: bool,
    pub log: String,
    pub transfer_ok: bool,
}

/// Summary of a program simulation check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramUpdate {
    pub valid_instructions: usize,
    /// Estimated cycle time in seconds
    pub time: f64,
    /// Travelled distance in mm
    pub distance: f64,
    /// 1.0 when every instruction is valid
    pub valid_ratio: f64,
    pub message: String,
}

/// Sampling options for a program joint list
#[derive(Debug, Clone, PartialEq)]
pub struct JointListRequest {
    pub mm_step: f64,
    pub deg_step: f64,
    pub check_collisions: bool,
    /// Extra columns requested from the server (speeds, accelerations...)
    pub flags: i32,
    /// Time step in seconds; non-positive samples by distance only
    pub time_step: f64,
    /// Write the list to this file on the server side instead of returning it
    pub save_to_file: Option<String>,
}

impl Default for JointListRequest {
    fn default() -> Self {
        Self {
            mm_step: 10.0,
            deg_step: 5.0,
            check_collisions: false,
            flags: 0,
            time_step: 0.1,
            save_to_file: None,
        }
    }
}

/// Joint list of a program plus the problems found along its path
#[derive(Debug, Clone, PartialEq)]
pub struct PathReport {
    /// One column per sample; `None` when saved to a file
    pub joints: Option<Mat>,
    pub error_code: i32,
    pub errors: PathErrors,
    pub message: String,
}

impl PathReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Movement details of a move instruction
#[derive(Debug, Clone, PartialEq)]
pub struct MoveInstruction {
    pub move_type: i32,
    pub joint_target: bool,
    pub pose: Pose,
    pub joints: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionInfo {
    pub name: String,
    pub kind: i32,
    pub movement: Option<MoveInstruction>,
}

/// Instruction type code of a move
pub const INSTRUCTION_MOVE: i32 = 0;

fn server_reported(e: &StationError) -> bool {
    matches!(
        e,
        StationError::Generic(_)
            | StationError::Input(_)
            | StationError::License(_)
            | StationError::TargetReach(_)
            | StationError::Stopped(_)
    )
}

impl Item {
    /// Generate the robot program into `folder` (default location when empty)
    pub fn make_program(&self, folder: &str, run_mode: RunMode) -> Result<ProgramOutcome> {
        let reply = self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("MakeProg2");
            ex.send_item(self);
            ex.send_line(folder);
            ex.send_int(run_mode as i32);
            let status = ex.rec_int()?;
            let log = ex.rec_line()?;
            let transfer = ex.rec_int()?;
            Ok((status, log, transfer))
        });

        match reply {
            Ok((status, log, transfer)) => Ok(ProgramOutcome {
                ok: status > 0,
                log,
                transfer_ok: transfer > 0,
            }),
            Err(e) if server_reported(&e) => {
                warn!("Program generation failed: {}", e);
                Ok(ProgramOutcome {
                    ok: false,
                    log: e.to_string(),
                    transfer_ok: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Simulate the program and summarize it
    pub fn update(
        &self,
        check_collisions: bool,
        mm_step: f64,
        deg_step: f64,
    ) -> Result<ProgramUpdate> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("Update2");
            ex.send_item(self);
            ex.send_array(&[f64::from(u8::from(check_collisions)), mm_step, deg_step])?;
            let values = ex.rec_array()?;
            let message = ex.rec_line()?;
            let value = |i: usize| values.get(i).copied().unwrap_or(0.0);
            Ok(ProgramUpdate {
                valid_instructions: value(0).max(0.0) as usize,
                time: value(1),
                distance: value(2),
                valid_ratio: value(3),
                message,
            })
        })
    }

    /// Sampled joints along the program path and the path-error flags
    pub fn instruction_list_joints(&self, request: &JointListRequest) -> Result<PathReport> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("G_ProgJointList");
            ex.send_item(self);
            ex.send_array(&[
                request.mm_step,
                request.deg_step,
                f64::from(u8::from(request.check_collisions)),
                f64::from(request.flags),
                request.time_step,
            ])?;
            let joints = match &request.save_to_file {
                Some(path) => {
                    ex.send_line(path);
                    None
                }
                None => {
                    ex.send_line("");
                    Some(ex.rec_matrix()?)
                }
            };
            let error_code = ex.rec_int()?;
            let message = ex.rec_line()?;
            Ok(PathReport {
                joints,
                error_code,
                errors: PathErrors::from_code(error_code),
                message,
            })
        })
    }

    pub fn set_run_type(&self, run_type: RunType) -> Result<()> {
        self.call(|ex| {
            ex.send_line("S_ProgRunType");
            ex.send_item(self);
            ex.send_int(run_type as i32);
            Ok(())
        })
    }

    pub fn run_type(&self) -> Result<RunType> {
        let code = self.call(|ex| {
            ex.send_line("G_ProgRunType");
            ex.send_item(self);
            ex.rec_int()
        })?;
        RunType::from_code(code)
    }

    /// Start the program, optionally with parameters; returns the server's run status
    pub fn run_program(&self, parameters: Option<&str>) -> Result<i32> {
        self.call(|ex| {
            match parameters {
                Some(parameters) => {
                    ex.send_line("RunProgParam");
                    ex.send_item(self);
                    ex.send_line(parameters);
                }
                None => {
                    ex.send_line("RunProg");
                    ex.send_item(self);
                }
            }
            ex.rec_int()
        })
    }

    /// Append a code line, program call, thread start, comment or message
    pub fn run_instruction(&self, code: &str, kind: InstructionKind) -> Result<i32> {
        self.call(|ex| {
            ex.send_line("RunCode2");
            ex.send_item(self);
            ex.send_line(&code.replace("\r\n", "\n"));
            ex.send_int(kind as i32);
            ex.rec_int()
        })
    }

    /// Append a pause; a negative time waits for the user
    pub fn pause(&self, ms: f64) -> Result<()> {
        self.call(|ex| {
            ex.send_line("RunPause");
            ex.send_item(self);
            ex.send_real_int(ms * 1000.0)?;
            Ok(())
        })
    }

    fn set_io(&self, command: &str, name: &str, value: &str) -> Result<()> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.send_line(name);
            ex.send_line(value);
            Ok(())
        })
    }

    fn get_io(&self, command: &str, name: &str) -> Result<String> {
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.send_line(name);
            ex.rec_line()
        })
    }

    pub fn set_do(&self, name: &str, value: &str) -> Result<()> {
        self.set_io("setDO", name, value)
    }

    pub fn set_ao(&self, name: &str, value: &str) -> Result<()> {
        self.set_io("setAO", name, value)
    }

    pub fn get_di(&self, name: &str) -> Result<String> {
        self.get_io("getDI", name)
    }

    pub fn get_ai(&self, name: &str) -> Result<String> {
        self.get_io("getAI", name)
    }

    /// Wait for a digital input; a negative timeout waits forever
    pub fn wait_di(&self, name: &str, value: &str, timeout_ms: f64) -> Result<()> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("waitDI");
            ex.send_item(self);
            ex.send_line(name);
            ex.send_line(value);
            ex.send_real_int(timeout_ms * 1000.0)?;
            Ok(())
        })
    }

    /// Append a move to `target` to this program
    pub fn add_move(&self, target: &Item, move_type: MoveType) -> Result<()> {
        target.require_valid()?;
        self.call(|ex| {
            ex.send_line("Add_INSMOVE");
            ex.send_item(target);
            ex.send_item(self);
            ex.send_int(move_type as i32);
            Ok(())
        })
    }

    pub fn instruction_count(&self) -> Result<usize> {
        let n = self.call(|ex| {
            ex.send_line("Prog_Nins");
            ex.send_item(self);
            ex.rec_int()
        })?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn instruction_op(&self, command: &str, index: usize) -> Result<i32> {
        let index = wire_count(index)?;
        self.call(|ex| {
            ex.send_line(command);
            ex.send_item(self);
            ex.send_int(index);
            ex.rec_int()
        })
    }

    /// Select an instruction as the insertion point
    pub fn select_instruction(&self, index: usize) -> Result<i32> {
        self.instruction_op("Prog_SelIns", index)
    }

    /// Delete an instruction; true when it existed
    pub fn delete_instruction(&self, index: usize) -> Result<bool> {
        self.instruction_op("Prog_DelIns", index).map(|v| v > 0)
    }

    pub fn instruction(&self, index: usize) -> Result<InstructionInfo> {
        let index = wire_count(index)?;
        self.call(|ex| {
            ex.send_line("Prog_GIns");
            ex.send_item(self);
            ex.send_int(index);
            let name = ex.rec_line()?;
            let kind = ex.rec_int()?;
            let movement = if kind == INSTRUCTION_MOVE {
                let move_type = ex.rec_int()?;
                let joint_target = ex.rec_int()? > 0;
                let pose = ex.rec_pose()?;
                let joints = ex.rec_array()?;
                Some(MoveInstruction {
                    move_type,
                    joint_target,
                    pose,
                    joints,
                })
            } else {
                None
            };
            Ok(InstructionInfo {
                name,
                kind,
                movement,
            })
        })
    }

    pub fn show_instructions(&self, show: bool) -> Result<()> {
        self.call(|ex| {
            ex.send_line("Prog_ShowIns");
            ex.send_item(self);
            ex.send_bool(show);
            Ok(())
        })
    }

    pub fn show_targets(&self, show: bool) -> Result<()> {
        self.call(|ex| {
            ex.send_line("Prog_ShowTargets");
            ex.send_item(self);
            ex.send_bool(show);
            Ok(())
        })
    }

    /// Update a machining project from an NC file and a JSON parameter string
    ///
    /// Returns the generated program and the server's status value.
    pub fn set_machining_parameters(
        &self,
        nc_file: &str,
        part: Option<&Item>,
        parameters: &str,
    ) -> Result<(Item, f64)> {
        self.transact(TimeoutClass::Long, |ex| {
            ex.send_line("S_MachiningParams");
            ex.send_item(self);
            ex.send_line(nc_file);
            ex.send_opt_item(part);
            ex.send_line(parameters);
            let program = ex.rec_item()?;
            let status = f64::from(ex.rec_int()?) / 1000.0;
            Ok((program, status))
        })
    }
}

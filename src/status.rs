//! Reply status codes and the path-error flag set
//!
//! Every reply ends with an `i32` status. Some codes are followed by a
//! message line; those bytes must always be consumed so the stream stays
//! aligned, even when the status turns into an error.

use crate::{Result, StationError};
use bitflags::bitflags;
use tracing::warn;

pub const STATUS_OK: i32 = 0;
pub const STATUS_INVALID_ITEM: i32 = 1;
pub const STATUS_WARNING: i32 = 2;
pub const STATUS_ERROR: i32 = 3;
pub const STATUS_NO_LICENSE: i32 = 9;
pub const STATUS_TARGET_REACH: i32 = 10;
pub const STATUS_STOPPED: i32 = 11;
pub const STATUS_INPUT: i32 = 12;
pub const STATUS_LICENSE: i32 = 13;

/// First code the server never sends; this and negative codes are fatal
pub const STATUS_FATAL_FLOOR: i32 = 100;

/// Successful reply, possibly with a warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Warning(String),
}

/// Whether a message line follows this status code
pub fn carries_message(code: i32) -> bool {
    matches!(code, STATUS_WARNING | STATUS_ERROR | STATUS_TARGET_REACH..=99)
}

pub fn is_fatal_code(code: i32) -> bool {
    !(0..STATUS_FATAL_FLOOR).contains(&code)
}

/// Map a status code and its message line (if any) to a result
pub fn check(code: i32, message: Option<String>) -> Result<Outcome> {
    let message = message.unwrap_or_default();
    match code {
        STATUS_OK => Ok(Outcome::Ok),
        STATUS_WARNING => {
            warn!("Station Host warning: {}", message);
            Ok(Outcome::Warning(message))
        }
        STATUS_INVALID_ITEM => Err(StationError::InvalidItem(
            "The item is not valid or was deleted".to_string(),
        )),
        STATUS_ERROR => Err(StationError::Generic(message)),
        4..=8 => Err(StationError::Generic(format!(
            "Unknown error (status {})",
            code
        ))),
        STATUS_NO_LICENSE => Err(StationError::License(
            "A valid license is required for this operation".to_string(),
        )),
        STATUS_TARGET_REACH => Err(StationError::TargetReach(message)),
        STATUS_STOPPED => Err(StationError::Stopped(message)),
        STATUS_INPUT => Err(StationError::Input(message)),
        STATUS_LICENSE => Err(StationError::License(message)),
        14..=99 => Err(StationError::Generic(message)),
        _ => Err(StationError::FatalProtocol(format!(
            "Unexpected status code {}",
            code
        ))),
    }
}

bitflags! {
    /// Problems reported for a program path
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PathErrors: u32 {
        const KINEMATIC = 1;
        const PATH_LIMIT = 1 << 1;
        const PATH_SINGULARITY = 1 << 2;
        const PATH_NEAR_SINGULARITY = 1 << 3;
        const PATH_FLIP_AXIS = 1 << 4;
        const COLLISION = 1 << 5;
        const WRIST_SINGULARITY = 1 << 6;
        const ELBOW_SINGULARITY = 1 << 7;
        const SHOULDER_SINGULARITY = 1 << 8;
        const PATH_INVALID_TARGET = 1 << 9;
        const INVALID_ARC_MOVE = 1 << 10;
        const INACCURATE_LARGE_AXIS_MOVE = 1 << 11;
    }
}

/// Value the server uses for "inaccurate due to a large axis move"
pub const INACCURATE_LARGE_AXIS_MOVE_CODE: i32 = 20;

impl PathErrors {
    /// Decode the decimal error code returned with a program joint list
    ///
    /// Digit groups, lowest first: units and tens are kinematic problems,
    /// hundreds are joint limits, thousands the singularity class (1 wrist,
    /// 2 elbow, 3 shoulder, 4 and up near-singularity), then collision,
    /// invalid target, flip axis and invalid arc move.
    pub fn from_code(code: i32) -> PathErrors {
        if code == INACCURATE_LARGE_AXIS_MOVE_CODE {
            return PathErrors::INACCURATE_LARGE_AXIS_MOVE;
        }
        if code <= 0 {
            return PathErrors::empty();
        }

        let mut flags = PathErrors::empty();
        if code % 100_000_000 > 9_999_999 {
            flags |= PathErrors::INVALID_ARC_MOVE;
        }
        if code % 10_000_000 > 999_999 {
            flags |= PathErrors::PATH_FLIP_AXIS;
        }
        if code % 1_000_000 > 99_999 {
            flags |= PathErrors::PATH_INVALID_TARGET;
        }
        if code % 100_000 > 9_999 {
            flags |= PathErrors::COLLISION;
        }
        match (code % 10_000) / 1_000 {
            0 => {}
            1 => flags |= PathErrors::PATH_SINGULARITY | PathErrors::WRIST_SINGULARITY,
            2 => flags |= PathErrors::PATH_SINGULARITY | PathErrors::ELBOW_SINGULARITY,
            3 => flags |= PathErrors::PATH_SINGULARITY | PathErrors::SHOULDER_SINGULARITY,
            _ => flags |= PathErrors::PATH_NEAR_SINGULARITY,
        }
        if code % 1_000 > 99 {
            flags |= PathErrors::PATH_LIMIT;
        }
        if code % 100 > 0 {
            flags |= PathErrors::KINEMATIC;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_codes() {
        for code in [2, 3, 10, 11, 12, 13, 50, 99] {
            assert!(carries_message(code), "code {}", code);
        }
        for code in [0, 1, 4, 8, 9, 100, -1] {
            assert!(!carries_message(code), "code {}", code);
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(check(0, None).unwrap(), Outcome::Ok);
        assert_eq!(
            check(2, Some("careful".into())).unwrap(),
            Outcome::Warning("careful".to_string())
        );
        assert!(matches!(check(1, None), Err(StationError::InvalidItem(_))));
        assert!(matches!(check(9, None), Err(StationError::License(_))));
        assert!(matches!(check(5, None), Err(StationError::Generic(_))));
        assert!(matches!(
            check(12, Some("bad".into())),
            Err(StationError::Input(m)) if m == "bad"
        ));
        match check(10, Some("target not reachable".into())) {
            Err(StationError::TargetReach(m)) => assert_eq!(m, "target not reachable"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(check(11, Some(String::new())), Err(StationError::Stopped(_))));
        assert!(matches!(check(250, None), Err(StationError::FatalProtocol(_))));
        assert!(matches!(check(-4, None), Err(StationError::FatalProtocol(_))));
        assert!(is_fatal_code(100) && is_fatal_code(-1) && !is_fatal_code(99));
    }

    #[test]
    fn test_path_errors_sentinel_is_not_combined() {
        assert_eq!(
            PathErrors::from_code(20),
            PathErrors::INACCURATE_LARGE_AXIS_MOVE
        );
        assert_eq!(PathErrors::from_code(0), PathErrors::empty());
        assert_eq!(PathErrors::from_code(-5), PathErrors::empty());
    }

    #[test]
    fn test_path_error_groups() {
        assert_eq!(PathErrors::from_code(1), PathErrors::KINEMATIC);
        assert_eq!(PathErrors::from_code(100), PathErrors::PATH_LIMIT);
        assert_eq!(
            PathErrors::from_code(1_000),
            PathErrors::PATH_SINGULARITY | PathErrors::WRIST_SINGULARITY
        );
        assert_eq!(
            PathErrors::from_code(3_000),
            PathErrors::PATH_SINGULARITY | PathErrors::SHOULDER_SINGULARITY
        );
        assert_eq!(PathErrors::from_code(5_000), PathErrors::PATH_NEAR_SINGULARITY);
        assert_eq!(PathErrors::from_code(10_000), PathErrors::COLLISION);
        assert_eq!(
            PathErrors::from_code(10_000_000),
            PathErrors::INVALID_ARC_MOVE
        );

        let combined = PathErrors::from_code(1_112_101);
        assert_eq!(
            combined,
            PathErrors::PATH_FLIP_AXIS
                | PathErrors::PATH_INVALID_TARGET
                | PathErrors::COLLISION
                | PathErrors::PATH_SINGULARITY
                | PathErrors::ELBOW_SINGULARITY
                | PathErrors::PATH_LIMIT
                | PathErrors::KINEMATIC
        );
    }
}

//! Program generation, path checks and devices against the fake Station Host

mod common;

use common::{expect_line, ok, status, FakeHost};
use station_link::{Item, ItemType, JointListRequest, Mat, PathErrors, RunMode, Session};

const PROGRAM_PTR: u64 = 0x5500;
const ROBOT_PTR: u64 = 0x5501;

#[test]
fn test_make_program() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "MakeProg2");
        assert_eq!(wire.rec_ptr()?, PROGRAM_PTR);
        expect_line(wire, "/tmp/out");
        assert_eq!(wire.rec_int()?, RunMode::MakeRobotProg as i32);
        wire.send_int(1);
        wire.send_line("Program generated");
        wire.send_int(0);
        ok(wire);

        expect_line(wire, "MakeProg2");
        assert_eq!(wire.rec_ptr()?, PROGRAM_PTR);
        expect_line(wire, "");
        assert_eq!(wire.rec_int()?, RunMode::MakeRobotProg as i32);
        wire.send_int(0);
        wire.send_line("");
        wire.send_int(0);
        status(wire, 3, "No post processor");
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let program = Item::new(session.clone(), PROGRAM_PTR, ItemType::Program);

    let outcome = program.make_program("/tmp/out", RunMode::MakeRobotProg).unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.log, "Program generated");
    assert!(!outcome.transfer_ok);

    let failed = program.make_program("", RunMode::MakeRobotProg).unwrap();
    assert!(!failed.ok);
    assert!(failed.log.contains("No post processor"));
    assert!(session.is_connected());

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_instruction_list_joints_decodes_path_errors() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "G_ProgJointList");
        assert_eq!(wire.rec_ptr()?, PROGRAM_PTR);
        assert_eq!(wire.rec_array()?.len(), 5);
        expect_line(wire, "");
        let joints = Mat::from_col_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        wire.send_matrix(&joints)?;
        // Elbow singularity plus a joint limit
        wire.send_int(2100);
        wire.send_line("Elbow singularity at instruction 2");
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let program = Item::new(session.clone(), PROGRAM_PTR, ItemType::Program);
    let report = program
        .instruction_list_joints(&JointListRequest::default())
        .unwrap();

    assert_eq!(report.joints.as_ref().map(Mat::size), Some((2, 3)));
    assert_eq!(report.error_code, 2100);
    assert!(report.errors.contains(
        PathErrors::ELBOW_SINGULARITY | PathErrors::PATH_SINGULARITY | PathErrors::PATH_LIMIT
    ));
    assert!(!report.is_valid());

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_wait_move_reads_two_statuses() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "WaitMove");
        assert_eq!(wire.rec_ptr()?, ROBOT_PTR);
        ok(wire);
        ok(wire);

        expect_line(wire, "Stop");
        assert_eq!(wire.rec_ptr()?, ROBOT_PTR);
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let robot = Item::new(session.clone(), ROBOT_PTR, ItemType::Robot);
    robot.wait_move().unwrap();
    robot.stop().unwrap();

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_laser_tracker_without_reading() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "MeasLT2");
        assert_eq!(wire.rec_xyz()?, [10.0, 20.0, 30.0]);
        assert_eq!(wire.rec_int()?, 0);
        wire.send_array(&[])?;
        ok(wire);

        expect_line(wire, "MeasLT2");
        wire.rec_xyz()?;
        assert_eq!(wire.rec_int()?, 1);
        wire.send_array(&[1.5, 2.5, 3.5])?;
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    assert_eq!(
        session.laser_tracker_measure([10.0, 20.0, 30.0], false).unwrap(),
        None
    );
    assert_eq!(
        session.laser_tracker_measure([0.0; 3], true).unwrap(),
        Some([1.5, 2.5, 3.5])
    );

    session.disconnect().unwrap();
    host.join();
}

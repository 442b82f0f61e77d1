//! End-to-end tests against the fake Station Host

mod common;

use common::{expect_line, ok, send_item, status, FakeHost, FAKE_API, FAKE_BUILD};
use station_link::{
    AsyncSession, Item, ItemType, Mat, Pose, Session, StationError, TimeoutClass,
};

const FRAME_PTR: u64 = 0x7f00_0000_0abc;
const ROBOT_PTR: u64 = 0x7f00_0000_1234;

#[test]
fn test_handshake_and_version() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "Version");
        wire.send_line("Station Host");
        wire.send_int(64);
        wire.send_line("5.6.1");
        wire.send_line("2026-03-02");
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    assert_eq!(session.api_version(), FAKE_API);
    assert_eq!(session.build(), FAKE_BUILD);

    let version = session.version().unwrap();
    assert_eq!(version.application, "Station Host");
    assert_eq!(version.bits, 64);
    assert_eq!(version.version, "5.6.1");

    session.disconnect().unwrap();
    // safe mode on, auto update off, status never skipped
    assert_eq!(host.join(), vec![1.0, 0.0, 0.0]);
}

#[test]
fn test_handshake_rejected() {
    let host = FakeHost::start_raw(|wire| {
        expect_line(wire, "RDK_API");
        wire.rec_array()?;
        wire.send_line("SOMETHING_ELSE");
        Ok(Vec::new())
    });

    assert!(matches!(
        Session::connect(host.config()),
        Err(StationError::HandshakeFailed(_))
    ));
    host.join();
}

#[test]
fn test_lookup_and_pose() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "G_Item2");
        expect_line(wire, "Frame 1");
        assert_eq!(wire.rec_int()?, 3);
        send_item(wire, FRAME_PTR, 3);
        ok(wire);

        expect_line(wire, "G_Hlocal");
        assert_eq!(wire.rec_ptr()?, FRAME_PTR);
        wire.send_pose(&Pose::transl(100.0, 200.0, 300.0));
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let frame = session.item("Frame 1", Some(ItemType::Frame)).unwrap();
    assert!(frame.valid());
    assert_eq!(frame.ptr(), FRAME_PTR);
    assert_eq!(frame.kind(), ItemType::Frame);

    let pose = frame.pose().unwrap();
    assert_eq!(pose.pos(), [100.0, 200.0, 300.0]);
    assert!(pose.rotation_pose().approx_eq(&Pose::identity(), 0.0));

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_pose_round_trip() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "S_Hlocal");
        assert_eq!(wire.rec_ptr()?, FRAME_PTR);
        let stored = wire.rec_pose()?;
        ok(wire);

        expect_line(wire, "G_Hlocal");
        assert_eq!(wire.rec_ptr()?, FRAME_PTR);
        wire.send_pose(&stored);
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let frame = Item::new(session.clone(), FRAME_PTR, ItemType::Frame);
    let pose = Pose::transl(12.5, -40.0, 7.25) * Pose::rotz(0.3) * Pose::rotx(-1.1);

    frame.set_pose(&pose).unwrap();
    assert_eq!(frame.pose().unwrap(), pose);

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_unreachable_target_keeps_session() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "MoveXb");
        assert_eq!(wire.rec_int()?, 1);
        assert_eq!(wire.rec_int()?, 1);
        assert_eq!(wire.rec_array()?, vec![0.0, -90.0, 90.0, 0.0, 90.0, 0.0]);
        assert_eq!(wire.rec_ptr()?, 0);
        assert_eq!(wire.rec_ptr()?, ROBOT_PTR);
        // Accepted, then failed while moving
        ok(wire);
        status(wire, 10, "Target not reachable");

        expect_line(wire, "IsBusy");
        assert_eq!(wire.rec_ptr()?, ROBOT_PTR);
        wire.send_int(0);
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let robot = Item::new(session.clone(), ROBOT_PTR, ItemType::Robot);

    match robot.move_j(vec![0.0, -90.0, 90.0, 0.0, 90.0, 0.0], true) {
        Err(StationError::TargetReach(message)) => assert_eq!(message, "Target not reachable"),
        other => panic!("expected TargetReach, got {:?}", other),
    }
    assert!(session.is_connected());
    assert_eq!(session.last_status().unwrap().code, 10);

    assert!(!robot.busy().unwrap());

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_matrix_shapes_survive_the_wire() {
    let host = FakeHost::start(|wire| {
        for _ in 0..2 {
            expect_line(wire, "ProjectPoints");
            let points = wire.rec_matrix()?;
            assert_eq!(wire.rec_ptr()?, FRAME_PTR);
            assert_eq!(wire.rec_int()?, 1);
            wire.send_matrix(&points)?;
            ok(wire);
        }
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let object = Item::new(session.clone(), FRAME_PTR, ItemType::Object);
    let values: Vec<f64> = (0..15).map(f64::from).collect();
    let points = Mat::from_col_major(3, 5, &values).unwrap();

    let echoed = session
        .project_points(&points, &object, station_link::Projection::Closest)
        .unwrap();
    assert_eq!(echoed.size(), (3, 5));
    assert_eq!(echoed, points);

    let empty = session
        .project_points(&Mat::empty(), &object, station_link::Projection::Closest)
        .unwrap();
    assert_eq!(empty.size(), (0, 0));

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_batch_parity_sends_nothing() {
    let host = FakeHost::start(|wire| {
        // The first command seen must be the one after the rejected batch
        expect_line(wire, "Collisions");
        wire.send_int(2);
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let items = vec![
        Item::new(session.clone(), FRAME_PTR, ItemType::Frame),
        Item::new(session.clone(), ROBOT_PTR, ItemType::Robot),
    ];
    assert!(matches!(
        session.set_poses(&items, &[Pose::identity()]),
        Err(StationError::Input(_))
    ));
    assert_eq!(session.collisions().unwrap(), 2);

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_warning_is_stored_not_raised() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "G_Param");
        expect_line(wire, "PATH_OUTPUT");
        wire.send_line("/tmp/programs");
        status(wire, 2, "Path is not writable");

        expect_line(wire, "G_Param");
        expect_line(wire, "MISSING");
        wire.send_line("UNKNOWN MISSING");
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    assert_eq!(
        session.param("PATH_OUTPUT").unwrap().as_deref(),
        Some("/tmp/programs")
    );
    let last = session.last_status().unwrap();
    assert_eq!(last.code, 2);
    assert_eq!(last.message, "Path is not writable");

    assert_eq!(session.param("MISSING").unwrap(), None);

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_invalid_item_status() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "G_Name");
        assert_eq!(wire.rec_ptr()?, FRAME_PTR);
        // Reply field first, then the status
        wire.send_line("");
        wire.send_int(1);

        expect_line(wire, "Collisions");
        wire.send_int(3);
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let frame = Item::new(session.clone(), FRAME_PTR, ItemType::Frame);
    assert!(matches!(frame.name(), Err(StationError::InvalidItem(_))));
    assert!(session.is_connected());
    // The stream is still aligned for the next command
    assert_eq!(session.collisions().unwrap(), 3);

    session.disconnect().unwrap();
    host.join();
}

#[test]
fn test_fatal_status_drops_connection() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "Collisions");
        wire.send_int(0);
        wire.send_int(150);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    assert!(matches!(
        session.collisions(),
        Err(StationError::FatalProtocol(_))
    ));
    assert!(!session.is_connected());
    host.join();
}

#[test]
fn test_custom_transaction_with_long_timeout() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "SCMD");
        expect_line(wire, "Trace");
        expect_line(wire, "On");
        wire.send_line("OK");
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let reply = session
        .transact(TimeoutClass::Long, |ex| {
            ex.send_line("SCMD");
            ex.send_line("Trace");
            ex.send_line("On");
            ex.rec_line()
        })
        .unwrap();
    assert_eq!(reply, "OK");

    session.disconnect().unwrap();
    host.join();
}

#[tokio::test]
async fn test_async_session_round_trip() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "G_Item");
        expect_line(wire, "UR10");
        send_item(wire, ROBOT_PTR, 2);
        ok(wire);

        expect_line(wire, "G_Hlocal");
        assert_eq!(wire.rec_ptr()?, ROBOT_PTR);
        wire.send_pose(&Pose::rotz(0.5));
        ok(wire);
        Ok(())
    });

    let session = AsyncSession::connect(host.config()).await.unwrap();
    let robot = session.item("UR10", None).await.unwrap();
    assert_eq!(robot.kind(), ItemType::Robot);
    let pose = session.pose(&robot).await.unwrap();
    assert!(pose.approx_eq(&Pose::rotz(0.5), 1e-12));

    session.disconnect().await.unwrap();
    tokio::task::spawn_blocking(move || host.join()).await.unwrap();
}

#[test]
fn test_delete_items_invalidates_handles() {
    let host = FakeHost::start(|wire| {
        expect_line(wire, "PickItemList");
        expect_line(wire, "Select a frame");
        assert_eq!(wire.rec_int()?, 2);
        assert_eq!(wire.rec_ptr()?, FRAME_PTR);
        assert_eq!(wire.rec_ptr()?, ROBOT_PTR);
        send_item(wire, FRAME_PTR, 3);
        ok(wire);

        expect_line(wire, "RemoveLst");
        assert_eq!(wire.rec_int()?, 2);
        assert_eq!(wire.rec_ptr()?, FRAME_PTR);
        assert_eq!(wire.rec_ptr()?, ROBOT_PTR);
        ok(wire);
        Ok(())
    });

    let session = Session::connect(host.config()).unwrap();
    let mut items = vec![
        Item::new(session.clone(), FRAME_PTR, ItemType::Frame),
        Item::new(session.clone(), ROBOT_PTR, ItemType::Robot),
    ];
    let picked = session.pick_item_from("Select a frame", &items).unwrap();
    assert_eq!(picked, items[0]);

    session.delete_items(&mut items).unwrap();
    assert!(items.iter().all(|item| !item.valid()));

    session.disconnect().unwrap();
    host.join();
}

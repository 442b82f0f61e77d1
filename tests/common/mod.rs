//! In-process fake Station Host
//!
//! Accepts one connection on an ephemeral port, answers the `RDK_API`
//! handshake and then runs a scripted exchange against the crate's own
//! wire codec.

#![allow(dead_code)]

use station_link::wire::Wire;
use station_link::{PortRange, StationConfig};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const FAKE_API: i32 = 1;
pub const FAKE_BUILD: i32 = 5400;

pub type HostWire = Wire<TcpStream>;
pub type ScriptResult = station_link::Result<()>;

pub struct FakeHost {
    port: u16,
    handle: Option<JoinHandle<Vec<f64>>>,
}

impl FakeHost {
    /// Handshake, then `script`; the handshake flags are returned by `join`
    pub fn start<F>(script: F) -> Self
    where
        F: FnOnce(&mut HostWire) -> ScriptResult + Send + 'static,
    {
        Self::start_raw(move |wire| {
            expect_line(wire, "RDK_API");
            let flags = wire.rec_array()?;
            wire.send_line("RDK_API");
            wire.send_int(FAKE_API);
            wire.send_int(FAKE_BUILD);
            ok(wire);
            script(wire)?;
            Ok(flags)
        })
    }

    /// `script` sees the connection from its first byte
    pub fn start_raw<F>(script: F) -> Self
    where
        F: FnOnce(&mut HostWire) -> station_link::Result<Vec<f64>> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake host");
        let port = listener.local_addr().expect("local addr").port();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept client");
            let mut wire = Wire::new(stream);
            wire.set_timeout(Some(Duration::from_secs(10)))
                .expect("set fake host timeout");
            let flags = script(&mut wire).expect("fake host script failed");
            wire.flush().expect("flush fake host replies");
            // Hold the socket until the client hangs up
            let _ = wire.rec_line();
            flags
        });

        Self {
            port,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn config(&self) -> StationConfig {
        let mut config = StationConfig {
            host: "127.0.0.1".to_string(),
            ports: PortRange::single(self.port),
            ..StationConfig::default()
        };
        config.timeouts.short = 5.0;
        config
    }

    /// Wait for the script to finish; panics from the script surface here
    pub fn join(mut self) -> Vec<f64> {
        match self.handle.take() {
            Some(handle) => handle.join().expect("fake host panicked"),
            None => Vec::new(),
        }
    }
}

pub fn expect_line(wire: &mut HostWire, expected: &str) {
    let line = wire.rec_line().expect("command line");
    assert_eq!(line, expected);
}

pub fn ok(wire: &mut HostWire) {
    wire.send_int(0);
}

/// Status with a trailing message
pub fn status(wire: &mut HostWire, code: i32, message: &str) {
    wire.send_int(code);
    wire.send_line(message);
}

pub fn send_item(wire: &mut HostWire, ptr: u64, kind: i32) {
    wire.send_ptr(ptr);
    wire.send_int(kind);
}

//! Connection manager
//!
//! Finds a Station Host on the configured host and port range, launches the
//! server executable when nothing answers locally, performs the `RDK_API`
//! handshake and tears the link down again.

use crate::config::{ServerConfig, StationConfig};
use crate::status;
use crate::wire::Wire;
use crate::{Result, StationError};
use regex::Regex;
use std::io::{BufRead, BufReader};
use std::net::{TcpStream, ToSocketAddrs};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Command name and expected reply of the handshake
pub const HANDSHAKE_COMMAND: &str = "RDK_API";

/// Empty stdout lines, counted over the whole startup output, after which a
/// launched server is given up on
pub const MAX_EMPTY_STARTUP_LINES: usize = 10;

/// A launched Station Host process owned by the session
pub struct ServerProcess {
    child: Child,
    drain: Option<JoinHandle<()>>,
}

impl ServerProcess {
    /// Start the executable and block until it reports it is running
    pub fn spawn(server: &ServerConfig) -> Result<Self> {
        let args = server.args.to_args();
        info!(
            "Starting Station Host: {} {}",
            server.path.display(),
            args.join(" ")
        );

        let mut child = Command::new(&server.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                StationError::ServerStartFailed(format!(
                    "Failed to start {}: {}",
                    server.path.display(),
                    e
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            StationError::ServerStartFailed("Server stdout is not available".to_string())
        })?;
        let mut reader = BufReader::new(stdout);

        if let Err(e) = wait_until_ready(&mut reader) {
            error!("Station Host did not become ready: {}", e);
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
        info!("Station Host is running (pid {})", child.id());

        let drain = thread::Builder::new()
            .name("station-host-stdout".to_string())
            .spawn(move || drain_output(reader))
            .map_err(|e| {
                StationError::ServerStartFailed(format!("Failed to start output drain: {}", e))
            })?;

        Ok(Self {
            child,
            drain: Some(drain),
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wait for the process to exit
    pub fn wait(mut self) -> Result<()> {
        let status = self.child.wait()?;
        info!("Station Host exited with {}", status);
        if let Some(drain) = self.drain.take() {
            let _ = drain.join();
        }
        Ok(())
    }

    /// Kill the process and reap it
    pub fn kill(mut self) -> Result<()> {
        warn!("Killing Station Host (pid {})", self.child.id());
        self.child.kill()?;
        self.wait()
    }
}

fn drain_output(reader: BufReader<ChildStdout>) {
    for line in reader.lines() {
        match line {
            Ok(line) => debug!("Station Host: {}", line),
            Err(_) => break,
        }
    }
}

/// Consume startup output until a line mentions "running"
pub fn wait_until_ready<R: BufRead>(reader: &mut R) -> Result<()> {
    let ready = Regex::new(r"(?i)running")
        .map_err(|e| StationError::ServerStartFailed(format!("Invalid readiness pattern: {}", e)))?;

    let mut empty_lines = 0;
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).map_err(|e| {
            StationError::ServerStartFailed(format!("Failed to read server output: {}", e))
        })?;
        if n == 0 {
            return Err(StationError::ServerStartFailed(
                "Server output ended before it reported running".to_string(),
            ));
        }

        let text = line.trim();
        if text.is_empty() {
            empty_lines += 1;
            if empty_lines >= MAX_EMPTY_STARTUP_LINES {
                return Err(StationError::ServerStartFailed(format!(
                    "Server printed {} empty lines without reporting running",
                    empty_lines
                )));
            }
            continue;
        }

        debug!("Station Host: {}", text);
        if ready.is_match(text) {
            return Ok(());
        }
    }
}

/// An open, handshaken link to the server
pub struct Connection {
    wire: Wire<TcpStream>,
    port: u16,
    api_version: i32,
    build: i32,
    timeout: Option<Duration>,
}

impl Connection {
    /// Scan the port range, launching the server once if allowed
    ///
    /// `server` receives the process handle when this call starts one.
    /// `timeout` bounds the connect and handshake on each port.
    pub fn open(
        config: &StationConfig,
        timeout: Duration,
        server: &mut Option<ServerProcess>,
    ) -> Result<Self> {
        let ports = config.effective_ports();
        let mut last_error = String::from("no port tried");

        for round in 0..2 {
            for port in ports.iter() {
                if let Some(connection) = Self::try_port(config, port, timeout)? {
                    return Ok(connection);
                }
                last_error = format!("nothing listening on port {}", port);
            }

            if round > 0 || server.is_some() || !config.is_local_host() {
                break;
            }
            match config.launchable_server() {
                Some(server_config) => *server = Some(ServerProcess::spawn(server_config)?),
                None => break,
            }
        }

        Err(StationError::ConnectFailed(format!(
            "No Station Host on {} ports {}-{}: {}",
            config.host, ports.start, ports.end, last_error
        )))
    }

    /// `Ok(None)` when nothing accepts the connection on this port
    fn try_port(config: &StationConfig, port: u16, timeout: Duration) -> Result<Option<Self>> {
        let addrs = match (config.host.as_str(), port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                return Err(StationError::ConnectFailed(format!(
                    "Failed to resolve {}: {}",
                    config.host, e
                )))
            }
        };

        for addr in addrs {
            debug!("Trying Station Host at {}", addr);
            let stream = match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => stream,
                Err(e) => {
                    debug!("Connection to {} failed: {}", addr, e);
                    continue;
                }
            };
            let _ = stream.set_nodelay(true);

            let mut connection = Self {
                wire: Wire::new(stream),
                port,
                api_version: 0,
                build: 0,
                timeout: None,
            };
            connection.set_timeout(Some(timeout))?;
            connection.handshake(config)?;
            info!(
                "Connected to Station Host at {} (API {}, build {})",
                addr, connection.api_version, connection.build
            );
            return Ok(Some(connection));
        }
        Ok(None)
    }

    fn handshake(&mut self, config: &StationConfig) -> Result<()> {
        let rejected = |e: StationError| StationError::HandshakeFailed(e.to_string());

        let flags = [
            if config.handshake.safe_mode { 1.0 } else { 0.0 },
            if config.handshake.auto_update { 1.0 } else { 0.0 },
            0.0,
        ];
        self.wire.send_line(HANDSHAKE_COMMAND);
        self.wire.send_array(&flags).map_err(rejected)?;

        let reply = self.wire.rec_line().map_err(rejected)?;
        if reply != HANDSHAKE_COMMAND {
            return Err(StationError::HandshakeFailed(format!(
                "Unexpected handshake reply: {:?}",
                reply
            )));
        }
        self.api_version = self.wire.rec_int().map_err(rejected)?;
        self.build = self.wire.rec_int().map_err(rejected)?;

        let code = self.wire.rec_int().map_err(rejected)?;
        let message = if status::carries_message(code) {
            Some(self.wire.rec_line().map_err(rejected)?)
        } else {
            None
        };
        status::check(code, message).map_err(rejected)?;
        Ok(())
    }

    pub fn wire(&mut self) -> &mut Wire<TcpStream> {
        &mut self.wire
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn api_version(&self) -> i32 {
        self.api_version
    }

    pub fn build(&self) -> i32 {
        self.build
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.timeout != timeout {
            self.wire.set_timeout(timeout)?;
            self.timeout = timeout;
        }
        Ok(())
    }

    /// Second handle on the socket, used to interrupt a transaction in flight
    pub fn try_clone_stream(&self) -> Result<TcpStream> {
        Ok(self.wire.transport().try_clone()?)
    }

    /// Ask the server to exit; the reply status is read best-effort
    pub fn quit(&mut self) -> Result<()> {
        info!("Asking Station Host to quit");
        self.wire.send_line("QUIT");
        let code = self.wire.rec_int()?;
        if status::carries_message(code) {
            let _ = self.wire.rec_line()?;
        }
        Ok(())
    }

    pub fn close(mut self) {
        debug!("Closing connection on port {}", self.port);
        if let Err(e) = self.wire.shutdown() {
            warn!("Failed to shut down connection: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ready_line_is_case_insensitive() {
        let mut out = Cursor::new(b"Loading\n\nStation Host is RUNNING\nrest\n".to_vec());
        wait_until_ready(&mut out).unwrap();

        let mut rest = String::new();
        out.read_line(&mut rest).unwrap();
        assert_eq!(rest, "rest\n");
    }

    #[test]
    fn test_ready_gives_up_after_empty_lines() {
        let mut out = Cursor::new("\n".repeat(MAX_EMPTY_STARTUP_LINES).into_bytes());
        assert!(matches!(
            wait_until_ready(&mut out),
            Err(StationError::ServerStartFailed(_))
        ));
    }

    #[test]
    fn test_ready_fails_on_eof() {
        let mut out = Cursor::new(b"Loading\n".to_vec());
        assert!(matches!(
            wait_until_ready(&mut out),
            Err(StationError::ServerStartFailed(_))
        ));
    }

    #[test]
    fn test_empty_lines_count_across_splash_output() {
        let text = format!("{}running\n", "\n\n\nsplash\n".repeat(4));
        let mut out = Cursor::new(text.into_bytes());
        assert!(matches!(
            wait_until_ready(&mut out),
            Err(StationError::ServerStartFailed(_))
        ));

        let text = format!("{}running\n", "\nsplash\n".repeat(MAX_EMPTY_STARTUP_LINES - 1));
        let mut out = Cursor::new(text.into_bytes());
        wait_until_ready(&mut out).unwrap();
    }

    #[test]
    fn test_missing_executable_fails_to_start() {
        let server = ServerConfig {
            path: "/nonexistent/station-host-binary".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            ServerProcess::spawn(&server),
            Err(StationError::ServerStartFailed(_))
        ));
    }
}

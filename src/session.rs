//! Session: one protocol transaction at a time
//!
//! Every public operation runs through [`Session::transact`], which holds the
//! session lock, connects if needed, lets the caller write its request and
//! read its reply through an [`Exchange`], then reads and dispatches the
//! trailing status. Fatal protocol errors drop the connection; the next
//! transaction reconnects.

use crate::config::StationConfig;
use crate::connection::{Connection, ServerProcess};
use crate::item::{Item, ItemType};
use crate::matrix::Mat;
use crate::pose::Pose;
use crate::status::{self, Outcome};
use crate::{Result, StationError};
use std::net::TcpStream;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Socket timeout applied for the duration of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// The configured short timeout
    Short,
    /// At least the configured long timeout (one hour by default)
    Long,
    /// No timeout at all
    Indefinite,
}

/// Last non-zero status reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastStatus {
    pub code: i32,
    pub message: String,
}

struct Link {
    connection: Option<Connection>,
    server: Option<ServerProcess>,
    last_status: Option<LastStatus>,
    api_version: i32,
    build: i32,
    /// Short timeout in effect; starts at the configured one
    short_timeout: Duration,
}

struct SessionInner {
    config: StationConfig,
    link: Mutex<Link>,
    interrupt: Mutex<Option<TcpStream>>,
}

/// Shared handle on one Station Host connection
///
/// Clones share the connection and serialize on its lock. Use
/// [`Session::fork`] for an independent connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
    /// Session that connects on first use
    pub fn new(config: StationConfig) -> Self {
        let short_timeout = config.short_timeout();
        Self {
            inner: Arc::new(SessionInner {
                config,
                link: Mutex::new(Link {
                    connection: None,
                    server: None,
                    last_status: None,
                    api_version: 0,
                    build: 0,
                    short_timeout,
                }),
                interrupt: Mutex::new(None),
            }),
        }
    }

    /// Session connected right away
    pub fn connect(config: StationConfig) -> Result<Self> {
        let session = Self::new(config);
        session.ensure_connected()?;
        Ok(session)
    }

    /// Default configuration with environment overrides, connected
    pub fn from_env() -> Result<Self> {
        Self::connect(StationConfig::from_env()?)
    }

    pub fn config(&self) -> &StationConfig {
        &self.inner.config
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.inner.link).connection.is_some()
    }

    /// Build number reported by the last handshake (0 before connecting)
    pub fn build(&self) -> i32 {
        lock(&self.inner.link).build
    }

    pub fn api_version(&self) -> i32 {
        lock(&self.inner.link).api_version
    }

    pub fn last_status(&self) -> Option<LastStatus> {
        lock(&self.inner.link).last_status.clone()
    }

    /// Short timeout in effect for ordinary transactions
    pub fn timeout(&self) -> Duration {
        lock(&self.inner.link).short_timeout
    }

    /// Change the short timeout, in seconds, for this and later connections
    ///
    /// The long timeout never drops below it.
    pub fn set_timeout(&self, secs: f64) -> Result<()> {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(StationError::Input(format!(
                "Timeout must be a positive number of seconds, got {}",
                secs
            )));
        }
        let timeout = Duration::from_secs_f64(secs);
        let mut link = lock(&self.inner.link);
        link.short_timeout = timeout;
        if let Some(connection) = link.connection.as_mut() {
            connection.set_timeout(Some(timeout))?;
        }
        debug!("Short timeout set to {:?}", timeout);
        Ok(())
    }

    /// True when both handles refer to the same session
    pub fn same_as(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Connect if not connected yet
    pub fn ensure_connected(&self) -> Result<()> {
        let mut link = lock(&self.inner.link);
        self.open_locked(&mut link)
    }

    fn open_locked(&self, link: &mut Link) -> Result<()> {
        if link.connection.is_some() {
            return Ok(());
        }
        let connection =
            Connection::open(&self.inner.config, link.short_timeout, &mut link.server)?;
        link.api_version = connection.api_version();
        link.build = connection.build();
        *lock(&self.inner.interrupt) = connection.try_clone_stream().ok();
        link.connection = Some(connection);
        Ok(())
    }

    fn drop_connection(&self, link: &mut Link) {
        *lock(&self.inner.interrupt) = None;
        if let Some(connection) = link.connection.take() {
            connection.close();
        }
    }

    /// Replace the transport with a fresh connection, keeping the configuration
    pub fn new_link(&self) -> Result<()> {
        let mut link = lock(&self.inner.link);
        self.drop_connection(&mut link);
        self.open_locked(&mut link)
    }

    /// Independent session on a new connection with the same configuration
    pub fn fork(&self) -> Result<Session> {
        Session::connect(self.inner.config.clone())
    }

    /// Close the transport from any thread
    ///
    /// A transaction in flight fails with `FatalProtocol` and the session
    /// reconnects on its next use.
    pub fn interrupt(&self) {
        if let Some(stream) = lock(&self.inner.interrupt).take() {
            info!("Interrupting Station Host session");
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    /// Drop the transport without sending anything
    pub(crate) fn close_transport(&self) {
        let mut link = lock(&self.inner.link);
        self.drop_connection(&mut link);
    }

    /// Close the connection; quits an owned server when configured to
    pub fn disconnect(&self) -> Result<()> {
        let mut link = lock(&self.inner.link);
        disconnect_link(&self.inner.config, &mut link, &self.inner.interrupt)
    }

    /// Run one transaction
    ///
    /// `op` writes the command and its arguments and reads the reply fields;
    /// the trailing status is read afterwards. `op` must not call back into
    /// this session.
    pub fn transact<T>(
        &self,
        timeout: TimeoutClass,
        op: impl FnOnce(&mut Exchange<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = lock(&self.inner.link);
        let link = &mut *guard;

        if let Err(e) = self.open_locked(link) {
            return Err(match e {
                StationError::ConnectFailed(msg) => StationError::NotConnected(msg),
                other => other,
            });
        }

        let result = match link.connection.as_mut() {
            Some(connection) => {
                let mut exchange = Exchange {
                    session: self,
                    config: &self.inner.config,
                    connection,
                    last_status: &mut link.last_status,
                    build: link.build,
                    short_timeout: link.short_timeout,
                };
                run_transaction(&mut exchange, timeout, op)
            }
            None => Err(StationError::NotConnected(
                "Session has no connection".to_string(),
            )),
        };

        if let Err(e) = &result {
            if e.is_fatal() {
                warn!("Dropping Station Host connection: {}", e);
                self.drop_connection(link);
            } else if let Some(connection) = link.connection.as_mut() {
                connection.wire().discard_pending();
            }
        }
        result
    }

    /// Shorthand for a transaction under the short timeout
    pub fn call<T>(&self, op: impl FnOnce(&mut Exchange<'_>) -> Result<T>) -> Result<T> {
        self.transact(TimeoutClass::Short, op)
    }
}

fn run_transaction<T>(
    ex: &mut Exchange<'_>,
    timeout: TimeoutClass,
    op: impl FnOnce(&mut Exchange<'_>) -> Result<T>,
) -> Result<T> {
    ex.promote(timeout)?;
    let result = op(ex).and_then(|value| {
        ex.check_status()?;
        Ok(value)
    });
    // Ops may have promoted the timeout mid-transaction
    let restored = ex.promote(TimeoutClass::Short);
    if result.is_ok() {
        restored?;
    }
    result
}

fn disconnect_link(
    config: &StationConfig,
    link: &mut Link,
    interrupt: &Mutex<Option<TcpStream>>,
) -> Result<()> {
    *lock(interrupt) = None;
    let quit = link.server.is_some()
        && config
            .server
            .as_ref()
            .map_or(false, |server| server.quit_on_close);

    let mut connection = link.connection.take();
    if quit && connection.is_none() {
        // Dropped earlier; the owned server still needs its QUIT
        match Connection::open(config, link.short_timeout, &mut link.server) {
            Ok(reopened) => connection = Some(reopened),
            Err(e) => warn!("Could not reach the Station Host to quit it: {}", e),
        }
    }

    let mut quit_sent = false;
    if let Some(mut connection) = connection {
        if quit {
            match connection.quit() {
                Ok(()) => quit_sent = true,
                Err(e) => warn!("Station Host did not acknowledge QUIT: {}", e),
            }
        }
        connection.close();
        info!("Disconnected from Station Host");
    }

    if quit {
        if let Some(server) = link.server.take() {
            if quit_sent {
                server.wait()?;
            } else {
                server.kill()?;
            }
        }
    }
    Ok(())
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let link = self
            .link
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = disconnect_link(&self.config, link, &self.interrupt);
    }
}

/// Request/reply access handed to a transaction
pub struct Exchange<'a> {
    session: &'a Session,
    config: &'a StationConfig,
    connection: &'a mut Connection,
    last_status: &'a mut Option<LastStatus>,
    build: i32,
    short_timeout: Duration,
}

impl<'a> Exchange<'a> {
    /// Server build number, for commands whose schema changed over time
    pub fn build(&self) -> i32 {
        self.build
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    /// Change the socket timeout for the rest of the transaction
    pub fn promote(&mut self, class: TimeoutClass) -> Result<()> {
        let timeout = timeout_for(self.config, self.short_timeout, class);
        if self.connection.timeout() != timeout {
            debug!("Socket timeout set to {:?} ({:?})", timeout, class);
        }
        self.connection.set_timeout(timeout)
    }

    /// Read a status code (and its message) and dispatch it
    ///
    /// Called automatically at the end of every transaction; call it inside
    /// `op` only for commands that report more than one status.
    pub fn check_status(&mut self) -> Result<()> {
        let wire = self.connection.wire();
        let code = wire.rec_int()?;
        let message = if status::carries_message(code) {
            Some(wire.rec_line()?)
        } else {
            None
        };

        if code != status::STATUS_OK && !status::is_fatal_code(code) {
            *self.last_status = Some(LastStatus {
                code,
                message: message.clone().unwrap_or_default(),
            });
        }

        status::check(code, message).map(|_: Outcome| ())
    }

    pub fn send_line(&mut self, line: &str) {
        self.connection.wire().send_line(line);
    }

    pub fn send_int(&mut self, value: i32) {
        self.connection.wire().send_int(value);
    }

    /// Real value sent as `i32`, rounded half-to-even
    pub fn send_real_int(&mut self, value: f64) -> Result<()> {
        self.connection.wire().send_real_int(value)
    }

    pub fn send_bool(&mut self, value: bool) {
        self.send_int(i32::from(value));
    }

    pub fn send_ptr(&mut self, ptr: u64) {
        self.connection.wire().send_ptr(ptr);
    }

    pub fn send_item(&mut self, item: &Item) {
        self.send_ptr(item.ptr());
    }

    /// Send an optional item; `None` is the null pointer
    pub fn send_opt_item(&mut self, item: Option<&Item>) {
        self.send_ptr(item.map_or(0, Item::ptr));
    }

    pub fn send_f64(&mut self, value: f64) {
        self.connection.wire().send_f64(value);
    }

    pub fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.connection.wire().send_bytes(data)
    }

    pub fn send_array(&mut self, values: &[f64]) -> Result<()> {
        self.connection.wire().send_array(values)
    }

    pub fn send_pose(&mut self, pose: &Pose) {
        self.connection.wire().send_pose(pose);
    }

    pub fn send_matrix(&mut self, matrix: &Mat) -> Result<()> {
        self.connection.wire().send_matrix(matrix)
    }

    pub fn send_xyz(&mut self, xyz: &[f64; 3]) {
        self.connection.wire().send_xyz(xyz);
    }

    pub fn rec_line(&mut self) -> Result<String> {
        self.connection.wire().rec_line()
    }

    pub fn rec_int(&mut self) -> Result<i32> {
        self.connection.wire().rec_int()
    }

    pub fn rec_ptr(&mut self) -> Result<u64> {
        self.connection.wire().rec_ptr()
    }

    pub fn rec_f64(&mut self) -> Result<f64> {
        self.connection.wire().rec_f64()
    }

    pub fn rec_bytes(&mut self) -> Result<Vec<u8>> {
        self.connection.wire().rec_bytes()
    }

    pub fn rec_array(&mut self) -> Result<Vec<f64>> {
        self.connection.wire().rec_array()
    }

    pub fn rec_pose(&mut self) -> Result<Pose> {
        self.connection.wire().rec_pose()
    }

    pub fn rec_matrix(&mut self) -> Result<Mat> {
        self.connection.wire().rec_matrix()
    }

    pub fn rec_xyz(&mut self) -> Result<[f64; 3]> {
        self.connection.wire().rec_xyz()
    }

    /// Item handle bound to this session
    pub fn rec_item(&mut self) -> Result<Item> {
        let (ptr, kind) = self.connection.wire().rec_item()?;
        Ok(Item::new(self.session.clone(), ptr, ItemType::from(kind)))
    }

    /// `i32` count followed by that many items
    pub fn rec_item_list(&mut self) -> Result<Vec<Item>> {
        let n = self.rec_count()?;
        (0..n).map(|_| self.rec_item()).collect()
    }

    /// `i32` count followed by that many lines
    pub fn rec_line_list(&mut self) -> Result<Vec<String>> {
        let n = self.rec_count()?;
        (0..n).map(|_| self.rec_line()).collect()
    }

    /// Non-negative `i32` count
    pub fn rec_count(&mut self) -> Result<usize> {
        let n = self.rec_int()?;
        usize::try_from(n)
            .map_err(|_| StationError::FatalProtocol(format!("Negative count: {}", n)))
    }
}

/// Convert a length to a wire count
pub(crate) fn wire_count(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| StationError::Input(format!("Too many entries: {}", len)))
}

impl Default for Session {
    fn default() -> Self {
        Self::new(StationConfig::default())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.inner.config.host)
            .field("ports", &self.inner.config.ports)
            .finish()
    }
}

pub(crate) fn timeout_for(
    config: &StationConfig,
    short: Duration,
    class: TimeoutClass,
) -> Option<Duration> {
    match class {
        TimeoutClass::Short => Some(short),
        TimeoutClass::Long => Some(config.long_timeout().max(short)),
        TimeoutClass::Indefinite => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PortRange, ServerArgs, ServerConfig};
    use crate::wire::Wire;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    fn unreachable_config() -> StationConfig {
        StationConfig {
            host: "127.0.0.1".to_string(),
            ports: PortRange::single(1),
            ..StationConfig::default()
        }
    }

    #[test]
    fn test_timeout_classes() {
        let config = StationConfig::default();
        let short = config.short_timeout();
        assert_eq!(
            timeout_for(&config, short, TimeoutClass::Short),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            timeout_for(&config, short, TimeoutClass::Long),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(timeout_for(&config, short, TimeoutClass::Indefinite), None);

        let raised = Duration::from_secs(7200);
        assert_eq!(timeout_for(&config, raised, TimeoutClass::Long), Some(raised));
    }

    #[test]
    fn test_set_timeout() {
        let session = Session::new(unreachable_config());
        assert_eq!(session.timeout(), Duration::from_secs(10));

        session.set_timeout(0.25).unwrap();
        assert_eq!(session.timeout(), Duration::from_millis(250));
        assert!(matches!(session.set_timeout(0.0), Err(StationError::Input(_))));
        assert!(matches!(
            session.set_timeout(f64::NAN),
            Err(StationError::Input(_))
        ));
        assert_eq!(session.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_transaction_without_server_is_not_connected() {
        let session = Session::new(unreachable_config());
        let result = session.call(|ex| {
            ex.send_line("G_Item");
            ex.rec_item()
        });
        assert!(matches!(result, Err(StationError::NotConnected(_))));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_explicit_connect_reports_connect_failed() {
        assert!(matches!(
            Session::connect(unreachable_config()),
            Err(StationError::ConnectFailed(_))
        ));
    }

    /// Stand-in executable that reports running and then idles
    fn idle_server(secs: u32) -> ServerConfig {
        ServerConfig {
            path: "/bin/sh".into(),
            args: ServerArgs {
                extra: vec!["-c".to_string(), format!("echo running; sleep {}", secs)],
                ..ServerArgs::default()
            },
            quit_on_close: true,
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_quit_on_close_sends_quit_and_waits() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut wire = Wire::new(stream);
            assert_eq!(wire.rec_line().unwrap(), "RDK_API");
            wire.rec_array().unwrap();
            wire.send_line("RDK_API");
            wire.send_int(1);
            wire.send_int(5400);
            wire.send_int(0);
            assert_eq!(wire.rec_line().unwrap(), "QUIT");
            wire.send_int(0);
            wire.flush().unwrap();
        });

        let config = StationConfig {
            host: "127.0.0.1".to_string(),
            ports: PortRange::single(port),
            server: Some(idle_server(1)),
            ..StationConfig::default()
        };
        let session = Session::connect(config).unwrap();
        lock(&session.inner.link).server = Some(ServerProcess::spawn(&idle_server(1)).unwrap());

        session.disconnect().unwrap();
        assert!(lock(&session.inner.link).server.is_none());
        host.join().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_quit_on_close_without_connection_does_not_hang() {
        let config = StationConfig {
            server: Some(idle_server(60)),
            ..unreachable_config()
        };
        let session = Session::new(config);
        lock(&session.inner.link).server = Some(ServerProcess::spawn(&idle_server(60)).unwrap());

        let started = Instant::now();
        session.disconnect().unwrap();
        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(lock(&session.inner.link).server.is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let a = Session::new(unreachable_config());
        let b = a.clone();
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Session::new(unreachable_config())));
        assert_eq!(a.build(), 0);
        assert!(a.last_status().is_none());
        a.interrupt();
        a.disconnect().unwrap();
    }
}

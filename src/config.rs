//! Configuration loading for Station Host sessions
//!
//! A `StationConfig` is the discovery policy of a session: where to look for
//! the server, how long to wait, and how to launch it when nothing answers.
//! Every field has a default, so a partial YAML file is valid.

use crate::{Result, StationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 20500;
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
pub const DEFAULT_LONG_TIMEOUT_SECS: f64 = 3600.0;

pub const ENV_PORT: &str = "STATION_HOST_PORT";
pub const ENV_ADDR: &str = "STATION_HOST_ADDR";
pub const ENV_PATH: &str = "STATION_HOST_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    pub host: String,
    pub ports: PortRange,
    pub timeouts: TimeoutConfig,
    pub handshake: HandshakeConfig,
    pub server: Option<ServerConfig>,
}

/// Inclusive port range scanned on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Seconds for ordinary transactions
    pub short: f64,
    /// Seconds for blocking moves, program generation and other long calls
    pub long: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Ask the server to validate arguments more strictly
    pub safe_mode: bool,
    /// Let the server keep rendering while the client is connected
    pub auto_update: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Executable started when no server answers on a local host
    pub path: PathBuf,
    pub args: ServerArgs,
    /// Send QUIT and wait for the child when the session closes
    pub quit_on_close: bool,
}

/// Launch flags understood by the Station Host executable
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerArgs {
    pub new_instance: bool,
    pub hidden: bool,
    pub no_splash: bool,
    pub debug: bool,
    pub port: Option<u16>,
    pub exit_on_last_client: bool,
    pub extra: Vec<String>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ports: PortRange::single(DEFAULT_PORT),
            timeouts: TimeoutConfig::default(),
            handshake: HandshakeConfig::default(),
            server: None,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            short: DEFAULT_TIMEOUT_SECS,
            long: DEFAULT_LONG_TIMEOUT_SECS,
        }
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            auto_update: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            args: ServerArgs::default(),
            quit_on_close: false,
        }
    }
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }
}

impl ServerArgs {
    /// Command-line arguments in the order the executable expects
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.new_instance {
            args.push("/NEWINSTANCE".to_string());
        }
        if self.hidden {
            args.push("/HIDDEN".to_string());
        }
        if self.no_splash {
            args.push("/NOSPLASH".to_string());
        }
        if self.debug {
            args.push("/DEBUG".to_string());
        }
        if let Some(port) = self.port {
            args.push(format!("/PORT={}", port));
        }
        if self.exit_on_last_client {
            args.push("/EXIT_LAST_COM".to_string());
        }
        args.extend(self.extra.iter().cloned());
        args
    }
}

impl StationConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            StationError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_str(contents: &str) -> Result<Self> {
        let config: StationConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup(ENV_PORT) {
            let port: u16 = port.trim().parse().map_err(|_| {
                StationError::Config(format!("{} is not a valid port: {}", ENV_PORT, port))
            })?;
            self.ports = PortRange::single(port);
        }
        if let Some(host) = lookup(ENV_ADDR) {
            if !host.trim().is_empty() {
                self.host = host.trim().to_string();
            }
        }
        if let Some(path) = lookup(ENV_PATH) {
            if !path.trim().is_empty() {
                self.server.get_or_insert_with(ServerConfig::default).path =
                    PathBuf::from(path.trim());
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(StationError::Config("Host must not be empty".to_string()));
        }
        if self.ports.start > self.ports.end {
            return Err(StationError::Config(format!(
                "Port range {}-{} is empty",
                self.ports.start, self.ports.end
            )));
        }
        for (name, secs) in [("short", self.timeouts.short), ("long", self.timeouts.long)] {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(StationError::Config(format!(
                    "The {} timeout must be a positive number of seconds, got {}",
                    name, secs
                )));
            }
        }
        Ok(())
    }

    /// Ports to scan; a launch port in the server arguments pins the range
    pub fn effective_ports(&self) -> PortRange {
        match self.server.as_ref().and_then(|s| s.args.port) {
            Some(port) => PortRange::single(port),
            None => self.ports,
        }
    }

    pub fn is_local_host(&self) -> bool {
        matches!(
            self.host.to_ascii_lowercase().as_str(),
            "localhost" | "127.0.0.1" | "::1" | "[::1]"
        )
    }

    pub fn short_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeouts.short)
    }

    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeouts.long.max(self.timeouts.short))
    }

    /// Launchable server, if one is configured with a non-empty path
    pub fn launchable_server(&self) -> Option<&ServerConfig> {
        self.server
            .as_ref()
            .filter(|s| !s.path.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StationConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.ports, PortRange::single(20500));
        assert_eq!(config.short_timeout(), Duration::from_secs(10));
        assert_eq!(config.long_timeout(), Duration::from_secs(3600));
        assert!(config.is_local_host());
        assert!(config.launchable_server().is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
host: 192.168.1.20
ports:
  start: 20500
  end: 20502
timeouts:
  short: 5
server:
  path: /opt/station/bin/StationHost
  quit_on_close: true
  args:
    hidden: true
    port: 20600
"#;
        let config = StationConfig::load_from_str(yaml).unwrap();
        assert_eq!(config.ports.iter().collect::<Vec<_>>(), vec![20500, 20501, 20502]);
        assert_eq!(config.timeouts.short, 5.0);
        assert_eq!(config.timeouts.long, DEFAULT_LONG_TIMEOUT_SECS);
        assert!(!config.is_local_host());
        assert_eq!(config.effective_ports(), PortRange::single(20600));

        let server = config.launchable_server().unwrap();
        assert!(server.quit_on_close);
        assert_eq!(server.args.to_args(), vec!["/HIDDEN", "/PORT=20600"]);
    }

    #[test]
    fn test_sample_config_loads() {
        let config = StationConfig::load_from_str(include_str!("../config/station.yaml")).unwrap();
        assert_eq!(config.ports, PortRange::single(DEFAULT_PORT));
        assert!(config.handshake.safe_mode);
        assert_eq!(config.server.unwrap().args.to_args(), vec!["/NOSPLASH"]);
    }

    #[test]
    fn test_invalid_yaml_values() {
        assert!(StationConfig::load_from_str("ports: {start: 3, end: 1}").is_err());
        assert!(StationConfig::load_from_str("timeouts: {short: 0}").is_err());
        assert!(matches!(
            StationConfig::load_from_str("host: [1, 2"),
            Err(StationError::Yaml(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_PORT, "20777"),
            (ENV_ADDR, "10.0.0.5"),
            (ENV_PATH, "/usr/local/bin/StationHost"),
        ]
        .into_iter()
        .collect();

        let mut config = StationConfig::default();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.ports, PortRange::single(20777));
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(
            config.launchable_server().unwrap().path,
            PathBuf::from("/usr/local/bin/StationHost")
        );

        let mut config = StationConfig::default();
        assert!(config
            .apply_env_from(|key| (key == ENV_PORT).then(|| "not-a-port".to_string()))
            .is_err());
    }

    #[test]
    fn test_server_args_order() {
        let args = ServerArgs {
            new_instance: true,
            hidden: true,
            no_splash: true,
            debug: true,
            port: Some(20501),
            exit_on_last_client: true,
            extra: vec!["-SKIPINI".to_string()],
        };
        assert_eq!(
            args.to_args(),
            vec![
                "/NEWINSTANCE",
                "/HIDDEN",
                "/NOSPLASH",
                "/DEBUG",
                "/PORT=20501",
                "/EXIT_LAST_COM",
                "-SKIPINI"
            ]
        );
    }
}

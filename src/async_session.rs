//! Async wrapper around [`Session`]
//!
//! The protocol is synchronous; every call here runs on tokio's blocking
//! pool so async callers never stall the reactor. Calls on one
//! `AsyncSession` still serialize on the session lock.

use crate::config::StationConfig;
use crate::item::{Item, ItemType};
use crate::pose::Pose;
use crate::session::{Exchange, Session, TimeoutClass};
use crate::station::ServerVersion;
use crate::Result;
use tokio::task;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct AsyncSession {
    session: Session,
}

impl AsyncSession {
    /// Wrap an existing session; the two share one connection
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Connect without blocking the runtime
    pub async fn connect(config: StationConfig) -> Result<Self> {
        let session = task::spawn_blocking(move || Session::connect(config)).await??;
        Ok(Self { session })
    }

    /// The underlying blocking session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run blocking work that uses the session
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> Result<T> + Send + 'static,
    {
        let session = self.session.clone();
        task::spawn_blocking(move || f(&session)).await?
    }

    /// Async counterpart of [`Session::transact`]
    pub async fn transact<T, F>(&self, timeout: TimeoutClass, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Exchange<'_>) -> Result<T> + Send + 'static,
    {
        self.run(move |session| session.transact(timeout, op)).await
    }

    pub async fn version(&self) -> Result<ServerVersion> {
        self.run(|session| session.version()).await
    }

    pub async fn item(&self, name: &str, kind: Option<ItemType>) -> Result<Item> {
        let name = name.to_string();
        self.run(move |session| session.item(&name, kind)).await
    }

    pub async fn items(&self, kind: Option<ItemType>) -> Result<Vec<Item>> {
        self.run(move |session| session.items(kind)).await
    }

    pub async fn pose(&self, item: &Item) -> Result<Pose> {
        let item = item.clone();
        self.run(move |_| item.pose()).await
    }

    pub async fn set_pose(&self, item: &Item, pose: Pose) -> Result<()> {
        let item = item.clone();
        self.run(move |_| item.set_pose(&pose)).await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.run(|session| session.refresh()).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        debug!("Disconnecting async session");
        self.run(|session| session.disconnect()).await
    }
}

impl From<Session> for AsyncSession {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortRange;
    use crate::StationError;

    fn unreachable_config() -> StationConfig {
        StationConfig {
            host: "127.0.0.1".to_string(),
            ports: PortRange::single(1),
            ..StationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let result = AsyncSession::connect(unreachable_config()).await;
        assert!(matches!(result, Err(StationError::ConnectFailed(_))));
    }

    #[tokio::test]
    async fn test_calls_without_server_are_not_connected() {
        let session = AsyncSession::new(Session::new(unreachable_config()));
        assert!(matches!(
            session.version().await,
            Err(StationError::NotConnected(_))
        ));
        assert!(!session.session().is_connected());
    }

    #[tokio::test]
    async fn test_invalid_item_fails_before_connecting() {
        let session = AsyncSession::new(Session::new(unreachable_config()));
        let null = Item::new(session.session().clone(), 0, ItemType::Frame);
        assert!(matches!(
            session.pose(&null).await,
            Err(StationError::InvalidItem(_))
        ));
    }
}

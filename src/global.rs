use std::net::SocketAddr;
use std::sync::Arc;

use parse_display::Display;
use tokio::sync::{broadcast, RwLock};

mod event;
pub use event::*;

mod hook_runner;
pub use hook_runner::*;

mod paths;
pub use paths::*;

use crate::models::{Config, GlobalConfig};
use crate::registry::VirtualRegistry;

/// Identity of a connected API client, for logging
#[derive(Display, Debug)]
pub enum ClientName {
    #[display("JSON({peer_addr})")]
    Json { peer_addr: SocketAddr },
    #[display("Web({session_id})")]
    Web { session_id: uuid::Uuid },
}

#[derive(Clone)]
pub struct Global(Arc<RwLock<GlobalData>>);

impl Global {
    pub async fn read_registry<T>(&self, f: impl FnOnce(&VirtualRegistry) -> T) -> T {
        let data = self.0.read().await;
        f(&data.registry)
    }

    /// Run a mutation on the registry under the write lock. Segment
    /// submissions funnel through here, which serializes concurrent order
    /// number assignment.
    pub async fn update_registry<T>(&self, f: impl FnOnce(&mut VirtualRegistry) -> T) -> T {
        let mut data = self.0.write().await;
        f(&mut data.registry)
    }

    pub async fn read_config<T>(&self, f: impl FnOnce(&GlobalConfig) -> T) -> T {
        let data = self.0.read().await;
        f(&data.config)
    }

    pub async fn uuid(&self) -> uuid::Uuid {
        self.0.read().await.uuid
    }

    pub async fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.0.read().await.event_tx.subscribe()
    }

    pub async fn get_event_tx(&self) -> broadcast::Sender<Event> {
        self.0.read().await.event_tx.clone()
    }
}

pub struct GlobalData {
    event_tx: broadcast::Sender<Event>,
    registry: VirtualRegistry,
    config: GlobalConfig,
    uuid: uuid::Uuid,
}

impl GlobalData {
    pub fn new(config: &Config) -> Self {
        let (event_tx, _) = broadcast::channel(4);

        Self {
            event_tx,
            registry: VirtualRegistry::new(config),
            config: config.global.clone(),
            uuid: config.uuid(),
        }
    }

    pub fn wrap(self) -> Global {
        Global(Arc::new(RwLock::new(self)))
    }
}

use std::sync::Arc;

use crate::{
    config::ServerConfig,
    key_value_store::KeyValueStore,
    pubsub::Broker,
    replication::{ReplicationCoordinator, Role},
};

/// Server-wide components shared by every connection.
#[derive(Debug, Clone)]
pub struct State {
    pub store: Arc<KeyValueStore>,
    pub broker: Arc<Broker>,
    pub replication: Arc<ReplicationCoordinator>,
    pub config: Arc<ServerConfig>,
}

impl State {
    /// Builds the components for `config`. Must be called from within a
    /// Tokio runtime since the store starts its expiry sweep.
    pub fn new(config: ServerConfig) -> Self {
        let role = match &config.replicaof {
            Some(master) => Role::Replica(master.clone()),
            None => Role::Master,
        };

        Self {
            store: KeyValueStore::new(),
            broker: Arc::new(Broker::new()),
            replication: Arc::new(ReplicationCoordinator::new(role)),
            config: Arc::new(config),
        }
    }

    pub fn is_replica(&self) -> bool {
        !self.replication.is_master()
    }

    /// Stops the topic actors and the expiry sweep.
    pub async fn shutdown(&self) {
        self.broker.close().await;
        self.store.close();
    }
}

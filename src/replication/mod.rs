//! Master/replica replication.
//!
//! The coordinator owns the set of attached replicas, the replication
//! offset and the acknowledgment table used by `WAIT`. Replicas are
//! registered after a successful `PSYNC` and removed when their connection
//! closes.
//!
//! A master runs every write and its propagation while holding the
//! write-order lock, so replicas receive writes in execution order and a
//! snapshot taken under the same lock is never missing a write.

mod handshake;
mod offset;

use std::{collections::HashMap, sync::Arc, time::Duration};

use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::{oneshot, Mutex, MutexGuard, RwLock},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    config::ReplicaOf,
    key_value_store::KeyValueStore,
    rdb::{encode_snapshot, RdbError},
    resp::{RespError, RespValue},
};

pub use handshake::{is_valid_replication_id, perform_handshake, HandshakeOutcome};
pub use offset::OffsetTracker;

pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const REPLICATION_ID_LENGTH: usize = 40;

/// Write half of a connection shared between its own task and the
/// coordinator, which writes propagated commands to it.
pub type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),
    #[error("connection closed during {0}")]
    ConnectionClosed(&'static str),
    #[error("unexpected reply to {step}: {reply}")]
    UnexpectedReply { step: &'static str, reply: String },
    #[error("invalid replication id '{0}'")]
    InvalidReplicationId(String),
    #[error("failed to write to replica {address}: {source}")]
    Propagation {
        address: String,
        source: std::io::Error,
    },
    #[error("WAIT was interrupted")]
    WaitInterrupted,
    #[error("invalid snapshot from master: {0}")]
    Snapshot(#[from] RdbError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Master,
    Replica(ReplicaOf),
}

impl Role {
    /// Role name as reported by INFO and CONFIG GET.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Replica(_) => "slave",
        }
    }
}

pub fn generate_replication_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REPLICATION_ID_LENGTH)
        .map(char::from)
        .collect()
}

struct ReplicaConnection {
    address: String,
    writer: SharedWriter,
}

pub struct ReplicationCoordinator {
    role: Role,
    replication_id: RwLock<String>,
    write_order: Mutex<()>,
    replicas: Mutex<Vec<ReplicaConnection>>,
    acknowledgments: Mutex<HashMap<String, u64>>,
    offset: OffsetTracker,
}

impl std::fmt::Debug for ReplicationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationCoordinator")
            .field("role", &self.role)
            .field("offset", &self.offset.get())
            .finish()
    }
}

impl ReplicationCoordinator {
    pub fn new(role: Role) -> Self {
        Self::with_replication_id(role, generate_replication_id())
    }

    pub fn with_replication_id(role: Role, replication_id: String) -> Self {
        Self {
            role,
            replication_id: RwLock::new(replication_id),
            write_order: Mutex::new(()),
            replicas: Mutex::new(Vec::new()),
            acknowledgments: Mutex::new(HashMap::new()),
            offset: OffsetTracker::default(),
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }

    pub async fn replication_id(&self) -> String {
        self.replication_id.read().await.clone()
    }

    /// Adopts the id and offset announced by the master in `+FULLRESYNC`.
    pub async fn follow_master(&self, replication_id: String, offset: u64) {
        *self.replication_id.write().await = replication_id;
        self.offset.reset(offset);
    }

    pub fn offset(&self) -> &OffsetTracker {
        &self.offset
    }

    /// Serialises writes with their propagation. Hold the guard from before
    /// a write command runs until it has been propagated.
    pub async fn order_writes(&self) -> MutexGuard<'_, ()> {
        self.write_order.lock().await
    }

    pub async fn replica_count(&self) -> usize {
        self.replicas.lock().await.len()
    }

    /// Completes a full resynchronisation: snapshots `store`, writes
    /// `+FULLRESYNC` and the snapshot payload, and registers the connection
    /// as a replica. No write can run between the snapshot and the
    /// registration, so every write is either in the snapshot or propagated
    /// to the new replica.
    pub async fn attach_replica(
        &self,
        address: &str,
        writer: SharedWriter,
        store: &KeyValueStore,
    ) -> Result<(), ReplicationError> {
        let _order = self.order_writes().await;
        let mut replicas = self.replicas.lock().await;

        let snapshot = encode_snapshot(&store.entries().await);

        let fullresync = RespValue::SimpleString(format!(
            "FULLRESYNC {} {}",
            self.replication_id().await,
            self.offset.get()
        ));

        {
            let mut writer_guard = writer.lock().await;
            writer_guard.write_all(fullresync.encode().as_bytes()).await?;
            writer_guard
                .write_all(format!("${}\r\n", snapshot.len()).as_bytes())
                .await?;
            writer_guard.write_all(&snapshot).await?;
            writer_guard.flush().await?;
        }

        replicas.retain(|replica| replica.address != address);
        replicas.push(ReplicaConnection {
            address: address.to_string(),
            writer,
        });

        info!(replica = address, count = replicas.len(), "replica attached");

        Ok(())
    }

    pub async fn detach_replica(&self, address: &str) {
        let mut replicas = self.replicas.lock().await;
        let before = replicas.len();
        replicas.retain(|replica| replica.address != address);

        if replicas.len() != before {
            self.acknowledgments.lock().await.remove(address);
            info!(replica = address, count = replicas.len(), "replica detached");
        }
    }

    /// Writes `command` to every replica in attach order and advances the
    /// offset by its encoded size. The fan-out stops at the first failing
    /// replica.
    pub async fn propagate(&self, command: &RespValue) -> Result<(), ReplicationError> {
        let encoded = command.encode();
        let replicas = self.replicas.lock().await;

        self.offset.advance(encoded.len());

        for replica in replicas.iter() {
            let mut writer_guard = replica.writer.lock().await;

            let written = match writer_guard.write_all(encoded.as_bytes()).await {
                Ok(()) => writer_guard.flush().await,
                Err(e) => Err(e),
            };

            if let Err(source) = written {
                return Err(ReplicationError::Propagation {
                    address: replica.address.clone(),
                    source,
                });
            }
        }

        Ok(())
    }

    /// Records `REPLCONF ACK <offset>` from `address`. A newer ack replaces
    /// the previous one.
    pub async fn record_acknowledgment(&self, address: &str, offset: u64) {
        debug!(replica = address, offset, "replica acknowledged");
        self.acknowledgments
            .lock()
            .await
            .insert(address.to_string(), offset);
    }

    pub async fn acknowledged_count(&self, target: u64) -> usize {
        self.acknowledgments
            .lock()
            .await
            .values()
            .filter(|offset| **offset >= target)
            .count()
    }

    /// Blocks until `required` replicas acknowledged the current offset or
    /// `timeout_ms` elapsed (0 waits forever), returning the count reached.
    ///
    /// When nothing was propagated yet, or no replicas are required, the
    /// number of attached replicas is returned at once.
    pub async fn wait(
        self: &Arc<Self>,
        required: usize,
        timeout_ms: u64,
    ) -> Result<usize, ReplicationError> {
        let target = self.offset.get();

        if required == 0 || target == 0 {
            return Ok(self.replica_count().await);
        }

        self.acknowledgments.lock().await.clear();
        self.propagate(&RespValue::array_of_bulk_strings(["REPLCONF", "GETACK", "*"]))
            .await?;

        let (sender, receiver) = oneshot::channel();
        let coordinator = Arc::clone(self);
        let deadline = (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms));

        tokio::spawn(async move {
            loop {
                let acknowledged = coordinator.acknowledged_count(target).await;
                let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);

                if acknowledged >= required || expired {
                    let _ = sender.send(acknowledged);
                    return;
                }

                if sender.is_closed() {
                    return;
                }

                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        });

        match receiver.await {
            Ok(count) => Ok(count),
            Err(_) => {
                warn!("WAIT poller stopped without a result");
                Err(ReplicationError::WaitInterrupted)
            }
        }
    }
}

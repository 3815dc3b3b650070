//! Thread-safe keyspace shared by every connection.
//!
//! Entries carry an optional expiry expressed in Unix epoch milliseconds.
//! Expiry is enforced lazily on access and by a background sweep that runs
//! from store creation until [`KeyValueStore::close`].

mod sorted_set;
mod stream;

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Weak},
    time::Duration,
};

use thiserror::Error;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::debug;

pub use sorted_set::{AddOutcome, SortedSet};
pub use stream::{IdSpec, Stream, StreamEntry, StreamError, StreamId};

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
}

/// Current wall clock time in Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    jiff::Timestamp::now().as_millisecond()
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    SortedSet(SortedSet),
    Stream(Stream),
}

impl DataType {
    /// Name reported by the TYPE command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::SortedSet(_) => "zset",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    /// Absolute expiry in Unix epoch milliseconds.
    pub expiration: Option<i64>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn with_expiration(data: DataType, expiration: Option<i64>) -> Self {
        Self { data, expiration }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expiration.is_some_and(|expiration| now >= expiration)
    }
}

#[derive(Debug)]
pub struct KeyValueStore {
    entries: Mutex<HashMap<String, Value>>,
    shutdown: watch::Sender<bool>,
}

impl KeyValueStore {
    /// Creates the store and starts its expiry sweep. Must be called from
    /// within a Tokio runtime.
    pub fn new() -> Arc<Self> {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(period: Duration) -> Arc<Self> {
        let (shutdown, shutdown_receiver) = watch::channel(false);

        let store = Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            shutdown,
        });

        spawn_sweeper(Arc::downgrade(&store), shutdown_receiver, period);

        store
    }

    /// Locks the keyspace for a sequence of reads and writes that must not
    /// interleave with other connections, such as read-modify-write commands.
    pub async fn lock(&self) -> Keyspace<'_> {
        Keyspace {
            entries: self.entries.lock().await,
            now: now_ms(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<DataType> {
        self.lock().await.get(key).map(|value| value.data.clone())
    }

    pub async fn set(&self, key: &str, data: DataType, expiration: Option<i64>) {
        self.lock()
            .await
            .insert(key.to_string(), Value::with_expiration(data, expiration));
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.lock().await.remove(key).is_some()
    }

    /// Returns the live keys. Only the `*` pattern is understood, any other
    /// pattern matches a key only when equal to it.
    pub async fn keys(&self, pattern: &str) -> Vec<String> {
        let keyspace = self.lock().await;

        keyspace
            .live_keys()
            .filter(|key| pattern == "*" || *key == pattern)
            .map(str::to_string)
            .collect()
    }

    /// Clones every live entry, used to build snapshots.
    pub async fn entries(&self) -> Vec<(String, Value)> {
        let keyspace = self.lock().await;
        let now = keyspace.now;

        keyspace
            .entries
            .iter()
            .filter(|(_, value)| !value.is_expired(now))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Replaces the keyspace content with the given entries, skipping the
    /// ones that are already expired.
    pub async fn load(&self, entries: impl IntoIterator<Item = (String, Value)>) -> usize {
        let mut keyspace = self.lock().await;
        let now = keyspace.now;
        keyspace.entries.clear();

        for (key, value) in entries {
            if !value.is_expired(now) {
                keyspace.entries.insert(key, value);
            }
        }

        keyspace.entries.len()
    }

    async fn evict_expired(&self) -> usize {
        let mut keyspace = self.lock().await;
        let now = keyspace.now;
        let before = keyspace.entries.len();

        keyspace.entries.retain(|_, value| !value.is_expired(now));

        before - keyspace.entries.len()
    }

    /// Stops the expiry sweep. Calling it more than once has no effect.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Drop for KeyValueStore {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_sweeper(
    store: Weak<KeyValueStore>,
    mut shutdown: watch::Receiver<bool>,
    period: Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(store) = store.upgrade() else {
                        break;
                    };

                    let evicted = store.evict_expired().await;

                    if evicted > 0 {
                        debug!(evicted, "swept expired keys");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("expiry sweep stopped");
    });
}

/// Exclusive view over the keyspace returned by [`KeyValueStore::lock`].
///
/// Every accessor evicts the addressed key first when it has expired, so
/// callers never observe a stale entry.
pub struct Keyspace<'a> {
    entries: MutexGuard<'a, HashMap<String, Value>>,
    now: i64,
}

impl Keyspace<'_> {
    fn evict_if_expired(&mut self, key: &str) {
        let now = self.now;

        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(now))
        {
            self.entries.remove(key);
        }
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.evict_if_expired(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.evict_if_expired(key);
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.evict_if_expired(key);
        self.entries.remove(key)
    }

    pub fn contains_key(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn live_keys(&self) -> impl Iterator<Item = &str> {
        let now = self.now;

        self.entries
            .iter()
            .filter(move |(_, value)| !value.is_expired(now))
            .map(|(key, _)| key.as_str())
    }

    fn ensure(&mut self, key: &str, empty: impl FnOnce() -> DataType) {
        self.evict_if_expired(key);

        if !self.entries.contains_key(key) {
            self.entries.insert(key.to_string(), Value::new(empty()));
        }
    }

    pub fn string(&mut self, key: &str) -> Result<Option<&String>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::String(value),
                ..
            }) => Ok(Some(value)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn list(&mut self, key: &str) -> Result<Option<&VecDeque<String>>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Mutable list access. When `create` is set a missing key is initialised
    /// with an empty list.
    pub fn list_mut(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut VecDeque<String>>, StoreError> {
        if create {
            self.ensure(key, || DataType::List(VecDeque::new()));
        }

        match self.get_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn sorted_set(&mut self, key: &str) -> Result<Option<&SortedSet>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::SortedSet(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn sorted_set_mut(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut SortedSet>, StoreError> {
        if create {
            self.ensure(key, || DataType::SortedSet(SortedSet::default()));
        }

        match self.get_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::SortedSet(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn stream(&mut self, key: &str) -> Result<Option<&Stream>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(Some(stream)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn stream_mut(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut Stream>, StoreError> {
        if create {
            self.ensure(key, || DataType::Stream(Stream::default()));
        }

        match self.get_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(Some(stream)),
            Some(_) => Err(StoreError::WrongType),
        }
    }
}

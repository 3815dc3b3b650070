//! Topic broker with one actor task per topic.
//!
//! A topic actor is spawned by the first subscription to its name and exits
//! once its last subscriber leaves, or when the broker is closed. Besides
//! regular channels, blocking commands use first-only topics, where each
//! published message goes to the oldest live subscriber only.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use thiserror::Error;
use tokio::{
    select,
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot, watch, Mutex,
    },
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::resp::RespValue;

pub type Message = RespValue;

const TOPIC_INBOX_CAPACITY: usize = 64;
const SUBSCRIBER_CAPACITY: usize = 64;

/// Topic used for `SUBSCRIBE`/`PUBLISH` channels.
pub fn channel_topic(channel: &str) -> String {
    format!("channel:{}", channel)
}

/// First-only topic woken by pushes to a list.
pub fn list_topic(key: &str) -> String {
    format!("list:{}", key)
}

/// Topic woken by appends to a stream.
pub fn stream_topic(key: &str) -> String {
    format!("stream:{}", key)
}

#[derive(Error, Debug, PartialEq)]
pub enum BrokerError {
    #[error("broker is closed")]
    Closed,
}

struct SubscribeRequest {
    reply: oneshot::Sender<(u64, mpsc::Receiver<Message>)>,
}

struct TopicHandle {
    /// Tells a topic's current actor apart from one that already exited.
    generation: u64,
    publish: mpsc::Sender<Message>,
    subscribe: mpsc::Sender<SubscribeRequest>,
    unsubscribe: mpsc::UnboundedSender<u64>,
    subscribers: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

type Topics = Mutex<HashMap<String, TopicHandle>>;

#[derive(Debug)]
pub struct Broker {
    topics: Arc<Topics>,
    generations: AtomicU64,
    quit: watch::Sender<bool>,
}

impl std::fmt::Debug for TopicHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicHandle")
            .field("subscribers", &self.subscribers.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        let (quit, _) = watch::channel(false);

        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(0),
            quit,
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.quit.borrow()
    }

    /// Registers a new subscriber on `topic`, starting the topic actor when
    /// needed. `first_only` only matters when the actor is created.
    pub async fn subscribe(
        &self,
        topic: &str,
        first_only: bool,
    ) -> Result<Subscription, BrokerError> {
        loop {
            if self.is_closed() {
                return Err(BrokerError::Closed);
            }

            let (requests, unsubscribe) = {
                let mut topics = self.topics.lock().await;

                let stale = topics
                    .get(topic)
                    .map_or(true, |handle| handle.subscribe.is_closed());

                if stale {
                    topics.insert(topic.to_string(), self.spawn_topic(topic, first_only));
                }

                let handle = &topics[topic];
                (handle.subscribe.clone(), handle.unsubscribe.clone())
            };

            let (reply, response) = oneshot::channel();

            // The actor may exit between the lookup and the request; retry
            // with a fresh one.
            if requests.send(SubscribeRequest { reply }).await.is_err() {
                continue;
            }

            let Ok((id, messages)) = response.await else {
                continue;
            };

            return Ok(Subscription {
                id,
                topic: topic.to_string(),
                messages,
                unsubscribe,
                closed: false,
            });
        }
    }

    /// Queues `message` for every subscriber of `topic` without waiting.
    /// Returns the number of subscribers the topic had, or 0 when the topic
    /// does not exist or its inbox is full.
    pub async fn publish(&self, topic: &str, message: Message) -> usize {
        let topics = self.topics.lock().await;

        let Some(handle) = topics.get(topic) else {
            return 0;
        };

        match handle.publish.try_send(message) {
            Ok(()) => handle.subscribers.load(Ordering::SeqCst),
            Err(TrySendError::Full(_)) => {
                warn!(topic, "topic inbox full, dropping message");
                0
            }
            Err(TrySendError::Closed(_)) => 0,
        }
    }

    /// Removes subscriber `id` from `topic`. The subscriber's pending
    /// receive returns `None` once the actor drops it.
    pub async fn unsubscribe(&self, topic: &str, id: u64) {
        let topics = self.topics.lock().await;

        if let Some(handle) = topics.get(topic) {
            let _ = handle.unsubscribe.send(id);
        }
    }

    /// Number of topics with a registered actor.
    pub async fn topic_count(&self) -> usize {
        self.topics.lock().await.len()
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.lock().await;

        topics
            .get(topic)
            .filter(|handle| !handle.subscribe.is_closed())
            .map_or(0, |handle| handle.subscribers.load(Ordering::SeqCst))
    }

    /// Waits for the next message on a first-only subscription to `topic`.
    ///
    /// A `timeout_ms` of 0 waits until a message arrives or the broker
    /// closes, a negative value returns immediately.
    pub async fn read_last(
        &self,
        topic: &str,
        timeout_ms: i64,
    ) -> Result<Option<Message>, BrokerError> {
        let mut subscription = self.subscribe(topic, true).await?;
        let message = subscription.recv_timeout(timeout_ms).await;
        subscription.close();

        Ok(message)
    }

    /// Signals every topic actor to drop its subscribers and waits until all
    /// of them have exited.
    pub async fn close(&self) {
        self.quit.send_replace(true);

        let tasks: Vec<(String, JoinHandle<()>)> = {
            let mut topics = self.topics.lock().await;
            topics
                .drain()
                .map(|(topic, handle)| (topic, handle.task))
                .collect()
        };

        for (topic, task) in tasks {
            if let Err(err) = task.await {
                warn!(topic = %topic, error = ?err, "topic actor failed");
            }
        }
    }

    fn spawn_topic(&self, topic: &str, first_only: bool) -> TopicHandle {
        let (publish, publish_inbox) = mpsc::channel(TOPIC_INBOX_CAPACITY);
        let (subscribe, subscribe_inbox) = mpsc::channel(1);
        let (unsubscribe, unsubscribe_inbox) = mpsc::unbounded_channel();
        let subscribers = Arc::new(AtomicUsize::new(0));
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);

        let actor = TopicActor {
            topic: topic.to_string(),
            generation,
            registry: Arc::downgrade(&self.topics),
            first_only,
            subscribers: BTreeMap::new(),
            next_id: 0,
            count: Arc::clone(&subscribers),
        };

        let task = tokio::spawn(actor.run(
            publish_inbox,
            subscribe_inbox,
            unsubscribe_inbox,
            self.quit.subscribe(),
        ));

        TopicHandle {
            generation,
            publish,
            subscribe,
            unsubscribe,
            subscribers,
            task,
        }
    }
}

struct TopicActor {
    topic: String,
    generation: u64,
    registry: Weak<Topics>,
    first_only: bool,
    subscribers: BTreeMap<u64, mpsc::Sender<Message>>,
    next_id: u64,
    count: Arc<AtomicUsize>,
}

impl TopicActor {
    async fn run(
        mut self,
        mut publish: mpsc::Receiver<Message>,
        mut subscribe: mpsc::Receiver<SubscribeRequest>,
        mut unsubscribe: mpsc::UnboundedReceiver<u64>,
        mut quit: watch::Receiver<bool>,
    ) {
        debug!(topic = %self.topic, first_only = self.first_only, "topic actor started");

        if *quit.borrow() {
            self.deregister().await;
            return;
        }

        loop {
            select! {
                Some(request) = subscribe.recv() => self.register(request),
                Some(id) = unsubscribe.recv() => {
                    self.subscribers.remove(&id);
                    self.update_count();

                    if self.subscribers.is_empty() {
                        break;
                    }
                }
                Some(message) = publish.recv() => {
                    self.deliver(message);

                    if self.subscribers.is_empty() {
                        break;
                    }
                }
                _ = quit.changed() => {
                    self.subscribers.clear();
                    self.update_count();
                    break;
                }
                else => break,
            }
        }

        self.deregister().await;
        debug!(topic = %self.topic, "topic actor stopped");
    }

    /// Removes this actor's handle, unless a newer actor replaced it.
    async fn deregister(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        let mut topics = registry.lock().await;

        if topics
            .get(&self.topic)
            .is_some_and(|handle| handle.generation == self.generation)
        {
            topics.remove(&self.topic);
        }
    }

    fn register(&mut self, request: SubscribeRequest) {
        let id = self.next_id;
        self.next_id += 1;

        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.subscribers.insert(id, sender);
        self.update_count();

        if request.reply.send((id, receiver)).is_err() {
            self.subscribers.remove(&id);
            self.update_count();
        }
    }

    fn deliver(&mut self, message: Message) {
        let mut dropped = Vec::new();

        for (id, sender) in self.subscribers.iter() {
            match sender.try_send(message.clone()) {
                Ok(()) => {
                    if self.first_only {
                        break;
                    }
                }
                Err(TrySendError::Full(_)) => {
                    warn!(topic = %self.topic, subscriber = id, "subscriber lagging, closing it");
                    dropped.push(*id);
                }
                Err(TrySendError::Closed(_)) => dropped.push(*id),
            }
        }

        for id in dropped {
            self.subscribers.remove(&id);
        }

        self.update_count();
    }

    fn update_count(&self) {
        self.count.store(self.subscribers.len(), Ordering::SeqCst);
    }
}

/// Receiving end of a topic subscription.
///
/// Closing is idempotent and always notifies the topic actor; dropping a
/// subscription closes it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    topic: String,
    messages: mpsc::Receiver<Message>,
    unsubscribe: mpsc::UnboundedSender<u64>,
    closed: bool,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next message, or `None` once the subscription has been closed by
    /// either side.
    pub async fn recv(&mut self) -> Option<Message> {
        self.messages.recv().await
    }

    pub async fn recv_timeout(&mut self, timeout_ms: i64) -> Option<Message> {
        match timeout_ms {
            0 => self.recv().await,
            ms if ms < 0 => self.messages.try_recv().ok(),
            ms => tokio::time::timeout(Duration::from_millis(ms as u64), self.recv())
                .await
                .ok()
                .flatten(),
        }
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        self.messages.close();
        let _ = self.unsubscribe.send(self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

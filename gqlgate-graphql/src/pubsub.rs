//! Topic based publish/subscribe bus shared by every operation context
//!
//! One `PubSub` exists per process. Contexts hold clones of the handle, which
//! all point at the same set of broadcast channels.

use futures_util::stream::{BoxStream, Stream, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, warn};

/// Maximum number of messages buffered per topic
const TOPIC_BUFFER_SIZE: usize = 1000;

type Topics = Arc<RwLock<HashMap<String, broadcast::Sender<Value>>>>;

/// Shared handle to the process-wide message bus
#[derive(Clone, Default)]
pub struct PubSub {
    topics: Topics,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a payload to a topic, returning how many subscribers received it
    pub fn publish(&self, topic: &str, payload: Value) -> usize {
        let sender = self.topics.read().get(topic).cloned();

        match sender.map(|tx| tx.send(payload)) {
            Some(Ok(receivers)) => {
                debug!("Published to topic '{}' ({} subscribers)", topic, receivers);
                receivers
            }
            _ => {
                debug!("No subscribers for topic '{}'", topic);
                0
            }
        }
    }

    /// Subscribe to a topic; the stream yields every payload published after
    /// this call. The topic is forgotten once its last stream is dropped.
    pub fn subscribe(&self, topic: &str) -> impl Stream<Item = Value> + Send + 'static {
        // Subscribing under the write lock keeps a concurrent release from
        // removing the sender between lookup and subscription
        let receiver = self
            .topics
            .write()
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_BUFFER_SIZE).0)
            .subscribe();

        let name = topic.to_string();
        let inner = BroadcastStream::new(receiver)
            .filter_map(move |item| {
                let topic = name.clone();
                async move {
                    match item {
                        Ok(payload) => Some(payload),
                        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                            warn!(
                                "Subscriber on topic '{}' lagged, skipped {} messages",
                                topic, skipped
                            );
                            None
                        }
                    }
                }
            })
            .boxed();

        TopicStream {
            inner,
            _release: TopicRelease {
                topics: self.topics.clone(),
                topic: topic.to_string(),
            },
        }
    }

    /// Number of live subscribers on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of topics with at least one live subscriber
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }

    /// Whether two handles refer to the same bus
    pub fn same_bus(&self, other: &PubSub) -> bool {
        Arc::ptr_eq(&self.topics, &other.topics)
    }
}

/// Subscription stream. Fields drop in order, so the receiver is gone
/// before the release checks the topic's remaining subscribers.
struct TopicStream {
    inner: BoxStream<'static, Value>,
    _release: TopicRelease,
}

impl Stream for TopicStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.inner.poll_next_unpin(cx)
    }
}

struct TopicRelease {
    topics: Topics,
    topic: String,
}

impl Drop for TopicRelease {
    fn drop(&mut self) {
        let mut topics = self.topics.write();
        if topics.get(&self.topic).is_some_and(|tx| tx.receiver_count() == 0) {
            topics.remove(&self.topic);
            debug!("Released topic '{}'", self.topic);
        }
    }
}

impl std::fmt::Debug for PubSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSub")
            .field("topics", &self.topic_count())
            .finish()
    }
}

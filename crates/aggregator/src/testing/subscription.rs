//! Hand-driven watch subscriptions.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use aggregator_types::{DynamicObject, Status};

use crate::store::{Subscription, WatchEvent};

/// Sending half of a scripted watch.
///
/// Dropping the script (or calling [`finish`](Self::finish)) ends the backing
/// stream.
#[derive(Debug)]
pub struct WatchScript {
    sender: Option<UnboundedSender<WatchEvent>>,
    stops: Arc<AtomicUsize>,
}

impl WatchScript {
    /// Creates a script and the subscription it feeds.
    #[must_use]
    pub fn new() -> (Self, ScriptedSubscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stops = Arc::new(AtomicUsize::new(0));
        let subscription = ScriptedSubscription {
            receiver,
            stops: Arc::clone(&stops),
        };
        (
            Self {
                sender: Some(sender),
                stops,
            },
            subscription,
        )
    }

    /// Queues an event. Returns `false` once the subscription is gone.
    pub fn send(&self, event: WatchEvent) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| sender.send(event).is_ok())
    }

    /// Queues an `ADDED` event.
    pub fn added(&self, object: DynamicObject) -> bool {
        self.send(WatchEvent::Added(object))
    }

    /// Queues a `MODIFIED` event.
    pub fn modified(&self, object: DynamicObject) -> bool {
        self.send(WatchEvent::Modified(object))
    }

    /// Queues a `DELETED` event.
    pub fn deleted(&self, object: DynamicObject) -> bool {
        self.send(WatchEvent::Deleted(object))
    }

    /// Queues a bookmark carrying `resource_version`.
    pub fn bookmark(&self, resource_version: &str) -> bool {
        let mut object = DynamicObject::new();
        object.set_resource_version(resource_version);
        self.send(WatchEvent::Bookmark(object))
    }

    /// Queues a backing error.
    pub fn error(&self, status: Status) -> bool {
        self.send(WatchEvent::Error(status))
    }

    /// Ends the backing stream after the queued events.
    pub fn finish(&mut self) {
        self.sender.take();
    }

    /// How many times the subscription was stopped.
    #[must_use]
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Shared stop counter, for observers that outlive the script.
    #[must_use]
    pub fn stop_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.stops)
    }
}

/// Receiving half of a scripted watch.
#[derive(Debug)]
pub struct ScriptedSubscription {
    receiver: UnboundedReceiver<WatchEvent>,
    stops: Arc<AtomicUsize>,
}

impl ScriptedSubscription {
    /// A subscription that replays `events` and then ends.
    #[must_use]
    pub fn replaying(events: impl IntoIterator<Item = WatchEvent>) -> (Self, Arc<AtomicUsize>) {
        let (mut script, subscription) = WatchScript::new();
        for event in events {
            script.send(event);
        }
        script.finish();
        (subscription, script.stop_counter())
    }
}

impl Stream for ScriptedSubscription {
    type Item = WatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Subscription for ScriptedSubscription {
    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.receiver.close();
    }
}

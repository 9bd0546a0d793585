//! Scoped ownership of a backing subscription.

use futures::StreamExt;
use tracing::debug;

use crate::store::{Subscription, WatchEvent};

use super::WATCH_TARGET;

/// Owns a subscription and stops it exactly once, either through
/// [`release`](Self::release) or on drop.
pub(crate) struct SubscriptionGuard {
    subscription: Option<Box<dyn Subscription>>,
    resource: String,
}

impl SubscriptionGuard {
    pub(crate) fn new(subscription: Box<dyn Subscription>, resource: String) -> Self {
        Self {
            subscription: Some(subscription),
            resource,
        }
    }

    /// Next backing event; `None` once the stream ended or was released.
    pub(crate) async fn next_event(&mut self) -> Option<WatchEvent> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => None,
        }
    }

    /// Stops the subscription. Later calls do nothing.
    pub(crate) fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.stop();
            debug!(
                target: WATCH_TARGET,
                resource = %self.resource,
                "released backing subscription"
            );
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

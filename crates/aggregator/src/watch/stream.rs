//! The streaming phase of a watch: backing events in, encoded frames out.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use serde_json::Value;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use aggregator_types::{DynamicObject, GroupVersionKind, Status, WatchEventType, WatchFrame};

use crate::dispatch::{ApiBody, RequestContext};
use crate::resource::WatchTransform;
use crate::store::WatchEvent;

use super::guard::SubscriptionGuard;
use super::{WATCH_TARGET, WatchState};

/// Settings the stream needs once the subscription is open.
pub(crate) struct StreamSettings {
    pub(crate) kind: GroupVersionKind,
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) allow_bookmarks: bool,
    pub(crate) transform: Option<Arc<dyn WatchTransform>>,
    pub(crate) context: RequestContext,
}

enum Step {
    Skip,
    Emit(Bytes),
    Terminal(Bytes),
}

/// Streaming session. Yields one encoded frame per forwarded event and
/// closes on cancellation, backing stream end or a terminal error.
pub(crate) struct WatchStream {
    state: WatchState,
    guard: SubscriptionGuard,
    cancel: CancellationToken,
    settings: StreamSettings,
    _disconnect: DropGuard,
}

impl WatchStream {
    pub(crate) fn new(
        guard: SubscriptionGuard,
        cancel: CancellationToken,
        settings: StreamSettings,
    ) -> Self {
        let disconnect = cancel.clone().drop_guard();
        Self {
            state: WatchState::Streaming,
            guard,
            cancel,
            settings,
            _disconnect: disconnect,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> WatchState {
        self.state
    }

    /// Waits for the next frame to write. Cancellation wins over a ready
    /// event.
    pub(crate) async fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            if self.state == WatchState::Closed {
                return None;
            }
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                event = self.guard.next_event() => Some(event),
            };
            let event = match next {
                None => {
                    self.close("cancelled");
                    return None;
                }
                Some(None) => {
                    self.close("backing stream ended");
                    return None;
                }
                Some(Some(event)) => event,
            };
            match step(&self.settings, event).await {
                Step::Skip => {}
                Step::Emit(frame) => return Some(frame),
                Step::Terminal(frame) => {
                    self.close("terminal error");
                    return Some(frame);
                }
            }
        }
    }

    fn close(&mut self, reason: &'static str) {
        self.guard.release();
        debug!(
            target: WATCH_TARGET,
            from = ?self.state,
            to = ?WatchState::Closed,
            reason,
            "watch state transition"
        );
        self.state = WatchState::Closed;
    }

    /// Turns the session into a response body. Dropping the body (client
    /// disconnect) cancels the request token and releases the subscription.
    pub(crate) fn into_body(self) -> ApiBody {
        let frames = futures::stream::unfold(self, |mut stream| async move {
            let frame = stream.next_frame().await?;
            Some((Ok::<_, Infallible>(Frame::data(frame)), stream))
        });
        StreamBody::new(frames).boxed_unsync()
    }
}

async fn step(settings: &StreamSettings, event: WatchEvent) -> Step {
    let event_type = event.event_type();
    match event {
        WatchEvent::Error(status) => {
            warn!(
                target: WATCH_TARGET,
                code = status.code,
                message = %status.message,
                "backing watch reported an error"
            );
            Step::Terminal(error_frame(status))
        }
        WatchEvent::Bookmark(object) => {
            if settings.allow_bookmarks {
                emit(event_type, object.into_value())
            } else {
                Step::Skip
            }
        }
        WatchEvent::Added(object) | WatchEvent::Modified(object) | WatchEvent::Deleted(object) => {
            if object.is_empty() {
                return Step::Skip;
            }
            match payload(settings, object).await {
                Ok(payload) => emit(event_type, payload),
                Err(message) => {
                    warn!(target: WATCH_TARGET, error = %message, "watch transform failed");
                    Step::Terminal(error_frame(Status::failure(500, message)))
                }
            }
        }
    }
}

async fn payload(settings: &StreamSettings, mut object: DynamicObject) -> Result<Value, String> {
    object.set_group_version_kind(&settings.kind);
    match &settings.transform {
        Some(hook) => hook
            .transform(&settings.context, &settings.namespace, &settings.name, object)
            .await
            .map_err(|error| format!("watch error: {error}")),
        None => Ok(object.into_value()),
    }
}

fn emit(event_type: WatchEventType, object: Value) -> Step {
    match encode_frame(&WatchFrame::new(event_type, object)) {
        Ok(frame) => Step::Emit(frame),
        Err(error) => Step::Terminal(error_frame(Status::failure(
            500,
            format!("failed to encode watch response: {error}"),
        ))),
    }
}

fn encode_frame(frame: &WatchFrame) -> Result<Bytes, serde_json::Error> {
    let mut encoded = serde_json::to_vec(frame)?;
    encoded.push(b'\n');
    Ok(Bytes::from(encoded))
}

fn error_frame(status: Status) -> Bytes {
    let object = serde_json::to_value(&status).unwrap_or(Value::Null);
    encode_frame(&WatchFrame::new(WatchEventType::Error, object))
        .unwrap_or_else(|_| Bytes::from_static(b"{\"type\":\"ERROR\",\"object\":null}\n"))
}

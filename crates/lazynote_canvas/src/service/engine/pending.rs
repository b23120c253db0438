//! Deferred connection creation.
//!
//! Creation waits for the next frame callback so that freshly mounted
//! objects have been laid out before their anchors are measured.

use crate::host::FrameId;
use crate::model::connection::{ConnectionTarget, ObjectId};
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outcome of `create_aggregation` / `create_provenance`.
///
/// Resolves to `true` once the edge is registered and drawn, `false` when it
/// could not be created. A request cancelled by teardown resolves to `false`.
#[must_use = "the creation result tells whether the curve exists"]
#[derive(Debug)]
pub struct PendingConnection {
    state: PendingState,
}

#[derive(Debug)]
enum PendingState {
    Resolved(bool),
    Waiting(oneshot::Receiver<bool>),
}

impl PendingConnection {
    pub(crate) fn resolved(result: bool) -> Self {
        Self {
            state: PendingState::Resolved(result),
        }
    }

    fn waiting(receiver: oneshot::Receiver<bool>) -> Self {
        Self {
            state: PendingState::Waiting(receiver),
        }
    }

    /// Returns the result without waiting, `None` while still pending.
    pub fn try_result(&mut self) -> Option<bool> {
        match &mut self.state {
            PendingState::Resolved(result) => Some(*result),
            PendingState::Waiting(receiver) => {
                let result = match receiver.try_recv() {
                    Ok(Some(result)) => result,
                    Ok(None) => return None,
                    Err(oneshot::Canceled) => false,
                };
                self.state = PendingState::Resolved(result);
                Some(result)
            }
        }
    }
}

impl Future for PendingConnection {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            PendingState::Resolved(result) => Poll::Ready(*result),
            PendingState::Waiting(receiver) => match Pin::new(receiver).poll(cx) {
                Poll::Ready(received) => {
                    let result = received.unwrap_or(false);
                    this.state = PendingState::Resolved(result);
                    Poll::Ready(result)
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// One queued creation waiting for the creation frame.
#[derive(Debug)]
pub(crate) struct CreationRequest {
    pub(crate) source: ObjectId,
    pub(crate) target: ConnectionTarget,
    reply: oneshot::Sender<bool>,
}

impl CreationRequest {
    pub(crate) fn touches(&self, object_id: ObjectId) -> bool {
        self.source == object_id || self.target.object_id() == Some(object_id)
    }

    pub(crate) fn resolve(self, result: bool) {
        // A dropped receiver means the caller stopped caring.
        let _ = self.reply.send(result);
    }
}

/// Creation queue sharing a single frame request.
#[derive(Debug, Default)]
pub(crate) struct PendingCreations {
    requests: Vec<CreationRequest>,
    frame: Option<FrameId>,
}

impl PendingCreations {
    pub(crate) fn enqueue(
        &mut self,
        source: ObjectId,
        target: ConnectionTarget,
    ) -> PendingConnection {
        let (reply, receiver) = oneshot::channel();
        self.requests.push(CreationRequest {
            source,
            target,
            reply,
        });
        PendingConnection::waiting(receiver)
    }

    pub(crate) fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    pub(crate) fn set_frame(&mut self, frame: FrameId) {
        self.frame = Some(frame);
    }

    pub(crate) fn take_frame(&mut self) -> Option<FrameId> {
        self.frame.take()
    }

    /// Takes the queue when `frame` is the creation frame.
    pub(crate) fn take_due(&mut self, frame: FrameId) -> Option<Vec<CreationRequest>> {
        if self.frame != Some(frame) {
            return None;
        }
        self.frame = None;
        Some(std::mem::take(&mut self.requests))
    }

    /// Resolves every request touching `object_id` as failed.
    pub(crate) fn cancel_touching(&mut self, object_id: ObjectId) -> usize {
        let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.requests)
            .into_iter()
            .partition(|request| request.touches(object_id));
        self.requests = kept;
        let count = cancelled.len();
        for request in cancelled {
            request.resolve(false);
        }
        count
    }

    /// Resolves every queued request as failed.
    pub(crate) fn cancel_all(&mut self) -> usize {
        let requests = std::mem::take(&mut self.requests);
        let count = requests.len();
        for request in requests {
            request.resolve(false);
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

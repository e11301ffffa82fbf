// Single-slot frame hand-off between the capture path and the processing
// loop. Neither side ever waits: contention resolves to a dropped frame on
// the producer side and a skipped tick on the consumer side.

use crate::pipeline::types::Frame;
use std::sync::{Arc, Mutex};

/// Outcome of a non-blocking `take`.
pub enum TakeOutcome {
    Frame(Frame),
    /// Slot was lockable but held no frame.
    Empty,
    /// Lock was held by the producer; distinct from `Empty`.
    Contended,
}

/// Lock-guarded holder for at most one pending frame.
#[derive(Default)]
pub struct FrameMailbox {
    slot: Mutex<Option<Frame>>,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame`, replacing any unconsumed one. If the consumer holds
    /// the lock the frame is dropped and `false` is returned; no wait, no
    /// retry. Expected steady-state behavior under load, not a failure.
    pub fn put(&self, frame: Frame) -> bool {
        match self.slot.try_lock() {
            Ok(mut slot) => {
                if slot.is_some() {
                    tracing::debug!(frame_id = frame.id, "replacing unconsumed frame");
                }
                *slot = Some(frame);
                true
            }
            Err(_) => {
                tracing::debug!(frame_id = frame.id, "mailbox contended, frame dropped");
                false
            }
        }
    }

    /// Remove and return the stored frame, clearing the slot. Returns
    /// `Contended` without waiting if the producer holds the lock.
    pub fn take(&self) -> TakeOutcome {
        match self.slot.try_lock() {
            Ok(mut slot) => match slot.take() {
                Some(frame) => TakeOutcome::Frame(frame),
                None => TakeOutcome::Empty,
            },
            Err(_) => TakeOutcome::Contended,
        }
    }
}

#[cfg(test)]
impl FrameMailbox {
    /// Hold the slot lock to simulate producer-side contention.
    pub(crate) fn hold_lock(&self) -> std::sync::MutexGuard<'_, Option<Frame>> {
        self.slot.lock().unwrap()
    }
}

/// Producer-facing handle: the only operation the frame-arrival path gets.
#[derive(Clone)]
pub struct FrameProducer {
    mailbox: Arc<FrameMailbox>,
}

impl FrameProducer {
    pub fn new(mailbox: Arc<FrameMailbox>) -> Self {
        Self { mailbox }
    }

    pub fn on_frame_arrived(&self, frame: Frame) {
        self.mailbox.put(frame);
    }
}

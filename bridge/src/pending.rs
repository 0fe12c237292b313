use crate::PickOutcome;
use crate::envelope::CallId;
use futures::channel::oneshot;
use std::collections::HashMap;
use std::sync::Mutex;

/// Marker error: the id already has a pick in flight.
#[derive(Debug)]
pub(crate) struct DuplicateId;

/// In-flight directory picks, keyed by call id.
#[derive(Debug, Default)]
pub(crate) struct PendingPicks {
    slots: Mutex<HashMap<CallId, oneshot::Sender<PickOutcome>>>,
}

impl PendingPicks {
    /// Reserve a slot for `id` and return the receiver its outcome arrives
    /// on. Fails if `id` is already in flight; the existing slot is left
    /// untouched.
    pub fn register(&self, id: CallId) -> Result<oneshot::Receiver<PickOutcome>, DuplicateId> {
        let mut slots = self.slots.lock().expect("pending picks mutex poisoned");
        if slots.contains_key(&id) {
            return Err(DuplicateId);
        }
        let (tx, rx) = oneshot::channel();
        slots.insert(id, tx);
        Ok(rx)
    }

    /// Resolve the pick for `id`. Returns `false` when `id` is not pending
    /// (already resolved, abandoned, or never registered); the outcome is
    /// dropped in that case.
    pub fn resolve(&self, id: CallId, outcome: PickOutcome) -> bool {
        let sender = self
            .slots
            .lock()
            .expect("pending picks mutex poisoned")
            .remove(&id);
        sender.is_some_and(|tx| tx.send(outcome).is_ok())
    }

    /// Drop the slot for `id` without resolving it.
    pub fn abandon(&self, id: CallId) {
        self.slots
            .lock()
            .expect("pending picks mutex poisoned")
            .remove(&id);
    }

    /// Number of picks currently awaiting completion.
    pub fn len(&self) -> usize {
        self.slots.lock().expect("pending picks mutex poisoned").len()
    }
}

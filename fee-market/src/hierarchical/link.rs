//! Lossy, non-blocking control link between the two layers.
//!
//! A bounded channel where the sender never waits: when the buffer is full the
//! oldest pending update is discarded in favour of the new one, so the reader
//! always converges on the freshest intent. Handles are cheap clones and may
//! be used from any thread.

use {
    super::types::SequencerParamUpdate,
    crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError},
    log::*,
};

/// Pending updates held before the oldest is evicted.
pub const UPDATE_LINK_CAPACITY: usize = 10;

/// What happened to an update handed to [`UpdateLink::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The link was full; the oldest pending update was dropped to make room.
    EvictedOldest,
    /// The link stayed full after eviction (another sender won the race) and
    /// the update was discarded.
    Dropped,
}

#[derive(Debug, Clone)]
pub struct UpdateLink {
    sender: Sender<SequencerParamUpdate>,
    receiver: Receiver<SequencerParamUpdate>,
}

impl Default for UpdateLink {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateLink {
    pub fn new() -> Self {
        Self::with_capacity(UPDATE_LINK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Enqueue `update` without blocking, evicting the oldest pending update
    /// if the link is full.
    pub fn send(&self, update: SequencerParamUpdate) -> SendOutcome {
        let Err(TrySendError::Full(update) | TrySendError::Disconnected(update)) =
            self.sender.try_send(update)
        else {
            return SendOutcome::Delivered;
        };

        if let Ok(evicted) = self.receiver.try_recv() {
            warn!(
                "parameter update link full, evicting stale update: {}",
                evicted.reason
            );
        }
        match self.sender.try_send(update) {
            Ok(()) => SendOutcome::EvictedOldest,
            Err(err) => {
                warn!(
                    "parameter update link still full, dropping update: {}",
                    err.into_inner().reason
                );
                SendOutcome::Dropped
            }
        }
    }

    pub fn try_recv(&self) -> Option<SequencerParamUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Discard every pending update, returning how many were dropped.
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.sender.capacity().unwrap_or(UPDATE_LINK_CAPACITY)
    }
}

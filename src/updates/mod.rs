// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Callback multiplexer over file update events.
//!
//! Many callers can wait on the same file: every message thumbnail, avatar
//! or render job interested in file `f` registers a handler under `f`'s
//! id, and each `FileUpdated` event fans out to all of them in
//! registration order. A handler decides its own lifetime: returning
//! `false` from [`UpdateHandler::on_update`] drops it, `true` keeps it for
//! the next event.
//!
//! Dispatch must run with the registry already holding the new snapshot
//! (update-then-notify); `MediaManager::handle_inbound` enforces that
//! ordering.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::sync::resilient_lock;
use crate::types::{File, FileId};

/// A pending per-file action plus its own relevance check.
///
/// Invoked with the canonical snapshot on every update for its file id.
/// The return value says whether the handler is still interested; a
/// handler waiting on a download typically stays while
/// `is_downloading_active` holds and detaches once it has seen completion.
pub trait UpdateHandler: Send {
    fn on_update(&mut self, file: &File) -> bool;
}

impl<F> UpdateHandler for F
where
    F: FnMut(&File) -> bool + Send,
{
    fn on_update(&mut self, file: &File) -> bool {
        self(file)
    }
}

pub type BoxedHandler = Box<dyn UpdateHandler>;

/// Ordered pending-handler lists, keyed by file id.
///
/// A `Mutex` rather than an `RwLock`: boxed handlers are `Send` but not
/// `Sync`, and every operation mutates the lists anyway.
#[derive(Default)]
pub struct UpdateDispatcher {
    pending: Mutex<HashMap<FileId, Vec<BoxedHandler>>>,
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `id`. Registration during a
    /// running dispatch is allowed and takes effect on the next event.
    pub fn register(&self, id: FileId, handler: BoxedHandler) {
        resilient_lock(&self.pending)
            .entry(id)
            .or_default()
            .push(handler);
    }

    /// Invoke every handler registered for `file.id` in registration
    /// order, dropping the ones that report no further interest.
    ///
    /// The list is detached before invocation, so handlers may re-enter
    /// the dispatcher and register new handlers for the same or other
    /// ids; those only see the next update, never the current pass.
    pub fn dispatch(&self, file: &File) {
        let mut batch = match resilient_lock(&self.pending).remove(&file.id) {
            Some(batch) => batch,
            None => return,
        };

        batch.retain_mut(|handler| handler.on_update(file));

        let mut pending = resilient_lock(&self.pending);
        match pending.entry(file.id) {
            // Handlers registered while the batch ran; they go behind the
            // survivors to preserve registration order.
            Entry::Occupied(mut slot) => {
                let added = std::mem::take(slot.get_mut());
                batch.extend(added);
                if batch.is_empty() {
                    slot.remove();
                } else {
                    *slot.get_mut() = batch;
                }
            }
            Entry::Vacant(slot) => {
                if !batch.is_empty() {
                    slot.insert(batch);
                }
            }
        }
    }

    /// Handlers currently waiting on `id`.
    pub fn pending_count(&self, id: FileId) -> usize {
        resilient_lock(&self.pending)
            .get(&id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

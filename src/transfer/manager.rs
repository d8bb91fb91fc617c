// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! The transfer manager: downloads, uploads, cancellation, deletion.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::backend::{Backend, Request};
use crate::error::MediaError;
use crate::registry::FileRegistry;
use crate::sync::{resilient_read, resilient_write};
use crate::types::{File, FileId, FileType, Priority};
use crate::updates::{BoxedHandler, UpdateDispatcher};

/// Issues transfer requests against the backend, coalescing duplicates
/// and attaching update handlers.
pub struct TransferManager {
    backend: Backend,
    registry: Arc<FileRegistry>,
    updates: Arc<UpdateDispatcher>,
    /// Ids with a download request sent but not yet acknowledged by any
    /// update event. Bridges the gap before the backend flips
    /// `is_downloading_active`.
    requested: RwLock<HashSet<FileId>>,
}

impl TransferManager {
    pub fn new(
        backend: Backend,
        registry: Arc<FileRegistry>,
        updates: Arc<UpdateDispatcher>,
    ) -> Self {
        Self {
            backend,
            registry,
            updates,
            requested: RwLock::new(HashSet::new()),
        }
    }

    /// Start a download, or join one already running.
    ///
    /// - Already complete: `handler` is invoked once, synchronously, and
    ///   no request is sent.
    /// - In flight (active or requested): `handler` is registered, no
    ///   duplicate request is sent.
    /// - Eligible and idle: one `DownloadFile` is sent and `handler`
    ///   registered.
    /// - Ineligible and idle: nothing happens; the handler is discarded.
    ///
    /// The decision is taken against the renewed canonical snapshot, not
    /// the possibly stale `file` argument.
    pub fn download(
        &self,
        file: &File,
        priority: Priority,
        handler: Option<BoxedHandler>,
    ) -> Result<(), MediaError> {
        let mut slot = file.clone();
        let current = self.registry.renew(&mut slot);

        if current.local.is_downloading_completed {
            if let Some(mut handler) = handler {
                handler.on_update(&current);
            }
            return Ok(());
        }

        if current.local.is_downloading_active || self.is_requested(current.id) {
            if let Some(handler) = handler {
                self.updates.register(current.id, handler);
            }
            return Ok(());
        }

        if current.local.can_be_downloaded {
            resilient_write(&self.requested).insert(current.id);
            self.backend.send(Request::DownloadFile {
                file_id: current.id,
                priority,
            })?;
            if let Some(handler) = handler {
                self.updates.register(current.id, handler);
            }
            return Ok(());
        }

        tracing::debug!(file_id = current.id, "download skipped, file not eligible");
        Ok(())
    }

    /// Ask the backend to stop a download. Fire-and-forget: the outcome is
    /// only observable via a later update event. With `only_if_pending`
    /// the backend cancels only if the transfer has not started moving
    /// bytes yet; cancelling a non-pending download that way is a backend
    /// no-op, not an error.
    pub fn cancel(&self, id: FileId, only_if_pending: bool) -> Result<(), MediaError> {
        resilient_write(&self.requested).remove(&id);
        self.backend.send(Request::CancelDownloadFile {
            file_id: id,
            only_if_pending,
        })
    }

    /// Ask the backend to stop an upload. Fire-and-forget.
    pub fn cancel_upload(&self, id: FileId) -> Result<(), MediaError> {
        self.backend.send(Request::CancelUploadFile { file_id: id })
    }

    /// Ask the backend to evict its copy. Fire-and-forget; the in-memory
    /// registry entry is left untouched.
    pub fn delete(&self, id: FileId) -> Result<(), MediaError> {
        self.backend.send(Request::DeleteFile { file_id: id })
    }

    /// Upload a local file. The call suspends until the backend answers
    /// with the initial snapshot; if that snapshot already reports
    /// completion the handler fires immediately, otherwise it is
    /// registered for later update events. The initial snapshot is
    /// returned either way.
    pub async fn upload(
        &self,
        path: impl Into<String>,
        file_type: FileType,
        priority: Priority,
        handler: Option<BoxedHandler>,
    ) -> Result<File, MediaError> {
        let file = self
            .backend
            .call(Request::UploadFile {
                path: path.into(),
                file_type,
                priority,
            })
            .await?;
        let file = self.registry.ensure(file);

        if file.remote.is_uploading_completed {
            if let Some(mut handler) = handler {
                handler.on_update(&file);
            }
        } else if let Some(handler) = handler {
            self.updates.register(file.id, handler);
        }

        Ok(file)
    }

    /// Ends the requested window for `id`. Called for every inbound file
    /// update, before handlers are dispatched: whatever the update says,
    /// the request has been acknowledged and the canonical flags take
    /// over.
    pub fn note_update(&self, file: &File) {
        resilient_write(&self.requested).remove(&file.id);
    }

    fn is_requested(&self, id: FileId) -> bool {
        resilient_read(&self.requested).contains(&id)
    }
}

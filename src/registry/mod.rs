// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Canonical file registry.
//!
//! One map from file id to the latest known snapshot, scoped to a client
//! session. Snapshots are immutable values and writes are last-write-wins;
//! there are no merge semantics. Entries live for the lifetime of the
//! session: a `DeleteFile` request evicts backend-side storage but never
//! removes the local record.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::backend::{Backend, Request};
use crate::error::MediaError;
use crate::sync::{resilient_read, resilient_write};
use crate::types::{File, FileId};

/// Session-wide map of canonical file snapshots.
pub struct FileRegistry {
    backend: Backend,
    files: RwLock<HashMap<FileId, File>>,
}

impl FileRegistry {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            files: RwLock::new(HashMap::new()),
        }
    }

    /// The canonical snapshot, without touching the backend.
    pub fn lookup(&self, id: FileId) -> Option<File> {
        resilient_read(&self.files).get(&id).cloned()
    }

    /// The canonical snapshot, fetching it from the backend on first
    /// sight. The issuing task suspends until the reply arrives.
    pub async fn get(&self, id: FileId) -> Result<File, MediaError> {
        if let Some(file) = self.lookup(id) {
            return Ok(file);
        }
        let file = self.backend.call(Request::GetFile { file_id: id }).await?;
        Ok(self.ensure(file))
    }

    /// Unconditionally install `file` as the canonical entry for its id
    /// and return it. Last write wins.
    pub fn ensure(&self, file: File) -> File {
        resilient_write(&self.files).insert(file.id, file.clone());
        file
    }

    /// Replace an embedded stub with the canonical entry, installing the
    /// stub first if this id has never been seen. Returns the canonical
    /// snapshot. Used pervasively so embedded copies never diverge from
    /// the registry's view.
    pub fn renew(&self, slot: &mut File) -> File {
        let canonical = match self.lookup(slot.id) {
            Some(file) => file,
            None => self.ensure(slot.clone()),
        };
        *slot = canonical.clone();
        canonical
    }

    /// Number of files seen so far.
    pub fn len(&self) -> usize {
        resilient_read(&self.files).len()
    }

    pub fn is_empty(&self) -> bool {
        resilient_read(&self.files).is_empty()
    }
}

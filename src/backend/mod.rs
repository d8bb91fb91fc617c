// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Abstract backend protocol and the request pipe.
//!
//! Two request shapes share one outbound channel:
//!
//! - fire-and-forget sends ([`Backend::send`]) that return immediately
//!   with no result: `DownloadFile`, `CancelDownloadFile`, `DeleteFile`,
//!   `CancelUploadFile`;
//! - request/reply calls ([`Backend::call`]) where the issuing task
//!   suspends until the matching reply arrives: `GetFile`, `UploadFile`,
//!   `GetMapThumbnailFile`.
//!
//! Replies are correlated by envelope id, not by call order: the backend
//! answers out of order, and a download's eventual completion arrives as
//! an unsolicited [`Inbound::FileUpdated`] event entirely decoupled from
//! the send that triggered it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::MediaError;
use crate::sync::resilient_write;
use crate::types::{File, FileId, FileType, Location, Priority};

/// Outbound request payloads, by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    GetFile {
        file_id: FileId,
    },
    DownloadFile {
        file_id: FileId,
        priority: Priority,
    },
    CancelDownloadFile {
        file_id: FileId,
        only_if_pending: bool,
    },
    DeleteFile {
        file_id: FileId,
    },
    UploadFile {
        path: String,
        file_type: FileType,
        priority: Priority,
    },
    CancelUploadFile {
        file_id: FileId,
    },
    GetMapThumbnailFile {
        location: Location,
        zoom: i32,
        width: i32,
        height: i32,
        scale: i32,
        chat_id: i64,
    },
}

/// One outbound message. `id` is present only for request/reply calls;
/// fire-and-forget sends carry none and expect no answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: Request,
}

/// Payload of a reply to an earlier call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplyResult {
    Ok { file: File },
    Error { message: String },
}

/// Reply to an earlier call, matched against the correlation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    pub result: ReplyResult,
}

/// Messages arriving from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// Answer to a request/reply call.
    Reply(Reply),
    /// Unsolicited status push, emitted whenever any file changes. Not
    /// scoped to a specific request.
    FileUpdated { file: File },
}

type PendingCalls = RwLock<HashMap<u64, oneshot::Sender<Result<File, MediaError>>>>;

/// Client-side handle over the single backend channel.
///
/// Cheap to clone; all clones share the outbound sender and the
/// correlation table. The transport (or a test) drains the envelope
/// receiver returned by [`Backend::channel`] and feeds replies back
/// through [`Backend::complete`].
#[derive(Clone)]
pub struct Backend {
    outbound: mpsc::UnboundedSender<Envelope>,
    pending: Arc<PendingCalls>,
    next_id: Arc<AtomicU64>,
}

impl Backend {
    /// Create a handle plus the receiver the transport drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Self {
            outbound: tx,
            pending: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (backend, rx)
    }

    /// Fire-and-forget send. Registers nothing in the correlation table;
    /// completion or abortion is only observable via a later update event.
    pub fn send(&self, request: Request) -> Result<(), MediaError> {
        tracing::debug!(?request, "backend send");
        self.outbound
            .send(Envelope { id: None, request })
            .map_err(|_| MediaError::Disconnected)
    }

    /// Request/reply call: suspends the issuing task until the matching
    /// reply arrives or the backend reports an error.
    pub async fn call(&self, request: Request) -> Result<File, MediaError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        resilient_write(&self.pending).insert(id, tx);

        tracing::debug!(call_id = id, ?request, "backend call");
        if self
            .outbound
            .send(Envelope { id: Some(id), request })
            .is_err()
        {
            resilient_write(&self.pending).remove(&id);
            return Err(MediaError::Disconnected);
        }

        rx.await.map_err(|_| MediaError::ReplyDropped)?
    }

    /// Resolve a pending call with its reply. A reply whose id matches no
    /// pending call is logged and dropped.
    pub fn complete(&self, reply: Reply) {
        let waiter = resilient_write(&self.pending).remove(&reply.id);
        match waiter {
            Some(tx) => {
                let result = match reply.result {
                    ReplyResult::Ok { file } => Ok(file),
                    ReplyResult::Error { message } => Err(MediaError::Backend(message)),
                };
                // The caller may have gone away; nothing left to notify.
                let _ = tx.send(result);
            }
            None => tracing::warn!(reply_id = reply.id, "reply with no pending call"),
        }
    }
}

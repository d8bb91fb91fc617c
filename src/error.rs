// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Error types for mediacore.
//!
//! Only request/reply calls can fail from the caller's point of view;
//! fire-and-forget sends either reach the outbound channel or report the
//! connection as gone. Failed or cancelled transfers do not surface here:
//! they simply never produce a completion update.

use thiserror::Error;

/// Errors surfaced by calls against the backend.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The outbound channel to the backend process is closed.
    #[error("backend connection closed")]
    Disconnected,

    /// The correlation entry was dropped before a reply arrived.
    #[error("backend reply channel dropped")]
    ReplyDropped,

    /// The backend answered the call with an error.
    #[error("backend error: {0}")]
    Backend(String),
}

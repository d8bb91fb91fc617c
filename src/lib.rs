// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! mediacore - Media file lifecycle core for messaging clients
//!
//! Tracks every media file a client session knows about, keeps one
//! canonical snapshot per file id, and turns caller intent (show this
//! photo, fetch that avatar, upload this document) into deduplicated
//! backend traffic with per-file update callbacks.
//!
//! # Core Modules
//!
//! - [`manager`] - Top-level facade wiring everything around one backend channel
//! - [`registry`] - Canonical per-id file snapshots
//! - [`updates`] - Ordered per-file update callbacks with self-managed lifetime
//! - [`transfer`] - Download/upload orchestration with request coalescing
//! - [`photo`] - Thumbnail selection and display-grid math
//! - [`autodownload`] - Event-driven prefetch policy
//! - [`render`] - Image cache with in-place refreshed handles
//! - [`backend`] - Abstract backend protocol and the request pipe
//! - [`types`] - File, photo and message data model
//! - [`error`] - Library error type
//! - [`sync`] - Poison-recovering lock helpers

pub mod autodownload;
pub mod backend;
pub mod error;
pub mod manager;
pub mod photo;
pub mod registry;
pub mod render;
pub mod sync;
pub mod transfer;
pub mod types;
pub mod updates;

// Re-export the facade and its request parameters
pub use manager::{MapThumbnail, MediaManager};

// Re-export the backend protocol surface
pub use backend::{Backend, Envelope, Inbound, Reply, ReplyResult, Request};

// Re-export core building blocks
pub use error::MediaError;
pub use registry::FileRegistry;
pub use transfer::TransferManager;
pub use updates::{BoxedHandler, UpdateDispatcher, UpdateHandler};

// Re-export the data model
pub use types::{
    AvatarPhoto, Chat, ChatId, Document, File, FileId, FileType, LocalFile, Location, Message,
    MessageContent, Photo, PhotoSize, Priority, RemoteFile, User, Video,
};

// Re-export selectors and display math
pub use photo::{best, cells_for, highres, thumb, CellFit, DisplayConfig};

// Re-export the prefetch policy
pub use autodownload::{AutoDownload, ChatFilter, ClientEvent, EventClass};

// Re-export the render cache
pub use render::{Image, RenderCache, RenderFn, RepaintFn, SharedImage};

// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Canonical types used across mediacore.
//!
//! File snapshots are plain values. The backend owns the truth and pushes
//! whole replacement snapshots, so nothing here carries interior
//! mutability; the registry swaps entries atomically instead.

use serde::{Deserialize, Serialize};

/// Backend-assigned file identifier. Stable and unique for a session.
pub type FileId = i64;

/// Chat identifier, consumed by the auto-download rule set.
pub type ChatId = i64;

/// Download-side status of a file, as last reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Path on disk once the backend has started writing. Empty before that.
    pub path: String,
    pub is_downloading_active: bool,
    pub is_downloading_completed: bool,
    /// The file may be downloaded right now, independent of whether it
    /// already has been.
    pub can_be_downloaded: bool,
    pub downloaded_size: i64,
}

/// Upload-side status of a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub is_uploading_active: bool,
    pub is_uploading_completed: bool,
    pub uploaded_size: i64,
}

/// A remote file snapshot.
///
/// Many places can reference the same file (message thumbnails, avatars);
/// they all resolve to one canonical record in the registry. The flags are
/// taken on trust from the backend: "downloaded" and "downloading" are
/// observed to be mutually exclusive but the model does not enforce it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    /// Declared size in bytes; 0 while the backend does not know it yet.
    pub size: i64,
    /// Approximate size, used as fallback when `size` is unknown.
    pub expected_size: i64,
    pub local: LocalFile,
    pub remote: RemoteFile,
}

impl File {
    /// Download progress in `[0, 1]`. Exactly 1.0 once `downloaded_size`
    /// reaches the declared size.
    pub fn download_progress(&self) -> f64 {
        progress(self.local.downloaded_size, self.size, self.expected_size)
    }

    /// Upload progress in `[0, 1]`.
    pub fn upload_progress(&self) -> f64 {
        progress(self.remote.uploaded_size, self.size, self.expected_size)
    }

    /// Already on disk, or fetchable right now.
    pub fn downloaded_or_eligible(&self) -> bool {
        self.local.is_downloading_completed || self.local.can_be_downloaded
    }
}

fn progress(done: i64, size: i64, expected_size: i64) -> f64 {
    let total = if size != 0 { size } else { expected_size };
    if total <= 0 {
        return 0.0;
    }
    (done as f64 / total as f64).clamp(0.0, 1.0)
}

/// Transfer speed weight handed to the backend: 1 (lowest) to 32 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(1);
    pub const MAX: Priority = Priority(32);
    /// For variants that must appear immediately: inline previews, avatars.
    pub const PREVIEW: Priority = Priority(32);
    /// Background weight for rule-driven full-resolution fetches.
    pub const BACKGROUND: Priority = Priority(5);

    /// Clamps into the backend's accepted `1..=32` range.
    pub fn new(value: u8) -> Self {
        Priority(value.clamp(1, 32))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority(1)
    }
}

/// Content-type tag attached to uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Photo,
    Video,
    Document,
    Audio,
}

/// One resolution variant of a photo.
///
/// The embedded `File` may be a stale copy from an older response; renew it
/// through the registry before consulting its flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoSize {
    /// Qualitative size code from the backend ("s", "m", "x", ...).
    pub kind: String,
    pub width: i32,
    pub height: i32,
    pub file: File,
}

/// A photo as an ordered set of resolution variants, ascending by
/// resolution. At least one element is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub sizes: Vec<PhotoSize>,
}

/// Small and big renditions of an avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarPhoto {
    pub small: File,
    pub big: File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub photo: Option<AvatarPhoto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub profile_photo: Option<AvatarPhoto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub file: File,
    pub width: i32,
    pub height: i32,
    pub duration: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub file: File,
    pub file_name: String,
}

/// Message content, by kind. Closed sum: the auto-download engine matches
/// it exhaustively, so a new kind is a compile-time-visible gap there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Photo(Photo),
    Video(Video),
    Document(Document),
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: ChatId,
    pub content: MessageContent,
}

/// Geographic point for map thumbnail fetches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

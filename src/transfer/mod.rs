// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Download/upload orchestration.
//!
//! The orchestrator turns caller intent into backend traffic while keeping
//! the request stream deduplicated: any number of callers may ask for the
//! same file, but at most one download request is outstanding per file id,
//! and every caller's handler fires off the same eventual update events.
//!
//! Conceptually a transfer walks Idle → Requested → InProgress →
//! Completed, with a Cancelled branch out of Requested/InProgress. The
//! state is not stored as such: it is derived from the canonical `File`
//! flags, plus a small requested-set covering the window between sending a
//! request and the first update that acknowledges it.

pub mod manager;

pub use manager::TransferManager;

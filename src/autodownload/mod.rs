// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Auto-download policy engine.
//!
//! Reacts to client events (chat created, user updated, message received)
//! and decides which file variants to fetch ahead of time.
//! Avatars and inline photo previews are fetched at the highest priority
//! so they appear immediately; full-resolution photo variants are fetched
//! in the background only for chats the externally supplied rule set
//! matches.
//!
//! The engine is installed and removed as a whole: `install` subscribes
//! all three event classes, `remove` clears the subscription set, both
//! idempotent.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::MediaError;
use crate::registry::FileRegistry;
use crate::transfer::TransferManager;
use crate::types::{ChatId, File, Message, MessageContent, Photo, Priority};

/// Client-side events the policy engine reacts to.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    ChatCreated(crate::types::Chat),
    UserUpdated(crate::types::User),
    MessageReceived(Message),
}

/// Event classes the engine subscribes to while installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    ChatCreated,
    UserUpdated,
    MessageReceived,
}

/// Per-chat auto-download rule set, supplied by the configuration layer.
pub type ChatFilter = Arc<dyn Fn(ChatId) -> bool + Send + Sync>;

/// The policy engine. One per client session.
pub struct AutoDownload {
    transfers: Arc<TransferManager>,
    registry: Arc<FileRegistry>,
    chat_filter: ChatFilter,
    subscriptions: HashSet<EventClass>,
}

impl AutoDownload {
    /// Starts removed; nothing is auto-downloaded until [`install`] runs.
    ///
    /// [`install`]: AutoDownload::install
    pub fn new(
        transfers: Arc<TransferManager>,
        registry: Arc<FileRegistry>,
        chat_filter: ChatFilter,
    ) -> Self {
        Self {
            transfers,
            registry,
            chat_filter,
            subscriptions: HashSet::new(),
        }
    }

    /// Subscribe all event classes. Idempotent.
    pub fn install(&mut self) {
        self.subscriptions.extend([
            EventClass::ChatCreated,
            EventClass::UserUpdated,
            EventClass::MessageReceived,
        ]);
    }

    /// Clear every subscription. Idempotent.
    pub fn remove(&mut self) {
        self.subscriptions.clear();
    }

    pub fn is_installed(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn subscriptions(&self) -> &HashSet<EventClass> {
        &self.subscriptions
    }

    /// Apply the policy to one event. Events whose class is not currently
    /// subscribed are ignored.
    pub fn handle_event(&self, event: &ClientEvent) -> Result<(), MediaError> {
        match event {
            ClientEvent::ChatCreated(chat) => {
                if self.subscribed(EventClass::ChatCreated) {
                    if let Some(photo) = &chat.photo {
                        self.fetch_avatar(&photo.small)?;
                    }
                }
            }
            ClientEvent::UserUpdated(user) => {
                if self.subscribed(EventClass::UserUpdated) {
                    if let Some(photo) = &user.profile_photo {
                        self.fetch_avatar(&photo.small)?;
                    }
                }
            }
            ClientEvent::MessageReceived(message) => {
                if self.subscribed(EventClass::MessageReceived) {
                    self.on_message(message)?;
                }
            }
        }
        Ok(())
    }

    fn subscribed(&self, class: EventClass) -> bool {
        self.subscriptions.contains(&class)
    }

    fn fetch_avatar(&self, file: &File) -> Result<(), MediaError> {
        let mut slot = file.clone();
        let current = self.registry.renew(&mut slot);
        if current.local.can_be_downloaded
            && !current.local.is_downloading_active
            && !current.local.is_downloading_completed
        {
            self.transfers.download(&current, Priority::PREVIEW, None)?;
        }
        Ok(())
    }

    fn on_message(&self, message: &Message) -> Result<(), MediaError> {
        match &message.content {
            MessageContent::Photo(photo) => self.on_photo(message.chat_id, photo),
            // Videos and documents are never fetched ahead of time yet.
            MessageContent::Video(_) => Ok(()),
            MessageContent::Document(_) => Ok(()),
            MessageContent::Text { .. } => Ok(()),
        }
    }

    fn on_photo(&self, chat_id: ChatId, photo: &Photo) -> Result<(), MediaError> {
        // Structural invariant of the data, not a runtime condition.
        assert!(
            !photo.sizes.is_empty(),
            "photo message without any size variant"
        );

        let mut photo = photo.clone();
        for size in photo.sizes.iter_mut() {
            self.registry.renew(&mut size.file);
        }

        // The inline preview is fetched regardless of settings.
        if let Some(low) = photo
            .sizes
            .iter()
            .find(|s| s.file.local.can_be_downloaded)
        {
            self.transfers
                .download(&low.file, Priority::PREVIEW, None)?;
        }

        if (self.chat_filter)(chat_id) {
            if let Some(high) = photo
                .sizes
                .iter()
                .rev()
                .find(|s| s.file.local.can_be_downloaded)
            {
                self.transfers
                    .download(&high.file, Priority::BACKGROUND, None)?;
            }
        }

        Ok(())
    }
}

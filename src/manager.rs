// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! The top-level media manager.
//!
//! Wires the registry, the update dispatcher, the transfer manager, the
//! render cache and the auto-download engine around one backend channel,
//! and owns the inbound pump: every message from the transport goes
//! through [`MediaManager::handle_inbound`].

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::autodownload::{AutoDownload, ChatFilter, ClientEvent};
use crate::backend::{Backend, Envelope, Inbound, Request};
use crate::error::MediaError;
use crate::photo::{self, DisplayConfig};
use crate::registry::FileRegistry;
use crate::render::{RenderCache, RenderFn, RepaintFn, SharedImage};
use crate::sync::resilient_lock;
use crate::transfer::TransferManager;
use crate::types::{File, FileId, FileType, Location, Photo, PhotoSize, Priority};
use crate::updates::{BoxedHandler, UpdateDispatcher};

/// Parameters for a map thumbnail request. `new` fills the defaults the
/// backend expects; out-of-range values are clamped at call time.
#[derive(Debug, Clone)]
pub struct MapThumbnail {
    pub location: Location,
    /// Map zoom level, 13 to 20.
    pub zoom: i32,
    /// Thumbnail width in pixels, 16 to 1024.
    pub width: i32,
    /// Thumbnail height in pixels, 16 to 1024.
    pub height: i32,
    /// Display scale factor, 1 to 3.
    pub scale: i32,
    /// Chat the thumbnail is requested for; 0 when none.
    pub chat_id: i64,
}

impl MapThumbnail {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            zoom: 13,
            width: 300,
            height: 200,
            scale: 1,
            chat_id: 0,
        }
    }
}

/// One per client session.
pub struct MediaManager {
    backend: Backend,
    registry: Arc<FileRegistry>,
    updates: Arc<UpdateDispatcher>,
    transfers: Arc<TransferManager>,
    cache: RenderCache,
    autodownload: Mutex<AutoDownload>,
    display: DisplayConfig,
}

impl MediaManager {
    /// Build the whole stack around a fresh backend channel. The returned
    /// receiver is the outbound envelope stream the transport drains.
    pub fn new(
        display: DisplayConfig,
        chat_filter: ChatFilter,
    ) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (backend, rx) = Backend::channel();
        let registry = Arc::new(FileRegistry::new(backend.clone()));
        let updates = Arc::new(UpdateDispatcher::new());
        let transfers = Arc::new(TransferManager::new(
            backend.clone(),
            Arc::clone(&registry),
            Arc::clone(&updates),
        ));
        let cache = RenderCache::new(Arc::clone(&registry), Arc::clone(&updates));
        let autodownload = Mutex::new(AutoDownload::new(
            Arc::clone(&transfers),
            Arc::clone(&registry),
            chat_filter,
        ));

        let manager = Self {
            backend,
            registry,
            updates,
            transfers,
            cache,
            autodownload,
            display,
        };
        (manager, rx)
    }

    /// Process one message from the transport.
    ///
    /// File updates land in the registry before any handler runs, so a
    /// handler that re-reads the file through the registry always sees the
    /// state it was notified about, or something newer.
    pub fn handle_inbound(&self, inbound: Inbound) {
        match inbound {
            Inbound::Reply(reply) => self.backend.complete(reply),
            Inbound::FileUpdated { file } => {
                let file = self.registry.ensure(file);
                self.transfers.note_update(&file);
                self.updates.dispatch(&file);
            }
        }
    }

    /// Feed a client event to the auto-download engine.
    pub fn handle_event(&self, event: &ClientEvent) -> Result<(), MediaError> {
        resilient_lock(&self.autodownload).handle_event(event)
    }

    pub fn install_autodownload(&self) {
        resilient_lock(&self.autodownload).install();
    }

    pub fn remove_autodownload(&self) {
        resilient_lock(&self.autodownload).remove();
    }

    pub fn autodownload_installed(&self) -> bool {
        resilient_lock(&self.autodownload).is_installed()
    }

    /// Canonical snapshot of a file, fetching it from the backend when the
    /// registry has none.
    pub async fn get_file(&self, id: FileId) -> Result<File, MediaError> {
        self.registry.get(id).await
    }

    pub fn download(
        &self,
        file: &File,
        priority: Priority,
        handler: Option<BoxedHandler>,
    ) -> Result<(), MediaError> {
        self.transfers.download(file, priority, handler)
    }

    pub async fn upload(
        &self,
        path: impl Into<String>,
        file_type: FileType,
        priority: Priority,
        handler: Option<BoxedHandler>,
    ) -> Result<File, MediaError> {
        self.transfers.upload(path, file_type, priority, handler).await
    }

    pub fn cancel_download(&self, id: FileId, only_if_pending: bool) -> Result<(), MediaError> {
        self.transfers.cancel(id, only_if_pending)
    }

    pub fn cancel_upload(&self, id: FileId) -> Result<(), MediaError> {
        self.transfers.cancel_upload(id)
    }

    pub fn delete_file(&self, id: FileId) -> Result<(), MediaError> {
        self.transfers.delete(id)
    }

    pub fn render(
        &self,
        key: u64,
        file: &File,
        force: bool,
        render_fn: RenderFn,
        repaint: RepaintFn,
    ) -> SharedImage {
        self.cache.render(key, file, force, render_fn, repaint)
    }

    pub fn cached_image(&self, key: u64) -> Option<SharedImage> {
        self.cache.get(key)
    }

    pub fn highres(&self, photo: &mut Photo) -> Option<PhotoSize> {
        photo::highres(&self.registry, photo)
    }

    pub fn thumb(&self, photo: &mut Photo) -> Option<PhotoSize> {
        photo::thumb(&self.registry, photo)
    }

    /// Best variant for the configured default display slot.
    pub fn best(&self, photo: &mut Photo) -> Option<PhotoSize> {
        self.best_within(photo, self.display.max_cols, self.display.max_rows)
    }

    /// Best variant for a slot of `max_cols` x `max_rows` cells.
    pub fn best_within(
        &self,
        photo: &mut Photo,
        max_cols: u32,
        max_rows: u32,
    ) -> Option<PhotoSize> {
        photo::best(&self.registry, photo, max_cols, max_rows, &self.display)
    }

    /// Fetch a rendered map tile for a location. Out-of-range parameters
    /// are clamped, matching what the backend would do anyway.
    pub async fn map_thumbnail(&self, params: MapThumbnail) -> Result<File, MediaError> {
        let file = self
            .backend
            .call(Request::GetMapThumbnailFile {
                location: params.location,
                zoom: params.zoom.clamp(13, 20),
                width: params.width.clamp(16, 1024),
                height: params.height.clamp(16, 1024),
                scale: params.scale.clamp(1, 3),
                chat_id: params.chat_id,
            })
            .await?;
        Ok(self.registry.ensure(file))
    }

    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Reply, ReplyResult};
    use crate::types::LocalFile;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn display() -> DisplayConfig {
        DisplayConfig {
            cell_width: 10,
            cell_height: 10,
            max_cols: 40,
            max_rows: 20,
        }
    }

    fn setup() -> (MediaManager, mpsc::UnboundedReceiver<Envelope>) {
        MediaManager::new(display(), Arc::new(|_| true))
    }

    fn downloading(id: FileId, downloaded: i64) -> File {
        File {
            id,
            size: 100,
            local: LocalFile {
                downloaded_size: downloaded,
                is_downloading_active: true,
                can_be_downloaded: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn update_lands_in_registry_before_handlers_run() {
        let (manager, _rx) = setup();
        manager.registry.ensure(downloading(1, 0));

        let seen = Arc::new(AtomicI64::new(-1));
        let probe = Arc::clone(&seen);
        let registry = Arc::clone(&manager.registry);
        manager.updates.register(
            1,
            Box::new(move |f: &File| {
                // The registry must already hold what we were handed.
                let canonical = registry.lookup(f.id).unwrap();
                assert_eq!(canonical.local.downloaded_size, f.local.downloaded_size);
                probe.store(f.local.downloaded_size, Ordering::SeqCst);
                false
            }),
        );

        manager.handle_inbound(Inbound::FileUpdated {
            file: downloading(1, 42),
        });
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn inbound_reply_resolves_the_pending_call() {
        let (manager, mut rx) = setup();

        let handle = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        handle.block_on(async {
            let fetch = manager.get_file(5);
            tokio::pin!(fetch);

            // Poll once so the request goes out, then feed the reply in
            // through the same path the transport would use.
            tokio::select! {
                biased;
                _ = &mut fetch => panic!("no reply yet"),
                _ = std::future::ready(()) => {}
            }

            let envelope = rx.try_recv().expect("GetFile sent");
            assert_eq!(envelope.request, Request::GetFile { file_id: 5 });
            manager.handle_inbound(Inbound::Reply(Reply {
                id: envelope.id.unwrap(),
                result: ReplyResult::Ok {
                    file: downloading(5, 10),
                },
            }));

            let file = fetch.await.expect("resolved");
            assert_eq!(file.id, 5);
            assert_eq!(manager.registry.lookup(5).unwrap().id, 5);
        });
    }

    #[tokio::test]
    async fn map_thumbnail_clamps_parameters() {
        let (manager, mut rx) = setup();

        let mut params = MapThumbnail::new(Location {
            latitude: 52.52,
            longitude: 13.40,
        });
        params.zoom = 99;
        params.width = 4;
        params.height = 5000;
        params.scale = 0;

        let fetch = tokio::spawn(async move { manager.map_thumbnail(params).await });

        let envelope = rx.recv().await.expect("request sent");
        match &envelope.request {
            Request::GetMapThumbnailFile {
                zoom,
                width,
                height,
                scale,
                chat_id,
                ..
            } => {
                assert_eq!(*zoom, 20);
                assert_eq!(*width, 16);
                assert_eq!(*height, 1024);
                assert_eq!(*scale, 1);
                assert_eq!(*chat_id, 0);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        // Not resolving the call; the task is dropped with it.
        fetch.abort();
    }

    #[test]
    fn autodownload_toggles_through_the_facade() {
        let (manager, _rx) = setup();
        assert!(!manager.autodownload_installed());

        manager.install_autodownload();
        assert!(manager.autodownload_installed());

        manager.remove_autodownload();
        assert!(!manager.autodownload_installed());
    }

    #[test]
    fn update_reaches_transfer_bookkeeping() {
        let (manager, mut rx) = setup();

        let file = File {
            id: 7,
            size: 100,
            local: LocalFile {
                can_be_downloaded: true,
                ..Default::default()
            },
            ..Default::default()
        };
        manager.download(&file, Priority::default(), None).unwrap();
        rx.try_recv().expect("first request");

        // Idle acknowledgement closes the requested window.
        manager.handle_inbound(Inbound::FileUpdated { file: file.clone() });

        manager.download(&file, Priority::default(), None).unwrap();
        rx.try_recv().expect("window reopened");
    }
}

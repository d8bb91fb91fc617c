// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Image cache with in-place refreshed handles.
//!
//! Every display object gets exactly one [`SharedImage`] handle. When the
//! underlying file progresses, the cache re-renders and swaps the handle's
//! interior content. The handle itself stays the same, and so does every
//! clone held by the display layer, so holders observe the refresh without
//! any invalidation broadcast or re-subscription.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::registry::FileRegistry;
use crate::sync::{resilient_lock, resilient_read, resilient_write};
use crate::types::File;
use crate::updates::UpdateDispatcher;

/// Rendered output for one display object. What the bytes mean is up to
/// the object-specific render function; the cache never looks inside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Jointly owned handle; content is swapped in place, identity preserved.
pub type SharedImage = Arc<Mutex<Image>>;

/// Object-specific render function: canonical file snapshot in, image out.
pub type RenderFn = Arc<dyn Fn(&File) -> Image + Send + Sync>;

/// Invoked after an in-place refresh so the display layer repaints.
pub type RepaintFn = Arc<dyn Fn() + Send + Sync>;

/// One render per display object, keyed by the caller's object key.
pub struct RenderCache {
    registry: Arc<FileRegistry>,
    updates: Arc<UpdateDispatcher>,
    entries: RwLock<HashMap<u64, SharedImage>>,
}

impl RenderCache {
    pub fn new(registry: Arc<FileRegistry>, updates: Arc<UpdateDispatcher>) -> Self {
        Self {
            registry,
            updates,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The cached handle for `key`, if any.
    pub fn get(&self, key: u64) -> Option<SharedImage> {
        resilient_read(&self.entries).get(&key).cloned()
    }

    /// The image for `key`, rendering it if missing or `force` is set.
    ///
    /// When the resolved file is not fully downloaded yet, an update
    /// handler is registered that re-renders on every progress event,
    /// swaps the content in place and calls `repaint`; it detaches after
    /// rendering a completed file or once the download stops.
    pub fn render(
        &self,
        key: u64,
        file: &File,
        force: bool,
        render_fn: RenderFn,
        repaint: RepaintFn,
    ) -> SharedImage {
        if !force {
            if let Some(handle) = self.get(key) {
                return handle;
            }
        }

        let mut slot = file.clone();
        let current = self.registry.renew(&mut slot);
        let image = (render_fn)(&current);

        let handle = {
            let mut entries = resilient_write(&self.entries);
            match entries.entry(key) {
                Entry::Occupied(slot) => {
                    *resilient_lock(slot.get()) = image;
                    Arc::clone(slot.get())
                }
                Entry::Vacant(slot) => Arc::clone(slot.insert(Arc::new(Mutex::new(image)))),
            }
        };

        if !current.local.is_downloading_completed {
            let target = Arc::clone(&handle);
            self.updates.register(
                current.id,
                Box::new(move |f: &File| {
                    *resilient_lock(&target) = (render_fn)(f);
                    (repaint)();
                    f.local.is_downloading_active && !f.local.is_downloading_completed
                }),
            );
        }

        handle
    }
}

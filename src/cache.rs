use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::decode::{DecodedImage, decode_image};

pub const DEFAULT_CAPACITY: usize = 12;

/// Bounded path-keyed map of decoded images, shared between the render
/// path and the prefetch thread.
///
/// Decoding happens outside the lock; insertion is first-writer-wins, so
/// two threads racing on one key agree on a single cached instance and the
/// loser's decode is discarded. Failed decodes are never cached and retry
/// on the next request.
///
/// Eviction trims in ascending-key order (the map's own order, not LRU)
/// until at most `capacity` entries remain.
pub struct ImageCache {
    entries: Mutex<BTreeMap<PathBuf, Arc<DecodedImage>>>,
    capacity: usize,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Cached handle for `path`, decoding synchronously on a miss. This
    /// on-demand fallback keeps the UI responsive when navigation outruns
    /// the prefetcher. A decode failure is "no value", not an error.
    pub fn get(&self, path: &Path) -> Option<Arc<DecodedImage>> {
        if let Some(hit) = self.peek(path) {
            return Some(hit);
        }

        match decode_image(path) {
            Ok(decoded) => Some(self.insert_if_absent(path, decoded)),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    /// Lookup without the decode fallback. Used where a miss should stay a
    /// miss, e.g. the animation timer.
    pub fn peek(&self, path: &Path) -> Option<Arc<DecodedImage>> {
        self.entries.lock().unwrap().get(path).cloned()
    }

    /// Prefetch entry point: decode and insert unless already present.
    pub fn put_if_absent(&self, path: &Path) {
        if self.peek(path).is_some() {
            return;
        }
        match decode_image(path) {
            Ok(decoded) => {
                self.insert_if_absent(path, decoded);
            }
            Err(e) => log::debug!("prefetch skipped: {e}"),
        }
    }

    fn insert_if_absent(&self, path: &Path, decoded: DecodedImage) -> Arc<DecodedImage> {
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(path.to_owned())
            .or_insert_with(|| Arc::new(decoded))
            .clone()
    }

    /// Trim to capacity, removing entries in ascending-key order. Evicted
    /// handles stay alive for whoever still holds them.
    pub fn evict_excess(&self) {
        let mut entries = self.entries.lock().unwrap();
        while entries.len() > self.capacity {
            if let Some((path, _)) = entries.pop_first() {
                log::debug!("evicted {}", path.display());
            }
        }
    }

    /// Drop the entry for `path` so a rewritten file is never served stale.
    pub fn invalidate(&self, path: &Path) {
        self.entries.lock().unwrap().remove(path);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

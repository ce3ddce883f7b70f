use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::cache::ImageCache;
use crate::decode::DecodedImage;
use crate::error::ViewerError;
use crate::files::FileSet;
use crate::nav::NavigationState;
use crate::ops;
use crate::transform::{self, Matrix, Rect, ZoomMode};

pub const NO_IMAGES: &str = "No image found";
pub const LOAD_ERROR: &str = "Error loading image";

/// Everything the render path needs for one paint: the image handle (if
/// any), which frame of it, where it goes, the orientation matrix, and the
/// placeholder text when there is nothing to draw.
pub struct DisplayFrame {
    pub image: Option<Arc<DecodedImage>>,
    pub frame_index: usize,
    pub rect: Rect,
    pub matrix: Matrix,
    pub placeholder: Option<&'static str>,
}

struct ScanConfig {
    root: PathBuf,
    recursive: bool,
}

/// Owner of the file set, navigation state and image cache. One per
/// process, shared by reference with the prefetch thread; the file-set
/// lock and the cache lock are independent and never held together across
/// a decode.
pub struct ViewerSession {
    config: Mutex<ScanConfig>,
    files: RwLock<Arc<FileSet>>,
    nav: Mutex<NavigationState>,
    cache: ImageCache,
}

impl ViewerSession {
    pub fn new(root: PathBuf, recursive: bool, cache_capacity: usize) -> Self {
        let files = FileSet::enumerate(&root, recursive);
        Self {
            config: Mutex::new(ScanConfig { root, recursive }),
            files: RwLock::new(Arc::new(files)),
            nav: Mutex::new(NavigationState::default()),
            cache: ImageCache::new(cache_capacity),
        }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn files_snapshot(&self) -> Arc<FileSet> {
        Arc::clone(&self.files.read().unwrap())
    }

    pub fn len(&self) -> usize {
        self.files_snapshot().len()
    }

    pub fn current_index(&self) -> usize {
        self.nav.lock().unwrap().index()
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        let files = self.files_snapshot();
        let index = self.current_index();
        files.get(index).map(Path::to_path_buf)
    }

    /// Re-enumerate under the current config and swap the snapshot in
    /// atomically. Navigation compacts to the new bounds.
    pub fn rescan(&self) {
        let (root, recursive) = {
            let config = self.config.lock().unwrap();
            (config.root.clone(), config.recursive)
        };
        let fresh = Arc::new(FileSet::enumerate(&root, recursive));
        let len = fresh.len();
        *self.files.write().unwrap() = fresh;
        self.nav.lock().unwrap().on_file_set_replaced(len);
    }

    /// Toggle recursion and rescan. Returns the new flag value.
    pub fn toggle_recursive(&self) -> bool {
        let recursive = {
            let mut config = self.config.lock().unwrap();
            config.recursive = !config.recursive;
            config.recursive
        };
        self.rescan();
        recursive
    }

    pub fn next(&self) {
        let len = self.len();
        self.nav.lock().unwrap().next(len);
        log::debug!("nav -> {}", self.current_index());
    }

    pub fn previous(&self) {
        let len = self.len();
        self.nav.lock().unwrap().previous(len);
        log::debug!("nav -> {}", self.current_index());
    }

    pub fn first(&self) {
        let len = self.len();
        self.nav.lock().unwrap().jump_to(0, len);
    }

    pub fn last(&self) {
        let len = self.len();
        if len > 0 {
            self.nav.lock().unwrap().jump_to(len - 1, len);
        }
    }

    /// The current image with its display geometry. Decodes on demand when
    /// the prefetcher has not reached this index yet.
    pub fn get_display_frame(&self, viewport: Rect, zoom: ZoomMode) -> DisplayFrame {
        let empty = |placeholder| DisplayFrame {
            image: None,
            frame_index: 0,
            rect: Rect::default(),
            matrix: Matrix::IDENTITY,
            placeholder: Some(placeholder),
        };

        let Some(path) = self.current_path() else {
            return empty(NO_IMAGES);
        };
        let Some(image) = self.cache.get(&path) else {
            return empty(LOAD_ERROR);
        };

        let (rect, matrix) =
            transform::compute(image.width, image.height, image.orientation, viewport, zoom);
        let frame_index = self.nav.lock().unwrap().frame_index();
        DisplayFrame {
            image: Some(image),
            frame_index,
            rect,
            matrix,
            placeholder: None,
        }
    }

    /// Step the animation for the current image, returning the delay until
    /// the next step. `None` for static images or a cache miss (the timer
    /// must not trigger a decode).
    pub fn advance_frame(&self) -> Option<u64> {
        let path = self.current_path()?;
        let image = self.cache.peek(&path)?;
        if !image.is_animated() {
            return None;
        }
        let mut nav = self.nav.lock().unwrap();
        nav.advance_frame(image.frame_count());
        Some(image.frame(nav.frame_index()).delay_ms)
    }

    pub fn info_snapshot(&self) -> InfoSnapshot {
        let root = self.config.lock().unwrap().root.display().to_string();
        let mut info = InfoSnapshot::placeholder(root);

        let Some(path) = self.current_path() else {
            return info;
        };
        info.name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "-".into());
        info.full_path = path.display().to_string();

        if let Ok(meta) = fs::metadata(&path) {
            info.size = format!("{} bytes", meta.len());
            info.created = format_time(meta.created().ok());
            info.modified = format_time(meta.modified().ok());
        }
        if let Some(image) = self.cache.get(&path) {
            info.kind = image.format_name.clone();
            info.dimensions = format!("{} x {}", image.width, image.height);
            info.bits_per_pixel = image.bits_per_pixel.to_string();
        }
        info
    }

    /// Append the current path to `out`, or print it when no file is set.
    pub fn mark_current(&self, out: Option<&Path>) {
        let Some(path) = self.current_path() else {
            return;
        };
        match out {
            Some(out_path) => {
                match fs::OpenOptions::new().create(true).append(true).open(out_path) {
                    Ok(mut file) => {
                        if let Err(e) = writeln!(file, "{}", path.display()) {
                            log::error!("failed to write mark file: {}", e);
                        }
                    }
                    Err(e) => log::error!("failed to open mark file: {}", e),
                }
            }
            None => println!("{}", path.display()),
        }
    }

    /// Delete the current file and rebuild the file set. The cache entry
    /// goes with it so a re-created file decodes fresh.
    pub fn delete_current(&self) {
        let Some(path) = self.current_path() else {
            return;
        };
        if let Err(e) = fs::remove_file(&path) {
            log::error!("failed to delete {}: {}", path.display(), e);
            return;
        }
        log::info!("deleted {}", path.display());
        self.cache.invalidate(&path);
        self.rescan();
    }

    /// Rotate the current file on disk. The cache entry is invalidated only
    /// on success; a failed resave leaves both the file and the cached
    /// decode untouched.
    pub fn rotate_current(&self, clockwise: bool) -> Result<(), ViewerError> {
        let Some(path) = self.current_path() else {
            return Ok(());
        };
        ops::rotate_and_resave(&path, clockwise)?;
        self.cache.invalidate(&path);
        Ok(())
    }
}

/// Informational fields for the current file. Every field degrades to "-"
/// on failure; producing this never errors.
pub struct InfoSnapshot {
    pub name: String,
    pub kind: String,
    pub size: String,
    pub dimensions: String,
    pub bits_per_pixel: String,
    pub full_path: String,
    pub root: String,
    pub created: String,
    pub modified: String,
}

impl InfoSnapshot {
    fn placeholder(root: String) -> Self {
        let dash = || "-".to_string();
        Self {
            name: dash(),
            kind: dash(),
            size: dash(),
            dimensions: dash(),
            bits_per_pixel: dash(),
            full_path: dash(),
            root,
            created: dash(),
            modified: dash(),
        }
    }
}

impl fmt::Display for InfoSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Type: {}", self.kind)?;
        writeln!(f, "Size: {}", self.size)?;
        writeln!(f, "Dimensions: {}", self.dimensions)?;
        writeln!(f, "BPP: {}", self.bits_per_pixel)?;
        writeln!(f, "Full path: {}", self.full_path)?;
        writeln!(f, "Current root: {}", self.root)?;
        writeln!(f, "Created: {}", self.created)?;
        write!(f, "Modified: {}", self.modified)
    }
}

fn format_time(t: Option<SystemTime>) -> String {
    t.map(|t| {
        DateTime::<Local>::from(t)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
    .unwrap_or_else(|| "-".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_CAPACITY;
    use crate::test_util::write_png;
    use tempfile::tempdir;

    fn session_with(names: &[&str], dir: &Path) -> ViewerSession {
        for name in names {
            write_png(&dir.join(name), 2, 2);
        }
        ViewerSession::new(dir.to_path_buf(), false, DEFAULT_CAPACITY)
    }

    #[test]
    fn empty_folder_stays_in_empty_state() {
        let dir = tempdir().unwrap();
        let session = ViewerSession::new(dir.path().to_path_buf(), false, DEFAULT_CAPACITY);

        session.next();
        session.previous();
        assert_eq!(session.current_index(), 0);
        assert!(session.current_path().is_none());

        let frame = session.get_display_frame(Rect::new(0.0, 0.0, 800.0, 600.0), ZoomMode::Fit);
        assert!(frame.image.is_none());
        assert_eq!(frame.placeholder, Some(NO_IMAGES));

        let info = session.info_snapshot();
        assert_eq!(info.name, "-");
        assert_eq!(info.dimensions, "-");
    }

    #[test]
    fn navigation_wraps_over_snapshot() {
        let dir = tempdir().unwrap();
        let session = session_with(&["a.png", "b.png", "c.png"], dir.path());
        assert_eq!(session.len(), 3);

        session.previous();
        assert_eq!(session.current_index(), 2);
        session.next();
        assert_eq!(session.current_index(), 0);
        session.last();
        assert_eq!(session.current_index(), 2);
        session.first();
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn display_frame_decodes_on_demand() {
        let dir = tempdir().unwrap();
        let session = session_with(&["a.png"], dir.path());
        assert_eq!(session.cache().len(), 0);

        let frame = session.get_display_frame(Rect::new(0.0, 0.0, 100.0, 100.0), ZoomMode::Actual);
        let image = frame.image.expect("on-demand decode");
        assert_eq!(image.width, 2);
        assert!(frame.placeholder.is_none());
        assert_eq!(session.cache().len(), 1);
    }

    #[test]
    fn unreadable_file_yields_error_placeholder() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 1, 1);
        fs::write(dir.path().join("b.png"), b"junk").unwrap();
        let session = ViewerSession::new(dir.path().to_path_buf(), false, DEFAULT_CAPACITY);

        session.next();
        let frame = session.get_display_frame(Rect::new(0.0, 0.0, 100.0, 100.0), ZoomMode::Fit);
        assert!(frame.image.is_none());
        assert_eq!(frame.placeholder, Some(LOAD_ERROR));
    }

    #[test]
    fn delete_compacts_the_set() {
        let dir = tempdir().unwrap();
        let session = session_with(&["a.png", "b.png", "c.png"], dir.path());
        session.last();

        session.delete_current();
        assert_eq!(session.len(), 2);
        // Old index 2 is out of bounds for the new snapshot.
        assert_eq!(session.current_index(), 0);
        assert!(!dir.path().join("c.png").exists());
    }

    #[test]
    fn rotate_invalidates_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_png(&path, 4, 2);
        let session = ViewerSession::new(dir.path().to_path_buf(), false, DEFAULT_CAPACITY);

        // Warm the cache with the pre-rotation decode.
        assert_eq!(session.cache().get(&path).unwrap().width, 4);

        session.rotate_current(true).unwrap();
        let frame = session.get_display_frame(Rect::new(0.0, 0.0, 100.0, 100.0), ZoomMode::Actual);
        let image = frame.image.unwrap();
        assert_eq!((image.width, image.height), (2, 4));
    }

    #[test]
    fn failed_rotate_keeps_cache_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 2, 2);
        let session = ViewerSession::new(dir.path().to_path_buf(), false, DEFAULT_CAPACITY);
        let cached = session.cache().get(&path).unwrap();

        fs::write(&path, b"junk").unwrap();
        assert!(session.rotate_current(true).is_err());
        assert!(Arc::ptr_eq(&cached, &session.cache().peek(&path).unwrap()));
    }

    #[test]
    fn toggle_recursive_rescans() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("top.png"), 1, 1);
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_png(&dir.path().join("sub").join("nested.png"), 1, 1);

        let session = ViewerSession::new(dir.path().to_path_buf(), false, DEFAULT_CAPACITY);
        assert_eq!(session.len(), 1);
        assert!(session.toggle_recursive());
        assert_eq!(session.len(), 2);
        assert!(!session.toggle_recursive());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn mark_appends_current_path() {
        let dir = tempdir().unwrap();
        let session = session_with(&["a.png", "b.png"], dir.path());
        let out = dir.path().join("marks.txt");

        session.mark_current(Some(&out));
        session.next();
        session.mark_current(Some(&out));

        let contents = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("a.png"));
        assert!(lines[1].ends_with("b.png"));
    }

    #[test]
    fn info_snapshot_reports_decoded_fields() {
        let dir = tempdir().unwrap();
        let session = session_with(&["a.png"], dir.path());

        let info = session.info_snapshot();
        assert_eq!(info.name, "a.png");
        assert_eq!(info.kind, "PNG");
        assert_eq!(info.dimensions, "2 x 2");
        assert_eq!(info.bits_per_pixel, "32");
        assert!(info.size.ends_with(" bytes"));
        assert_ne!(info.modified, "-");
    }
}

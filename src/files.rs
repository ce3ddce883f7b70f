use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "ico", "gif"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// An immutable snapshot of the enumerated image paths. Replaced wholesale
/// (behind `RwLock<Arc<FileSet>>` in the session) when the root folder or
/// recursion flag changes or after a destructive file operation.
#[derive(Debug, Default)]
pub struct FileSet {
    paths: Vec<PathBuf>,
}

impl FileSet {
    /// Enumerate image files under `root`. An inaccessible or missing root
    /// yields an empty set, never an error.
    pub fn enumerate(root: &Path, recursive: bool) -> Self {
        let mut paths = Vec::new();
        scan_dir(root, recursive, &mut paths);
        log::info!("scanned {}: {} images", root.display(), paths.len());
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }
}

fn scan_dir(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot read {}: {}", dir.display(), e);
            return;
        }
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() && is_image_file(&p) {
            files.push(p);
        } else if recursive && p.is_dir() {
            subdirs.push(p);
        }
    }

    // Sort within each directory so the browse order is stable across runs.
    files.sort();
    out.extend(files);

    if recursive {
        subdirs.sort();
        for sub in subdirs {
            scan_dir(&sub, true, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn filters_by_extension_allow_list() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("b.PNG"));
        touch(&dir.path().join("c.txt"));
        touch(&dir.path().join("d.tiff"));
        touch(&dir.path().join("noext"));

        let set = FileSet::enumerate(dir.path(), false);
        assert_eq!(set.len(), 2);
        assert!(set.get(0).unwrap().ends_with("a.jpg"));
        assert!(set.get(1).unwrap().ends_with("b.PNG"));
    }

    #[test]
    fn recursion_flag_controls_subdirectories() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("top.gif"));
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub").join("nested.bmp"));

        let flat = FileSet::enumerate(dir.path(), false);
        assert_eq!(flat.len(), 1);

        let deep = FileSet::enumerate(dir.path(), true);
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn missing_root_yields_empty_set() {
        let set = FileSet::enumerate(Path::new("/nonexistent/piv-test"), true);
        assert!(set.is_empty());
        assert_eq!(set.get(0), None);
    }
}

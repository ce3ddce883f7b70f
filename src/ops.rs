use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::ViewerError;

/// Rotate the image on disk by 90 degrees and write it back in its own
/// format, via a temp file and an atomic rename. On any failure the temp
/// file is removed and the original is left untouched.
///
/// The re-encode carries no EXIF block, so a stored orientation tag is
/// normalized to 1 along with the physical rotation.
pub fn rotate_and_resave(path: &Path, clockwise: bool) -> Result<(), ViewerError> {
    let img = image::open(path).map_err(|source| ViewerError::Decode {
        path: path.to_owned(),
        source,
    })?;
    let rotated = if clockwise {
        img.rotate90()
    } else {
        img.rotate270()
    };

    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
    let tmp = temp_path(path);
    if let Err(source) = rotated.save_with_format(&tmp, format) {
        let _ = fs::remove_file(&tmp);
        return Err(ViewerError::Resave {
            path: path.to_owned(),
            source,
        });
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    log::info!(
        "rotated {} ({})",
        path.display(),
        if clockwise { "cw" } else { "ccw" }
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, GenericImageView};

use crate::error::ViewerError;
use crate::transform::Orientation;

/// One RGBA8 frame. Static images have exactly one; animated GIFs carry the
/// per-frame delay from the file.
pub struct ImageFrame {
    pub rgba: Vec<u8>,
    pub delay_ms: u64,
}

/// A decoded image as held by the cache. Shared as `Arc<DecodedImage>`, so
/// a handle returned to the render path stays alive after eviction.
pub struct DecodedImage {
    pub frames: Vec<ImageFrame>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub format_name: String,
    pub bits_per_pixel: u32,
    pub orientation: Orientation,
}

impl DecodedImage {
    pub fn frame(&self, index: usize) -> &ImageFrame {
        &self.frames[index % self.frames.len()]
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }
}

pub fn decode_image(path: &Path) -> Result<DecodedImage, ViewerError> {
    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let format_name = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_uppercase();
    let orientation = read_orientation(path);

    let is_gif = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"));
    if is_gif {
        if let Some(decoded) =
            decode_gif_frames(path, file_size, &format_name, orientation)?
        {
            return Ok(decoded);
        }
    }

    let img = image::open(path).map_err(|source| ViewerError::Decode {
        path: path.to_owned(),
        source,
    })?;
    let bits_per_pixel = img.color().bytes_per_pixel() as u32 * 8;
    let (width, height) = img.dimensions();
    let rgba = img.into_rgba8();

    Ok(DecodedImage {
        frames: vec![ImageFrame {
            rgba: rgba.into_raw(),
            delay_ms: 0,
        }],
        width,
        height,
        file_size,
        format_name,
        bits_per_pixel,
        orientation,
    })
}

/// Decode every frame of a GIF. Returns `Ok(None)` for a zero-frame file so
/// the caller can fall back to the static decode path.
fn decode_gif_frames(
    path: &Path,
    file_size: u64,
    format_name: &str,
    orientation: Orientation,
) -> Result<Option<DecodedImage>, ViewerError> {
    let wrap = |source| ViewerError::Decode {
        path: path.to_owned(),
        source,
    };

    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader).map_err(wrap)?;
    let raw_frames = decoder.into_frames().collect_frames().map_err(wrap)?;
    if raw_frames.is_empty() {
        return Ok(None);
    }

    let mut frames = Vec::with_capacity(raw_frames.len());
    let mut width = 0;
    let mut height = 0;
    for frame in raw_frames {
        let delay = Duration::from(frame.delay()).as_millis() as u64;
        let buffer = frame.into_buffer();
        if width == 0 {
            width = buffer.width();
            height = buffer.height();
        }
        frames.push(ImageFrame {
            rgba: buffer.into_raw(),
            // GIFs with a zero delay get the conventional 100 ms.
            delay_ms: if delay == 0 { 100 } else { delay },
        });
    }

    Ok(Some(DecodedImage {
        frames,
        width,
        height,
        file_size,
        format_name: format_name.to_string(),
        bits_per_pixel: 32,
        orientation,
    }))
}

/// Read the EXIF orientation tag. Anything short of a readable short value
/// (no metadata, unreadable file, non-EXIF format) is orientation 1.
fn read_orientation(path: &Path) -> Orientation {
    let Ok(file) = File::open(path) else {
        return Orientation::Normal;
    };
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(meta) => meta
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif)
            .unwrap_or(Orientation::Normal),
        Err(_) => Orientation::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn decodes_png_as_single_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.png");
        crate::test_util::write_png(&path, 1, 1);

        let decoded = decode_image(&path).unwrap();
        assert_eq!(decoded.width, 1);
        assert_eq!(decoded.height, 1);
        assert_eq!(decoded.frame_count(), 1);
        assert!(!decoded.is_animated());
        assert_eq!(decoded.format_name, "PNG");
        assert_eq!(decoded.orientation, Orientation::Normal);
        assert_eq!(decoded.frame(0).rgba.len(), 4);
    }

    #[test]
    fn garbage_bytes_are_a_decode_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.jpg");
        std::fs::write(&path, b"not an image at all").unwrap();

        assert!(matches!(
            decode_image(&path),
            Err(ViewerError::Decode { .. })
        ));
    }
}

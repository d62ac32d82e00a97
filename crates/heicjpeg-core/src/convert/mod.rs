/// Per-item work: convert one HEIC/HEIF image to JPEG, or copy one
/// pass-through file.
///
/// Every failure is scoped to the item and returned as a value; the runner
/// decides what to do with it.
pub mod decoder;

use crate::error::{ConvertError, CopyError};
use decoder::{display_name, HeifDecoder};
use filetime::FileTime;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use decoder::default_decoder;

/// JPEG quality on the 0–100 scale. Fixed for every conversion.
pub const JPEG_QUALITY: u8 = 95;

/// Converts and copies single items.
#[derive(Clone)]
pub struct ItemConverter {
    decoder: Arc<dyn HeifDecoder>,
}

impl Default for ItemConverter {
    fn default() -> Self {
        Self::new(default_decoder())
    }
}

impl ItemConverter {
    pub fn new(decoder: Arc<dyn HeifDecoder>) -> Self {
        Self { decoder }
    }

    /// Decode `src`, flatten any alpha away and write a JPEG to `dest`.
    ///
    /// An existing file at `dest` is replaced. Nothing is written unless
    /// encoding succeeded.
    pub fn convert_image(&self, src: &Path, dest: &Path) -> Result<(), ConvertError> {
        let name = display_name(src);
        let decoded = self.decoder.decode(src)?;
        let rgb = flatten_to_rgb(decoded);
        let bytes = encode_jpeg(&rgb, JPEG_QUALITY).map_err(|e| ConvertError::Encode {
            name: name.clone(),
            cause: e.to_string(),
        })?;
        fs::write(dest, bytes).map_err(|source| ConvertError::Io { name, source })?;
        debug!("Converted {} -> {}", src.display(), dest.display());
        Ok(())
    }

    /// Copy `src` to `dest` byte for byte, then carry the access and
    /// modification times across where the platform allows it.
    pub fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), CopyError> {
        copy_with_times(src, dest).map_err(|source| CopyError {
            name: display_name(src),
            source,
        })
    }
}

/// Normalize the color mode for JPEG.
///
/// Any alpha channel is dropped, not composited against a background, so
/// translucent pixels keep their raw color values. 8-bit gray and RGB are
/// left alone; every other layout becomes RGB8.
pub fn flatten_to_rgb(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img,
        _ => DynamicImage::ImageRgb8(img.into_rgb8()),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    img.write_with_encoder(encoder)?;
    Ok(buffer.into_inner())
}

fn copy_with_times(src: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    fs::copy(src, dest)?;

    // Path based, so a read-only copy still takes the source times.
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    if let Err(err) = filetime::set_file_times(dest, atime, mtime) {
        debug!("Could not preserve timestamps on {}: {err}", dest.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, LumaA, Rgb, RgbImage, Rgba, RgbaImage};
    use std::fs::OpenOptions;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    /// Reads whatever the `image` crate recognizes by content, so tests can
    /// store PNG bytes under a `.heic` name.
    struct ContentSniffingDecoder;

    impl HeifDecoder for ContentSniffingDecoder {
        fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError> {
            let name = display_name(path);
            image::ImageReader::open(path)
                .map_err(|source| ConvertError::Io {
                    name: name.clone(),
                    source,
                })?
                .with_guessed_format()
                .map_err(|source| ConvertError::Io {
                    name: name.clone(),
                    source,
                })?
                .decode()
                .map_err(|e| ConvertError::Decode {
                    name,
                    cause: e.to_string(),
                })
        }
    }

    fn converter() -> ItemConverter {
        ItemConverter::new(Arc::new(ContentSniffingDecoder))
    }

    #[test]
    fn test_flatten_drops_alpha_without_compositing() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([200, 100, 50, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let flat = flatten_to_rgb(DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.color(), ColorType::Rgb8);
        let rgb = flat.to_rgb8();
        // Fully transparent pixel keeps its color rather than turning white/black.
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([200, 100, 50]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_flatten_luma_alpha() {
        let la = image::ImageBuffer::from_pixel(3, 3, LumaA([90u8, 10]));
        let flat = flatten_to_rgb(DynamicImage::ImageLumaA8(la));
        assert_eq!(flat.color(), ColorType::Rgb8);
        assert_eq!(flat.to_rgb8().get_pixel(1, 1), &Rgb([90, 90, 90]));
    }

    #[test]
    fn test_flatten_keeps_rgb_and_gray() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert_eq!(flatten_to_rgb(rgb).color(), ColorType::Rgb8);
        let gray = DynamicImage::ImageLuma8(image::GrayImage::new(1, 1));
        assert_eq!(flatten_to_rgb(gray).color(), ColorType::L8);
    }

    #[test]
    fn test_convert_alpha_image_produces_rgb_jpeg() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("alpha.heic");
        let img = RgbaImage::from_pixel(16, 8, Rgba([30, 160, 220, 128]));
        img.save_with_format(&src, ImageFormat::Png).unwrap();
        let dest = tmp.path().join("alpha.jpg");

        converter().convert_image(&src, &dest).unwrap();

        let out = image::open(&dest).unwrap();
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(out.dimensions(), (16, 8));
        let px = out.to_rgb8().get_pixel(4, 4).0;
        for (got, want) in px.iter().zip([30u8, 160, 220]) {
            assert!(got.abs_diff(want) <= 6, "pixel {px:?} drifted too far");
        }
    }

    #[test]
    fn test_convert_failure_is_scoped_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("broken.heic");
        fs::write(&src, b"garbage").unwrap();
        let dest = tmp.path().join("broken.jpg");

        let err = converter().convert_image(&src, &dest).unwrap_err();
        assert_eq!(err.name(), "broken.heic");
        assert!(!dest.exists());
    }

    #[test]
    fn test_copy_preserves_bytes_and_mtime() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("notes.txt");
        fs::write(&src, b"hello pipeline").unwrap();
        let old = SystemTime::now() - Duration::from_secs(86_400 * 30);
        OpenOptions::new()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(old)
            .unwrap();
        let dest = tmp.path().join("copy.txt");

        converter().copy_file(&src, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"hello pipeline");
        let copied = fs::metadata(&dest).unwrap().modified().unwrap();
        let delta = copied
            .duration_since(old)
            .unwrap_or_else(|e| e.duration());
        assert!(delta < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_read_only_source_keeps_mtime() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("locked.txt");
        fs::write(&src, b"read only").unwrap();
        let old = SystemTime::now() - Duration::from_secs(86_400 * 30);
        OpenOptions::new()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(old)
            .unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();
        if OpenOptions::new().write(true).open(&src).is_ok() {
            eprintln!("running with write access to read-only files, skipping");
            return;
        }
        let dest = tmp.path().join("locked_copy.txt");

        converter().copy_file(&src, &dest).unwrap();

        let meta = fs::metadata(&dest).unwrap();
        assert!(meta.permissions().readonly());
        let delta = meta
            .modified()
            .unwrap()
            .duration_since(old)
            .unwrap_or_else(|e| e.duration());
        assert!(delta < Duration::from_secs(2), "mtime not carried over");
    }

    #[test]
    fn test_copy_missing_source_is_scoped() {
        let tmp = TempDir::new().unwrap();
        let err = converter()
            .copy_file(&tmp.path().join("ghost.txt"), &tmp.path().join("out.txt"))
            .unwrap_err();
        assert_eq!(err.name, "ghost.txt");
    }
}

/// HEIF decoding backends.
///
/// The runner only sees the [`HeifDecoder`] trait. The production backend
/// wraps libheif (cargo feature `libheif`, on by default); builds without
/// it fall back to [`UnavailableDecoder`], which fails every image as a
/// scoped item error rather than failing the run.
use crate::error::ConvertError;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Decode one HEIC/HEIF file into a pixel buffer with a declared color mode.
pub trait HeifDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError>;
}

/// The best decoder this build was compiled with.
pub fn default_decoder() -> Arc<dyn HeifDecoder> {
    #[cfg(feature = "libheif")]
    {
        Arc::new(LibHeifDecoder)
    }
    #[cfg(not(feature = "libheif"))]
    {
        Arc::new(UnavailableDecoder)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Decoder used when no HEIF backend was compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDecoder;

impl HeifDecoder for UnavailableDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError> {
        Err(ConvertError::Unsupported {
            name: display_name(path),
        })
    }
}

/// Copy `rows` rows of `row_len` bytes out of a plane whose rows are
/// `stride` bytes apart, dropping any row padding.
///
/// Returns `None` if the plane is too short or the stride is narrower
/// than a row.
#[cfg_attr(not(feature = "libheif"), allow(dead_code))]
pub(crate) fn pack_rows(
    data: &[u8],
    stride: usize,
    row_len: usize,
    rows: usize,
) -> Option<Vec<u8>> {
    if stride < row_len || stride == 0 {
        return None;
    }
    let mut pixels = Vec::with_capacity(row_len * rows);
    for row in 0..rows {
        let start = row * stride;
        pixels.extend_from_slice(data.get(start..start + row_len)?);
    }
    Some(pixels)
}

#[cfg(feature = "libheif")]
pub use libheif_backend::LibHeifDecoder;

#[cfg(feature = "libheif")]
mod libheif_backend {
    use super::{display_name, pack_rows, HeifDecoder};
    use crate::error::ConvertError;
    use image::{DynamicImage, ImageBuffer};
    use libheif_rs::{ColorSpace, HeifContext, HeifError, LibHeif, RgbChroma};
    use std::fs;
    use std::path::Path;
    use tracing::debug;

    /// Decodes the primary image of a HEIF container through libheif.
    ///
    /// Images whose handle declares an alpha channel are decoded as
    /// interleaved RGBA, everything else as interleaved RGB, both 8 bits
    /// per channel.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibHeifDecoder;

    impl HeifDecoder for LibHeifDecoder {
        fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError> {
            let name = display_name(path);
            let data = fs::read(path).map_err(|source| ConvertError::Io {
                name: name.clone(),
                source,
            })?;
            let heif_err = |e: HeifError| ConvertError::Decode {
                name: name.clone(),
                cause: e.to_string(),
            };

            let lib = LibHeif::new();
            let ctx = HeifContext::read_from_bytes(&data).map_err(heif_err)?;
            let handle = ctx.primary_image_handle().map_err(heif_err)?;
            let has_alpha = handle.has_alpha_channel();
            let chroma = if has_alpha {
                RgbChroma::Rgba
            } else {
                RgbChroma::Rgb
            };
            let decoded = lib
                .decode(&handle, ColorSpace::Rgb(chroma), None)
                .map_err(heif_err)?;

            let planes = decoded.planes();
            let plane = planes.interleaved.ok_or_else(|| ConvertError::Decode {
                name: name.clone(),
                cause: "decoder produced no interleaved plane".to_string(),
            })?;

            let channels = if has_alpha { 4 } else { 3 };
            let width = plane.width;
            let height = plane.height;
            let row_len = width as usize * channels;
            let pixels = pack_rows(plane.data, plane.stride, row_len, height as usize)
                .ok_or_else(|| ConvertError::Decode {
                    name: name.clone(),
                    cause: "truncated pixel plane".to_string(),
                })?;

            debug!("Decoded {name}: {width}x{height}, alpha={has_alpha}");

            let short_buffer = || ConvertError::Decode {
                name: name.clone(),
                cause: "pixel buffer smaller than image dimensions".to_string(),
            };
            if has_alpha {
                ImageBuffer::from_raw(width, height, pixels)
                    .map(DynamicImage::ImageRgba8)
                    .ok_or_else(short_buffer)
            } else {
                ImageBuffer::from_raw(width, height, pixels)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(short_buffer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_decoder_is_scoped_error() {
        let err = UnavailableDecoder
            .decode(Path::new("/tmp/IMG_9.HEIC"))
            .unwrap_err();
        assert_eq!(err.name(), "IMG_9.HEIC");
        assert!(matches!(err, ConvertError::Unsupported { .. }));
    }

    #[test]
    fn test_pack_rows_drops_stride_padding() {
        // 2x2 RGB with rows padded to 8 bytes.
        let plane = [
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12, 0xEE, 0xEE,
        ];
        let packed = pack_rows(&plane, 8, 6, 2).unwrap();
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_pack_rows_last_row_may_be_unpadded() {
        let plane = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8];
        let packed = pack_rows(&plane, 8, 4, 2).unwrap();
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_pack_rows_rejects_short_plane() {
        let plane = [0u8; 10];
        assert!(pack_rows(&plane, 8, 6, 2).is_none());
        assert!(pack_rows(&plane, 4, 6, 1).is_none());
        assert!(pack_rows(&plane, 0, 0, 1).is_none());
    }

    #[cfg(feature = "libheif")]
    #[test]
    fn test_libheif_rejects_garbage() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.heic");
        std::fs::write(&path, b"definitely not a heif container").unwrap();
        let err = LibHeifDecoder.decode(&path).unwrap_err();
        assert_eq!(err.name(), "broken.heic");
        assert!(matches!(err, ConvertError::Decode { .. }));
    }
}

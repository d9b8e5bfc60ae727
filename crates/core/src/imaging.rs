//! Image conversion and compression.
//!
//! All functions here are blocking; async callers run them on
//! `tokio::task::spawn_blocking`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat, ImageReader};
use tempfile::TempPath;

/// JPEG quality used when converting HEIC uploads.
pub const HEIC_JPEG_QUALITY: u8 = 90;

/// JPEG quality used when shrinking oversized images for email.
pub const COMPRESS_JPEG_QUALITY: u8 = 80;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HEIF decode error: {0}")]
    Heic(String),
}

// ---------------------------------------------------------------------------
// HEIC -> JPEG
// ---------------------------------------------------------------------------

/// Decode the HEIC file at `src`, convert it to RGB and write it to `dest`
/// as a JPEG at [`HEIC_JPEG_QUALITY`].
pub fn convert_heic_to_jpeg(src: &Path, dest: &Path) -> Result<(), ImagingError> {
    let decoded = decode_heic(src)?;
    let rgb = decoded.to_rgb8();

    let mut writer = BufWriter::new(File::create(dest)?);
    JpegEncoder::new_with_quality(&mut writer, HEIC_JPEG_QUALITY).encode_image(&rgb)?;
    writer.flush()?;
    Ok(())
}

/// Decode a HEIC/HEIF file through libheif.
///
/// Files the `image` crate can recognise by content (phones sometimes label
/// JPEGs as `.heic`) are decoded by sniffing when libheif rejects them.
#[cfg(feature = "heic")]
pub fn decode_heic(src: &Path) -> Result<DynamicImage, ImagingError> {
    match decode_with_libheif(src) {
        Ok(img) => Ok(img),
        Err(heif_err) => {
            tracing::debug!(path = %src.display(), error = %heif_err, "libheif decode failed, sniffing format");
            decode_sniffed(src).map_err(|_| heif_err)
        }
    }
}

/// Decode a HEIC-labelled file by sniffing its content.
///
/// Without the `heic` feature only payloads in a format the `image` crate
/// knows are accepted; genuine HEIF data is reported as a decode error.
#[cfg(not(feature = "heic"))]
pub fn decode_heic(src: &Path) -> Result<DynamicImage, ImagingError> {
    decode_sniffed(src)
}

fn decode_sniffed(src: &Path) -> Result<DynamicImage, ImagingError> {
    let reader = ImageReader::open(src)?.with_guessed_format()?;
    if reader.format().is_none() {
        return Err(ImagingError::Heic("unrecognised image data".into()));
    }
    Ok(reader.decode()?)
}

#[cfg(feature = "heic")]
fn decode_with_libheif(src: &Path) -> Result<DynamicImage, ImagingError> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let heif_err = |e: libheif_rs::HeifError| ImagingError::Heic(e.to_string());

    let path = src
        .to_str()
        .ok_or_else(|| ImagingError::Heic("path is not valid UTF-8".into()))?;
    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_file(path).map_err(heif_err)?;
    let handle = ctx.primary_image_handle().map_err(heif_err)?;
    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(heif_err)?;

    let planes = image.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| ImagingError::Heic("decoded image has no interleaved plane".into()))?;

    let (width, height, stride) = (plane.width, plane.height, plane.stride);
    let row_len = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in plane.data.chunks(stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }

    image::RgbImage::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| ImagingError::Heic("pixel buffer size mismatch".into()))
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

/// A re-encoded copy of an image living in a temporary file.
///
/// The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct CompressedImage {
    pub path: TempPath,
    pub size: u64,
}

/// Re-encode `original` in its own format with stronger compression
/// (JPEG quality [`COMPRESS_JPEG_QUALITY`], best PNG compression) into a
/// temporary file under `temp_dir`.
///
/// Returns `Ok(None)` when the result is not strictly smaller than the
/// original; the temporary file is removed in that case.
pub fn compress_image(
    original: &Path,
    temp_dir: &Path,
) -> Result<Option<CompressedImage>, ImagingError> {
    let format = ImageFormat::from_path(original)?;
    let img = image::open(original)?;
    let original_size = std::fs::metadata(original)?.len();

    let suffix = original
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let (file, path) = tempfile::Builder::new()
        .prefix("compressed_")
        .suffix(&suffix)
        .tempfile_in(temp_dir)?
        .into_parts();

    let mut writer = BufWriter::new(file);
    encode_optimized(&img, format, &mut writer)?;
    writer.flush()?;
    drop(writer);

    let size = std::fs::metadata(&path)?.len();
    if size < original_size {
        Ok(Some(CompressedImage { path, size }))
    } else {
        Ok(None)
    }
}

fn encode_optimized(
    img: &DynamicImage,
    format: ImageFormat,
    writer: &mut BufWriter<File>,
) -> Result<(), ImagingError> {
    match format {
        ImageFormat::Jpeg => {
            JpegEncoder::new_with_quality(writer, COMPRESS_JPEG_QUALITY)
                .encode_image(&img.to_rgb8())?;
        }
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
            img.write_with_encoder(encoder)?;
        }
        other => img.write_to(writer, other)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        }))
    }

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn converts_sniffable_heic_to_rgb_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.heic");
        let dest = dir.path().join("photo.jpg");
        std::fs::write(&src, encode(&gradient(16, 12), ImageFormat::Png)).unwrap();

        convert_heic_to_jpeg(&src, &dest).unwrap();

        let reader = ImageReader::open(&dest).unwrap().with_guessed_format().unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
        let decoded = reader.decode().unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[test]
    fn garbage_heic_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.heic");
        std::fs::write(&src, b"definitely not an image").unwrap();

        let result = convert_heic_to_jpeg(&src, &dir.path().join("broken.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn compress_shrinks_high_quality_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("big.jpg");
        let img = gradient(256, 256);
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 100)
            .encode_image(&img.to_rgb8())
            .unwrap();
        std::fs::write(&original, &buf).unwrap();

        let compressed = compress_image(&original, dir.path())
            .unwrap()
            .expect("quality 80 should be smaller than quality 100");
        assert!(compressed.size < buf.len() as u64);

        let temp_path = compressed.path.to_path_buf();
        assert!(temp_path.exists());
        assert!(temp_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("compressed_"));
        drop(compressed);
        assert!(!temp_path.exists());
    }

    #[test]
    fn compress_discards_result_that_is_not_smaller() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("tiny.jpg");
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 10)
            .encode_image(&gradient(64, 64).to_rgb8())
            .unwrap();
        std::fs::write(&original, &buf).unwrap();

        let result = compress_image(&original, dir.path()).unwrap();
        assert!(result.is_none());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "only the original should remain");
    }
}

use crate::error::{Result, StreetViewError};
use crate::types::{ImageFormat, SaveOptions};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Write a resolved view to `path` with the given format settings.
///
/// Parent directories are created as needed.
pub fn save_image(img: &DynamicImage, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let writer = BufWriter::new(File::create(path)?);
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    match options.format {
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(writer, options.jpeg_quality)
            .write_image(rgb_img.as_raw(), width, height, ExtendedColorType::Rgb8),
        ImageFormat::Png => PngEncoder::new(writer)
            .write_image(rgb_img.as_raw(), width, height, ExtendedColorType::Rgb8),
        ImageFormat::WebP => {
            // Lossless only; the image crate has no lossy WebP encoder
            drop(writer);
            img.save_with_format(path, image::ImageFormat::WebP)
        }
    }
    .map_err(StreetViewError::EncodeError)
}

/// Convenience for saving a view with the format implied by the file name.
pub trait ViewSaveExt {
    /// Save using the extension of `path` (JPEG when unrecognized).
    fn save_view(&self, path: impl AsRef<Path>) -> Result<()>;
}

impl ViewSaveExt for DynamicImage {
    fn save_view(&self, path: impl AsRef<Path>) -> Result<()> {
        let options = SaveOptions::for_path(&path);
        save_image(self, path, &options)
    }
}

//! Image codec - the decode/resize/encode collaborator used for thumbnails

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

/// Image operations the thumbnail flow depends on.
///
/// Errors are passed through to the caller uninterpreted.
pub trait ImageCodec: Send + Sync {
    /// Decode the image stored at `path`
    fn decode(&self, path: &Path) -> Result<DynamicImage, anyhow::Error>;

    /// Resize to fit within `width` x `height`
    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, anyhow::Error>;

    /// Encode for storage at `target`; the format follows its extension
    fn encode(&self, image: &DynamicImage, target: &Path) -> Result<Vec<u8>, anyhow::Error>;
}

/// `ImageCodec` backed by the `image` crate
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateCodec {
    filter: FilterType,
    fallback_format: ImageFormat,
}

impl Default for ImageCrateCodec {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            fallback_format: ImageFormat::Png,
        }
    }
}

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Output format for a target path; unknown extensions use the fallback
    pub fn detect_format(&self, target: &Path) -> ImageFormat {
        ImageFormat::from_path(target).unwrap_or(self.fallback_format)
    }
}

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage, anyhow::Error> {
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let (width, height) = img.dimensions();
        tracing::debug!(path = %path.display(), width, height, "Decoded image");
        Ok(img)
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, anyhow::Error> {
        if width == 0 || height == 0 {
            anyhow::bail!("Thumbnail resolution must be non-zero, got {}x{}", width, height);
        }
        Ok(image.resize(width, height, self.filter))
    }

    fn encode(&self, image: &DynamicImage, target: &Path) -> Result<Vec<u8>, anyhow::Error> {
        let format = self.detect_format(target);

        // JPEG has no alpha channel.
        let converted;
        let image = if format == ImageFormat::Jpeg && image.color().has_alpha() {
            converted = DynamicImage::ImageRgb8(image.to_rgb8());
            &converted
        } else {
            image
        };

        let (width, height) = image.dimensions();
        let estimated_size = width as usize * height as usize * 3;
        let mut buffer = Vec::with_capacity(estimated_size);
        let mut cursor = Cursor::new(&mut buffer);
        image.write_to(&mut cursor, format)?;

        Ok(buffer)
    }
}

// imgchain/src/processors/loader.rs
use super::metadata::EmbeddedMetadata;
use crate::core::{CodecError, ImageFormat};
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use std::path::Path;

/// Maps a raster format onto the `image` crate's codec. SVG has no
/// raster codec.
pub fn to_codec_format(format: ImageFormat) -> Result<image::ImageFormat, CodecError> {
    match format {
        ImageFormat::Jpeg => Ok(image::ImageFormat::Jpeg),
        ImageFormat::Png => Ok(image::ImageFormat::Png),
        ImageFormat::Webp => Ok(image::ImageFormat::WebP),
        ImageFormat::Avif => Ok(image::ImageFormat::Avif),
        ImageFormat::Tiff => Ok(image::ImageFormat::Tiff),
        ImageFormat::Gif => Ok(image::ImageFormat::Gif),
        ImageFormat::Bmp => Ok(image::ImageFormat::Bmp),
        ImageFormat::Svg => Err(CodecError::UnsupportedFormat(
            "SVG cannot be rasterized".to_string(),
        )),
    }
}

pub fn from_codec_format(format: image::ImageFormat) -> Option<ImageFormat> {
    match format {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::WebP => Some(ImageFormat::Webp),
        image::ImageFormat::Avif => Some(ImageFormat::Avif),
        image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
        image::ImageFormat::Gif => Some(ImageFormat::Gif),
        image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    /// Decodes `path`, sniffing the format from its contents rather than
    /// its extension (intermediate files carry a `.temp.<stage>` suffix).
    pub fn load(&self, path: &Path) -> Result<(DynamicImage, ImageFormat), CodecError> {
        let (image, format, _) = self.load_with_metadata(path)?;
        Ok((image, format))
    }

    /// Like [`Loader::load`], also returning the ICC profile and raw EXIF
    /// block the decoder found.
    pub fn load_with_metadata(
        &self,
        path: &Path,
    ) -> Result<(DynamicImage, ImageFormat, EmbeddedMetadata), CodecError> {
        log::debug!("Loading image from: {}", path.display());

        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader
            .format()
            .and_then(from_codec_format)
            .ok_or_else(|| {
                CodecError::UnsupportedFormat(format!("cannot decode {}", path.display()))
            })?;

        // The avif feature only pulls in the encoder.
        if format == ImageFormat::Avif {
            return Err(CodecError::UnsupportedFormat(format!(
                "AVIF input cannot be decoded: {}",
                path.display()
            )));
        }

        let mut decoder = reader
            .into_decoder()
            .map_err(|e| CodecError::Processing(format!("Failed to decode image: {}", e)))?;
        let metadata = EmbeddedMetadata {
            icc_profile: decoder.icc_profile().ok().flatten(),
            exif: decoder.exif_metadata().ok().flatten(),
        };
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| CodecError::Processing(format!("Failed to decode image: {}", e)))?;

        if let Some((max_w, max_h)) = self.max_dimensions {
            let (width, height) = image.dimensions();
            if width > max_w || height > max_h {
                return Err(CodecError::Processing(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }

        log::debug!(
            "Loaded image: {}x{} pixels, format: {}, embedded metadata: {}",
            image.width(),
            image.height(),
            format,
            !metadata.is_empty()
        );

        Ok((image, format, metadata))
    }

    /// Reads dimensions and format without decoding pixel data.
    pub fn get_dimensions_and_format(&self, path: &Path) -> Result<(u32, u32, ImageFormat), CodecError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader
            .format()
            .and_then(from_codec_format)
            .ok_or_else(|| {
                CodecError::UnsupportedFormat(format!("cannot decode {}", path.display()))
            })?;
        let (width, height) = reader.into_dimensions()?;

        Ok((width, height, format))
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

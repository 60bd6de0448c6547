// imgchain/src/processors/compressor.rs
use super::loader::to_codec_format;
use super::metadata::EmbeddedMetadata;
use crate::core::{CodecError, ImageFormat, DEFAULT_QUALITY};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;
use std::path::Path;

/// Default encoder effort on the 0..=9 scale.
const DEFAULT_EFFORT: u8 = 4;

pub struct Compressor {
    quality: u8,
    effort: u8,
    optimize_png: bool,
    metadata: EmbeddedMetadata,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            effort: DEFAULT_EFFORT,
            optimize_png: true,
            metadata: EmbeddedMetadata::default(),
        }
    }

    pub fn with_effort(mut self, effort: u8) -> Self {
        self.effort = effort.min(9);
        self
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    /// Metadata to embed in the encoded output, where the format allows it.
    pub fn with_metadata(mut self, metadata: EmbeddedMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Encodes in memory, then writes `path` in one go so a failed encode
    /// never leaves a truncated file behind.
    pub fn save_with_format(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: ImageFormat,
    ) -> Result<u64, CodecError> {
        log::debug!(
            "Saving image to {} with format {}, quality: {}, effort: {}",
            path.display(),
            format,
            self.quality,
            self.effort
        );

        let bytes = self.compress_to_bytes(image, format)?;
        std::fs::write(path, &bytes)?;

        log::info!("Saved image: {} ({} bytes)", path.display(), bytes.len());
        Ok(bytes.len() as u64)
    }

    pub fn compress_to_bytes(&self, image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Cursor::new(Vec::new());

        match format {
            ImageFormat::Jpeg => {
                let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
                self.attach_metadata(&mut encoder, format);
                DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
            }
            ImageFormat::Png => {
                let compression = if self.effort >= 7 {
                    CompressionType::Best
                } else if self.effort <= 2 {
                    CompressionType::Fast
                } else {
                    CompressionType::Default
                };
                let mut encoder = PngEncoder::new_with_quality(&mut buffer, compression, PngFilter::Adaptive);
                self.attach_metadata(&mut encoder, format);
                image.write_with_encoder(encoder)?;
                if self.optimize_png {
                    return self.optimize_png_bytes(&buffer.into_inner());
                }
            }
            ImageFormat::Webp => {
                // The pure-Rust WebP encoder is lossless only; quality does not apply.
                let mut encoder = WebPEncoder::new_lossless(&mut buffer);
                self.attach_metadata(&mut encoder, format);
                DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?;
            }
            ImageFormat::Avif => {
                let speed = 10 - self.effort.min(9);
                let mut encoder = AvifEncoder::new_with_speed_quality(&mut buffer, speed, self.quality);
                self.attach_metadata(&mut encoder, format);
                DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?;
            }
            ImageFormat::Tiff => {
                let mut encoder = TiffEncoder::new(&mut buffer);
                self.attach_metadata(&mut encoder, format);
                DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?;
            }
            ImageFormat::Gif | ImageFormat::Bmp => {
                if !self.metadata.is_empty() {
                    log::warn!("{} output cannot carry embedded metadata, dropping it", format);
                }
                let codec_format = to_codec_format(format)?;
                DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut buffer, codec_format)?;
            }
            ImageFormat::Svg => {
                return Err(CodecError::UnsupportedFormat(
                    "cannot encode SVG output".to_string(),
                ));
            }
        }

        Ok(buffer.into_inner())
    }

    /// Hands the kept metadata to `encoder`. Blocks the format cannot hold
    /// are logged and skipped.
    fn attach_metadata<E: ImageEncoder>(&self, encoder: &mut E, format: ImageFormat) {
        if let Some(icc) = &self.metadata.icc_profile {
            if let Err(e) = encoder.set_icc_profile(icc.clone()) {
                log::warn!("{} output drops the ICC profile: {}", format, e);
            }
        }
        if let Some(exif) = &self.metadata.exif {
            if let Err(e) = encoder.set_exif_metadata(exif.clone()) {
                log::warn!("{} output drops the EXIF block: {}", format, e);
            }
        }
    }

    fn optimize_png_bytes(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let preset = (self.effort / 2).min(6);
        optimize_from_memory(data, &Options::from_preset(preset))
            .map_err(|e| CodecError::Processing(format!("PNG optimization failed: {}", e)))
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageDecoder;

    fn sample() -> DynamicImage {
        let mut img = image::RgbaImage::new(16, 16);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn encodes_every_raster_format() {
        let compressor = Compressor::new(75).with_effort(9);
        for format in [
            ImageFormat::Jpeg,
            ImageFormat::Png,
            ImageFormat::Webp,
            ImageFormat::Tiff,
            ImageFormat::Gif,
            ImageFormat::Bmp,
        ] {
            let bytes = compressor.compress_to_bytes(&sample(), format).unwrap();
            let guessed = image::guess_format(&bytes).unwrap();
            assert_eq!(guessed, to_codec_format(format).unwrap(), "{}", format);
        }
    }

    #[test]
    fn svg_output_is_rejected() {
        let err = Compressor::default()
            .compress_to_bytes(&sample(), ImageFormat::Svg)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat(_)));
    }

    fn embedded_icc(bytes: &[u8]) -> Option<Vec<u8>> {
        image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .unwrap()
            .into_decoder()
            .unwrap()
            .icc_profile()
            .unwrap()
    }

    #[test]
    fn kept_icc_profile_is_written_to_jpeg() {
        let profile = b"imgchain test profile".to_vec();
        let bytes = Compressor::new(80)
            .with_metadata(EmbeddedMetadata {
                icc_profile: Some(profile.clone()),
                exif: None,
            })
            .compress_to_bytes(&sample(), ImageFormat::Jpeg)
            .unwrap();

        assert_eq!(embedded_icc(&bytes), Some(profile));
    }

    #[test]
    fn no_metadata_is_written_by_default() {
        let bytes = Compressor::new(80)
            .compress_to_bytes(&sample(), ImageFormat::Jpeg)
            .unwrap();
        assert_eq!(embedded_icc(&bytes), None);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(Compressor::new(0).quality, 1);
        assert_eq!(Compressor::new(200).quality, 100);
    }
}

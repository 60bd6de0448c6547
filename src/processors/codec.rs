// imgchain/src/processors/codec.rs
//! The pixel-level collaborator behind every stage.
//!
//! [`ImageCodecGateway`] is the seam the sequencer drives; it knows nothing
//! about temporary files or batches. [`RasterCodec`] is the production
//! implementation on top of the `image` and `oxipng` crates.

use super::{Compressor, EmbeddedMetadata, Loader, MetadataProcessor, Resizer};
use crate::core::{
    CodecError, CompressStage, ConvertStage, ImageFormat, MetadataPolicy, ResizeStage,
    DEFAULT_QUALITY,
};
use crate::utils::format_from_path;
use image::GenericImageView;
use std::path::Path;

/// What the codec reports about the file it wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOutput {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: u64,
}

pub trait ImageCodecGateway {
    /// Re-encode `input` into `params.format`. Embedded metadata is carried
    /// along; only compress strips it.
    fn convert(&self, input: &Path, output: &Path, params: &ConvertStage) -> Result<CodecOutput, CodecError>;

    /// Resample `input` to the requested box.
    fn resize(&self, input: &Path, output: &Path, params: &ResizeStage) -> Result<CodecOutput, CodecError>;

    /// Re-encode `input` at the requested quality, keeping or stripping
    /// embedded metadata per `params.metadata`.
    fn compress(&self, input: &Path, output: &Path, params: &CompressStage) -> Result<CodecOutput, CodecError>;
}

/// Picks the format to write: the stage's own choice, else the format the
/// destination's extension names, else the source's format.
pub fn select_output_format(
    explicit: Option<ImageFormat>,
    output: &Path,
    source: ImageFormat,
) -> ImageFormat {
    explicit.or_else(|| format_from_path(output)).unwrap_or(source)
}

#[derive(Default)]
pub struct RasterCodec {
    loader: Loader,
    metadata: MetadataProcessor,
}

impl RasterCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn metadata(&self) -> &MetadataProcessor {
        &self.metadata
    }
}

impl ImageCodecGateway for RasterCodec {
    fn convert(&self, input: &Path, output: &Path, params: &ConvertStage) -> Result<CodecOutput, CodecError> {
        let (image, source, embedded) = self.loader.load_with_metadata(input)?;
        log::debug!("Converting {} from {} to {}", input.display(), source, params.format);

        let mut compressor =
            Compressor::new(params.quality.unwrap_or(DEFAULT_QUALITY)).with_metadata(embedded);
        if let Some(effort) = params.effort {
            compressor = compressor.with_effort(effort);
        }
        let size_bytes = compressor.save_with_format(&image, output, params.format)?;

        Ok(CodecOutput {
            width: image.width(),
            height: image.height(),
            format: params.format,
            size_bytes,
        })
    }

    fn resize(&self, input: &Path, output: &Path, params: &ResizeStage) -> Result<CodecOutput, CodecError> {
        let (image, source, embedded) = self.loader.load_with_metadata(input)?;
        let resized = Resizer::new(params.algorithm).resize(&image, params.width, params.height, params.fit);

        let format = select_output_format(None, output, source);
        // Lossy intermediates are re-encoded near-losslessly; compress sets the final quality.
        let size_bytes = Compressor::new(95)
            .with_png_optimization(false)
            .with_metadata(embedded)
            .save_with_format(&resized, output, format)?;

        let (width, height) = resized.dimensions();
        Ok(CodecOutput {
            width,
            height,
            format,
            size_bytes,
        })
    }

    fn compress(&self, input: &Path, output: &Path, params: &CompressStage) -> Result<CodecOutput, CodecError> {
        let (image, source, embedded) = self.loader.load_with_metadata(input)?;
        let embedded = match params.metadata {
            MetadataPolicy::Keep => embedded,
            MetadataPolicy::Strip => {
                if !embedded.is_empty() {
                    log::debug!("Stripping embedded metadata from {}", input.display());
                }
                EmbeddedMetadata::default()
            }
        };

        let format = select_output_format(params.format, output, source);
        let size_bytes = Compressor::new(params.quality)
            .with_effort(9)
            .with_metadata(embedded)
            .save_with_format(&image, output, format)?;

        Ok(CodecOutput {
            width: image.width(),
            height: image.height(),
            format,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FitMode, ResizeAlgorithm};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn format_selection_order() {
        let out = Path::new("a/out.webp");
        assert_eq!(
            select_output_format(Some(ImageFormat::Png), out, ImageFormat::Jpeg),
            ImageFormat::Png
        );
        assert_eq!(select_output_format(None, out, ImageFormat::Jpeg), ImageFormat::Webp);
        assert_eq!(
            select_output_format(None, Path::new("a/out.webp.temp.resize"), ImageFormat::Jpeg),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn convert_writes_requested_format() {
        let tmp = TempDir::new().unwrap();
        let input = write_png(tmp.path(), "in.png", 8, 8);
        let output = tmp.path().join("out.jpg");

        let result = RasterCodec::new()
            .convert(
                &input,
                &output,
                &ConvertStage {
                    format: ImageFormat::Jpeg,
                    quality: Some(70),
                    effort: None,
                },
            )
            .unwrap();

        assert_eq!(result.format, ImageFormat::Jpeg);
        assert_eq!(result.size_bytes, std::fs::metadata(&output).unwrap().len());
        assert_eq!(image::ImageFormat::from_path(&output).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn resize_keeps_source_format_for_intermediates() {
        let tmp = TempDir::new().unwrap();
        let input = write_png(tmp.path(), "in.png", 40, 20);
        let output = tmp.path().join("out.png.temp.resize");

        let result = RasterCodec::new()
            .resize(
                &input,
                &output,
                &ResizeStage {
                    width: 10,
                    height: 10,
                    fit: FitMode::Inside,
                    algorithm: ResizeAlgorithm::Bilinear,
                },
            )
            .unwrap();

        assert_eq!((result.width, result.height), (10, 5));
        assert_eq!(result.format, ImageFormat::Png);
    }

    fn jpeg_with_profile(dir: &Path, name: &str, profile: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let bytes = Compressor::new(90)
            .with_metadata(EmbeddedMetadata {
                icc_profile: Some(profile.to_vec()),
                exif: None,
            })
            .compress_to_bytes(
                &image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 90]))),
                ImageFormat::Jpeg,
            )
            .unwrap();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn icc_of(path: &Path) -> Option<Vec<u8>> {
        let (_, _, embedded) = Loader::new().load_with_metadata(path).unwrap();
        embedded.icc_profile
    }

    #[test]
    fn compress_keeps_profile_when_asked() {
        let tmp = TempDir::new().unwrap();
        let profile = b"display p3-ish".to_vec();
        let input = jpeg_with_profile(tmp.path(), "in.jpg", &profile);
        let output = tmp.path().join("out.jpg");

        RasterCodec::new()
            .compress(
                &input,
                &output,
                &CompressStage {
                    quality: 60,
                    format: None,
                    metadata: MetadataPolicy::Keep,
                },
            )
            .unwrap();

        assert_eq!(icc_of(&output), Some(profile));
    }

    #[test]
    fn compress_strips_profile_by_default() {
        let tmp = TempDir::new().unwrap();
        let input = jpeg_with_profile(tmp.path(), "in.jpg", b"some profile");
        let output = tmp.path().join("out.jpg");

        RasterCodec::new()
            .compress(&input, &output, &CompressStage::default())
            .unwrap();

        assert_eq!(icc_of(&output), None);
    }

    #[test]
    fn resize_carries_profile_into_intermediates() {
        let tmp = TempDir::new().unwrap();
        let profile = b"wide gamut".to_vec();
        let input = jpeg_with_profile(tmp.path(), "in.jpg", &profile);
        let output = tmp.path().join("out.jpg.temp.resize");

        RasterCodec::new()
            .resize(
                &input,
                &output,
                &ResizeStage {
                    width: 4,
                    height: 4,
                    fit: FitMode::Fill,
                    algorithm: ResizeAlgorithm::Nearest,
                },
            )
            .unwrap();

        assert_eq!(icc_of(&output), Some(profile));
    }

    #[test]
    fn avif_input_fails_without_writing() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.avif");
        let bytes = Compressor::new(60)
            .compress_to_bytes(&image::DynamicImage::new_rgb8(8, 8), ImageFormat::Avif)
            .unwrap();
        std::fs::write(&input, bytes).unwrap();
        let output = tmp.path().join("out.webp");

        let err = RasterCodec::new()
            .convert(
                &input,
                &output,
                &ConvertStage {
                    format: ImageFormat::Webp,
                    quality: None,
                    effort: None,
                },
            )
            .unwrap_err();

        assert!(matches!(err, CodecError::UnsupportedFormat(_)));
        assert!(!output.exists());
    }

    #[test]
    fn undecodable_input_is_a_codec_error() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("broken.jpg");
        std::fs::write(&input, b"definitely not a jpeg").unwrap();

        let result = RasterCodec::new().compress(&input, &tmp.path().join("out.jpg"), &CompressStage::default());
        assert!(result.is_err());
        assert!(!tmp.path().join("out.jpg").exists());
    }
}

// imgchain/src/core/mod.rs
pub mod sequencer;
pub mod validation;

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub use validation::ValidationError;

/// Largest input file the pipeline accepts (100 MiB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Largest width or height a resize stage may ask for.
pub const MAX_DIMENSION: u32 = 10_000;

pub const DEFAULT_QUALITY: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
    Avif,
    Tiff,
    Gif,
    Svg,
    Bmp,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            "tiff" => Some(Self::Tiff),
            "gif" => Some(Self::Gif),
            "svg" => Some(Self::Svg),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Extension written for files produced in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
            Self::Svg => "svg",
            Self::Bmp => "bmp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WebP",
            Self::Avif => "AVIF",
            Self::Tiff => "TIFF",
            Self::Gif => "GIF",
            Self::Svg => "SVG",
            Self::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

impl FromStr for ImageFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| ValidationError::UnsupportedFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    #[default]
    Lanczos3,
}

/// How target dimensions are reconciled with the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the box exactly, cropping the overflow.
    #[default]
    Cover,
    /// Fit inside the box and pad the rest with transparency.
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio.
    Fill,
    /// Largest size that fits inside the box.
    Inside,
    /// Smallest size that covers the box.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPolicy {
    #[default]
    Strip,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConvertStage {
    pub format: ImageFormat,
    #[serde(default)]
    pub quality: Option<u8>,
    /// Encoder effort, 0 (fastest) to 9 (smallest output).
    #[serde(default)]
    pub effort: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResizeStage {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub fit: FitMode,
    #[serde(default)]
    pub algorithm: ResizeAlgorithm,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompressStage {
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub format: Option<ImageFormat>,
    #[serde(default)]
    pub metadata: MetadataPolicy,
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

impl Default for CompressStage {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            format: None,
            metadata: MetadataPolicy::Strip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Convert,
    Resize,
    Compress,
}

impl StageKind {
    /// Tag used in temporary file names (`<output>.temp.<tag>`).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Convert => "convert",
            Self::Resize => "resize",
            Self::Compress => "compress",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A borrowed view of one stage, in application order.
#[derive(Debug, Clone, Copy)]
pub enum Stage<'a> {
    Convert(&'a ConvertStage),
    Resize(&'a ResizeStage),
    Compress(&'a CompressStage),
}

impl Stage<'_> {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Convert(_) => StageKind::Convert,
            Stage::Resize(_) => StageKind::Resize,
            Stage::Compress(_) => StageKind::Compress,
        }
    }
}

/// The set of operations to apply to one image.
///
/// Stages always run convert → resize → compress; an empty spec copies
/// the input verbatim.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OperationSpec {
    #[serde(default)]
    pub convert: Option<ConvertStage>,
    #[serde(default)]
    pub resize: Option<ResizeStage>,
    #[serde(default)]
    pub compress: Option<CompressStage>,
}

impl OperationSpec {
    pub fn convert(format: ImageFormat) -> Self {
        Self {
            convert: Some(ConvertStage {
                format,
                quality: None,
                effort: None,
            }),
            ..Default::default()
        }
    }

    pub fn resize(width: u32, height: u32, fit: FitMode) -> Self {
        Self {
            resize: Some(ResizeStage {
                width,
                height,
                fit,
                algorithm: ResizeAlgorithm::default(),
            }),
            ..Default::default()
        }
    }

    pub fn compress(quality: u8) -> Self {
        Self {
            compress: Some(CompressStage {
                quality,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn stages(&self) -> Vec<Stage<'_>> {
        let mut stages = Vec::with_capacity(3);
        if let Some(convert) = &self.convert {
            stages.push(Stage::Convert(convert));
        }
        if let Some(resize) = &self.resize {
            stages.push(Stage::Resize(resize));
        }
        if let Some(compress) = &self.compress {
            stages.push(Stage::Compress(compress));
        }
        stages
    }

    pub fn is_empty(&self) -> bool {
        self.convert.is_none() && self.resize.is_none() && self.compress.is_none()
    }

    /// Format the final output is written in, when a stage names one.
    /// A compress format overrides a convert format.
    pub fn target_format(&self) -> Option<ImageFormat> {
        self.compress
            .as_ref()
            .and_then(|c| c.format)
            .or_else(|| self.convert.as_ref().map(|c| c.format))
    }

    /// Checks every numeric parameter the stages carry.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if let Some(convert) = &self.convert {
            if let Some(quality) = convert.quality {
                validation::validate_quality(quality.into())?;
            }
            if let Some(effort) = convert.effort {
                if effort > 9 {
                    return Err(ValidationError::InvalidParameter(format!(
                        "Effort must be between 0 and 9, got {}",
                        effort
                    )));
                }
            }
        }
        if let Some(resize) = &self.resize {
            validation::validate_dimensions(resize.width.into(), resize.height.into())?;
        }
        if let Some(compress) = &self.compress {
            validation::validate_quality(compress.quality.into())?;
        }
        Ok(())
    }
}

/// What the codec reports about a file it wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub stage: StageKind,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub success: bool,
    pub original_size: u64,
    pub final_size: u64,
    pub reduction_percent: f64,
    pub stages: Vec<StageResult>,
}

impl OperationOutcome {
    pub fn new(original_size: u64, final_size: u64, stages: Vec<StageResult>) -> Self {
        Self {
            success: true,
            original_size,
            final_size,
            reduction_percent: crate::utils::reduction_percent(original_size, final_size),
            stages,
        }
    }
}

/// An image found while enumerating a batch directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor {
    pub path: PathBuf,
    pub display_name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub result: std::result::Result<OperationOutcome, String>,
}

impl BatchItem {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub succeeded: usize,
    pub failed: usize,
    pub total_original_size: u64,
    pub total_final_size: u64,
}

impl BatchReport {
    pub fn push(&mut self, item: BatchItem) {
        match &item.result {
            Ok(outcome) => {
                self.succeeded += 1;
                self.total_original_size += outcome.original_size;
                self.total_final_size += outcome.final_size;
            }
            Err(_) => self.failed += 1,
        }
        self.items.push(item);
    }

    pub fn extend(&mut self, other: BatchReport) {
        for item in other.items {
            self.push(item);
        }
    }

    pub fn reduction_percent(&self) -> f64 {
        crate::utils::reduction_percent(self.total_original_size, self.total_final_size)
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

#[derive(Error, Debug)]
pub enum ImageToolError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Path resolution error: {0}")]
    PathResolution(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("No valid images found in {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ImageToolError>;

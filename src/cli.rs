// imgchain/src/cli.rs
use crate::core::{
    CompressStage, ConvertStage, FitMode, ImageFormat, MetadataPolicy, OperationSpec,
    ResizeAlgorithm, ResizeStage, DEFAULT_QUALITY,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgchain")]
#[command(version, about = "Convert, resize and compress images, one file or a whole directory")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert images to another format
    Convert {
        /// Input image or directory
        input: PathBuf,
        /// Output file or directory (defaults next to the input)
        output: Option<PathBuf>,
        #[arg(short, long, value_enum)]
        format: Format,
        #[arg(short, long)]
        quality: Option<u8>,
        /// Encoder effort, 0 (fast) to 9 (small)
        #[arg(long)]
        effort: Option<u8>,
        /// Process subdirectories too
        #[arg(short, long)]
        recursive: bool,
    },
    /// Resize images to a target box
    Resize {
        input: PathBuf,
        output: Option<PathBuf>,
        #[arg(short = 'W', long)]
        width: u32,
        #[arg(short = 'H', long)]
        height: u32,
        #[arg(long, value_enum, default_value_t = Fit::Cover)]
        fit: Fit,
        #[arg(short, long, value_enum, default_value_t = Algorithm::Lanczos3)]
        algorithm: Algorithm,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Re-encode images at a given quality
    Compress {
        input: PathBuf,
        output: Option<PathBuf>,
        #[arg(short, long, default_value_t = DEFAULT_QUALITY)]
        quality: u8,
        /// Re-encode into this format instead of the input's
        #[arg(short, long, value_enum)]
        format: Option<Format>,
        /// Keep the ICC profile and EXIF block in the output
        #[arg(long)]
        keep_metadata: bool,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Convert, resize and compress in one pass
    Optimize {
        input: PathBuf,
        output: Option<PathBuf>,
        #[arg(short, long, value_enum)]
        format: Option<Format>,
        #[arg(short = 'W', long, requires = "height")]
        width: Option<u32>,
        #[arg(short = 'H', long, requires = "width")]
        height: Option<u32>,
        #[arg(long, value_enum, default_value_t = Fit::Inside)]
        fit: Fit,
        #[arg(short, long, default_value_t = DEFAULT_QUALITY)]
        quality: u8,
        #[arg(long)]
        keep_metadata: bool,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Run the entries of a JSON batch config
    Batch {
        /// Path to the config file
        config: PathBuf,
    },
    /// Show image information
    Info {
        input: PathBuf,
    },
}

/// A file or directory command, reduced to what the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub recursive: bool,
    pub spec: OperationSpec,
}

impl Commands {
    /// `None` for commands that do not run the pipeline on a path.
    pub fn into_operation(self) -> Option<Operation> {
        let (input, output, recursive, spec) = match self {
            Commands::Convert {
                input,
                output,
                format,
                quality,
                effort,
                recursive,
            } => {
                let spec = OperationSpec {
                    convert: Some(ConvertStage {
                        format: format.into(),
                        quality,
                        effort,
                    }),
                    ..Default::default()
                };
                (input, output, recursive, spec)
            }
            Commands::Resize {
                input,
                output,
                width,
                height,
                fit,
                algorithm,
                recursive,
            } => {
                let spec = OperationSpec {
                    resize: Some(ResizeStage {
                        width,
                        height,
                        fit: fit.into(),
                        algorithm: algorithm.into(),
                    }),
                    ..Default::default()
                };
                (input, output, recursive, spec)
            }
            Commands::Compress {
                input,
                output,
                quality,
                format,
                keep_metadata,
                recursive,
            } => {
                let spec = OperationSpec {
                    compress: Some(CompressStage {
                        quality,
                        format: format.map(Into::into),
                        metadata: metadata_policy(keep_metadata),
                    }),
                    ..Default::default()
                };
                (input, output, recursive, spec)
            }
            Commands::Optimize {
                input,
                output,
                format,
                width,
                height,
                fit,
                quality,
                keep_metadata,
                recursive,
            } => {
                let spec = OperationSpec {
                    convert: format.map(|format| ConvertStage {
                        format: format.into(),
                        quality: Some(quality),
                        effort: None,
                    }),
                    resize: width.zip(height).map(|(width, height)| ResizeStage {
                        width,
                        height,
                        fit: fit.into(),
                        algorithm: ResizeAlgorithm::default(),
                    }),
                    compress: Some(CompressStage {
                        quality,
                        format: None,
                        metadata: metadata_policy(keep_metadata),
                    }),
                };
                (input, output, recursive, spec)
            }
            Commands::Batch { .. } | Commands::Info { .. } => return None,
        };

        Some(Operation {
            input,
            output,
            recursive,
            spec,
        })
    }
}

fn metadata_policy(keep: bool) -> MetadataPolicy {
    if keep {
        MetadataPolicy::Keep
    } else {
        MetadataPolicy::Strip
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    #[value(alias = "jpeg")]
    Jpg,
    Png,
    Webp,
    Avif,
    Tiff,
    Gif,
    Bmp,
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Jpg => ImageFormat::Jpeg,
            Format::Png => ImageFormat::Png,
            Format::Webp => ImageFormat::Webp,
            Format::Avif => ImageFormat::Avif,
            Format::Tiff => ImageFormat::Tiff,
            Format::Gif => ImageFormat::Gif,
            Format::Bmp => ImageFormat::Bmp,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fit {
    Cover,
    Contain,
    Fill,
    Inside,
    Outside,
}

impl From<Fit> for FitMode {
    fn from(fit: Fit) -> Self {
        match fit {
            Fit::Cover => FitMode::Cover,
            Fit::Contain => FitMode::Contain,
            Fit::Fill => FitMode::Fill,
            Fit::Inside => FitMode::Inside,
            Fit::Outside => FitMode::Outside,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

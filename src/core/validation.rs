// imgchain/src/core/validation.rs
//! Precondition checks run before any stage touches the filesystem.
//!
//! Every check is a pure function returning `Ok(())` or a
//! [`ValidationError`] whose `Display` is the human-readable reason.

use super::{ImageFormat, MAX_DIMENSION, MAX_FILE_SIZE};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("File is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("File too large: {} ({} bytes, max {} bytes)", .path.display(), .size, .max)]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(i64),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub fn validate_file(path: &Path) -> Result<(), ValidationError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return Err(ValidationError::NotFound(path.to_path_buf())),
    };

    if !metadata.is_file() {
        return Err(ValidationError::NotAFile(path.to_path_buf()));
    }

    let size = metadata.len();
    if size == 0 {
        return Err(ValidationError::EmptyFile(path.to_path_buf()));
    }

    if size > MAX_FILE_SIZE {
        return Err(ValidationError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max: MAX_FILE_SIZE,
        });
    }

    validate_format(path)
}

/// Only the extension is checked; contents are left to the codec.
pub fn validate_format(path: &Path) -> Result<(), ValidationError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ImageFormat::from_extension(ext).is_some() => Ok(()),
        Some(ext) => Err(ValidationError::UnsupportedFormat(format!(
            ".{} ({})",
            ext,
            path.display()
        ))),
        None => Err(ValidationError::UnsupportedFormat(format!(
            "no extension ({})",
            path.display()
        ))),
    }
}

pub fn validate_dimensions(width: i64, height: i64) -> Result<(), ValidationError> {
    let max = i64::from(MAX_DIMENSION);

    if width <= 0 || height <= 0 {
        return Err(ValidationError::InvalidDimensions(format!(
            "width and height must be positive, got {}x{}",
            width, height
        )));
    }

    if width > max || height > max {
        return Err(ValidationError::InvalidDimensions(format!(
            "{}x{} exceeds the maximum of {} pixels per side",
            width, height, max
        )));
    }

    Ok(())
}

pub fn validate_quality(quality: i64) -> Result<(), ValidationError> {
    if (1..=100).contains(&quality) {
        Ok(())
    } else {
        Err(ValidationError::InvalidQuality(quality))
    }
}

// imgchain/src/utils/mod.rs
pub mod fs;
pub mod paths;

use crate::core::ImageFormat;
use std::path::Path;

pub use fs::FileManager;
pub use paths::{classify_output, operation_suffix, resolve_output_path, PathResolutionCase};

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as i32).min(UNITS.len() as i32 - 1);
    let size = bytes_f64 / base.powi(exponent);

    format!("{:.2} {}", size, UNITS[exponent as usize])
}

/// Relative size decrease from `original` to `final_size`, rounded to one
/// decimal. Zero when the original is empty; negative when the file grew.
pub fn reduction_percent(original: u64, final_size: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }

    let percent = (original as f64 - final_size as f64) / original as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}

/// Format named by the path's extension, if it names a supported one.
pub fn format_from_path(path: &Path) -> Option<ImageFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
}

pub fn is_supported_format(path: &Path) -> bool {
    format_from_path(path).is_some()
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

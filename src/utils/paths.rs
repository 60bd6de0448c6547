// imgchain/src/utils/paths.rs
//! Output path resolution.
//!
//! Whether the input is a directory is read from the filesystem. Whether
//! the output is one is read from the filesystem when it exists; otherwise
//! an image extension (`out.webp`) means a file and anything else
//! (`out`, `out.d`) means a directory to create.

use super::{is_supported_format, FileManager};
use crate::core::{ImageToolError, OperationSpec, Result, Stage};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathResolutionCase {
    DirToDir,
    DirToFile,
    FileToDir,
    FileToFile,
}

pub fn output_is_dir(output: &Path) -> bool {
    if output.exists() {
        output.is_dir()
    } else {
        !is_supported_format(output)
    }
}

pub fn classify_output(input: &Path, output: &Path) -> PathResolutionCase {
    match (input.is_dir(), output_is_dir(output)) {
        (true, true) => PathResolutionCase::DirToDir,
        (true, false) => PathResolutionCase::DirToFile,
        (false, true) => PathResolutionCase::FileToDir,
        (false, false) => PathResolutionCase::FileToFile,
    }
}

/// Filename suffix for the operation a spec performs. Specs with more
/// than one stage, or none, are `_processed`.
pub fn operation_suffix(spec: &OperationSpec) -> String {
    match spec.stages().as_slice() {
        [Stage::Convert(_)] => "_converted".to_string(),
        [Stage::Resize(resize)] => format!("_{}x{}", resize.width, resize.height),
        [Stage::Compress(_)] => "_compressed".to_string(),
        _ => "_processed".to_string(),
    }
}

/// `<basename><suffix>.<ext>`, where `ext` is the operation's target format or
/// else the input's own extension.
pub fn derived_file_name(input: &Path, spec: &OperationSpec) -> String {
    let (base, original_ext) = if input.is_dir() {
        (input.file_name(), None)
    } else {
        (input.file_stem(), input.extension())
    };

    let base = base
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let extension = match spec.target_format() {
        Some(format) => Some(format.extension().to_string()),
        None => original_ext.map(|ext| ext.to_string_lossy().into_owned()),
    };

    match extension {
        Some(ext) => format!("{}{}.{}", base, operation_suffix(spec), ext),
        None => format!("{}{}", base, operation_suffix(spec)),
    }
}

/// Resolves the concrete file an operation on `input` writes to.
///
/// May create `output` (and its ancestors) when it names a directory.
pub fn resolve_output_path(
    input: &Path,
    output: &Path,
    spec: &OperationSpec,
    files: &FileManager,
) -> Result<PathBuf> {
    let case = classify_output(input, output);
    log::debug!(
        "Resolving {} -> {} as {:?}",
        input.display(),
        output.display(),
        case
    );

    match case {
        PathResolutionCase::DirToDir | PathResolutionCase::FileToDir => {
            files.ensure_dir(output)?;
            Ok(output.join(derived_file_name(input, spec)))
        }
        PathResolutionCase::DirToFile => Err(ImageToolError::PathResolution(format!(
            "directory input requires directory output ({} -> {})",
            input.display(),
            output.display()
        ))),
        PathResolutionCase::FileToFile => Ok(output.to_path_buf()),
    }
}

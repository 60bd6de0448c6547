//! Shared fixtures for unit tests.

use crate::core::{CodecError, CompressStage, ConvertStage, ImageFormat, ResizeStage, StageKind};
use crate::processors::{CodecOutput, ImageCodecGateway};
use crate::utils::format_from_path;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub stage: StageKind,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Codec that copies bytes instead of decoding, records every call and
/// can be told to fail on one stage.
#[derive(Default)]
pub struct MockCodec {
    calls: RefCell<Vec<RecordedCall>>,
    fail_on: Option<StageKind>,
    partial_writes: bool,
    shrink_to: Option<usize>,
}

impl MockCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(stage: StageKind) -> Self {
        Self {
            fail_on: Some(stage),
            ..Self::default()
        }
    }

    /// Failing stages leave a truncated file at their target.
    pub fn with_partial_writes(mut self) -> Self {
        self.partial_writes = true;
        self
    }

    pub fn shrinking_to(mut self, bytes: usize) -> Self {
        self.shrink_to = Some(bytes);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    fn run(
        &self,
        stage: StageKind,
        input: &Path,
        output: &Path,
        format: Option<ImageFormat>,
    ) -> Result<CodecOutput, CodecError> {
        self.calls.borrow_mut().push(RecordedCall {
            stage,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });

        let mut bytes = std::fs::read(input)?;
        if self.fail_on == Some(stage) {
            if self.partial_writes {
                std::fs::write(output, &bytes[..bytes.len() / 2])?;
            }
            return Err(CodecError::Processing(format!("mock {} failure", stage)));
        }

        if let Some(limit) = self.shrink_to {
            bytes.truncate(limit);
        }
        std::fs::write(output, &bytes)?;

        Ok(CodecOutput {
            width: 1,
            height: 1,
            format: format
                .or_else(|| format_from_path(output))
                .unwrap_or(ImageFormat::Png),
            size_bytes: bytes.len() as u64,
        })
    }
}

impl ImageCodecGateway for MockCodec {
    fn convert(&self, input: &Path, output: &Path, params: &ConvertStage) -> Result<CodecOutput, CodecError> {
        self.run(StageKind::Convert, input, output, Some(params.format))
    }

    fn resize(&self, input: &Path, output: &Path, _params: &ResizeStage) -> Result<CodecOutput, CodecError> {
        self.run(StageKind::Resize, input, output, None)
    }

    fn compress(&self, input: &Path, output: &Path, params: &CompressStage) -> Result<CodecOutput, CodecError> {
        self.run(StageKind::Compress, input, output, params.format)
    }
}

/// Writes `len` non-zero bytes to `dir/name`.
pub fn write_bytes(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0xAB; len]).unwrap();
    path
}

/// Files next to `output` whose names start with `<output name>.temp.`.
pub fn temp_leftovers(output: &Path) -> Vec<PathBuf> {
    let prefix = format!(
        "{}.temp.",
        output.file_name().unwrap().to_string_lossy()
    );
    let parent = output.parent().unwrap();
    if !parent.exists() {
        return Vec::new();
    }
    std::fs::read_dir(parent)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect()
}

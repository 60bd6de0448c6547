// imgchain/src/core/sequencer.rs
use super::validation;
use super::{OperationOutcome, OperationSpec, Result, Stage, StageKind, StageResult};
use crate::processors::{CodecOutput, ImageCodecGateway};
use crate::utils::FileManager;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Intermediate file written by a non-final stage: `<output>.temp.<stage>`.
pub fn temp_path(output: &Path, stage: StageKind) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".temp.");
    name.push(stage.tag());
    PathBuf::from(name)
}

/// Temporary files owned by one sequencer run, removed when dropped.
struct TempFiles<'a> {
    files: &'a FileManager,
    paths: Vec<PathBuf>,
}

impl<'a> TempFiles<'a> {
    fn new(files: &'a FileManager) -> Self {
        Self {
            files,
            paths: Vec::new(),
        }
    }

    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }
}

impl Drop for TempFiles<'_> {
    fn drop(&mut self) {
        for path in &self.paths {
            self.files.remove_quietly(path);
        }
    }
}

/// Runs the stages of an [`OperationSpec`] against one image.
pub struct OperationSequencer<'a, G: ImageCodecGateway + ?Sized> {
    codec: &'a G,
    files: &'a FileManager,
}

impl<'a, G: ImageCodecGateway + ?Sized> OperationSequencer<'a, G> {
    pub fn new(codec: &'a G, files: &'a FileManager) -> Self {
        Self { codec, files }
    }

    /// Applies `spec` to `input`, leaving the result at `output`.
    ///
    /// Non-final stages write to `<output>.temp.<stage>`; the final stage
    /// writes `output` directly. An empty spec copies the input byte for
    /// byte. Temporaries are gone when this returns, whatever the outcome.
    pub fn run(&self, input: &Path, output: &Path, spec: &OperationSpec) -> Result<OperationOutcome> {
        validation::validate_file(input)?;
        spec.validate()?;

        let original_size = self.files.file_size(input)?;
        self.files.ensure_parent_dir(output)?;

        let stages = spec.stages();
        if stages.is_empty() {
            log::debug!("No stages requested, copying {}", input.display());
            self.files.copy(input, output)?;
            let final_size = self.files.file_size(output)?;
            return Ok(OperationOutcome::new(original_size, final_size, Vec::new()));
        }

        let mut temps = TempFiles::new(self.files);
        let mut current = input.to_path_buf();
        let mut results = Vec::with_capacity(stages.len());

        for (index, stage) in stages.iter().enumerate() {
            let kind = stage.kind();
            let target = if index + 1 == stages.len() {
                output.to_path_buf()
            } else {
                let temp = temp_path(output, kind);
                temps.track(temp.clone());
                temp
            };

            log::debug!(
                "Stage {}: {} -> {}",
                kind,
                current.display(),
                target.display()
            );

            let written = self.apply(stage, &current, &target).map_err(|e| {
                log::debug!("Stage {} failed for {}: {}", kind, input.display(), e);
                e
            })?;
            results.push(stage_result(kind, &target, written));
            current = target;
        }

        let final_size = self.files.file_size(output)?;
        drop(temps);

        let outcome = OperationOutcome::new(original_size, final_size, results);
        log::info!(
            "Processed {} -> {} ({:.1}% reduction)",
            input.display(),
            output.display(),
            outcome.reduction_percent
        );
        Ok(outcome)
    }

    fn apply(&self, stage: &Stage<'_>, input: &Path, output: &Path) -> Result<CodecOutput> {
        let written = match stage {
            Stage::Convert(params) => self.codec.convert(input, output, params)?,
            Stage::Resize(params) => self.codec.resize(input, output, params)?,
            Stage::Compress(params) => self.codec.compress(input, output, params)?,
        };
        Ok(written)
    }
}

fn stage_result(stage: StageKind, output: &Path, written: CodecOutput) -> StageResult {
    StageResult {
        stage,
        output: output.to_path_buf(),
        width: written.width,
        height: written.height,
        format: written.format,
        size_bytes: written.size_bytes,
    }
}

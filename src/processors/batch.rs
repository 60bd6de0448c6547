// imgchain/src/processors/batch.rs
use super::ImageCodecGateway;
use crate::config::BatchConfig;
use crate::core::sequencer::OperationSequencer;
use crate::core::validation::validate_file;
use crate::core::{
    BatchItem, BatchReport, ImageDescriptor, ImageToolError, OperationSpec, Result,
};
use crate::utils::{
    classify_output, display_name, is_supported_format, resolve_output_path, FileManager,
    PathResolutionCase,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Descend into subdirectories, mirroring them under the output root.
    pub recursive: bool,
    pub show_progress: bool,
}

/// Drives the sequencer over many images, one at a time, collecting a
/// [`BatchReport`]. A failing image is recorded and the batch moves on.
pub struct BatchCoordinator<'a, G: ImageCodecGateway + ?Sized> {
    codec: &'a G,
    files: &'a FileManager,
    options: BatchOptions,
}

impl<'a, G: ImageCodecGateway + ?Sized> BatchCoordinator<'a, G> {
    pub fn new(codec: &'a G, files: &'a FileManager) -> Self {
        Self {
            codec,
            files,
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        spec: &OperationSpec,
    ) -> Result<BatchReport> {
        self.validate_paths(input_dir, output_dir)?;

        let images = self.collect_images(input_dir, output_dir);
        if images.is_empty() {
            return Err(ImageToolError::EmptyInput(input_dir.to_path_buf()));
        }

        log::info!(
            "Processing {} images from {}",
            images.len(),
            input_dir.display()
        );

        self.files.ensure_dir(output_dir)?;

        let sequencer = OperationSequencer::new(self.codec, self.files);
        let pb = self.create_progress_bar(images.len());
        let mut report = BatchReport::default();

        for image in &images {
            pb.set_message(image.display_name.clone());

            let target_dir = self.mirrored_dir(input_dir, output_dir, &image.path);
            let item = self.process_item(&sequencer, &image.path, &target_dir, spec);
            report.push(item);

            pb.inc(1);
        }

        pb.finish_with_message(format!(
            "Processed {} images ({:.1}% size reduction)",
            report.succeeded,
            report.reduction_percent()
        ));
        log::info!(
            "Batch complete: {} succeeded, {} failed",
            report.succeeded,
            report.failed
        );

        Ok(report)
    }

    /// Runs every entry of a parsed batch config in order. Nothing in here
    /// aborts the batch: each failure becomes a failed item.
    pub fn run_config(&self, config: &BatchConfig) -> BatchReport {
        let sequencer = OperationSequencer::new(self.codec, self.files);
        let mut report = BatchReport::default();

        for entry in &config.images {
            if entry.input.is_dir() {
                match self.run_directory(&entry.input, &entry.output, &entry.operations) {
                    Ok(nested) => report.extend(nested),
                    Err(e) => report.push(failed_item(&entry.input, None, &e)),
                }
            } else {
                report.push(self.process_item(&sequencer, &entry.input, &entry.output, &entry.operations));
            }
        }

        log::info!(
            "Config batch complete: {} succeeded, {} failed",
            report.succeeded,
            report.failed
        );
        report
    }

    fn process_item(
        &self,
        sequencer: &OperationSequencer<'_, G>,
        input: &Path,
        output: &Path,
        spec: &OperationSpec,
    ) -> BatchItem {
        // Resolving may create directories, so reject bad inputs first.
        if let Err(e) = validate_file(input)
            .and_then(|()| spec.validate())
            .map_err(ImageToolError::from)
        {
            return failed_item(input, None, &e);
        }

        let output_path = match resolve_output_path(input, output, spec, self.files) {
            Ok(path) => path,
            Err(e) => return failed_item(input, None, &e),
        };

        match sequencer.run(input, &output_path, spec) {
            Ok(outcome) => BatchItem {
                input: input.to_path_buf(),
                output: Some(output_path),
                result: Ok(outcome),
            },
            Err(e) => failed_item(input, Some(output_path), &e),
        }
    }

    /// Output directory for `image`: the root itself, or with recursion
    /// the root joined with the image's parent relative to `input_dir`.
    fn mirrored_dir(&self, input_dir: &Path, output_dir: &Path, image: &Path) -> PathBuf {
        if !self.options.recursive {
            return output_dir.to_path_buf();
        }

        let relative = image
            .parent()
            .and_then(|parent| parent.strip_prefix(input_dir).ok())
            .filter(|rel| !rel.as_os_str().is_empty());

        match relative {
            Some(rel) => {
                let dir = output_dir.join(rel);
                // Created up front so a sub-directory named like an image
                // is not mistaken for an output file.
                if let Err(e) = self.files.ensure_dir(&dir) {
                    log::warn!("Cannot create {}: {}", dir.display(), e);
                }
                dir
            }
            None => output_dir.to_path_buf(),
        }
    }

    /// Supported images under `input_dir`, sorted by file name. Unreadable
    /// entries are logged and skipped; anything under `output_dir` is
    /// ignored so re-runs do not pick up their own results.
    pub fn collect_images(&self, input_dir: &Path, output_dir: &Path) -> Vec<ImageDescriptor> {
        let walker = if self.options.recursive {
            WalkDir::new(input_dir).min_depth(1)
        } else {
            WalkDir::new(input_dir).min_depth(1).max_depth(1)
        };

        let mut images = Vec::new();
        for entry in walker.sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", input_dir.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file()
                || !is_supported_format(entry.path())
                || entry.path().starts_with(output_dir)
            {
                continue;
            }

            let size_bytes = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            images.push(ImageDescriptor {
                display_name: display_name(entry.path()),
                path: entry.into_path(),
                size_bytes,
            });
        }

        images
    }

    pub fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if !input_dir.exists() {
            return Err(ImageToolError::PathResolution(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        if !input_dir.is_dir() {
            return Err(ImageToolError::PathResolution(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        if classify_output(input_dir, output_dir) == PathResolutionCase::DirToFile {
            return Err(ImageToolError::PathResolution(format!(
                "directory input requires directory output ({} -> {})",
                input_dir.display(),
                output_dir.display()
            )));
        }

        if input_dir == output_dir || self.files.same_file(input_dir, output_dir) {
            return Err(ImageToolError::PathResolution(
                "Input and output directories cannot be the same".to_string(),
            ));
        }

        Ok(())
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}

fn failed_item(input: &Path, output: Option<PathBuf>, error: &ImageToolError) -> BatchItem {
    log::warn!("Failed to process {}: {}", input.display(), error);
    BatchItem {
        input: input.to_path_buf(),
        output,
        result: Err(error.to_string()),
    }
}

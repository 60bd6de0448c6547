use anyhow::{Context, Result};
use clap::Parser;
use imgchain::cli::{Cli, Commands, Operation};
use imgchain::{
    format_file_size, load_batch_config, resolve_output_path, validate_file, BatchCoordinator,
    BatchOptions, BatchReport, FileManager, OperationOutcome, OperationSequencer, RasterCodec,
};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Batch { config } => process_config(&config),
        Commands::Info { input } => {
            process_info(&input)?;
            Ok(ExitCode::SUCCESS)
        }
        command => match command.into_operation() {
            Some(operation) => process_operation(operation),
            None => Ok(ExitCode::SUCCESS),
        },
    }
}

fn process_operation(operation: Operation) -> Result<ExitCode> {
    let Operation {
        input,
        output,
        recursive,
        spec,
    } = operation;

    spec.validate()?;

    let codec = RasterCodec::new();
    let files = FileManager::new();

    if input.is_dir() {
        let output = output.unwrap_or_else(|| default_directory_output(&input));
        let report = BatchCoordinator::new(&codec, &files)
            .with_options(BatchOptions {
                recursive,
                show_progress: true,
            })
            .run_directory(&input, &output, &spec)
            .with_context(|| format!("Failed to process directory {}", input.display()))?;

        print_report(&report);
        return Ok(batch_exit_code(&report));
    }

    validate_file(&input)?;
    let output = output.unwrap_or_else(|| default_file_output(&input));
    let output_path = resolve_output_path(&input, &output, &spec, &files)?;

    let outcome = OperationSequencer::new(&codec, &files)
        .run(&input, &output_path, &spec)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    print_outcome(&output_path, &outcome);
    Ok(ExitCode::SUCCESS)
}

fn process_config(path: &Path) -> Result<ExitCode> {
    let config = load_batch_config(path)?;

    let codec = RasterCodec::new();
    let files = FileManager::new();
    let report = BatchCoordinator::new(&codec, &files).run_config(&config);

    print_report(&report);
    Ok(batch_exit_code(&report))
}

fn process_info(input: &Path) -> Result<()> {
    validate_file(input)?;

    let codec = RasterCodec::new();
    let file_size = std::fs::metadata(input)?.len();
    let (width, height, format) = codec
        .loader()
        .get_dimensions_and_format(input)
        .with_context(|| format!("Cannot read image header of {}", input.display()))?;
    let aspect_ratio = width as f32 / height.max(1) as f32;

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(file_size));
    println!("Dimensions: {} x {} pixels", width, height);
    println!("Aspect Ratio: {:.2}:1", aspect_ratio);
    println!("Format: {}", format);

    match codec.metadata().read_metadata(input) {
        Ok(Some(exif)) => {
            println!("Has EXIF metadata: true");
            println!("\n=== EXIF Metadata ===");
            for (tag, value) in codec.metadata().extract_common_metadata(&exif) {
                println!("{:25}: {}", tag, value);
            }
        }
        _ => println!("Has EXIF metadata: false"),
    }

    Ok(())
}

/// A file's results land next to it.
fn default_file_output(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A directory's results land in a sibling `<name>_processed`.
fn default_directory_output(input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => input.with_file_name(format!("{}_processed", name.to_string_lossy())),
        None => input.join("processed"),
    }
}

/// Zero when at least one item made it through.
fn batch_exit_code(report: &BatchReport) -> ExitCode {
    if report.succeeded > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_outcome(output: &Path, outcome: &OperationOutcome) {
    println!("Saved to: {}", output.display());
    println!(
        "Size: {} -> {} ({:.1}% reduction)",
        format_file_size(outcome.original_size),
        format_file_size(outcome.final_size),
        outcome.reduction_percent
    );
}

fn print_report(report: &BatchReport) {
    for item in &report.items {
        match (&item.result, &item.output) {
            (Ok(outcome), Some(output)) => println!(
                "  ok    {} -> {} ({:.1}%)",
                item.input.display(),
                output.display(),
                outcome.reduction_percent
            ),
            (Ok(outcome), None) => println!(
                "  ok    {} ({:.1}%)",
                item.input.display(),
                outcome.reduction_percent
            ),
            (Err(message), _) => println!("  FAIL  {}: {}", item.input.display(), message),
        }
    }

    println!(
        "Batch complete: {} succeeded, {} failed. {} -> {} ({:.1}% reduction)",
        report.succeeded,
        report.failed,
        format_file_size(report.total_original_size),
        format_file_size(report.total_final_size),
        report.reduction_percent()
    );
}

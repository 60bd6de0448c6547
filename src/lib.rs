pub mod cli;
pub mod config;
mod core;
mod processors;
mod utils;

#[cfg(test)]
mod test_helpers;

pub use config::{load_batch_config, BatchConfig, BatchEntry};
pub use crate::core::sequencer::{temp_path, OperationSequencer};
pub use crate::core::validation::{validate_dimensions, validate_file, validate_quality};
pub use crate::core::{
    BatchItem, BatchReport, CodecError, CompressStage, ConvertStage, FitMode, ImageDescriptor,
    ImageFormat, ImageToolError, MetadataPolicy, OperationOutcome, OperationSpec,
    ResizeAlgorithm, ResizeStage, Result, StageKind, StageResult, ValidationError,
    MAX_DIMENSION, MAX_FILE_SIZE,
};
pub use processors::{
    BatchCoordinator, BatchOptions, CodecOutput, Compressor, ImageCodecGateway, Loader,
    MetadataProcessor, RasterCodec, Resizer,
};
pub use utils::{
    classify_output, format_file_size, is_supported_format, operation_suffix, reduction_percent,
    resolve_output_path, FileManager, PathResolutionCase,
};

pub mod prelude {
    pub use crate::{
        BatchCoordinator, FileManager, ImageCodecGateway, OperationSequencer, OperationSpec,
        RasterCodec,
    };
}

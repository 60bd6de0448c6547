// imgchain/src/processors/mod.rs
mod batch;
mod codec;
mod compressor;
mod loader;
mod metadata;
mod resizer;

pub use batch::{BatchCoordinator, BatchOptions};
pub use codec::{select_output_format, CodecOutput, ImageCodecGateway, RasterCodec};
pub use compressor::Compressor;
pub use loader::Loader;
pub use metadata::{EmbeddedMetadata, MetadataProcessor};
pub use resizer::Resizer;


//! DICOM series resolution and a viewport state machine over the result.
//!
//! An upload (one object or a ZIP archive) is split into entries, each entry
//! is read into an [`ObjectRecord`], records are grouped into ordered
//! [`Series`], and a [`ViewportController`] drives navigation and display
//! adjustments over them. Pixel decoding is an optional capability; without
//! it every frame renders as a deterministic placeholder.

pub mod app;
pub mod config;
pub mod decode;
pub mod error;
pub mod extract;
pub mod image_pipeline;
pub mod message;
pub mod model;
pub mod utils;

pub use app::{Capabilities, ViewportController};
pub use config::ViewerConfig;
pub use decode::{placeholder_frame, DecodeAdapter, FrameDecoder, PixelFrame, RenderedFrame};
pub use error::{
    AggregationError, ConfigError, DecodeError, ExtractionError, LoadError, ValidationError,
};
pub use extract::{extract, ArchiveReader, ZipArchiveReader};
pub use image_pipeline::DicomFrameDecoder;
pub use message::{Direction, ViewCommand};
pub use model::{
    aggregate, AttributeSource, DicomAttributeSource, DisplayParams, Entry, InputKind, LoadPhase,
    MetadataReader, ObjectRecord, Series, SeriesTag, ViewerSession,
};

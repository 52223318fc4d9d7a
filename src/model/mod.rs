pub mod entry;
pub mod loader;
pub mod record;
pub mod series;
pub mod session;

pub use entry::{Entry, InputKind};
pub use loader::{AttributeSource, Attributes, DicomAttributeSource, MetadataReader};
pub use record::{
    DecodeHandle, ObjectRecord, SeriesTag, DEFAULT_INSTANCE_NUMBER, UNKNOWN_SERIES_DESCRIPTION,
    UNKNOWN_SERIES_ID,
};
pub use series::{aggregate, Series};
pub use session::{DisplayParams, LoadPhase, ViewerSession};

pub mod error;
pub mod format_detection;
pub mod grid;
pub mod handler;
pub mod header;
pub mod mapping;
pub mod normalize;
pub mod parsers;
pub mod pipeline;
pub mod region;
pub mod validate;
pub mod vendor_type;

pub use error::IngestError;
pub use format_detection::{FormatType, detect_format};
pub use grid::{CellGrid, Workbook};
pub use handler::{campaign_context, commit_upload, preview_upload};
pub use header::{DetectedTable, HeaderSet, RawRow};
pub use mapping::{CanonicalField, CategoryPolicy, MappingSpec, SourceColumn};
pub use normalize::parse_loose_number;
pub use parsers::load_workbook;
pub use pipeline::{MappingMode, Overrides, Preview, UploadSession, build_preview, ingest_bytes};
pub use validate::{Issue, MappedBatch, MappedRecord, map_rows};
pub use vendor_type::{Category, VendorType, classify};


use thiserror::Error;

use crate::store::StoreError;

/// Failures scoped to a single parse or commit attempt.
///
/// Row-level problems are not errors: they are collected as
/// [`Issue`](crate::ingest::Issue) values on the emitted batch.
#[derive(Debug, Error)]
pub enum IngestError {
	/// Unsupported extension, corrupt container, zero sheets or an empty first sheet.
	#[error("file format error: {0}")]
	FileFormat(String),
	/// The decoder for this container was not compiled into this build.
	#[error("parser unavailable: {0}")]
	ParserUnavailable(String),
	#[error("sheet '{0}' not found in workbook")]
	UnknownSheet(String),
	#[error("invalid override: {0}")]
	InvalidOverride(String),
	#[error("selected region contains no cells")]
	EmptyRegion,
	/// Guided mapping could not be applied; no records were produced.
	#[error("mapping aborted: {0}")]
	MappingAbort(String),
	#[error("commit refused: {issues} unresolved row issue(s)")]
	CommitBlocked { issues: usize },
	#[error(transparent)]
	Store(#[from] StoreError),
}

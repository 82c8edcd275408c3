pub mod csv;
pub mod xlsx;

pub use self::csv::parse_csv_grid;
pub use self::xlsx::parse_spreadsheet;

use crate::ingest::format_detection::{detect_format, sniff_delimiter};
use crate::ingest::{IngestError, Workbook};

/// Peek this many bytes when sniffing a text delimiter
const MAX_PEEK: usize = 64 * 1024;

/// Decode an upload into a [`Workbook`], dispatching on the filename extension.
#[tracing::instrument(skip(data), fields(bytes = data.len()))]
pub fn load_workbook(data: &[u8], filename: &str) -> Result<Workbook, IngestError> {
	let format = detect_format(filename)?;

	let sheets = if format.is_delimited() {
		let peek = &data[..data.len().min(MAX_PEEK)];
		let grid = parse_csv_grid(data, sniff_delimiter(format, peek))?;
		vec![(sheet_name_from_filename(filename), grid)]
	} else {
		parse_spreadsheet(data, format)?
	};

	let workbook = Workbook::new(sheets)?;
	tracing::debug!(format = format.as_str(), sheets = ?workbook.sheet_names(), "workbook loaded");
	Ok(workbook)
}

/// Delimited text has one sheet, named after the file stem.
fn sheet_name_from_filename(filename: &str) -> String {
	std::path::Path::new(filename)
		.file_stem()
		.and_then(|s| s.to_str())
		.filter(|s| !s.is_empty())
		.unwrap_or("Sheet1")
		.to_string()
}

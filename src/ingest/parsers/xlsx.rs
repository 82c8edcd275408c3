//! Binary spreadsheet containers (xlsx, xlsm, xlsb, xls, ods).
//!
//! Cells are rendered as the text the vendor sees. OOXML workbooks go through
//! umya-spreadsheet, which applies each cell's number format, so a cell holding
//! `1234` styled `$#,##0.00` loads as `"$1,234.00"`. The legacy and OpenDocument
//! containers go through calamine, which exposes raw values only.

use crate::ingest::{CellGrid, FormatType, IngestError};

#[cfg(feature = "spreadsheets")]
use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};

/// Decode every sheet of a binary container, preserving absolute cell
/// positions. Sheets that cannot be read fail the whole upload.
#[cfg(feature = "spreadsheets")]
pub fn parse_spreadsheet(data: &[u8], format: FormatType) -> Result<Vec<(String, CellGrid)>, IngestError> {
	match format {
		FormatType::Xlsx | FormatType::Xlsm => parse_ooxml(data),
		_ => parse_raw(data),
	}
}

#[cfg(not(feature = "spreadsheets"))]
pub fn parse_spreadsheet(_data: &[u8], format: FormatType) -> Result<Vec<(String, CellGrid)>, IngestError> {
	Err(IngestError::ParserUnavailable(format!(
		"this build has no decoder for .{} files; rebuild with the `spreadsheets` feature",
		format.as_str()
	)))
}

/// Formatted display values, placed at their 1-based coordinates.
#[cfg(feature = "spreadsheets")]
fn parse_ooxml(data: &[u8]) -> Result<Vec<(String, CellGrid)>, IngestError> {
	let book = umya_spreadsheet::reader::xlsx::read_reader(std::io::Cursor::new(data), true)
		.map_err(|e| IngestError::FileFormat(format!("failed to open spreadsheet: {}", e)))?;

	let mut sheets = Vec::new();
	for ws in book.get_sheet_collection() {
		let mut rows: Vec<Vec<String>> = Vec::new();
		for cell in ws.get_cell_collection() {
			let coord = cell.get_coordinate();
			let (row, col) = (*coord.get_row_num() as usize, *coord.get_col_num() as usize);
			if row == 0 || col == 0 {
				continue;
			}
			let text = ws.get_formatted_value((col as u32, row as u32));
			if text.is_empty() {
				continue;
			}
			if rows.len() < row {
				rows.resize_with(row, Vec::new);
			}
			let cells = &mut rows[row - 1];
			if cells.len() < col {
				cells.resize(col, String::new());
			}
			cells[col - 1] = text;
		}

		let name = ws.get_name().to_string();
		tracing::debug!(sheet = %name, rows = rows.len(), "decoded worksheet");
		sheets.push((name, CellGrid::new(rows)));
	}

	Ok(sheets)
}

#[cfg(feature = "spreadsheets")]
fn parse_raw(data: &[u8]) -> Result<Vec<(String, CellGrid)>, IngestError> {
	let mut workbook = open_workbook_auto_from_rs(std::io::Cursor::new(data))
		.map_err(|e| IngestError::FileFormat(format!("failed to open spreadsheet: {}", e)))?;

	let sheet_names = workbook.sheet_names().to_vec();
	let mut sheets = Vec::with_capacity(sheet_names.len());

	for name in sheet_names {
		let range = workbook
			.worksheet_range(&name)
			.map_err(|e| IngestError::FileFormat(format!("failed to read worksheet '{}': {}", name, e)))?;

		// The used range may begin below/right of A1; pad so row and column
		// overrides address the same cells the vendor sees.
		let (top, left) = range
			.start()
			.map(|(r, c)| (r as usize, c as usize))
			.unwrap_or((0, 0));

		let mut rows: Vec<Vec<String>> = vec![Vec::new(); top];
		for row in range.rows() {
			let mut cells = vec![String::new(); left];
			cells.extend(row.iter().map(display_text));
			rows.push(cells);
		}

		tracing::debug!(sheet = %name, rows = rows.len(), "decoded worksheet");
		sheets.push((name, CellGrid::new(rows)));
	}

	Ok(sheets)
}

#[cfg(feature = "spreadsheets")]
fn display_text(cell: &Data) -> String {
	match cell {
		Data::Empty => String::new(),
		Data::String(s) => s.clone(),
		Data::Float(f) => format_float(*f),
		Data::Int(i) => i.to_string(),
		Data::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
		Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
			Some(dt) if dt.time() == chrono::NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
			Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
			None => cell.to_string(),
		},
		Data::DurationIso(s) => s.clone(),
		Data::Error(_) => String::new(),
	}
}

#[cfg(feature = "spreadsheets")]
fn format_float(f: f64) -> String {
	if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
		format!("{:.0}", f)
	} else {
		f.to_string()
	}
}

//! In-memory sheet representation shared by every pipeline stage.

use serde::Serialize;

use crate::ingest::IngestError;

/// One sheet as rows of raw cell text. Rows may be ragged; reads past the end
/// of a row yield an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CellGrid {
	rows: Vec<Vec<String>>,
}

impl CellGrid {
	pub fn new(rows: Vec<Vec<String>>) -> Self {
		Self { rows }
	}

	pub fn rows(&self) -> &[Vec<String>] {
		&self.rows
	}

	pub fn row_count(&self) -> usize {
		self.rows.len()
	}

	/// Widest row length.
	pub fn width(&self) -> usize {
		self.rows.iter().map(Vec::len).max().unwrap_or(0)
	}

	pub fn row(&self, row: usize) -> &[String] {
		self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn cell(&self, row: usize, col: usize) -> &str {
		self.row(row).get(col).map(String::as_str).unwrap_or("")
	}

	/// True when no cell holds anything but whitespace.
	pub fn is_blank(&self) -> bool {
		self.rows.iter().all(|r| is_blank_row(r))
	}
}

pub fn is_blank_row(row: &[String]) -> bool {
	row.iter().all(|c| c.trim().is_empty())
}

/// A decoded upload: sheets in container order, names unique, at least one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
	sheets: Vec<(String, CellGrid)>,
}

impl Workbook {
	/// Build a workbook, rejecting containers the pipeline cannot work with.
	pub fn new(sheets: Vec<(String, CellGrid)>) -> Result<Self, IngestError> {
		let Some((_, first)) = sheets.first() else {
			return Err(IngestError::FileFormat("workbook contains no sheets".into()));
		};
		if first.is_blank() {
			return Err(IngestError::FileFormat("first sheet is empty".into()));
		}
		for (i, (name, _)) in sheets.iter().enumerate() {
			if sheets[..i].iter().any(|(other, _)| other == name) {
				return Err(IngestError::FileFormat(format!(
					"duplicate sheet name '{}'",
					name
				)));
			}
		}
		Ok(Self { sheets })
	}

	pub fn sheet_names(&self) -> Vec<String> {
		self.sheets.iter().map(|(n, _)| n.clone()).collect()
	}

	pub fn sheet(&self, name: &str) -> Option<&CellGrid> {
		self.sheets.iter().find(|(n, _)| n == name).map(|(_, g)| g)
	}

	/// Resolve the sheet to process: the named one, or the first when unset.
	pub fn select(&self, name: Option<&str>) -> Result<(&str, &CellGrid), IngestError> {
		match name {
			Some(wanted) => self
				.sheets
				.iter()
				.find(|(n, _)| n == wanted)
				.map(|(n, g)| (n.as_str(), g))
				.ok_or_else(|| IngestError::UnknownSheet(wanted.to_string())),
			// `new` guarantees at least one sheet
			None => self
				.sheets
				.first()
				.map(|(n, g)| (n.as_str(), g))
				.ok_or_else(|| IngestError::FileFormat("workbook contains no sheets".into())),
		}
	}
}

//! Origin overrides: crop a sheet to the table the vendor actually laid out.

use crate::ingest::{CellGrid, IngestError};

/// Decode a spreadsheet column name into its 1-based index (`A` = 1,
/// `Z` = 26, `AA` = 27). Bijective base 26: there is no zero digit.
pub fn column_index(letters: &str) -> Result<usize, IngestError> {
	let letters = letters.trim();
	if letters.is_empty() {
		return Err(IngestError::InvalidOverride("start column is empty".into()));
	}

	letters.chars().try_fold(0usize, |acc, c| {
		if !c.is_ascii_alphabetic() {
			return Err(IngestError::InvalidOverride(format!(
				"start column '{}' must contain only letters",
				letters
			)));
		}
		let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
		acc.checked_mul(26)
			.and_then(|v| v.checked_add(digit))
			.ok_or_else(|| IngestError::InvalidOverride(format!("start column '{}' is out of range", letters)))
	})
}

/// Inverse of [`column_index`]. Index 0 has no name.
pub fn column_letters(index: usize) -> Option<String> {
	if index == 0 {
		return None;
	}
	let mut n = index;
	let mut out = Vec::new();
	while n > 0 {
		let rem = (n - 1) % 26;
		out.push(b'A' + rem as u8);
		n = (n - 1) / 26;
	}
	out.reverse();
	String::from_utf8(out).ok()
}

/// Crop to rows >= `start_row` and columns >= `start_col` (both 1-based).
/// Unset origins default to row 1 / column A. The source grid is untouched.
pub fn crop(grid: &CellGrid, start_row: Option<usize>, start_col: Option<usize>) -> Result<CellGrid, IngestError> {
	let row0 = match start_row {
		Some(0) => return Err(IngestError::InvalidOverride("start row must be at least 1".into())),
		Some(r) => r - 1,
		None => 0,
	};
	let col0 = match start_col {
		Some(0) => return Err(IngestError::InvalidOverride("start column must be at least 1".into())),
		Some(c) => c - 1,
		None => 0,
	};

	let rows = grid
		.rows()
		.iter()
		.skip(row0)
		.map(|r| r.iter().skip(col0).cloned().collect())
		.collect();
	Ok(CellGrid::new(rows))
}

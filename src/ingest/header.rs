//! Header-row detection for tables that do not start on row 1.
//!
//! Vendor exports often open with a logo, a title block or contact details.
//! Each row in a bounded window is scored as a header candidate: cells that
//! exactly match known column vocabulary weigh the most, short textual cells
//! a little, and every non-empty cell adds one. The first row with the
//! strictly highest score becomes the header; rows below it are the body.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::ingest::{CellGrid, IngestError};

/// Maximum number of leading rows considered as header candidates.
pub const HEADER_SCAN_WINDOW: usize = 50;
/// Multiplier applied to the accumulated hit count.
pub const HIT_WEIGHT: i64 = 3;
/// Hits for a cell that exactly matches [`HEADER_SYNONYMS`].
pub const SYNONYM_HIT: i64 = 2;
/// Hits for any other short cell containing a letter.
pub const SHORT_LABEL_HIT: i64 = 1;
/// Longest cell (in characters) still counted as a short label.
pub const SHORT_LABEL_MAX_CHARS: usize = 30;
/// Starting best score; any scored row beats it.
pub const SCORE_SENTINEL: i64 = -1;

/// Column vocabulary seen across vendor exports: vendor, category, cost,
/// geography, currency and date terms, already normalized.
pub const HEADER_SYNONYMS: &[&str] = &[
	// vendor
	"vendor",
	"vendor name",
	"media vendor",
	"supplier",
	"publisher",
	"publication",
	"newspaper",
	"station",
	"network",
	"media owner",
	"partner",
	// category
	"category",
	"cat",
	"channel",
	"media type",
	"medium",
	// cost
	"cost",
	"net cost",
	"cost net",
	"net",
	"gross",
	"gross cost",
	"amount",
	"total",
	"total cost",
	"net total",
	"spend",
	"budget",
	// geography
	"market",
	"dma",
	"geography",
	"geo",
	"region",
	"city",
	"state",
	"province",
	"country",
	// currency
	"currency",
	"ccy",
	"fx rate",
	"exchange rate",
	// dates
	"date",
	"start date",
	"end date",
	"flight",
	"flight dates",
	"run date",
	"insertion date",
	"month",
	"week",
];

static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N} %/+.\-]").expect("static regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Canonical label text: lowercase, underscores as spaces, only
/// letters/digits/space/`%/+.-` kept, whitespace collapsed and trimmed.
pub fn normalize_label(raw: &str) -> String {
	let lowered = raw.to_lowercase().replace('_', " ");
	let spaced = WHITESPACE_RUN.replace_all(&lowered, " ");
	let kept = DISALLOWED_CHARS.replace_all(&spaced, "");
	WHITESPACE_RUN.replace_all(&kept, " ").trim().to_string()
}

/// Score one candidate row. Public so the heuristic can be tested without decoding files.
pub fn score_row(row: &[String]) -> i64 {
	let mut hits = 0;
	let mut non_empty = 0;
	for cell in row {
		let label = normalize_label(cell);
		if label.is_empty() {
			continue;
		}
		non_empty += 1;
		if HEADER_SYNONYMS.contains(&label.as_str()) {
			hits += SYNONYM_HIT;
		} else if label.chars().count() <= SHORT_LABEL_MAX_CHARS && label.chars().any(char::is_alphabetic) {
			hits += SHORT_LABEL_HIT;
		}
	}
	HIT_WEIGHT * hits + non_empty
}

/// Index (0-based) of the best header candidate within the scan window.
pub fn detect_header_row(grid: &CellGrid) -> usize {
	let mut best_row = 0;
	let mut best_score = SCORE_SENTINEL;
	for (i, row) in grid.rows().iter().take(HEADER_SCAN_WINDOW).enumerate() {
		let score = score_row(row);
		if score > best_score {
			best_score = score;
			best_row = i;
		}
	}
	best_row
}

/// Ordered, unique, non-empty column labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<String>);

impl HeaderSet {
	/// Normalize a raw header row, name blank columns `col_N` and suffix repeats `_2`, `_3`, ...
	pub fn from_row(row: &[String]) -> Self {
		let mut labels: Vec<String> = Vec::with_capacity(row.len());
		for (i, cell) in row.iter().enumerate() {
			let mut base = normalize_label(cell);
			if base.is_empty() {
				base = format!("col_{}", i + 1);
			}
			let mut label = base.clone();
			let mut suffix = 2;
			while labels.contains(&label) {
				label = format!("{}_{}", base, suffix);
				suffix += 1;
			}
			labels.push(label);
		}
		if labels.is_empty() {
			labels.push("col_1".to_string());
		}
		Self(labels)
	}

	pub fn labels(&self) -> &[String] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn contains(&self, label: &str) -> bool {
		self.0.iter().any(|l| l == label)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

/// One body row: header label to raw cell text, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
	/// 1-based row number in the source sheet
	pub sheet_row: usize,
	pub cells: Vec<(String, String)>,
}

impl RawRow {
	pub fn get(&self, label: &str) -> Option<&str> {
		self.cells
			.iter()
			.find(|(l, _)| l == label)
			.map(|(_, v)| v.as_str())
	}
}

/// Result of header detection over a cropped region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedTable {
	/// 0-based header row within the cropped region
	pub header_row: usize,
	pub headers: HeaderSet,
	pub rows: Vec<RawRow>,
}

/// Split a cropped grid into headers and body rows.
///
/// `manual_header_row` is 1-based within the cropped grid and bypasses scoring.
/// `row_offset` is the number of sheet rows cropped away above the grid, used
/// only to report source row numbers.
pub fn extract_table(grid: &CellGrid, manual_header_row: Option<usize>, row_offset: usize) -> Result<DetectedTable, IngestError> {
	if grid.row_count() == 0 || grid.is_blank() {
		return Err(IngestError::EmptyRegion);
	}

	let header_row = match manual_header_row {
		Some(0) => return Err(IngestError::InvalidOverride("header row must be at least 1".into())),
		Some(r) if r > grid.row_count() => {
			return Err(IngestError::InvalidOverride(format!(
				"header row {} is beyond the {} row(s) of the selected region",
				r,
				grid.row_count()
			)));
		}
		Some(r) => r - 1,
		None => detect_header_row(grid),
	};

	let headers = HeaderSet::from_row(grid.row(header_row));

	let rows = grid
		.rows()
		.iter()
		.enumerate()
		.skip(header_row + 1)
		.filter(|(_, r)| !crate::ingest::grid::is_blank_row(r))
		.map(|(i, r)| RawRow {
			sheet_row: row_offset + i + 1,
			cells: headers
				.iter()
				.enumerate()
				.map(|(col, label)| (label.to_string(), r.get(col).cloned().unwrap_or_default()))
				.collect(),
		})
		.collect::<Vec<_>>();

	tracing::debug!(
		header_row,
		manual = manual_header_row.is_some(),
		columns = headers.len(),
		body_rows = rows.len(),
		"header detected"
	);

	Ok(DetectedTable {
		header_row,
		headers,
		rows,
	})
}

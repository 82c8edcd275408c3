//! The ingest pipeline as pure stages, plus a session that re-runs them as
//! the user changes file, sheet, overrides or mapping.
//!
//! `(bytes, overrides) -> (headers, rows) -> mapping -> (records, issues)`.
//! Nothing is updated in place: every change re-derives from the workbook.

use serde::{Deserialize, Serialize};

use crate::ingest::header::extract_table;
use crate::ingest::mapping::{auto_map, guided_map};
use crate::ingest::region::{column_index, crop};
use crate::ingest::{
	Category, DetectedTable, HeaderSet, IngestError, MappedBatch, MappingSpec, RawRow, VendorType, Workbook, classify,
	load_workbook, map_rows,
};

/// Default number of raw rows included in a preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Optional user corrections applied before header detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
	/// 1-based first row of the table
	pub start_row: Option<usize>,
	/// Column letters of the first table column, e.g. `"C"`
	pub start_col: Option<String>,
	/// 1-based header row within the cropped region
	pub manual_header_row: Option<usize>,
	pub selected_sheet: Option<String>,
}

/// How the mapping spec is obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "spec", rename_all = "snake_case")]
pub enum MappingMode {
	#[default]
	Automatic,
	Guided(MappingSpec),
}

/// Headers and body of the selected table, plus its inferred medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTable {
	pub sheet: String,
	pub table: DetectedTable,
	pub vendor_type: VendorType,
}

/// Everything a reviewer needs before committing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
	pub sheet_names: Vec<String>,
	pub selected_sheet: String,
	/// 1-based header row within the cropped region
	pub header_row: usize,
	pub headers: HeaderSet,
	pub sample_rows: Vec<RawRow>,
	pub total_rows: usize,
	pub vendor_type: VendorType,
	pub default_category: Category,
	pub mapping: MappingSpec,
	pub batch: MappedBatch,
}

/// Crop the selected sheet and detect its header row.
pub fn select_table(workbook: &Workbook, overrides: &Overrides) -> Result<SelectedTable, IngestError> {
	let (sheet, grid) = workbook.select(overrides.selected_sheet.as_deref())?;
	let start_col = overrides.start_col.as_deref().map(column_index).transpose()?;
	let cropped = crop(grid, overrides.start_row, start_col)?;
	let row_offset = overrides.start_row.map_or(0, |r| r - 1);
	let table = extract_table(&cropped, overrides.manual_header_row, row_offset)?;
	let vendor_type = classify(&table.headers);

	tracing::debug!(sheet, header_row = table.header_row, ?vendor_type, "table selected");
	Ok(SelectedTable {
		sheet: sheet.to_string(),
		table,
		vendor_type,
	})
}

/// Resolve the mapping spec for a table.
pub fn resolve_mapping(selected: &SelectedTable, mode: &MappingMode) -> Result<MappingSpec, IngestError> {
	match mode {
		MappingMode::Automatic => Ok(auto_map(&selected.table.headers, selected.vendor_type)),
		MappingMode::Guided(spec) => guided_map(&selected.table.headers, spec.clone()),
	}
}

/// Run every stage after loading and package the result for review.
pub fn build_preview(
	workbook: &Workbook,
	overrides: &Overrides,
	mode: &MappingMode,
	preview_rows: usize,
) -> Result<Preview, IngestError> {
	let selected = select_table(workbook, overrides)?;
	let mapping = resolve_mapping(&selected, mode)?;
	let batch = map_rows(&selected.table.rows, &mapping);

	Ok(Preview {
		sheet_names: workbook.sheet_names(),
		selected_sheet: selected.sheet,
		header_row: selected.table.header_row + 1,
		total_rows: selected.table.rows.len(),
		sample_rows: selected.table.rows.iter().take(preview_rows).cloned().collect(),
		headers: selected.table.headers,
		vendor_type: selected.vendor_type,
		default_category: selected.vendor_type.default_category(),
		mapping,
		batch,
	})
}

/// Decode bytes and run the full pipeline in one call.
pub fn ingest_bytes(
	data: &[u8],
	filename: &str,
	overrides: &Overrides,
	mode: &MappingMode,
	preview_rows: usize,
) -> Result<Preview, IngestError> {
	let workbook = load_workbook(data, filename)?;
	build_preview(&workbook, overrides, mode, preview_rows)
}

/// Single-user upload state. Choosing a file replaces everything derived
/// from the previous one; other changes re-run the pipeline from the workbook.
#[derive(Debug, Default)]
pub struct UploadSession {
	workbook: Option<Workbook>,
	overrides: Overrides,
	mode: MappingMode,
	preview_rows: usize,
}

impl UploadSession {
	pub fn new(preview_rows: usize) -> Self {
		Self {
			preview_rows,
			..Self::default()
		}
	}

	/// Load a new file. Last selection wins: overrides and mapping reset even
	/// when decoding fails.
	pub fn choose_file(&mut self, data: &[u8], filename: &str) -> Result<Preview, IngestError> {
		self.workbook = None;
		self.overrides = Overrides::default();
		self.mode = MappingMode::Automatic;
		self.workbook = Some(load_workbook(data, filename)?);
		self.preview()
	}

	pub fn choose_sheet(&mut self, name: Option<String>) -> Result<Preview, IngestError> {
		self.overrides.selected_sheet = name;
		self.preview_retaining_mapping()
	}

	pub fn set_overrides(&mut self, overrides: Overrides) -> Result<Preview, IngestError> {
		self.overrides = overrides;
		self.preview_retaining_mapping()
	}

	pub fn apply_mapping(&mut self, mode: MappingMode) -> Result<Preview, IngestError> {
		self.mode = mode;
		self.preview()
	}

	pub fn overrides(&self) -> &Overrides {
		&self.overrides
	}

	pub fn mode(&self) -> &MappingMode {
		&self.mode
	}

	/// Re-run the pipeline for the current state.
	pub fn preview(&self) -> Result<Preview, IngestError> {
		let workbook = self
			.workbook
			.as_ref()
			.ok_or_else(|| IngestError::FileFormat("no file selected".into()))?;
		build_preview(workbook, &self.overrides, &self.mode, self.preview_rows)
	}

	/// A guided mapping survives header changes only while every header it
	/// names still exists; otherwise the session falls back to automatic.
	fn preview_retaining_mapping(&mut self) -> Result<Preview, IngestError> {
		if let MappingMode::Guided(spec) = &self.mode {
			let workbook = self
				.workbook
				.as_ref()
				.ok_or_else(|| IngestError::FileFormat("no file selected".into()))?;
			let selected = select_table(workbook, &self.overrides)?;
			if !spec.fits(&selected.table.headers) {
				tracing::warn!("guided mapping no longer matches the detected headers; reverting to automatic");
				self.mode = MappingMode::Automatic;
			}
		}
		self.preview()
	}
}

#[cfg(test)]
#[cfg(feature = "unit-tests")]
mod tests {
	use std::collections::BTreeMap;

	use super::*;
	use crate::ingest::{CanonicalField, CategoryPolicy};

	const NEWSPAPER_CSV: &str = "Newspaper,Market,State,Ins,Net Per Unit\nDaily Gazette,Springfield,IL,3,150.00\n";

	#[test]
	fn newspaper_csv_end_to_end() {
		let preview = ingest_bytes(
			NEWSPAPER_CSV.as_bytes(),
			"gazette.csv",
			&Overrides::default(),
			&MappingMode::Automatic,
			DEFAULT_PREVIEW_ROWS,
		)
		.expect("ingest");

		assert_eq!(preview.vendor_type, VendorType::PrintNews);
		assert_eq!(preview.default_category, Category::Print);
		assert!(preview.batch.issues.is_empty());
		let record = &preview.batch.records[0];
		assert_eq!(record.vendor, "Daily Gazette");
		assert_eq!(record.cat, "PRINT");
		assert_eq!(record.cost_net, 450.0);
		assert_eq!(record.geography.as_deref(), Some("Springfield, IL"));
		assert_eq!(record.quantity, Some(3.0));
	}

	#[test]
	fn overrides_crop_before_detection() {
		let csv = "Rate card,,\n,,\n,Vendor,Net Cost\n,Radio One,\"$1,200.00\"\n";
		let overrides = Overrides {
			start_row: Some(3),
			start_col: Some("B".into()),
			..Overrides::default()
		};
		let preview = ingest_bytes(csv.as_bytes(), "r.csv", &overrides, &MappingMode::Automatic, 10).expect("ingest");
		assert_eq!(preview.header_row, 1);
		assert_eq!(preview.headers.labels(), &["vendor", "net cost"]);
		assert_eq!(preview.sample_rows[0].sheet_row, 4);
		assert_eq!(preview.batch.records[0].cost_net, 1200.0);
	}

	#[test]
	fn preview_rows_are_capped() {
		let mut csv = String::from("Vendor,Net\n");
		for i in 0..25 {
			csv.push_str(&format!("V{},{}\n", i, i));
		}
		let preview = ingest_bytes(csv.as_bytes(), "a.csv", &Overrides::default(), &MappingMode::Automatic, 10).expect("ingest");
		assert_eq!(preview.sample_rows.len(), 10);
		assert_eq!(preview.total_rows, 25);
		assert_eq!(preview.batch.records.len(), 25);
	}

	#[test]
	fn guided_mode_uses_caller_spec() {
		let csv = "Seller,Invoice Total,Kind\nOutfront,900,ooh\n";
		let mut fields = BTreeMap::new();
		fields.insert(CanonicalField::Vendor, "seller".to_string());
		fields.insert(CanonicalField::CostNet, "invoice total".to_string());
		let mode = MappingMode::Guided(MappingSpec {
			fields,
			sources: BTreeMap::new(),
			category: CategoryPolicy::FromHeader("kind".into()),
		});
		let preview = ingest_bytes(csv.as_bytes(), "g.csv", &Overrides::default(), &mode, 10).expect("ingest");
		assert_eq!(preview.batch.records[0].cat, "OOH_DOOH");
		assert_eq!(preview.batch.records[0].cost_net, 900.0);
	}

	#[test]
	fn guided_mode_reports_blank_vendor_as_row_issue() {
		let csv = "Vendor,Net Cost\n,50\nAcme Media,100\n";
		let mut fields = BTreeMap::new();
		fields.insert(CanonicalField::Vendor, "vendor".to_string());
		fields.insert(CanonicalField::CostNet, "net cost".to_string());
		let mode = MappingMode::Guided(MappingSpec {
			fields,
			sources: BTreeMap::new(),
			category: CategoryPolicy::Constant("FEES".into()),
		});

		let preview = ingest_bytes(csv.as_bytes(), "fees.csv", &Overrides::default(), &mode, 10)
			.expect("a blank vendor is a row issue, not an abort");
		assert_eq!(preview.batch.records.len(), 1);
		assert_eq!(preview.batch.records[0].vendor, "Acme Media");
		assert_eq!(preview.batch.issues.len(), 1);
		assert_eq!(preview.batch.issues[0].message, "Row 1: vendor missing");
	}

	#[test]
	fn city_and_state_compose_geography() {
		let csv = "Vendor,City,State,Net Cost\nDaily Gazette,Springfield,IL,450\n";
		let preview = ingest_bytes(csv.as_bytes(), "print.csv", &Overrides::default(), &MappingMode::Automatic, 10)
			.expect("ingest");
		assert_eq!(preview.batch.records[0].geography.as_deref(), Some("Springfield, IL"));
		assert_eq!(preview.batch.records[0].cost_net, 450.0);
	}

	#[test]
	fn session_resets_on_new_file() {
		let mut session = UploadSession::new(10);
		session.choose_file(NEWSPAPER_CSV.as_bytes(), "a.csv").expect("first");
		session
			.set_overrides(Overrides {
				manual_header_row: Some(1),
				..Overrides::default()
			})
			.expect("overrides");
		assert_eq!(session.overrides().manual_header_row, Some(1));

		let preview = session.choose_file(b"Vendor,Net\nA,5\n", "b.csv").expect("second");
		assert_eq!(session.overrides(), &Overrides::default());
		assert_eq!(preview.selected_sheet, "b");
		assert_eq!(preview.batch.records[0].cost_net, 5.0);

		// a failed load leaves no stale workbook behind
		assert!(session.choose_file(b"", "c.pdf").is_err());
		assert!(session.preview().is_err());
	}

	#[test]
	fn session_drops_guided_mapping_when_headers_change() {
		let csv = "Vendor,Net\nA,5\n,\nSupplier,Total\nB,6\n";
		let mut session = UploadSession::new(10);
		session.choose_file(csv.as_bytes(), "two.csv").expect("load");

		let mut fields = BTreeMap::new();
		fields.insert(CanonicalField::Vendor, "vendor".to_string());
		fields.insert(CanonicalField::CostNet, "net".to_string());
		session
			.apply_mapping(MappingMode::Guided(MappingSpec {
				fields,
				sources: BTreeMap::new(),
				category: CategoryPolicy::Constant("FEES".into()),
			}))
			.expect("guided");

		// same headers: guided mapping retained
		session.set_overrides(Overrides::default()).expect("same");
		assert!(matches!(session.mode(), MappingMode::Guided(_)));

		// header row moves to "Supplier,Total": mapping no longer fits
		let preview = session
			.set_overrides(Overrides {
				start_row: Some(4),
				..Overrides::default()
			})
			.expect("moved");
		assert_eq!(session.mode(), &MappingMode::Automatic);
		assert_eq!(preview.batch.records[0].vendor, "B");
	}

	#[test]
	fn unknown_sheet_is_reported() {
		let err = ingest_bytes(
			NEWSPAPER_CSV.as_bytes(),
			"a.csv",
			&Overrides {
				selected_sheet: Some("Totals".into()),
				..Overrides::default()
			},
			&MappingMode::Automatic,
			10,
		)
		.unwrap_err();
		assert!(matches!(err, IngestError::UnknownSheet(_)));
	}

	#[test]
	fn mapping_mode_json_shape() {
		let mode: MappingMode = serde_json::from_str(r#"{"mode":"automatic"}"#).expect("automatic");
		assert_eq!(mode, MappingMode::Automatic);
		let mode: MappingMode = serde_json::from_str(
			r#"{"mode":"guided","spec":{"fields":{"vendor":"a"},"category":{"kind":"constant","value":"FEES"}}}"#,
		)
		.expect("guided");
		assert!(matches!(mode, MappingMode::Guided(_)));
	}
}

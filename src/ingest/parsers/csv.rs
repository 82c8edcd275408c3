use crate::ingest::{CellGrid, IngestError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode delimited text into a grid of raw fields. Numbers stay exactly as
/// written; rows keep their own lengths.
pub fn parse_csv_grid(data: &[u8], delimiter: u8) -> Result<CellGrid, IngestError> {
	let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

	let mut rdr = csv::ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.delimiter(delimiter)
		.trim(csv::Trim::None)
		.from_reader(data);

	let mut rows = Vec::new();
	for result in rdr.records() {
		let record = result.map_err(|e| IngestError::FileFormat(format!("failed to read delimited text: {}", e)))?;
		rows.push(record.iter().map(str::to_string).collect());
	}

	Ok(CellGrid::new(rows))
}

use crate::ingest::IngestError;

/// Upload container kinds, decided from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
	Csv,
	Tsv,
	/// Plain text with a sniffed delimiter
	Text,
	Xlsx,
	Xlsm,
	Xlsb,
	Xls,
	Ods,
}

impl FormatType {
	pub fn as_str(&self) -> &str {
		match self {
			FormatType::Csv => "csv",
			FormatType::Tsv => "tsv",
			FormatType::Text => "txt",
			FormatType::Xlsx => "xlsx",
			FormatType::Xlsm => "xlsm",
			FormatType::Xlsb => "xlsb",
			FormatType::Xls => "xls",
			FormatType::Ods => "ods",
		}
	}

	/// Parse an extension (without the dot) into a FormatType
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"csv" => Some(FormatType::Csv),
			"tsv" | "tab" => Some(FormatType::Tsv),
			"txt" => Some(FormatType::Text),
			"xlsx" => Some(FormatType::Xlsx),
			"xlsm" => Some(FormatType::Xlsm),
			"xlsb" => Some(FormatType::Xlsb),
			"xls" => Some(FormatType::Xls),
			"ods" => Some(FormatType::Ods),
			_ => None,
		}
	}

	/// Delimited text is decoded by the csv reader; everything else is a
	/// binary spreadsheet container.
	pub fn is_delimited(&self) -> bool {
		matches!(self, FormatType::Csv | FormatType::Tsv | FormatType::Text)
	}
}

/// Detect the upload format from its filename.
pub fn detect_format(filename: &str) -> Result<FormatType, IngestError> {
	let ext = std::path::Path::new(filename)
		.extension()
		.and_then(|e| e.to_str())
		.unwrap_or("");
	FormatType::from_extension(ext).ok_or_else(|| {
		IngestError::FileFormat(format!(
			"unsupported file extension '.{}' (expected csv, tsv, txt, xlsx, xlsm, xlsb, xls or ods)",
			ext
		))
	})
}

/// Pick the delimiter for a delimited-text upload. `.txt` files are sniffed
/// from their first line: tab when it has tabs but no commas, else comma.
pub fn sniff_delimiter(format: FormatType, peek: &[u8]) -> u8 {
	match format {
		FormatType::Tsv => b'\t',
		FormatType::Text => {
			let text = String::from_utf8_lossy(peek);
			let first_line = text.lines().next().unwrap_or("");
			if first_line.contains('\t') && !first_line.contains(',') {
				b'\t'
			} else {
				b','
			}
		}
		_ => b',',
	}
}

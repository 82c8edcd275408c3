use serde::{Deserialize, Serialize};

use crate::ingest::HeaderSet;

/// Advertising medium inferred from a sheet's column vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorType {
	PrintNews,
	Digital,
	Broadcast,
	OohDooh,
	Unknown,
}

/// Line-item category vocabulary of the campaign store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
	Digital,
	Broadcast,
	Print,
	OohDooh,
	Creative,
	Fees,
}

impl Category {
	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Digital => "DIGITAL",
			Category::Broadcast => "BROADCAST",
			Category::Print => "PRINT",
			Category::OohDooh => "OOH_DOOH",
			Category::Creative => "CREATIVE",
			Category::Fees => "FEES",
		}
	}

	/// Recognize free-text category cells such as `"Print"`, `"OOH"` or `"TV"`.
	pub fn from_alias(text: &str) -> Option<Self> {
		let key = text.trim().to_lowercase().replace(['-', '/', ' '], "_");
		match key.as_str() {
			"digital" | "online" | "display" | "social" | "search" | "programmatic" | "video" => Some(Category::Digital),
			"broadcast" | "tv" | "television" | "radio" | "audio" => Some(Category::Broadcast),
			"print" | "newspaper" | "print_news" | "magazine" | "press" => Some(Category::Print),
			"ooh_dooh" | "ooh" | "dooh" | "out_of_home" | "outdoor" | "ooh_&_dooh" => Some(Category::OohDooh),
			"creative" | "production" => Some(Category::Creative),
			"fees" | "fee" | "agency_fee" | "agency_fees" => Some(Category::Fees),
			_ => None,
		}
	}
}

impl std::fmt::Display for Category {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

// Ordered signatures; the first vendor type with any matching header wins.
const PRINT_NEWS_SIGNATURE: &[&str] = &[
	"newspaper",
	"publication",
	"inch rate",
	"col inch rate",
	"column inch rate",
	"insertions",
	"ins",
	"editions",
	"edition",
	"open national",
	"open rate",
	"net per unit",
	"net/unit",
	"ad size",
];

const DIGITAL_SIGNATURE: &[&str] = &[
	"impressions",
	"imps",
	"clicks",
	"ctr",
	"ctr %",
	"cpm",
	"net cpm",
	"cpc",
	"ad set",
	"ad set name",
	"adset",
];

const BROADCAST_SIGNATURE: &[&str] = &[
	"spots",
	"grps",
	"grp",
	"trps",
	"cpp",
	"rating",
	"program",
	"programme",
	"daypart",
];

const OOH_DOOH_SIGNATURE: &[&str] = &[
	"faces",
	"units",
	"board id",
	"panel id",
	"weekly impressions",
	"location id",
	"site id",
];

/// Classify a header set by the first signature it intersects.
pub fn classify(headers: &HeaderSet) -> VendorType {
	let signatures: [(VendorType, &[&str]); 4] = [
		(VendorType::PrintNews, PRINT_NEWS_SIGNATURE),
		(VendorType::Digital, DIGITAL_SIGNATURE),
		(VendorType::Broadcast, BROADCAST_SIGNATURE),
		(VendorType::OohDooh, OOH_DOOH_SIGNATURE),
	];

	signatures
		.iter()
		.find(|(_, words)| headers.iter().any(|h| words.contains(&h)))
		.map(|(vt, _)| *vt)
		.unwrap_or(VendorType::Unknown)
}

impl VendorType {
	pub fn default_category(&self) -> Category {
		match self {
			VendorType::PrintNews => Category::Print,
			VendorType::Digital => Category::Digital,
			VendorType::Broadcast => Category::Broadcast,
			VendorType::OohDooh => Category::OohDooh,
			VendorType::Unknown => Category::Fees,
		}
	}
}

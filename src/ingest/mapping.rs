//! Header-to-field assignment, automatic or guided.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ingest::{Category, HeaderSet, IngestError, VendorType};

/// Fields of a canonical line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
	Vendor,
	Cat,
	CostNet,
	Description,
	Unit,
	Quantity,
	Geography,
	AudienceDescriptor,
	Currency,
	FxRateToCampaign,
}

/// Auxiliary columns read by geography composition and cost derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceColumn {
	Market,
	State,
	Cpm,
	Impressions,
	NetRate,
	Insertions,
	Cpp,
	Grps,
	Rate,
}

/// How each record gets its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CategoryPolicy {
	/// Same category for every row
	Constant(String),
	/// Read per row from this header
	FromHeader(String),
}

/// Resolved association of header labels to canonical fields.
///
/// `fields` never holds [`CanonicalField::Cat`]; the category is always
/// resolved through `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSpec {
	#[serde(default)]
	pub fields: BTreeMap<CanonicalField, String>,
	#[serde(default)]
	pub sources: BTreeMap<SourceColumn, String>,
	pub category: CategoryPolicy,
}

impl MappingSpec {
	pub fn header(&self, field: CanonicalField) -> Option<&str> {
		self.fields.get(&field).map(String::as_str)
	}

	pub fn source(&self, column: SourceColumn) -> Option<&str> {
		self.sources.get(&column).map(String::as_str)
	}

	/// Every header this spec reads, in no particular order.
	pub fn referenced_headers(&self) -> Vec<&str> {
		let mut out: Vec<&str> = self.fields.values().chain(self.sources.values()).map(String::as_str).collect();
		if let CategoryPolicy::FromHeader(h) = &self.category {
			out.push(h);
		}
		out
	}

	/// True when every referenced header exists in `headers`.
	pub fn fits(&self, headers: &HeaderSet) -> bool {
		self.referenced_headers().iter().all(|h| headers.contains(h))
	}
}

/// Synonym lists for one field, searched in order.
struct FieldRule {
	field: CanonicalField,
	/// Preferred exact names, tried before `synonyms`
	strong: &'static [&'static str],
	synonyms: &'static [&'static str],
	/// Substrings tried last
	contains: &'static [&'static str],
}

// Order matters: a header claimed by an earlier field is not reused later.
const FIELD_RULES: &[FieldRule] = &[
	FieldRule {
		field: CanonicalField::Vendor,
		strong: &["vendor", "vendor name", "media vendor"],
		synonyms: &[
			"supplier",
			"publisher",
			"publication",
			"newspaper",
			"station",
			"network",
			"media owner",
			"site",
			"partner",
			"seller",
		],
		contains: &["vendor", "publisher", "supplier"],
	},
	FieldRule {
		field: CanonicalField::CostNet,
		strong: &["cost net", "net cost", "net total", "total net", "net amount", "net"],
		synonyms: &[
			"cost",
			"total cost",
			"amount",
			"total",
			"spend",
			"net spend",
			"gross",
			"gross cost",
			"investment",
			"budget",
		],
		contains: &["cost", "spend", "amount", "total"],
	},
	FieldRule {
		field: CanonicalField::Description,
		strong: &["description", "line description"],
		synonyms: &["placement", "line item", "product", "package", "details", "notes", "ad size", "size", "program"],
		contains: &["description", "placement"],
	},
	FieldRule {
		field: CanonicalField::Unit,
		strong: &["unit", "unit type"],
		synonyms: &["uom", "unit of measure", "buy type", "rate type", "cost type"],
		contains: &[],
	},
	FieldRule {
		field: CanonicalField::Quantity,
		strong: &["quantity", "qty"],
		synonyms: &["insertions", "ins", "spots", "impressions", "imps", "units", "grps", "faces", "circulation"],
		contains: &["quantity"],
	},
	FieldRule {
		field: CanonicalField::Geography,
		strong: &["geography", "geo"],
		synonyms: &["region", "territory", "location", "country"],
		contains: &["geography"],
	},
	FieldRule {
		field: CanonicalField::AudienceDescriptor,
		strong: &["audience", "audience descriptor"],
		synonyms: &["target audience", "targeting", "demo", "demographic", "segment"],
		contains: &["audience"],
	},
	FieldRule {
		field: CanonicalField::Currency,
		strong: &["currency"],
		synonyms: &["curr", "ccy"],
		contains: &["currency"],
	},
	FieldRule {
		field: CanonicalField::FxRateToCampaign,
		strong: &["fx rate to campaign", "fx rate"],
		synonyms: &["fx", "exchange rate", "rate to campaign"],
		contains: &["exchange rate"],
	},
];

const CATEGORY_HEADERS: &[&str] = &["category", "cat", "channel", "media type", "medium", "media"];

const SOURCE_RULES: &[(SourceColumn, &[&str])] = &[
	(SourceColumn::Market, &["market", "market name", "dma", "dma name", "city"]),
	(SourceColumn::State, &["state", "province", "st"]),
	(SourceColumn::Cpm, &["cpm", "net cpm", "cpm net", "cost per thousand"]),
	(
		SourceColumn::Impressions,
		&["impressions", "imps", "weekly impressions", "booked impressions", "impressions ordered"],
	),
	(
		SourceColumn::NetRate,
		&["net per unit", "net/unit", "net rate", "net unit cost", "inch rate", "open rate", "rate per insertion"],
	),
	(SourceColumn::Insertions, &["insertions", "ins", "editions", "number of insertions"]),
	(SourceColumn::Cpp, &["cpp", "net cpp", "cost per point"]),
	(SourceColumn::Grps, &["grps", "grp", "trps"]),
	(
		SourceColumn::Rate,
		&["rate", "unit rate", "unit cost", "cost per unit", "price", "unit price", "gross rate"],
	),
];

/// Per-unit price columns must never be read as a line total.
fn is_rate_like(label: &str) -> bool {
	label
		.split([' ', '/'])
		.any(|word| matches!(word, "per" | "cpm" | "cpp" | "cpc" | "rate"))
}

fn find_exact<'a>(headers: &'a HeaderSet, names: &[&str], claimed: &[&str]) -> Option<&'a str> {
	names
		.iter()
		.find_map(|name| headers.iter().find(|h| h == name && !claimed.contains(h)))
}

fn find_rule<'a>(headers: &'a HeaderSet, rule: &FieldRule, claimed: &[&str]) -> Option<&'a str> {
	find_exact(headers, rule.strong, claimed)
		.or_else(|| find_exact(headers, rule.synonyms, claimed))
		.or_else(|| {
			rule.contains.iter().find_map(|needle| {
				headers.iter().find(|h| {
					h.contains(needle)
						&& !claimed.contains(h)
						&& !(rule.field == CanonicalField::CostNet && is_rate_like(h))
				})
			})
		})
}

/// Heuristic mapping: strong names, then synonyms, then substrings, per field.
pub fn auto_map(headers: &HeaderSet, vendor_type: VendorType) -> MappingSpec {
	let mut claimed: Vec<&str> = Vec::new();
	let mut fields = BTreeMap::new();

	let category = match find_exact(headers, CATEGORY_HEADERS, &claimed) {
		Some(h) => {
			claimed.push(h);
			CategoryPolicy::FromHeader(h.to_string())
		}
		None => CategoryPolicy::Constant(vendor_type.default_category().as_str().to_string()),
	};

	for rule in FIELD_RULES {
		if let Some(h) = find_rule(headers, rule, &claimed) {
			claimed.push(h);
			fields.insert(rule.field, h.to_string());
		}
	}

	// Source columns may overlap canonical fields (e.g. "ins" is both quantity and insertions).
	let sources = SOURCE_RULES
		.iter()
		.filter_map(|(col, names)| find_exact(headers, names, &[]).map(|h| (*col, h.to_string())))
		.collect::<BTreeMap<_, _>>();

	let spec = MappingSpec {
		fields,
		sources,
		category,
	};
	tracing::debug!(?vendor_type, mapping = ?spec, "automatic mapping");
	spec
}

/// Accept a caller-supplied mapping after checking that it addresses the
/// current header set. Any unknown header aborts the pass.
pub fn guided_map(headers: &HeaderSet, spec: MappingSpec) -> Result<MappingSpec, IngestError> {
	if let Some(missing) = spec.referenced_headers().into_iter().find(|h| !headers.contains(h)) {
		return Err(IngestError::MappingAbort(format!(
			"header '{}' is not present in the detected header row",
			missing
		)));
	}
	if spec.fields.contains_key(&CanonicalField::Cat) {
		return Err(IngestError::MappingAbort(
			"category is set through the category policy, not a field assignment".into(),
		));
	}
	if let CategoryPolicy::Constant(c) = &spec.category {
		if c.trim().is_empty() {
			return Err(IngestError::MappingAbort("constant category is blank".into()));
		}
	}
	Ok(spec)
}

/// Canonical category text for a per-row or constant value: known aliases
/// map to the store vocabulary, anything else passes through trimmed.
pub fn canonical_category(text: &str) -> Option<String> {
	let trimmed = text.trim();
	if trimmed.is_empty() {
		return None;
	}
	Some(
		Category::from_alias(trimmed)
			.map(|c| c.as_str().to_string())
			.unwrap_or_else(|| trimmed.to_string()),
	)
}

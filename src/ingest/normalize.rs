//! Raw row to draft record: loose numerics, blank-to-null, cost derivation
//! and geography composition.
//!
//! Every function here is total. Unparseable numbers become `None` and are
//! judged later by the row validator.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::mapping::canonical_category;
use crate::ingest::{CanonicalField, CategoryPolicy, MappingSpec, RawRow, SourceColumn};

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '¢'];

static PLAIN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").expect("static regex"));

/// Parse vendor-formatted numeric text.
///
/// Currency symbols, thousands separators and whitespace are dropped; text
/// wrapped in parentheses is negative (`"$(1,234.56)"` is `-1234.56`).
/// Returns `None` for blank or unparseable text.
pub fn parse_loose_number(raw: &str) -> Option<f64> {
	let cleaned: String = raw
		.chars()
		.filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
		.collect();

	let (negative, digits) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
		Some(inner) => (true, inner),
		None => (false, cleaned.as_str()),
	};

	if !PLAIN_NUMBER.is_match(digits) {
		return None;
	}
	let value: f64 = digits.parse().ok()?;
	if !value.is_finite() {
		return None;
	}
	Some(if negative { -value } else { value })
}

/// A record with every canonical field extracted but not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftRecord {
	pub vendor: Option<String>,
	pub cat: Option<String>,
	pub cost_net: Option<f64>,
	pub description: Option<String>,
	pub unit: Option<String>,
	pub quantity: Option<f64>,
	pub geography: Option<String>,
	pub audience_descriptor: Option<String>,
	pub currency: Option<String>,
	/// Raw fx text kept so the validator can tell "absent" from "unparseable"
	pub fx_rate_text: Option<String>,
	pub fx_rate_to_campaign: Option<f64>,
}

fn text(row: &RawRow, header: Option<&str>) -> Option<String> {
	let value = row.get(header?)?.trim();
	(!value.is_empty()).then(|| value.to_string())
}

fn number(row: &RawRow, header: Option<&str>) -> Option<f64> {
	parse_loose_number(row.get(header?)?)
}

pub fn extract_vendor(row: &RawRow, spec: &MappingSpec) -> Option<String> {
	text(row, spec.header(CanonicalField::Vendor))
}

pub fn extract_category(row: &RawRow, spec: &MappingSpec) -> Option<String> {
	match &spec.category {
		CategoryPolicy::Constant(c) => canonical_category(c),
		CategoryPolicy::FromHeader(h) => canonical_category(row.get(h)?),
	}
}

pub fn extract_description(row: &RawRow, spec: &MappingSpec) -> Option<String> {
	text(row, spec.header(CanonicalField::Description))
}

pub fn extract_unit(row: &RawRow, spec: &MappingSpec) -> Option<String> {
	text(row, spec.header(CanonicalField::Unit))
}

pub fn extract_quantity(row: &RawRow, spec: &MappingSpec) -> Option<f64> {
	number(row, spec.header(CanonicalField::Quantity))
}

pub fn extract_currency(row: &RawRow, spec: &MappingSpec) -> Option<String> {
	text(row, spec.header(CanonicalField::Currency)).map(|c| c.to_uppercase())
}

/// Audience targeting only applies to digital line items.
pub fn extract_audience(row: &RawRow, spec: &MappingSpec, category: Option<&str>) -> Option<String> {
	if category != Some("DIGITAL") {
		return None;
	}
	text(row, spec.header(CanonicalField::AudienceDescriptor))
}

/// Direct geography wins; else `"<market>, <state>"`, or whichever one exists.
pub fn extract_geography(row: &RawRow, spec: &MappingSpec) -> Option<String> {
	if let Some(geo) = text(row, spec.header(CanonicalField::Geography)) {
		return Some(geo);
	}
	let market = text(row, spec.source(SourceColumn::Market));
	let state = text(row, spec.source(SourceColumn::State));
	match (market, state) {
		(Some(m), Some(s)) => Some(format!("{}, {}", m, s)),
		(Some(m), None) => Some(m),
		(None, Some(s)) => Some(s),
		(None, None) => None,
	}
}

fn product(a: Option<f64>, b: Option<f64>) -> Option<f64> {
	let v = a? * b?;
	v.is_finite().then_some(v)
}

/// Derive a cost from rate columns. Fixed order, first success wins:
/// CPM x impressions / 1000, net rate x insertions (or quantity),
/// CPP x GRPs, generic rate x quantity.
pub fn derive_cost(row: &RawRow, spec: &MappingSpec) -> Option<f64> {
	let src = |c| number(row, spec.source(c));
	let quantity = extract_quantity(row, spec);

	product(src(SourceColumn::Cpm), src(SourceColumn::Impressions))
		.map(|v| v / 1000.0)
		.or_else(|| product(src(SourceColumn::NetRate), src(SourceColumn::Insertions).or(quantity)))
		.or_else(|| product(src(SourceColumn::Cpp), src(SourceColumn::Grps)))
		.or_else(|| product(src(SourceColumn::Rate), quantity))
}

/// Direct cost when present and non-zero, otherwise the derived one. When
/// derivation fails the direct value (zero or none) stands.
pub fn extract_cost(row: &RawRow, spec: &MappingSpec) -> Option<f64> {
	let direct = number(row, spec.header(CanonicalField::CostNet));
	match direct {
		Some(v) if v != 0.0 => Some(v),
		_ => derive_cost(row, spec).or(direct),
	}
}

/// Apply a mapping to one row.
pub fn build_draft(row: &RawRow, spec: &MappingSpec) -> DraftRecord {
	let cat = extract_category(row, spec);
	let fx_rate_text = text(row, spec.header(CanonicalField::FxRateToCampaign));
	DraftRecord {
		vendor: extract_vendor(row, spec),
		cost_net: extract_cost(row, spec),
		description: extract_description(row, spec),
		unit: extract_unit(row, spec),
		quantity: extract_quantity(row, spec),
		geography: extract_geography(row, spec),
		audience_descriptor: extract_audience(row, spec, cat.as_deref()),
		currency: extract_currency(row, spec),
		fx_rate_to_campaign: fx_rate_text.as_deref().and_then(parse_loose_number),
		fx_rate_text,
		cat,
	}
}

#[cfg(test)]
#[cfg(feature = "unit-tests")]
mod tests {
	use std::collections::BTreeMap;

	use super::*;

	fn row(cells: &[(&str, &str)]) -> RawRow {
		RawRow {
			sheet_row: 2,
			cells: cells.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
		}
	}

	fn spec(fields: &[(CanonicalField, &str)], sources: &[(SourceColumn, &str)]) -> MappingSpec {
		MappingSpec {
			fields: fields.iter().map(|(f, h)| (*f, h.to_string())).collect(),
			sources: sources.iter().map(|(c, h)| (*c, h.to_string())).collect(),
			category: CategoryPolicy::Constant("DIGITAL".into()),
		}
	}

	#[test]
	fn loose_numbers() {
		assert_eq!(parse_loose_number("$(1,234.56)"), Some(-1234.56));
		assert_eq!(parse_loose_number(""), None);
		assert_eq!(parse_loose_number("1,000"), Some(1000.0));
		assert_eq!(parse_loose_number(" € 12.5 "), Some(12.5));
		assert_eq!(parse_loose_number("(500)"), Some(-500.0));
		assert_eq!(parse_loose_number("-42"), Some(-42.0));
		assert_eq!(parse_loose_number(".5"), Some(0.5));
		assert_eq!(parse_loose_number("1\u{a0}000"), Some(1000.0));
	}

	#[test]
	fn loose_numbers_reject_text() {
		assert_eq!(parse_loose_number("TBD"), None);
		assert_eq!(parse_loose_number("NaN"), None);
		assert_eq!(parse_loose_number("inf"), None);
		assert_eq!(parse_loose_number("(12"), None);
		assert_eq!(parse_loose_number("-"), None);
		assert_eq!(parse_loose_number("1.2.3"), None);
	}

	#[test]
	fn cpm_derivation() {
		let r = row(&[("vendor", "Ad Network"), ("cpm", "10"), ("impressions", "100,000")]);
		let s = spec(
			&[(CanonicalField::Vendor, "vendor")],
			&[(SourceColumn::Cpm, "cpm"), (SourceColumn::Impressions, "impressions")],
		);
		assert_eq!(extract_cost(&r, &s), Some(1000.0));
	}

	#[test]
	fn net_rate_uses_insertions_then_quantity() {
		let r = row(&[("net per unit", "150.00"), ("ins", "3"), ("qty", "7")]);
		let with_ins = spec(
			&[(CanonicalField::Quantity, "qty")],
			&[(SourceColumn::NetRate, "net per unit"), (SourceColumn::Insertions, "ins")],
		);
		assert_eq!(derive_cost(&r, &with_ins), Some(450.0));

		let without_ins = spec(&[(CanonicalField::Quantity, "qty")], &[(SourceColumn::NetRate, "net per unit")]);
		assert_eq!(derive_cost(&r, &without_ins), Some(1050.0));
	}

	#[test]
	fn derivation_skips_steps_with_bad_operands() {
		// CPM present but impressions unparseable: falls through to CPP x GRPs
		let r = row(&[("cpm", "12"), ("imps", "TBD"), ("cpp", "$85"), ("grps", "120")]);
		let s = spec(
			&[],
			&[
				(SourceColumn::Cpm, "cpm"),
				(SourceColumn::Impressions, "imps"),
				(SourceColumn::Cpp, "cpp"),
				(SourceColumn::Grps, "grps"),
			],
		);
		assert_eq!(derive_cost(&r, &s), Some(10200.0));
	}

	#[test]
	fn generic_rate_is_last_resort() {
		let r = row(&[("rate", "25"), ("spots", "12")]);
		let s = spec(&[(CanonicalField::Quantity, "spots")], &[(SourceColumn::Rate, "rate")]);
		assert_eq!(derive_cost(&r, &s), Some(300.0));
	}

	#[test]
	fn direct_cost_wins_unless_zero() {
		let r = row(&[("net", "$500.00"), ("cpm", "10"), ("impressions", "100000")]);
		let mut s = spec(
			&[(CanonicalField::CostNet, "net")],
			&[(SourceColumn::Cpm, "cpm"), (SourceColumn::Impressions, "impressions")],
		);
		assert_eq!(extract_cost(&r, &s), Some(500.0));

		let zero = row(&[("net", "0"), ("cpm", "10"), ("impressions", "100000")]);
		assert_eq!(extract_cost(&zero, &s), Some(1000.0));

		// zero with nothing to derive from stays zero
		s.sources = BTreeMap::new();
		assert_eq!(extract_cost(&zero, &s), Some(0.0));
	}

	#[test]
	fn geography_composition() {
		let s = spec(&[], &[(SourceColumn::Market, "market"), (SourceColumn::State, "state")]);
		assert_eq!(
			extract_geography(&row(&[("market", "Springfield"), ("state", "IL")]), &s),
			Some("Springfield, IL".into())
		);
		assert_eq!(
			extract_geography(&row(&[("market", " "), ("state", "IL")]), &s),
			Some("IL".into())
		);
		assert_eq!(extract_geography(&row(&[("market", ""), ("state", "")]), &s), None);

		let direct = spec(&[(CanonicalField::Geography, "dma")], &[(SourceColumn::Market, "market")]);
		assert_eq!(
			extract_geography(&row(&[("dma", "Chicago"), ("market", "Springfield")]), &direct),
			Some("Chicago".into())
		);
	}

	#[test]
	fn blanks_become_null_and_audience_is_digital_only() {
		let r = row(&[("vendor", " Meta "), ("audience", "A18-34"), ("desc", "  "), ("cur", "usd")]);
		let mut s = spec(
			&[
				(CanonicalField::Vendor, "vendor"),
				(CanonicalField::AudienceDescriptor, "audience"),
				(CanonicalField::Description, "desc"),
				(CanonicalField::Currency, "cur"),
			],
			&[],
		);
		let draft = build_draft(&r, &s);
		assert_eq!(draft.vendor.as_deref(), Some("Meta"));
		assert_eq!(draft.description, None);
		assert_eq!(draft.audience_descriptor.as_deref(), Some("A18-34"));
		assert_eq!(draft.currency.as_deref(), Some("USD"));

		s.category = CategoryPolicy::Constant("BROADCAST".into());
		assert_eq!(build_draft(&r, &s).audience_descriptor, None);
	}

	#[test]
	fn category_from_header_is_canonicalized() {
		let mut s = spec(&[], &[]);
		s.category = CategoryPolicy::FromHeader("channel".into());
		assert_eq!(extract_category(&row(&[("channel", "ooh")]), &s).as_deref(), Some("OOH_DOOH"));
		assert_eq!(extract_category(&row(&[("channel", "")]), &s), None);
	}
}

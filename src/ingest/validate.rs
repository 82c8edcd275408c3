//! Row validation and the review-then-commit record batch.

use serde::{Deserialize, Serialize};

use crate::ingest::normalize::{DraftRecord, build_draft};
use crate::ingest::{IngestError, MappingSpec, RawRow};
use crate::store::{LineItemInsert, LineItemStore};

/// A row-scoped validation failure. Non-fatal; blocks commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
	/// 1-based position of the row in the table body
	pub row: usize,
	pub message: String,
}

impl Issue {
	fn new(row: usize, what: &str) -> Self {
		Self {
			row,
			message: format!("Row {}: {}", row, what),
		}
	}
}

impl std::fmt::Display for Issue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.message)
	}
}

/// Canonical line item ready for the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedRecord {
	pub vendor: String,
	pub cat: String,
	/// Finite and non-negative
	pub cost_net: f64,
	pub description: Option<String>,
	pub unit: Option<String>,
	pub quantity: Option<f64>,
	pub geography: Option<String>,
	pub audience_descriptor: Option<String>,
	pub currency: Option<String>,
	/// Positive when present
	pub fx_rate_to_campaign: Option<f64>,
}

/// Check a draft's required fields. Every failing check is reported; a row
/// with any issue is not emitted.
pub fn validate_draft(draft: DraftRecord, row: usize) -> Result<MappedRecord, Vec<Issue>> {
	let mut issues = Vec::new();

	if draft.vendor.is_none() {
		issues.push(Issue::new(row, "vendor missing"));
	}
	if draft.cat.is_none() {
		issues.push(Issue::new(row, "category missing"));
	}
	let cost = draft.cost_net.filter(|c| c.is_finite() && *c >= 0.0);
	if cost.is_none() {
		issues.push(Issue::new(row, "cost not found"));
	}
	let fx_ok = match (&draft.fx_rate_text, draft.fx_rate_to_campaign) {
		(None, _) => true,
		(Some(_), Some(fx)) => fx > 0.0,
		(Some(_), None) => false,
	};
	if !fx_ok {
		issues.push(Issue::new(row, "fx rate must be a positive number"));
	}

	match (draft.vendor, draft.cat, cost) {
		(Some(vendor), Some(cat), Some(cost_net)) if issues.is_empty() => Ok(MappedRecord {
			vendor,
			cat,
			cost_net,
			description: draft.description,
			unit: draft.unit,
			quantity: draft.quantity,
			geography: draft.geography,
			audience_descriptor: draft.audience_descriptor,
			currency: draft.currency,
			fx_rate_to_campaign: draft.fx_rate_to_campaign,
		}),
		_ => Err(issues),
	}
}

/// Records that passed validation plus every issue found, in row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedBatch {
	pub records: Vec<MappedRecord>,
	pub issues: Vec<Issue>,
}

impl MappedBatch {
	pub fn is_committable(&self) -> bool {
		self.issues.is_empty()
	}

	/// Forward the batch to the line-item store in one write.
	///
	/// Refused without touching the store while any issue is outstanding. An
	/// empty batch commits as zero rows without a store call.
	#[tracing::instrument(skip(self, store), fields(records = self.records.len(), issues = self.issues.len()))]
	pub async fn commit(&self, campaign_id: &str, store: &dyn LineItemStore) -> Result<usize, IngestError> {
		if !self.is_committable() {
			tracing::warn!("commit refused while row issues are outstanding");
			return Err(IngestError::CommitBlocked {
				issues: self.issues.len(),
			});
		}
		if self.records.is_empty() {
			tracing::warn!("nothing to commit");
			return Ok(0);
		}

		let items: Vec<LineItemInsert> = self
			.records
			.iter()
			.map(|r| LineItemInsert::from_record(campaign_id, r))
			.collect();

		let inserted = store.create_many(&items).await?;
		tracing::info!(inserted, "line items committed");
		Ok(inserted)
	}
}

/// Normalize and validate every body row, collecting issues without aborting.
pub fn map_rows(rows: &[RawRow], spec: &MappingSpec) -> MappedBatch {
	let mut batch = MappedBatch::default();
	for (i, row) in rows.iter().enumerate() {
		match validate_draft(build_draft(row, spec), i + 1) {
			Ok(record) => batch.records.push(record),
			Err(mut issues) => batch.issues.append(&mut issues),
		}
	}
	tracing::debug!(records = batch.records.len(), issues = batch.issues.len(), "rows mapped");
	batch
}

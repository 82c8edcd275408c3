//! Collaborator interfaces: the line-item store written to on commit and the
//! campaign store read for display context.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::MappedRecord;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("store rejected the write: {0}")]
	Rejected(String),
}

/// Row shape accepted by the line-item store's create-many operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInsert {
	pub campaign_id: String,
	pub cat: String,
	/// Sub-groups are assigned after import; always null here.
	pub sub_group_id: Option<i64>,
	pub vendor: String,
	pub description: Option<String>,
	pub unit: Option<String>,
	pub quantity: Option<f64>,
	pub cost_net: f64,
	pub geography: Option<String>,
	pub audience_descriptor: Option<String>,
	pub currency: Option<String>,
	pub fx_rate_to_campaign: Option<f64>,
}

impl LineItemInsert {
	pub fn from_record(campaign_id: &str, record: &MappedRecord) -> Self {
		Self {
			campaign_id: campaign_id.to_string(),
			cat: record.cat.clone(),
			sub_group_id: None,
			vendor: record.vendor.clone(),
			description: record.description.clone(),
			unit: record.unit.clone(),
			quantity: record.quantity,
			cost_net: record.cost_net,
			geography: record.geography.clone(),
			audience_descriptor: record.audience_descriptor.clone(),
			currency: record.currency.clone(),
			fx_rate_to_campaign: record.fx_rate_to_campaign,
		}
	}
}

/// Campaign context shown next to a preview. Not consumed by mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
	pub id: String,
	pub name: String,
	pub currency: String,
	pub geography: Option<String>,
}

/// Persistence for committed line items. Implemented by [`PgStore`] and
/// [`MemoryStore`]; tests substitute their own doubles.
#[async_trait]
pub trait LineItemStore: Send + Sync + 'static {
	/// Insert every item or none of them; returns the number inserted.
	async fn create_many(&self, items: &[LineItemInsert]) -> Result<usize, StoreError>;
	/// Lightweight readiness check.
	async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync + 'static {
	async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError>;
}

#[cfg(test)]
#[cfg(feature = "unit-tests")]
mod tests {
	use super::*;

	#[test]
	fn insert_row_from_record() {
		let record = MappedRecord {
			vendor: "Daily Gazette".into(),
			cat: "PRINT".into(),
			cost_net: 450.0,
			description: None,
			unit: None,
			quantity: Some(3.0),
			geography: Some("Springfield, IL".into()),
			audience_descriptor: None,
			currency: None,
			fx_rate_to_campaign: None,
		};
		let item = LineItemInsert::from_record("42", &record);
		assert_eq!(item.campaign_id, "42");
		assert_eq!(item.sub_group_id, None);
		assert_eq!(item.quantity, Some(3.0));

		let json = serde_json::to_value(&item).expect("serialize");
		assert!(json["sub_group_id"].is_null());
		assert_eq!(json["cat"], "PRINT");
	}
}

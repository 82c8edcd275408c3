use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::store::{Campaign, CampaignStore, LineItemInsert, LineItemStore, StoreError};

/// Process-local store for development runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
	items: Mutex<Vec<LineItemInsert>>,
	campaigns: Mutex<Vec<Campaign>>,
	create_calls: AtomicUsize,
	reject_with: Option<String>,
}

impl MemoryStore {
	/// A store whose writes always fail with `message`.
	pub fn rejecting(message: impl Into<String>) -> Self {
		Self {
			reject_with: Some(message.into()),
			..Self::default()
		}
	}

	pub fn with_campaign(self, campaign: Campaign) -> Self {
		self.campaigns
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.push(campaign);
		self
	}

	/// Snapshot of everything committed so far.
	pub fn line_items(&self) -> Vec<LineItemInsert> {
		self.items.lock().unwrap_or_else(|e| e.into_inner()).clone()
	}

	/// Number of create-many calls that reached the store, failed or not.
	pub fn create_calls(&self) -> usize {
		self.create_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl LineItemStore for MemoryStore {
	async fn create_many(&self, items: &[LineItemInsert]) -> Result<usize, StoreError> {
		self.create_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(msg) = &self.reject_with {
			return Err(StoreError::Rejected(msg.clone()));
		}
		self.items
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.extend_from_slice(items);
		Ok(items.len())
	}

	async fn ping(&self) -> Result<(), StoreError> {
		Ok(())
	}
}

#[async_trait]
impl CampaignStore for MemoryStore {
	async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
		Ok(self
			.campaigns
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.iter()
			.find(|c| c.id == id)
			.cloned())
	}
}

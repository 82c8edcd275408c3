use std::sync::Arc;

use crate::ingest::pipeline::DEFAULT_PREVIEW_ROWS;
use crate::observability::MetricsRegistry;
use crate::store::{CampaignStore, LineItemStore, MemoryStore};

/// Application state passed to handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
	pub line_items: Arc<dyn LineItemStore>,
	pub campaigns: Arc<dyn CampaignStore>,
	pub metrics: Arc<MetricsRegistry>,
	pub preview_rows: usize,
}

impl AppState {
	pub fn new(
		line_items: Arc<dyn LineItemStore>,
		campaigns: Arc<dyn CampaignStore>,
		metrics: Arc<MetricsRegistry>,
	) -> Self {
		Self {
			line_items,
			campaigns,
			metrics,
			preview_rows: DEFAULT_PREVIEW_ROWS,
		}
	}

	/// Both collaborators backed by one shared [`MemoryStore`].
	pub fn in_memory(store: Arc<MemoryStore>) -> prometheus::Result<Self> {
		Ok(Self::new(store.clone(), store, Arc::new(MetricsRegistry::new()?)))
	}

	pub fn with_preview_rows(mut self, rows: usize) -> Self {
		self.preview_rows = rows;
		self
	}
}

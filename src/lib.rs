pub mod config;
pub mod health;
pub mod ingest;
pub mod observability;
pub mod state;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::config::Settings;
use crate::observability::MetricsRegistry;
use crate::state::AppState;
use crate::store::{LineItemStore, MemoryStore, PgStore};

/// HTTP surface: preview and commit uploads, campaign context, health and metrics.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
	Router::new()
		.route("/campaigns/{campaign_id}", get(ingest::campaign_context))
		.route("/campaigns/{campaign_id}/preview", post(ingest::preview_upload))
		.route("/campaigns/{campaign_id}/commit", post(ingest::commit_upload))
		.route("/health", get(health::db_health))
		.route("/metrics", get(health::metrics_handler))
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.with_state(state)
}

/// Build handler state from settings. Without a database URL, or when
/// `memory_store` is set, commits land in a process-local store.
pub async fn build_state(settings: &Settings, memory_store: bool) -> anyhow::Result<AppState> {
	let metrics = Arc::new(MetricsRegistry::new()?);

	let state = match (&settings.database_url, memory_store) {
		(Some(url), false) => {
			let store = Arc::new(PgStore::connect_lazy(url.as_str())?);
			if let Err(e) = store.ensure_schema().await {
				// the service still starts; /health reports the outage
				tracing::warn!(error = %e, "could not apply line-item schema");
			}
			AppState::new(store.clone(), store, metrics)
		}
		_ => {
			tracing::info!("using in-memory line-item store");
			let store = Arc::new(MemoryStore::default());
			AppState::new(store.clone(), store, metrics)
		}
	};

	Ok(state.with_preview_rows(settings.preview_rows))
}

/// Store for one-shot CLI commits. Requires a database URL.
pub async fn commit_store(settings: &Settings) -> anyhow::Result<Arc<dyn LineItemStore>> {
	let Some(url) = &settings.database_url else {
		anyhow::bail!("commit needs a database; set MPI_DATABASE_URL");
	};
	let store = PgStore::connect(url.as_str())
		.await
		.with_context(|| format!("connecting to {}", url.host_str().unwrap_or("database")))?;
	Ok(Arc::new(store))
}

/// Serve the router until the process is stopped.
pub async fn run(settings: Settings, state: AppState) -> anyhow::Result<()> {
	let addr = format!("{}:{}", settings.host, settings.port);
	let app = router(state, settings.max_upload_bytes);

	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!(%addr, "ingest service listening");
	axum::serve(listener, app).await?;
	Ok(())
}

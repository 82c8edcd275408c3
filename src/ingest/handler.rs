use std::time::Instant;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ingest::{IngestError, MappingMode, Overrides, Preview, ingest_bytes};
use crate::state::AppState;
use crate::store::Campaign;

/// JSON carried in the optional `options` multipart field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
	#[serde(flatten)]
	pub overrides: Overrides,
	pub mapping: MappingMode,
}

struct UploadForm {
	filename: String,
	data: Vec<u8>,
	options: UploadOptions,
}

#[derive(Serialize)]
struct PreviewResponse {
	campaign: Option<Campaign>,
	preview: Preview,
}

fn bad_request(msg: String) -> Response {
	(StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

/// Map pipeline failures onto HTTP statuses. Bodies carry the error verbatim.
pub fn error_response(err: &IngestError) -> Response {
	let status = match err {
		IngestError::FileFormat(_)
		| IngestError::UnknownSheet(_)
		| IngestError::InvalidOverride(_)
		| IngestError::EmptyRegion
		| IngestError::MappingAbort(_) => StatusCode::UNPROCESSABLE_ENTITY,
		IngestError::ParserUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
		IngestError::CommitBlocked { .. } => StatusCode::CONFLICT,
		IngestError::Store(_) => StatusCode::BAD_GATEWAY,
	};
	(status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Read the `file` part (required) and the `options` part (optional JSON).
async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, Response> {
	let mut file: Option<(String, Vec<u8>)> = None;
	let mut options = UploadOptions::default();

	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(|e| bad_request(format!("failed to read multipart body: {}", e)))?
	{
		let name = field.name().map(str::to_string);
		match name.as_deref() {
			Some("file") => {
				let filename = field.file_name().unwrap_or_default().to_string();
				let bytes = field
					.bytes()
					.await
					.map_err(|e| bad_request(format!("failed to read file part: {}", e)))?;
				file = Some((filename, bytes.to_vec()));
			}
			Some("options") => {
				let text = field
					.text()
					.await
					.map_err(|e| bad_request(format!("failed to read options part: {}", e)))?;
				options = serde_json::from_str(&text).map_err(|e| bad_request(format!("invalid options: {}", e)))?;
			}
			_ => {}
		}
	}

	let (filename, data) = file.ok_or_else(|| bad_request("missing 'file' part".to_string()))?;
	Ok(UploadForm {
		filename,
		data,
		options,
	})
}

/// Decode and map an upload off the async runtime, recording ingest metrics.
async fn run_pipeline(state: &AppState, form: UploadForm) -> Result<Preview, Response> {
	let metrics = state.metrics.clone();
	let preview_rows = state.preview_rows;
	metrics.ingest_requests_total.inc();
	metrics.ingest_bytes_total.inc_by(form.data.len() as f64);

	let start = Instant::now();
	let joined = tokio::task::spawn_blocking(move || {
		ingest_bytes(
			&form.data,
			&form.filename,
			&form.options.overrides,
			&form.options.mapping,
			preview_rows,
		)
	})
	.await;
	metrics.ingest_duration_seconds.observe(start.elapsed().as_secs_f64());

	match joined {
		Ok(Ok(preview)) => {
			metrics.ingest_rows_total.inc_by(preview.total_rows as u64);
			metrics.ingest_records_total.inc_by(preview.batch.records.len() as u64);
			metrics.ingest_issues_total.inc_by(preview.batch.issues.len() as u64);
			Ok(preview)
		}
		Ok(Err(e)) => {
			metrics.ingest_errors_total.inc();
			tracing::warn!(error = %e, "upload rejected");
			Err(error_response(&e))
		}
		Err(e) => {
			metrics.ingest_errors_total.inc();
			tracing::error!(error = %e, "ingest task failed");
			Err((StatusCode::INTERNAL_SERVER_ERROR, format!("ingest task failed: {}", e)).into_response())
		}
	}
}

async fn lookup_campaign(state: &AppState, campaign_id: &str) -> Option<Campaign> {
	match state.campaigns.get_campaign(campaign_id).await {
		Ok(c) => c,
		Err(e) => {
			// display context only; a lookup failure must not block the preview
			tracing::warn!(campaign_id = %campaign_id, error = %e, "campaign lookup failed");
			None
		}
	}
}

/// `POST /campaigns/{campaign_id}/preview`: headers, sample rows, mapping,
/// records and issues for review. Nothing is written.
pub async fn preview_upload(
	State(state): State<AppState>,
	Path(campaign_id): Path<String>,
	multipart: Multipart,
) -> Response {
	let form = match read_upload(multipart).await {
		Ok(f) => f,
		Err(resp) => return resp,
	};
	let preview = match run_pipeline(&state, form).await {
		Ok(p) => p,
		Err(resp) => return resp,
	};
	let campaign = lookup_campaign(&state, &campaign_id).await;
	(StatusCode::OK, Json(PreviewResponse { campaign, preview })).into_response()
}

/// `POST /campaigns/{campaign_id}/commit`: re-run the pipeline on the same
/// upload and write the batch when it has no issues.
pub async fn commit_upload(
	State(state): State<AppState>,
	Path(campaign_id): Path<String>,
	multipart: Multipart,
) -> Response {
	let form = match read_upload(multipart).await {
		Ok(f) => f,
		Err(resp) => return resp,
	};
	let preview = match run_pipeline(&state, form).await {
		Ok(p) => p,
		Err(resp) => return resp,
	};

	match preview.batch.commit(&campaign_id, state.line_items.as_ref()).await {
		Ok(inserted) => {
			state.metrics.commits_total.inc();
			(StatusCode::OK, Json(json!({ "inserted": inserted }))).into_response()
		}
		Err(e @ IngestError::CommitBlocked { .. }) => (
			StatusCode::CONFLICT,
			Json(json!({ "error": e.to_string(), "issues": preview.batch.issues })),
		)
			.into_response(),
		Err(e) => {
			state.metrics.commit_failures_total.inc();
			tracing::error!(campaign_id = %campaign_id, error = %e, "commit failed");
			error_response(&e)
		}
	}
}

/// `GET /campaigns/{campaign_id}`: campaign context for display.
pub async fn campaign_context(State(state): State<AppState>, Path(campaign_id): Path<String>) -> Response {
	match state.campaigns.get_campaign(&campaign_id).await {
		Ok(Some(c)) => (StatusCode::OK, Json(c)).into_response(),
		Ok(None) => (StatusCode::NOT_FOUND, Json(json!({ "error": "campaign not found" }))).into_response(),
		Err(e) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response(),
	}
}

use prometheus::{Counter, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "mediaplan";

/// Prometheus metrics for uploads and commits.
pub struct MetricsRegistry {
	registry: Registry,

	pub ingest_requests_total: IntCounter,
	pub ingest_errors_total: IntCounter,
	pub ingest_bytes_total: Counter,
	pub ingest_rows_total: IntCounter,
	pub ingest_records_total: IntCounter,
	pub ingest_issues_total: IntCounter,
	pub ingest_duration_seconds: Histogram,

	pub commits_total: IntCounter,
	pub commit_failures_total: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntCounter> {
	let c = IntCounter::with_opts(Opts::new(name, help).namespace(NAMESPACE))?;
	registry.register(Box::new(c.clone()))?;
	Ok(c)
}

impl MetricsRegistry {
	pub fn new() -> prometheus::Result<Self> {
		let registry = Registry::new();

		let ingest_bytes_total =
			Counter::with_opts(Opts::new("ingest_bytes_total", "Total upload bytes received").namespace(NAMESPACE))?;
		registry.register(Box::new(ingest_bytes_total.clone()))?;

		let ingest_duration_seconds = Histogram::with_opts(
			HistogramOpts::new("ingest_duration_seconds", "Time to decode and map one upload")
				.namespace(NAMESPACE)
				.buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
		)?;
		registry.register(Box::new(ingest_duration_seconds.clone()))?;

		Ok(Self {
			ingest_requests_total: counter(&registry, "ingest_requests_total", "Uploads received")?,
			ingest_errors_total: counter(&registry, "ingest_errors_total", "Uploads rejected before mapping finished")?,
			ingest_rows_total: counter(&registry, "ingest_rows_total", "Body rows read from uploads")?,
			ingest_records_total: counter(&registry, "ingest_records_total", "Rows mapped to line-item records")?,
			ingest_issues_total: counter(&registry, "ingest_issues_total", "Row validation issues reported")?,
			commits_total: counter(&registry, "commits_total", "Batches written to the line-item store")?,
			commit_failures_total: counter(&registry, "commit_failures_total", "Batches the line-item store refused")?,
			ingest_bytes_total,
			ingest_duration_seconds,
			registry,
		})
	}

	/// Encode metrics in Prometheus text format
	pub fn encode(&self) -> String {
		let encoder = TextEncoder::new();
		let metric_families = self.registry.gather();
		match encoder.encode_to_string(&metric_families) {
			Ok(s) => s,
			Err(e) => {
				tracing::error!(error = %e, "failed to encode metrics");
				String::new()
			}
		}
	}
}

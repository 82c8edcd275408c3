//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::env;

use tokio::time::{Duration, sleep};

pub const BOUNDARY: &str = "----MEDIAPLAN_TEST_BOUNDARY";

/// Database-backed tests run only when RUN_DB_INTEGRATION_TESTS is set and
/// MPI_TEST_DATABASE_URL points at a disposable Postgres.
pub fn check_db_enabled() -> Option<String> {
	if env::var("RUN_DB_INTEGRATION_TESTS").is_err() {
		eprintln!("Skipping database integration test; set RUN_DB_INTEGRATION_TESTS=1 to enable");
		return None;
	}
	match env::var("MPI_TEST_DATABASE_URL") {
		Ok(url) if !url.is_empty() => Some(url),
		_ => {
			eprintln!("RUN_DB_INTEGRATION_TESTS is set but MPI_TEST_DATABASE_URL is empty; skipping");
			None
		}
	}
}

/// Wait for Postgres to accept connections with a maximum retry count.
pub async fn wait_for_postgres(connection_string: &str, max_retries: u32) -> Result<sqlx::PgPool, String> {
	let mut attempts = 0;
	loop {
		match sqlx::PgPool::connect(connection_string).await {
			Ok(pool) => return Ok(pool),
			Err(e) => {
				attempts += 1;
				if attempts >= max_retries {
					return Err(format!("Postgres did not become ready after {} attempts: {}", max_retries, e));
				}
				sleep(Duration::from_secs(1)).await;
			}
		}
	}
}

/// Build a multipart body with a `file` part and an optional `options` part.
pub fn multipart_body(filename: &str, data: &[u8], options: Option<&str>) -> Vec<u8> {
	let mut body = Vec::new();
	body.extend_from_slice(
		format!(
			"--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
			b = BOUNDARY,
			f = filename
		)
		.as_bytes(),
	);
	body.extend_from_slice(data);
	body.extend_from_slice(b"\r\n");
	if let Some(json) = options {
		body.extend_from_slice(
			format!(
				"--{b}\r\nContent-Disposition: form-data; name=\"options\"\r\nContent-Type: application/json\r\n\r\n{j}\r\n",
				b = BOUNDARY,
				j = json
			)
			.as_bytes(),
		);
	}
	body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
	body
}

/// A two-sheet media plan: a cover sheet first, then a digital plan whose
/// header sits below a title and a blank row.
pub fn digital_plan_xlsx() -> Vec<u8> {
	use rust_xlsxwriter::Workbook;

	let mut workbook = Workbook::new();

	let cover = workbook.add_worksheet();
	cover.set_name("Cover").expect("name");
	cover.write(0, 0, "Prepared for Acme Outdoor Co.").expect("write");

	let plan = workbook.add_worksheet();
	plan.set_name("Digital").expect("name");
	plan.write(0, 0, "Q3 Digital Media Plan for the Spring campaign").expect("write");
	for (col, label) in ["Vendor", "Placement", "Impressions", "CPM", "Net Cost", "Currency"]
		.iter()
		.enumerate()
	{
		plan.write(2, col as u16, *label).expect("write");
	}
	plan.write(3, 0, "Streamly").expect("write");
	plan.write(3, 1, "Pre-roll").expect("write");
	plan.write(3, 2, 250000.0).expect("write");
	plan.write(3, 3, 12.0).expect("write");
	plan.write(3, 5, "usd").expect("write");
	plan.write(4, 0, "Newsly").expect("write");
	plan.write(4, 1, "Display 300x250").expect("write");
	plan.write(4, 2, 100000.0).expect("write");
	plan.write(4, 3, 8.0).expect("write");
	plan.write(4, 4, "$1,234.00").expect("write");
	plan.write(4, 5, "USD").expect("write");

	workbook.save_to_buffer().expect("xlsx buffer")
}

/// One print row whose cost is a currency-formatted number rather than text.
pub fn formatted_cost_xlsx() -> Vec<u8> {
	use rust_xlsxwriter::{Format, Workbook};

	let mut workbook = Workbook::new();
	let sheet = workbook.add_worksheet();
	sheet.set_name("Print").expect("name");
	for (col, label) in ["Vendor", "City", "State", "Net Cost"].iter().enumerate() {
		sheet.write(0, col as u16, *label).expect("write");
	}
	let whole_dollars = Format::new().set_num_format("$#,##0");
	sheet.write(1, 0, "Daily Gazette").expect("write");
	sheet.write(1, 1, "Springfield").expect("write");
	sheet.write(1, 2, "IL").expect("write");
	sheet.write_number_with_format(1, 3, 1234.567, &whole_dollars).expect("write");

	workbook.save_to_buffer().expect("xlsx buffer")
}

//! PostgreSQL adapter tests. Need a disposable database:
//! `RUN_DB_INTEGRATION_TESTS=1 MPI_TEST_DATABASE_URL=postgres://... cargo test --features integration-tests`

mod common;

#[cfg(feature = "integration-tests")]
mod pg_tests {
	use mediaplan_ingest::store::{CampaignStore, LineItemInsert, LineItemStore, PgStore};

	use super::common;

	fn item(campaign_id: &str, vendor: &str, cost_net: f64) -> LineItemInsert {
		LineItemInsert {
			campaign_id: campaign_id.into(),
			cat: "PRINT".into(),
			sub_group_id: None,
			vendor: vendor.into(),
			description: None,
			unit: None,
			quantity: Some(3.0),
			cost_net,
			geography: Some("Springfield, IL".into()),
			audience_descriptor: None,
			currency: Some("USD".into()),
			fx_rate_to_campaign: None,
		}
	}

	async fn seeded_store(url: &str, campaign_id: &str) -> (PgStore, sqlx::PgPool) {
		let pool = common::wait_for_postgres(url, 10).await.expect("postgres ready");
		let store = PgStore::new(pool.clone());
		store.ensure_schema().await.expect("schema");
		sqlx::query("INSERT INTO campaign (id, name, currency) VALUES ($1, 'Integration', 'USD') ON CONFLICT (id) DO NOTHING")
			.bind(campaign_id)
			.execute(&pool)
			.await
			.expect("seed campaign");
		sqlx::query("DELETE FROM line_item WHERE campaign_id = $1")
			.bind(campaign_id)
			.execute(&pool)
			.await
			.expect("clear line items");
		(store, pool)
	}

	#[tokio::test]
	async fn create_many_inserts_every_row() {
		let Some(url) = common::check_db_enabled() else {
			return;
		};
		let (store, pool) = seeded_store(&url, "it-insert").await;

		store.ping().await.expect("ping");
		let inserted = store
			.create_many(&[item("it-insert", "Daily Gazette", 450.0), item("it-insert", "Evening Post", 120.0)])
			.await
			.expect("insert");
		assert_eq!(inserted, 2);

		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM line_item WHERE campaign_id = $1")
			.bind("it-insert")
			.fetch_one(&pool)
			.await
			.expect("count");
		assert_eq!(count, 2);

		let campaign = store.get_campaign("it-insert").await.expect("lookup").expect("campaign exists");
		assert_eq!(campaign.currency, "USD");
	}

	#[tokio::test]
	async fn failing_row_rolls_back_the_batch() {
		let Some(url) = common::check_db_enabled() else {
			return;
		};
		let (store, pool) = seeded_store(&url, "it-rollback").await;

		// negative cost violates the table's check constraint
		let result = store
			.create_many(&[item("it-rollback", "Daily Gazette", 450.0), item("it-rollback", "Broken", -1.0)])
			.await;
		assert!(result.is_err());

		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM line_item WHERE campaign_id = $1")
			.bind("it-rollback")
			.fetch_one(&pool)
			.await
			.expect("count");
		assert_eq!(count, 0);
	}
}

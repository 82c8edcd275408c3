use async_trait::async_trait;
use sqlx::PgPool;

use crate::store::{Campaign, CampaignStore, LineItemInsert, LineItemStore, StoreError};

/// Tables the store reads and writes. Applied by [`PgStore::ensure_schema`]
/// for development databases; production schemas are managed elsewhere.
pub const SCHEMA: &[&str] = &[
	"CREATE TABLE IF NOT EXISTS campaign (
		id TEXT PRIMARY KEY,
		name TEXT NOT NULL,
		currency TEXT NOT NULL,
		geography TEXT
	)",
	"CREATE TABLE IF NOT EXISTS line_item (
		id BIGSERIAL PRIMARY KEY,
		campaign_id TEXT NOT NULL REFERENCES campaign(id),
		cat TEXT NOT NULL,
		sub_group_id BIGINT,
		vendor TEXT NOT NULL,
		description TEXT,
		unit TEXT,
		quantity DOUBLE PRECISION,
		cost_net DOUBLE PRECISION NOT NULL CHECK (cost_net >= 0),
		geography TEXT,
		audience_descriptor TEXT,
		currency TEXT,
		fx_rate_to_campaign DOUBLE PRECISION CHECK (fx_rate_to_campaign > 0),
		created_at TIMESTAMPTZ NOT NULL DEFAULT now()
	)",
];

const INSERT_LINE_ITEM: &str = "INSERT INTO line_item (
	campaign_id, cat, sub_group_id, vendor, description, unit, quantity,
	cost_net, geography, audience_descriptor, currency, fx_rate_to_campaign
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

/// PostgreSQL-backed line-item and campaign store.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Connect helper using a DATABASE_URL-like string
	pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
		let pool = PgPool::connect(database_url).await?;
		Ok(Self::new(pool))
	}

	/// Build a store whose pool connects on first use, so the service can
	/// start before the database is reachable.
	pub fn connect_lazy(database_url: &str) -> Result<Self, StoreError> {
		let pool = PgPool::connect_lazy(database_url)?;
		Ok(Self::new(pool))
	}

	pub async fn ensure_schema(&self) -> Result<(), StoreError> {
		for stmt in SCHEMA {
			sqlx::query(stmt).execute(&self.pool).await?;
		}
		Ok(())
	}
}

#[async_trait]
impl LineItemStore for PgStore {
	/// All rows go in one transaction; any failure rolls the whole batch back.
	async fn create_many(&self, items: &[LineItemInsert]) -> Result<usize, StoreError> {
		if items.is_empty() {
			return Ok(0);
		}

		let mut tx = self.pool.begin().await?;
		for item in items {
			sqlx::query(INSERT_LINE_ITEM)
				.bind(&item.campaign_id)
				.bind(&item.cat)
				.bind(item.sub_group_id)
				.bind(&item.vendor)
				.bind(&item.description)
				.bind(&item.unit)
				.bind(item.quantity)
				.bind(item.cost_net)
				.bind(&item.geography)
				.bind(&item.audience_descriptor)
				.bind(&item.currency)
				.bind(item.fx_rate_to_campaign)
				.execute(&mut *tx)
				.await?;
		}
		tx.commit().await?;
		Ok(items.len())
	}

	async fn ping(&self) -> Result<(), StoreError> {
		// We don't need the returned row; success indicates connectivity.
		sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
		Ok(())
	}
}

#[async_trait]
impl CampaignStore for PgStore {
	async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
		let campaign = sqlx::query_as::<_, Campaign>("SELECT id, name, currency, geography FROM campaign WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;
		Ok(campaign)
	}
}

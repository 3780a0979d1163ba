use crate::core::ListingFilter;
use crate::models::{Listing, NewListing};
use crate::services::store::{ListingStore, StoreError};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;

const LISTING_COLUMNS: &str = "id, user_id, title, description, city, state, zip_code, type, \
     offered_skill, wanted_skill, image, created_at";

/// PostgreSQL-backed listing store
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Build the filtered listing query
    pub fn search_query(filter: &ListingFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM listings", LISTING_COLUMNS));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY created_at DESC, id DESC");
        qb
    }
}

impl ListingStore for PostgresClient {
    async fn find_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
        let mut qb = Self::search_query(filter);
        let listings = qb.build_query_as::<Listing>().fetch_all(&self.pool).await?;

        tracing::debug!("Filter {:?} matched {} listings", filter, listings.len());

        Ok(listings)
    }

    async fn get_listing(&self, id: i64) -> Result<Option<Listing>, StoreError> {
        let query = format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS);

        let listing = sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    async fn insert_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let query = format!(
            r#"
            INSERT INTO listings
                (user_id, title, description, city, state, zip_code, type, offered_skill, wanted_skill, image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            RETURNING {}
            "#,
            LISTING_COLUMNS
        );

        let created = sqlx::query_as::<_, Listing>(&query)
            .bind(listing.user_id)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(&listing.city)
            .bind(&listing.state)
            .bind(&listing.zip_code)
            .bind(listing.listing_type)
            .bind(listing.offered_skill)
            .bind(listing.wanted_skill)
            .bind(&listing.image)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Created listing {} for user {}", created.id, created.user_id);

        Ok(created)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

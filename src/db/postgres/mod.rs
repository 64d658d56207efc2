pub mod connection;
pub mod queries;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::backend::DatabaseBackend;
use crate::models::{NewProperty, NewUser, Property, PropertyListing, Reservation, User};
use crate::query::{build_property_search_query, PropertyFilter};

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseBackend for PostgresBackend {
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>> {
        queries::get_user_with_email(&self.pool, email).await
    }

    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>> {
        queries::get_user_with_id(&self.pool, id).await
    }

    async fn add_user(&self, user: &NewUser) -> Result<User> {
        queries::add_user(&self.pool, user).await
    }

    async fn get_all_reservations(&self, guest_id: i32, limit: i64) -> Result<Vec<Reservation>> {
        queries::get_all_reservations(&self.pool, guest_id, limit).await
    }

    async fn get_all_properties(
        &self,
        filter: &PropertyFilter,
        limit: i64,
    ) -> Result<Vec<PropertyListing>> {
        let query = build_property_search_query(filter, Some(limit));
        queries::execute_property_search(&self.pool, &query).await
    }

    async fn add_property(&self, property: &NewProperty) -> Result<Property> {
        queries::add_property(&self.pool, property).await
    }

    async fn test_connection(&self) -> Result<()> {
        connection::test_connection(&self.pool).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

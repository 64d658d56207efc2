use anyhow::Result;
use async_trait::async_trait;
use std::time::Instant;

use crate::db::{Database, DatabaseBackend};
use crate::metrics::registry::{
    DATABASE_QUERIES_TOTAL, DATABASE_QUERY_DURATION_SECONDS, DATABASE_QUERY_ERRORS_TOTAL,
};
use crate::models::{NewProperty, NewUser, Property, PropertyListing, Reservation, User};
use crate::query::PropertyFilter;

/// A thin wrapper around a DatabaseBackend that records basic Prometheus metrics
/// for query counts and durations.
pub struct InstrumentedDatabase {
    inner: Database,
}

impl InstrumentedDatabase {
    pub fn new(inner: Database) -> Self {
        Self { inner }
    }

    fn observe<T>(&self, query_type: &'static str, start: Instant, res: &Result<T>) {
        let seconds = start.elapsed().as_secs_f64();
        if res.is_err() {
            DATABASE_QUERY_ERRORS_TOTAL
                .with_label_values(&[query_type])
                .inc();
        }
        DATABASE_QUERIES_TOTAL
            .with_label_values(&[query_type])
            .inc();
        DATABASE_QUERY_DURATION_SECONDS
            .with_label_values(&[query_type])
            .observe(seconds);
    }
}

#[async_trait]
impl DatabaseBackend for InstrumentedDatabase {
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>> {
        let start = Instant::now();
        let res = self.inner.get_user_with_email(email).await;
        self.observe("select", start, &res);
        res
    }

    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>> {
        let start = Instant::now();
        let res = self.inner.get_user_with_id(id).await;
        self.observe("select", start, &res);
        res
    }

    async fn add_user(&self, user: &NewUser) -> Result<User> {
        let start = Instant::now();
        let res = self.inner.add_user(user).await;
        self.observe("insert", start, &res);
        res
    }

    async fn get_all_reservations(&self, guest_id: i32, limit: i64) -> Result<Vec<Reservation>> {
        let start = Instant::now();
        let res = self.inner.get_all_reservations(guest_id, limit).await;
        self.observe("select", start, &res);
        res
    }

    async fn get_all_properties(
        &self,
        filter: &PropertyFilter,
        limit: i64,
    ) -> Result<Vec<PropertyListing>> {
        let start = Instant::now();
        let res = self.inner.get_all_properties(filter, limit).await;
        self.observe("search", start, &res);
        res
    }

    async fn add_property(&self, property: &NewProperty) -> Result<Property> {
        let start = Instant::now();
        let res = self.inner.add_property(property).await;
        self.observe("insert", start, &res);
        res
    }

    async fn test_connection(&self) -> Result<()> {
        let start = Instant::now();
        let res = self.inner.test_connection().await;
        self.observe("select", start, &res);
        res
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NewProperty, NewUser, Property, PropertyListing, Reservation, User};
use crate::query::PropertyFilter;

/// Data access for users, properties and reservations.
///
/// Lookups that match nothing return `Ok(None)` or an empty `Vec`; `Err` is
/// reserved for database and connectivity failures.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Get a user by email (case-insensitive)
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>>;

    /// Get a user by ID
    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>>;

    /// Insert a user and return the stored row
    async fn add_user(&self, user: &NewUser) -> Result<User>;

    /// Get a guest's reservations, earliest start date first
    async fn get_all_reservations(&self, guest_id: i32, limit: i64) -> Result<Vec<Reservation>>;

    /// Search properties, cheapest first
    async fn get_all_properties(
        &self,
        filter: &PropertyFilter,
        limit: i64,
    ) -> Result<Vec<PropertyListing>>;

    /// Insert a property and return the stored row
    async fn add_property(&self, property: &NewProperty) -> Result<Property>;

    /// Test database connection
    async fn test_connection(&self) -> Result<()>;

    /// Release pooled connections
    async fn close(&self);
}

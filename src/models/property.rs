use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A property listing as stored in the `properties` table
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Property {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_photo_url: Option<String>,
    pub cover_photo_url: Option<String>,
    /// Nightly cost in cents
    pub cost_per_night: i32,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
    pub country: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub active: bool,
}

/// A property returned from a search, with its average review rating
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct PropertyListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    /// `None` when the property has no reviews yet
    pub average_rating: Option<f64>,
}

/// Payload for listing a new property.
///
/// Field order matches the column order of the insert statement.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewProperty {
    pub title: String,
    pub description: Option<String>,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: i32,
    pub parking_spaces: i32,
    /// Nightly cost in cents
    pub cost_per_night: i32,
    pub thumbnail_photo_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub street: String,
    pub country: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub owner_id: i32,
}

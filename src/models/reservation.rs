use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A guest's reservation joined with the reserved property and its average rating
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Reservation {
    pub id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub property_id: i32,
    pub guest_id: i32,
    pub title: String,
    pub thumbnail_photo_url: Option<String>,
    pub cover_photo_url: Option<String>,
    /// Nightly cost in cents
    pub cost_per_night: i32,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: i32,
    pub parking_spaces: i32,
    pub city: String,
    pub province: String,
    pub average_rating: Option<f64>,
}

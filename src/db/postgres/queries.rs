use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{NewProperty, NewUser, Property, PropertyListing, Reservation, User};
use crate::query::{BuiltQuery, QueryParam};

/// Get a user by email (case-insensitive)
pub async fn get_user_with_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by email")?;

    Ok(user)
}

/// Get a user by ID
pub async fn get_user_with_id(pool: &PgPool, id: i32) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE users.id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by ID")?;

    Ok(user)
}

/// Insert a user
pub async fn add_user(pool: &PgPool, user: &NewUser) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password)
    .fetch_one(pool)
    .await
    .context("Failed to insert user")?;

    Ok(user)
}

/// Get a guest's reservations with the reserved property and its average rating
pub async fn get_all_reservations(
    pool: &PgPool,
    guest_id: i32,
    limit: i64,
) -> Result<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        r#"
        SELECT DISTINCT
            reservations.id, reservations.start_date, reservations.end_date,
            reservations.property_id, reservations.guest_id,
            properties.title, properties.thumbnail_photo_url, properties.cover_photo_url,
            properties.cost_per_night, properties.number_of_bedrooms,
            properties.number_of_bathrooms, properties.parking_spaces,
            properties.city, properties.province,
            avg(property_reviews.rating)::float8 AS average_rating
        FROM reservations
        JOIN properties ON properties.id = reservations.property_id
        JOIN property_reviews ON properties.id = property_reviews.property_id
        WHERE reservations.guest_id = $1
        GROUP BY properties.id, reservations.id
        ORDER BY reservations.start_date
        LIMIT $2
        "#,
    )
    .bind(guest_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch reservations")?;

    Ok(reservations)
}

/// Run a built property search
pub async fn execute_property_search(
    pool: &PgPool,
    query: &BuiltQuery,
) -> Result<Vec<PropertyListing>> {
    let mut query_builder = sqlx::query_as::<_, PropertyListing>(&query.sql);

    // Bind all parameters
    for param in &query.params {
        query_builder = match param {
            QueryParam::Text(value) => query_builder.bind(value.clone()),
            QueryParam::Int(value) => query_builder.bind(*value),
            QueryParam::Float(value) => query_builder.bind(*value),
        };
    }

    let properties = query_builder
        .fetch_all(pool)
        .await
        .context("Failed to execute property search")?;

    Ok(properties)
}

/// Insert a property
pub async fn add_property(pool: &PgPool, property: &NewProperty) -> Result<Property> {
    let property = sqlx::query_as::<_, Property>(
        r#"
        INSERT INTO properties (
            title, description, number_of_bedrooms, number_of_bathrooms, parking_spaces,
            cost_per_night, thumbnail_photo_url, cover_photo_url, street, country, city,
            province, post_code, owner_id
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14
        )
        RETURNING *
        "#,
    )
    .bind(&property.title)
    .bind(&property.description)
    .bind(property.number_of_bedrooms)
    .bind(property.number_of_bathrooms)
    .bind(property.parking_spaces)
    .bind(property.cost_per_night)
    .bind(&property.thumbnail_photo_url)
    .bind(&property.cover_photo_url)
    .bind(&property.street)
    .bind(&property.country)
    .bind(&property.city)
    .bind(&property.province)
    .bind(&property.post_code)
    .bind(property.owner_id)
    .fetch_one(pool)
    .await
    .context("Failed to insert property")?;

    Ok(property)
}

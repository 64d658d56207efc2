use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::api::middleware::RequestId;
use crate::config::SearchConfig;
use crate::db::Database;
use crate::errors::ErrorResponse;
use crate::metrics::PROPERTY_SEARCH_RESULTS;
use crate::models::{NewProperty, NewUser, Property, PropertyListing, Reservation, User};
use crate::query::PropertyFilter;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub search: SearchConfig,
}

/// Generic API response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present if success is true)
    pub data: Option<T>,
    /// Error details (present if success is false)
    pub error: Option<crate::errors::response::ErrorDetail>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Read a query value as a string first so that `field=` counts as absent.
fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Property search query parameters
#[derive(Debug, Default, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PropertySearchParams {
    /// Case-insensitive substring of the city (e.g. "vancouver")
    pub city: Option<String>,
    /// Minimum nightly price in whole dollars
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub minimum_price_per_night: Option<i64>,
    /// Maximum nightly price in whole dollars
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub maximum_price_per_night: Option<i64>,
    /// Only properties owned by this user
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub owner_id: Option<i32>,
    /// Minimum average review rating
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub minimum_rating: Option<f64>,
    /// Maximum number of results (default: 10)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<i64>,
}

impl PropertySearchParams {
    fn into_filter(self) -> (PropertyFilter, Option<i64>) {
        let city = self.city.filter(|c| !c.trim().is_empty());
        (
            PropertyFilter {
                city,
                minimum_price_per_night: self.minimum_price_per_night,
                maximum_price_per_night: self.maximum_price_per_night,
                owner_id: self.owner_id,
                minimum_rating: self.minimum_rating,
            },
            self.limit,
        )
    }
}

/// Result size parameter
#[derive(Debug, Default, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum number of results (default: 10)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<i64>,
}

/// User lookup parameters
#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailParams {
    /// Email address (case-insensitive)
    pub email: String,
}

// Concrete response types for OpenAPI generation
/// User response
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub data: Option<User>,
    pub error: Option<crate::errors::response::ErrorDetail>,
}

/// Single property response
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyResponse {
    pub success: bool,
    pub data: Option<Property>,
    pub error: Option<crate::errors::response::ErrorDetail>,
}

/// Property search response
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyListResponse {
    pub success: bool,
    pub data: Option<Vec<PropertyListing>>,
    pub error: Option<crate::errors::response::ErrorDetail>,
}

/// Reservation list response
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationListResponse {
    pub success: bool,
    pub data: Option<Vec<Reservation>>,
    pub error: Option<crate::errors::response::ErrorDetail>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "lightbnb",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// Readiness check: the database must answer
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = serde_json::Value),
        (status = 503, description = "Database unavailable", body = serde_json::Value)
    )
)]
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.test_connection().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "checks": { "database": "ok" },
            })),
        ),
        Err(e) => {
            error!("Readiness check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "checks": { "database": "error" },
                })),
            )
        }
    }
}

/// Search properties
#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "properties",
    params(PropertySearchParams),
    responses(
        (status = 200, description = "Matching properties, cheapest first", body = PropertyListResponse),
        (status = 400, description = "Malformed search parameters", body = ErrorResponse),
        (status = 503, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn search_properties(
    State(state): State<AppState>,
    request_id: RequestId,
    params: Result<Query<PropertySearchParams>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return ErrorResponse::invalid_request(rejection.body_text())
                .with_request_id(request_id.0)
                .into_response();
        }
    };

    let (filter, limit) = params.into_filter();
    let limit = limit.unwrap_or(state.search.default_limit);
    info!(?filter, limit, "Property search request");

    match state.db.get_all_properties(&filter, limit).await {
        Ok(properties) => {
            PROPERTY_SEARCH_RESULTS.observe(properties.len() as f64);
            info!("Property search returned {} results", properties.len());
            (StatusCode::OK, Json(ApiResponse::success(properties))).into_response()
        }
        Err(e) => {
            error!("Property search failed: {:#}", e);
            ErrorResponse::database_error(format!("Failed to search properties: {}", e))
                .with_request_id(request_id.0)
                .into_response()
        }
    }
}

/// List a new property
#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "properties",
    request_body = NewProperty,
    responses(
        (status = 201, description = "Property created", body = PropertyResponse),
        (status = 503, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn create_property(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(property): Json<NewProperty>,
) -> impl IntoResponse {
    info!(
        "Create property request: title={}, owner_id={}",
        property.title, property.owner_id
    );

    match state.db.add_property(&property).await {
        Ok(property) => {
            info!("Created property {}", property.id);
            (StatusCode::CREATED, Json(ApiResponse::success(property))).into_response()
        }
        Err(e) => {
            error!("Create property failed: {:#}", e);
            ErrorResponse::database_error(format!("Failed to create property: {}", e))
                .with_request_id(request_id.0)
                .into_response()
        }
    }
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 503, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    info!("Get user request: id={}", id);

    match state.db.get_user_with_id(id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(ApiResponse::success(user))).into_response(),
        Ok(None) => {
            info!("User not found: {}", id);
            ErrorResponse::user_not_found(id.to_string())
                .with_request_id(request_id.0)
                .into_response()
        }
        Err(e) => {
            error!("Get user failed: {:#}", e);
            ErrorResponse::database_error(format!("Failed to fetch user: {}", e))
                .with_request_id(request_id.0)
                .into_response()
        }
    }
}

/// Find a user by email
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(EmailParams),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Missing email parameter", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 503, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn find_user_by_email(
    State(state): State<AppState>,
    request_id: RequestId,
    params: Result<Query<EmailParams>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return ErrorResponse::invalid_request(rejection.body_text())
                .with_request_id(request_id.0)
                .into_response();
        }
    };

    match state.db.get_user_with_email(&params.email).await {
        Ok(Some(user)) => (StatusCode::OK, Json(ApiResponse::success(user))).into_response(),
        Ok(None) => ErrorResponse::user_not_found(params.email)
            .with_request_id(request_id.0)
            .into_response(),
        Err(e) => {
            error!("Find user by email failed: {:#}", e);
            ErrorResponse::database_error(format!("Failed to fetch user: {}", e))
                .with_request_id(request_id.0)
                .into_response()
        }
    }
}

/// Register a user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 503, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(user): Json<NewUser>,
) -> impl IntoResponse {
    info!("Create user request: email={}", user.email);

    match state.db.add_user(&user).await {
        Ok(user) => {
            info!("Created user {}", user.id);
            (StatusCode::CREATED, Json(ApiResponse::success(user))).into_response()
        }
        Err(e) => {
            error!("Create user failed: {:#}", e);
            ErrorResponse::database_error(format!("Failed to create user: {}", e))
                .with_request_id(request_id.0)
                .into_response()
        }
    }
}

/// List a guest's reservations
#[utoipa::path(
    get,
    path = "/api/users/{id}/reservations",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Guest user ID"),
        LimitParams
    ),
    responses(
        (status = 200, description = "Reservations, earliest first", body = ReservationListResponse),
        (status = 503, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn get_reservations(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(guest_id): Path<i32>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return ErrorResponse::invalid_request(rejection.body_text())
                .with_request_id(request_id.0)
                .into_response();
        }
    };
    let limit = params.limit.unwrap_or(state.search.default_limit);

    match state.db.get_all_reservations(guest_id, limit).await {
        Ok(reservations) => {
            info!(
                "Guest {} has {} reservations (limit {})",
                guest_id,
                reservations.len(),
                limit
            );
            (StatusCode::OK, Json(ApiResponse::success(reservations))).into_response()
        }
        Err(e) => {
            error!("Get reservations failed: {:#}", e);
            ErrorResponse::database_error(format!("Failed to fetch reservations: {}", e))
                .with_request_id(request_id.0)
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_drop_blank_city() {
        let params = PropertySearchParams {
            city: Some("  ".to_string()),
            minimum_price_per_night: Some(80),
            limit: Some(3),
            ..Default::default()
        };

        let (filter, limit) = params.into_filter();
        assert!(filter.city.is_none());
        assert_eq!(filter.minimum_price_per_night, Some(80));
        assert_eq!(limit, Some(3));
    }

    #[test]
    fn test_search_params_keep_city() {
        let params = PropertySearchParams {
            city: Some("Halifax".to_string()),
            ..Default::default()
        };

        let (filter, limit) = params.into_filter();
        assert_eq!(filter.city.as_deref(), Some("Halifax"));
        assert!(limit.is_none());
    }

    #[test]
    fn test_blank_numeric_fields_are_unset() {
        let Query(params) = Query::<PropertySearchParams>::try_from_uri(
            &"/api/properties?city=Vancouver&minimum_price_per_night=&owner_id=&minimum_rating=&limit="
                .parse()
                .unwrap(),
        )
        .unwrap();

        let (filter, limit) = params.into_filter();
        assert_eq!(filter.city.as_deref(), Some("Vancouver"));
        assert!(filter.minimum_price_per_night.is_none());
        assert!(filter.owner_id.is_none());
        assert!(filter.minimum_rating.is_none());
        assert!(limit.is_none());
    }

    #[test]
    fn test_numeric_fields_still_parsed() {
        let Query(params) = Query::<PropertySearchParams>::try_from_uri(
            &"/api/properties?maximum_price_per_night=150&minimum_rating=4.5&limit=3"
                .parse()
                .unwrap(),
        )
        .unwrap();

        assert_eq!(params.maximum_price_per_night, Some(150));
        assert_eq!(params.minimum_rating, Some(4.5));
        assert_eq!(params.limit, Some(3));
    }

    #[test]
    fn test_non_numeric_field_rejected() {
        let result = Query::<PropertySearchParams>::try_from_uri(
            &"/api/properties?minimum_price_per_night=cheap".parse().unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(vec![1, 2, 3]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][1], 2);
        assert!(json["error"].is_null());
    }
}

use utoipa::OpenApi;

use crate::api::handlers::{
    EmailParams, LimitParams, PropertyListResponse, PropertyResponse, PropertySearchParams,
    ReservationListResponse, UserResponse,
};
use crate::errors::{ErrorCode, ErrorDetail, ErrorResponse};
use crate::models::{NewProperty, NewUser, Property, PropertyListing, Reservation, User};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LightBnB",
        version = "0.1.0",
        description = "Data service for a short-term property rental site: property search, listings, users and reservations.",
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::health_ready,
        crate::api::handlers::search_properties,
        crate::api::handlers::create_property,
        crate::api::handlers::get_user,
        crate::api::handlers::find_user_by_email,
        crate::api::handlers::create_user,
        crate::api::handlers::get_reservations,
    ),
    components(
        schemas(
            User,
            NewUser,
            Property,
            NewProperty,
            PropertyListing,
            Reservation,
            UserResponse,
            PropertyResponse,
            PropertyListResponse,
            ReservationListResponse,
            PropertySearchParams,
            LimitParams,
            EmailParams,
            ErrorResponse,
            ErrorDetail,
            ErrorCode,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "properties", description = "Property search and listing"),
        (name = "users", description = "User lookup and registration"),
        (name = "reservations", description = "Guest reservations"),
    )
)]
pub struct ApiDoc;

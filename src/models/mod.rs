pub mod property;
pub mod reservation;
pub mod user;

pub use property::{NewProperty, Property, PropertyListing};
pub use reservation::Reservation;
pub use user::{NewUser, User};

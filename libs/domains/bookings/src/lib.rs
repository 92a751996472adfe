//! Bookings Domain
//!
//! Staff-only CRUD over bookings. Reads resolve the buyer and the tour name.

pub mod handlers;
pub mod models;

pub use models::{Booking, CreateBooking, UpdateBooking};

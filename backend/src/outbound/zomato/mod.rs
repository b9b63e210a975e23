//! Restaurant-provider outbound adapters.
//!
//! This module provides a thin HTTP implementation of the
//! `RestaurantSource` port.

mod dto;
mod http_source;

pub use http_source::{DEFAULT_ZOMATO_BASE_URL, ZomatoHttpSource};

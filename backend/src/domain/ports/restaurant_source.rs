//! Driven port for the restaurant-search provider.
//!
//! The domain owns the request shape and response contract so the pipeline
//! stays adapter-agnostic. Both calls are single request/response exchanges;
//! nothing here paginates or retries.

use async_trait::async_trait;

use crate::domain::{CityName, LocationId, RestaurantRecord};

/// Largest page the provider returns for one search call.
pub const SEARCH_PAGE_LIMIT: usize = 20;

/// Errors surfaced while calling the restaurant-search provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestaurantSourceError {
    /// Network transport failed before receiving a response.
    #[error("restaurant provider transport failed: {message}")]
    Transport { message: String },
    /// The call exceeded its timeout.
    #[error("restaurant provider timeout: {message}")]
    Timeout { message: String },
    /// The provider rate-limited the request.
    #[error("restaurant provider rate limited request: {message}")]
    RateLimited { message: String },
    /// The response body could not be decoded.
    #[error("restaurant provider response decode failed: {message}")]
    Decode { message: String },
    /// The provider rejected the request (bad key, bad parameters).
    #[error("restaurant provider rejected request: {message}")]
    InvalidRequest { message: String },
}

impl RestaurantSourceError {
    /// Build a [`Self::Transport`] error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Build a [`Self::Timeout`] error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Build a [`Self::RateLimited`] error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Build a [`Self::Decode`] error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Build a [`Self::InvalidRequest`] error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

/// Port for resolving cities and fetching restaurants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestaurantSource: Send + Sync {
    /// Resolve a city name to the provider's location identifier.
    ///
    /// Returns `Ok(None)` when the provider has no suggestion or the top
    /// suggestion carries no identifier.
    async fn resolve_city(
        &self,
        city: &CityName,
    ) -> Result<Option<LocationId>, RestaurantSourceError>;

    /// Fetch one page of restaurants for a location, ascending by cost.
    ///
    /// Implementations return at most [`SEARCH_PAGE_LIMIT`] records.
    async fn search_restaurants(
        &self,
        location: &LocationId,
    ) -> Result<Vec<RestaurantRecord>, RestaurantSourceError>;
}

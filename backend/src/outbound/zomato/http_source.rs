//! Reqwest-backed restaurant source adapter.
//!
//! This adapter owns transport details only: URL construction, timeout and
//! HTTP error mapping, and JSON decoding into domain records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{CitiesResponseDto, SearchResponseDto};
use crate::domain::ports::{RestaurantSource, RestaurantSourceError};
use crate::domain::{CityName, LocationId, RestaurantRecord};
use crate::outbound::wire::status_message;

/// Public provider endpoint used when no base URL is configured.
pub const DEFAULT_ZOMATO_BASE_URL: &str = "https://developers.zomato.com/api/v2.1";

/// Restaurant source that queries the provider's city and search endpoints.
pub struct ZomatoHttpSource {
    client: Client,
    base_url: Url,
    api_key: Zeroizing<String>,
}

impl ZomatoHttpSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: Zeroizing::new(api_key.into()),
        })
    }

    fn endpoint(&self, segment: &str) -> Result<Url, RestaurantSourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RestaurantSourceError::invalid_request(format!(
                    "base URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn get(
        &self,
        segment: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<u8>, RestaurantSourceError> {
        let response = self
            .client
            .get(self.endpoint(segment)?)
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl RestaurantSource for ZomatoHttpSource {
    async fn resolve_city(
        &self,
        city: &CityName,
    ) -> Result<Option<LocationId>, RestaurantSourceError> {
        debug!(%city, "resolving city");
        let body = self.get("cities", &[("q", city.as_ref())]).await?;
        parse_location(&body)
    }

    async fn search_restaurants(
        &self,
        location: &LocationId,
    ) -> Result<Vec<RestaurantRecord>, RestaurantSourceError> {
        debug!(%location, "fetching restaurants");
        let body = self
            .get(
                "search",
                &[
                    ("entity_type", "city"),
                    ("sort", "cost"),
                    ("order", "asc"),
                    ("entity_id", location.as_ref()),
                ],
            )
            .await?;
        parse_records(&body)
    }
}

fn parse_location(body: &[u8]) -> Result<Option<LocationId>, RestaurantSourceError> {
    let decoded: CitiesResponseDto = serde_json::from_slice(body).map_err(|error| {
        RestaurantSourceError::decode(format!("invalid city lookup payload: {error}"))
    })?;
    Ok(decoded.into_location_id())
}

fn parse_records(body: &[u8]) -> Result<Vec<RestaurantRecord>, RestaurantSourceError> {
    let decoded: SearchResponseDto = serde_json::from_slice(body).map_err(|error| {
        RestaurantSourceError::decode(format!("invalid restaurant search payload: {error}"))
    })?;
    Ok(decoded.into_records())
}

fn map_transport_error(error: reqwest::Error) -> RestaurantSourceError {
    // Strip the URL so the API key never reaches logs.
    let error = error.without_url();
    if error.is_timeout() {
        RestaurantSourceError::timeout(error.to_string())
    } else {
        RestaurantSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RestaurantSourceError {
    let message = status_message(status, body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => RestaurantSourceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RestaurantSourceError::timeout(message)
        }
        _ if status.is_client_error() => RestaurantSourceError::invalid_request(message),
        _ => RestaurantSourceError::transport(message),
    }
}

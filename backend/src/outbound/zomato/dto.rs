//! DTOs for decoding restaurant-provider JSON responses.
//!
//! The adapter decodes into these transport DTOs first, then maps each
//! usable entry into a domain [`RestaurantRecord`]. Individual restaurants are
//! decoded one at a time so a single malformed entry cannot sink a page.

use serde::Deserialize;
use tracing::warn;

use crate::domain::ports::SEARCH_PAGE_LIMIT;
use crate::domain::{Coordinates, LocationId, RestaurantRecord};
use crate::outbound::wire::NumberOrText;

#[derive(Debug, Deserialize)]
pub(super) struct CitiesResponseDto {
    #[serde(default)]
    location_suggestions: Vec<LocationSuggestionDto>,
}

#[derive(Debug, Deserialize)]
struct LocationSuggestionDto {
    id: Option<NumberOrText>,
}

impl CitiesResponseDto {
    /// Identifier of the first suggestion, if it carries one.
    pub(super) fn into_location_id(self) -> Option<LocationId> {
        self.location_suggestions
            .into_iter()
            .next()
            .and_then(|suggestion| suggestion.id)
            .and_then(|id| LocationId::new(id.into_text()))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponseDto {
    #[serde(default)]
    restaurants: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RestaurantSlotDto {
    restaurant: Option<RestaurantDto>,
}

#[derive(Debug, Deserialize)]
struct RestaurantDto {
    name: Option<String>,
    location: Option<RestaurantLocationDto>,
    average_cost_for_two: Option<NumberOrText>,
    user_rating: Option<UserRatingDto>,
}

#[derive(Debug, Deserialize)]
struct RestaurantLocationDto {
    address: Option<String>,
    latitude: Option<NumberOrText>,
    longitude: Option<NumberOrText>,
}

#[derive(Debug, Deserialize)]
struct UserRatingDto {
    aggregate_rating: Option<NumberOrText>,
}

impl SearchResponseDto {
    /// Usable records in provider order.
    ///
    /// Reading stops at the first empty slot and never goes past
    /// [`SEARCH_PAGE_LIMIT`] slots.
    pub(super) fn into_records(self) -> Vec<RestaurantRecord> {
        self.restaurants
            .into_iter()
            .take(SEARCH_PAGE_LIMIT)
            .map(|slot| match slot {
                serde_json::Value::Null => None,
                value => Some(serde_json::from_value::<RestaurantSlotDto>(value)),
            })
            .map_while(|slot| match slot {
                None => None,
                Some(Ok(RestaurantSlotDto { restaurant: None })) => None,
                Some(Ok(RestaurantSlotDto {
                    restaurant: Some(restaurant),
                })) => Some(restaurant.into_record()),
                Some(Err(error)) => Some(Err(format!("malformed restaurant entry: {error}"))),
            })
            .enumerate()
            .filter_map(|(index, record)| match record {
                Ok(record) => Some(record),
                Err(reason) => {
                    warn!(index, %reason, "skipping restaurant entry");
                    None
                }
            })
            .collect()
    }
}

impl RestaurantDto {
    fn into_record(self) -> Result<RestaurantRecord, String> {
        let name = self
            .name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .ok_or("restaurant has no name")?;
        let location = self
            .location
            .ok_or_else(|| format!("{name}: missing location"))?;
        let coordinates = location
            .coordinates()
            .ok_or_else(|| format!("{name}: missing or invalid coordinates"))?;
        let average_cost_for_two = self
            .average_cost_for_two
            .as_ref()
            .and_then(NumberOrText::as_f64)
            .filter(|cost| *cost >= 0.0)
            .ok_or_else(|| format!("{name}: missing or negative average cost"))?;
        let rating = self
            .user_rating
            .and_then(|rating| rating.aggregate_rating)
            .and_then(|rating| rating.as_f64());

        Ok(RestaurantRecord {
            name,
            address: location.address.unwrap_or_default().trim().to_owned(),
            location: coordinates,
            average_cost_for_two,
            rating,
        })
    }
}

impl RestaurantLocationDto {
    fn coordinates(&self) -> Option<Coordinates> {
        let latitude = self.latitude.as_ref()?.as_f64()?;
        let longitude = self.longitude.as_ref()?.as_f64()?;
        Coordinates::new(latitude, longitude)
    }
}

//! Shared doubles for behavioural tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use welp_backend::domain::ports::{RestaurantSource, RestaurantSourceError};
use welp_backend::domain::{CityName, Coordinates, LocationId, RestaurantRecord};

/// Wall clock for tests that do not assert on timestamps.
pub struct SystemClock;

impl Clock for SystemClock {
    fn local(&self) -> DateTime<Local> {
        Local::now()
    }

    fn utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Restaurant provider answering from a fixed table of cities.
#[derive(Default)]
pub struct ScriptedSource {
    cities: HashMap<String, Vec<RestaurantRecord>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    /// Provider that knows no cities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a city, keyed by its normalised name.
    pub fn with_city(mut self, city: &str, records: Vec<RestaurantRecord>) -> Self {
        self.cities.insert(city.to_owned(), records);
        self
    }

    /// Number of resolve and search calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestaurantSource for ScriptedSource {
    async fn resolve_city(
        &self,
        city: &CityName,
    ) -> Result<Option<LocationId>, RestaurantSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .cities
            .contains_key(city.as_ref())
            .then(|| LocationId::new(city.as_ref()))
            .flatten())
    }

    async fn search_restaurants(
        &self,
        location: &LocationId,
    ) -> Result<Vec<RestaurantRecord>, RestaurantSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .cities
            .get(location.as_ref())
            .cloned()
            .unwrap_or_default())
    }
}

/// Restaurant with the given average cost for two, placed in central Austin.
pub fn restaurant(name: &str, cost_for_two: f64) -> RestaurantRecord {
    RestaurantRecord {
        name: name.to_owned(),
        address: format!("{name}, Congress Ave"),
        location: Coordinates::new(30.2672, -97.7431).expect("valid coordinates"),
        average_cost_for_two: cost_for_two,
        rating: Some(4.2),
    }
}

/// Five Austin restaurants costing 5 to 25 per person, cheapest first.
pub fn austin_restaurants() -> Vec<RestaurantRecord> {
    (1..=5u32)
        .map(|index| restaurant(&format!("Austin Eats {index}"), f64::from(index) * 10.0))
        .collect()
}

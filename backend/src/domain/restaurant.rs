//! Restaurant records returned by the search provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque city identifier issued by the restaurant-search provider.
///
/// Only meaningful for the resolve/fetch call pair that produced it; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationId(String);

impl LocationId {
    /// Wrap a provider identifier. Blank identifiers are rejected.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// WGS84 coordinate pair.
///
/// ## Invariants
/// - both values are finite
/// - latitude is within `[-90, 90]`, longitude within `[-180, 180]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and build a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Immutable snapshot of one restaurant from a fetch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRecord {
    /// Display name.
    pub name: String,
    /// Street address as reported by the provider.
    pub address: String,
    /// Map position.
    pub location: Coordinates,
    /// Average cost for two people; zero means the provider has no pricing.
    pub average_cost_for_two: f64,
    /// Aggregate user rating, when the provider reports one.
    pub rating: Option<f64>,
}

impl RestaurantRecord {
    /// Derived cost for one person. Never stored back on the record.
    ///
    /// # Examples
    /// ```
    /// use welp_backend::domain::{Coordinates, RestaurantRecord};
    ///
    /// let record = RestaurantRecord {
    ///     name: "Taco Stand".into(),
    ///     address: "1 Main St".into(),
    ///     location: Coordinates::new(30.27, -97.74).expect("valid coordinates"),
    ///     average_cost_for_two: 30.0,
    ///     rating: None,
    /// };
    /// assert_eq!(record.cost_per_person(), 15.0);
    /// ```
    pub fn cost_per_person(&self) -> f64 {
        self.average_cost_for_two / 2.0
    }
}

//! Budget filter applied to fetched restaurant records.
//!
//! A record survives when `0 < cost_per_person <= budget`. Zero cost means the
//! provider had no pricing data, so those records are dropped rather than
//! treated as free. Input order is preserved; the provider already sorts by
//! ascending cost.

use serde::Serialize;

use super::{Budget, RestaurantRecord};

/// Ordered, budget-filtered records for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<RestaurantRecord>);

impl ResultSet {
    /// Surviving records in fetch order.
    pub fn records(&self) -> &[RestaurantRecord] {
        &self.0
    }

    /// Number of surviving records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing survived the filter.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First record, used to centre the map.
    pub fn first(&self) -> Option<&RestaurantRecord> {
        self.0.first()
    }
}

impl IntoIterator for ResultSet {
    type Item = RestaurantRecord;
    type IntoIter = std::vec::IntoIter<RestaurantRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Whether one record fits within the per-person budget.
pub fn within_budget(record: &RestaurantRecord, budget: Budget) -> bool {
    let cost = record.cost_per_person();
    cost != 0.0 && cost <= budget.amount()
}

/// Keep the records whose per-person cost fits the budget.
///
/// # Examples
/// ```
/// use welp_backend::domain::{filter_by_budget, Budget, Coordinates, RestaurantRecord};
///
/// let record = |cost: f64| RestaurantRecord {
///     name: format!("cost {cost}"),
///     address: String::new(),
///     location: Coordinates::new(0.0, 0.0).expect("valid coordinates"),
///     average_cost_for_two: cost,
///     rating: None,
/// };
/// let budget = Budget::new(15.0).expect("valid budget");
/// let results = filter_by_budget(vec![record(0.0), record(20.0), record(40.0)], budget);
/// assert_eq!(results.len(), 1);
/// ```
pub fn filter_by_budget(
    records: impl IntoIterator<Item = RestaurantRecord>,
    budget: Budget,
) -> ResultSet {
    ResultSet(
        records
            .into_iter()
            .filter(|record| within_budget(record, budget))
            .collect(),
    )
}

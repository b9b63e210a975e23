//! Domain ports and supporting types for the hexagonal boundary.

mod history_store;
mod identity_provider;
mod restaurant_source;

#[cfg(test)]
pub use history_store::MockHistoryStore;
pub use history_store::{HistoryStore, HistoryStoreError};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use restaurant_source::MockRestaurantSource;
pub use restaurant_source::{RestaurantSource, RestaurantSourceError, SEARCH_PAGE_LIMIT};

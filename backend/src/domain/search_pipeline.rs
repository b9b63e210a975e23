//! Resolve → fetch → filter → render pipeline for one search.
//!
//! Stages run strictly in sequence, except that the history append for a
//! recorded search runs alongside the fetch. The stages run under a single
//! deadline and dropping the future cancels every one of them. The append is
//! detached once started: it outlives a timeout or an abort and reports the
//! stored entry over its own channel.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::ports::{
    HistoryStore, RestaurantSource, RestaurantSourceError, SEARCH_PAGE_LIMIT,
};
use super::{
    CityName, HistoryEntry, Identity, LocationId, NewHistoryEntry, RecordMode, RenderedResults,
    RestaurantRecord, ResultSet, SearchCriteria, filter_by_budget, render,
};

/// Default deadline for the whole pipeline.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Reasons a search stops before producing results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The provider had no usable identifier for the city.
    #[error("city not found: {city}")]
    CityNotFound { city: CityName },
    /// City resolution failed in transport or decoding.
    #[error(transparent)]
    Provider(#[from] RestaurantSourceError),
    /// The pipeline did not finish before its deadline.
    #[error("search timed out after {after:?}")]
    TimedOut { after: Duration },
}

/// Results of a search that reached the render stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: ResultSet,
    pub rendered: RenderedResults,
    /// The fetch failed and the search was rendered as empty.
    pub degraded: bool,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub criteria: SearchCriteria,
    /// History entry appended by this run, if any.
    pub recorded: Option<HistoryEntry>,
    pub outcome: Result<SearchOutcome, SearchError>,
}

/// Driven ports the pipeline calls.
#[derive(Clone)]
pub struct SearchPipelinePorts {
    /// Restaurant-search provider.
    pub source: Arc<dyn RestaurantSource>,
    /// Per-identity history store.
    pub history: Arc<dyn HistoryStore>,
}

impl SearchPipelinePorts {
    /// Bundle the pipeline's ports.
    pub fn new(source: Arc<dyn RestaurantSource>, history: Arc<dyn HistoryStore>) -> Self {
        Self { source, history }
    }
}

/// Orchestrates one search across the provider and the history store.
#[derive(Clone)]
pub struct SearchPipeline {
    ports: SearchPipelinePorts,
    clock: Arc<dyn Clock + Send + Sync>,
    search_timeout: Duration,
}

impl SearchPipeline {
    /// Build a pipeline with the default deadline.
    pub fn new(ports: SearchPipelinePorts, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            ports,
            clock,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    /// Override the deadline covering the whole chain.
    #[must_use]
    pub fn with_search_timeout(mut self, search_timeout: Duration) -> Self {
        self.search_timeout = search_timeout;
        self
    }

    /// History store shared with the session for reloads.
    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.ports.history
    }

    /// Run the pipeline for one set of criteria.
    ///
    /// `identity` is the signed-in user at submit time; without one nothing
    /// is recorded regardless of `mode`. An entry appended before the deadline
    /// fired is still reported.
    pub async fn run(
        &self,
        criteria: SearchCriteria,
        mode: RecordMode,
        identity: Option<Identity>,
    ) -> PipelineReport {
        let (recorded_tx, recorded_rx) = oneshot::channel();
        let outcome = self
            .search(&criteria, mode, identity.as_ref(), recorded_tx)
            .await;
        PipelineReport {
            criteria,
            recorded: recorded_rx.await.ok(),
            outcome,
        }
    }

    /// Run the deadline-bound stages, sending any appended entry to `recorded`.
    ///
    /// The sender is dropped without a value when nothing is recorded, so
    /// the receiver resolves once the append settles even if this future is
    /// cancelled first.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        mode: RecordMode,
        identity: Option<&Identity>,
        recorded: oneshot::Sender<HistoryEntry>,
    ) -> Result<SearchOutcome, SearchError> {
        let stages = self.run_stages(criteria, mode, identity, recorded);
        match tokio::time::timeout(self.search_timeout, stages).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    city = %criteria.city,
                    timeout = ?self.search_timeout,
                    "search pipeline timed out"
                );
                Err(SearchError::TimedOut {
                    after: self.search_timeout,
                })
            }
        }
    }

    async fn run_stages(
        &self,
        criteria: &SearchCriteria,
        mode: RecordMode,
        identity: Option<&Identity>,
        recorded: oneshot::Sender<HistoryEntry>,
    ) -> Result<SearchOutcome, SearchError> {
        let location = self.resolve(&criteria.city).await?;
        self.record(criteria, mode, identity, recorded);
        let (records, degraded) = self.fetch(&location).await;

        let results = filter_by_budget(records, criteria.budget_per_person);
        debug!(
            city = %criteria.city,
            kept = results.len(),
            degraded,
            "search filtered"
        );
        let rendered = render(&results);
        Ok(SearchOutcome {
            results,
            rendered,
            degraded,
        })
    }

    async fn resolve(&self, city: &CityName) -> Result<LocationId, SearchError> {
        match self.ports.source.resolve_city(city).await {
            Ok(Some(location)) => {
                debug!(%city, %location, "city resolved");
                Ok(location)
            }
            Ok(None) => {
                debug!(%city, "city not found");
                Err(SearchError::CityNotFound { city: city.clone() })
            }
            Err(error) => {
                warn!(%city, %error, "city resolution failed");
                Err(SearchError::Provider(error))
            }
        }
    }

    async fn fetch(&self, location: &LocationId) -> (Vec<RestaurantRecord>, bool) {
        match self.ports.source.search_restaurants(location).await {
            Ok(mut records) => {
                records.truncate(SEARCH_PAGE_LIMIT);
                (records, false)
            }
            Err(error) => {
                warn!(%location, %error, "restaurant fetch failed; rendering no results");
                (Vec::new(), true)
            }
        }
    }

    fn record(
        &self,
        criteria: &SearchCriteria,
        mode: RecordMode,
        identity: Option<&Identity>,
        recorded: oneshot::Sender<HistoryEntry>,
    ) {
        let identity = match (mode, identity) {
            (RecordMode::Record, Some(identity)) => identity.clone(),
            _ => return,
        };
        let entry = NewHistoryEntry::from_criteria(criteria, identity.email(), self.clock.utc());
        let history = Arc::clone(&self.ports.history);
        tokio::spawn(async move {
            match history.append(&identity, entry).await {
                Ok(stored) => {
                    if recorded.send(stored).is_err() {
                        debug!(uid = identity.uid(), "history entry outlived its search");
                    }
                }
                Err(error) => {
                    warn!(uid = identity.uid(), %error, "failed to record search history");
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "search_pipeline_tests.rs"]
mod tests;

//! Page-session state machine driving searches, history and sign-in.
//!
//! A [`SearchSession`] processes one page's commands in order and answers
//! each with the events the page must apply. Searches are split into
//! [`SearchSession::dispatch`] and [`SearchSession::complete`] so an adapter
//! can keep receiving commands while a search runs; starting a new search
//! aborts the previous one (cancel-and-replace) and completions from a
//! superseded generation are dropped.

use std::sync::Arc;

use futures_util::future::{AbortHandle, Abortable, BoxFuture};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::ports::{IdentityProvider, IdentityProviderError};
use super::{
    Credentials, FeedChange, HISTORY_DISPLAY_CAP, HistoryEntry, HistoryEntryId, Identity,
    IdentityState, InfoboxState, MarkerEventKind, MarkerId, Notice, RecordMode, RenderedResults,
    SearchCriteria, SearchError, SearchOutcome, SearchPipeline, SessionContext,
};

/// User action forwarded by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Search form submitted.
    SubmitSearch {
        budget: String,
        city: String,
        postal_code: String,
    },
    /// A recent search was selected.
    ReplaySearch { entry_id: HistoryEntryId },
    /// Sign-in form submitted.
    SignIn { email: String, password: String },
    /// Sign-out control activated.
    SignOut,
    /// "New search" activated.
    NewSearch,
    /// Pointer event on a map marker.
    MarkerEvent {
        marker_id: MarkerId,
        kind: MarkerEventKind,
    },
}

/// Change the page must apply.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A search was accepted and is running.
    SearchStarted { criteria: SearchCriteria },
    /// Map and list for a completed search.
    ResultsRendered(RenderedResults),
    /// Something the user should be told.
    Notice(Notice),
    /// A history entry joined the recent-search list.
    HistoryEntryAdded {
        entry: HistoryEntry,
        evicted: Option<HistoryEntryId>,
    },
    /// All rendered state was cleared; `email` is set while signed in.
    SessionReset { email: Option<String> },
    /// Infobox to show after a marker event.
    Infobox(InfoboxState),
}

/// Outcome of dispatching one command.
pub enum Dispatch {
    /// The command finished; apply these events.
    Done(Vec<SessionEvent>),
    /// A search started; apply `events` now and drive `search` to completion.
    Search {
        events: Vec<SessionEvent>,
        search: PendingSearch,
    },
}

/// Pipeline run detached from the session so it can execute elsewhere.
pub struct PendingSearch {
    generation: u64,
    criteria: SearchCriteria,
    task: Abortable<BoxFuture<'static, Result<SearchOutcome, SearchError>>>,
    recorded: oneshot::Receiver<HistoryEntry>,
}

impl PendingSearch {
    /// Generation this search belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drive the pipeline.
    ///
    /// A superseded search still completes when its history entry was
    /// stored; otherwise it yields `None`.
    pub async fn run(self) -> Option<SearchCompletion> {
        let Self {
            generation,
            criteria,
            task,
            recorded,
        } = self;
        let outcome = match task.await {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                debug!(generation, "search aborted");
                None
            }
        };
        let recorded = recorded.await.ok();
        if outcome.is_none() && recorded.is_none() {
            return None;
        }
        Some(SearchCompletion {
            generation,
            criteria,
            recorded,
            outcome,
        })
    }
}

/// Finished pipeline run waiting to be applied to its session.
#[derive(Debug)]
pub struct SearchCompletion {
    generation: u64,
    criteria: SearchCriteria,
    recorded: Option<HistoryEntry>,
    /// `None` when the search was aborted.
    outcome: Option<Result<SearchOutcome, SearchError>>,
}

/// State machine for one page session.
pub struct SearchSession {
    pipeline: Arc<SearchPipeline>,
    identity_provider: Arc<dyn IdentityProvider>,
    context: SessionContext,
    in_flight: Option<AbortHandle>,
}

impl SearchSession {
    /// Start a signed-out session.
    pub fn new(pipeline: Arc<SearchPipeline>, identity_provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            pipeline,
            identity_provider,
            context: SessionContext::new(),
            in_flight: None,
        }
    }

    /// Session state, for inspection.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Handle a command, running any search inline.
    pub async fn handle(&mut self, command: SessionCommand) -> Vec<SessionEvent> {
        match self.dispatch(command).await {
            Dispatch::Done(events) => events,
            Dispatch::Search { mut events, search } => {
                if let Some(completion) = search.run().await {
                    events.extend(self.complete(completion));
                }
                events
            }
        }
    }

    /// Handle a command; searches are returned unstarted for the caller to drive.
    pub async fn dispatch(&mut self, command: SessionCommand) -> Dispatch {
        match command {
            SessionCommand::SubmitSearch {
                budget,
                city,
                postal_code,
            } => match SearchCriteria::from_form(&budget, &city, &postal_code) {
                Ok(criteria) => self.begin_search(criteria, RecordMode::Record),
                Err(error) => Dispatch::Done(vec![SessionEvent::Notice(Notice::invalid_request(
                    capitalize(&error.to_string()),
                ))]),
            },
            SessionCommand::ReplaySearch { entry_id } => {
                match self.context.feed().find(&entry_id).map(HistoryEntry::criteria) {
                    Some(criteria) => self.begin_search(criteria, RecordMode::Skip),
                    None => Dispatch::Done(vec![SessionEvent::Notice(Notice::invalid_request(
                        "That search is no longer in your recent searches.",
                    ))]),
                }
            }
            SessionCommand::SignIn { email, password } => {
                Dispatch::Done(self.sign_in(&email, &password).await)
            }
            SessionCommand::SignOut => Dispatch::Done(self.sign_out().await),
            SessionCommand::NewSearch => Dispatch::Done(self.new_search().await),
            SessionCommand::MarkerEvent { marker_id, kind } => {
                Dispatch::Done(vec![SessionEvent::Infobox(self.marker_event(marker_id, kind))])
            }
        }
    }

    /// Apply a finished search.
    pub fn complete(&mut self, completion: SearchCompletion) -> Vec<SessionEvent> {
        let SearchCompletion {
            generation,
            criteria,
            recorded,
            outcome,
        } = completion;
        let mut events = Vec::new();

        if let Some(entry) = recorded {
            let owned = self
                .context
                .identity()
                .identity()
                .is_some_and(|identity| identity.email() == entry.owner_email);
            if owned {
                events.extend(self.feed(entry));
            }
        }

        let outcome = match outcome {
            Some(outcome) if generation == self.context.generation() => outcome,
            _ => {
                debug!(
                    generation,
                    current = self.context.generation(),
                    "dropping superseded search"
                );
                return events;
            }
        };
        self.in_flight = None;

        match outcome {
            Ok(outcome) => {
                self.context.show(outcome.rendered.clone());
                events.push(SessionEvent::ResultsRendered(outcome.rendered));
                if outcome.degraded {
                    events.push(SessionEvent::Notice(Notice::search_failed()));
                } else if outcome.results.is_empty() {
                    events.push(SessionEvent::Notice(Notice::no_results()));
                }
            }
            Err(SearchError::CityNotFound { city }) => {
                events.push(SessionEvent::Notice(Notice::city_not_found(city)));
            }
            Err(error @ (SearchError::Provider(_) | SearchError::TimedOut { .. })) => {
                warn!(%error, city = %criteria.city, "search failed");
                events.push(SessionEvent::Notice(Notice::search_failed()));
            }
        }
        events
    }

    fn begin_search(&mut self, criteria: SearchCriteria, mode: RecordMode) -> Dispatch {
        self.cancel_in_flight();
        let generation = self.context.next_generation();
        let identity = self.context.identity().identity().cloned();
        let pipeline = Arc::clone(&self.pipeline);
        let run_criteria = criteria.clone();
        let (recorded_tx, recorded) = oneshot::channel();
        let future: BoxFuture<'static, Result<SearchOutcome, SearchError>> =
            Box::pin(async move {
                pipeline
                    .search(&run_criteria, mode, identity.as_ref(), recorded_tx)
                    .await
            });
        let (handle, registration) = AbortHandle::new_pair();
        self.in_flight = Some(handle);
        debug!(generation, city = %criteria.city, ?mode, "search started");
        Dispatch::Search {
            events: vec![SessionEvent::SearchStarted {
                criteria: criteria.clone(),
            }],
            search: PendingSearch {
                generation,
                criteria,
                task: Abortable::new(future, registration),
                recorded,
            },
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }

    async fn sign_in(&mut self, email: &str, password: &str) -> Vec<SessionEvent> {
        let credentials = match Credentials::try_from_parts(email, password) {
            Ok(credentials) => credentials,
            Err(error) => {
                return vec![SessionEvent::Notice(Notice::auth_failed(capitalize(
                    &error.to_string(),
                )))];
            }
        };

        let identity = match self.authenticate(&credentials).await {
            Ok(identity) => identity,
            Err(error) => {
                warn!(%error, "sign-in failed");
                return vec![SessionEvent::Notice(Notice::auth_failed(
                    error.user_message(),
                ))];
            }
        };

        self.end_provider_session().await;
        info!(uid = identity.uid(), "signed in");
        self.reset_to(IdentityState::SignedIn(identity)).await
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Identity, IdentityProviderError> {
        match self.identity_provider.sign_in(credentials).await {
            Err(IdentityProviderError::AccountNotFound) => {
                info!("no account for email; registering");
                self.identity_provider.register(credentials).await
            }
            other => other,
        }
    }

    async fn sign_out(&mut self) -> Vec<SessionEvent> {
        if !self.context.identity().is_signed_in() {
            return Vec::new();
        }
        self.end_provider_session().await;
        info!("signed out");
        self.reset_to(IdentityState::SignedOut).await
    }

    async fn end_provider_session(&self) {
        if let Some(identity) = self.context.identity().identity() {
            if let Err(error) = self.identity_provider.sign_out(identity).await {
                warn!(%error, uid = identity.uid(), "provider sign-out failed");
            }
        }
    }

    async fn new_search(&mut self) -> Vec<SessionEvent> {
        let identity = self.context.identity().clone();
        self.reset_to(identity).await
    }

    async fn reset_to(&mut self, identity: IdentityState) -> Vec<SessionEvent> {
        self.cancel_in_flight();
        self.context.reset(identity);
        let email = self
            .context
            .identity()
            .identity()
            .map(|identity| identity.email().to_owned());
        let mut events = vec![SessionEvent::SessionReset { email }];
        events.extend(self.load_history().await);
        events
    }

    async fn load_history(&mut self) -> Vec<SessionEvent> {
        let Some(identity) = self.context.identity().identity().cloned() else {
            return Vec::new();
        };
        match self
            .pipeline
            .history()
            .recent(&identity, HISTORY_DISPLAY_CAP)
            .await
        {
            Ok(entries) => entries
                .into_iter()
                .flat_map(|entry| self.feed(entry))
                .collect(),
            Err(error) => {
                warn!(%error, uid = identity.uid(), "failed to load search history");
                Vec::new()
            }
        }
    }

    fn feed(&mut self, entry: HistoryEntry) -> Option<SessionEvent> {
        match self.context.feed_mut().push(entry) {
            FeedChange::Added { entry, evicted } => Some(SessionEvent::HistoryEntryAdded {
                entry,
                evicted: evicted.map(|old| old.id),
            }),
            FeedChange::Ignored => None,
        }
    }

    fn marker_event(&self, marker_id: MarkerId, kind: MarkerEventKind) -> InfoboxState {
        self.context
            .view()
            .map_or(InfoboxState::Hidden, |view| view.map.dispatch(marker_id, kind))
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "search_session_tests.rs"]
mod tests;

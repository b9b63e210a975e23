//! Per-page session context.
//!
//! One context exists per open page. It is built when the page connects,
//! replaced wholesale by [`SessionContext::reset`] on every identity change
//! or "new search", and dropped when the page goes away.

use super::{HistoryFeed, Identity, RenderedResults};

/// Identity state machine: `SignedOut ⇄ SignedIn`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdentityState {
    #[default]
    SignedOut,
    SignedIn(Identity),
}

impl IdentityState {
    /// Current identity, when signed in.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedOut => None,
            Self::SignedIn(identity) => Some(identity),
        }
    }

    /// Whether an identity is established.
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// Mutable state owned by one page session.
#[derive(Debug, Default)]
pub struct SessionContext {
    identity: IdentityState,
    feed: HistoryFeed,
    view: Option<RenderedResults>,
    generation: u64,
}

impl SessionContext {
    /// Fresh, signed-out context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity state.
    pub fn identity(&self) -> &IdentityState {
        &self.identity
    }

    /// History displayed this session.
    pub fn feed(&self) -> &HistoryFeed {
        &self.feed
    }

    /// Mutable access for feeding history entries.
    pub fn feed_mut(&mut self) -> &mut HistoryFeed {
        &mut self.feed
    }

    /// Results currently on screen.
    pub fn view(&self) -> Option<&RenderedResults> {
        self.view.as_ref()
    }

    /// Replace the on-screen results.
    pub fn show(&mut self, rendered: RenderedResults) {
        self.view = Some(rendered);
    }

    /// Generation of the newest search started in this context.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new search generation, superseding any earlier one.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Clear rendered results, history display and per-session counters,
    /// moving to `identity`.
    ///
    /// The generation keeps counting upwards so completions from before the
    /// reset can never match a later search.
    pub fn reset(&mut self, identity: IdentityState) {
        let generation = self.generation + 1;
        *self = Self {
            identity,
            generation,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Budget, CityName, HistoryEntryId, NewHistoryEntry, filter_by_budget, render};
    use chrono::Utc;

    fn populated() -> SessionContext {
        let mut context = SessionContext::new();
        context.reset(IdentityState::SignedIn(Identity::new(
            "uid",
            "ada@example.com",
            "token",
        )));
        context.feed_mut().push(
            NewHistoryEntry {
                city: CityName::normalize("austin").expect("valid city"),
                postal_code: None,
                budget_per_person: Budget::new(10.0).expect("valid budget"),
                owner_email: "ada@example.com".to_owned(),
                recorded_at: Utc::now(),
            }
            .into_entry(HistoryEntryId::new("-k1")),
        );
        context.show(render(&filter_by_budget(
            Vec::new(),
            Budget::new(10.0).expect("valid budget"),
        )));
        context.next_generation();
        context
    }

    #[test]
    fn reset_clears_view_and_history() {
        let mut context = populated();
        context.reset(IdentityState::SignedOut);
        assert!(context.view().is_none());
        assert!(context.feed().is_empty());
        assert!(!context.identity().is_signed_in());
    }

    #[test]
    fn reset_supersedes_in_flight_generations() {
        let mut context = populated();
        let before = context.generation();
        context.reset(IdentityState::SignedOut);
        assert!(context.generation() > before);
    }

    #[test]
    fn reset_can_keep_the_identity() {
        let mut context = populated();
        let identity = context.identity().clone();
        context.reset(identity);
        assert_eq!(
            context.identity().identity().map(Identity::email),
            Some("ada@example.com")
        );
    }
}

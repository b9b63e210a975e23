//! Domain primitives, pure stages and the page-session state machine.
//!
//! Purpose: Define strongly typed search, result and history entities plus
//! the pipeline that turns a submitted form into rendered view-models. Keep
//! types immutable and document invariants and serialisation contracts
//! (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - SearchCriteria, Budget, CityName: validated form input.
//! - RestaurantRecord, ResultSet: provider records and the filtered set.
//! - RenderedResults: map markers and list entries for one search.
//! - HistoryEntry, HistoryFeed: persisted searches and the display window.
//! - SearchPipeline, SearchSession: orchestration for one search and one page.

pub mod auth;
pub mod cost_filter;
pub mod history;
pub mod notice;
pub mod ports;
pub mod presenter;
pub mod restaurant;
pub mod search_criteria;
pub mod search_pipeline;
pub mod search_session;
pub mod session;

pub use self::auth::{Credentials, CredentialsValidationError, Identity};
pub use self::cost_filter::{ResultSet, filter_by_budget, within_budget};
pub use self::history::{
    FeedChange, HISTORY_DISPLAY_CAP, HistoryEntry, HistoryEntryId, HistoryFeed, NewHistoryEntry,
    RecordMode,
};
pub use self::notice::{Notice, NoticeCode, NoticeValidationError};
pub use self::presenter::{
    InfoboxState, ListItem, ListView, MapCenter, MapView, MarkerEventKind, MarkerId,
    MarkerViewModel, RESULT_ZOOM, RenderedResults, WORLD_ZOOM, render,
};
pub use self::restaurant::{Coordinates, LocationId, RestaurantRecord};
pub use self::search_criteria::{Budget, CityName, CriteriaError, SearchCriteria};
pub use self::search_pipeline::{
    DEFAULT_SEARCH_TIMEOUT, PipelineReport, SearchError, SearchOutcome, SearchPipeline,
    SearchPipelinePorts,
};
pub use self::search_session::{
    Dispatch, PendingSearch, SearchCompletion, SearchSession, SessionCommand, SessionEvent,
};
pub use self::session::{IdentityState, SessionContext};

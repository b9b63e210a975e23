//! Wire-level message definitions for the WebSocket adapter.
//!
//! Client frames are decoded into [`ClientMessage`] and converted to domain
//! commands; domain events are transformed into [`ServerMessage`] payloads
//! before being serialised to JSON. Both directions are tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::domain::{
    HistoryEntry, HistoryEntryId, InfoboxState, ListView, MapView, MarkerEventKind, MarkerId,
    Notice, SearchCriteria, SessionCommand, SessionEvent,
};

/// Form field that browsers may send as text or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    Number(serde_json::Number),
}

impl Default for FormValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<FormValue> for String {
    fn from(value: FormValue) -> Self {
        match value {
            FormValue::Text(text) => text,
            FormValue::Number(number) => number.to_string(),
        }
    }
}

/// Inbound request payload provided by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    SubmitSearch {
        budget: FormValue,
        city: String,
        #[serde(default, alias = "zip")]
        postal_code: FormValue,
    },
    ReplaySearch {
        entry_id: HistoryEntryId,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignOut,
    NewSearch,
    MarkerEvent {
        marker_id: MarkerId,
        kind: MarkerEventKind,
    },
}

impl From<ClientMessage> for SessionCommand {
    fn from(value: ClientMessage) -> Self {
        match value {
            ClientMessage::SubmitSearch {
                budget,
                city,
                postal_code,
            } => Self::SubmitSearch {
                budget: budget.into(),
                city,
                postal_code: postal_code.into(),
            },
            ClientMessage::ReplaySearch { entry_id } => Self::ReplaySearch { entry_id },
            ClientMessage::SignIn { email, password } => Self::SignIn { email, password },
            ClientMessage::SignOut => Self::SignOut,
            ClientMessage::NewSearch => Self::NewSearch,
            ClientMessage::MarkerEvent { marker_id, kind } => Self::MarkerEvent { marker_id, kind },
        }
    }
}

/// Outbound payload sent to the page.
#[derive(Debug, Serialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    SearchStarted {
        criteria: SearchCriteria,
    },
    ResultsRendered {
        map: MapView,
        list: ListView,
    },
    Notice(Notice),
    HistoryEntryAdded {
        entry: HistoryEntry,
        #[serde(skip_serializing_if = "Option::is_none")]
        evicted: Option<HistoryEntryId>,
    },
    SessionReset {
        /// Email to show in place of "Guest User"; absent while signed out.
        email: Option<String>,
    },
    Infobox {
        infobox: InfoboxState,
    },
}

impl From<SessionEvent> for ServerMessage {
    fn from(value: SessionEvent) -> Self {
        match value {
            SessionEvent::SearchStarted { criteria } => Self::SearchStarted { criteria },
            SessionEvent::ResultsRendered(rendered) => Self::ResultsRendered {
                map: rendered.map,
                list: rendered.list,
            },
            SessionEvent::Notice(notice) => Self::Notice(notice),
            SessionEvent::HistoryEntryAdded { entry, evicted } => {
                Self::HistoryEntryAdded { entry, evicted }
            }
            SessionEvent::SessionReset { email } => Self::SessionReset { email },
            SessionEvent::Infobox(infobox) => Self::Infobox { infobox },
        }
    }
}

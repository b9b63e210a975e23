//! Reqwest-backed history store for the realtime database REST API.
//!
//! Records live under `/{uid}` and are keyed by push ids, which sort in
//! creation order. Reads ask the database for the newest keys only.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::dto::{HistoryRecordDto, PushResponseDto};
use crate::domain::ports::{HistoryStore, HistoryStoreError};
use crate::domain::{HistoryEntry, HistoryEntryId, Identity, NewHistoryEntry};
use crate::outbound::wire::status_message;

/// Append-only history store keyed by identity uid.
pub struct FirebaseHistoryStore {
    client: Client,
    database_url: Url,
}

impl FirebaseHistoryStore {
    /// Build a store using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(database_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            database_url,
        })
    }

    fn namespace(&self, identity: &Identity) -> Result<Url, HistoryStoreError> {
        let mut url = self.database_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                HistoryStoreError::connection(format!(
                    "database URL {} cannot carry a path",
                    self.database_url
                ))
            })?
            .pop_if_empty()
            .push(&format!("{}.json", identity.uid()));
        Ok(url)
    }
}

#[async_trait]
impl HistoryStore for FirebaseHistoryStore {
    async fn append(
        &self,
        identity: &Identity,
        entry: NewHistoryEntry,
    ) -> Result<HistoryEntry, HistoryStoreError> {
        let response = self
            .client
            .post(self.namespace(identity)?)
            .query(&[("auth", identity.id_token())])
            .json(&HistoryRecordDto::from(&entry))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let pushed: PushResponseDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            HistoryStoreError::serialization(format!("invalid push response: {error}"))
        })?;
        debug!(uid = identity.uid(), key = %pushed.name, "history entry appended");
        Ok(entry.into_entry(HistoryEntryId::new(pushed.name)))
    }

    async fn recent(
        &self,
        identity: &Identity,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, HistoryStoreError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.namespace(identity)?)
            .query(&[
                ("auth", identity.id_token()),
                ("orderBy", "\"$key\""),
                ("limitToLast", limit.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_records(body.as_ref())
    }
}

/// Decode a keyed snapshot into entries, oldest first.
fn parse_records(body: &[u8]) -> Result<Vec<HistoryEntry>, HistoryStoreError> {
    let snapshot: Option<BTreeMap<String, serde_json::Value>> = serde_json::from_slice(body)
        .map_err(|error| {
            HistoryStoreError::serialization(format!("invalid history snapshot: {error}"))
        })?;
    Ok(snapshot
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| {
            let id = HistoryEntryId::new(key);
            let decoded = serde_json::from_value::<HistoryRecordDto>(value)
                .map_err(|error| format!("record {id}: {error}"))
                .and_then(|record| record.into_entry(id));
            decoded
                .inspect_err(|reason| warn!(%reason, "skipping history record"))
                .ok()
        })
        .collect())
}

fn map_transport_error(error: reqwest::Error) -> HistoryStoreError {
    // The query string carries the identity token.
    HistoryStoreError::connection(error.without_url().to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> HistoryStoreError {
    let message = status_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            HistoryStoreError::unauthorized(message)
        }
        StatusCode::BAD_REQUEST => HistoryStoreError::serialization(message),
        _ => HistoryStoreError::connection(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for snapshot decoding and status mapping.

    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    use crate::domain::{Budget, CityName};

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).expect("serialise fixture")
    }

    #[test]
    fn empty_namespace_reads_as_no_entries() {
        let entries = parse_records(b"null").expect("null decodes");
        assert!(entries.is_empty());
    }

    #[test]
    fn entries_come_back_in_key_order() {
        let snapshot = json!({
            "-NxB": { "money": 20, "city": "Boston", "zip": "", "userEmail": "ada@example.com" },
            "-NxA": { "money": "15", "city": "Austin", "zip": "78701", "userEmail": "ada@example.com",
                      "recordedAt": "2026-03-14T12:00:00Z" }
        });

        let entries = parse_records(&body(snapshot)).expect("snapshot decodes");

        let keys: Vec<_> = entries.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(keys, ["-NxA", "-NxB"]);
        assert_eq!(entries[0].postal_code.as_deref(), Some("78701"));
        assert_eq!(entries[0].budget_per_person.amount(), 15.0);
        assert!(entries[0].recorded_at.is_some());
        assert_eq!(entries[1].postal_code, None);
        assert_eq!(entries[1].recorded_at, None);
    }

    #[test]
    fn unusable_records_are_skipped() {
        let snapshot = json!({
            "-NxA": { "money": "lots", "city": "Austin" },
            "-NxB": { "money": 10, "city": "   " },
            "-NxC": { "money": 10, "city": "denver" },
            "-NxD": "not a record"
        });

        let entries = parse_records(&body(snapshot)).expect("snapshot decodes");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].city.as_ref(), "Denver");
    }

    #[test]
    fn appended_records_use_the_stored_field_names() {
        let entry = NewHistoryEntry {
            city: CityName::normalize("austin").expect("valid city"),
            postal_code: None,
            budget_per_person: Budget::new(12.5).expect("valid budget"),
            owner_email: "ada@example.com".to_owned(),
            recorded_at: Utc
                .with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
                .single()
                .expect("valid time"),
        };

        let value = serde_json::to_value(HistoryRecordDto::from(&entry)).expect("serialise");

        assert_eq!(
            value,
            json!({
                "money": 12.5,
                "city": "Austin",
                "zip": "",
                "userEmail": "ada@example.com",
                "recordedAt": "2026-03-14T12:00:00Z"
            })
        );
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case(StatusCode::FORBIDDEN, "Unauthorized")]
    #[case(StatusCode::BAD_REQUEST, "Serialization")]
    #[case(StatusCode::SERVICE_UNAVAILABLE, "Connection")]
    fn maps_http_statuses_to_store_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"error\":\"Permission denied\"}");
        let matched = match expected {
            "Unauthorized" => matches!(error, HistoryStoreError::Unauthorized { .. }),
            "Serialization" => matches!(error, HistoryStoreError::Serialization { .. }),
            "Connection" => matches!(error, HistoryStoreError::Connection { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }
}

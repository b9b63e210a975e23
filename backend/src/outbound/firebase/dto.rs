//! DTOs for the identity toolkit and realtime database REST payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Budget, CityName, HistoryEntry, HistoryEntryId, NewHistoryEntry};
use crate::outbound::wire::NumberOrText;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthResponseDto {
    pub(super) local_id: String,
    pub(super) email: String,
    pub(super) id_token: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    pub(super) message: String,
}

/// Stored shape of one history record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HistoryRecordDto {
    money: NumberOrText,
    city: String,
    #[serde(default)]
    zip: String,
    #[serde(default)]
    user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_at: Option<DateTime<Utc>>,
}

impl From<&NewHistoryEntry> for HistoryRecordDto {
    fn from(entry: &NewHistoryEntry) -> Self {
        let money = serde_json::Number::from_f64(entry.budget_per_person.amount())
            .map_or_else(
                || NumberOrText::Text(entry.budget_per_person.to_string()),
                NumberOrText::Number,
            );
        Self {
            money,
            city: entry.city.to_string(),
            zip: entry.postal_code.clone().unwrap_or_default(),
            user_email: entry.owner_email.clone(),
            recorded_at: Some(entry.recorded_at),
        }
    }
}

impl HistoryRecordDto {
    /// Map a stored record to a domain entry, rejecting unusable ones.
    pub(super) fn into_entry(self, id: HistoryEntryId) -> Result<HistoryEntry, String> {
        let amount = self
            .money
            .as_f64()
            .ok_or_else(|| format!("record {id} has a non-numeric budget"))?;
        let budget_per_person =
            Budget::new(amount).map_err(|error| format!("record {id}: {error}"))?;
        let city =
            CityName::normalize(&self.city).map_err(|error| format!("record {id}: {error}"))?;
        let zip = self.zip.trim();
        Ok(HistoryEntry {
            id,
            city,
            postal_code: (!zip.is_empty()).then(|| zip.to_owned()),
            budget_per_person,
            owner_email: self.user_email,
            recorded_at: self.recorded_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PushResponseDto {
    pub(super) name: String,
}

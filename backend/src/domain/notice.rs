//! User-visible failure notices.
//!
//! Notices are transport agnostic. The WebSocket adapter serialises them as
//! they are; any other adapter can map the code to its own envelope.

use serde::{Deserialize, Serialize};

/// Stable machine-readable code describing what the user should be told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum NoticeCode {
    /// Form or command input failed validation.
    InvalidRequest,
    /// The provider had no usable match for the city.
    CityNotFound,
    /// The budget filter left nothing to show.
    NoResults,
    /// A provider call failed or timed out.
    SearchFailed,
    /// Sign-in or registration failed.
    AuthFailed,
}

/// Notice payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use welp_backend::domain::{Notice, NoticeCode};
///
/// let notice = Notice::city_not_found("Atlantis");
/// assert_eq!(notice.code(), NoticeCode::CityNotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "NoticeDto", into = "NoticeDto")]
pub struct Notice {
    code: NoticeCode,
    message: String,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeValidationError {
    EmptyMessage,
}

impl std::fmt::Display for NoticeValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "notice message must not be empty"),
        }
    }
}

impl std::error::Error for NoticeValidationError {}

impl Notice {
    /// Fallible constructor that validates the message content.
    pub fn try_new(
        code: NoticeCode,
        message: impl Into<String>,
    ) -> Result<Self, NoticeValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(NoticeValidationError::EmptyMessage);
        }
        Ok(Self { code, message })
    }

    /// Build a notice, substituting a generic message when the given one is blank.
    pub fn new(code: NoticeCode, message: impl Into<String>) -> Self {
        Self::try_new(code, message).unwrap_or_else(|_| Self {
            code,
            message: Self::fallback_message(code).to_owned(),
        })
    }

    fn fallback_message(code: NoticeCode) -> &'static str {
        match code {
            NoticeCode::InvalidRequest => "Please check your search and try again.",
            NoticeCode::CityNotFound => "City not found.",
            NoticeCode::NoResults => "No restaurants match your budget.",
            NoticeCode::SearchFailed => "Search failed. Please try again.",
            NoticeCode::AuthFailed => "Sign-in failed.",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> NoticeCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Convenience constructor for [`NoticeCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(NoticeCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`NoticeCode::CityNotFound`].
    pub fn city_not_found(city: impl std::fmt::Display) -> Self {
        Self::new(
            NoticeCode::CityNotFound,
            format!("We couldn't find a city called \"{city}\"."),
        )
    }

    /// Convenience constructor for [`NoticeCode::NoResults`].
    pub fn no_results() -> Self {
        Self::new(
            NoticeCode::NoResults,
            Self::fallback_message(NoticeCode::NoResults),
        )
    }

    /// Convenience constructor for [`NoticeCode::SearchFailed`].
    pub fn search_failed() -> Self {
        Self::new(
            NoticeCode::SearchFailed,
            Self::fallback_message(NoticeCode::SearchFailed),
        )
    }

    /// Convenience constructor for [`NoticeCode::AuthFailed`].
    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(NoticeCode::AuthFailed, message)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoticeDto {
    code: NoticeCode,
    message: String,
}

impl From<Notice> for NoticeDto {
    fn from(value: Notice) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

impl TryFrom<NoticeDto> for Notice {
    type Error = NoticeValidationError;

    fn try_from(value: NoticeDto) -> Result<Self, Self::Error> {
        Notice::try_new(value.code, value.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_blank_messages() {
        assert_eq!(
            Notice::try_new(NoticeCode::SearchFailed, "  "),
            Err(NoticeValidationError::EmptyMessage)
        );
    }

    #[test]
    fn blank_message_falls_back_to_generic_text() {
        let notice = Notice::auth_failed("");
        assert_eq!(notice.message(), "Sign-in failed.");
    }

    #[test]
    fn serialises_with_snake_case_code() {
        let value = serde_json::to_value(Notice::no_results()).expect("serialise notice");
        assert_eq!(
            value,
            json!({ "code": "no_results", "message": "No restaurants match your budget." })
        );
    }

    #[test]
    fn deserialisation_enforces_the_invariant() {
        let result: Result<Notice, _> =
            serde_json::from_value(json!({ "code": "city_not_found", "message": "" }));
        assert!(result.is_err());
    }
}

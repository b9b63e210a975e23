//! Service configuration loaded via OrthoConfig.
//!
//! Every value can be supplied through `WELP_*` environment variables,
//! command-line flags or a configuration file. Only the restaurant provider
//! key is mandatory; history and sign-in fall back to in-memory adapters
//! when Firebase is not configured.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::DEFAULT_SEARCH_TIMEOUT;
use crate::inbound::ws::AllowedOrigins;
use crate::outbound::firebase::DEFAULT_IDENTITY_BASE_URL;
use crate::outbound::zomato::DEFAULT_ZOMATO_BASE_URL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while turning raw settings into usable values.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// No restaurant provider key was supplied.
    #[error("restaurant provider API key is not configured (set WELP_ZOMATO_API_KEY)")]
    MissingZomatoKey,
    /// The bind address is not a socket address.
    #[error("invalid bind address {raw:?}: {source}")]
    BindAddr {
        raw: String,
        source: std::net::AddrParseError,
    },
    /// A configured URL, or one of the allowed origins, failed to parse.
    #[error("invalid {name} URL {raw:?}: {source}")]
    Url {
        name: &'static str,
        raw: String,
        source: url::ParseError,
    },
}

/// Runtime settings for the search service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WELP")]
pub struct WelpSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Restaurant provider API key.
    pub zomato_api_key: Option<String>,
    /// Restaurant provider base URL override.
    pub zomato_base_url: Option<String>,
    /// Web API key of the Firebase project.
    pub firebase_api_key: Option<String>,
    /// Realtime database root, e.g. `https://project.firebaseio.com`.
    pub firebase_database_url: Option<String>,
    /// Identity Toolkit base URL override.
    pub identity_base_url: Option<String>,
    /// Per-request timeout for outbound HTTP calls, in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Deadline for a whole search, in milliseconds.
    pub search_timeout_ms: Option<u64>,
    /// Comma-separated origins allowed to open a WebSocket session.
    pub allowed_origins: Option<String>,
}

/// Firebase project coordinates, present only when fully configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseSettings {
    pub api_key: String,
    pub database_url: Url,
    pub identity_base_url: Url,
}

impl WelpSettings {
    /// Return the bind address, falling back to all interfaces on 8080.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            raw: raw.to_owned(),
            source,
        })
    }

    /// Return the provider key; searching is impossible without one.
    pub fn zomato_api_key(&self) -> Result<&str, SettingsError> {
        self.zomato_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingZomatoKey)
    }

    /// Return the provider base URL, falling back to the public endpoint.
    pub fn zomato_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "restaurant provider",
            self.zomato_base_url
                .as_deref()
                .unwrap_or(DEFAULT_ZOMATO_BASE_URL),
        )
    }

    /// Return the outbound request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Return the whole-search deadline.
    pub fn search_timeout(&self) -> Duration {
        self.search_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SEARCH_TIMEOUT)
    }

    /// Return the WebSocket origin allow-list; empty admits localhost only.
    pub fn allowed_origins(&self) -> Result<AllowedOrigins, SettingsError> {
        let raw = self.allowed_origins.as_deref().unwrap_or_default();
        AllowedOrigins::parse_list(raw).map_err(|source| SettingsError::Url {
            name: "allowed origin",
            raw: raw.to_owned(),
            source,
        })
    }

    /// Return Firebase settings when both the key and database are set.
    pub fn firebase(&self) -> Result<Option<FirebaseSettings>, SettingsError> {
        let (Some(api_key), Some(database_url)) = (
            non_blank(self.firebase_api_key.as_deref()),
            non_blank(self.firebase_database_url.as_deref()),
        ) else {
            return Ok(None);
        };
        let identity_base_url = self
            .identity_base_url
            .as_deref()
            .unwrap_or(DEFAULT_IDENTITY_BASE_URL);
        Ok(Some(FirebaseSettings {
            api_key: api_key.to_owned(),
            database_url: parse_url("database", database_url)?,
            identity_base_url: parse_url("identity", identity_base_url)?,
        }))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|source| SettingsError::Url {
        name,
        raw: raw.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 9] = [
        "WELP_BIND_ADDR",
        "WELP_ZOMATO_API_KEY",
        "WELP_ZOMATO_BASE_URL",
        "WELP_FIREBASE_API_KEY",
        "WELP_FIREBASE_DATABASE_URL",
        "WELP_IDENTITY_BASE_URL",
        "WELP_REQUEST_TIMEOUT_MS",
        "WELP_SEARCH_TIMEOUT_MS",
        "WELP_ALLOWED_ORIGINS",
    ];

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        KEYS.iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| (*value).to_owned());
                (*key, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> WelpSettings {
        WelpSettings::load_from_iter([OsString::from("welp")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("socket address")
        );
        assert!(matches!(
            settings.zomato_api_key(),
            Err(SettingsError::MissingZomatoKey)
        ));
        assert_eq!(
            settings.zomato_base_url().expect("base url").as_str(),
            DEFAULT_ZOMATO_BASE_URL
        );
        assert_eq!(settings.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(settings.search_timeout(), DEFAULT_SEARCH_TIMEOUT);
        assert_eq!(settings.firebase().expect("firebase settings"), None);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("WELP_BIND_ADDR", "127.0.0.1:9000"),
            ("WELP_ZOMATO_API_KEY", "zomato-key"),
            ("WELP_FIREBASE_API_KEY", "firebase-key"),
            ("WELP_FIREBASE_DATABASE_URL", "https://welp.firebaseio.com"),
            ("WELP_REQUEST_TIMEOUT_MS", "2500"),
            ("WELP_SEARCH_TIMEOUT_MS", "8000"),
            ("WELP_ALLOWED_ORIGINS", "https://welp.example"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind address").port(),
            9000
        );
        assert_eq!(settings.zomato_api_key().expect("key"), "zomato-key");
        assert_eq!(settings.request_timeout(), Duration::from_millis(2500));
        assert_eq!(settings.search_timeout(), Duration::from_millis(8000));

        let firebase = settings
            .firebase()
            .expect("firebase settings")
            .expect("firebase configured");
        assert_eq!(firebase.api_key, "firebase-key");
        assert_eq!(firebase.database_url.host_str(), Some("welp.firebaseio.com"));
        assert_eq!(
            firebase.identity_base_url.as_str(),
            DEFAULT_IDENTITY_BASE_URL
        );

        let origins = settings.allowed_origins().expect("origins");
        assert!(origins.allows(&Url::parse("https://welp.example").expect("url")));
    }

    #[rstest]
    fn firebase_requires_both_key_and_database() {
        let _guard = lock_env(env_with(&[("WELP_FIREBASE_API_KEY", "firebase-key")]));

        let settings = load_from_empty_args();
        assert_eq!(settings.firebase().expect("firebase settings"), None);
    }

    #[rstest]
    #[case("WELP_BIND_ADDR", "not-an-address", "bind_addr")]
    #[case("WELP_ZOMATO_BASE_URL", "not a url", "zomato_base_url")]
    #[case("WELP_ALLOWED_ORIGINS", "https://ok.example, nope", "allowed_origins")]
    fn malformed_values_are_reported(
        #[case] key: &str,
        #[case] value: &str,
        #[case] rejected_by: &str,
    ) {
        let _guard = lock_env(env_with(&[(key, value)]));

        let settings = load_from_empty_args();
        let failures = [
            ("bind_addr", settings.bind_addr().is_err()),
            ("zomato_base_url", settings.zomato_base_url().is_err()),
            ("allowed_origins", settings.allowed_origins().is_err()),
        ];
        for (accessor, failed) in failures {
            assert_eq!(
                failed,
                accessor == rejected_by,
                "{key}={value} checked through {accessor}"
            );
        }
    }
}

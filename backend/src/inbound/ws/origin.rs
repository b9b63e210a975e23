//! Origin allow-list for WebSocket upgrades.

use url::{Origin, Url};

const LOCALHOST: &str = "localhost";

/// Origins permitted to open a session.
///
/// HTTP requests from localhost with a non-zero explicit port are always
/// accepted so local development needs no configuration. Any other origin
/// must match a configured entry exactly (scheme, host and port).
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins(Vec<Origin>);

impl AllowedOrigins {
    /// Allow-list from parsed URLs; only their origins are kept.
    pub fn new(origins: impl IntoIterator<Item = Url>) -> Self {
        Self(origins.into_iter().map(|url| url.origin()).collect())
    }

    /// Parse a comma-separated list, ignoring blank entries.
    ///
    /// # Examples
    /// ```
    /// use url::Url;
    /// use welp_backend::inbound::ws::AllowedOrigins;
    ///
    /// let origins = AllowedOrigins::parse_list("https://welp.example, ").expect("valid list");
    /// assert!(origins.allows(&Url::parse("https://welp.example").expect("url")));
    /// assert!(!origins.allows(&Url::parse("https://evil.example").expect("url")));
    /// ```
    pub fn parse_list(raw: &str) -> Result<Self, url::ParseError> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Url::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Returns true when a parsed Origin may open a session.
    pub fn allows(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };
        if origin.scheme() == "http" && host == LOCALHOST {
            return matches!(origin.port(), Some(port) if port != 0);
        }
        let origin = origin.origin();
        origin.is_tuple() && self.0.contains(&origin)
    }
}

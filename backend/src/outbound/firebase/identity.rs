//! Reqwest-backed identity provider for the identity toolkit REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{AuthResponseDto, ErrorEnvelopeDto, PasswordRequestDto};
use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{Credentials, Identity};
use crate::outbound::wire::status_message;

/// Identity toolkit endpoint used when no base URL is configured.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

const SIGN_IN_ACTION: &str = "accounts:signInWithPassword";
const SIGN_UP_ACTION: &str = "accounts:signUp";

/// Email/password identity provider backed by the identity toolkit.
pub struct FirebaseIdentityProvider {
    client: Client,
    base_url: Url,
    api_key: Zeroizing<String>,
}

impl FirebaseIdentityProvider {
    /// Build a provider using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: Zeroizing::new(api_key.into()),
        })
    }

    fn endpoint(&self, action: &str) -> Result<Url, IdentityProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                IdentityProviderError::rejected(format!(
                    "base URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(action);
        Ok(url)
    }

    async fn authenticate(
        &self,
        action: &str,
        credentials: &Credentials,
    ) -> Result<Identity, IdentityProviderError> {
        let response = self
            .client
            .post(self.endpoint(action)?)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequestDto {
                email: credentials.email(),
                password: credentials.password(),
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_error_response(status, body.as_ref()));
        }
        parse_identity(body.as_ref())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError> {
        debug!("signing in with password");
        self.authenticate(SIGN_IN_ACTION, credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError> {
        debug!("registering new account");
        self.authenticate(SIGN_UP_ACTION, credentials).await
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), IdentityProviderError> {
        // Tokens are stateless on the provider side; dropping ours is enough.
        debug!(uid = identity.uid(), "discarding identity token");
        Ok(())
    }
}

fn parse_identity(body: &[u8]) -> Result<Identity, IdentityProviderError> {
    let decoded: AuthResponseDto = serde_json::from_slice(body).map_err(|error| {
        IdentityProviderError::rejected(format!("invalid sign-in payload: {error}"))
    })?;
    Ok(Identity::new(
        decoded.local_id,
        decoded.email,
        decoded.id_token,
    ))
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    IdentityProviderError::transport(error.without_url().to_string())
}

fn map_error_response(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let Ok(envelope) = serde_json::from_slice::<ErrorEnvelopeDto>(body) else {
        return map_status(status, body);
    };
    let (code, detail) = match envelope.error.message.split_once(':') {
        Some((code, detail)) => (code.trim().to_owned(), detail.trim().to_owned()),
        None => (envelope.error.message.trim().to_owned(), String::new()),
    };
    match code.as_str() {
        "EMAIL_NOT_FOUND" => IdentityProviderError::AccountNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            IdentityProviderError::InvalidCredentials
        }
        "USER_DISABLED" => IdentityProviderError::Disabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => IdentityProviderError::RateLimited,
        "EMAIL_EXISTS" => IdentityProviderError::AccountExists,
        "INVALID_EMAIL" => IdentityProviderError::InvalidEmail,
        "WEAK_PASSWORD" if detail.is_empty() => {
            IdentityProviderError::weak_password("use at least 6 characters")
        }
        "WEAK_PASSWORD" => IdentityProviderError::weak_password(detail),
        _ => IdentityProviderError::rejected(envelope.error.message),
    }
}

fn map_status(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let message = status_message(status, body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => IdentityProviderError::RateLimited,
        _ if status.is_server_error() => IdentityProviderError::transport(message),
        _ => IdentityProviderError::rejected(message),
    }
}

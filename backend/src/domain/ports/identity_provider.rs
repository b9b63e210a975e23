//! Driven port for email/password authentication.
//!
//! The session calls this port to sign in, register on first sign-in, and
//! sign out without knowing which identity service backs it.

use async_trait::async_trait;

use crate::domain::{Credentials, Identity};

/// Errors surfaced by identity provider adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityProviderError {
    /// No account exists for the email; callers register instead.
    #[error("no account exists for this email")]
    AccountNotFound,
    /// Email exists but the password is wrong.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// Registration found an existing account.
    #[error("an account already exists for this email")]
    AccountExists,
    /// The account has been disabled by an administrator.
    #[error("this account has been disabled")]
    Disabled,
    /// Email is not well formed.
    #[error("email address is not valid")]
    InvalidEmail,
    /// Password does not meet the provider's strength policy.
    #[error("password is too weak: {message}")]
    WeakPassword { message: String },
    /// Too many attempts; try later.
    #[error("too many attempts, try again later")]
    RateLimited,
    /// Provider rejected the request for another reason.
    #[error("identity provider rejected request: {message}")]
    Rejected { message: String },
    /// Network transport failed or timed out.
    #[error("identity provider transport failed: {message}")]
    Transport { message: String },
}

impl IdentityProviderError {
    /// Build a [`Self::WeakPassword`] error.
    pub fn weak_password(message: impl Into<String>) -> Self {
        Self::WeakPassword {
            message: message.into(),
        }
    }

    /// Build a [`Self::Rejected`] error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Build a [`Self::Transport`] error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Message suitable for showing to the person signing in.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } | Self::Rejected { .. } => {
                "Sign-in is unavailable right now. Please try again.".to_owned()
            }
            Self::InvalidCredentials => "Wrong password for this email.".to_owned(),
            other => {
                let text = other.to_string();
                let mut chars = text.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect::<String>() + "."
                })
            }
        }
    }
}

/// Port for authenticating users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in an existing account.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError>;

    /// Create an account and return it signed in.
    async fn register(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError>;

    /// End the provider-side session for an identity.
    async fn sign_out(&self, identity: &Identity) -> Result<(), IdentityProviderError>;
}

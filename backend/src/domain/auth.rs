//! Sign-in credentials and the authenticated identity.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a session talks to the identity port.

use std::fmt;

use zeroize::Zeroizing;

/// Domain error returned when sign-in form values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank once trimmed.
    EmptyPassword,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated email/password pair.
///
/// ## Invariants
/// - `email` and `password` are trimmed and non-empty; the sign-in form trims
///   both fields before submitting them.
///
/// # Examples
/// ```
/// use welp_backend::domain::Credentials;
///
/// let creds = Credentials::try_from_parts(" ada@example.com ", "hunter22 ").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Construct credentials from raw form inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }
        let password = password.trim();
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Account email.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated user as reported by the identity provider.
///
/// `uid` names the user's namespace in the record store; `id_token`
/// authorises record-store calls and is wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    uid: String,
    email: String,
    id_token: Zeroizing<String>,
}

impl Identity {
    /// Build an identity from provider output.
    pub fn new(uid: impl Into<String>, email: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            id_token: Zeroizing::new(id_token.into()),
        }
    }

    /// Provider-unique user id.
    pub fn uid(&self) -> &str {
        self.uid.as_str()
    }

    /// Account email shown in place of "Guest User".
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Bearer token for record-store calls.
    pub fn id_token(&self) -> &str {
        self.id_token.as_str()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("   ", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("ada@example.com", "", CredentialsValidationError::EmptyPassword)]
    #[case("ada@example.com", "  ", CredentialsValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        let err =
            Credentials::try_from_parts(email, password).expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  ada@example.com  ", "secret")]
    #[case("bob@example.com", " correct horse battery staple ")]
    fn valid_credentials_are_trimmed(#[case] email: &str, #[case] password: &str) {
        let creds =
            Credentials::try_from_parts(email, password).expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password.trim());
    }

    #[test]
    fn identity_debug_redacts_the_token() {
        let identity = Identity::new("uid-1", "ada@example.com", "secret-token");
        let rendered = format!("{identity:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("uid-1"));
    }

    #[test]
    fn credentials_debug_redacts_the_password() {
        let creds = Credentials::try_from_parts("ada@example.com", "hunter22")
            .expect("valid inputs should succeed");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter22"));
        assert!(rendered.contains("ada@example.com"));
    }
}

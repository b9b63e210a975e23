//! Identity and history adapters for the Firebase REST APIs.
//!
//! Both adapters speak plain JSON over HTTPS; no SDK is involved. The
//! identity provider exchanges email and password for an id token, and the
//! history store presents that token on every database call.

mod dto;
mod identity;
mod records;

pub use identity::{DEFAULT_IDENTITY_BASE_URL, FirebaseIdentityProvider};
pub use records::FirebaseHistoryStore;

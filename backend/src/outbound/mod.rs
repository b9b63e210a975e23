//! Outbound adapters implementing domain ports for external services.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **zomato**: restaurant search over the provider's REST API
//! - **firebase**: identity toolkit sign-in and realtime database history
//! - **memory**: process-local stand-ins used when Firebase is not configured
//!
//! Adapters are thin translators that convert between domain types and
//! wire representations. They contain no business logic.

pub mod firebase;
pub mod memory;
mod wire;
pub mod zomato;

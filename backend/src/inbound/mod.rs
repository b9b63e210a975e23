//! Inbound adapters that translate page traffic into domain calls while
//! keeping framework details at the edge.
//!
//! The browser page talks to the service over the WebSocket adapter in
//! [`ws`].

pub mod ws;

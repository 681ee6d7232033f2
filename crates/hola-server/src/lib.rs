//! hola server library entry.
//!
//! Wires the shared metrics registry, the two endpoints and the route
//! table into an axum `Router`. Consumed by the binary (`main.rs`) and by
//! integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod handlers;
pub mod obs;
pub mod ops;
pub mod router;

/// Listen address: all interfaces, port 5000, no TLS.
pub const LISTEN: &str = "0.0.0.0:5000";

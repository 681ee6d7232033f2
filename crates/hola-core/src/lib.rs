//! hola core: error types and Prometheus text exposition primitives.
//!
//! This crate carries no runtime or HTTP dependencies. The server crate
//! renders its registry through the helpers here, and tests parse scrapes
//! back with [`exposition::parse`].
//!
//! Panics, `unwrap`, and `expect` are compile-denied; malformed input
//! surfaces as `HolaError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;

pub use error::{ErrorCode, HolaError, Result};

//! Request metrics and their text rendering.
//!
//! One [`metrics::Registry`] is built at startup and shared through
//! `AppState`; `/` updates it and `/metrics` renders it.

pub mod metrics;

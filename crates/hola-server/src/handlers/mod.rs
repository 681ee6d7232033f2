//! Application endpoints.

pub mod home;

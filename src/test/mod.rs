//! End-to-end tests that drive the HTTP router against a mocked provider.

pub mod utils;

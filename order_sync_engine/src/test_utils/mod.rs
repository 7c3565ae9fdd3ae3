//! Database helpers for tests in this crate and in the crates that build on it. Enabled with the `test_utils` feature.
pub mod prepare_env;

pub use prepare_env::prepare_test_db;

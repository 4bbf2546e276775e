//! Helpers for integration tests: disposable databases and seed data.

mod prepare_env;
mod seed;

pub use prepare_env::{create_database, prepare_test_env, random_db_path, run_migrations};
pub use seed::seed_show;

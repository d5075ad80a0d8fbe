//! Helpers for setting up throwaway databases and fixture data in tests.

mod prepare_env;
mod seeds;

pub use prepare_env::{drop_file_database, new_file_database, new_test_database, random_db_url};
pub use seeds::{seed_listing, seed_package};

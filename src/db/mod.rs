//! SQLite persistence: schema setup and the repository over fills, configured
//! royalties and attribution reports.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;

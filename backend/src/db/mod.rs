pub mod connection;
pub mod migrations;
pub mod pairings;
pub mod participants;
pub mod store;

pub use connection::{get_db_pool, DatabaseConfig};
pub use store::PgStore;

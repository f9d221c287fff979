pub mod backup;
mod connection;
pub mod migration_runner;

pub use connection::Database;

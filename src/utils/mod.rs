pub mod archive;
pub mod command;
pub mod deps;
pub mod mysql;
pub mod sweep;

// Re-export the server seam used by the orchestrator and tests
pub use mysql::{DatabaseServer, MysqlTools};

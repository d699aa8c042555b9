pub mod auth;
pub mod client;
pub mod commands;
pub mod error;
pub mod parser;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use commands::{run_probes, RunOptions};
pub use report::generate_report;
pub use runner::Harness;

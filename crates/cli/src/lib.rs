// Re-export command modules
pub mod commands;
pub mod logging;

pub use commands::Commands;

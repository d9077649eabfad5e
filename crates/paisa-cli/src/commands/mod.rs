//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `advice` - Capability commands (predict, categorize, tips, forecast, analyze)
//! - `core` - Shared utilities (selector start-up, CSV input, JSON output)
//! - `serve` - Web server command
//! - `status` - Configuration and layer availability

pub mod advice;
pub mod core;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use advice::*;
pub use core::*;
pub use serve::*;
pub use status::*;

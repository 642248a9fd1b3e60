// Library exports for testing
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod quota_db;
pub mod renderer;
pub mod scan;
pub mod source;
pub mod stats;
pub mod summarizer;
pub mod timefmt;
pub mod window;

pub mod apis;
pub mod common;
pub mod config;
pub mod geocode;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod snapshot;

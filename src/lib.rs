//! Perpguin Library
//!
//! Synthetic trade history, statistics and price lookups behind the
//! Perpguin marketing site

pub mod config;
pub mod desk;
pub mod oracle;
pub mod server;
pub mod stats;
pub mod synth;
pub mod types;

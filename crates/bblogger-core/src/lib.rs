//! bblogger-core - broadband modem statistics acquisition.
//!
//! Provides:
//! - `session`: prompt-delimited telnet command/response transport
//! - `catalog`: ordered statistic identifiers with extraction rules
//! - `driver`: per-modem-model prompts and catalogs
//! - `reader`: one acquisition cycle into the stat value store
//! - `scheduler`: bounded, fixed-interval polling with day rotation
//! - `report`: dump and CSV reporters with optional per-day files
//! - `config`: credentials, session and polling settings, hosts file
//! - `fmt`: shared formatting helpers (elapsed time, timestamps)

pub mod catalog;
pub mod config;
pub mod driver;
pub mod fmt;
pub mod reader;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod store;

//! Domain types - core business entities
//!
//! These types describe the watched file's lines and the configuration that
//! drives the daemon. They carry no I/O of their own.

pub mod config;
pub mod line;

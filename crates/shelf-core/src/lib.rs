//! Core domain + application logic for the shelf community bot.
//!
//! This crate is framework-agnostic. The chat platform and the door service
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod door;
pub mod errors;
pub mod legacy;
pub mod logging;
pub mod messaging;
pub mod scheduler;
pub mod security;
pub mod store;
pub mod suggest;
pub mod sweeper;

pub use errors::{Error, Result};

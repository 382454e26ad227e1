//! Settings and scaling-profile persistence for the magnifier
//!
//! Loads the JSON settings document, keeps the session's settings in memory
//! with change notifications, and writes them back deterministically.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod events;
pub mod hotkeys;

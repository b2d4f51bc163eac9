//! Utilities shared across modules

pub mod payload;
pub mod suffix;
pub mod time;

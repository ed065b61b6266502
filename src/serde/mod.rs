//! Serde helpers.

pub mod address;
pub mod duration;

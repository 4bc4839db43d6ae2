//! CLI command handlers

pub mod chunk;
pub mod index;
pub mod languages;

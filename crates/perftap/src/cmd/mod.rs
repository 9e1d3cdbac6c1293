//! Command implementations for the perftap CLI

pub mod categories;
pub mod serve;
pub mod tail;

//! Command implementations for the Kiln CLI.

pub mod eval;
pub mod journal;
pub mod train;

//! Test fixtures shared across modules.

pub mod context;
pub mod mock;
pub mod pdf;

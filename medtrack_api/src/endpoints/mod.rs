//! Thin handlers over the core: extract, call, map the result.

pub mod logs;
pub mod medications;
pub mod notes;

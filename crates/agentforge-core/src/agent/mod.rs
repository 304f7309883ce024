//! Agent prompt assembly and tool descriptors.

pub mod prompt;
pub mod tool;

//! Subcommand modules for the `chainmsa` binary.

pub mod align;
pub mod check;
pub mod select;

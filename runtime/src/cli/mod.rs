//! CLI subcommand implementations for the `handbook` binary.

pub mod extract_cmd;
pub mod harvest_cmd;
pub mod output;
pub mod tree_cmd;

//! rtmon subcommands.

pub mod monitor;
pub mod route_get;

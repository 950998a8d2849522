//! CLI command handlers, one file per command.

mod config;
mod fetch;
mod list;

pub use config::run_show_config;
pub use fetch::{run_fetch, FetchOverrides};
pub use list::run_list;

//! CLI command handlers.

mod config;
mod fetch;
mod status;

pub use config::{
    run_config_path_command, run_config_reset_command, run_config_set_command,
    run_config_show_command,
};
pub use fetch::run_fetch_command;
pub use status::run_status_command;

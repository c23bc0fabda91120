pub mod commands;
pub mod handlers;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    EXIT_BROKEN_LINKS, EXIT_ERROR, EXIT_OK, build_config, exit_code_for, locate_index,
    sweep_options,
};

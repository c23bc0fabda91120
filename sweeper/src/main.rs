use sweeper::command_argument_builder;
use sweeper::handlers::{handle_open, handle_sweep};
use sweeper_core::print_banner;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    init_tracing(verbose);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let code = match chosen_command.subcommand() {
        None => return,
        Some(("sweep", primary_command)) => handle_sweep(primary_command, quiet).await,
        Some(("open", primary_command)) => handle_open(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

use colored::Colorize;

pub mod config;
pub mod progress;
pub mod report;
pub mod sweep;

pub use sweep::{SweepCoordinator, SweepHandle, SweepOptions, SweepReport};

const BANNER: &str = r#"
  ___ _ _ _ ___ ___ ___ ___ ___
 / __| | | | __| __| _ \ __| _ \
 \__ \ V V / _|| _||  _/ _||   /
 |___/\_/\_/|___|___|_| |___|_|_\
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "mirror a site for offline viewing".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

use clap::{arg, command};
use sweeper_core::sweep::DEFAULT_OUTPUT_DIR;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <DIR>)
        .required(false)
        .help("Directory the mirror is written to (wiped at the start of every sweep)")
        .default_value(DEFAULT_OUTPUT_DIR)
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sweeper")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sweeper")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner, progress and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable info-level logging on stderr (RUST_LOG overrides)").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("sweep")
                .about(
                    "Mirror every in-scope page reachable from URL for offline viewing, then \
                audit which visited links still resolve.",
                )
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .help("The seed URL. http:// is assumed when no scheme is given"),
                )
                .arg(output_arg())
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("JSON config file. Flags given on the command line take precedence"),
                )
                .arg(
                    arg!(--"max-pages" <NUM>)
                        .required(false)
                        .help("Stop scheduling new pages after NUM URLs (0 for no limit)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-depth" <NUM>)
                        .required(false)
                        .help("Do not follow links more than NUM hops from the seed")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"scope" <MODE>)
                        .required(false)
                        .help("Scope test: strict (same origin, path under the seed) or prefix (raw string prefix)")
                        .value_parser(["strict", "prefix"]),
                )
                .arg(
                    arg!(--"asset-naming" <MODE>)
                        .required(false)
                        .help("Asset file names: hashed (collision free) or segment (last path segment)")
                        .value_parser(["hashed", "segment"]),
                )
                .arg(
                    arg!(--"link-base" <BASE>)
                        .required(false)
                        .help("Resolve relative links against the site root or the current page")
                        .value_parser(["root", "page"]),
                )
                .arg(
                    arg!(--"render-timeout" <MS>)
                        .required(false)
                        .help("Page render timeout in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"resource-timeout" <MS>)
                        .required(false)
                        .help("Embedded resource download timeout in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"audit-timeout" <MS>)
                        .required(false)
                        .help("Link audit request timeout in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"report" <PATH>)
                        .required(false)
                        .help("Save the report to a file (default: print to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("open")
                .about("Print the path of the mirrored index.html")
                .arg(output_arg()),
        )
}

use std::process::ExitCode;

use clap::Parser;
use glyphd::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize unified logging: routes all log::info!() etc. to /tmp/glyphd_debug.log.
    // When RUST_LOG is set, also mirrors to stderr for terminal debugging.
    // CLI --log-level flag takes highest precedence, then RUST_LOG, then config (applied later).
    glyphd::debug::init_log_bridge(cli.log_level.map(|level| level.to_level_filter()));

    log::info!("Starting glyphd {}", glyphd::VERSION);

    let result = cli::run(cli);
    let code = match &result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("glyphd: error: {e:#}");
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    };
    log::logger().flush();
    code
}

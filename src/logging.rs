// src/logging.rs
// =============================================================================
// Logger setup.
//
// All crawl progress goes through the `log` facade; env_logger prints it to
// stderr. RUST_LOG always wins over the defaults picked here.
// =============================================================================

use std::io::Write;

/// Picks the default filter for the given flags.
///
/// `enabled = false` keeps warnings and errors only.
pub fn default_level(enabled: bool, verbose: bool) -> &'static str {
    match (enabled, verbose) {
        (_, true) => "debug",
        (true, false) => "info",
        (false, false) => "warn",
    }
}

/// Initializes env_logger once for the process.
pub fn init_logging(enabled: bool, verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(default_level(enabled, verbose));

    // try_init: tests and embedders may have installed a logger already
    let _ = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .try_init();
}

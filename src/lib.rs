/*!
A small browser-based school administration tool.

Logged-in users may create, read, update, and delete students, courses, and
assignments, and view some aggregate counts on a dashboard.
*/

pub mod auth;
pub mod config;
pub mod inter;
pub mod stats;
pub mod store;

pub fn log_level_from_env() -> simplelog::LevelFilter {
    use simplelog::LevelFilter;

    let mut level_string = match std::env::var("LOG_LEVEL") {
        Err(_) => { return LevelFilter::Warn; },
        Ok(s) => s,
    };

    level_string.make_ascii_lowercase();
    match level_string.as_str() {
        "max" => LevelFilter::max(),
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}

/// Starts terminal logging filtered to this crate. Safe to call more than
/// once; later calls just note that a logger is already in place.
pub fn ensure_logging() {
    use simplelog::{ColorChoice, TermLogger, TerminalMode};

    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("roster")
        .build();
    let res = TermLogger::init(
        log_level_from_env(),
        log_cfg,
        TerminalMode::Stdout,
        ColorChoice::Auto
    );

    match res {
        Ok(_) => { log::info!("Logging started."); },
        Err(_) => { log::info!("Logging already started."); },
    }
}

#[cfg(test)]
mod tests {
    pub use super::ensure_logging;
}

use tracing_subscriber::EnvFilter;

/// Initialize tracing output on stderr.
///
/// Verbosity flags map to a default filter (`-q` errors only, default
/// warnings, `-v` info, `-vv` debug); a `SONGBOOK_LOG` env filter always
/// takes precedence.
pub fn init(quiet: bool, verbose: u8) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter =
        EnvFilter::try_from_env("SONGBOOK_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Output goes to stderr so that JSON on
/// stdout stays parseable.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or `debug` with
/// `verbose`. Calling this twice is harmless: the second install is ignored.
pub fn init_logging(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(verbose)
        .try_init();
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "mdspell=debug"
    } else {
        "warn"
    }
}

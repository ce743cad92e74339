use tracing_subscriber::EnvFilter;

/// Initialise logging at `info`. With `debug` the level drops to `debug`
/// and `RUST_LOG` may override it; without, `RUST_LOG` is ignored so a stray
/// variable cannot flood the terminal at 60 frames a second.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

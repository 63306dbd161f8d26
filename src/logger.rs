//! Process-wide log subscriber

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Verbose gives debug level human-readable
/// output, otherwise info level JSON lines. `RUST_LOG` takes precedence.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout);

    // A second init in the same process keeps the first subscriber.
    let _ = if verbose {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    };
}

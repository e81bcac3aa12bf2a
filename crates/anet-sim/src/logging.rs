//! Tracing setup for the simulator binary

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` selects levels, `info` otherwise. With `json` every event is
/// one JSON object per line. Later calls are ignored.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
    });
    let terminal_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
    });
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(terminal_layer)
        .with(json_layer)
        .try_init();
}

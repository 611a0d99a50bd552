use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset: service events and HTTP traces.
const DEFAULT_DIRECTIVES: &str = "spongebook_backend=info,tower_http=info";

/// Installs the fmt subscriber shared by `spongebook serve` and the
/// interactive CLI. `RUST_LOG` overrides [`DEFAULT_DIRECTIVES`]; a second
/// call leaves the first subscriber in place.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

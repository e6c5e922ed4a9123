use parley_server::LogFormat;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `default_directive` when set.
pub fn init(format: LogFormat, default_directive: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .try_init(),
    };

    if let Err(err) = result {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}

use env_logger::{Builder, Env};

/// Initializes the process-wide logger
///
/// Honors RUST_LOG when set and defaults to info level otherwise
pub fn setup_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

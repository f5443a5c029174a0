use cinder_config::CinderConfig;
use env_logger::Env;

/// Initialise `env_logger` with the configured filter; `RUST_LOG` wins.
/// Safe to call more than once.
pub fn init(config: &CinderConfig) {
    let env = Env::default().default_filter_or(config.logging.filter.as_str());
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Logger for tests: captured output, debug level by default
pub fn init_test() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

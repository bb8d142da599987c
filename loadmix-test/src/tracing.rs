use tracing_subscriber::EnvFilter;

/// Crates whose logs are captured in tests.
const CRATE_NAMES: &[&str] = &["loadmix", "loadmix_store"];

/// Environment variable overriding the level of captured logs.
const LEVEL_ENV: &str = "LOADMIX_TEST_LOG";

/// Installs a log subscriber writing to the test runner's captured output.
///
/// Only the load generator's own crates are logged, at `DEBUG` unless `LOADMIX_TEST_LOG` names
/// another level. Per-operation logs are emitted at `TRACE` and are very noisy with many
/// simulated clients. Calling this more than once is harmless.
///
/// # Example
///
/// ```
/// loadmix_test::tracing::init();
/// ```
pub fn init() {
    let level = std::env::var(LEVEL_ENV).unwrap_or_else(|_| "DEBUG".to_owned());

    let filter = CRATE_NAMES
        .iter()
        .filter_map(|name| format!("{name}={level}").parse().ok())
        .fold(EnvFilter::new("ERROR"), EnvFilter::add_directive);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}

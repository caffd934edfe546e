use figment::{Figment, providers::Env};
use serde::{Deserialize, de::DeserializeOwned};

pub trait ContextProvider<Config> {
    fn new(config: Config) -> impl Future<Output = Self>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Default, Deserialize)]
struct LogConfig {
    #[serde(default)]
    log_format: LogFormat,
}

/// Configuration source: environment variables starting with `prefix`,
/// with the prefix stripped and the rest lowercased.
#[must_use]
pub fn figment(prefix: &str) -> Figment {
    Figment::new().merge(Env::prefixed(prefix))
}

/// Extract `Config` from the environment.
///
/// # Errors
///
/// If a variable is present but does not deserialize into its field.
pub fn load_config<Config: DeserializeOwned>(
    prefix: &str,
) -> Result<Config, figment::Error> {
    figment(prefix).extract()
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout stays free for program output. The level is
/// taken from `RUST_LOG`.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            // this needs to be set to remove duplicated information in the log.
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Initialize logging and build the application context from environment
/// variables starting with `prefix`.
///
/// `<prefix>LOG_FORMAT` selects `pretty` (the default) or `json` output.
///
/// # Errors
///
/// If the configuration cannot be extracted from the environment variables.
pub async fn create_app_context<A, Config>(
    prefix: &str,
) -> Result<A, figment::Error>
where
    Config: DeserializeOwned,
    A: ContextProvider<Config>,
{
    let log: LogConfig = load_config(prefix)?;
    init_tracing(log.log_format);

    let config: Config = load_config(prefix)?;

    Ok(A::new(config).await)
}

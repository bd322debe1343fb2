use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log sink settings, read from the process environment.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    pub service_name: String,
    pub environment: String,
    /// Loki push endpoint; `None` keeps logging on the console only.
    pub loki_url: Option<String>,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let loki_enabled = std::env::var("LOKI_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Self {
            filter: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=info".to_string()),
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "trendcast".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            loki_url: if loki_enabled {
                Some(std::env::var("LOKI_URL").unwrap_or_default())
            } else {
                None
            },
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.loki_url.as_deref() {
            Some(url) if url.trim().is_empty() => {
                Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string())
            }
            _ => Ok(()),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|e| {
            eprintln!("ignoring invalid RUST_LOG '{}': {}", self.filter, e);
            EnvFilter::new("info")
        })
    }
}

/// Installs the global subscriber. Call once, before the first log line.
pub fn init_logging(config: LoggingConfig) -> anyhow::Result<()> {
    config.validate().map_err(anyhow::Error::msg)?;

    if let Some(loki_url) = config.loki_url.as_deref() {
        #[cfg(feature = "loki")]
        return init_with_loki(&config, loki_url);

        #[cfg(not(feature = "loki"))]
        eprintln!(
            "LOKI_URL {} ignored: built without the `loki` feature",
            loki_url
        );
    }

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!("Console logging initialized for {} ({})", config.service_name, config.environment);
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: &LoggingConfig, loki_url: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Background task that ships buffered events; needs the tokio runtime.
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .try_init()?;

    tracing::info!("Loki logging initialized for {} at {}", config.service_name, loki_url);
    Ok(())
}

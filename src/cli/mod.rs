//! Subcommand implementations for the `coleta` binary.

pub mod items;
pub mod localities;
pub mod regions;
pub mod register;
pub mod search;
pub mod show;

use std::sync::Arc;

use serde::Serialize;

use coleta_transport::{
    CachingProvider, DirectoryClient, GeoProvider, HttpTransport, IpLookupProvider, RegistryApi,
};
use coleta_types::{ColetaConfig, RetryConfig};

/// Clients shared by every subcommand, built once from the configuration.
pub struct CliContext {
    pub config: ColetaConfig,
    pub directory: DirectoryClient,
    pub registry: RegistryApi,
    pub geo: Arc<dyn GeoProvider>,
}

impl CliContext {
    pub fn new(config: ColetaConfig) -> Self {
        let backend = Arc::new(
            HttpTransport::with_timeouts(
                config.backend_url.as_str(),
                config.request_timeout,
                config.connect_timeout,
            )
            .with_retry(config.retry),
        );
        let directory = Arc::new(
            HttpTransport::with_timeouts(
                config.directory_url.as_str(),
                config.request_timeout,
                config.connect_timeout,
            )
            .with_retry(config.retry),
        );
        // Position lookups already race a bounded wait, a retry loop would
        // just eat the window.
        let geo_transport = Arc::new(
            HttpTransport::with_timeouts(
                config.geo_url.as_str(),
                config.request_timeout,
                config.connect_timeout,
            )
            .with_retry(RetryConfig::none()),
        );
        let geo = Arc::new(CachingProvider::new(
            IpLookupProvider::new(geo_transport),
            config.geo_max_age,
        ));
        Self {
            registry: RegistryApi::new(backend),
            directory: DirectoryClient::new(directory),
            geo,
            config,
        }
    }
}

/// Render an error for the terminal, JSON or human.
pub fn format_error(error: &anyhow::Error, json_output: bool) -> String {
    if json_output {
        #[derive(Serialize)]
        struct ErrorJson {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            cause: Option<String>,
        }

        let err = ErrorJson {
            error: error.to_string(),
            cause: error.source().map(|e| e.to_string()),
        };
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| "{}".to_string())
    } else {
        format!("Error: {error:#}")
    }
}

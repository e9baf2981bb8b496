use std::sync::Arc;

use tracing::{error, info};

use osm_mcp_server::config::ServerConfig;
use osm_mcp_server::logging::{init_logging, LoggingConfig};
use osm_mcp_server::registry::ToolRegistry;
use osm_mcp_server::server;
use osm_mcp_server::upstream::UpstreamClient;

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging(&LoggingConfig::from_env()) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    info!(
        port = config.http_port,
        nominatim = %config.nominatim_url,
        overpass = %config.overpass_url,
        osrm = %config.osrm_url,
        "starting osm-mcp-server"
    );

    let client = match UpstreamClient::from_config(&config) {
        Ok(client) => {
            info!(
                throttle_ms = client.gate().interval().as_millis() as u64,
                timeout_secs = config.upstream_timeout.as_secs(),
                "upstream client ready"
            );
            Arc::new(client)
        }
        Err(e) => {
            error!(error = %e, "failed to build upstream HTTP client");
            std::process::exit(1);
        }
    };

    let registry = match ToolRegistry::standard(client) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!(error = %e, "failed to build tool registry");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::serve(&config, registry).await {
        error!(error = %e, "fatal server error");
        std::process::exit(1);
    }
}

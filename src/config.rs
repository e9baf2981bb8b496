use std::time::Duration;

/// Default HTTP port for the JSON-RPC endpoint.
const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default minimum spacing between outbound upstream requests (1 second,
/// the Nominatim usage policy ceiling).
const DEFAULT_THROTTLE_MS: u64 = 1000;

/// Default timeout for a single upstream HTTP call (30 seconds).
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Server configuration loaded from environment variables.
///
/// Constructed once at startup and handed to the upstream client and the
/// HTTP transport. Nothing reads the environment after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http_port: u16,
    pub user_agent: String,
    pub throttle: Duration,
    pub upstream_timeout: Duration,
    pub nominatim_url: String,
    pub overpass_url: String,
    pub osrm_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            user_agent: default_user_agent(),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            osrm_url: DEFAULT_OSRM_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment.
    ///
    /// - `OSM_MCP_PORT` (optional, default 3000): HTTP listen port
    /// - `OSM_MCP_USER_AGENT` (optional): `User-Agent` sent upstream
    /// - `OSM_MCP_THROTTLE_MS` (optional, default 1000): min ms between upstream calls
    /// - `OSM_MCP_UPSTREAM_TIMEOUT_SECS` (optional, default 30): per-call deadline
    /// - `NOMINATIM_URL`, `OVERPASS_URL`, `OSRM_URL` (optional): upstream base URLs
    pub fn from_env() -> Result<Self, String> {
        let overrides = ConfigOverrides {
            http_port: parse_env("OSM_MCP_PORT")?,
            user_agent: non_empty_env("OSM_MCP_USER_AGENT"),
            throttle_ms: parse_env("OSM_MCP_THROTTLE_MS")?,
            upstream_timeout_secs: parse_env("OSM_MCP_UPSTREAM_TIMEOUT_SECS")?,
            nominatim_url: non_empty_env("NOMINATIM_URL"),
            overpass_url: non_empty_env("OVERPASS_URL"),
            osrm_url: non_empty_env("OSRM_URL"),
        };

        Ok(Self::default().merge(overrides))
    }

    /// Apply every `Some` field of `overrides`, keeping the rest.
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(port) = overrides.http_port {
            self.http_port = port;
        }
        if let Some(user_agent) = overrides.user_agent {
            self.user_agent = user_agent;
        }
        if let Some(ms) = overrides.throttle_ms {
            self.throttle = Duration::from_millis(ms);
        }
        if let Some(secs) = overrides.upstream_timeout_secs {
            self.upstream_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = overrides.nominatim_url {
            self.nominatim_url = url;
        }
        if let Some(url) = overrides.overpass_url {
            self.overpass_url = url;
        }
        if let Some(url) = overrides.osrm_url {
            self.osrm_url = url;
        }
        self
    }

    /// Point all three upstreams at one base URL. Used by tests that stand
    /// up a single mock server.
    pub fn with_upstream_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.nominatim_url = base.clone();
        self.overpass_url = format!("{base}/api/interpreter");
        self.osrm_url = base;
        self
    }
}

/// Partial configuration. `None` leaves the current value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub http_port: Option<u16>,
    pub user_agent: Option<String>,
    pub throttle_ms: Option<u64>,
    pub upstream_timeout_secs: Option<u64>,
    pub nominatim_url: Option<String>,
    pub overpass_url: Option<String>,
    pub osrm_url: Option<String>,
}

fn default_user_agent() -> String {
    format!("osm-mcp-server/{}", env!("CARGO_PKG_VERSION"))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, String> {
    match non_empty_env(key) {
        Some(val) => val
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{key} must be a non-negative integer, got: '{val}'")),
        None => Ok(None),
    }
}

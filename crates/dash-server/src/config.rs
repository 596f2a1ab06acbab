//! Configuration for dash-server.
//!
//! Loaded from a TOML file, then overridden by environment variables and
//! CLI flags, then validated.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use dash_checker::{AnalyzerConfig, RunThrottle, SessionStore};
use dash_common::ClickHouseConfig;
use dash_market::{DEFAULT_CHANNEL_CAPACITY, PushServerConfig};

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Logging level.
    pub log_level: String,

    pub http: HttpConfig,

    pub websocket: WebSocketConfig,

    pub checker: CheckerConfig,

    pub market: MarketConfig,

    /// ClickHouse configuration for bar persistence.
    pub clickhouse: ClickHouseConfig,
}

/// HTTP listener and static file serving.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Front-end build served for every non-API path.
    pub static_dir: Option<PathBuf>,
    pub enable_cors: bool,
}

#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    pub port: u16,
    pub max_clients: usize,
}

/// Code checker settings.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub analyzer_program: String,
    /// Analyzer arguments; the submission path is appended.
    pub analyzer_args: Vec<String>,
    pub interpreter: String,
    /// Directory for session files; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    pub max_runs_per_sec: f64,
    /// Logged-in user. Checker routes redirect to the login page when unset.
    pub current_user: Option<String>,
}

/// Market bridge settings.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub snapshot_dir: PathBuf,
    /// Capacity of the engine event and envelope channels.
    pub channel_capacity: usize,
    /// Write bars to ClickHouse when it is reachable.
    pub persist_bars: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: None,
            enable_cors: true,
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        let server = PushServerConfig::default();
        Self {
            port: server.port,
            max_clients: server.max_clients,
        }
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        let analyzer = AnalyzerConfig::default();
        Self {
            analyzer_program: analyzer.program,
            analyzer_args: analyzer.args,
            interpreter: "python3".to_string(),
            temp_dir: None,
            max_runs_per_sec: RunThrottle::default().max_rate(),
            current_user: None,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("static/json"),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            persist_bars: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            http: HttpConfig::default(),
            websocket: WebSocketConfig::default(),
            checker: CheckerConfig::default(),
            market: MarketConfig::default(),
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content).context("Failed to parse TOML config")?;
        Ok(Self::from(file))
    }

    /// Apply environment variable overrides for credentials and the login.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CLICKHOUSE_URL") {
            self.clickhouse.url = url;
        }
        if let Ok(user) = std::env::var("CLICKHOUSE_USER") {
            self.clickhouse.user = Some(user);
        }
        if let Ok(pass) = std::env::var("CLICKHOUSE_PASSWORD") {
            self.clickhouse.password = Some(pass);
        }
        if let Ok(user) = std::env::var("DASH_CURRENT_USER") {
            self.checker.current_user = Some(user).filter(|u| !u.is_empty());
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_cli_overrides(
        &mut self,
        port: Option<u16>,
        ws_port: Option<u16>,
        snapshot_dir: Option<PathBuf>,
        clickhouse_url: Option<String>,
    ) {
        if let Some(port) = port {
            self.http.port = port;
        }
        if let Some(port) = ws_port {
            self.websocket.port = port;
        }
        if let Some(dir) = snapshot_dir {
            self.market.snapshot_dir = dir;
        }
        if let Some(url) = clickhouse_url {
            self.clickhouse.url = url;
        }
    }

    /// Validate configuration and return errors for invalid values.
    pub fn validate(&self) -> Result<()> {
        let rate = self.checker.max_runs_per_sec;
        if rate.is_nan() || rate <= 0.0 {
            bail!("max_runs_per_sec must be positive");
        }
        if self.checker.analyzer_program.trim().is_empty() {
            bail!("analyzer_program must not be empty");
        }
        if self.checker.interpreter.trim().is_empty() {
            bail!("interpreter must not be empty");
        }
        if self.http.port == self.websocket.port {
            bail!(
                "HTTP and WebSocket servers cannot share port {}",
                self.http.port
            );
        }
        if self.market.channel_capacity == 0 {
            bail!("channel_capacity must be at least 1");
        }
        if self.websocket.max_clients == 0 {
            bail!("max_clients must be at least 1");
        }
        Ok(())
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            program: self.checker.analyzer_program.clone(),
            args: self.checker.analyzer_args.clone(),
        }
    }

    pub fn session_store(&self) -> SessionStore {
        match &self.checker.temp_dir {
            Some(dir) => SessionStore::new(dir),
            None => SessionStore::in_system_temp(),
        }
    }

    pub fn run_throttle(&self) -> RunThrottle {
        RunThrottle::new(self.checker.max_runs_per_sec)
    }

    pub fn push_server_config(&self) -> PushServerConfig {
        PushServerConfig {
            port: self.websocket.port,
            max_clients: self.websocket.max_clients,
        }
    }

    /// `host:port` of the HTTP listener.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

// ============================================================================
// TOML deserialization structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    general: GeneralToml,
    #[serde(default)]
    http: HttpToml,
    #[serde(default)]
    websocket: WebSocketToml,
    #[serde(default)]
    checker: CheckerToml,
    #[serde(default)]
    market: MarketToml,
    #[serde(default)]
    clickhouse: ClickHouseToml,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GeneralToml {
    log_level: String,
}

impl Default for GeneralToml {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HttpToml {
    host: String,
    port: u16,
    static_dir: Option<PathBuf>,
    enable_cors: bool,
}

impl Default for HttpToml {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            host: http.host,
            port: http.port,
            static_dir: http.static_dir,
            enable_cors: http.enable_cors,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WebSocketToml {
    port: u16,
    max_clients: usize,
}

impl Default for WebSocketToml {
    fn default() -> Self {
        let ws = WebSocketConfig::default();
        Self {
            port: ws.port,
            max_clients: ws.max_clients,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CheckerToml {
    analyzer_program: String,
    analyzer_args: Vec<String>,
    interpreter: String,
    temp_dir: Option<PathBuf>,
    max_runs_per_sec: f64,
    current_user: Option<String>,
}

impl Default for CheckerToml {
    fn default() -> Self {
        let checker = CheckerConfig::default();
        Self {
            analyzer_program: checker.analyzer_program,
            analyzer_args: checker.analyzer_args,
            interpreter: checker.interpreter,
            temp_dir: checker.temp_dir,
            max_runs_per_sec: checker.max_runs_per_sec,
            current_user: checker.current_user,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MarketToml {
    snapshot_dir: PathBuf,
    channel_capacity: usize,
    persist_bars: bool,
}

impl Default for MarketToml {
    fn default() -> Self {
        let market = MarketConfig::default();
        Self {
            snapshot_dir: market.snapshot_dir,
            channel_capacity: market.channel_capacity,
            persist_bars: market.persist_bars,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClickHouseToml {
    url: String,
    database: String,
}

impl Default for ClickHouseToml {
    fn default() -> Self {
        let clickhouse = ClickHouseConfig::default();
        Self {
            url: clickhouse.url,
            database: clickhouse.database,
        }
    }
}

impl From<TomlConfig> for ServerConfig {
    fn from(toml: TomlConfig) -> Self {
        Self {
            log_level: toml.general.log_level,
            http: HttpConfig {
                host: toml.http.host,
                port: toml.http.port,
                static_dir: toml.http.static_dir,
                enable_cors: toml.http.enable_cors,
            },
            websocket: WebSocketConfig {
                port: toml.websocket.port,
                max_clients: toml.websocket.max_clients,
            },
            checker: CheckerConfig {
                analyzer_program: toml.checker.analyzer_program,
                analyzer_args: toml.checker.analyzer_args,
                interpreter: toml.checker.interpreter,
                temp_dir: toml.checker.temp_dir,
                max_runs_per_sec: toml.checker.max_runs_per_sec,
                current_user: toml.checker.current_user.filter(|u| !u.is_empty()),
            },
            market: MarketConfig {
                snapshot_dir: toml.market.snapshot_dir,
                channel_capacity: toml.market.channel_capacity,
                persist_bars: toml.market.persist_bars,
            },
            clickhouse: ClickHouseConfig {
                url: toml.clickhouse.url,
                database: toml.clickhouse.database,
                user: None,
                password: None,
            },
        }
    }
}

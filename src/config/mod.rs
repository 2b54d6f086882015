//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    fmt,
    net::SocketAddr,
    num::{NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{CliArgs, Command, PdfOverrides, RenderArgs, ServeArgs, ServeOverrides};

use crate::domain::uploads::DEFAULT_MAX_FILE_BYTES;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "inkpress";
const ENV_PREFIX: &str = "INKPRESS";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_PDF_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_PDF_CONCURRENCY_LIMIT: u64 = 3;
pub const DEFAULT_THEMES_DIR: &str = "static/public/styles/themes";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub uploads: UploadSettings,
    pub pdf: PdfSettings,
    pub themes: ThemeSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub environment: RuntimeEnvironment,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    Development,
    Production,
    Test,
}

impl RuntimeEnvironment {
    pub fn is_development(self) -> bool {
        matches!(self, RuntimeEnvironment::Development)
    }
}

impl FromStr for RuntimeEnvironment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "unknown environment `{other}` (expected development, production or test)"
            )),
        }
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_file_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub timeout_ms: NonZeroU64,
    pub concurrency_limit: NonZeroUsize,
    pub browser_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ThemeSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    load_with_environment(cli, base_environment())
}

fn base_environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn load_with_environment(cli: &CliArgs, environment: Environment) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(environment);

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => raw.apply_pdf_overrides(&args.pdf),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    uploads: RawUploadSettings,
    pdf: RawPdfSettings,
    themes: RawThemeSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(environment) = overrides.server_environment.as_ref() {
            self.server.environment = Some(environment.clone());
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(limit) = overrides.uploads_max_file_bytes {
            self.uploads.max_file_bytes = Some(limit);
        }

        self.apply_pdf_overrides(&overrides.pdf);
    }

    fn apply_pdf_overrides(&mut self, overrides: &PdfOverrides) {
        if let Some(timeout) = overrides.pdf_timeout_ms {
            self.pdf.timeout_ms = Some(timeout);
        }
        if let Some(limit) = overrides.pdf_concurrency_limit {
            self.pdf.concurrency_limit = Some(limit);
        }
        if let Some(path) = overrides.pdf_browser_path.as_ref() {
            self.pdf.browser_path = Some(path.clone());
        }
        if let Some(directory) = overrides.themes_directory.as_ref() {
            self.themes.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            uploads,
            pdf,
            themes,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            uploads: build_upload_settings(uploads)?,
            pdf: build_pdf_settings(pdf)?,
            themes: build_theme_settings(themes)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let environment = match server.environment {
        Some(value) => RuntimeEnvironment::from_str(&value)
            .map_err(|reason| LoadError::invalid("server.environment", reason))?,
        None => RuntimeEnvironment::Production,
    };

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        environment,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let value = uploads.max_file_bytes.unwrap_or(DEFAULT_MAX_FILE_BYTES);
    let max_file_bytes = NonZeroU64::new(value)
        .ok_or_else(|| LoadError::invalid("uploads.max_file_bytes", "must be greater than zero"))?;
    usize::try_from(value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_file_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings { max_file_bytes })
}

fn build_pdf_settings(pdf: RawPdfSettings) -> Result<PdfSettings, LoadError> {
    let timeout_ms = NonZeroU64::new(pdf.timeout_ms.unwrap_or(DEFAULT_PDF_TIMEOUT_MS))
        .ok_or_else(|| LoadError::invalid("pdf.timeout_ms", "must be greater than zero"))?;
    let concurrency_limit = non_zero_usize(
        pdf.concurrency_limit
            .unwrap_or(DEFAULT_PDF_CONCURRENCY_LIMIT),
        "pdf.concurrency_limit",
    )?;
    let browser_path = pdf.browser_path.filter(|path| !path.as_os_str().is_empty());

    Ok(PdfSettings {
        timeout_ms,
        concurrency_limit,
        browser_path,
    })
}

fn build_theme_settings(themes: RawThemeSettings) -> Result<ThemeSettings, LoadError> {
    let directory = themes
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_THEMES_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "themes.directory",
            "path must not be empty",
        ));
    }

    Ok(ThemeSettings { directory })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    environment: Option<String>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    max_file_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPdfSettings {
    timeout_ms: Option<u64>,
    concurrency_limit: Option<u64>,
    browser_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawThemeSettings {
    directory: Option<PathBuf>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::{
    print::{MarginPreset, PageSize},
    themes::ThemeId,
};

/// Command-line arguments for the inkpress binary.
#[derive(Debug, Parser)]
#[command(
    name = "inkpress",
    version,
    about = "Markdown to themed, printable HTML and PDF"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "INKPRESS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service (default).
    Serve(Box<ServeArgs>),
    /// Convert a local Markdown file to PDF and exit.
    Render(Box<RenderArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PdfOverrides {
    /// Override the per-phase PDF timeout in milliseconds.
    #[arg(long = "pdf-timeout-ms", value_name = "MILLIS")]
    pub pdf_timeout_ms: Option<u64>,

    /// Override the number of PDF jobs rendered at once.
    #[arg(long = "pdf-concurrency-limit", value_name = "COUNT")]
    pub pdf_concurrency_limit: Option<u64>,

    /// Chromium executable to launch instead of auto-detection.
    #[arg(
        long = "pdf-browser-path",
        env = "CHROME_PATH",
        value_name = "PATH",
        value_hint = ValueHint::ExecutablePath
    )]
    pub pdf_browser_path: Option<PathBuf>,

    /// Override the directory holding theme stylesheets.
    #[arg(long = "themes-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub themes_directory: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub pdf: PdfOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the runtime environment (development|production|test).
    #[arg(long = "server-environment", value_name = "ENV")]
    pub server_environment: Option<String>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the maximum accepted upload size in bytes.
    #[arg(long = "uploads-max-file-bytes", value_name = "BYTES")]
    pub uploads_max_file_bytes: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub pdf: PdfOverrides,

    /// Markdown file to convert.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Destination PDF; defaults to INPUT with a `.pdf` extension.
    #[arg(short, long, value_name = "OUTPUT", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = "clean", value_name = "THEME")]
    pub theme: ThemeId,

    /// A4, Letter, Legal or B5.
    #[arg(long = "page-size", default_value = "A4", value_name = "SIZE")]
    pub page_size: PageSize,

    /// normal, narrow or wide.
    #[arg(long, default_value = "normal", value_name = "PRESET")]
    pub margins: MarginPreset,

    /// Omit the "Page X of Y" footer.
    #[arg(long = "no-page-numbers", action = clap::ArgAction::SetTrue)]
    pub no_page_numbers: bool,
}

impl RenderArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("pdf"))
    }
}

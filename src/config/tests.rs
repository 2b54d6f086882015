use std::collections::HashMap;

use super::*;
use crate::domain::{
    print::{MarginPreset, PageSize},
    themes::ThemeId,
};

fn environment(pairs: &[(&str, &str)]) -> Environment {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    base_environment().source(Some(map))
}

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.environment, RuntimeEnvironment::Production);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.uploads.max_file_bytes.get(), 25 * 1024 * 1024);
    assert_eq!(settings.pdf.timeout_ms.get(), 30_000);
    assert_eq!(settings.pdf.concurrency_limit.get(), 3);
    assert!(settings.pdf.browser_path.is_none());
    assert_eq!(settings.themes.directory, PathBuf::from(DEFAULT_THEMES_DIR));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.pdf.concurrency_limit = Some(2);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        pdf: PdfOverrides {
            pdf_concurrency_limit: Some(6),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.pdf.concurrency_limit.get(), 6);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn environment_layer_feeds_nested_keys() {
    let cli = CliArgs::parse_from(["inkpress"]);
    let settings = load_with_environment(
        &cli,
        environment(&[
            ("INKPRESS__PDF__CONCURRENCY_LIMIT", "4"),
            ("INKPRESS__SERVER__PORT", "8080"),
            ("INKPRESS__SERVER__ENVIRONMENT", "development"),
        ]),
    )
    .expect("valid settings");

    assert_eq!(settings.pdf.concurrency_limit.get(), 4);
    assert_eq!(settings.server.addr.port(), 8080);
    assert!(settings.server.environment.is_development());
}

#[test]
fn cli_beats_environment() {
    let cli = CliArgs::parse_from(["inkpress", "serve", "--pdf-timeout-ms", "5000"]);
    let settings = load_with_environment(
        &cli,
        environment(&[("INKPRESS__PDF__TIMEOUT_MS", "9000")]),
    )
    .expect("valid settings");

    assert_eq!(settings.pdf.timeout_ms.get(), 5000);
}

#[test]
fn zero_concurrency_is_rejected() {
    let mut raw = RawSettings::default();
    raw.pdf.concurrency_limit = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero limit must fail");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "pdf.concurrency_limit",
            ..
        }
    ));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.pdf.timeout_ms = Some(0);

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "pdf.timeout_ms",
            ..
        })
    ));
}

#[test]
fn unknown_environment_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.environment = Some("staging".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "server.environment",
            ..
        })
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn empty_browser_path_means_auto_detect() {
    let mut raw = RawSettings::default();
    raw.pdf.browser_path = Some(PathBuf::new());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.pdf.browser_path.is_none());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["inkpress"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "inkpress",
        "serve",
        "--server-host",
        "127.0.0.1",
        "--server-port",
        "3100",
        "--log-json",
        "yes",
        "--themes-directory",
        "/srv/themes",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            let overrides = &serve.overrides;
            assert_eq!(overrides.server_host.as_deref(), Some("127.0.0.1"));
            assert_eq!(overrides.server_port, Some(3100));
            assert_eq!(overrides.log_json, Some(true));
            assert_eq!(
                overrides.pdf.themes_directory.as_deref(),
                Some(std::path::Path::new("/srv/themes"))
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "inkpress",
        "render",
        "notes.md",
        "--theme",
        "academic",
        "--page-size",
        "letter",
        "--margins",
        "wide",
        "--no-page-numbers",
    ]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.input, PathBuf::from("notes.md"));
            assert_eq!(render.theme, ThemeId::Academic);
            assert_eq!(render.page_size, PageSize::Letter);
            assert_eq!(render.margins, MarginPreset::Wide);
            assert!(render.no_page_numbers);
            assert_eq!(render.output_path(), PathBuf::from("notes.pdf"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn render_defaults_match_print_defaults() {
    let args = CliArgs::parse_from(["inkpress", "render", "in.md", "-o", "out/doc.pdf"]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.theme, ThemeId::Clean);
            assert_eq!(render.page_size, PageSize::A4);
            assert_eq!(render.margins, MarginPreset::Normal);
            assert!(!render.no_page_numbers);
            assert_eq!(render.output_path(), PathBuf::from("out/doc.pdf"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

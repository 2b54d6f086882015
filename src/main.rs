use std::{future::IntoFuture, process, sync::Arc};

use inkpress::{
    application::{
        error::AppError,
        pdf::{PdfRequest, PdfService, PdfServiceConfig},
        render::{MarkdownRenderer, markdown_renderer},
        themes::ThemeStore,
    },
    config::{self, Command, RenderArgs, ServeArgs, Settings},
    domain::{print::PrintOptions, uploads},
    infra::{
        browser::ChromeEngine,
        error::InfraError,
        http::{self, ApiState, RouterOptions},
        telemetry,
    },
};
use tokio::{net::TcpListener, signal, sync::Notify, time::timeout};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        Command::Serve(_) => run_serve(settings).await,
        Command::Render(args) => run_render(settings, *args).await,
    }
}

fn open_theme_store(settings: &Settings) -> Result<Arc<ThemeStore>, AppError> {
    let directory = &settings.themes.directory;
    if !directory.is_dir() {
        return Err(InfraError::configuration(format!(
            "themes directory `{}` does not exist",
            directory.display()
        ))
        .into());
    }
    Ok(Arc::new(ThemeStore::new(directory.clone())))
}

fn build_pdf_service(
    settings: &Settings,
    renderer: Arc<MarkdownRenderer>,
    themes: Arc<ThemeStore>,
) -> Arc<PdfService> {
    let config = PdfServiceConfig::from(&settings.pdf);
    let engine = Arc::new(ChromeEngine::new(
        settings.pdf.browser_path.clone(),
        config.phase_timeout,
    ));
    Arc::new(PdfService::new(engine, renderer, themes, config))
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let themes = open_theme_store(&settings)?;
    let renderer = markdown_renderer();
    let pdf = build_pdf_service(&settings, Arc::clone(&renderer), Arc::clone(&themes));

    let state = ApiState {
        themes,
        renderer,
        pdf: Arc::clone(&pdf),
        max_file_bytes: settings.uploads.max_file_bytes.get(),
    };
    let router = http::build_router(
        state,
        RouterOptions {
            max_file_bytes: settings.uploads.max_file_bytes.get(),
            permissive_cors: settings.server.environment.is_development(),
        },
    );

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "inkpress::serve",
        addr = %settings.server.addr,
        environment = %settings.server.environment,
        pdf_concurrency = settings.pdf.concurrency_limit.get(),
        "listening"
    );

    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let stop = Arc::clone(&stop);
        async move { stop.notified().await }
    });
    let mut server = tokio::spawn(server.into_future());

    let result = tokio::select! {
        joined = &mut server => joined,
        _ = shutdown_signal() => {
            stop.notify_one();
            match timeout(settings.server.graceful_shutdown, &mut server).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        target = "inkpress::serve",
                        grace_secs = settings.server.graceful_shutdown.as_secs(),
                        "connections still open after grace period; aborting"
                    );
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    pdf.shutdown().await;
    info!(target = "inkpress::serve", "shutdown complete");

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(target = "inkpress::serve", error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(target = "inkpress::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(target = "inkpress::serve", "received Ctrl+C, shutting down"),
        _ = terminate => info!(target = "inkpress::serve", "received SIGTERM, shutting down"),
    }
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    uploads::validate_filename(&args.input.to_string_lossy())?;
    let markdown = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(InfraError::from)?;
    if markdown.is_empty() {
        return Err(AppError::validation(format!(
            "{} is empty",
            args.input.display()
        )));
    }
    if markdown.len() as u64 > settings.uploads.max_file_bytes.get() {
        return Err(AppError::validation(format!(
            "{} exceeds the {} byte limit",
            args.input.display(),
            settings.uploads.max_file_bytes
        )));
    }

    let themes = open_theme_store(&settings)?;
    let pdf = build_pdf_service(&settings, markdown_renderer(), themes);

    let request = PdfRequest {
        markdown,
        theme: args.theme,
        options: PrintOptions {
            page_size: args.page_size,
            margins: args.margins,
            include_page_numbers: !args.no_page_numbers,
        },
    };
    let result = pdf.generate(request).await;
    pdf.shutdown().await;
    let bytes = result?;

    let output = args.output_path();
    tokio::fs::write(&output, &bytes)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "inkpress::render",
        output = %output.display(),
        bytes = bytes.len(),
        "PDF written"
    );

    Ok(())
}

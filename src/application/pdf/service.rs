use std::{
    num::NonZeroUsize,
    sync::Arc,
    time::{Duration, Instant},
};

use metrics::{counter, histogram};
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
    application::{render::MarkdownRenderer, themes::ThemeStore},
    infra::telemetry::{METRIC_PDF_JOBS_TOTAL, METRIC_PDF_RENDER_MS},
};

use super::{
    admission::{AdmissionGate, AdmissionSnapshot},
    document::build_print_document,
    engine::{BrowserEngine, BrowserPage, PrintSettings},
    types::{JobState, PdfError, PdfRequest, TimeoutPhase},
};

/// Upper bound on waiting for a page to close before giving its slot back.
const PAGE_CLOSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfServiceConfig {
    /// Budget for each of the content-load and rasterize phases.
    pub phase_timeout: Duration,
    pub concurrency_limit: NonZeroUsize,
}

impl From<&crate::config::PdfSettings> for PdfServiceConfig {
    fn from(settings: &crate::config::PdfSettings) -> Self {
        Self {
            phase_timeout: Duration::from_millis(settings.timeout_ms.get()),
            concurrency_limit: settings.concurrency_limit,
        }
    }
}

/// Owns the shared browser and the admission policy for PDF jobs.
pub struct PdfService {
    gate: Arc<AdmissionGate>,
    engine: Arc<dyn BrowserEngine>,
    renderer: Arc<MarkdownRenderer>,
    themes: Arc<ThemeStore>,
    phase_timeout: Duration,
}

impl PdfService {
    pub fn new(
        engine: Arc<dyn BrowserEngine>,
        renderer: Arc<MarkdownRenderer>,
        themes: Arc<ThemeStore>,
        config: PdfServiceConfig,
    ) -> Self {
        Self {
            gate: AdmissionGate::new(config.concurrency_limit),
            engine,
            renderer,
            themes,
            phase_timeout: config.phase_timeout,
        }
    }

    pub fn snapshot(&self) -> AdmissionSnapshot {
        self.gate.snapshot()
    }

    /// Render one PDF. Waits for an admission slot, or fails fast with
    /// [`PdfError::TooManyPending`] when the wait queue is full.
    pub async fn generate(&self, request: PdfRequest) -> Result<Vec<u8>, PdfError> {
        let job_id = Uuid::new_v4();
        let span = info_span!(
            "pdf_job",
            %job_id,
            theme = %request.theme,
            page_size = %request.options.page_size
        );

        async move {
            log_state(JobState::Queued);
            let started = Instant::now();

            let permit = match self.gate.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    counter!(METRIC_PDF_JOBS_TOTAL, "result" => "rejected").increment(1);
                    warn!(
                        target = "application::pdf",
                        limit = self.gate.limit(),
                        max_queue = self.gate.max_queue(),
                        "PDF job rejected: wait queue full"
                    );
                    return Err(PdfError::TooManyPending);
                }
            };
            log_state(JobState::Admitted);

            let result = self.render_admitted(&request).await;
            drop(permit);

            let state = match &result {
                Ok(_) => JobState::Succeeded,
                Err(PdfError::RenderTimeout { .. }) => JobState::TimedOut,
                Err(_) => JobState::Failed,
            };
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            histogram!(METRIC_PDF_RENDER_MS).record(elapsed_ms);
            counter!(METRIC_PDF_JOBS_TOTAL, "result" => state.as_str()).increment(1);

            match &result {
                Ok(bytes) => info!(
                    target = "application::pdf",
                    result = state.as_str(),
                    elapsed_ms,
                    bytes = bytes.len(),
                    "PDF job finished"
                ),
                Err(err) => warn!(
                    target = "application::pdf",
                    result = state.as_str(),
                    elapsed_ms,
                    error = %err,
                    "PDF job finished"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    async fn render_admitted(&self, request: &PdfRequest) -> Result<Vec<u8>, PdfError> {
        let content = self.renderer.render_sanitized(&request.markdown)?;
        let theme_css = self.themes.stylesheet_for(request.theme).await?;
        let html = build_print_document(&content, &theme_css, &request.options)?;

        let mut page = self
            .engine
            .open_page(request.options.page_size.viewport())
            .await?;
        log_state(JobState::Rendering);

        let settings = PrintSettings::from_options(&request.options);
        let outcome = self.drive_page(page.as_mut(), &html, &settings).await;

        if timeout(PAGE_CLOSE_GRACE, page.close()).await.is_err() {
            warn!(
                target = "application::pdf",
                grace_ms = PAGE_CLOSE_GRACE.as_millis() as u64,
                "browser page did not close in time"
            );
        }

        outcome
    }

    async fn drive_page(
        &self,
        page: &mut dyn BrowserPage,
        html: &str,
        settings: &PrintSettings,
    ) -> Result<Vec<u8>, PdfError> {
        timeout(self.phase_timeout, page.load_html(html))
            .await
            .map_err(|_| PdfError::RenderTimeout {
                phase: TimeoutPhase::ContentLoad,
            })??;

        let pdf = timeout(self.phase_timeout, page.print_pdf(settings))
            .await
            .map_err(|_| PdfError::RenderTimeout {
                phase: TimeoutPhase::Rasterize,
            })??;

        Ok(pdf)
    }
}

fn log_state(state: JobState) {
    debug!(target = "application::pdf", state = state.as_str(), "PDF job state");
}

//! Headless Chromium behind the [`BrowserEngine`] seam.
//!
//! `headless_chrome` is synchronous, so every call runs on the blocking pool.
//! When an awaiting future is dropped (for example on timeout) the blocking
//! call still runs to completion in the background.

use std::{
    collections::HashSet,
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use headless_chrome::{
    Browser, LaunchOptions, Tab,
    browser::tab::EventListener,
    protocol::cdp::{Network, types::Event},
    types::{Bounds, PrintToPdfOptions},
};
use tempfile::NamedTempFile;
use tokio::{runtime::Handle, sync::Mutex as AsyncMutex, task::spawn_blocking};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    application::pdf::{BrowserEngine, BrowserError, BrowserPage, PrintSettings},
    domain::print::{CSS_PX_PER_INCH, PaperFormat, Viewport},
};

/// Keep the DevTools connection open between jobs.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
/// In-flight requests tolerated while waiting for the network to settle.
const QUIET_MAX_IN_FLIGHT: usize = 2;
const QUIET_WINDOW: Duration = Duration::from_millis(500);
const QUIET_POLL_INTERVAL: Duration = Duration::from_millis(100);


/// Shared Chromium process, launched on first use and relaunched after it
/// stops answering.
pub struct ChromeEngine {
    browser_path: Option<PathBuf>,
    settle_limit: Duration,
    browser: AsyncMutex<Option<Browser>>,
}

impl ChromeEngine {
    /// `settle_limit` bounds the background wait for network quiescence so a
    /// page abandoned by a timed-out job does not poll forever.
    pub fn new(browser_path: Option<PathBuf>, settle_limit: Duration) -> Self {
        Self {
            browser_path,
            settle_limit,
            browser: AsyncMutex::new(None),
        }
    }

    async fn browser(&self) -> Result<Browser, BrowserError> {
        let mut slot = self.browser.lock().await;

        if let Some(existing) = slot.as_ref() {
            let candidate = existing.clone();
            match spawn_blocking(move || candidate.get_version()).await {
                Ok(Ok(_)) => return Ok(existing.clone()),
                Ok(Err(err)) => warn!(
                    target = "infra::browser",
                    error = %err,
                    "browser health check failed; relaunching"
                ),
                Err(err) => warn!(
                    target = "infra::browser",
                    error = %err,
                    "browser health check panicked; relaunching"
                ),
            }
            *slot = None;
        }

        let path = self.browser_path.clone();
        let browser = spawn_blocking(move || launch(path))
            .await
            .map_err(|err| BrowserError::new("launch", err.to_string()))??;
        info!(
            target = "infra::browser",
            path = ?self.browser_path,
            "headless browser launched"
        );
        *slot = Some(browser.clone());
        Ok(browser)
    }
}

fn launch(path: Option<PathBuf>) -> Result<Browser, BrowserError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .path(path)
        .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
        .build()
        .map_err(|err| BrowserError::new("launch", err.to_string()))?;

    Browser::new(options).map_err(|err| BrowserError::new("launch", err.to_string()))
}

#[async_trait]
impl BrowserEngine for ChromeEngine {
    async fn open_page(&self, viewport: Viewport) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let browser = self.browser().await?;
        let settle_limit = self.settle_limit;
        let tab = spawn_blocking(move || -> Result<Arc<Tab>, BrowserError> {
            let tab = browser
                .new_tab()
                .map_err(|err| BrowserError::new("open page", err.to_string()))?;
            tab.set_default_timeout(settle_limit);
            tab.set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(f64::from(viewport.width)),
                height: Some(f64::from(viewport.height)),
            })
            .map_err(|err| BrowserError::new("set viewport", err.to_string()))?;
            Ok(tab)
        })
        .await
        .map_err(|err| BrowserError::new("open page", err.to_string()))??;

        Ok(Box::new(ChromePage {
            tab,
            document: None,
            settle_limit: self.settle_limit,
            closed: false,
        }))
    }

    async fn shutdown(&self) {
        let Some(browser) = self.browser.lock().await.take() else {
            return;
        };
        // Dropping the last handle terminates the child process.
        if let Err(err) = spawn_blocking(move || drop(browser)).await {
            warn!(target = "infra::browser", error = %err, "browser shutdown panicked");
        }
        info!(target = "infra::browser", "headless browser closed");
    }
}

struct ChromePage {
    tab: Arc<Tab>,
    /// Backing file for the loaded document; removed on drop.
    document: Option<NamedTempFile>,
    settle_limit: Duration,
    closed: bool,
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn load_html(&mut self, html: &str) -> Result<(), BrowserError> {
        let tab = Arc::clone(&self.tab);
        let html = html.to_owned();
        let settle_limit = self.settle_limit;

        let document = spawn_blocking(move || -> Result<NamedTempFile, BrowserError> {
            let mut file = tempfile::Builder::new()
                .prefix("inkpress-")
                .suffix(".html")
                .tempfile()
                .map_err(|err| BrowserError::new("write document", err.to_string()))?;
            file.write_all(html.as_bytes())
                .and_then(|_| file.flush())
                .map_err(|err| BrowserError::new("write document", err.to_string()))?;

            let url = Url::from_file_path(file.path()).map_err(|_| {
                BrowserError::new("write document", "document path is not absolute")
            })?;

            let in_flight = Arc::new(InFlightRequests::default());
            tab.call_method(Network::Enable {
                max_total_buffer_size: None,
                max_resource_buffer_size: None,
                max_post_data_size: None,
                report_direct_socket_traffic: None,
                enable_durable_messages: None,
            })
            .map_err(|err| BrowserError::new("load document", err.to_string()))?;
            let listener = tab
                .add_event_listener(in_flight.listener())
                .map_err(|err| BrowserError::new("load document", err.to_string()))?;

            let loaded = tab
                .navigate_to(url.as_str())
                .map_err(|err| BrowserError::new("load document", err.to_string()))
                .and_then(|_| wait_for_quiet_network(&tab, url.as_str(), &in_flight, settle_limit));
            if let Err(err) = tab.remove_event_listener(&listener) {
                debug!(target = "infra::browser", error = %err, "failed to detach network listener");
            }
            loaded?;
            Ok(file)
        })
        .await
        .map_err(|err| BrowserError::new("load document", err.to_string()))??;

        self.document = Some(document);
        Ok(())
    }

    async fn print_pdf(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, BrowserError> {
        let tab = Arc::clone(&self.tab);
        let options = pdf_options(settings);

        spawn_blocking(move || {
            tab.print_to_pdf(Some(options))
                .map_err(|err| BrowserError::new("print", err.to_string()))
        })
        .await
        .map_err(|err| BrowserError::new("print", err.to_string()))?
    }

    async fn close(mut self: Box<Self>) {
        self.closed = true;
        let tab = Arc::clone(&self.tab);
        match spawn_blocking(move || tab.close(false)).await {
            Ok(Ok(_)) => debug!(target = "infra::browser", "page closed"),
            Ok(Err(err)) => warn!(target = "infra::browser", error = %err, "page close failed"),
            Err(err) => warn!(target = "infra::browser", error = %err, "page close panicked"),
        }
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Ok(handle) = Handle::try_current() {
            let tab = Arc::clone(&self.tab);
            handle.spawn_blocking(move || {
                let _ = tab.close(false);
            });
        }
    }
}

/// Request ids the page has started but not yet finished or failed.
#[derive(Default)]
struct InFlightRequests {
    ids: Mutex<HashSet<String>>,
}

impl InFlightRequests {
    fn listener(self: &Arc<Self>) -> Arc<dyn EventListener<Event> + Send + Sync> {
        let tracker = Arc::clone(self);
        Arc::new(move |event: &Event| tracker.observe(event))
    }

    fn observe(&self, event: &Event) {
        match event {
            Event::NetworkRequestWillBeSent(sent) => self.started(&sent.params.request_id),
            Event::NetworkLoadingFinished(finished) => self.settled(&finished.params.request_id),
            Event::NetworkLoadingFailed(failed) => self.settled(&failed.params.request_id),
            _ => {}
        }
    }

    // redirects reuse the request id, so a repeat start is a no-op
    fn started(&self, id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
    }

    fn settled(&self, id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    fn count(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Script that is true once `url` is the committed document and its markup
/// has been parsed.
fn document_parsed_js(url: &str) -> String {
    let quoted = serde_json::to_string(url).unwrap_or_else(|_| "''".to_string());
    format!("location.href === {quoted} && document.readyState !== 'loading'")
}

/// Poll until the document is parsed and at most [`QUIET_MAX_IN_FLIGHT`]
/// requests stay outstanding for a full [`QUIET_WINDOW`].
fn wait_for_quiet_network(
    tab: &Tab,
    url: &str,
    in_flight: &InFlightRequests,
    limit: Duration,
) -> Result<(), BrowserError> {
    let started = Instant::now();
    let parsed_js = document_parsed_js(url);
    let mut quiet_since: Option<Instant> = None;

    loop {
        let parsed = tab
            .evaluate(&parsed_js, false)
            .map_err(|err| BrowserError::new("await network idle", err.to_string()))?
            .value
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        let pending = in_flight.count();

        if parsed && pending <= QUIET_MAX_IN_FLIGHT {
            let since = *quiet_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= QUIET_WINDOW {
                return Ok(());
            }
        } else {
            quiet_since = None;
        }

        if started.elapsed() >= limit {
            return Err(BrowserError::new(
                "await network idle",
                format!("{pending} requests still in flight"),
            ));
        }
        std::thread::sleep(QUIET_POLL_INTERVAL);
    }
}

fn pdf_options(settings: &PrintSettings) -> PrintToPdfOptions {
    let (paper_width, paper_height) = match settings.paper {
        PaperFormat::Named { .. } => (settings.paper_width_in, settings.paper_height_in),
        PaperFormat::Explicit {
            width_px,
            height_px,
        } => (
            f64::from(width_px) / CSS_PX_PER_INCH,
            f64::from(height_px) / CSS_PX_PER_INCH,
        ),
    };

    let with_footer = settings.footer_template.is_some();
    PrintToPdfOptions {
        print_background: Some(settings.print_background),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(settings.margin_top_in),
        margin_right: Some(settings.margin_right_in),
        margin_bottom: Some(settings.margin_bottom_in),
        margin_left: Some(settings.margin_left_in),
        display_header_footer: Some(with_footer),
        header_template: with_footer.then(|| "<span></span>".to_string()),
        footer_template: settings.footer_template.clone(),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::print::{MarginPreset, PageSize, PrintOptions};

    #[test]
    fn explicit_paper_uses_pixel_dimensions() {
        let settings = PrintSettings::from_options(&PrintOptions {
            page_size: PageSize::B5,
            margins: MarginPreset::Normal,
            include_page_numbers: false,
        });
        let options = pdf_options(&settings);

        assert_eq!(options.paper_width, Some(7.0));
        assert_eq!(options.display_header_footer, Some(false));
        assert!(options.footer_template.is_none());
    }

    #[test]
    fn page_numbers_enable_header_and_footer() {
        let settings = PrintSettings::from_options(&PrintOptions::default());
        let options = pdf_options(&settings);

        assert_eq!(options.paper_width, Some(8.27));
        assert_eq!(options.display_header_footer, Some(true));
        assert_eq!(options.header_template.as_deref(), Some("<span></span>"));
        assert_eq!(options.print_background, Some(true));
    }

    fn network_event(json: serde_json::Value) -> Event {
        serde_json::from_value(json).expect("network event")
    }

    #[test]
    fn in_flight_requests_settle_on_finish_or_failure() {
        let tracker = InFlightRequests::default();
        tracker.started("doc");
        tracker.started("font");
        tracker.started("font");
        tracker.started("image");
        assert_eq!(tracker.count(), 3);

        tracker.observe(&network_event(serde_json::json!({
            "method": "Network.loadingFinished",
            "params": { "requestId": "font", "timestamp": 1.0, "encodedDataLength": 512.0 }
        })));
        tracker.observe(&network_event(serde_json::json!({
            "method": "Network.loadingFailed",
            "params": {
                "requestId": "image",
                "timestamp": 2.0,
                "type": "Image",
                "errorText": "net::ERR_CONNECTION_REFUSED"
            }
        })));
        assert_eq!(tracker.count(), 1);

        tracker.observe(&network_event(serde_json::json!({
            "method": "Network.loadingFinished",
            "params": { "requestId": "unknown", "timestamp": 3.0, "encodedDataLength": 0.0 }
        })));
        assert_eq!(tracker.count(), 1);
    }

    #[test]
    fn parsed_check_pins_the_loaded_document() {
        let script = document_parsed_js("file:///tmp/inkpress-a.html");

        assert_eq!(
            script,
            "location.href === \"file:///tmp/inkpress-a.html\" && document.readyState !== 'loading'"
        );
    }

    #[tokio::test]
    #[ignore = "requires a local Chromium installation"]
    async fn renders_a_real_document() {
        let engine = ChromeEngine::new(None, Duration::from_secs(30));
        let mut page = engine
            .open_page(PageSize::A4.viewport())
            .await
            .expect("open page");
        // a stalled image stays in flight but is within the quiet threshold
        page.load_html(
            "<!DOCTYPE html><h1>Hello</h1><img src=\"https://10.255.255.1/stalled.png\">",
        )
        .await
        .expect("load");
        let pdf = page
            .print_pdf(&PrintSettings::from_options(&PrintOptions::default()))
            .await
            .expect("print");
        page.close().await;
        engine.shutdown().await;

        assert!(pdf.starts_with(b"%PDF-"));
    }
}

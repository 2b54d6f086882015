//! Scripted browser engine and service wiring shared by integration tests.
#![allow(dead_code)]

use std::{
    num::NonZeroUsize,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::watch;

use inkpress::{
    application::{
        pdf::{
            AdmissionSnapshot, BrowserEngine, BrowserError, BrowserPage, PdfService,
            PdfServiceConfig, PrintSettings,
        },
        render::markdown_renderer,
        themes::ThemeStore,
    },
    domain::print::Viewport,
};

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% scripted\n%%EOF\n";

/// Counters observed by tests. `open` is the number of pages not yet closed.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub open: AtomicUsize,
    pub peak_open: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub documents: Mutex<Vec<String>>,
    pub viewports: Mutex<Vec<Viewport>>,
    pub settings: Mutex<Vec<PrintSettings>>,
}

impl EngineStats {
    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn peak_open(&self) -> usize {
        self.peak_open.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn last_document(&self) -> Option<String> {
        self.documents.lock().expect("documents lock").last().cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub load_delay: Duration,
    pub print_delay: Duration,
    pub fail_open: bool,
    /// Pages hold in `load_html` until the gate flips to `true`.
    pub hold_until_released: bool,
}

pub struct FakeEngine {
    script: Script,
    stats: Arc<EngineStats>,
    release_tx: watch::Sender<bool>,
}

impl FakeEngine {
    pub fn new(script: Script) -> Arc<Self> {
        let (release_tx, _) = watch::channel(!script.hold_until_released);
        Arc::new(Self {
            script,
            stats: Arc::new(EngineStats::default()),
            release_tx,
        })
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }

    /// Let every held page (current and future) continue.
    pub fn release(&self) {
        self.release_tx.send_replace(true);
    }
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn open_page(&self, viewport: Viewport) -> Result<Box<dyn BrowserPage>, BrowserError> {
        if self.script.fail_open {
            return Err(BrowserError::new("open page", "scripted failure"));
        }
        let open = self.stats.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_open.fetch_max(open, Ordering::SeqCst);
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        self.stats
            .viewports
            .lock()
            .expect("viewports lock")
            .push(viewport);

        Ok(Box::new(FakePage {
            script: self.script.clone(),
            stats: Arc::clone(&self.stats),
            release: self.release_tx.subscribe(),
            closed: false,
        }))
    }

    async fn shutdown(&self) {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakePage {
    script: Script,
    stats: Arc<EngineStats>,
    release: watch::Receiver<bool>,
    closed: bool,
}

impl FakePage {
    fn mark_closed(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stats.open.fetch_sub(1, Ordering::SeqCst);
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn load_html(&mut self, html: &str) -> Result<(), BrowserError> {
        self.stats
            .documents
            .lock()
            .expect("documents lock")
            .push(html.to_string());
        tokio::time::sleep(self.script.load_delay).await;
        self.release
            .wait_for(|released| *released)
            .await
            .map_err(|err| BrowserError::new("load document", err.to_string()))?;
        Ok(())
    }

    async fn print_pdf(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, BrowserError> {
        self.stats
            .settings
            .lock()
            .expect("settings lock")
            .push(settings.clone());
        tokio::time::sleep(self.script.print_delay).await;
        Ok(FAKE_PDF.to_vec())
    }

    async fn close(mut self: Box<Self>) {
        self.mark_closed();
    }
}

impl Drop for FakePage {
    fn drop(&mut self) {
        self.mark_closed();
    }
}

pub fn bundled_themes() -> Arc<ThemeStore> {
    Arc::new(ThemeStore::new(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("static/public/styles/themes"),
    ))
}

pub fn pdf_service(
    engine: Arc<FakeEngine>,
    limit: usize,
    phase_timeout: Duration,
) -> Arc<PdfService> {
    Arc::new(PdfService::new(
        engine,
        markdown_renderer(),
        bundled_themes(),
        PdfServiceConfig {
            phase_timeout,
            concurrency_limit: NonZeroUsize::new(limit).expect("non-zero limit"),
        },
    ))
}

/// Poll until the coordinator reports `expected`, failing after two seconds.
pub async fn wait_for_snapshot(service: &PdfService, expected: AdmissionSnapshot) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let snapshot = service.snapshot();
        if snapshot == expected {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "coordinator stuck at {snapshot:?}, expected {expected:?}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

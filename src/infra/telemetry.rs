use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_PDF_JOBS_TOTAL: &str = "inkpress_pdf_jobs_total";
pub const METRIC_PDF_RENDER_MS: &str = "inkpress_pdf_render_ms";
pub const METRIC_PDF_QUEUE_DEPTH: &str = "inkpress_pdf_queue_depth";
pub const METRIC_THEME_CACHE_HIT: &str = "inkpress_theme_cache_hit_total";
pub const METRIC_THEME_CACHE_MISS: &str = "inkpress_theme_cache_miss_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_PDF_JOBS_TOTAL,
            Unit::Count,
            "PDF jobs by terminal result (succeeded, timed_out, failed, rejected)."
        );
        describe_histogram!(
            METRIC_PDF_RENDER_MS,
            Unit::Milliseconds,
            "Wall time of admitted PDF jobs in milliseconds."
        );
        describe_gauge!(
            METRIC_PDF_QUEUE_DEPTH,
            Unit::Count,
            "PDF jobs currently waiting for an admission slot."
        );
        describe_counter!(
            METRIC_THEME_CACHE_HIT,
            Unit::Count,
            "Theme stylesheet lookups served from memory."
        );
        describe_counter!(
            METRIC_THEME_CACHE_MISS,
            Unit::Count,
            "Theme stylesheet lookups that read from disk."
        );
    });
}

//! Theme catalogue access and the read-through stylesheet cache.

use std::{path::PathBuf, sync::Arc};

use dashmap::DashMap;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    domain::themes::{THEMES, Theme, ThemeId},
    infra::telemetry::{METRIC_THEME_CACHE_HIT, METRIC_THEME_CACHE_MISS},
};

const BASE_STYLESHEET: &str = "_base.css";

static BASE_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+['"]\.?/?_base\.css['"];?\s*"#).expect("valid import pattern")
});

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("unknown theme `{0}`")]
    UnknownTheme(String),
    #[error("failed to load stylesheet for theme `{theme}` from {}", path.display())]
    StylesheetLoad {
        theme: ThemeId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serves theme metadata and combined stylesheets read from `directory`.
#[derive(Debug)]
pub struct ThemeStore {
    directory: PathBuf,
    cache: DashMap<ThemeId, Arc<str>>,
}

impl ThemeStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            cache: DashMap::new(),
        }
    }

    pub fn list_themes(&self) -> &'static [Theme] {
        &THEMES
    }

    pub fn is_valid(&self, id: &str) -> bool {
        id.parse::<ThemeId>().is_ok()
    }

    /// Combined base and theme stylesheet for `id`.
    pub async fn stylesheet(&self, id: &str) -> Result<Arc<str>, ThemeError> {
        let theme = id
            .parse::<ThemeId>()
            .map_err(|_| ThemeError::UnknownTheme(id.to_string()))?;
        self.stylesheet_for(theme).await
    }

    pub async fn stylesheet_for(&self, theme: ThemeId) -> Result<Arc<str>, ThemeError> {
        if let Some(cached) = self.cache.get(&theme) {
            counter!(METRIC_THEME_CACHE_HIT, "theme" => theme.as_str()).increment(1);
            return Ok(Arc::clone(cached.value()));
        }
        counter!(METRIC_THEME_CACHE_MISS, "theme" => theme.as_str()).increment(1);

        let base_path = self.directory.join(BASE_STYLESHEET);
        let theme_path = self.directory.join(theme.stylesheet_file());
        let (base, theme_css) = tokio::try_join!(
            read_stylesheet(theme, base_path),
            read_stylesheet(theme, theme_path)
        )?;

        let combined: Arc<str> = combine(theme, &base, &theme_css).into();
        self.cache.insert(theme, Arc::clone(&combined));
        debug!(
            target = "application::themes",
            theme = %theme,
            bytes = combined.len(),
            "theme stylesheet cached"
        );
        Ok(combined)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

async fn read_stylesheet(theme: ThemeId, path: PathBuf) -> Result<String, ThemeError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(css) => Ok(css),
        Err(source) => {
            warn!(
                target = "application::themes",
                theme = %theme,
                path = %path.display(),
                error = %source,
                "theme stylesheet could not be read"
            );
            Err(ThemeError::StylesheetLoad {
                theme,
                path,
                source,
            })
        }
    }
}

fn combine(theme: ThemeId, base: &str, theme_css: &str) -> String {
    let stripped = BASE_IMPORT.replace_all(theme_css, "");
    format!("/* Base Styles */\n{base}\n\n/* Theme: {theme} */\n{stripped}")
}

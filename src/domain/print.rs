//! Print layout vocabulary: page sizes, margin presets and the geometry derived from them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Bottom margin used when a page-number footer has to fit under the content.
pub const FOOTER_BOTTOM_MARGIN_MM: f64 = 25.0;

/// Viewport height used for the named formats; only width affects layout.
const DEFAULT_VIEWPORT_HEIGHT: u32 = 1080;

/// CSS pixels per inch assumed by the rendering engine.
pub const CSS_PX_PER_INCH: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    B5,
}

/// How a page size is communicated to the rasterizer.
///
/// B5 has no named paper format in the engine's vocabulary, so it always goes
/// through explicit pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaperFormat {
    Named {
        width_in: f64,
        height_in: f64,
    },
    Explicit {
        width_px: u32,
        height_px: u32,
    },
}

impl PaperFormat {
    /// Paper dimensions in inches regardless of the path taken.
    pub fn inches(&self) -> (f64, f64) {
        match *self {
            PaperFormat::Named {
                width_in,
                height_in,
                ..
            } => (width_in, height_in),
            PaperFormat::Explicit {
                width_px,
                height_px,
            } => (
                f64::from(width_px) / CSS_PX_PER_INCH,
                f64::from(height_px) / CSS_PX_PER_INCH,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
            PageSize::B5 => "B5",
        }
    }

    pub fn paper_format(self) -> PaperFormat {
        match self {
            PageSize::A4 => PaperFormat::Named {
                width_in: 8.27,
                height_in: 11.7,
            },
            PageSize::Letter => PaperFormat::Named {
                width_in: 8.5,
                height_in: 11.0,
            },
            PageSize::Legal => PaperFormat::Named {
                width_in: 8.5,
                height_in: 14.0,
            },
            PageSize::B5 => PaperFormat::Explicit {
                width_px: 672,
                height_px: 945,
            },
        }
    }

    /// Browser viewport matching the printable page width at 96 dpi.
    pub fn viewport(self) -> Viewport {
        match self.paper_format() {
            PaperFormat::Explicit {
                width_px,
                height_px,
            } => Viewport {
                width: width_px,
                height: height_px,
            },
            PaperFormat::Named { .. } => Viewport {
                width: match self {
                    PageSize::A4 => 794,
                    _ => 816,
                },
                height: DEFAULT_VIEWPORT_HEIGHT,
            },
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageSize {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            "b5" => Ok(PageSize::B5),
            _ => Err(DomainError::unsupported("page size", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginPreset {
    #[default]
    Normal,
    Narrow,
    Wide,
}

impl MarginPreset {
    pub fn millimetres(self) -> f64 {
        match self {
            MarginPreset::Normal => 20.0,
            MarginPreset::Narrow => 10.0,
            MarginPreset::Wide => 25.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarginPreset::Normal => "normal",
            MarginPreset::Narrow => "narrow",
            MarginPreset::Wide => "wide",
        }
    }
}

impl FromStr for MarginPreset {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "normal" => Ok(MarginPreset::Normal),
            "narrow" => Ok(MarginPreset::Narrow),
            "wide" => Ok(MarginPreset::Wide),
            _ => Err(DomainError::unsupported("margin preset", value)),
        }
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// User-selectable print options attached to a PDF request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintOptions {
    pub page_size: PageSize,
    pub margins: MarginPreset,
    pub include_page_numbers: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margins: MarginPreset::Normal,
            include_page_numbers: true,
        }
    }
}

impl PrintOptions {
    pub fn page_margins(&self) -> PageMargins {
        let edge = self.margins.millimetres();
        PageMargins {
            top: edge,
            right: edge,
            bottom: if self.include_page_numbers {
                FOOTER_BOTTOM_MARGIN_MM
            } else {
                edge
            },
            left: edge,
        }
    }
}

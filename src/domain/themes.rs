//! The fixed catalogue of print themes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Identifier of one of the built-in themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    Clean,
    Academic,
    Modern,
    Compact,
    Executive,
    Manuscript,
    Technical,
    Minimalist,
    Newsletter,
}

impl ThemeId {
    pub const ALL: [ThemeId; 9] = [
        ThemeId::Clean,
        ThemeId::Academic,
        ThemeId::Modern,
        ThemeId::Compact,
        ThemeId::Executive,
        ThemeId::Manuscript,
        ThemeId::Technical,
        ThemeId::Minimalist,
        ThemeId::Newsletter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeId::Clean => "clean",
            ThemeId::Academic => "academic",
            ThemeId::Modern => "modern",
            ThemeId::Compact => "compact",
            ThemeId::Executive => "executive",
            ThemeId::Manuscript => "manuscript",
            ThemeId::Technical => "technical",
            ThemeId::Minimalist => "minimalist",
            ThemeId::Newsletter => "newsletter",
        }
    }

    /// File name of the theme stylesheet inside the themes directory.
    pub fn stylesheet_file(self) -> String {
        format!("{}.css", self.as_str())
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ThemeId::ALL
            .into_iter()
            .find(|id| id.as_str() == value)
            .ok_or_else(|| DomainError::unsupported("theme", value))
    }
}

/// Display metadata for a theme, as exposed by `GET /api/themes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: ThemeId,
    pub name: &'static str,
    pub description: &'static str,
}

pub static THEMES: [Theme; 9] = [
    Theme {
        id: ThemeId::Clean,
        name: "Clean",
        description: "Minimal, professional styling with generous white space. Perfect for documentation.",
    },
    Theme {
        id: ThemeId::Academic,
        name: "Academic",
        description: "Traditional serif fonts with justified text. Ideal for essays and research papers.",
    },
    Theme {
        id: ThemeId::Modern,
        name: "Modern",
        description: "Contemporary design with subtle colored accents. Great for technical documentation.",
    },
    Theme {
        id: ThemeId::Compact,
        name: "Compact",
        description: "Optimized for maximum content per page. Small fonts and tight spacing.",
    },
    Theme {
        id: ThemeId::Executive,
        name: "Executive",
        description: "Bold, corporate look with strong visual hierarchy. Ideal for business documents.",
    },
    Theme {
        id: ThemeId::Manuscript,
        name: "Manuscript",
        description: "Traditional book style with classic serif typography. Perfect for literary content.",
    },
    Theme {
        id: ThemeId::Technical,
        name: "Technical",
        description: "Optimized for code-heavy technical documentation. High contrast and mono-friendly.",
    },
    Theme {
        id: ThemeId::Minimalist,
        name: "Minimalist",
        description: "Ultra-clean design with maximum whitespace. For content that speaks for itself.",
    },
    Theme {
        id: ThemeId::Newsletter,
        name: "Newsletter",
        description: "Friendly layout with subtle decorative elements. Great for casual communications.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_covers_every_identifier_in_order() {
        let ids: Vec<ThemeId> = THEMES.iter().map(|theme| theme.id).collect();
        assert_eq!(ids, ThemeId::ALL.to_vec());
    }

    #[test]
    fn parses_known_ids_and_rejects_others() {
        assert_eq!("modern".parse::<ThemeId>().unwrap(), ThemeId::Modern);
        assert!("Modern".parse::<ThemeId>().is_err());
        assert!("nonexistent".parse::<ThemeId>().is_err());
        assert!("".parse::<ThemeId>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_identifier() {
        let json = serde_json::to_value(THEMES[0]).expect("theme serializes");
        assert_eq!(json["id"], "clean");
        assert_eq!(json["name"], "Clean");
    }
}

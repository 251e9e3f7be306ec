use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Value of the document's `data-theme` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Icon on the toggle button; it shows the theme you would switch to.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Light => "🌙",
            Self::Dark => "☀️",
        }
    }

    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Light => "Passer au thème sombre",
            Self::Dark => "Passer au thème clair",
        }
    }
}

impl Serialize for Theme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("failed to read theme file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write theme file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persists the theme preference as a single word in a file.
#[derive(Clone, Debug)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file or an unknown value yields the default light theme.
    pub fn load(&self) -> Result<Theme, ThemeError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Theme::parse(&contents).unwrap_or_else(|| {
                warn!(path = %self.path.display(), "ignoring unknown theme value");
                Theme::default()
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Theme::default()),
            Err(e) => Err(ThemeError::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    pub fn save(&self, theme: Theme) -> Result<(), ThemeError> {
        let write_err = |e: std::io::Error| ThemeError::Write {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, theme.as_str()).map_err(write_err)?;
        debug!(theme = theme.as_str(), path = %self.path.display(), "theme saved");
        Ok(())
    }

    pub fn toggle(&self) -> Result<Theme, ThemeError> {
        let next = self.load()?.toggled();
        self.save(next)?;
        Ok(next)
    }
}

use crate::catalog::schema::{CatalogConfig, ValidationError};
use crate::catalog::RuleCatalog;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read rule catalog from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse rule catalog TOML{}: {source}", path_suffix(.path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("invalid rule catalog{}: {source}", path_suffix(.path))]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

impl CatalogError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            CatalogError::Toml { path: None, source } => CatalogError::Toml {
                path: Some(path),
                source,
            },
            CatalogError::Validation { path: None, source } => CatalogError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RuleCatalog, CatalogError> {
    let config: CatalogConfig = toml_edit::de::from_str(input)
        .map_err(|source| CatalogError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| CatalogError::Validation { path: None, source })?;
    RuleCatalog::compile(config).map_err(|source| CatalogError::Validation { path: None, source })
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleCatalog, CatalogError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load several catalog files as one ordered catalog. Rules keep file
/// order then in-file order; duplicate ids across files are fatal like
/// any other validation issue.
pub fn load_many(paths: &[impl AsRef<Path>]) -> Result<RuleCatalog, CatalogError> {
    let mut merged = CatalogConfig::default();

    for path in paths {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CatalogConfig = toml_edit::de::from_str(&contents)
            .map_err(|source| CatalogError::Toml { path: None, source })
            .map_err(|error| error.with_path(path))?;
        if merged.meta.name.is_empty() {
            merged.meta = config.meta;
        }
        merged.rules.extend(config.rules);
    }

    merged
        .validate()
        .map_err(|source| CatalogError::Validation { path: None, source })?;
    RuleCatalog::compile(merged).map_err(|source| CatalogError::Validation { path: None, source })
}

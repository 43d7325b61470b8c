//! Business-type aware message translation.
//!
//! Catalogs are nested JSON objects flattened to dotted keys
//! (`errors.not_found`). Lookups fall back from the workspace's business
//! type to the `default` catalog, then to the caller's default text, then
//! to the key itself. Translation never fails.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

pub const DEFAULT_BUSINESS_TYPE: &str = "default";

const EMBEDDED: [(&str, &str); 3] = [
    (DEFAULT_BUSINESS_TYPE, include_str!("catalogs/default.json")),
    ("education", include_str!("catalogs/education.json")),
    ("fitness_center", include_str!("catalogs/fitness_center.json")),
];

pub trait TranslationService: Send + Sync {
    /// Translated text for `key`, or the key itself when no catalog has it.
    fn get(&self, business_type: &str, key: &str, params: &[(&str, &str)]) -> String;

    /// Like [`Self::get`] but with caller-provided fallback text.
    fn get_with_default(
        &self,
        business_type: &str,
        key: &str,
        default: &str,
        params: &[(&str, &str)],
    ) -> String;
}

type Catalog = HashMap<String, String>;

/// Translation backed by in-memory JSON catalogs, one per business type.
#[derive(Debug, Clone)]
pub struct CatalogTranslationService {
    catalogs: HashMap<String, Catalog>,
}

impl CatalogTranslationService {
    /// Service with only the catalogs compiled into the binary.
    pub fn embedded() -> AppResult<Self> {
        let mut service = Self {
            catalogs: HashMap::new(),
        };
        for (business_type, source) in EMBEDDED {
            service.merge_source(business_type, source)?;
        }
        Ok(service)
    }

    /// Embedded catalogs overlaid with every `<business_type>.json` in `dir`.
    pub fn with_overrides(dir: &Path) -> AppResult<Self> {
        let mut service = Self::embedded()?;
        let entries = fs::read_dir(dir).map_err(|e| catalog_error(dir, e.into()))?;
        for entry in entries {
            let path = entry.map_err(|e| catalog_error(dir, e.into()))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(business_type) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "Skipping catalog with non UTF-8 name");
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|e| catalog_error(&path, e.into()))?;
            service.merge_source(business_type, &source)?;
            debug!(business_type, path = %path.display(), "Loaded translation catalog");
        }
        Ok(service)
    }

    pub fn business_types(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    fn merge_source(&mut self, business_type: &str, source: &str) -> AppResult<()> {
        let value: JsonValue = serde_json::from_str(source).map_err(|e| AppError::Configuration {
            key: format!("i18n.{business_type}"),
            source: e.into(),
        })?;
        let catalog = self.catalogs.entry(business_type.to_string()).or_default();
        flatten("", &value, catalog);
        Ok(())
    }

    fn lookup(&self, business_type: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(business_type)
            .and_then(|c| c.get(key))
            .or_else(|| {
                self.catalogs
                    .get(DEFAULT_BUSINESS_TYPE)
                    .and_then(|c| c.get(key))
            })
            .map(String::as_str)
    }
}

impl TranslationService for CatalogTranslationService {
    fn get(&self, business_type: &str, key: &str, params: &[(&str, &str)]) -> String {
        self.get_with_default(business_type, key, key, params)
    }

    fn get_with_default(
        &self,
        business_type: &str,
        key: &str,
        default: &str,
        params: &[(&str, &str)],
    ) -> String {
        let template = self.lookup(business_type, key).unwrap_or(default);
        interpolate(template, params)
    }
}

fn catalog_error(path: &Path, source: anyhow::Error) -> AppError {
    AppError::Configuration {
        key: format!("i18n.catalog_dir ({})", path.display()),
        source,
    }
}

fn flatten(prefix: &str, value: &JsonValue, out: &mut Catalog) {
    match value {
        JsonValue::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        JsonValue::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        JsonValue::Null => {}
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

/// Replaces `{name}` placeholders; unknown placeholders are left as written.
/// Substituted values are never scanned again.
fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[..close];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

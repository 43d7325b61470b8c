//! Command handlers, separated from parsing and dispatch.
//!
//! Handlers return the text to print; the executor writes it to stdout.

pub mod check;
pub mod item;
pub mod list;

pub use check::CheckCommandHandler;
pub use item::ItemCommandHandler;
pub use list::ListCommandHandler;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::error::AppResult;
use crate::models::Entity;
use crate::repositories::EntityRepository;

/// Validates and stores every entity of a JSON array file, in file order.
pub(crate) async fn load_entities<E: Entity>(
    repo: &Arc<dyn EntityRepository<E>>,
    path: &Path,
) -> AppResult<usize> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    let entities: Vec<E> = serde_json::from_str(&source)
        .with_context(|| format!("{} is not a JSON array of {} records", path.display(), E::NAME))?;

    let count = entities.len();
    for entity in entities {
        entity.validate()?;
        repo.create(entity).await?;
    }
    info!(entity = E::NAME, count, file = %path.display(), "Loaded entities");
    Ok(count)
}

pub(crate) fn render<T: Serialize>(value: &T, compact: bool) -> AppResult<String> {
    let text = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialize output")?;
    Ok(text)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use serde::Serialize;
    use tempfile::TempDir;

    use crate::config::Settings;
    use crate::state::AppState;

    /// `admin` may do anything, other users nothing.
    pub fn state() -> AppState {
        let mut settings = Settings::default();
        settings
            .authorization
            .grants
            .insert("admin".to_string(), vec!["*:*".to_string()]);
        AppState::from_settings(settings).unwrap()
    }

    pub fn data_file<T: Serialize>(dir: &TempDir, name: &str, items: &[T]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string(items).unwrap()).unwrap();
        path
    }
}

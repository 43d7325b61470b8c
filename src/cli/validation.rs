//! Value parsers for CLI arguments that clap cannot check on its own.

use std::fs;
use std::path::PathBuf;

use crate::listing::{SortDirection, SortField};

/// The file must exist, be a regular file and be readable.
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    readable_file(path_str, "Configuration file")
}

/// Like [`validate_config_file_path`], additionally requiring a `.json`
/// extension.
pub fn validate_json_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = readable_file(path_str, "Data file")?;
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(path),
        _ => Err(format!("Data file must have a .json extension: '{path_str}'")),
    }
}

fn readable_file(path_str: &str, what: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(format!("{what} does not exist: '{path_str}'"));
    }
    if !path.is_file() {
        return Err(format!("{what} path is not a file: '{path_str}'"));
    }
    fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read {} '{path_str}': {e}", what.to_lowercase()))
}

/// `field`, `field:asc` or `field:desc`. Nulls always sort last.
pub fn parse_sort_field(spec: &str) -> Result<SortField, String> {
    let (field, direction) = match spec.split_once(':') {
        Some((field, dir)) => {
            let direction = match dir.trim().to_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(format!(
                        "Invalid sort direction '{other}'. Use 'asc' or 'desc'"
                    ));
                }
            };
            (field.trim(), direction)
        }
        None => (spec.trim(), SortDirection::Asc),
    };
    if field.is_empty() {
        return Err("Sort field cannot be empty".to_string());
    }
    Ok(match direction {
        SortDirection::Asc => SortField::asc(field),
        SortDirection::Desc => SortField::desc(field),
    })
}

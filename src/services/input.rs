use crate::core::ItemList;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON input must be an object or an array of strings")]
    UnsupportedJson,

    #[error("Value for key {key} is not a string")]
    NonStringValue { key: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// JSON for `.json` files or content that parses as JSON, otherwise lines
    #[default]
    Auto,
    /// `{"key": "text"}` or `["text", ...]`
    Json,
    /// One item per non-blank line
    Lines,
}

/// Read items from `source` (a file path, or `-` for stdin).
pub fn load_items(source: &str, format: InputFormat) -> Result<ItemList<String>, InputError> {
    if source == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return parse_items(&buffer, format);
    }

    let path = Path::new(source);
    if !path.is_file() {
        return Err(InputError::InvalidPath {
            path: source.to_string(),
        });
    }
    let format = match format {
        InputFormat::Auto if has_json_extension(path) => InputFormat::Json,
        other => other,
    };
    parse_items(&fs::read_to_string(path)?, format)
}

pub fn parse_items(content: &str, format: InputFormat) -> Result<ItemList<String>, InputError> {
    match format {
        InputFormat::Json => parse_json(content),
        InputFormat::Lines => Ok(parse_lines(content)),
        InputFormat::Auto => {
            let trimmed = content.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                match parse_json(content) {
                    Ok(items) => return Ok(items),
                    Err(e) => log::debug!("Input is not usable JSON ({}), reading lines", e),
                }
            }
            Ok(parse_lines(content))
        }
    }
}

fn parse_json(content: &str) -> Result<ItemList<String>, InputError> {
    match serde_json::from_str::<Value>(content)? {
        Value::Object(map) => {
            let mut items = ItemList::with_capacity(map.len());
            for (key, value) in map {
                let Value::String(text) = value else {
                    return Err(InputError::NonStringValue { key });
                };
                items.insert(key, text);
            }
            Ok(items)
        }
        Value::Array(values) => {
            let mut items = ItemList::with_capacity(values.len());
            for (pos, value) in values.into_iter().enumerate() {
                let Value::String(text) = value else {
                    return Err(InputError::NonStringValue {
                        key: pos.to_string(),
                    });
                };
                items.insert(pos.to_string(), text);
            }
            Ok(items)
        }
        _ => Err(InputError::UnsupportedJson),
    }
}

/// Keys are the positions among non-blank lines.
fn parse_lines(content: &str) -> ItemList<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(pos, line)| (pos.to_string(), line))
        .collect()
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Recursively list file names under `root`.
///
/// Keys are paths relative to `root`, texts are bare file names. `extensions`
/// filters case-insensitively (a leading dot is ignored); empty keeps all files.
pub fn scan_file_names(root: &Path, extensions: &[String]) -> Result<ItemList<String>, InputError> {
    if !root.is_dir() {
        return Err(InputError::InvalidPath {
            path: format!("{} is not a directory", root.display()),
        });
    }

    let allowed: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut items = ItemList::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if !allowed.is_empty() {
            let ext = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !allowed.contains(&ext) {
                continue;
            }
        }

        let key = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        let name = entry.file_name().to_string_lossy().into_owned();
        items.insert(key, name);
    }

    log::info!("Found {} file(s) under {}", items.len(), root.display());
    Ok(items)
}

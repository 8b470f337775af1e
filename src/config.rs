//! File configuration for harvest defaults.
//!
//! The file is a flat `key = value` document (a TOML subset): `#` starts a
//! comment outside of quoted strings, strings are double-quoted, numbers are
//! bare. Command-line flags override every value read here.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use harvester_core::{ArtifactFormat, CollisionPolicy};

/// Directory name under the user config root.
const CONFIG_DIR_NAME: &str = "arxiv-harvester";

/// File-backed defaults. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    /// Directory receiving artifacts and `metadata.json`.
    pub output_dir: Option<PathBuf>,
    /// Worker pool size (1..=64).
    pub workers: Option<u8>,
    /// Artifact format.
    pub format: Option<ArtifactFormat>,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Attempts per result page (1..=10).
    pub page_attempts: Option<u32>,
    /// Filename collision handling.
    pub on_collision: Option<CollisionPolicy>,
    /// Unresolved fraction at which the PDF fallback is offered.
    pub fallback_threshold: Option<f64>,
    /// Search endpoint override.
    pub search_base_url: Option<String>,
    /// Base URL that artifact links are resolved against.
    pub site_base_url: Option<String>,
}

/// Result of looking for a config file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path that was consulted, if one could be resolved.
    pub path: Option<PathBuf>,
    /// Parsed values, when a file was found.
    pub config: FileConfig,
    /// Whether a file was actually read.
    pub loaded_from_file: bool,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/arxiv-harvester/config.toml`
/// 2. `$HOME/.config/arxiv-harvester/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads `explicit` when given, otherwise the default path if it exists.
///
/// An explicit path that does not exist is an error; a missing default file
/// is not.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

/// Reads and parses one config file.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Parses config text. Range checks run per line so errors name the line.
pub fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "workers" => {
                let parsed = parse_integer(value)
                    .and_then(|n| check_range(n, 1, 64))
                    .with_context(invalid)?;
                cfg.workers = Some(u8::try_from(parsed).with_context(invalid)?);
            }
            "format" => {
                let parsed = parse_string_literal(value)
                    .and_then(|s| s.parse::<ArtifactFormat>().map_err(|e| anyhow!(e)))
                    .with_context(invalid)?;
                cfg.format = Some(parsed);
            }
            "request_timeout_secs" => {
                let parsed = parse_integer(value)
                    .and_then(|n| check_range(n, 1, 3600))
                    .with_context(invalid)?;
                cfg.request_timeout_secs = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer(value)
                    .and_then(|n| check_range(n, 1, 3600))
                    .with_context(invalid)?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "page_attempts" => {
                let parsed = parse_integer(value)
                    .and_then(|n| check_range(n, 1, 10))
                    .with_context(invalid)?;
                cfg.page_attempts = Some(u32::try_from(parsed).with_context(invalid)?);
            }
            "on_collision" => {
                let parsed = parse_string_literal(value)
                    .and_then(|s| s.parse::<CollisionPolicy>().map_err(|e| anyhow!(e)))
                    .with_context(invalid)?;
                cfg.on_collision = Some(parsed);
            }
            "fallback_threshold" => {
                let parsed = parse_fraction(value).with_context(invalid)?;
                cfg.fallback_threshold = Some(parsed);
            }
            "search_base_url" => {
                let parsed = parse_url_literal(value).with_context(invalid)?;
                cfg.search_base_url = Some(parsed);
            }
            "site_base_url" => {
                let parsed = parse_url_literal(value).with_context(invalid)?;
                cfg.site_base_url = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_url_literal(raw_value: &str) -> Result<String> {
    let parsed = parse_string_literal(raw_value)?;
    url::Url::parse(&parsed).with_context(|| format!("'{parsed}' is not an absolute URL"))?;
    Ok(parsed)
}

fn parse_integer(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow!("Integer value out of range for u64"))
}

fn check_range(value: u64, min: u64, max: u64) -> Result<u64> {
    if !(min..=max).contains(&value) {
        bail!("{value} is outside the expected range {min}..={max}");
    }
    Ok(value)
}

fn parse_fraction(raw_value: &str) -> Result<f64> {
    let value = raw_value.trim().parse::<f64>()?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        bail!("{value} is outside the expected range 0.0..=1.0");
    }
    Ok(value)
}

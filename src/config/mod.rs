// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{BridgeError, Result as BridgeResult};
use crate::log::TracingConfig;

const BASE_DIR_NAME: &str = ".nvim-jump";
const CONFIG_FILE_NAME: &str = "nvim-jump.toml";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub log_dir: PathBuf,
    pub server: ServerConfig,
    pub editor: EditorConfig,
    pub log: TracingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the request listener binds to.
    pub listen: SocketAddr,
    /// How long a client may take to send its request line.
    pub read_timeout_secs: u64,
    /// Longest accepted request line, in bytes, newline included.
    pub max_request_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 14905)),
            read_timeout_secs: 60,
            max_request_length: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// TCP address Neovim listens on (`nvim --listen <address>`).
    pub address: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:4293".to_string(),
        }
    }
}

/// On-disk layout of `nvim-jump.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerConfig,
    editor: EditorConfig,
    log: TracingConfig,
}

/// Non-critical problems found while loading the configuration.
///
/// They are collected before the logger exists and logged by the caller afterwards.
#[derive(Debug, Clone)]
pub enum ConfigLoadWarning {
    /// The config file does not exist; built-in defaults are used.
    MissingFile { path: PathBuf },
}

impl std::fmt::Display for ConfigLoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadWarning::MissingFile { path } => {
                write!(f, "Config file {:?} not found, using defaults", path)
            }
        }
    }
}

/// Returns `~/.nvim-jump`.
pub fn find_base_dir() -> BridgeResult<PathBuf> {
    dirs::home_dir()
        .map(|d| d.join(BASE_DIR_NAME))
        .ok_or(BridgeError::HomeDirNotFound)
}

/// Loads the configuration from `config_path`, or from
/// `~/.nvim-jump/config/nvim-jump.toml` when no path is given.
pub async fn load(config_path: Option<PathBuf>) -> BridgeResult<(BridgeConfig, Vec<ConfigLoadWarning>)> {
    let base_dir = find_base_dir()?;
    let config_path = config_path.unwrap_or_else(|| base_dir.join("config").join(CONFIG_FILE_NAME));

    load_from(&base_dir, &config_path).await
}

/// Loads `config_path`, resolving relative defaults against `base_dir`.
pub async fn load_from(
    base_dir: &Path,
    config_path: &Path,
) -> BridgeResult<(BridgeConfig, Vec<ConfigLoadWarning>)> {
    let mut warnings = vec![];

    let file = if config_path.exists() {
        let contents = fs::read_to_string(config_path)
            .await
            .map_err(|e| BridgeError::IoWithPath { source: e, path: config_path.to_path_buf() })?;
        parse_config(&contents)
            .map_err(|e| BridgeError::Config(format!("{}: {}", config_path.display(), e)))?
    } else {
        warnings.push(ConfigLoadWarning::MissingFile { path: config_path.to_path_buf() });
        ConfigFile::default()
    };

    let log_dir = file.log.dir.clone().unwrap_or_else(|| base_dir.join("log"));

    Ok((BridgeConfig {
        base_dir: base_dir.to_path_buf(),
        config_path: config_path.to_path_buf(),
        log_dir,
        server: file.server,
        editor: file.editor,
        log: file.log,
    }, warnings))
}

fn parse_config(contents: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(contents)
}

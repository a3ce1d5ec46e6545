// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Centralized error handling for nvim-jump.
//!
//! Uses `thiserror` to define structured errors and `anyhow` for convenient propagation.
//! All modules return `Result<T, BridgeError>` for internal logic,
//! and `main` uses `anyhow::Result<T>` (re-exported as `AnyResult<T>`).

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinError;

use crate::request::RequestError;

/// The root error type for all bridge failures.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// General-purpose error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Failed to determine the user's home directory.
    #[error("Home directory not found")]
    HomeDirNotFound,

    /// I/O error (connection reset, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// IO error with associated path for better diagnostics
    #[error("I/O error at {path:?}: {source}")]
    IoWithPath {
        source: std::io::Error,
        path: PathBuf,
    },

    /// The listener could not bind its address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        source: std::io::Error,
        addr: SocketAddr,
    },

    /// Configuration loading or parsing error.
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed jump request.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Connecting to the editor or one of its RPC calls failed.
    #[error("Editor error during `{action}`: {message}")]
    Editor {
        action: String,
        message: String,
    },

    /// Task join error.
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
}

impl BridgeError {
    /// Creates an `Editor` error for the RPC call (or connection attempt) named by `action`.
    pub fn editor(action: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Editor {
            action: action.into(),
            message: err.to_string(),
        }
    }
}

/// Convenient alias for `Result<T, BridgeError>`.
pub type Result<T> = std::result::Result<T, BridgeError>;

pub use anyhow::Result as AnyResult;

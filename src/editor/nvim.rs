// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Neovim msgpack-RPC backend built on `nvim-rs`.
//!
//! Neovim has to be listening on TCP, e.g. `nvim --listen 127.0.0.1:4293`.

use nvim_rs::create::tokio as create;
use nvim_rs::error::LoopError;
use nvim_rs::{Handler, Neovim};
use tokio::io::WriteHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::compat::Compat;

use super::{EditorConnector, EditorSession};
use crate::error::{BridgeError, Result as BridgeResult};

type NvimWriter = Compat<WriteHalf<TcpStream>>;

/// Requests and notifications from Neovim are not expected; the default
/// handler behaviour (reject requests, ignore notifications) is enough.
#[derive(Clone)]
struct RpcHandler;

impl Handler for RpcHandler {
    type Writer = NvimWriter;
}

/// Connects to a Neovim instance at a fixed TCP address.
#[derive(Debug, Clone)]
pub struct NvimConnector {
    address: String,
}

impl NvimConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl EditorConnector for NvimConnector {
    type Session = NvimSession;

    async fn connect(&self) -> BridgeResult<NvimSession> {
        let (neovim, io) = create::new_tcp(self.address.as_str(), RpcHandler)
            .await
            .map_err(|e| BridgeError::editor(format!("connect {}", self.address), e))?;
        tracing::debug!("Connected to Neovim at {}", self.address);

        Ok(NvimSession { neovim, io })
    }
}

/// One RPC session. The IO loop is stopped when the session is dropped.
pub struct NvimSession {
    neovim: Neovim<NvimWriter>,
    io: JoinHandle<Result<(), Box<LoopError>>>,
}

impl EditorSession for NvimSession {
    async fn eval(&mut self, expr: &str) -> BridgeResult<i64> {
        let value = self
            .neovim
            .eval(expr)
            .await
            .map_err(|e| BridgeError::editor(expr, e))?;

        value
            .as_i64()
            .ok_or_else(|| BridgeError::editor(expr, format!("expected a number, got {}", value)))
    }

    async fn command(&mut self, command: &str) -> BridgeResult<()> {
        self.neovim
            .command(command)
            .await
            .map_err(|e| BridgeError::editor(command, e))
    }
}

impl Drop for NvimSession {
    fn drop(&mut self) {
        self.io.abort();
        tracing::trace!("Closed Neovim session");
    }
}

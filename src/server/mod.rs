// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::editor::EditorConnector;
use crate::error::Result as BridgeResult;

mod listener;

pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<broadcast::Sender<()>>,
    join_handle: Option<JoinHandle<BridgeResult<()>>>,
}

impl ServerHandle {
    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Gracefully shuts down the server and waits for the accept loop to finish.
    pub async fn shutdown(mut self) -> BridgeResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::debug!("Sending shutdown signal to jump server");
        }
        if let Some(handle) = self.join_handle.take() {
            handle.await??;
        }
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::debug!("Sending shutdown signal to jump server on drop");
        }
    }
}

/// Starts the jump request server in the background.
///
/// Every accepted connection is served by its own task, which talks to the editor
/// through `connector`.
pub async fn start<C: EditorConnector>(config: &ServerConfig, connector: C) -> BridgeResult<ServerHandle> {
    listener::spawn_server(config.clone(), Arc::new(connector)).await
}

// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! TCP listener for jump requests.
//!
//! The server:
//! - Listens on a local TCP address (`127.0.0.1:14905` by default)
//! - Reads exactly one `\n`-terminated request line per connection
//! - Parses it with [`crate::request::parse_request`] and hands it to [`crate::editor::jump`]
//! - Never writes a reply; failures are only logged
//! - Isolates failures: a bad request or an unreachable editor ends that
//!   connection only, the accept loop keeps running
//! - Supports graceful shutdown via a broadcast channel
//!
//! There is no ordering between concurrent connections. Two requests racing for
//! the same editor are applied in whatever order their RPC calls land.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{timeout, Duration as TokioDuration};

use crate::config::ServerConfig;
use crate::editor::{self, EditorConnector};
use crate::error::{BridgeError, Result as BridgeResult};
use crate::request::parse_request;

/// Binds the listener and spawns the accept loop as a background task.
///
/// # Errors
///
/// Returns [`BridgeError::Bind`] if the address cannot be bound.
pub async fn spawn_server<C: EditorConnector>(
    config: ServerConfig,
    connector: Arc<C>,
) -> BridgeResult<super::ServerHandle> {
    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| BridgeError::Bind { source: e, addr: config.listen })?;
    let local_addr = listener.local_addr()?;
    tracing::debug!("Bind jump server to {}", local_addr);

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let join_handle = tokio::spawn(run_server_loop(listener, config, connector, shutdown_rx));

    Ok(super::ServerHandle {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        join_handle: Some(join_handle),
    })
}

/// Accepts connections until a shutdown signal arrives.
///
/// Accept errors are logged and the loop carries on.
async fn run_server_loop<C: EditorConnector>(
    listener: TcpListener,
    config: ServerConfig,
    connector: Arc<C>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> BridgeResult<()> {
    tracing::info!("Starting jump server listener");

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        tracing::debug!("Get new connection from {}", peer);
                        let connector = connector.clone();
                        let config = config.clone();
                        let shutdown_rx_clone = shutdown_rx.resubscribe();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, &config, connector, shutdown_rx_clone).await {
                                tracing::error!("Connection handler error ({}): {}", peer, e);
                            }
                        });
                    },
                    Err(e) => {
                        tracing::error!("Listener accept error: {}", e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::debug!("Listener received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}

/// Serves one connection: one request line in, editor calls out, nothing written back.
///
/// Malformed, oversized, truncated or timed-out requests are logged and dropped
/// without contacting the editor. Editor failures are returned to the caller.
async fn handle_connection<C: EditorConnector>(
    stream: TcpStream,
    peer: SocketAddr,
    config: &ServerConfig,
    connector: Arc<C>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> BridgeResult<()> {
    let limit = config.max_request_length;
    // One byte past the limit is enough to tell an oversized request apart.
    let mut reader = BufReader::new(stream).take(limit as u64 + 1);
    let mut buffer = Vec::new();

    let read_result = tokio::select! {
        result = timeout(TokioDuration::from_secs(config.read_timeout_secs), reader.read_until(b'\n', &mut buffer)) => result,
        _ = shutdown_rx.recv() => {
            tracing::debug!("Connection handler received shutdown signal");
            return Ok(());
        }
    };

    match read_result {
        Ok(Ok(0)) => {
            tracing::trace!("Get EOF from {} before any request", peer);
            return Ok(());
        }
        Ok(Ok(n)) if n > limit => {
            tracing::warn!("Request from {} exceeds {} bytes, dropped", peer, limit);
            return Ok(());
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(BridgeError::Io(e)),
        Err(_) => {
            tracing::warn!("Reader timeout for {}", peer);
            return Ok(());
        }
    }

    let line = match std::str::from_utf8(&buffer) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!("Request from {} is not valid UTF-8: {}", peer, e);
            return Ok(());
        }
    };

    if !line.ends_with('\n') {
        tracing::warn!("Connection from {} closed before end of request line: {:?}", peer, line);
        return Ok(());
    }

    let request = match parse_request(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Invalid request format from {}: {}", peer, e);
            return Ok(());
        }
    };
    tracing::debug!(
        "Jump request from {}: {} line {} column {}",
        peer, request.file_path, request.line, request.column
    );

    let outcome = tokio::select! {
        result = editor::jump(connector.as_ref(), &request) => result?,
        _ = shutdown_rx.recv() => {
            tracing::debug!("Shutdown while talking to the editor, request for {} abandoned", request.file_path);
            return Ok(());
        }
    };
    tracing::info!("Jumped to {}:{}:{} ({:?})", request.file_path, request.line, request.column, outcome);

    Ok(())
}

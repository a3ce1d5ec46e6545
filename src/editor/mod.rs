// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Editor control: drives a running editor to show a file at a cursor position.
//!
//! The editor is reached through two scripting primitives, expression evaluation
//! and Ex command execution, exposed by [`EditorSession`]. A session is opened
//! per request by an [`EditorConnector`] and closed when dropped.
//!
//! [`open_at`] issues the call sequence:
//! 1. `bufnr('<path>')`
//! 2. `bufloaded(<bufnr>)`
//! 3. `bufwinnr(<bufnr>)`, only when the buffer exists and is loaded
//! 4. `<winnr>wincmd w` if the buffer is visible, otherwise `edit <path>`
//! 5. `call cursor(<line>, <column>)`
//!
//! Any failed call stops the sequence and is returned to the caller.

use std::future::Future;

use crate::error::Result as BridgeResult;
use crate::request::JumpRequest;

mod nvim;

pub use nvim::{NvimConnector, NvimSession};

/// Which branch [`open_at`] took before moving the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    /// The file was already visible; focus moved to that window.
    SwitchedWindow { window: i64 },
    /// The file was (re)opened in the current window.
    Opened,
}

/// The scripting primitives of one RPC session with the editor.
#[trait_variant::make(EditorSession: Send)]
pub trait LocalEditorSession {
    /// Evaluates an expression whose result is a number.
    async fn eval(&mut self, expr: &str) -> BridgeResult<i64>;

    /// Executes an Ex command.
    async fn command(&mut self, command: &str) -> BridgeResult<()>;
}

/// Opens RPC sessions to the editor.
///
/// The connector is shared by every connection handler, so it must be cheap to
/// share and must not hold per-request state.
pub trait EditorConnector: Send + Sync + 'static {
    type Session: EditorSession;

    fn connect(&self) -> impl Future<Output = BridgeResult<Self::Session>> + Send;
}

/// Opens a fresh session, jumps to the requested location and closes the session.
pub async fn jump<C: EditorConnector>(connector: &C, request: &JumpRequest) -> BridgeResult<JumpOutcome> {
    let mut session = connector.connect().await?;
    open_at(&mut session, request).await
}

/// Shows `request.file_path` in the editor and places the cursor at `line`/`column`.
pub async fn open_at<S: EditorSession>(session: &mut S, request: &JumpRequest) -> BridgeResult<JumpOutcome> {
    let path = vim_string(&request.file_path);

    let buf_nr = session.eval(&format!("bufnr({})", path)).await?;
    let is_loaded = session.eval(&format!("bufloaded({})", buf_nr)).await?;

    let mut win_nr = 0;
    if buf_nr != -1 && is_loaded == 1 {
        win_nr = session.eval(&format!("bufwinnr({})", buf_nr)).await?;
    }
    tracing::trace!(buf_nr, is_loaded, win_nr, "Buffer state for {}", request.file_path);

    let outcome = if win_nr > 0 {
        session.command(&format!("{}wincmd w", win_nr)).await?;
        JumpOutcome::SwitchedWindow { window: win_nr }
    } else {
        session
            .command(&format!("execute 'edit ' . fnameescape({})", path))
            .await?;
        JumpOutcome::Opened
    };

    session
        .command(&format!("call cursor({}, {})", request.line, request.column))
        .await?;

    Ok(outcome)
}

/// Quotes `value` as a Vim single-quoted string literal.
fn vim_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! nvim-jump: asks a running Neovim to open a file at a line and column.
//!
//! Clients connect over TCP and send one `path:line:column` line; the server
//! forwards it to Neovim over msgpack-RPC.

pub mod config;
pub mod editor;
pub mod error;
pub mod log;
pub mod request;
pub mod server;

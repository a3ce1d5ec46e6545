// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing of the one-line jump request sent by clients.
//!
//! A request looks like `<drive><rest-of-path>:<line>:<column>\n`. The first two
//! characters are always taken as a drive prefix (`C:` on Windows) so that the colon
//! they may contain does not count as a field separator. The prefix is glued back
//! onto the path after splitting.

use thiserror::Error;

/// Number of leading characters treated as the drive prefix.
const DRIVE_PREFIX_LEN: usize = 2;

const FIELD_SEPARATOR: char = ':';

/// A single parsed request. Lives only as long as the connection that carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpRequest {
    pub drive_prefix: String,
    /// Full path, drive prefix included.
    pub file_path: String,
    /// Passed to the editor verbatim; the editor decides whether it is a number.
    pub line: String,
    pub column: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request {0:?} is shorter than the drive prefix")]
    TooShort(String),

    #[error("expected 3 ':'-separated fields after the drive prefix, found {found}: {fields:?}")]
    FieldCount { found: usize, fields: Vec<String> },
}

/// Parses one raw request line (trailing `\n` or `\r\n` allowed).
pub fn parse_request(raw: &str) -> Result<JumpRequest, RequestError> {
    let raw = raw.trim_end_matches(['\r', '\n']);

    // Byte offset just past the prefix, so multi-byte characters are never split.
    let prefix_end = raw
        .char_indices()
        .map(|(idx, ch)| idx + ch.len_utf8())
        .nth(DRIVE_PREFIX_LEN - 1)
        .ok_or_else(|| RequestError::TooShort(raw.to_string()))?;

    let (drive_prefix, rest) = raw.split_at(prefix_end);
    let fields: Vec<&str> = rest.trim().split(FIELD_SEPARATOR).collect();

    match fields.as_slice() {
        [path, line, column] => Ok(JumpRequest {
            drive_prefix: drive_prefix.to_string(),
            file_path: format!("{}{}", drive_prefix, path),
            line: (*line).to_string(),
            column: (*column).to_string(),
        }),
        _ => Err(RequestError::FieldCount {
            found: fields.len(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }),
    }
}

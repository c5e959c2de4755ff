// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use serde::{Deserialize, Serialize};

use crate::status::SystemStatus;

/// Reply from the init process to a control-channel command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Command accepted.
    Ok,

    /// Command rejected or failed.
    Error { message: String },

    /// Reply to [`Request::Status`].
    ///
    /// [`Request::Status`]: crate::Request::Status
    Status { status: SystemStatus },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { message: message.into() }
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use serde::Serialize;
use thiserror::Error;

use crate::{Request, Response};

/// Errors from encoding or decoding control-channel datagrams.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a request or response into one datagram payload.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

/// Decode a datagram received by the init process.
pub fn decode_request(payload: &[u8]) -> Result<Request, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Decode a datagram received by a client.
pub fn decode_response(payload: &[u8]) -> Result<Response, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

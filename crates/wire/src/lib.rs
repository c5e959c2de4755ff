// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Control-channel protocol for the init process.
//!
//! Wire format: one JSON document per datagram.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod status;
mod wire;

pub use request::Request;
pub use response::Response;
pub use status::{ServiceEntry, SystemStatus};
pub use wire::{decode_request, decode_response, encode, ProtocolError};

/// Path of the control datagram socket the init process serves.
pub const CONTROL_SOCKET: &str = "/run/ignite/ignitectl.sock";

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;

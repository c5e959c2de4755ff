// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! telinit-style client mode (pid ≠ 1).
//!
//! Translates the classic runlevel argument into a control-channel
//! request. Legacy sysvinit options are accepted and ignored for
//! compatibility.

use ignite_wire as wire;
use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::time::Duration;

const USAGE: &str = "\
usage: ignite [OPTIONS] {0..9|q|Q|s|S}

  0..9    change runlevel; 0 powers off, 6 reboots
  q, Q    reload configuration
  s, S    enter rescue mode (runlevel 1)

options (accepted for compatibility, ignored):
  -a -b -s -e ARG -t SEC -z XXX
  -h, -?  this help
  -v, -V  version
";

/// Outcome of option parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Parsed {
    Help,
    Version,
    Command(String),
    Nothing,
    BadOption(String),
}

pub(crate) fn parse_args(args: &[String]) -> Parsed {
    let mut positional = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "-?" | "--help" => return Parsed::Help,
            "-v" | "-V" | "--version" => return Parsed::Version,
            "-a" | "-b" | "-s" => {}
            "-e" | "-t" | "-z" => {
                let _ = iter.next();
            }
            other if !other.starts_with('-') => positional = Some(other.to_string()),
            other => return Parsed::BadOption(other.to_string()),
        }
    }
    match positional {
        Some(command) => Parsed::Command(command),
        None => Parsed::Nothing,
    }
}

/// Translate the positional argument into a request.
pub(crate) fn parse_command(command: &str) -> Option<wire::Request> {
    let mut chars = command.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };
    match c {
        '0'..='9' => Some(wire::Request::Runlevel { level: c as u8 - b'0' }),
        'q' | 'Q' => Some(wire::Request::Reload),
        's' | 'S' => Some(wire::Request::Runlevel { level: 1 }),
        _ => None,
    }
}

/// Entry point for pid ≠ 1. Returns the process exit code.
pub fn run(args: &[String]) -> i32 {
    match parse_args(args) {
        Parsed::Help => {
            print!("{USAGE}");
            0
        }
        Parsed::Version => {
            println!("ignite {}", env!("CARGO_PKG_VERSION"));
            0
        }
        Parsed::BadOption(option) => {
            eprintln!("unknown option '{option}'");
            eprint!("{USAGE}");
            1
        }
        Parsed::Nothing => {
            eprint!("{USAGE}");
            1
        }
        Parsed::Command(command) => match parse_command(&command) {
            Some(request) => match send(&request) {
                Ok(wire::Response::Ok) => 0,
                Ok(wire::Response::Error { message }) => {
                    eprintln!("ignite: {message}");
                    1
                }
                Ok(wire::Response::Status { .. }) => 0,
                Err(e) => {
                    eprintln!("ignite: cannot reach init: {e}");
                    1
                }
            },
            None => {
                eprintln!("unknown command '{command}'");
                eprint!("{USAGE}");
                1
            }
        },
    }
}

/// Client socket path; removed when the reply arrives or on error.
struct ClientSocket {
    socket: UnixDatagram,
    path: PathBuf,
}

impl ClientSocket {
    fn bind() -> io::Result<Self> {
        let path = PathBuf::from(format!("/run/ignite/telinit.{}.sock", std::process::id()));
        let socket = UnixDatagram::bind(&path)?;
        Ok(Self { socket, path })
    }
}

impl Drop for ClientSocket {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn send(request: &wire::Request) -> io::Result<wire::Response> {
    let client = ClientSocket::bind()?;
    client.socket.set_read_timeout(Some(Duration::from_secs(3)))?;

    let payload = wire::encode(request).map_err(invalid_data)?;
    client.socket.send_to(&payload, wire::CONTROL_SOCKET)?;

    let mut buf = [0u8; 64 * 1024];
    let (len, _) = client.socket.recv_from(&mut buf)?;
    wire::decode_response(&buf[..len]).map_err(invalid_data)
}

fn invalid_data(e: wire::ProtocolError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

#[cfg(test)]
#[path = "telinit_tests.rs"]
mod tests;

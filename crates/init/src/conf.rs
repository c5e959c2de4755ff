// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Declarative configuration parser (C3).
//!
//! Reads `/etc/ignite.conf` plus `*.conf` from `/etc/ignite.d`, line by
//! line. `#` starts a comment, blank lines are skipped, and each remaining
//! line is one directive. The directive table maps keywords to plain
//! parser functions, so adding a directive is a one-line change.

use ignite_core::clamp_cfglevel;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Main configuration file.
pub const CONF_FILE: &str = "/etc/ignite.conf";
/// Include directory for `*.conf` fragments.
pub const CONF_DIR: &str = "/etc/ignite.d";

/// Errors from parsing a single line. Parsing never aborts a boot: the
/// caller logs and continues with the next line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfError {
    #[error("unknown directive '{0}'")]
    Unknown(String),

    #[error("directive '{0}' needs an argument")]
    MissingArgument(&'static str),
}

/// A parsed configuration directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Legacy filesystem check of a device before mount; prefer fstab.
    Check(String),
    /// Default user identity for `startx` services.
    User(String),
    Host(String),
    /// Kernel module to load.
    Module(String),
    /// Device node spec: `PATH TYPE MAJOR MINOR [MODE]`.
    Mknod(String),
    /// Command that brings up networking.
    Network(String),
    /// Directory of boot scripts.
    Runparts(PathBuf),
    /// Service running as the configured user.
    Startx(String),
    /// Command run on shutdown.
    Shutdown(String),
    /// Configured default runlevel, already clamped.
    Runlevel(u8),
    Service(String),
    Task(String),
    Run(String),
    Console(PathBuf),
    /// TTY line spec: `DEV [BAUD] [TERM]`, optionally led by `[LVLS]`.
    Tty(String),
}

type Parser = fn(&'static str, &str) -> Result<Directive, ConfError>;

/// The directive table. One line per keyword.
const DIRECTIVES: &[(&str, Parser)] = &[
    ("check", |k, a| arg(k, a).map(Directive::Check)),
    ("user", |k, a| arg(k, a).map(Directive::User)),
    ("host", |k, a| arg(k, a).map(Directive::Host)),
    ("module", |k, a| arg(k, a).map(Directive::Module)),
    ("mknod", |k, a| arg(k, a).map(Directive::Mknod)),
    ("network", |k, a| arg(k, a).map(Directive::Network)),
    ("runparts", |k, a| arg(k, a).map(|a| Directive::Runparts(PathBuf::from(a)))),
    ("startx", |k, a| arg(k, a).map(Directive::Startx)),
    ("shutdown", |k, a| arg(k, a).map(Directive::Shutdown)),
    ("runlevel", |k, a| arg(k, a).map(|a| Directive::Runlevel(parse_runlevel(&a)))),
    ("service", |k, a| arg(k, a).map(Directive::Service)),
    ("task", |k, a| arg(k, a).map(Directive::Task)),
    ("run", |k, a| arg(k, a).map(Directive::Run)),
    ("console", |k, a| arg(k, a).map(|a| Directive::Console(PathBuf::from(a)))),
    ("tty", |k, a| arg(k, a).map(Directive::Tty)),
];

fn arg(keyword: &'static str, value: &str) -> Result<String, ConfError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfError::MissingArgument(keyword));
    }
    Ok(value.to_string())
}

/// A runlevel argument that fails to parse, or parses to 0 or 6, falls
/// back to 2.
fn parse_runlevel(value: &str) -> u8 {
    clamp_cfglevel(value.trim().parse::<u8>().unwrap_or(0))
}

/// Parse one line. `Ok(None)` for blanks and comments.
pub fn parse_line(line: &str) -> Result<Option<Directive>, ConfError> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    for (name, parser) in DIRECTIVES {
        if *name == keyword {
            return parser(name, rest).map(Some);
        }
    }
    Err(ConfError::Unknown(keyword.to_string()))
}

/// Parse a whole configuration text. Bad lines warn and are skipped.
pub fn parse_str(text: &str, origin: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(directive)) => directives.push(directive),
            Ok(None) => {}
            Err(e) => warn!("{origin}:{}: {e}", lineno + 1),
        }
    }
    directives
}

/// Parse one file. A missing file is not fatal: defaults apply.
pub fn parse_file(path: &Path) -> Vec<Directive> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            info!("no configuration at {}: {e}", path.display());
            return Vec::new();
        }
    };
    let mut directives = Vec::new();
    let origin = path.display().to_string();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("{origin}:{}: unreadable line: {e}", lineno + 1);
                continue;
            }
        };
        match parse_line(&line) {
            Ok(Some(directive)) => directives.push(directive),
            Ok(None) => {}
            Err(e) => warn!("{origin}:{}: {e}", lineno + 1),
        }
    }
    directives
}

/// Parse the main file plus `*.conf` fragments from the include
/// directory, fragments in lexical order.
pub fn load(conf_file: &Path, conf_dir: &Path) -> Vec<Directive> {
    let mut directives = parse_file(conf_file);
    let mut fragments: Vec<PathBuf> = match fs::read_dir(conf_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "conf"))
            .collect(),
        Err(_) => Vec::new(),
    };
    fragments.sort();
    for fragment in fragments {
        directives.extend(parse_file(&fragment));
    }
    directives
}

#[cfg(test)]
#[path = "conf_tests.rs"]
mod tests;

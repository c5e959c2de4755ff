// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;
use std::fs;

#[test]
fn comments_and_blanks_are_skipped() {
    assert_eq!(parse_line(""), Ok(None));
    assert_eq!(parse_line("   "), Ok(None));
    assert_eq!(parse_line("# a comment"), Ok(None));
    assert_eq!(parse_line("   # indented comment"), Ok(None));
}

#[test]
fn trailing_comment_is_stripped() {
    let directive = parse_line("host testbox  # our name").unwrap().unwrap();
    assert_eq!(directive, Directive::Host("testbox".to_string()));
}

#[test]
fn service_directive_keeps_full_spec() {
    let directive = parse_line("service [2345] <pid/foo> name:bar /sbin/bard -n")
        .unwrap()
        .unwrap();
    assert_eq!(
        directive,
        Directive::Service("[2345] <pid/foo> name:bar /sbin/bard -n".to_string())
    );
}

#[test]
fn runlevel_is_clamped() {
    assert_eq!(parse_line("runlevel 3").unwrap(), Some(Directive::Runlevel(3)));
    assert_eq!(parse_line("runlevel 6").unwrap(), Some(Directive::Runlevel(2)));
    assert_eq!(parse_line("runlevel 0").unwrap(), Some(Directive::Runlevel(2)));
    assert_eq!(parse_line("runlevel banana").unwrap(), Some(Directive::Runlevel(2)));
}

#[test]
fn unknown_directive_errors() {
    assert_eq!(
        parse_line("frobnicate yes"),
        Err(ConfError::Unknown("frobnicate".to_string()))
    );
}

#[test]
fn missing_argument_errors() {
    assert_eq!(parse_line("host"), Err(ConfError::MissingArgument("host")));
    assert_eq!(parse_line("host   "), Err(ConfError::MissingArgument("host")));
}

#[test]
fn parse_str_skips_bad_lines() {
    let text = "host box\nbogus directive\nrunlevel 3\n";
    let directives = parse_str(text, "test");
    assert_eq!(
        directives,
        vec![Directive::Host("box".to_string()), Directive::Runlevel(3)]
    );
}

#[test]
fn missing_file_is_empty_not_fatal() {
    assert!(parse_file(Path::new("/no/such/ignite.conf")).is_empty());
}

#[test]
fn load_reads_fragments_in_lexical_order() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("ignite.conf");
    let incl = dir.path().join("ignite.d");
    fs::create_dir(&incl).unwrap();
    fs::write(&main, "runlevel 3\n").unwrap();
    fs::write(incl.join("20-b.conf"), "task [S] /bin/b\n").unwrap();
    fs::write(incl.join("10-a.conf"), "task [S] /bin/a\n").unwrap();
    fs::write(incl.join("ignored.txt"), "host nope\n").unwrap();

    let directives = load(&main, &incl);
    assert_eq!(
        directives,
        vec![
            Directive::Runlevel(3),
            Directive::Task("[S] /bin/a".to_string()),
            Directive::Task("[S] /bin/b".to_string()),
        ]
    );
}

#[test]
fn every_directive_keyword_parses() {
    let lines = [
        ("check /dev/sda1", Directive::Check("/dev/sda1".to_string())),
        ("user joe", Directive::User("joe".to_string())),
        ("module dm-crypt", Directive::Module("dm-crypt".to_string())),
        ("mknod /dev/null c 1 3 0666", Directive::Mknod("/dev/null c 1 3 0666".to_string())),
        ("network /etc/net-up.sh", Directive::Network("/etc/net-up.sh".to_string())),
        ("runparts /etc/start.d", Directive::Runparts(PathBuf::from("/etc/start.d"))),
        ("startx /usr/bin/startx", Directive::Startx("/usr/bin/startx".to_string())),
        ("shutdown /sbin/save-state", Directive::Shutdown("/sbin/save-state".to_string())),
        ("run [S] /bin/setup", Directive::Run("[S] /bin/setup".to_string())),
        ("console /dev/ttyS0", Directive::Console(PathBuf::from("/dev/ttyS0"))),
        ("tty /dev/tty1 38400", Directive::Tty("/dev/tty1 38400".to_string())),
    ];
    for (line, expected) in lines {
        assert_eq!(parse_line(line).unwrap(), Some(expected), "line: {line}");
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;
use similar_asserts::assert_eq;

#[test]
fn parse_bare_command() {
    let rec = ServiceRecord::parse(SvcType::Service, "/sbin/sshd -D").unwrap();
    assert_eq!(rec.name, "sshd");
    assert_eq!(rec.instance, 0);
    assert_eq!(rec.argv, vec!["/sbin/sshd".to_string(), "-D".to_string()]);
    assert_eq!(rec.runlevels, RunlevelMask::default_service());
    assert!(rec.conditions.is_empty());
    assert!(!rec.bootstrap);
    assert_eq!(rec.state, SvcState::Halted);
}

#[test]
fn parse_full_spec() {
    let rec = ServiceRecord::parse(
        SvcType::Service,
        "[2345] <pid/foo,net/up> name:bar:1 pid:/run/bar.pid cgroup.system /sbin/bard -n",
    )
    .unwrap();
    assert_eq!(rec.name, "bar");
    assert_eq!(rec.instance, 1);
    assert_eq!(rec.conditions, vec!["pid/foo".to_string(), "net/up".to_string()]);
    assert_eq!(rec.pid_file, Some(PathBuf::from("/run/bar.pid")));
    assert_eq!(rec.cgroup, Some("system".to_string()));
    assert_eq!(rec.argv[0], "/sbin/bard");
    assert!(rec.in_runlevel(3));
    assert!(!rec.in_runlevel(1));
}

#[test]
fn parse_bootstrap_only_sets_flag() {
    let rec = ServiceRecord::parse(SvcType::Task, "[S] /bin/mkdirs").unwrap();
    assert!(rec.bootstrap);
    assert!(rec.runlevels.bootstrap_only());
}

#[test]
fn options_after_command_join_argv() {
    // Anything after the first argv token belongs to the command, even if
    // it looks like an option.
    let rec = ServiceRecord::parse(SvcType::Run, "/bin/echo name:notanoption").unwrap();
    assert_eq!(rec.argv, vec!["/bin/echo".to_string(), "name:notanoption".to_string()]);
}

#[test]
fn empty_spec_is_rejected() {
    assert_eq!(ServiceRecord::parse(SvcType::Service, "   "), Err(SpecError::Empty));
}

#[test]
fn options_without_command_are_rejected() {
    let err = ServiceRecord::parse(SvcType::Service, "[2345] name:foo").unwrap_err();
    assert_eq!(err, SpecError::MissingCommand);
}

#[test]
fn bad_instance_is_rejected() {
    let err = ServiceRecord::parse(SvcType::Service, "name:foo:bar /bin/x").unwrap_err();
    assert_eq!(err, SpecError::BadInstance("name:foo:bar".to_string()));
}

#[test]
fn bad_mask_is_rejected() {
    let err = ServiceRecord::parse(SvcType::Service, "[23x] /bin/x").unwrap_err();
    assert_eq!(err, SpecError::Runlevels(RunlevelError::BadMask('x')));
}

#[test]
fn unterminated_mask_is_rejected() {
    let err = ServiceRecord::parse(SvcType::Service, "[234 /bin/x").unwrap_err();
    assert_eq!(err, SpecError::UnterminatedMask);
}

#[test]
fn empty_condition_list_parses_to_no_conditions() {
    let rec = ServiceRecord::parse(SvcType::Service, "<> /bin/x").unwrap();
    assert!(rec.conditions.is_empty());
}

#[test]
fn spec_string_round_trips() {
    let specs = [
        "/sbin/sshd -D",
        "[2345] <pid/foo,net/up> name:bar:1 pid:/run/bar.pid cgroup.system /sbin/bard -n",
        "[S] /bin/mkdirs -p /run/lock",
        "[019S] name:odd /bin/odd --flag value",
    ];
    for spec in specs {
        let rec = ServiceRecord::parse(SvcType::Service, spec).unwrap();
        let reparsed = ServiceRecord::parse(SvcType::Service, &rec.spec_string()).unwrap();
        assert_eq!(rec, reparsed, "round trip of {spec}");
    }
}

#[test]
fn restart_budget_window_slides() {
    let mut rec = ServiceRecord::parse(SvcType::Service, "/bin/flap").unwrap();
    let t0 = Instant::now();
    for i in 0..10 {
        assert!(rec.note_restart(t0 + Duration::from_secs(i)), "restart {i} within budget");
    }
    // Eleventh restart inside the window exhausts the budget.
    assert!(!rec.note_restart(t0 + Duration::from_secs(10)));

    // Far enough in the future the window has slid past all of them.
    assert!(rec.note_restart(t0 + Duration::from_secs(300)));
}

#[test]
fn backoff_doubles_and_caps() {
    let policy = RestartPolicy::default();
    assert_eq!(policy.backoff(0), Duration::from_millis(100));
    assert_eq!(policy.backoff(1), Duration::from_millis(200));
    assert_eq!(policy.backoff(3), Duration::from_millis(800));
    assert_eq!(policy.backoff(10), policy.max_backoff);
    assert_eq!(policy.backoff(40), policy.max_backoff);
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;

#[test]
fn request_round_trips() {
    let requests = [
        Request::Runlevel { level: 3 },
        Request::Reload,
        Request::Status,
        Request::Start { name: "sshd".to_string() },
        Request::Stop { name: "sshd".to_string() },
        Request::Restart { name: "getty".to_string() },
        Request::Poweroff,
        Request::Reboot,
        Request::Halt,
    ];
    for request in requests {
        let bytes = encode(&request).unwrap();
        let decoded = decode_request(&bytes).unwrap();
        assert_eq!(request, decoded);
    }
}

#[test]
fn response_round_trips() {
    let status = SystemStatus {
        runlevel: 3,
        prevlevel: Some(2),
        bootstrap: false,
        services: vec![ServiceEntry {
            name: "sshd".to_string(),
            instance: 0,
            kind: "service".to_string(),
            state: "running".to_string(),
            pid: Some(123),
            runlevels: "2345".to_string(),
        }],
    };
    for response in
        [Response::Ok, Response::error("no such service"), Response::Status { status }]
    {
        let bytes = encode(&response).unwrap();
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(response, decoded);
    }
}

#[test]
fn garbage_is_rejected() {
    assert!(decode_request(b"not json").is_err());
    assert!(decode_request(br#"{"type":"unknown_verb"}"#).is_err());
}

#[test]
fn request_wire_shape_is_stable() {
    let bytes = encode(&Request::Runlevel { level: 6 }).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["type"], "runlevel");
    assert_eq!(value["level"], 6);
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    received = { "received", MessageKind::Received },
    outbound = { "outbound", MessageKind::Outbound },
    uppercase = { "RECEIVED", MessageKind::Received },
)]
fn kind_parses(input: &str, expected: MessageKind) {
    assert_eq!(input.parse::<MessageKind>().unwrap(), expected);
}

#[test]
fn kind_rejects_unknown() {
    let err = "draft".parse::<MessageKind>().unwrap_err();
    assert!(matches!(err, Error::InvalidKind(_)));
}

#[test]
fn kind_display_matches_storage() {
    assert_eq!(MessageKind::Received.to_string(), "received");
    assert_eq!(MessageKind::Outbound.to_string(), "outbound");
}

#[parameterized(
    zero = { "0", 0 },
    plain = { "17", 17 },
    padded = { " 42\n", 42 },
)]
fn id_parses(input: &str, expected: i64) {
    assert_eq!(input.parse::<MessageId>().unwrap(), MessageId::new(expected));
}

#[parameterized(
    negative = { "-1" },
    text = { "abc" },
    empty = { "" },
)]
fn id_rejects(input: &str) {
    assert!(matches!(
        input.parse::<MessageId>(),
        Err(Error::InvalidMarker(_))
    ));
}

#[test]
fn id_ordering_follows_value() {
    assert!(MessageId::new(7) > MessageId::new(6));
    assert!(MessageId::ZERO < MessageId::new(1));
    assert!(!MessageId::ZERO.is_assigned());
}

#[test]
fn validate_rejects_unassigned_id() {
    let msg = Message::received(MessageId::ZERO, "+100", "hi", chrono::Utc::now());
    assert!(matches!(msg.validate(), Err(Error::InvalidMessage(_))));
}

#[test]
fn validate_accepts_stored_message() {
    let msg = Message::received(MessageId::new(3), "+100", "hi", chrono::Utc::now());
    assert!(msg.validate().is_ok());
    assert!(msg.is_received());
}

#[test]
fn message_serializes_id_as_number() {
    let msg = Message::received(MessageId::new(9), "+100", "hi", chrono::Utc::now());
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["id"], 9);
    assert_eq!(json["kind"], "received");
}

use bytes::Bytes;

use super::replies::{create_connack, create_regack, create_suback};
use super::*;

fn publish(payload: &'static [u8]) -> Publish {
    Publish {
        flags: Flags {
            qos: QoS::AtLeastOnce,
            ..Flags::default()
        },
        topic_id: 1,
        msg_id: 7,
        payload: Bytes::from_static(payload),
    }
}

#[test]
fn test_decode_connect() {
    let frame = b"\x0a\x04\x04\x01\x00\x3cdev1";
    let message = decode(frame).unwrap();
    let Message::Connect(connect) = message else {
        panic!("expected CONNECT, got {message:?}");
    };
    assert!(connect.flags.clean_session);
    assert!(!connect.flags.will);
    assert_eq!(connect.duration, 60);
    assert_eq!(connect.client_id, "dev1");
}

#[test]
fn test_connect_with_wrong_protocol_id_is_rejected() {
    let frame = b"\x0a\x04\x04\x02\x00\x3cdev1";
    assert_eq!(decode(frame), Err(CodecError::UnsupportedProtocolId(2)));
}

#[test]
fn test_encode_register_layout() {
    let frame = encode(&Message::Register(Register {
        topic_id: 0,
        msg_id: 0x0102,
        topic_name: "room/temp".to_string(),
    }))
    .unwrap();
    assert_eq!(&frame[..], b"\x0f\x0a\x00\x00\x01\x02room/temp");
}

#[test]
fn test_encode_suback_layout() {
    let frame = encode(&Message::SubAck(SubAck {
        flags: Flags {
            qos: QoS::AtLeastOnce,
            ..Flags::default()
        },
        topic_id: 1,
        msg_id: 9,
        return_code: ReturnCode::Accepted,
    }))
    .unwrap();
    assert_eq!(&frame[..], &[0x08, 0x13, 0x20, 0x00, 0x01, 0x00, 0x09, 0x00]);
}

#[test]
fn test_round_trip_per_message_type() {
    let messages = vec![
        Message::SearchGw { radius: 3 },
        Message::GwInfo { gateway_id: 1 },
        Message::Connect(Connect {
            flags: Flags {
                will: true,
                ..Flags::default()
            },
            duration: 30,
            client_id: "sensor-7".to_string(),
        }),
        Message::ConnAck {
            return_code: ReturnCode::Accepted,
        },
        Message::RegAck(RegAck {
            topic_id: 42,
            msg_id: 3,
            return_code: ReturnCode::Accepted,
        }),
        Message::Publish(publish(b"21.5")),
        Message::PubAck(PubAck {
            topic_id: 1,
            msg_id: 7,
            return_code: ReturnCode::InvalidTopicId,
        }),
        Message::Subscribe(Subscribe {
            flags: Flags::default(),
            msg_id: 5,
            topic: TopicRef::Name("room/+".to_string()),
        }),
        Message::Subscribe(Subscribe {
            flags: Flags::default().with_topic_id_type(TopicIdType::Predefined),
            msg_id: 6,
            topic: TopicRef::Id(12),
        }),
        Message::Unsubscribe(Unsubscribe {
            flags: Flags::default().with_topic_id_type(TopicIdType::Short),
            msg_id: 8,
            topic: TopicRef::Short("ab".to_string()),
        }),
        Message::UnsubAck { msg_id: 8 },
        Message::PingReq { client_id: None },
        Message::PingReq {
            client_id: Some("sleepy".to_string()),
        },
        Message::PingResp,
        Message::Disconnect { duration: None },
        Message::Disconnect { duration: Some(120) },
    ];

    for message in messages {
        let frame = encode(&message).unwrap();
        assert_eq!(usize::from(frame[0]), frame.len(), "{message:?}");
        assert_eq!(decode(&frame).unwrap(), message);
    }
}

#[test]
fn test_extended_length_frames() {
    let payload = vec![0xAB; 300];
    let message = Message::Publish(Publish {
        payload: Bytes::from(payload),
        ..publish(b"")
    });
    let frame = encode(&message).unwrap();

    assert_eq!(frame[0], 0x01);
    assert_eq!(u16::from_be_bytes([frame[1], frame[2]]) as usize, frame.len());
    assert_eq!(frame[3], MessageType::Publish.as_u8());
    assert_eq!(decode(&frame).unwrap(), message);
}

#[test]
fn test_frame_at_short_length_boundary() {
    // 255 total bytes still uses the one-byte header
    let message = Message::Publish(Publish {
        payload: Bytes::from(vec![0u8; 255 - 7]),
        ..publish(b"")
    });
    let frame = encode(&message).unwrap();
    assert_eq!(frame.len(), 255);
    assert_eq!(frame[0], 255);

    let message = Message::Publish(Publish {
        payload: Bytes::from(vec![0u8; 256 - 7]),
        ..publish(b"")
    });
    let frame = encode(&message).unwrap();
    assert_eq!(frame[0], 0x01);
    assert_eq!(frame.len(), 258);
}

#[test]
fn test_oversized_frame_fails_to_encode() {
    let message = Message::Publish(Publish {
        payload: Bytes::from(vec![0u8; 70_000]),
        ..publish(b"")
    });
    assert!(matches!(encode(&message), Err(CodecError::FrameTooLarge(_))));
}

#[test]
fn test_truncated_frames() {
    assert!(matches!(decode(b""), Err(CodecError::Truncated { .. })));
    assert!(matches!(decode(b"\x05"), Err(CodecError::Truncated { .. })));
    // declared 10 bytes, only 4 present
    assert_eq!(
        decode(b"\x0a\x0c\x00\x00"),
        Err(CodecError::Truncated {
            needed: 10,
            available: 4
        })
    );
    // extended header cut short
    assert!(matches!(decode(b"\x01\x00"), Err(CodecError::Truncated { .. })));
    // REGACK missing its status byte
    assert!(matches!(
        decode(b"\x06\x0b\x00\x01\x00\x02"),
        Err(CodecError::Truncated { .. })
    ));
}

#[test]
fn test_declared_length_shorter_than_header() {
    assert_eq!(decode(b"\x00\x16"), Err(CodecError::InvalidLength(0)));
    assert_eq!(decode(b"\x01\x00\x02\x16"), Err(CodecError::InvalidLength(2)));
}

#[test]
fn test_trailing_bytes_are_ignored() {
    assert_eq!(decode(b"\x02\x16garbage").unwrap(), Message::PingReq { client_id: None });
}

#[test]
fn test_unknown_type_decodes_without_payload() {
    let message = decode(b"\x04\x42\xff\xff").unwrap();
    assert_eq!(message, Message::Other(MessageType::Unknown(0x42)));

    let message = decode(b"\x03\x07x").unwrap();
    assert_eq!(message, Message::Other(MessageType::WillTopic));
}

#[test]
fn test_invalid_utf8_client_id() {
    assert_eq!(
        decode(b"\x07\x04\x00\x01\x00\x0a\xff"),
        Err(CodecError::InvalidUtf8)
    );
}

#[test]
fn test_flags_bit_layout() {
    let flags = Flags::from_byte(0b1011_1110);
    assert!(flags.dup);
    assert_eq!(flags.qos, QoS::AtLeastOnce);
    assert!(flags.retain);
    assert!(flags.will);
    assert!(flags.clean_session);
    assert_eq!(flags.topic_id_type, TopicIdType::Short);
    assert_eq!(flags.to_byte(), 0b1011_1110);

    assert_eq!(Flags::from_byte(0b0110_0000).qos, QoS::NoSession);
    assert_eq!(Flags::from_byte(0b0000_0001).topic_id_type, TopicIdType::Predefined);
}

#[test]
fn test_short_topic_name_in_publish() {
    let message = Publish {
        flags: Flags::default().with_topic_id_type(TopicIdType::Short),
        topic_id: u16::from_be_bytes(*b"ab"),
        ..publish(b"x")
    };
    assert_eq!(message.short_topic_name().as_deref(), Some("ab"));
    assert_eq!(publish(b"x").short_topic_name(), None);
}

#[test]
fn test_short_topic_must_be_two_bytes() {
    let message = Message::Subscribe(Subscribe {
        flags: Flags::default(),
        msg_id: 1,
        topic: TopicRef::Short("abc".to_string()),
    });
    assert!(matches!(encode(&message), Err(CodecError::InvalidShortTopic(_))));
}

#[test]
fn test_reply_constructors_echo_request_fields() {
    let register = Register {
        topic_id: 0,
        msg_id: 77,
        topic_name: "room/temp".to_string(),
    };
    let frame = create_regack(&register, 1, ReturnCode::Accepted);
    assert_eq!(
        decode(&frame).unwrap(),
        Message::RegAck(RegAck {
            topic_id: 1,
            msg_id: 77,
            return_code: ReturnCode::Accepted,
        })
    );

    assert_eq!(&create_connack(ReturnCode::Accepted)[..], &[0x03, 0x05, 0x00]);
}

#[test]
fn test_reply_constructor_yields_empty_frame_on_topic_id_overflow() {
    let register = Register {
        topic_id: 0,
        msg_id: 1,
        topic_name: "t".to_string(),
    };
    assert!(create_regack(&register, 70_000, ReturnCode::Accepted).is_empty());

    let subscribe = Subscribe {
        flags: Flags::default(),
        msg_id: 1,
        topic: TopicRef::Name("t".to_string()),
    };
    assert!(create_suback(&subscribe, u64::from(u16::MAX) + 1, ReturnCode::Accepted).is_empty());
    assert!(!create_suback(&subscribe, u64::from(u16::MAX), ReturnCode::Accepted).is_empty());
}

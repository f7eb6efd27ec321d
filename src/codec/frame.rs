use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::CodecError;
use super::flags::{Flags, TopicIdType};
use super::message::{
    Connect, Message, PubAck, Publish, RegAck, Register, ReturnCode, SubAck, Subscribe, TopicRef,
    Unsubscribe,
};
use super::message_type::MessageType;

/// First length byte announcing the 3-byte extended header.
const EXTENDED_LENGTH_MARKER: u8 = 0x01;
const SHORT_HEADER_LEN: usize = 2;
const EXTENDED_HEADER_LEN: usize = 4;
const PROTOCOL_ID: u8 = 0x01;

/// Parse one datagram into a `Message`.
///
/// Bytes beyond the declared length are ignored. Unknown type codes decode to
/// `Message::Other` with no payload.
pub fn decode(frame: &[u8]) -> Result<Message, CodecError> {
    need(frame.len(), SHORT_HEADER_LEN)?;

    let (declared, header_len) = if frame[0] == EXTENDED_LENGTH_MARKER {
        need(frame.len(), EXTENDED_HEADER_LEN)?;
        (
            usize::from(u16::from_be_bytes([frame[1], frame[2]])),
            EXTENDED_HEADER_LEN,
        )
    } else {
        (usize::from(frame[0]), SHORT_HEADER_LEN)
    };

    if declared < header_len {
        return Err(CodecError::InvalidLength(declared));
    }
    need(frame.len(), declared)?;

    let message_type = MessageType::from_u8(frame[header_len - 1]);
    let mut body = Bytes::copy_from_slice(&frame[header_len..declared]);
    decode_body(message_type, &mut body)
}

/// Serialize a `Message` into its exact wire layout.
pub fn encode(message: &Message) -> Result<Bytes, CodecError> {
    let mut body = BytesMut::new();
    encode_body(message, &mut body)?;

    let message_type = message.message_type().as_u8();
    let short_total = body.len() + SHORT_HEADER_LEN;
    let mut out = BytesMut::with_capacity(body.len() + EXTENDED_HEADER_LEN);

    if short_total <= usize::from(u8::MAX) {
        out.put_u8(short_total as u8);
        out.put_u8(message_type);
    } else {
        let total = body.len() + EXTENDED_HEADER_LEN;
        let total = u16::try_from(total).map_err(|_| CodecError::FrameTooLarge(total))?;
        out.put_u8(EXTENDED_LENGTH_MARKER);
        out.put_u16(total);
        out.put_u8(message_type);
    }
    out.extend_from_slice(&body);

    Ok(out.freeze())
}

fn need(available: usize, needed: usize) -> Result<(), CodecError> {
    if available < needed {
        return Err(CodecError::Truncated { needed, available });
    }
    Ok(())
}

fn get_u8(body: &mut Bytes) -> Result<u8, CodecError> {
    need(body.remaining(), 1)?;
    Ok(body.get_u8())
}

fn get_u16(body: &mut Bytes) -> Result<u16, CodecError> {
    need(body.remaining(), 2)?;
    Ok(body.get_u16())
}

fn get_flags(body: &mut Bytes) -> Result<Flags, CodecError> {
    get_u8(body).map(Flags::from_byte)
}

/// Consume the rest of the body as text.
fn rest_text(body: &mut Bytes) -> Result<String, CodecError> {
    let rest = body.split_to(body.remaining());
    String::from_utf8(rest.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

fn get_topic(flags: Flags, body: &mut Bytes) -> Result<TopicRef, CodecError> {
    match flags.topic_id_type {
        TopicIdType::Normal => rest_text(body).map(TopicRef::Name),
        TopicIdType::Short => {
            need(body.remaining(), 2)?;
            let name = body.split_to(2);
            String::from_utf8(name.to_vec())
                .map(TopicRef::Short)
                .map_err(|_| CodecError::InvalidUtf8)
        }
        TopicIdType::Predefined | TopicIdType::Reserved => get_u16(body).map(TopicRef::Id),
    }
}

fn decode_body(message_type: MessageType, body: &mut Bytes) -> Result<Message, CodecError> {
    let message = match message_type {
        MessageType::SearchGw => Message::SearchGw {
            radius: get_u8(body)?,
        },
        MessageType::GwInfo => Message::GwInfo {
            gateway_id: get_u8(body)?,
        },
        MessageType::Connect => {
            let flags = get_flags(body)?;
            let protocol_id = get_u8(body)?;
            if protocol_id != PROTOCOL_ID {
                return Err(CodecError::UnsupportedProtocolId(protocol_id));
            }
            let duration = get_u16(body)?;
            Message::Connect(Connect {
                flags,
                duration,
                client_id: rest_text(body)?,
            })
        }
        MessageType::ConnAck => Message::ConnAck {
            return_code: ReturnCode::from_u8(get_u8(body)?),
        },
        MessageType::Register => {
            let topic_id = get_u16(body)?;
            let msg_id = get_u16(body)?;
            Message::Register(Register {
                topic_id,
                msg_id,
                topic_name: rest_text(body)?,
            })
        }
        MessageType::RegAck => Message::RegAck(RegAck {
            topic_id: get_u16(body)?,
            msg_id: get_u16(body)?,
            return_code: ReturnCode::from_u8(get_u8(body)?),
        }),
        MessageType::Publish => {
            let flags = get_flags(body)?;
            let topic_id = get_u16(body)?;
            let msg_id = get_u16(body)?;
            Message::Publish(Publish {
                flags,
                topic_id,
                msg_id,
                payload: body.split_to(body.remaining()),
            })
        }
        MessageType::PubAck => Message::PubAck(PubAck {
            topic_id: get_u16(body)?,
            msg_id: get_u16(body)?,
            return_code: ReturnCode::from_u8(get_u8(body)?),
        }),
        MessageType::Subscribe => {
            let flags = get_flags(body)?;
            let msg_id = get_u16(body)?;
            Message::Subscribe(Subscribe {
                flags,
                msg_id,
                topic: get_topic(flags, body)?,
            })
        }
        MessageType::SubAck => Message::SubAck(SubAck {
            flags: get_flags(body)?,
            topic_id: get_u16(body)?,
            msg_id: get_u16(body)?,
            return_code: ReturnCode::from_u8(get_u8(body)?),
        }),
        MessageType::Unsubscribe => {
            let flags = get_flags(body)?;
            let msg_id = get_u16(body)?;
            Message::Unsubscribe(Unsubscribe {
                flags,
                msg_id,
                topic: get_topic(flags, body)?,
            })
        }
        MessageType::UnsubAck => Message::UnsubAck {
            msg_id: get_u16(body)?,
        },
        MessageType::PingReq => {
            let client_id = rest_text(body)?;
            Message::PingReq {
                client_id: (!client_id.is_empty()).then_some(client_id),
            }
        }
        MessageType::PingResp => Message::PingResp,
        MessageType::Disconnect => Message::Disconnect {
            duration: if body.remaining() >= 2 {
                Some(body.get_u16())
            } else {
                None
            },
        },
        other => Message::Other(other),
    };
    Ok(message)
}

fn put_topic(topic: &TopicRef, body: &mut BytesMut) -> Result<(), CodecError> {
    match topic {
        TopicRef::Name(name) => body.put_slice(name.as_bytes()),
        TopicRef::Id(id) => body.put_u16(*id),
        TopicRef::Short(name) => {
            if name.len() != 2 {
                return Err(CodecError::InvalidShortTopic(name.clone()));
            }
            body.put_slice(name.as_bytes());
        }
    }
    Ok(())
}

fn encode_body(message: &Message, body: &mut BytesMut) -> Result<(), CodecError> {
    match message {
        Message::SearchGw { radius } => body.put_u8(*radius),
        Message::GwInfo { gateway_id } => body.put_u8(*gateway_id),
        Message::Connect(connect) => {
            body.put_u8(connect.flags.to_byte());
            body.put_u8(PROTOCOL_ID);
            body.put_u16(connect.duration);
            body.put_slice(connect.client_id.as_bytes());
        }
        Message::ConnAck { return_code } => body.put_u8(return_code.as_u8()),
        Message::Register(register) => {
            body.put_u16(register.topic_id);
            body.put_u16(register.msg_id);
            body.put_slice(register.topic_name.as_bytes());
        }
        Message::RegAck(regack) => {
            body.put_u16(regack.topic_id);
            body.put_u16(regack.msg_id);
            body.put_u8(regack.return_code.as_u8());
        }
        Message::Publish(publish) => {
            body.put_u8(publish.flags.to_byte());
            body.put_u16(publish.topic_id);
            body.put_u16(publish.msg_id);
            body.put_slice(&publish.payload);
        }
        Message::PubAck(puback) => {
            body.put_u16(puback.topic_id);
            body.put_u16(puback.msg_id);
            body.put_u8(puback.return_code.as_u8());
        }
        Message::Subscribe(subscribe) => {
            let flags = subscribe.flags.with_topic_id_type(subscribe.topic.id_type());
            body.put_u8(flags.to_byte());
            body.put_u16(subscribe.msg_id);
            put_topic(&subscribe.topic, body)?;
        }
        Message::SubAck(suback) => {
            body.put_u8(suback.flags.to_byte());
            body.put_u16(suback.topic_id);
            body.put_u16(suback.msg_id);
            body.put_u8(suback.return_code.as_u8());
        }
        Message::Unsubscribe(unsubscribe) => {
            let flags = unsubscribe
                .flags
                .with_topic_id_type(unsubscribe.topic.id_type());
            body.put_u8(flags.to_byte());
            body.put_u16(unsubscribe.msg_id);
            put_topic(&unsubscribe.topic, body)?;
        }
        Message::UnsubAck { msg_id } => body.put_u16(*msg_id),
        Message::PingReq { client_id } => {
            if let Some(client_id) = client_id {
                body.put_slice(client_id.as_bytes());
            }
        }
        Message::Disconnect { duration } => {
            if let Some(duration) = duration {
                body.put_u16(*duration);
            }
        }
        Message::PingResp | Message::Other(_) => {}
    }
    Ok(())
}

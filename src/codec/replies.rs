//! Reply constructors.
//!
//! Each `create_*` function builds a ready-to-queue frame, copying the fields
//! that must echo the request (message id, granted QoS). A constructor that
//! cannot produce a valid frame logs why and returns an empty `Bytes`; the
//! dispatcher treats an empty frame as nothing to send.

use bytes::Bytes;
use tracing::warn;

use super::error::CodecError;
use super::flags::Flags;
use super::frame::encode;
use super::message::{
    Message, PubAck, Publish, RegAck, Register, ReturnCode, SubAck, Subscribe, Unsubscribe,
};

fn frame(message: Message) -> Bytes {
    match encode(&message) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(message_type = %message.message_type(), error = %e, "cannot build reply frame");
            Bytes::new()
        }
    }
}

fn topic_id16(topic_id: u64) -> Result<u16, CodecError> {
    u16::try_from(topic_id).map_err(|_| CodecError::TopicIdOverflow(topic_id))
}

pub fn create_connack(return_code: ReturnCode) -> Bytes {
    frame(Message::ConnAck { return_code })
}

pub fn create_regack(request: &Register, topic_id: u64, return_code: ReturnCode) -> Bytes {
    match topic_id16(topic_id) {
        Ok(topic_id) => frame(Message::RegAck(RegAck {
            topic_id,
            msg_id: request.msg_id,
            return_code,
        })),
        Err(e) => {
            warn!(error = %e, "cannot build REGACK");
            Bytes::new()
        }
    }
}

/// SUBACK grants the QoS the client asked for.
pub fn create_suback(request: &Subscribe, topic_id: u64, return_code: ReturnCode) -> Bytes {
    match topic_id16(topic_id) {
        Ok(topic_id) => frame(Message::SubAck(SubAck {
            flags: Flags {
                qos: request.flags.qos,
                ..Flags::default()
            },
            topic_id,
            msg_id: request.msg_id,
            return_code,
        })),
        Err(e) => {
            warn!(error = %e, "cannot build SUBACK");
            Bytes::new()
        }
    }
}

pub fn create_unsuback(request: &Unsubscribe) -> Bytes {
    frame(Message::UnsubAck {
        msg_id: request.msg_id,
    })
}

/// Copy of an inbound PUBLISH for delivery to a subscriber.
pub fn create_publish(request: &Publish) -> Bytes {
    frame(Message::Publish(Publish {
        flags: Flags {
            dup: false,
            qos: request.flags.qos,
            retain: request.flags.retain,
            topic_id_type: request.flags.topic_id_type,
            ..Flags::default()
        },
        topic_id: request.topic_id,
        msg_id: request.msg_id,
        payload: request.payload.clone(),
    }))
}

pub fn create_puback(request: &Publish, return_code: ReturnCode) -> Bytes {
    frame(Message::PubAck(PubAck {
        topic_id: request.topic_id,
        msg_id: request.msg_id,
        return_code,
    }))
}

pub fn create_pingresp() -> Bytes {
    frame(Message::PingResp)
}

pub fn create_disconnect() -> Bytes {
    frame(Message::Disconnect { duration: None })
}

pub fn create_gwinfo(gateway_id: u8) -> Bytes {
    frame(Message::GwInfo { gateway_id })
}

//! Typed protocol messages.
//!
//! One `Message` corresponds to one frame. Fields mirror the wire layout; the
//! length header and type byte are implied by the variant.

use bytes::Bytes;

use super::flags::{Flags, TopicIdType};
use super::message_type::MessageType;

/// Status byte carried by CONNACK, REGACK, SUBACK and PUBACK.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReturnCode {
    #[default]
    Accepted,
    Congestion,
    InvalidTopicId,
    NotSupported,
    Other(u8),
}

impl ReturnCode {
    pub const fn from_u8(byte: u8) -> Self {
        match byte {
            0x00 => ReturnCode::Accepted,
            0x01 => ReturnCode::Congestion,
            0x02 => ReturnCode::InvalidTopicId,
            0x03 => ReturnCode::NotSupported,
            other => ReturnCode::Other(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            ReturnCode::Accepted => 0x00,
            ReturnCode::Congestion => 0x01,
            ReturnCode::InvalidTopicId => 0x02,
            ReturnCode::NotSupported => 0x03,
            ReturnCode::Other(code) => code,
        }
    }
}

/// Topic field of SUBSCRIBE and UNSUBSCRIBE, selected by the flags'
/// topic-id-type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicRef {
    /// Full topic name or wildcard pattern
    Name(String),
    /// Predefined or previously registered numeric id
    Id(u16),
    /// Two-character topic name
    Short(String),
}

impl TopicRef {
    pub fn id_type(&self) -> TopicIdType {
        match self {
            TopicRef::Name(_) => TopicIdType::Normal,
            TopicRef::Id(_) => TopicIdType::Predefined,
            TopicRef::Short(_) => TopicIdType::Short,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect {
    pub flags: Flags,
    pub duration: u16,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub topic_id: u16,
    pub msg_id: u16,
    pub topic_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegAck {
    pub topic_id: u16,
    pub msg_id: u16,
    pub return_code: ReturnCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub flags: Flags,
    pub topic_id: u16,
    pub msg_id: u16,
    pub payload: Bytes,
}

impl Publish {
    /// The two-character name carried in `topic_id` when the flags select a
    /// short topic name.
    pub fn short_topic_name(&self) -> Option<String> {
        if self.flags.topic_id_type != TopicIdType::Short {
            return None;
        }
        String::from_utf8(self.topic_id.to_be_bytes().to_vec()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubAck {
    pub topic_id: u16,
    pub msg_id: u16,
    pub return_code: ReturnCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribe {
    pub flags: Flags,
    pub msg_id: u16,
    pub topic: TopicRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAck {
    pub flags: Flags,
    pub topic_id: u16,
    pub msg_id: u16,
    pub return_code: ReturnCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsubscribe {
    pub flags: Flags,
    pub msg_id: u16,
    pub topic: TopicRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    SearchGw { radius: u8 },
    GwInfo { gateway_id: u8 },
    Connect(Connect),
    ConnAck { return_code: ReturnCode },
    Register(Register),
    RegAck(RegAck),
    Publish(Publish),
    PubAck(PubAck),
    Subscribe(Subscribe),
    SubAck(SubAck),
    Unsubscribe(Unsubscribe),
    UnsubAck { msg_id: u16 },
    PingReq { client_id: Option<String> },
    PingResp,
    Disconnect { duration: Option<u16> },
    /// Structurally valid frame whose payload is not modelled
    Other(MessageType),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::SearchGw { .. } => MessageType::SearchGw,
            Message::GwInfo { .. } => MessageType::GwInfo,
            Message::Connect(_) => MessageType::Connect,
            Message::ConnAck { .. } => MessageType::ConnAck,
            Message::Register(_) => MessageType::Register,
            Message::RegAck(_) => MessageType::RegAck,
            Message::Publish(_) => MessageType::Publish,
            Message::PubAck(_) => MessageType::PubAck,
            Message::Subscribe(_) => MessageType::Subscribe,
            Message::SubAck(_) => MessageType::SubAck,
            Message::Unsubscribe(_) => MessageType::Unsubscribe,
            Message::UnsubAck { .. } => MessageType::UnsubAck,
            Message::PingReq { .. } => MessageType::PingReq,
            Message::PingResp => MessageType::PingResp,
            Message::Disconnect { .. } => MessageType::Disconnect,
            Message::Other(message_type) => *message_type,
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Connect(connect) => write!(
                f,
                "CONNECT: W?{} C?{} Keepalive {} ID: {}",
                u8::from(connect.flags.will),
                u8::from(connect.flags.clean_session),
                connect.duration,
                connect.client_id
            ),
            Message::Register(register) => write!(
                f,
                "REGISTER: {} msg {}",
                register.topic_name, register.msg_id
            ),
            Message::Publish(publish) => write!(
                f,
                "PUBLISH: topic {} msg {} ({} bytes)",
                publish.topic_id,
                publish.msg_id,
                publish.payload.len()
            ),
            Message::Subscribe(subscribe) => {
                write!(f, "SUBSCRIBE: {:?} msg {}", subscribe.topic, subscribe.msg_id)
            }
            other => write!(f, "{}", other.message_type()),
        }
    }
}

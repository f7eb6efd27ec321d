/// Message type byte.
///
/// Codes not listed here decode as `Unknown` and are ignored by the
/// dispatcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Advertise,
    SearchGw,
    GwInfo,
    Connect,
    ConnAck,
    WillTopicReq,
    WillTopic,
    WillMsgReq,
    WillMsg,
    Register,
    RegAck,
    Publish,
    PubAck,
    PubComp,
    PubRec,
    PubRel,
    Subscribe,
    SubAck,
    Unsubscribe,
    UnsubAck,
    PingReq,
    PingResp,
    Disconnect,
    WillTopicUpd,
    WillTopicResp,
    WillMsgUpd,
    WillMsgResp,
    Encapsulated,
    Unknown(u8),
}

impl MessageType {
    pub const fn from_u8(byte: u8) -> Self {
        match byte {
            0x00 => MessageType::Advertise,
            0x01 => MessageType::SearchGw,
            0x02 => MessageType::GwInfo,
            0x04 => MessageType::Connect,
            0x05 => MessageType::ConnAck,
            0x06 => MessageType::WillTopicReq,
            0x07 => MessageType::WillTopic,
            0x08 => MessageType::WillMsgReq,
            0x09 => MessageType::WillMsg,
            0x0A => MessageType::Register,
            0x0B => MessageType::RegAck,
            0x0C => MessageType::Publish,
            0x0D => MessageType::PubAck,
            0x0E => MessageType::PubComp,
            0x0F => MessageType::PubRec,
            0x10 => MessageType::PubRel,
            0x12 => MessageType::Subscribe,
            0x13 => MessageType::SubAck,
            0x14 => MessageType::Unsubscribe,
            0x15 => MessageType::UnsubAck,
            0x16 => MessageType::PingReq,
            0x17 => MessageType::PingResp,
            0x18 => MessageType::Disconnect,
            0x1A => MessageType::WillTopicUpd,
            0x1B => MessageType::WillTopicResp,
            0x1C => MessageType::WillMsgUpd,
            0x1D => MessageType::WillMsgResp,
            0xFE => MessageType::Encapsulated,
            other => MessageType::Unknown(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            MessageType::Advertise => 0x00,
            MessageType::SearchGw => 0x01,
            MessageType::GwInfo => 0x02,
            MessageType::Connect => 0x04,
            MessageType::ConnAck => 0x05,
            MessageType::WillTopicReq => 0x06,
            MessageType::WillTopic => 0x07,
            MessageType::WillMsgReq => 0x08,
            MessageType::WillMsg => 0x09,
            MessageType::Register => 0x0A,
            MessageType::RegAck => 0x0B,
            MessageType::Publish => 0x0C,
            MessageType::PubAck => 0x0D,
            MessageType::PubComp => 0x0E,
            MessageType::PubRec => 0x0F,
            MessageType::PubRel => 0x10,
            MessageType::Subscribe => 0x12,
            MessageType::SubAck => 0x13,
            MessageType::Unsubscribe => 0x14,
            MessageType::UnsubAck => 0x15,
            MessageType::PingReq => 0x16,
            MessageType::PingResp => 0x17,
            MessageType::Disconnect => 0x18,
            MessageType::WillTopicUpd => 0x1A,
            MessageType::WillTopicResp => 0x1B,
            MessageType::WillMsgUpd => 0x1C,
            MessageType::WillMsgResp => 0x1D,
            MessageType::Encapsulated => 0xFE,
            MessageType::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Unknown(code) => write!(f, "UNKNOWN({code:#04x})"),
            other => write!(f, "{}", format!("{other:?}").to_uppercase()),
        }
    }
}

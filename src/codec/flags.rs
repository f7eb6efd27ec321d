//! The flags byte shared by CONNECT, SUBSCRIBE, UNSUBSCRIBE, SUBACK and
//! PUBLISH.
//!
//! Bit layout, MSB to LSB: `dup(1) qos(2) retain(1) will(1) clean_session(1)
//! topic_id_type(2)`.

const DUP: u8 = 0b1000_0000;
const QOS_MASK: u8 = 0b0110_0000;
const QOS_SHIFT: u8 = 5;
const RETAIN: u8 = 0b0001_0000;
const WILL: u8 = 0b0000_1000;
const CLEAN_SESSION: u8 = 0b0000_0100;
const TOPIC_ID_TYPE_MASK: u8 = 0b0000_0011;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum QoS {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
    /// QoS -1: publish without a connection
    NoSession,
}

impl QoS {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::NoSession,
        }
    }

    const fn bits(self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
            QoS::NoSession => 3,
        }
    }
}

/// How the topic field of SUBSCRIBE, UNSUBSCRIBE and PUBLISH is encoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TopicIdType {
    #[default]
    Normal,
    Predefined,
    Short,
    Reserved,
}

impl TopicIdType {
    const fn from_bits(bits: u8) -> Self {
        match bits & TOPIC_ID_TYPE_MASK {
            0 => TopicIdType::Normal,
            1 => TopicIdType::Predefined,
            2 => TopicIdType::Short,
            _ => TopicIdType::Reserved,
        }
    }

    const fn bits(self) -> u8 {
        match self {
            TopicIdType::Normal => 0,
            TopicIdType::Predefined => 1,
            TopicIdType::Short => 2,
            TopicIdType::Reserved => 3,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Flags {
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
    pub will: bool,
    pub clean_session: bool,
    pub topic_id_type: TopicIdType,
}

impl Flags {
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            dup: byte & DUP != 0,
            qos: QoS::from_bits((byte & QOS_MASK) >> QOS_SHIFT),
            retain: byte & RETAIN != 0,
            will: byte & WILL != 0,
            clean_session: byte & CLEAN_SESSION != 0,
            topic_id_type: TopicIdType::from_bits(byte),
        }
    }

    pub const fn to_byte(self) -> u8 {
        let mut byte = (self.qos.bits() << QOS_SHIFT) | self.topic_id_type.bits();
        if self.dup {
            byte |= DUP;
        }
        if self.retain {
            byte |= RETAIN;
        }
        if self.will {
            byte |= WILL;
        }
        if self.clean_session {
            byte |= CLEAN_SESSION;
        }
        byte
    }

    pub const fn with_topic_id_type(mut self, topic_id_type: TopicIdType) -> Self {
        self.topic_id_type = topic_id_type;
        self
    }
}

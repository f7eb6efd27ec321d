use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Not enough bytes for the header or a fixed-width field
    #[error("truncated frame: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// Declared length is shorter than the header it sits in
    #[error("invalid declared length {0}")]
    InvalidLength(usize),

    /// CONNECT carried a protocol id other than 0x01
    #[error("unsupported protocol id {0:#04x}")]
    UnsupportedProtocolId(u8),

    #[error("text field is not valid utf-8")]
    InvalidUtf8,

    #[error("frame of {0} bytes does not fit the 16-bit length field")]
    FrameTooLarge(usize),

    #[error("topic id {0} does not fit the 16-bit topic id field")]
    TopicIdOverflow(u64),

    #[error("short topic name {0:?} must be exactly two bytes")]
    InvalidShortTopic(String),
}

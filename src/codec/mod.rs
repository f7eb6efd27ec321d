//! The `codec` module implements the binary wire format.
//!
//! A frame is `[length][type][payload...]`. The length is one byte unless it
//! equals `0x01`, in which case a 16-bit big-endian length follows and the
//! type byte sits at offset 3. All multi-byte fields are big-endian; trailing
//! text and payload fields run to the end of the frame.

pub mod error;
pub mod flags;
pub mod frame;
pub mod message;
pub mod message_type;
pub mod replies;

pub use error::CodecError;
pub use flags::{Flags, QoS, TopicIdType};
pub use frame::{decode, encode};
pub use message::{
    Connect, Message, PubAck, Publish, RegAck, Register, ReturnCode, SubAck, Subscribe, TopicRef,
    Unsubscribe,
};
pub use message_type::MessageType;

#[cfg(test)]
mod tests;

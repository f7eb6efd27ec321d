//! The `utils` module provides the pieces shared by every other module of the
//! gateway: the top-level error type, logging setup and the clock used for
//! activity timestamps and key expiry.

pub mod error;
pub mod logging;
pub mod time;

pub use error::BrokerError;
pub use time::{Clock, ManualClock, SystemClock};

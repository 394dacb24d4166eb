//! All data types used by the probe.

pub mod capabilities;
pub mod error;
pub mod message;
pub mod notification;
pub mod response;

// Re-export commonly used types for convenience.
pub use capabilities::*;
pub use error::*;
pub use message::*;
pub use notification::*;
pub use response::*;

//! Child process lifecycle: launch, stream capture, and guaranteed termination.

pub mod capture;
pub mod child;

pub use capture::StreamCapture;
pub use child::{ChildExit, CommandSpec, ProbeChild};

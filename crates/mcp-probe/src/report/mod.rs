//! Run transcripts and the report file.

pub mod transcript;
pub mod writer;

pub use transcript::{Exchange, Transcript};
pub use writer::{render_report, write_report};

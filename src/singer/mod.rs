//! Singer protocol support
//!
//! Message types, the newline-delimited JSON writer used by taps, the
//! reader used by the target, and the tap state model.

mod message;
mod reader;
mod state;
mod writer;

pub use message::Message;
pub use reader::MessageReader;
pub use state::{FirstRecord, PartitionState, StreamState, TapState};
pub use writer::MessageWriter;

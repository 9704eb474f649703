//! Newline-delimited Singer message writer
//!
//! Taps must keep stdout pure protocol output; all diagnostics go to the
//! tracing subscriber on stderr.

use serde_json::Value;
use std::collections::BTreeSet;
use std::io::Write;

use super::{Message, TapState};

/// Writes Singer messages as one compact JSON document per line
pub struct MessageWriter<W: Write> {
    out: W,
    schemas_written: BTreeSet<String>,
    records_since_state: u64,
    records_written: u64,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            schemas_written: BTreeSet::new(),
            records_since_state: 0,
            records_written: 0,
        }
    }

    /// Total RECORD messages written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Write any message as a single line.
    pub fn write(&mut self, message: &Message) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    /// Write a SCHEMA message the first time a stream is seen; later calls
    /// for the same stream are no-ops.
    pub fn write_schema_once(
        &mut self,
        stream: &str,
        schema: &Value,
        key_properties: &[&str],
        bookmark_properties: Option<&[&str]>,
    ) -> std::io::Result<()> {
        if !self.schemas_written.insert(stream.to_string()) {
            return Ok(());
        }
        self.write(&Message::schema(
            stream,
            schema.clone(),
            key_properties,
            bookmark_properties,
        ))
    }

    /// Write a RECORD message stamped with the extraction time.
    pub fn write_record(&mut self, stream: &str, record: Value) -> std::io::Result<()> {
        self.write(&Message::record(stream, record))?;
        self.records_since_state += 1;
        self.records_written += 1;
        Ok(())
    }

    /// Write a STATE message unconditionally and reset the checkpoint
    /// counter.
    pub fn write_state(&mut self, state: &TapState) -> std::io::Result<()> {
        self.records_since_state = 0;
        self.write(&Message::state(state.to_value()))
    }

    /// Write a STATE message if at least `interval` records were emitted
    /// since the last checkpoint.
    pub fn checkpoint(&mut self, state: &TapState, interval: u64) -> std::io::Result<()> {
        if self.records_since_state >= interval {
            self.write_state(state)?;
        }
        Ok(())
    }
}

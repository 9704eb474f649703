//! Singer message reader for targets

use std::io::BufRead;

use super::Message;
use crate::error::TargetError;

/// Iterates Singer messages from a buffered reader, tracking line numbers
/// for error reporting. Blank lines are skipped.
pub struct MessageReader<R: BufRead> {
    input: R,
    line: usize,
}

impl<R: BufRead> MessageReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, line: 0 }
    }
}

impl<R: BufRead> Iterator for MessageReader<R> {
    type Item = Result<Message, TargetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            match self.input.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let trimmed = buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|source| {
                        TargetError::Protocol {
                            line: self.line,
                            source,
                        }
                    }));
                }
                Err(e) => {
                    return Some(Err(TargetError::Protocol {
                        line: self.line + 1,
                        source: serde_json::Error::io(e),
                    }))
                }
            }
        }
    }
}

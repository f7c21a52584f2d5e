//! Chunk-boundary-safe UTF-8 decoding for streamed text.

const REPLACEMENT: char = '\u{FFFD}';

/// Decodes a byte stream into text as it arrives.
///
/// A multi-byte character split across two chunks is held back until the
/// rest of it arrives, so callers never see a spurious replacement
/// character at a chunk boundary. Invalid bytes are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct IncrementalDecoder {
    pending: Vec<u8>,
}

impl IncrementalDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the text that is now complete.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::new();
        let mut consumed = 0;
        loop {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(rest) => {
                    out.push_str(rest);
                    consumed = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = consumed + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[consumed..valid_end]));
                    match e.error_len() {
                        Some(invalid) => {
                            out.push(REPLACEMENT);
                            consumed = valid_end + invalid;
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            consumed = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }

    /// Flush whatever is still buffered at end of stream.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

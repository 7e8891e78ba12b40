//! Incremental UTF-8 decoding across arbitrary chunk boundaries
//!
//! Transport chunks are not aligned to character boundaries: a multi-byte
//! character may arrive split over two or more chunks. [`Utf8StreamDecoder`]
//! holds any incomplete trailing sequence in `pending` and prepends it to
//! the next chunk, so decoding chunk by chunk yields exactly the text that
//! decoding the whole byte sequence at once would.
//!
//! Invalid sequences are errors, both mid-stream ([`RelayError::Decode`])
//! and when the stream ends inside a sequence
//! ([`RelayError::DecodeTruncation`]).

use crate::error::{Result, RelayError};

/// Stateful UTF-8 decoder for a single byte stream
#[derive(Debug, Default, Clone)]
pub struct Utf8StreamDecoder {
    /// Bytes of an incomplete trailing sequence (at most 3)
    pending: Vec<u8>,
    /// Bytes fully decoded so far, used for error offsets
    consumed: usize,
}

impl Utf8StreamDecoder {
    /// Create a decoder with an empty pending buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes waiting for the rest of their sequence
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Decode one chunk, returning every character it completes
    ///
    /// The returned string may be empty when the chunk only extends a
    /// pending sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Decode`] if the bytes contain a sequence that
    /// can never become valid UTF-8
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::client::decoder::Utf8StreamDecoder;
    ///
    /// let bytes = "€".as_bytes(); // E2 82 AC
    /// let mut decoder = Utf8StreamDecoder::new();
    /// assert_eq!(decoder.decode(&bytes[..1]).unwrap(), "");
    /// assert_eq!(decoder.decode(&bytes[1..]).unwrap(), "€");
    /// assert_eq!(decoder.finish().unwrap(), "");
    /// ```
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                self.consumed += bytes.len();
                Ok(text.to_string())
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if e.error_len().is_some() {
                    return Err(RelayError::Decode {
                        offset: self.consumed + valid,
                    }
                    .into());
                }

                // Incomplete sequence at the end: keep it for the next chunk
                let start = self.consumed;
                self.pending = bytes.split_off(valid);
                self.consumed += valid;
                String::from_utf8(bytes).map_err(|e| {
                    RelayError::Decode {
                        offset: start + e.utf8_error().valid_up_to(),
                    }
                    .into()
                })
            }
        }
    }

    /// Flush the decoder at end of stream
    ///
    /// Returns any remaining complete text (always empty for this decoder,
    /// since complete characters are emitted as soon as they arrive).
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DecodeTruncation`] if a sequence was left
    /// incomplete
    pub fn finish(self) -> Result<String> {
        if self.pending.is_empty() {
            Ok(String::new())
        } else {
            Err(RelayError::DecodeTruncation {
                pending: self.pending.len(),
            }
            .into())
        }
    }
}

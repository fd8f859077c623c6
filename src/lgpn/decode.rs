//! Incremental decoder for the LGPN names payload.
//!
//! The payload is one large JSON array of objects, decoded from raw byte
//! chunks as they arrive so the full document never sits in memory. The
//! server terminates the array with a stray comma before the closing
//! bracket; a comma followed by `]` is therefore treated as a normal end of
//! array rather than a syntax error.

use serde::de::DeserializeOwned;

/// Outcome of one decode attempt.
#[derive(Debug)]
pub enum Poll<T> {
  /// Not enough buffered input for a complete element; feed another chunk.
  Incomplete,
  /// One array element was decoded.
  Record(T),
  /// The closing bracket was reached.
  End,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
  #[error("payload does not start with a JSON array")]
  NotAnArray,
  #[error("payload ended before the array was closed")]
  Truncated,
  #[error("malformed array element: {0}")]
  BadElement(#[from] serde_json::Error),
  #[error("unexpected character {0:?} in array")]
  UnexpectedByte(char),
}

/// Chunk-fed decoder for a single JSON array of objects.
///
/// Consumed input is drained from the buffer after every element, so at most
/// one element (plus a partial chunk) is buffered at a time.
#[derive(Debug, Default)]
pub struct ArrayDecoder {
  buf: Vec<u8>,
  started: bool,
}

impl ArrayDecoder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a chunk of raw input.
  pub fn extend(&mut self, chunk: &[u8]) {
    self.buf.extend_from_slice(chunk);
  }

  /// Whether the array-open bracket has been consumed.
  pub fn is_started(&self) -> bool {
    self.started
  }

  /// Try to decode the next element from the buffered input.
  pub fn poll<T: DeserializeOwned>(&mut self) -> Result<Poll<T>, DecodeError> {
    if !self.started {
      match self.first_significant() {
        None => return Ok(Poll::Incomplete),
        Some(i) if self.buf[i] == b'[' => {
          self.buf.drain(..=i);
          self.started = true;
        }
        Some(_) => return Err(DecodeError::NotAnArray),
      }
    }

    loop {
      let i = match self.first_significant() {
        None => return Ok(Poll::Incomplete),
        Some(i) => i,
      };

      match self.buf[i] {
        b']' => {
          self.buf.drain(..=i);
          return Ok(Poll::End);
        }
        // A comma right before `]` is the known defect in the remote
        // payload; skipping separators here makes it land on End above.
        b',' => {
          self.buf.drain(..=i);
        }
        b'{' => match self.object_end(i) {
          None => return Ok(Poll::Incomplete),
          Some(end) => {
            let record = serde_json::from_slice(&self.buf[i..=end])?;
            self.buf.drain(..=end);
            return Ok(Poll::Record(record));
          }
        },
        other => return Err(DecodeError::UnexpectedByte(other as char)),
      }
    }
  }

  /// Index of the first non-whitespace byte, if any is buffered.
  fn first_significant(&self) -> Option<usize> {
    self.buf.iter().position(|b| !b.is_ascii_whitespace())
  }

  /// Index of the `}` closing the object that opens at `start`, honoring
  /// strings and escape sequences. `None` when the object is still partial.
  fn object_end(&self, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in self.buf.iter().enumerate().skip(start) {
      if in_string {
        if escaped {
          escaped = false;
        } else if b == b'\\' {
          escaped = true;
        } else if b == b'"' {
          in_string = false;
        }
        continue;
      }

      match b {
        b'"' => in_string = true,
        b'{' => depth += 1,
        b'}' => {
          depth -= 1;
          if depth == 0 {
            return Some(i);
          }
        }
        _ => {}
      }
    }

    None
  }
}

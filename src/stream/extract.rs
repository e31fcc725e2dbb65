//! Pulls the single machine-readable JSON document out of a pack tool's
//! stdout while letting the surrounding log text through.

use serde::de::{DeserializeOwned, IgnoredAny};

/// How far a recorded candidate has got towards being one JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// A valid prefix so far; more input may complete it.
    Incomplete,
    /// A whole value ends at this byte offset.
    Complete(usize),
    /// Can never become valid JSON.
    Invalid,
}

/// Classify `text` by parsing its first JSON value.
///
/// Running out of input mid-value is `Incomplete`; any other syntax error is
/// `Invalid`. Text after the value is not examined.
pub fn scan(text: &str) -> ScanStatus {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<IgnoredAny>();
    match stream.next() {
        Some(Ok(_)) => ScanStatus::Complete(stream.byte_offset()),
        Some(Err(err)) if err.is_eof() => ScanStatus::Incomplete,
        Some(Err(_)) => ScanStatus::Invalid,
        None => ScanStatus::Incomplete,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    Idle,
    Recording,
    Done,
}

/// Line-oriented extractor for one embedded JSON document.
///
/// Lines are pushed in order; each call returns the lines that should be
/// shown to the user. While a candidate document is being recorded nothing
/// is returned. If the candidate turns out not to be JSON (or not the
/// expected shape) the recorded lines are released as plain text.
pub struct JsonExtractor<T> {
    state: ExtractState,
    buffer: String,
    recorded: Vec<String>,
    value: Option<T>,
}

impl<T> Default for JsonExtractor<T> {
    fn default() -> Self {
        Self {
            state: ExtractState::Idle,
            buffer: String::new(),
            recorded: Vec::new(),
            value: None,
        }
    }
}

impl<T: DeserializeOwned> JsonExtractor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ExtractState {
        self.state
    }

    /// The captured document, if one has been seen.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Push one decoded line (without terminator). Returns pass-through lines.
    pub fn push_line(&mut self, line: &str) -> Vec<String> {
        match self.state {
            ExtractState::Done => vec![line.to_string()],
            ExtractState::Idle if !starts_document(line) => vec![line.to_string()],
            ExtractState::Idle => {
                self.state = ExtractState::Recording;
                self.record(line)
            }
            ExtractState::Recording => self.record(line),
        }
    }

    /// Signal end of stream. An unfinished candidate is released as text.
    pub fn finish(&mut self) -> Vec<String> {
        if self.state == ExtractState::Recording {
            tracing::debug!(
                lines = self.recorded.len(),
                "Stream ended inside a JSON candidate; releasing as text"
            );
            self.reset();
            std::mem::take(&mut self.recorded)
        } else {
            Vec::new()
        }
    }

    fn record(&mut self, line: &str) -> Vec<String> {
        self.recorded.push(line.to_string());
        self.buffer.push_str(line);
        self.buffer.push('\n');

        match scan(&self.buffer) {
            ScanStatus::Incomplete => Vec::new(),
            ScanStatus::Complete(end) => match serde_json::from_str::<T>(&self.buffer[..end]) {
                Ok(value) => {
                    let rest = self.buffer[end..].trim().to_string();
                    self.value = Some(value);
                    self.state = ExtractState::Done;
                    self.buffer.clear();
                    self.recorded.clear();
                    if rest.is_empty() {
                        Vec::new()
                    } else {
                        vec![rest]
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "JSON document has an unexpected shape");
                    self.release()
                }
            },
            ScanStatus::Invalid => self.release(),
        }
    }

    /// Give up on the current candidate. The line that broke it may itself
    /// open a real document, so it is re-examined from `Idle`.
    fn release(&mut self) -> Vec<String> {
        self.reset();
        let mut lines = std::mem::take(&mut self.recorded);
        if lines.len() > 1 {
            if let Some(last) = lines.pop() {
                let tail = self.push_line(&last);
                lines.extend(tail);
            }
        }
        lines
    }

    fn reset(&mut self) {
        self.state = ExtractState::Idle;
        self.buffer.clear();
    }
}

fn starts_document(line: &str) -> bool {
    matches!(line.trim_start().as_bytes().first(), Some(b'[' | b'{'))
}

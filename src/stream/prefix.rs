//! Per-package labelling of build output on a shared console.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use crossterm::style::{style, Color, Stylize};
use parking_lot::Mutex;

/// Erase-line and cursor-to-column-1, emitted by progress renderers.
const ERASE_LINE: &str = "\x1b[2K";
const CURSOR_COLUMN_ONE: &str = "\x1b[1G";

const PALETTE: &[Color] = &[
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::Red,
];

/// Destination for prefixed lines. Each call writes exactly one line.
pub trait OutputSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes to the process's stderr, one locked write per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl OutputSink for StderrSink {
    fn write_line(&self, line: &str) {
        let mut err = std::io::stderr().lock();
        if let Err(e) = err.write_all(line.as_bytes()) {
            tracing::debug!(error = %e, "Failed to write build output");
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl OutputSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Assigns each package a palette color in first-seen order.
#[derive(Debug)]
pub struct ColorRegistry {
    enabled: bool,
    assigned: Mutex<HashMap<String, usize>>,
}

impl ColorRegistry {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            assigned: Mutex::new(HashMap::new()),
        }
    }

    /// Palette slot for `name`, stable for the registry's lifetime.
    pub fn index_of(&self, name: &str) -> usize {
        let mut assigned = self.assigned.lock();
        let next = assigned.len();
        *assigned.entry(name.to_string()).or_insert(next) % PALETTE.len()
    }

    /// The console label for a package, e.g. `[my-lib]` in its color.
    pub fn label(&self, name: &str) -> String {
        let text = format!("[{name}]");
        if !self.enabled {
            return text;
        }
        let color = PALETTE[self.index_of(name)];
        style(text).with(color).bold().to_string()
    }
}

/// Formats lines as `"<label> <content>\n"` and forwards them to a sink.
#[derive(Clone)]
pub struct LinePrefixer {
    label: String,
    sink: Arc<dyn OutputSink>,
}

impl LinePrefixer {
    pub fn new(label: impl Into<String>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            label: label.into(),
            sink,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn format(&self, content: &str) -> String {
        format!("{} {}\n", self.label, sanitize(content))
    }

    pub fn emit(&self, content: &str) {
        self.sink.write_line(&self.format(content));
    }

    pub fn emit_bytes(&self, content: &[u8]) {
        self.emit(&String::from_utf8_lossy(content));
    }
}

/// Strip cursor-control sequences that would corrupt interleaved output.
pub fn sanitize(content: &str) -> String {
    content.replace(ERASE_LINE, "").replace(CURSOR_COLUMN_ONE, "")
}

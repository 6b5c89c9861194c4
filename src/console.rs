//! Human-readable status lines.
//!
//! The claim core reports progress through a [`StatusSink`]; the CLI plugs in
//! [`ConsoleSink`], which prints timestamped, tagged lines and mirrors them into tracing.

use chrono::Local;
use std::fmt;
use std::io::IsTerminal;
use std::sync::Mutex;

/// Category of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTag {
    Info,
    Success,
    Error,
    Warn,
    Gas,
    Link,
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::Info => "info",
            StatusTag::Success => "success",
            StatusTag::Error => "error",
            StatusTag::Warn => "warn",
            StatusTag::Gas => "gas",
            StatusTag::Link => "link",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            StatusTag::Info => "ℹ️ ",
            StatusTag::Success => "✅",
            StatusTag::Error => "❌",
            StatusTag::Warn => "⚠️ ",
            StatusTag::Gas => "⛽",
            StatusTag::Link => "🔗",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            StatusTag::Success => "\x1b[32m",
            StatusTag::Error => "\x1b[31m",
            StatusTag::Warn => "\x1b[33m",
            StatusTag::Gas => "\x1b[36m",
            StatusTag::Link => "\x1b[34m",
            StatusTag::Info => "",
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for status messages
pub trait StatusSink: Send + Sync {
    fn emit(&self, tag: StatusTag, message: &str);

    fn info(&self, message: &str) {
        self.emit(StatusTag::Info, message);
    }

    fn success(&self, message: &str) {
        self.emit(StatusTag::Success, message);
    }

    fn error(&self, message: &str) {
        self.emit(StatusTag::Error, message);
    }

    fn warn(&self, message: &str) {
        self.emit(StatusTag::Warn, message);
    }

    fn gas(&self, message: &str) {
        self.emit(StatusTag::Gas, message);
    }

    fn link(&self, message: &str) {
        self.emit(StatusTag::Link, message);
    }
}

/// Render one status line: `[HH:MM:SS] <emoji> message`
pub fn format_line(timestamp: &str, tag: StatusTag, message: &str) -> String {
    format!("[{}] {} {}", timestamp, tag.emoji(), message)
}

/// Prints status lines to stdout (errors to stderr)
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colors only when stdout is an interactive terminal
    pub fn detect() -> Self {
        Self::new(std::io::stdout().is_terminal())
    }

    fn render(&self, timestamp: &str, tag: StatusTag, message: &str) -> String {
        let line = format_line(timestamp, tag, message);
        if self.color && !tag.color().is_empty() {
            format!("{}{}\x1b[0m", tag.color(), line)
        } else {
            line
        }
    }
}

impl StatusSink for ConsoleSink {
    fn emit(&self, tag: StatusTag, message: &str) {
        let line = self.render(&Local::now().format("%H:%M:%S").to_string(), tag, message);

        match tag {
            StatusTag::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
        tracing::debug!(tag = tag.as_str(), "{}", message);
    }
}

/// Collects status lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(StatusTag, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(StatusTag, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, tag: StatusTag, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(t, line)| *t == tag && line.contains(needle))
    }
}

impl StatusSink for MemorySink {
    fn emit(&self, tag: StatusTag, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((tag, message.to_string()));
        }
    }
}

//! Human-readable console adapter

use super::encoder::{logfmt_key, logfmt_value, render_value, walk_dotted, Builtins};
use super::style::{render, Style};
use crate::core::attr_map::flatten;
use crate::core::{Adapter, AdapterOptions, Level, LoggerError, Record, Result, Value};
use colored::Color;
use parking_lot::Mutex;
use std::io::{self, Write};

const TIME_STYLE: Style = Style::fg(Color::BrightBlack);
const KEY_STYLE: Style = Style::fg(Color::Cyan).dim();

/// Writes `TIME LEVEL message key=value ... source=file:line` lines
///
/// Output goes to stderr unless another writer is supplied. Colors are on
/// for stderr and off for custom writers; either can be overridden with
/// [`with_colors`](Self::with_colors).
///
/// # Example
///
/// ```
/// use rust_log_pipeline::appenders::ConsoleAdapter;
/// use rust_log_pipeline::prelude::*;
///
/// let console = ConsoleAdapter::new()
///     .with_options(AdapterOptions::new().with_level(Level::DEBUG).with_add_source(true));
/// let logger = Logger::builder().level(Level::DEBUG).adapter(console).build();
/// logger.debug("cache warmed");
/// ```
pub struct ConsoleAdapter {
    writer: Mutex<Box<dyn Write + Send>>,
    options: AdapterOptions,
    use_colors: bool,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stderr())),
            options: AdapterOptions::default(),
            use_colors: true,
        }
    }

    /// Write to `writer` instead of stderr, without colors
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            options: AdapterOptions::default(),
            use_colors: false,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    fn paint(&self, text: &str, style: &Style) -> String {
        if self.use_colors {
            render(text, style)
        } else {
            text.to_string()
        }
    }

    /// Format one line, without the trailing newline
    pub fn format_line(&self, record: &Record) -> String {
        let options = &self.options;
        let builtins = Builtins::resolve(record, options);
        let mut parts: Vec<String> = Vec::with_capacity(4 + record.attrs.len());

        if let Some(time) = &builtins.time {
            parts.push(self.paint(&render_value(&time.value, options), &TIME_STYLE));
        }
        if let Some(level) = &builtins.level {
            let label = format!("{:<5}", render_value(&level.value, options));
            parts.push(self.paint(&label, &Style::for_level(record.level)));
        }
        if let Some(message) = &builtins.message {
            parts.push(render_value(&message.value, options).into_owned());
        }

        let attrs = flatten(&record.attrs, options.replace_attr.as_ref());
        walk_dotted(&attrs, "", &mut |key, value| {
            let rendered = match value {
                Value::Time(_) | Value::String(_) | Value::Duration(_) => {
                    logfmt_value(&render_value(value, options)).into_owned()
                }
                other => other.to_string(),
            };
            parts.push(format!("{}={}", self.paint(&logfmt_key(key), &KEY_STYLE), rendered));
        });
        attrs.free();

        if let Some(source) = &builtins.source {
            let location = render_value(&source.value, options);
            parts.push(format!(
                "{}={}",
                self.paint(&source.key, &KEY_STYLE),
                self.paint(&location, &Style::PLAIN.italic())
            ));
        }

        parts.join(" ")
    }

    fn write(&self, text: &str) -> Result<()> {
        self.writer
            .lock()
            .write_all(text.as_bytes())
            .map_err(|e| LoggerError::write("console", e))
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for ConsoleAdapter {
    fn enabled(&self, level: Level) -> bool {
        level.passes(self.options.level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        let mut line = self.format_line(record);
        line.push('\n');
        self.write(&line)
    }

    fn batch_handle(&self, records: &[Record]) -> Result<()> {
        let mut out = String::new();
        for record in records.iter().filter(|r| self.enabled(r.level)) {
            out.push_str(&self.format_line(record));
            out.push('\n');
        }
        if out.is_empty() {
            return Ok(());
        }
        self.write(&out)
    }

    fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LoggerError::write("console", e))
    }

    fn name(&self) -> &str {
        "console"
    }
}

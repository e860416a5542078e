//! Line encoders and the adapter that writes them
//!
//! An [`Encoder`] turns one [`Record`] into one line of bytes. The
//! [`EncoderAdapter`] owns a writer and appends one encoded line per record;
//! a batch is written under a single lock.

use crate::core::attr_map::{flatten, AttrMap, MapValue};
use crate::core::options::{AdapterOptions, LEVEL_KEY, MESSAGE_KEY, SOURCE_KEY, TIME_KEY};
use crate::core::{Adapter, Attr, Level, LoggerError, Record, Result, Value};
use parking_lot::{Mutex, MutexGuard};
use serde::ser::{SerializeMap, Serializer};
use std::borrow::Cow;
use std::io::Write;

/// Marker appended to a line whose encoding failed part-way
pub const ENCODE_ERROR_MARKER: &str = "!ERROR:";

/// Prefix given to a record attribute whose key is taken by a built-in field
pub const SHADOWED_KEY_PREFIX: &str = "fields.";

/// Serializes a record into a single line, without the trailing newline
pub trait Encoder: Send + Sync {
    /// Append the encoding of `record` to `buf`.
    ///
    /// On failure `buf` keeps whatever was written before the error.
    fn encode(&self, record: &Record, options: &AdapterOptions, buf: &mut Vec<u8>) -> Result<()>;

    /// Short format name used in errors, e.g. `"json"`
    fn name(&self) -> &str;
}

/// Built-in fields after `replace_attr` has had its say
pub(crate) struct Builtins {
    pub time: Option<Attr>,
    pub level: Option<Attr>,
    pub message: Option<Attr>,
    pub source: Option<Attr>,
}

impl Builtins {
    pub(crate) fn resolve(record: &Record, options: &AdapterOptions) -> Self {
        let time = (!options.omit_time)
            .then(|| options.rewrite_builtin(Attr::new(TIME_KEY, record.time)))
            .flatten();
        let level = options.rewrite_builtin(Attr::new(LEVEL_KEY, record.level.to_string()));
        let message = options.rewrite_builtin(Attr::new(MESSAGE_KEY, record.message.as_str()));
        let source = match (&record.source, options.add_source) {
            (Some(source), true) => {
                options.rewrite_builtin(Attr::new(SOURCE_KEY, source.to_string()))
            }
            _ => None,
        };

        Self {
            time,
            level,
            message,
            source,
        }
    }

    fn claims(&self, key: &str) -> bool {
        [&self.time, &self.level, &self.message, &self.source]
            .into_iter()
            .flatten()
            .any(|attr| attr.key == key)
    }

    /// Key under which a record attribute is written
    pub(crate) fn attr_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if self.claims(key) {
            Cow::Owned(format!("{}{}", SHADOWED_KEY_PREFIX, key))
        } else {
            Cow::Borrowed(key)
        }
    }
}

/// Text form of a value, with times in the configured format
pub(crate) fn render_value<'a>(value: &'a Value, options: &AdapterOptions) -> Cow<'a, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Time(t) => Cow::Owned(options.time_format.format(t)),
        other => Cow::Owned(other.to_string()),
    }
}

/// Keep a logfmt key to characters that need no quoting
pub(crate) fn logfmt_key(key: &str) -> Cow<'_, str> {
    let clean = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.');
    if key.chars().all(clean) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(key.chars().filter(|c| clean(*c)).collect())
    }
}

/// Quote a logfmt value when it contains spaces, quotes or `=`
pub(crate) fn logfmt_value(value: &str) -> Cow<'_, str> {
    if value.is_empty() || value.contains([' ', '"', '=', '\\']) {
        Cow::Owned(logfmt_quote(value))
    } else {
        Cow::Borrowed(value)
    }
}

pub(crate) fn logfmt_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Visit scalar entries of `map` depth-first with dotted keys
pub(crate) fn walk_dotted<F>(map: &AttrMap, prefix: &str, visit: &mut F)
where
    F: FnMut(&str, &Value),
{
    for (key, value) in map.iter() {
        let dotted: Cow<'_, str> = if prefix.is_empty() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(format!("{}.{}", prefix, key))
        };
        match value {
            MapValue::Value(v) => visit(dotted.as_ref(), v),
            MapValue::Map(nested) => walk_dotted(nested, &dotted, visit),
        }
    }
}

/// One JSON object per line
///
/// Built-in keys come first (`time`, `level`, `msg`, `source`), then the
/// record's attributes with groups as nested objects. A top-level attribute
/// named like an emitted built-in is written as `fields.<key>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl JsonEncoder {
    fn write_builtin<M: SerializeMap>(
        map: &mut M,
        attr: &Attr,
        options: &AdapterOptions,
    ) -> std::result::Result<(), M::Error> {
        match &attr.value {
            Value::Time(t) if options.time_format.is_numeric() => {
                map.serialize_entry(&attr.key, &t.timestamp_millis())
            }
            Value::Time(t) => map.serialize_entry(&attr.key, &options.time_format.format(t)),
            other => map.serialize_entry(&attr.key, other),
        }
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &Record, options: &AdapterOptions, buf: &mut Vec<u8>) -> Result<()> {
        let builtins = Builtins::resolve(record, options);
        let attrs = flatten(&record.attrs, options.replace_attr.as_ref());

        let mut serializer = serde_json::Serializer::new(&mut *buf);
        let result = (|| {
            let mut map = (&mut serializer).serialize_map(None)?;
            for attr in [&builtins.time, &builtins.level, &builtins.message, &builtins.source]
                .into_iter()
                .flatten()
            {
                Self::write_builtin(&mut map, attr, options)?;
            }
            for (key, value) in attrs.iter() {
                map.serialize_entry(builtins.attr_key(key).as_ref(), value)?;
            }
            map.end()
        })();

        attrs.free();
        result.map_err(|e| LoggerError::serialization("json", e.to_string()))
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// `key=value` pairs separated by spaces
///
/// Groups are flattened to dotted keys. The message is always quoted, and
/// attribute keys shadowing a built-in get the `fields.` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogfmtEncoder;

impl Encoder for LogfmtEncoder {
    fn encode(&self, record: &Record, options: &AdapterOptions, buf: &mut Vec<u8>) -> Result<()> {
        let builtins = Builtins::resolve(record, options);
        let mut parts: Vec<String> = Vec::with_capacity(4 + record.attrs.len());

        if let Some(time) = &builtins.time {
            let value = render_value(&time.value, options);
            parts.push(format!("{}={}", logfmt_key(&time.key), logfmt_value(&value)));
        }
        if let Some(level) = &builtins.level {
            let value = render_value(&level.value, options);
            parts.push(format!("{}={}", logfmt_key(&level.key), logfmt_value(&value)));
        }
        if let Some(message) = &builtins.message {
            let value = render_value(&message.value, options);
            parts.push(format!("{}={}", logfmt_key(&message.key), logfmt_quote(&value)));
        }

        let attrs = flatten(&record.attrs, options.replace_attr.as_ref());
        walk_dotted(&attrs, "", &mut |key, value| {
            let rendered = match value {
                Value::String(s) => logfmt_quote(s),
                other => logfmt_value(&render_value(other, options)).into_owned(),
            };
            parts.push(format!("{}={}", logfmt_key(&builtins.attr_key(key)), rendered));
        });
        attrs.free();

        if let Some(source) = &builtins.source {
            let value = render_value(&source.value, options);
            parts.push(format!("{}={}", logfmt_key(&source.key), logfmt_value(&value)));
        }

        buf.extend_from_slice(parts.join(" ").as_bytes());
        Ok(())
    }

    fn name(&self) -> &str {
        "logfmt"
    }
}

/// Writes one encoded line per record to `W`
///
/// # Example
///
/// ```
/// use rust_log_pipeline::appenders::EncoderAdapter;
/// use rust_log_pipeline::prelude::*;
///
/// let adapter = EncoderAdapter::json(Vec::new());
/// adapter.handle(&Record::new(Level::INFO, "ready").with_attr("port", 8080)).unwrap();
///
/// let line = String::from_utf8(adapter.writer().clone()).unwrap();
/// assert!(line.contains(r#""msg":"ready""#));
/// assert!(line.contains(r#""port":8080"#));
/// ```
pub struct EncoderAdapter<E, W> {
    encoder: E,
    writer: Mutex<W>,
    options: AdapterOptions,
    name: String,
}

impl<W: Write + Send> EncoderAdapter<JsonEncoder, W> {
    pub fn json(writer: W) -> Self {
        Self::new(JsonEncoder, writer)
    }
}

impl<W: Write + Send> EncoderAdapter<LogfmtEncoder, W> {
    pub fn logfmt(writer: W) -> Self {
        Self::new(LogfmtEncoder, writer)
    }
}

impl<E: Encoder, W: Write + Send> EncoderAdapter<E, W> {
    pub fn new(encoder: E, writer: W) -> Self {
        let name = format!("encoder({})", encoder.name());
        Self {
            encoder,
            writer: Mutex::new(writer),
            options: AdapterOptions::default(),
            name,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Lock and borrow the underlying writer
    pub fn writer(&self) -> MutexGuard<'_, W> {
        self.writer.lock()
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    /// Encode one line into `buf`; a failed encoding still leaves a marked
    /// line behind
    fn encode_line(&self, record: &Record, buf: &mut Vec<u8>) -> Result<()> {
        let result = self.encoder.encode(record, &self.options, buf);
        if let Err(ref e) = result {
            buf.extend_from_slice(ENCODE_ERROR_MARKER.as_bytes());
            buf.extend_from_slice(e.to_string().as_bytes());
        }
        buf.push(b'\n');
        result.map_err(|e| match e {
            LoggerError::Serialization { .. } => e,
            other => LoggerError::serialization(self.encoder.name(), other.to_string()),
        })
    }

    fn write_all(&self, buf: &[u8]) -> Result<()> {
        self.writer
            .lock()
            .write_all(buf)
            .map_err(|e| LoggerError::write(self.name.as_str(), e))
    }
}

impl<E: Encoder, W: Write + Send> Adapter for EncoderAdapter<E, W> {
    fn enabled(&self, level: Level) -> bool {
        level.passes(self.options.level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        let mut buf = Vec::with_capacity(256);
        let encoded = self.encode_line(record, &mut buf);
        self.write_all(&buf)?;
        encoded
    }

    fn batch_handle(&self, records: &[Record]) -> Result<()> {
        let mut buf = Vec::with_capacity(256 * records.len());
        let mut first = None;
        for record in records.iter().filter(|r| self.enabled(r.level)) {
            if let Err(e) = self.encode_line(record, &mut buf) {
                first.get_or_insert(e);
            }
        }
        if !buf.is_empty() {
            self.write_all(&buf)?;
        }
        first.map_or(Ok(()), Err)
    }

    fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LoggerError::write(self.name.as_str(), e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

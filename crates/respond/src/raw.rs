// respond/src/raw.rs — byte-stream results: header resolution, scoped closing and copying
use crate::sink::Sink;
use axum::http::HeaderValue;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::ops::{Deref, DerefMut};

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const INLINE: &str = "inline";

// ════════════════════════════════════════════════════════════
// 1. Raw content capabilities
// ════════════════════════════════════════════════════════════

/// A result that should be written as opaque bytes rather than JSON.
///
/// Every capability is optional. Returning `None` (or an empty string) from
/// `content_type`/`file_name` means "use the default", and the default `close`
/// does nothing.
pub trait RawContent: Read {
    /// Value for the `Content-Type` header. Defaults to `application/octet-stream`.
    fn content_type(&self) -> Option<&str> {
        None
    }

    /// Switches the disposition from `inline` to an attachment with this name.
    fn file_name(&self) -> Option<&str> {
        None
    }

    /// Called exactly once after the body has been copied, whether or not the
    /// copy succeeded.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RawContent for &[u8] {}
impl<T: AsRef<[u8]>> RawContent for Cursor<T> {}
impl RawContent for File {}
impl RawContent for io::Empty {}

impl<R: RawContent + ?Sized> RawContent for Box<R> {
    fn content_type(&self) -> Option<&str> {
        (**self).content_type()
    }

    fn file_name(&self) -> Option<&str> {
        (**self).file_name()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Annotates any reader with a content type and/or a download name.
///
/// ```ignore
/// Raw::new(File::open("report.csv")?)
///     .with_content_type("text/csv")
///     .with_file_name("report.csv")
/// ```
#[derive(Debug)]
pub struct Raw<R> {
    reader: R,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl<R: Read> Raw<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            content_type: None,
            file_name: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Read for Raw<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R: Read> RawContent for Raw<R> {
    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

// ════════════════════════════════════════════════════════════
// 2. Header resolution
// ════════════════════════════════════════════════════════════

/// The `Content-Type`/`Content-Disposition` pair derived from a raw result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeaders {
    pub content_type: String,
    pub disposition: String,
}

impl RawHeaders {
    /// Probe a raw result's optional capabilities. Absent or empty values fall
    /// back to `application/octet-stream` and `inline`, as does a content type
    /// that is not a legal header value.
    pub fn resolve<R: RawContent + ?Sized>(raw: &R) -> Self {
        let content_type = match raw.content_type().filter(|value| !value.is_empty()) {
            Some(value) if HeaderValue::from_str(value).is_ok() => value.to_string(),
            Some(value) => {
                tracing::warn!(content_type = value, "invalid raw content type, using {}", OCTET_STREAM);
                OCTET_STREAM.to_string()
            }
            None => OCTET_STREAM.to_string(),
        };

        let disposition = raw
            .file_name()
            .filter(|name| !name.is_empty())
            .map(attachment)
            .unwrap_or_else(|| INLINE.to_string());

        Self {
            content_type,
            disposition,
        }
    }
}

/// `attachment; filename="<name>"`, with quotes and backslashes escaped and
/// control characters replaced by spaces so the value stays a legal header.
pub fn attachment(file_name: &str) -> String {
    let mut escaped = String::with_capacity(file_name.len());
    for c in file_name.chars() {
        match c {
            '\\' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_control() => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    format!(r#"attachment; filename="{}""#, escaped)
}

// ════════════════════════════════════════════════════════════
// 3. Scoped closing & copying
// ════════════════════════════════════════════════════════════

/// Holds a raw result for the duration of a copy and closes it on drop, so the
/// close runs on success, on failure and during unwinding alike.
pub struct Closing<'s, R: RawContent + ?Sized> {
    inner: &'s mut R,
}

impl<'s, R: RawContent + ?Sized> Closing<'s, R> {
    pub fn new(inner: &'s mut R) -> Self {
        Self { inner }
    }
}

impl<R: RawContent + ?Sized> Deref for Closing<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.inner
    }
}

impl<R: RawContent + ?Sized> DerefMut for Closing<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.inner
    }
}

impl<R: RawContent + ?Sized> Drop for Closing<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.inner.close() {
            tracing::warn!(error = %err, "failed to close raw response body");
        }
    }
}

/// Relay every byte of `reader` into the sink's body, `buffer_size` bytes at a time.
pub fn copy_to_sink<R, S>(reader: &mut R, sink: &mut S, buffer_size: usize) -> io::Result<u64>
where
    R: Read + ?Sized,
    S: Sink + ?Sized,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut written = 0u64;

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => return Ok(written),
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };

        let mut chunk = &buf[..read];
        while !chunk.is_empty() {
            match sink.write_body(chunk) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => chunk = &chunk[n..],
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        written += read as u64;
    }
}

// respond/src/sink.rs — the write-once output channel a responder writes into
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::io;

/// Where a responder writes headers, the status line and the body.
///
/// Headers must be set before `write_status`; body bytes follow it. A responder
/// drives a sink exactly once and then hands it back through `finish`.
pub trait Sink {
    type Output;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    fn write_status(&mut self, status: StatusCode);

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Discard everything written so far. Returns `false` when the sink has
    /// already flushed output it can no longer take back.
    fn reset(&mut self) -> bool {
        false
    }

    fn finish(self) -> Self::Output;
}

/// Adapts a sink's body to `io::Write` for producers that stream into a writer.
pub struct BodyWriter<'s, S: Sink + ?Sized> {
    sink: &'s mut S,
}

impl<'s, S: Sink + ?Sized> BodyWriter<'s, S> {
    pub fn new(sink: &'s mut S) -> Self {
        Self { sink }
    }
}

impl<S: Sink + ?Sized> io::Write for BodyWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write_body(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════
// 1. Axum
// ════════════════════════════════════════════════════════════

/// Buffers the response and produces an axum [`Response`] once finished.
///
/// Nothing reaches the client before `finish`, so `reset` always succeeds.
#[derive(Debug)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ResponseSink {
    type Output = Response;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn reset(&mut self) -> bool {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
        true
    }

    fn finish(self) -> Response {
        (self.status, self.headers, Body::from(self.body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════
// 2. Recorder
// ════════════════════════════════════════════════════════════

/// Records what a responder wrote. Handy in tests and for inspecting output
/// without going through a transport.
///
/// Like a plain HTTP response writer, every `write_status` overwrites the
/// recorded status and every body write appends.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    streaming: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that behaves as if output were already on the wire: `reset` refuses.
    pub fn streaming() -> Self {
        Self {
            streaming: true,
            ..Self::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or_default()
    }
}

impl Sink for Recorder {
    type Output = Recorder;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn reset(&mut self) -> bool {
        if self.streaming {
            return false;
        }
        self.status = None;
        self.headers.clear();
        self.body.clear();
        true
    }

    fn finish(self) -> Recorder {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use std::io::Write;

    #[tokio::test]
    async fn test_response_sink_builds_axum_response() {
        let mut sink = ResponseSink::new();
        sink.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        sink.write_status(StatusCode::CREATED);
        sink.write_body(b"hello ").unwrap();
        sink.write_body(b"world").unwrap();

        let response = sink.finish();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"hello world");
    }

    #[test]
    fn test_response_sink_reset_discards_output() {
        let mut sink = ResponseSink::new();
        sink.set_header(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        sink.write_status(StatusCode::OK);
        sink.write_body(b"partial").unwrap();

        assert!(sink.reset());
        assert!(sink.headers.is_empty());
        assert!(sink.body.is_empty());
    }

    #[test]
    fn test_streaming_recorder_refuses_reset() {
        let mut recorder = Recorder::streaming();
        recorder.write_status(StatusCode::OK);
        recorder.write_body(b"on the wire").unwrap();

        assert!(!recorder.reset());
        assert_eq!(recorder.status, Some(StatusCode::OK));
        assert_eq!(recorder.body_str(), "on the wire");
    }

    #[test]
    fn test_body_writer_appends_to_sink() {
        let mut recorder = Recorder::new();
        write!(BodyWriter::new(&mut recorder), "<p>{}</p>", 42).unwrap();
        assert_eq!(recorder.body_str(), "<p>42</p>");
    }
}

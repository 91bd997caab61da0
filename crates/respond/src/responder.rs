// respond/src/responder.rs — the single-use responder that turns handler results into responses
use crate::classify::{Classifier, DEFAULT_CLASSIFIER};
use crate::config::RespondConfig;
use crate::error::{Failure, RespondError};
use crate::mime::content_type_for;
use crate::raw::{attachment, copy_to_sink, Closing, RawContent, RawHeaders, INLINE};
use crate::redirect::{anchor_body, fill, resolve_location, Redirector};
use crate::request::RequestContext;
use crate::sink::{BodyWriter, Sink};
use crate::template::{IntoHtml, Template, HTML_UTF8};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::io::{Read, Write};

const APPLICATION_JSON: &str = "application/json";

// ════════════════════════════════════════════════════════════
// 1. Payload
// ════════════════════════════════════════════════════════════

/// What a handler hands back: a value to encode as JSON, a redirect, or raw bytes.
///
/// Any `Serialize` value converts into `Payload::Value`, so most calls never
/// name this type:
///
/// ```ignore
/// respond::to(sink, &req).ok(user);
/// respond::to(sink, &req).ok(Payload::raw(File::open(path)?));
/// respond::to(sink, &req).ok(Payload::redirect("/login"));
/// ```
pub enum Payload<'a, T = ()> {
    Value(T),
    Redirect(Box<dyn Redirector + 'a>),
    Raw(Box<dyn RawContent + 'a>),
}

impl<'a> Payload<'a> {
    pub fn redirect(target: impl Redirector + 'a) -> Self {
        Payload::Redirect(Box::new(target))
    }

    pub fn raw(content: impl RawContent + 'a) -> Self {
        Payload::Raw(Box::new(content))
    }
}

impl<'a, T: Serialize> From<T> for Payload<'a, T> {
    fn from(value: T) -> Self {
        Payload::Value(value)
    }
}

// ════════════════════════════════════════════════════════════
// 2. Responder
// ════════════════════════════════════════════════════════════

/// Writes exactly one response into a [`Sink`].
///
/// Every terminal method consumes the responder and returns the sink's output
/// (an axum `Response` for [`crate::ResponseSink`]). An error attached with
/// [`with_error`](Self::with_error) takes precedence over whatever the terminal
/// method was asked to write.
pub struct Responder<'r, S: Sink> {
    sink: S,
    request: Option<&'r RequestContext>,
    classifier: &'r Classifier,
    config: RespondConfig,
    error: Option<anyhow::Error>,
}

impl<'r, S: Sink> Responder<'r, S> {
    pub fn new(sink: S, request: impl Into<Option<&'r RequestContext>>) -> Self {
        Self {
            sink,
            request: request.into(),
            classifier: &DEFAULT_CLASSIFIER,
            config: RespondConfig::default(),
            error: None,
        }
    }

    /// Classify failures with a classifier that knows the application's error types.
    pub fn classifier(mut self, classifier: &'r Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(mut self, config: RespondConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the error that came back alongside the handler's value. The first
    /// error attached is the one reported; `None` is ignored.
    pub fn with_error<E: Into<anyhow::Error>>(mut self, err: Option<E>) -> Self {
        if self.error.is_none() {
            self.error = err.map(Into::into);
        }
        self
    }

    /// Attach the first present error of a list.
    pub fn with_errors<E, I>(self, errs: I) -> Self
    where
        E: Into<anyhow::Error>,
        I: IntoIterator<Item = Option<E>>,
    {
        errs.into_iter().fold(self, Self::with_error)
    }

    // --- Values ---

    /// Respond with `status` and the payload. Redirect payloads always use 307,
    /// raw payloads are streamed, everything else is encoded as JSON.
    pub fn reply<'a, T: Serialize>(
        mut self,
        status: StatusCode,
        payload: impl Into<Payload<'a, T>>,
    ) -> S::Output {
        let payload = payload.into();
        if let Some(err) = self.error.take() {
            // A raw payload is still closed even though nothing is copied.
            if let Payload::Raw(mut raw) = payload {
                drop(Closing::new(&mut *raw));
            }
            return self.write_error(err);
        }

        match payload {
            Payload::Value(value) => self.write_json(status, &value),
            Payload::Redirect(redirector) => {
                let url = redirector.redirect();
                self.write_redirect(StatusCode::TEMPORARY_REDIRECT, url)
            }
            Payload::Raw(mut raw) => self.write_raw(status, &mut *raw),
        }
    }

    /// [`reply`](Self::reply) with the handler's `Result`: `Err` becomes a failure.
    pub fn reply_result<'a, T, P, E>(self, status: StatusCode, result: Result<P, E>) -> S::Output
    where
        T: Serialize,
        P: Into<Payload<'a, T>>,
        E: Into<anyhow::Error>,
    {
        match result {
            Ok(payload) => self.reply(status, payload),
            Err(err) => self.fail(err),
        }
    }

    /// 200 with the payload.
    pub fn ok<'a, T: Serialize>(self, payload: impl Into<Payload<'a, T>>) -> S::Output {
        self.reply(StatusCode::OK, payload)
    }

    /// 201 with the payload.
    pub fn created<'a, T: Serialize>(self, payload: impl Into<Payload<'a, T>>) -> S::Output {
        self.reply(StatusCode::CREATED, payload)
    }

    /// 202 with the payload.
    pub fn accepted<'a, T: Serialize>(self, payload: impl Into<Payload<'a, T>>) -> S::Output {
        self.reply(StatusCode::ACCEPTED, payload)
    }

    /// 204, headers only.
    pub fn no_content(self) -> S::Output {
        self.write_empty(StatusCode::NO_CONTENT)
    }

    /// 304, headers only. Typically the outcome of an ETag check.
    pub fn not_modified(self) -> S::Output {
        self.write_empty(StatusCode::NOT_MODIFIED)
    }

    // --- HTML ---

    /// 200 with a `text/html` body. Accepts Maud Markup, String, or &str.
    pub fn html(mut self, markup: impl IntoHtml) -> S::Output {
        if let Some(err) = self.error.take() {
            return self.write_error(err);
        }

        self.sink
            .set_header(CONTENT_TYPE, HeaderValue::from_static(HTML_UTF8));
        self.sink.write_status(StatusCode::OK);
        let body = markup.into_html();
        self.finish_body(body.as_bytes())
    }

    /// 200 with whatever `template` renders for `ctx`, evaluated directly into
    /// the body. A missing template yields an empty body; a failing one is
    /// reported as a failure.
    pub fn html_template<C, T>(mut self, template: Option<&T>, ctx: &C) -> S::Output
    where
        C: ?Sized,
        T: Template<C> + ?Sized,
    {
        if let Some(err) = self.error.take() {
            return self.write_error(err);
        }

        self.sink
            .set_header(CONTENT_TYPE, HeaderValue::from_static(HTML_UTF8));
        self.sink.write_status(StatusCode::OK);

        let Some(template) = template else {
            return self.sink.finish();
        };

        let rendered = template.execute(ctx, &mut BodyWriter::new(&mut self.sink));
        match rendered {
            Ok(()) => self.sink.finish(),
            Err(err) => self.fail_after_commit(err),
        }
    }

    // --- Files ---

    /// 200 with the file's bytes, displayed inline. The name only picks the
    /// content type. `None` is an empty body. Closing the reader is up to the
    /// caller (dropping it is usually enough).
    pub fn serve<R: Read>(self, file_name: &str, data: Option<R>) -> S::Output {
        self.write_file(file_name, INLINE.to_string(), data)
    }

    pub fn serve_bytes(self, file_name: &str, data: &[u8]) -> S::Output {
        self.serve(file_name, Some(data))
    }

    /// 200 with the file's bytes as an attachment, prompting a download under
    /// `file_name`.
    pub fn download<R: Read>(self, file_name: &str, data: Option<R>) -> S::Output {
        self.write_file(file_name, attachment(file_name), data)
    }

    pub fn download_bytes(self, file_name: &str, data: &[u8]) -> S::Output {
        self.download(file_name, Some(data))
    }

    // --- Redirects ---

    /// 307 to the URL built from `uri_template` (see [`crate::redirect::fill`]).
    ///
    /// # Panics
    ///
    /// When the responder was created without a request context.
    pub fn redirect(self, uri_template: &str, args: &[&dyn fmt::Display]) -> S::Output {
        let url = fill(uri_template, args);
        self.write_redirect(StatusCode::TEMPORARY_REDIRECT, url)
    }

    /// 307 to the redirector's URL, used verbatim.
    ///
    /// # Panics
    ///
    /// When the responder was created without a request context.
    pub fn redirect_to<R: Redirector + ?Sized>(self, redirector: &R) -> S::Output {
        self.write_redirect(StatusCode::TEMPORARY_REDIRECT, redirector.redirect())
    }

    /// 308 to the URL built from `uri_template`.
    ///
    /// # Panics
    ///
    /// When the responder was created without a request context.
    pub fn redirect_permanent(self, uri_template: &str, args: &[&dyn fmt::Display]) -> S::Output {
        let url = fill(uri_template, args);
        self.write_redirect(StatusCode::PERMANENT_REDIRECT, url)
    }

    /// 308 to the redirector's URL, used verbatim.
    ///
    /// # Panics
    ///
    /// When the responder was created without a request context.
    pub fn redirect_permanent_to<R: Redirector + ?Sized>(self, redirector: &R) -> S::Output {
        self.write_redirect(StatusCode::PERMANENT_REDIRECT, redirector.redirect())
    }

    // --- Failures ---

    /// Respond with the status and message the classifier derives from `err`.
    pub fn fail(mut self, err: impl Into<anyhow::Error>) -> S::Output {
        let err = self.error.take().unwrap_or_else(|| err.into());
        self.write_error(err)
    }

    /// Fail without a cause: 500 "unknown error", unless an error was attached.
    pub fn fail_unknown(mut self) -> S::Output {
        match self.error.take() {
            Some(err) => self.write_error(err),
            None => self.write_failure(Failure::unknown()),
        }
    }

    // ════════════════════════════════════════════════════════════
    // 3. Writers
    // ════════════════════════════════════════════════════════════

    fn write_empty(mut self, status: StatusCode) -> S::Output {
        if let Some(err) = self.error.take() {
            return self.write_error(err);
        }
        self.sink.write_status(status);
        self.sink.finish()
    }

    fn write_json<T: Serialize + ?Sized>(mut self, status: StatusCode, value: &T) -> S::Output {
        let encoded = if self.config.pretty_json {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };

        let body = match encoded {
            Ok(body) => body,
            Err(err) => return self.write_error(RespondError::from(err).into()),
        };

        self.sink
            .set_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self.sink.write_status(status);
        self.finish_body(&body)
    }

    fn write_raw(mut self, status: StatusCode, raw: &mut dyn RawContent) -> S::Output {
        let headers = RawHeaders::resolve(&*raw);
        let mut raw = Closing::new(raw);

        self.try_header(CONTENT_TYPE, &headers.content_type);
        self.try_header(CONTENT_DISPOSITION, &headers.disposition);
        self.sink.write_status(status);

        let copied = copy_to_sink(&mut *raw, &mut self.sink, self.config.copy_buffer_size);
        drop(raw);

        match copied {
            Ok(_) => self.sink.finish(),
            Err(err) => self.fail_after_commit(err.into()),
        }
    }

    fn write_file<R: Read>(mut self, file_name: &str, disposition: String, data: Option<R>) -> S::Output {
        if let Some(err) = self.error.take() {
            return self.write_error(err);
        }

        self.try_header(CONTENT_TYPE, &content_type_for(file_name));
        self.try_header(CONTENT_DISPOSITION, &disposition);
        self.sink.write_status(StatusCode::OK);

        let Some(mut data) = data else {
            return self.sink.finish();
        };

        let copied = copy_to_sink(&mut data, &mut self.sink, self.config.copy_buffer_size);
        match copied {
            Ok(_) => self.sink.finish(),
            Err(err) => self.fail_after_commit(err.into()),
        }
    }

    fn write_redirect(mut self, status: StatusCode, url: String) -> S::Output {
        if let Some(err) = self.error.take() {
            return self.write_error(err);
        }
        if url.is_empty() {
            return self.write_error(RespondError::EmptyRedirect.into());
        }

        let Some(request) = self.request else {
            panic!("redirects need the request context: respond::to(sink, &request)");
        };

        let location = resolve_location(request.path(), &url);
        let Ok(value) = HeaderValue::from_str(&location) else {
            return self.write_error(RespondError::InvalidHeader { name: "location" }.into());
        };
        self.sink.set_header(LOCATION, value);

        let is_get = request.method == Method::GET;
        if is_get || request.method == Method::HEAD {
            self.sink
                .set_header(CONTENT_TYPE, HeaderValue::from_static(HTML_UTF8));
        }
        self.sink.write_status(status);

        if is_get && self.config.redirect_body {
            let body = anchor_body(&location, status);
            return self.finish_body(body.as_bytes());
        }
        self.sink.finish()
    }

    fn write_error(self, err: anyhow::Error) -> S::Output {
        let failure = self.classifier.classify_anyhow(&err);
        self.write_failure(failure)
    }

    fn write_failure(self, mut failure: Failure) -> S::Output {
        let status = StatusCode::from_u16(failure.status).unwrap_or_else(|_| {
            tracing::warn!(status = failure.status, "classified status is not a valid HTTP status");
            StatusCode::INTERNAL_SERVER_ERROR
        });
        failure.status = status.as_u16();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), message = %failure.message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), message = %failure.message, "request failed");
        }

        self.write_json(status, &failure)
    }

    /// Report a failure that happened after the status line was written.
    fn fail_after_commit(mut self, err: anyhow::Error) -> S::Output {
        if !self.sink.reset() {
            tracing::warn!(error = %err, "response already committed; failure appended to partial body");
        }
        self.write_error(err)
    }

    fn finish_body(mut self, body: &[u8]) -> S::Output {
        let written = BodyWriter::new(&mut self.sink).write_all(body);
        match written {
            Ok(()) => self.sink.finish(),
            Err(err) => self.fail_after_commit(err.into()),
        }
    }

    fn try_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_bytes(value.as_bytes()) {
            Ok(value) => self.sink.set_header(name, value),
            Err(_) => tracing::warn!(header = %name, value, "skipping invalid header value"),
        }
    }
}

// ════════════════════════════════════════════════════════════
// 4. Per-status failures
// ════════════════════════════════════════════════════════════

macro_rules! failure_helpers {
    ( $( $(#[$doc:meta])* $name:ident => $status:ident ),+ $(,)? ) => {
        impl<'r, S: Sink> Responder<'r, S> {
            $(
                $(#[$doc])*
                pub fn $name(self, message: impl Into<String>) -> S::Output {
                    self.fail(Failure::new(StatusCode::$status.as_u16(), message))
                }
            )+
        }
    };
}

failure_helpers! {
    /// 400 with `{"status":400,"message":..}`.
    bad_request => BAD_REQUEST,
    /// 401 with `{"status":401,"message":..}`.
    unauthorized => UNAUTHORIZED,
    /// 403 with `{"status":403,"message":..}`.
    forbidden => FORBIDDEN,
    /// 404 with `{"status":404,"message":..}`.
    not_found => NOT_FOUND,
    /// 405 with `{"status":405,"message":..}`.
    method_not_allowed => METHOD_NOT_ALLOWED,
    /// 409 with `{"status":409,"message":..}`.
    conflict => CONFLICT,
    /// 410 with `{"status":410,"message":..}`.
    gone => GONE,
    /// 429 with `{"status":429,"message":..}`.
    too_many_requests => TOO_MANY_REQUESTS,
    /// 500 with `{"status":500,"message":..}`.
    internal_server_error => INTERNAL_SERVER_ERROR,
    /// 501 with `{"status":501,"message":..}`.
    not_implemented => NOT_IMPLEMENTED,
    /// 502 with `{"status":502,"message":..}`.
    bad_gateway => BAD_GATEWAY,
    /// 503 with `{"status":503,"message":..}`.
    service_unavailable => SERVICE_UNAVAILABLE,
    /// 504 with `{"status":504,"message":..}`.
    gateway_timeout => GATEWAY_TIMEOUT,
}

// ./crates/respond/src/lib.rs

pub mod classify;
pub mod config;
pub mod error;
pub mod mime;
pub mod raw;
pub mod redirect;
pub mod request;
pub mod responder;
pub mod sink;
pub mod template;

// Re-export the core API so handlers can just `use respond::*`
pub use classify::Classifier;
pub use config::RespondConfig;
pub use error::{
    ErrorWithCode, ErrorWithStatus, ErrorWithStatusCode, Failure, RespondError, UNKNOWN_ERROR,
};
pub use raw::{Raw, RawContent, RawHeaders};
pub use redirect::Redirector;
pub use request::RequestContext;
pub use responder::{Payload, Responder};
pub use sink::{Recorder, ResponseSink, Sink};
pub use template::{IntoHtml, Template};

// Re-export Axum primitives they might need for convenience
pub use axum;
pub use axum::http::StatusCode;
pub use axum::response::Response;

/// Start a response. Pass the request context when the response may redirect.
///
/// ```ignore
/// async fn show(req: RequestContext) -> Response {
///     let user = load_user().await;
///     respond::to(ResponseSink::new(), &req).reply_result(StatusCode::OK, user)
/// }
/// ```
pub fn to<'r, S: Sink>(sink: S, request: impl Into<Option<&'r RequestContext>>) -> Responder<'r, S> {
    Responder::new(sink, request)
}

// respond/src/request.rs — the slice of the incoming request a responder needs
use axum::http::{request::Parts, Method, Uri};

/// Request metadata used by redirects: the method decides whether an anchor
/// body is written, the path anchors relative targets.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self { method, uri }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

impl From<&Parts> for RequestContext {
    fn from(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone())
    }
}

impl<B> From<&axum::http::Request<B>> for RequestContext {
    fn from(req: &axum::http::Request<B>) -> Self {
        Self::new(req.method().clone(), req.uri().clone())
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from(&*parts))
    }
}

// respond/src/classify.rs — maps arbitrary errors onto a `{status, message}` failure
use crate::error::{ErrorWithCode, ErrorWithStatus, ErrorWithStatusCode, Failure};
use once_cell::sync::Lazy;
use std::error::Error as StdError;
use std::fmt;

/// Checks one link of an error chain for one registered capability.
type Probe = fn(&(dyn StdError + 'static)) -> Option<u16>;

/// Classifier used by responders that were not handed one explicitly.
pub(crate) static DEFAULT_CLASSIFIER: Lazy<Classifier> = Lazy::new(Classifier::new);

fn probe_status<E: ErrorWithStatus + 'static>(err: &(dyn StdError + 'static)) -> Option<u16> {
    err.downcast_ref::<E>().map(ErrorWithStatus::status)
}

fn probe_status_code<E: ErrorWithStatusCode + 'static>(
    err: &(dyn StdError + 'static),
) -> Option<u16> {
    err.downcast_ref::<E>().map(ErrorWithStatusCode::status_code)
}

fn probe_code<E: ErrorWithCode + 'static>(err: &(dyn StdError + 'static)) -> Option<u16> {
    err.downcast_ref::<E>().map(ErrorWithCode::code)
}

/// Resolves errors to the status and message a failed response should carry.
///
/// Rust has no way to ask an arbitrary `dyn Error` whether it implements a
/// trait, so every concrete type exposing one of the status capabilities has to
/// be registered here. [`Failure`] is always registered.
///
/// ```ignore
/// let classifier = Classifier::new()
///     .with_status::<NotFound>()
///     .with_code::<UpstreamError>();
/// ```
#[derive(Clone)]
pub struct Classifier {
    status: Vec<Probe>,
    status_code: Vec<Probe>,
    code: Vec<Probe>,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            status: Vec::new(),
            status_code: vec![probe_status_code::<Failure>],
            code: Vec::new(),
        }
    }

    /// Register a type that reports its status through [`ErrorWithStatus`].
    pub fn with_status<E: ErrorWithStatus + 'static>(mut self) -> Self {
        self.status.push(probe_status::<E>);
        self
    }

    /// Register a type that reports its status through [`ErrorWithStatusCode`].
    pub fn with_status_code<E: ErrorWithStatusCode + 'static>(mut self) -> Self {
        self.status_code.push(probe_status_code::<E>);
        self
    }

    /// Register a type that reports its status through [`ErrorWithCode`].
    pub fn with_code<E: ErrorWithCode + 'static>(mut self) -> Self {
        self.code.push(probe_code::<E>);
        self
    }

    /// Classify an optional error.
    ///
    /// The whole chain is searched for the status capability first, then for
    /// status-code, then for code. The first hit supplies the status and its
    /// own message. Without any hit the error is a 500 with its display text,
    /// and without any error at all the result is [`Failure::unknown`].
    pub fn classify(&self, err: Option<&(dyn StdError + 'static)>) -> Failure {
        let Some(err) = err else {
            return Failure::unknown();
        };

        for probes in [&self.status, &self.status_code, &self.code] {
            for link in chain(err) {
                if let Some(status) = probes.iter().find_map(|probe| probe(link)) {
                    return Failure::new(status, link.to_string());
                }
            }
        }

        Failure::internal(err.to_string())
    }

    pub fn classify_anyhow(&self, err: &anyhow::Error) -> Failure {
        let err: &(dyn StdError + 'static) = err.as_ref();
        self.classify(Some(err))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("status", &self.status.len())
            .field("status_code", &self.status_code.len())
            .field("code", &self.code.len())
            .finish()
    }
}

/// Walk an error and everything it wraps, outermost first.
fn chain<'e>(
    err: &'e (dyn StdError + 'static),
) -> impl Iterator<Item = &'e (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |link| next_link(*link))
}

fn next_link<'e>(link: &'e (dyn StdError + 'static)) -> Option<&'e (dyn StdError + 'static)> {
    // io::Error::source() skips over its own payload.
    if let Some(io) = link.downcast_ref::<std::io::Error>() {
        if let Some(inner) = io.get_ref() {
            return Some(inner as &(dyn StdError + 'static));
        }
    }
    link.source()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use pretty_assertions::assert_eq;
    use std::io;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct WithStatus {
        status: u16,
        message: String,
    }

    impl ErrorWithStatus for WithStatus {
        fn status(&self) -> u16 {
            self.status
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct WithCode {
        status: u16,
        message: String,
    }

    impl ErrorWithCode for WithCode {
        fn code(&self) -> u16 {
            self.status
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct Both {
        message: String,
    }

    impl ErrorWithStatus for Both {
        fn status(&self) -> u16 {
            418
        }
    }

    impl ErrorWithCode for Both {
        fn code(&self) -> u16 {
            503
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("wrapped: {source}")]
    struct Wrapper {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    }

    fn classifier() -> Classifier {
        Classifier::new()
            .with_status::<WithStatus>()
            .with_code::<WithCode>()
            .with_status::<Both>()
            .with_code::<Both>()
    }

    fn classify(err: &(dyn StdError + 'static)) -> Failure {
        classifier().classify(Some(err))
    }

    #[test]
    fn test_absent_error_is_unknown() {
        assert_eq!(classifier().classify(None), Failure::new(500, "unknown error"));
    }

    #[test]
    fn test_each_capability_is_found() {
        let status = WithStatus { status: 401, message: "moo".into() };
        assert_eq!(classify(&status), Failure::new(401, "moo"));

        let code = WithCode { status: 504, message: "boo".into() };
        assert_eq!(classify(&code), Failure::new(504, "boo"));

        let failure = Failure::new(409, "taken");
        assert_eq!(classify(&failure), Failure::new(409, "taken"));
    }

    #[test]
    fn test_plain_error_is_internal() {
        let err = io::Error::new(io::ErrorKind::Other, "blah");
        assert_eq!(classify(&err), Failure::new(500, "blah"));
    }

    #[test]
    fn test_unregistered_type_is_internal() {
        let status = WithStatus { status: 401, message: "moo".into() };
        assert_eq!(Classifier::new().classify(Some(&status)), Failure::new(500, "moo"));
    }

    #[test]
    fn test_status_wins_over_code() {
        let both = Both { message: "teapot".into() };
        assert_eq!(classify(&both), Failure::new(418, "teapot"));
    }

    #[test]
    fn test_capability_found_through_wrappers() {
        let err = Wrapper {
            source: Box::new(WithCode { status: 429, message: "slow down".into() }),
        };
        assert_eq!(classify(&err), Failure::new(429, "slow down"));
    }

    #[test]
    fn test_capability_priority_spans_the_chain() {
        // Code on the outside, status deeper in: status still wins.
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer {
            #[source]
            inner: WithStatus,
        }
        impl ErrorWithCode for Outer {
            fn code(&self) -> u16 {
                502
            }
        }

        let classifier = classifier().with_code::<Outer>();
        let err = Outer {
            inner: WithStatus { status: 403, message: "inner".into() },
        };
        assert_eq!(classifier.classify(Some(&err)), Failure::new(403, "inner"));
    }

    #[test]
    fn test_capability_found_inside_io_error() {
        let err = io::Error::new(
            io::ErrorKind::Other,
            WithStatus { status: 403, message: "bad monkey".into() },
        );
        assert_eq!(classify(&err), Failure::new(403, "bad monkey"));
    }

    #[test]
    fn test_anyhow_context_is_unwrapped() {
        let err = Err::<(), _>(WithCode { status: 404, message: "no user".into() })
            .context("loading profile")
            .unwrap_err();
        assert_eq!(classifier().classify_anyhow(&err), Failure::new(404, "no user"));

        let err = anyhow::anyhow!("plain").context("outer message");
        assert_eq!(classifier().classify_anyhow(&err), Failure::new(500, "outer message"));
    }

    #[test]
    fn test_classification_is_repeatable() {
        let err = WithStatus { status: 401, message: "moo".into() };
        let classifier = classifier();
        assert_eq!(classifier.classify(Some(&err)), classifier.classify(Some(&err)));
    }
}

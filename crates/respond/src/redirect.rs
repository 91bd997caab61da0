// respond/src/redirect.rs — redirect targets: placeholder filling, relative resolution, anchor body
use axum::http::StatusCode;
use maud::html;
use percent_encoding::{utf8_percent_encode, CONTROLS};
use std::fmt::{self, Write};

/// A handler result that asks for a redirect instead of a regular response.
pub trait Redirector {
    /// The URL to redirect to.
    fn redirect(&self) -> String;
}

impl Redirector for String {
    fn redirect(&self) -> String {
        self.clone()
    }
}

impl Redirector for str {
    fn redirect(&self) -> String {
        self.to_string()
    }
}

impl<R: Redirector + ?Sized> Redirector for &R {
    fn redirect(&self) -> String {
        (**self).redirect()
    }
}

impl Redirector for axum::http::Uri {
    fn redirect(&self) -> String {
        self.to_string()
    }
}

/// Substitute positional placeholders in a URL template.
///
/// `{}` takes the next argument, `{N}` takes argument `N`, and `{{`/`}}` are
/// literal braces. Placeholders without a matching argument become empty, and
/// anything else in braces is kept verbatim.
pub fn fill(template: &str, args: &[&dyn fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut next = 0;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut inner = String::new();
                let mut closed = false;
                for d in chars.by_ref() {
                    if d == '}' {
                        closed = true;
                        break;
                    }
                    inner.push(d);
                }

                let arg = if !closed {
                    None
                } else if inner.is_empty() {
                    next += 1;
                    Some(args.get(next - 1))
                } else {
                    inner.trim().parse::<usize>().ok().map(|i| args.get(i))
                };

                match arg {
                    Some(Some(arg)) => {
                        let _ = write!(out, "{}", arg);
                    }
                    Some(None) => {}
                    None => {
                        out.push('{');
                        out.push_str(&inner);
                        if closed {
                            out.push('}');
                        }
                    }
                }
            }
            c => out.push(c),
        }
    }

    out
}

/// Resolve a redirect target against the path of the request being answered.
///
/// Absolute URLs (with a scheme or a `//host`) are returned untouched. Other
/// targets are made absolute relative to the request path's directory, cleaned
/// of `.`/`..` segments while keeping a trailing slash and the query string.
pub fn resolve_location(request_path: &str, target: &str) -> String {
    if has_scheme(target) || target.starts_with("//") {
        return encode(target);
    }

    let current = if request_path.is_empty() { "/" } else { request_path };
    let joined = if target.starts_with('/') {
        target.to_string()
    } else {
        let dir = match current.rfind('/') {
            Some(slash) => &current[..=slash],
            None => "",
        };
        format!("{}{}", dir, target)
    };

    let (path, query) = match joined.find('?') {
        Some(q) => joined.split_at(q),
        None => (joined.as_str(), ""),
    };

    let mut cleaned = clean_path(path);
    if path.ends_with('/') && !cleaned.ends_with('/') {
        cleaned.push('/');
    }
    cleaned.push_str(query);

    encode(&cleaned)
}

/// The small HTML body sent along with redirects to GET requests.
pub fn anchor_body(location: &str, status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Redirect");
    let markup = html! { a href=(location) { (reason) } "." };
    format!("{}\n", markup.into_string())
}

fn encode(location: &str) -> String {
    utf8_percent_encode(location, CONTROLS).to_string()
}

fn has_scheme(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return false;
    };
    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Lexically simplify a slash-separated path.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if !rooted => segments.push(".."),
                _ => {}
            },
            segment => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

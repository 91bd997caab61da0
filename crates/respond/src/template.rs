// respond/src/template.rs — HTML bodies: ready markup and templates evaluated into the sink
use maud::Markup;
use std::io::Write;

pub const HTML_UTF8: &str = "text/html; charset=utf-8";

// ============================================================================
// IntoHtml: Maud Markup, String or &str as a body
// ============================================================================

pub trait IntoHtml {
    fn into_html(self) -> String;
}

impl IntoHtml for Markup {
    fn into_html(self) -> String {
        self.into_string()
    }
}

impl IntoHtml for String {
    fn into_html(self) -> String {
        self
    }
}

impl IntoHtml for &str {
    fn into_html(self) -> String {
        self.to_string()
    }
}

// ============================================================================
// Template
// ============================================================================

/// Something that renders a context value as HTML straight into the response body.
///
/// Any `Fn(&C) -> anyhow::Result<Markup>` is a template, which covers plain
/// Maud view functions:
///
/// ```ignore
/// fn profile(user: &User) -> anyhow::Result<Markup> {
///     Ok(html! { h1 { (user.name) } })
/// }
/// respond::to(sink, &req).html_template(Some(&profile), &user)
/// ```
pub trait Template<C: ?Sized> {
    fn execute(&self, ctx: &C, out: &mut dyn Write) -> anyhow::Result<()>;
}

impl<C, F> Template<C> for F
where
    C: ?Sized,
    F: Fn(&C) -> anyhow::Result<Markup>,
{
    fn execute(&self, ctx: &C, out: &mut dyn Write) -> anyhow::Result<()> {
        let markup = self(ctx)?;
        out.write_all(markup.into_string().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maud::html;

    fn greeting(name: &str) -> anyhow::Result<Markup> {
        Ok(html! { p { "Hello, " (name) } })
    }

    #[test]
    fn test_into_html_sources() {
        assert_eq!(html! { b { "x" } }.into_html(), "<b>x</b>");
        assert_eq!("<i>y</i>".into_html(), "<i>y</i>");
        assert_eq!(String::from("z").into_html(), "z");
    }

    #[test]
    fn test_view_function_is_a_template() {
        let mut out = Vec::new();
        greeting.execute("<Bob>", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<p>Hello, &lt;Bob&gt;</p>");
    }

    #[test]
    fn test_template_errors_propagate() {
        let failing = |_: &str| -> anyhow::Result<Markup> { anyhow::bail!("missing field") };
        let mut out = Vec::new();
        let err = failing.execute("ctx", &mut out).unwrap_err();
        assert_eq!(err.to_string(), "missing field");
        assert!(out.is_empty());
    }
}

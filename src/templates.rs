use askama::Template;

pub const WELCOME_SUBJECT: &str = "Welcome to BLT Newsletter!";

pub const BULLETIN_PLACEHOLDER_TEXT: &str = "Newsletter content not found";
pub const BULLETIN_PLACEHOLDER_HTML: &str = "<p>Newsletter content not found</p>";

const GREETING_FALLBACK: &str = "there";

#[derive(Template)]
#[template(path = "welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "welcome.html")]
struct WelcomeHtml<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "bulletin.html")]
struct BulletinPage<'a> {
    content: &'a str,
}

/// Renders the (text, html) welcome message pair. An absent or empty name
/// falls back to a generic greeting.
pub fn welcome_email(name: Option<&str>) -> askama::Result<(String, String)> {
    let name = match name {
        Some(name) if !name.is_empty() => name,
        _ => GREETING_FALLBACK,
    };
    let text = WelcomeText { name }.render()?;
    let html = WelcomeHtml { name }.render()?;
    Ok((text, html))
}

/// Wraps already-rendered bulletin HTML in the shared page template. The
/// content region receives the fragment verbatim; every recipient gets the
/// same page.
pub fn bulletin_page(content_html: &str) -> askama::Result<String> {
    BulletinPage {
        content: content_html,
    }
    .render()
}

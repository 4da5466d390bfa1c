//! Builds the minimal article document handed to the caller's HTML view.

use std::sync::LazyLock;

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use regex::Regex;

use crate::domain::Item;

static FIRST_IMG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img[^>]*>").expect("img pattern is valid"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

const DOCUMENT_START: &str = r#"<html>
<head>
<meta name="Viewport" content="width=480; user-scaleable=no; initial-scale=1.0" />
<style>
* { background: #fff !important; color: #000 !important; width: auto !important; font-size: 1em !important; }
h1 { font-size: 1.125em !important }
img { max-width: 200px !important; display: block; margin: 0 auto; }
.timestamp { font-size: 0.875em !important; font-style: italic; display: block; margin-top: 2em; }
</style>
</head>
<body>
<table>
"#;

const DOCUMENT_END: &str = "</table></body></html>";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Render an item as title, image, plain-text body and timestamp.
///
/// The body comes back HTML-escaped: a summary reading `Fish &amp; Chips`
/// renders as `Fish &amp; Chips` in the markup and `Fish & Chips` on screen.
pub fn render_article(item: &Item) -> String {
    let mut html = String::from(DOCUMENT_START);

    html.push_str(&format!("<tr><td><h1>{}</h1></td></tr>", encode_text(&item.title)));

    html.push_str("<tr><td>");
    if let Some(image) = select_image(item) {
        html.push_str(&image);
    }
    html.push_str(&format!(
        r#"<span class="article">{}</span></td></tr>"#,
        plain_text(&item.summary)
    ));

    let timestamp = item
        .published
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();
    html.push_str(&format!(
        r#"<tr><td><span class="timestamp">{}</span></td></tr>"#,
        timestamp
    ));

    html.push_str(DOCUMENT_END);
    html
}

/// The enclosure image if the item has one, otherwise the first `<img>` tag
/// of the body, reused as-is.
pub fn select_image(item: &Item) -> Option<String> {
    match item.image.as_deref() {
        Some(src) if !src.is_empty() => Some(format!(
            r#"<img src="{}" />"#,
            encode_double_quoted_attribute(src)
        )),
        _ => FIRST_IMG
            .find(&item.summary)
            .map(|m| m.as_str().to_string()),
    }
}

/// Strip tags, decode entities, then escape what is left so the body can
/// only ever render as text.
fn plain_text(markup: &str) -> String {
    let stripped = TAG.replace_all(markup, "");
    let decoded = decode_html_entities(&stripped);
    encode_text(&decoded).into_owned()
}

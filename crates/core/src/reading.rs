//! Standalone HTML preview of an article ("reading mode").

use crate::article::{ArticleRecord, present};
use crate::sanitize::sanitize_fragment;

/// Title shown when the record has none.
pub const UNTITLED_ARTICLE: &str = "Untitled Article";

const STYLE: &str = "body{max-width:42rem;margin:2rem auto;padding:0 1rem;font-family:Georgia,serif;line-height:1.6}\
.meta{text-align:center;font-style:italic;color:#666;margin-bottom:2rem}\
.feature{width:100%;margin-bottom:2rem}";

/// Renders the record as a self-contained HTML page.
///
/// The meta line joins author, publication name and the publication date
/// as written at the source. The body is sanitized again before embedding.
pub fn render_reading_view(article: &ArticleRecord) -> String {
    let title = escape(present(Some(article.title.as_str())).unwrap_or(UNTITLED_ARTICLE));

    let meta: Vec<&str> = [
        article.author_line(),
        article.publication_name(),
        present(article.publication_date.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<article>\n<h1>{title}</h1>\n"
    );
    if !meta.is_empty() {
        html.push_str(&format!("<div class=\"meta\">{}</div>\n", escape(&meta.join(" | "))));
    }
    if let Some(url) = article.feature_image_url() {
        html.push_str(&format!("<img class=\"feature\" src=\"{}\" alt=\"Feature Image\">\n", escape(url)));
    }
    html.push_str(&sanitize_fragment(&article.article_body_html));
    html.push_str("\n</article>\n</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

use pulldown_cmark::{Options, Parser, html};

/// Convert a campaign statement to HTML with every syntax extension enabled
/// (tables, footnotes, strikethrough, task lists, smart punctuation, ...).
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::all());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
